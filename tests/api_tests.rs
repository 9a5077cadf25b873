//! API integration tests
//!
//! These run against a live server with a migrated database:
//! `cargo run`, then `cargo test -- --ignored`.

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use uuid::Uuid;

const BASE_URL: &str = "http://localhost:8080/api/v1";

/// Register a fresh account with the given role and return its bearer token
async fn register(client: &Client, role: &str, department: Option<&str>) -> (String, String) {
    let email = format!("test-{}@example.com", Uuid::new_v4());
    let response = client
        .post(format!("{}/auth/register", BASE_URL))
        .json(&json!({
            "full_name": "Test User",
            "email": email,
            "password": "testpass123",
            "role": role,
            "department": department,
        }))
        .send()
        .await
        .expect("Failed to send register request");

    assert_eq!(response.status(), 201, "registration failed for role {}", role);
    let body: Value = response.json().await.expect("Failed to parse register response");
    let token = body["token"].as_str().expect("No token in response").to_string();
    let user_id = body["user"]["id"].as_str().expect("No user id").to_string();
    (token, user_id)
}

async fn register_admin(client: &Client) -> String {
    register(client, "Admin", None).await.0
}

/// Create equipment as the given staff token and return its id
async fn create_equipment(client: &Client, token: &str, body: Value) -> Value {
    let response = client
        .post(format!("{}/equipment", BASE_URL))
        .bearer_auth(token)
        .json(&body)
        .send()
        .await
        .expect("Failed to send create equipment request");

    assert_eq!(response.status(), 201);
    response.json().await.expect("Failed to parse equipment response")
}

/// Create a reservation and return its id
async fn create_reservation(client: &Client, token: &str, equipment_id: &str) -> String {
    let response = client
        .post(format!("{}/reservations", BASE_URL))
        .bearer_auth(token)
        .json(&json!({
            "equipment_id": equipment_id,
            "start_date": "2030-01-05T09:00:00Z",
            "end_date": "2030-01-09T17:00:00Z",
            "purpose": "Lab session",
            "module_code": "EEE-301",
        }))
        .send()
        .await
        .expect("Failed to send reservation request");

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse reservation response");
    body["id"].as_str().expect("No reservation id").to_string()
}

async fn set_status(client: &Client, token: &str, reservation_id: &str, status: &str) -> reqwest::Response {
    client
        .put(format!("{}/reservations/{}", BASE_URL, reservation_id))
        .bearer_auth(token)
        .json(&json!({ "status": status }))
        .send()
        .await
        .expect("Failed to send status update")
}

async fn get_equipment(client: &Client, id: &str) -> Value {
    let response = client
        .get(format!("{}/equipment/{}", BASE_URL, id))
        .send()
        .await
        .expect("Failed to fetch equipment");
    assert!(response.status().is_success());
    response.json().await.expect("Failed to parse equipment")
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_credentials() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "email": "nobody@example.com",
            "password": "wrong"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_register_and_me() {
    let client = Client::new();
    let (token, user_id) = register(&client, "Student", Some("ICT")).await;

    let response = client
        .get(format!("{}/auth/me", BASE_URL))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["id"], user_id.as_str());
    assert_eq!(body["role"], "Student");
    // Credential hash never leaves the server
    assert!(body.get("password").is_none());
}

#[tokio::test]
#[ignore]
async fn test_public_equipment_listing() {
    let client = Client::new();

    let response = client
        .get(format!("{}/equipment", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["equipment"].is_array());
    assert!(body["total"].is_number());
    assert!(body["pages"].is_number());
    assert!(body["current_page"].is_number());
}

#[tokio::test]
#[ignore]
async fn test_public_dashboard_stats_totals_only() {
    let client = Client::new();

    let response = client
        .get(format!("{}/dashboard/stats", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["total_equipment"].is_number());
    assert!(body["total_users"].is_number());
    assert!(body["total_resources"].is_number());
    // No personal or activity detail without authentication
    assert!(body.get("recent_activity").is_none());
    assert!(body.get("my_borrowed_items").is_none());
    assert!(body.get("available_now").is_none());
}

#[tokio::test]
#[ignore]
async fn test_create_equipment_defaults() {
    let client = Client::new();
    let admin = register_admin(&client).await;

    let equipment = create_equipment(
        &client,
        &admin,
        json!({ "name": "Oscilloscope", "category": "Measurement", "stock": 5 }),
    )
    .await;

    // available defaults to stock, status to Available
    assert_eq!(equipment["stock"], 5);
    assert_eq!(equipment["available"], 5);
    assert_eq!(equipment["status"], "Available");
}

#[tokio::test]
#[ignore]
async fn test_create_equipment_requires_fields() {
    let client = Client::new();
    let admin = register_admin(&client).await;

    let response = client
        .post(format!("{}/equipment", BASE_URL))
        .bearer_auth(&admin)
        .json(&json!({ "name": "", "category": "Measurement" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);
}

/// Scenario A: full lifecycle on a single-unit equipment item
#[tokio::test]
#[ignore]
async fn test_reservation_lifecycle() {
    let client = Client::new();
    let admin = register_admin(&client).await;
    let (student, _) = register(&client, "Student", Some("ICT")).await;

    let equipment = create_equipment(
        &client,
        &admin,
        json!({ "name": "Signal Generator", "category": "Measurement", "stock": 1 }),
    )
    .await;
    let equipment_id = equipment["id"].as_str().unwrap();

    let reservation_id = create_reservation(&client, &student, equipment_id).await;

    // Approve: stock decrements, equipment goes In Use
    let response = set_status(&client, &admin, &reservation_id, "Approved").await;
    assert!(response.status().is_success());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "Approved");

    let equipment = get_equipment(&client, equipment_id).await;
    assert_eq!(equipment["available"], 0);
    assert_eq!(equipment["status"], "In Use");

    // Issue: no further stock change
    let response = set_status(&client, &admin, &reservation_id, "Borrowed").await;
    assert!(response.status().is_success());
    let equipment = get_equipment(&client, equipment_id).await;
    assert_eq!(equipment["available"], 0);
    assert_eq!(equipment["status"], "In Use");

    // Return: stock restored, equipment Available again
    let response = set_status(&client, &admin, &reservation_id, "Returned").await;
    assert!(response.status().is_success());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "Returned");

    let equipment = get_equipment(&client, equipment_id).await;
    assert_eq!(equipment["available"], 1);
    assert_eq!(equipment["status"], "Available");

    // Terminal state absorbs: no further transitions
    let response = set_status(&client, &admin, &reservation_id, "Borrowed").await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

/// Scenario B: no reservation against exhausted stock
#[tokio::test]
#[ignore]
async fn test_reservation_rejected_when_unavailable() {
    let client = Client::new();
    let admin = register_admin(&client).await;
    let (student, _) = register(&client, "Student", Some("ICT")).await;

    let equipment = create_equipment(
        &client,
        &admin,
        json!({ "name": "Thermal Camera", "category": "Imaging", "stock": 1, "available": 0 }),
    )
    .await;
    let equipment_id = equipment["id"].as_str().unwrap();

    let response = client
        .post(format!("{}/reservations", BASE_URL))
        .bearer_auth(&student)
        .json(&json!({
            "equipment_id": equipment_id,
            "start_date": "2030-01-05T09:00:00Z",
            "end_date": "2030-01-09T17:00:00Z",
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

/// Scenario C: department scoping on reservation approval
#[tokio::test]
#[ignore]
async fn test_cross_department_approval_forbidden() {
    let client = Client::new();
    let admin = register_admin(&client).await;
    let (ict_staff, _) = register(&client, "StockManager", Some("ICT")).await;
    let (student, _) = register(&client, "Student", Some("Mechatronic")).await;

    let equipment = create_equipment(
        &client,
        &admin,
        json!({ "name": "PLC Trainer", "category": "Automation", "department": "Mechatronic", "stock": 2 }),
    )
    .await;
    let equipment_id = equipment["id"].as_str().unwrap();

    let reservation_id = create_reservation(&client, &student, equipment_id).await;

    // ICT staff has no authority over Mechatronic equipment
    let response = set_status(&client, &ict_staff, &reservation_id, "Approved").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Admin is unrestricted
    let response = set_status(&client, &admin, &reservation_id, "Approved").await;
    assert!(response.status().is_success());
}

/// Scenario D: concurrent approvals of the last available unit
#[tokio::test]
#[ignore]
async fn test_concurrent_approval_race() {
    let client = Client::new();
    let admin = register_admin(&client).await;
    let (student_a, _) = register(&client, "Student", Some("ICT")).await;
    let (student_b, _) = register(&client, "Student", Some("ICT")).await;

    let equipment = create_equipment(
        &client,
        &admin,
        json!({ "name": "Spectrum Analyzer", "category": "Measurement", "stock": 1 }),
    )
    .await;
    let equipment_id = equipment["id"].as_str().unwrap();

    let first = create_reservation(&client, &student_a, equipment_id).await;
    let second = create_reservation(&client, &student_b, equipment_id).await;

    let (response_a, response_b) = tokio::join!(
        set_status(&client, &admin, &first, "Approved"),
        set_status(&client, &admin, &second, "Approved"),
    );

    let statuses = [response_a.status(), response_b.status()];
    let successes = statuses.iter().filter(|s| s.is_success()).count();
    let conflicts = statuses.iter().filter(|s| **s == StatusCode::CONFLICT).count();
    assert_eq!(successes, 1, "exactly one approval must win");
    assert_eq!(conflicts, 1, "the loser must receive a conflict");

    // Available never goes negative
    let equipment = get_equipment(&client, equipment_id).await;
    assert_eq!(equipment["available"], 0);
}

/// Cancelling an approved reservation restores the held unit
#[tokio::test]
#[ignore]
async fn test_cancel_after_approval_restocks() {
    let client = Client::new();
    let admin = register_admin(&client).await;
    let (student, _) = register(&client, "Student", Some("ICT")).await;

    let equipment = create_equipment(
        &client,
        &admin,
        json!({ "name": "Function Generator", "category": "Measurement", "stock": 1 }),
    )
    .await;
    let equipment_id = equipment["id"].as_str().unwrap();

    let reservation_id = create_reservation(&client, &student, equipment_id).await;
    let response = set_status(&client, &admin, &reservation_id, "Approved").await;
    assert!(response.status().is_success());

    let equipment = get_equipment(&client, equipment_id).await;
    assert_eq!(equipment["available"], 0);

    let response = set_status(&client, &admin, &reservation_id, "Cancelled").await;
    assert!(response.status().is_success());

    let equipment = get_equipment(&client, equipment_id).await;
    assert_eq!(equipment["available"], 1);
}

/// Owners may cancel their own reservation while it is still Pending
#[tokio::test]
#[ignore]
async fn test_owner_cancels_pending_reservation() {
    let client = Client::new();
    let admin = register_admin(&client).await;
    let (student, _) = register(&client, "Student", Some("ICT")).await;
    let (other, _) = register(&client, "Student", Some("ICT")).await;

    let equipment = create_equipment(
        &client,
        &admin,
        json!({ "name": "Multimeter", "category": "Measurement", "stock": 3 }),
    )
    .await;
    let equipment_id = equipment["id"].as_str().unwrap();

    let reservation_id = create_reservation(&client, &student, equipment_id).await;

    // A different student has no authority over it
    let response = set_status(&client, &other, &reservation_id, "Cancelled").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // The owner does, while it is Pending
    let response = set_status(&client, &student, &reservation_id, "Cancelled").await;
    assert!(response.status().is_success());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "Cancelled");
}

#[tokio::test]
#[ignore]
async fn test_equipment_delete_is_admin_only_and_not_idempotent() {
    let client = Client::new();
    let admin = register_admin(&client).await;
    let (staff, _) = register(&client, "StockManager", Some("ICT")).await;

    let equipment = create_equipment(
        &client,
        &admin,
        json!({ "name": "Soldering Station", "category": "Tools", "department": "ICT" }),
    )
    .await;
    let equipment_id = equipment["id"].as_str().unwrap();

    // Departmental staff cannot delete even their own department's equipment
    let response = client
        .delete(format!("{}/equipment/{}", BASE_URL, equipment_id))
        .bearer_auth(&staff)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = client
        .delete(format!("{}/equipment/{}", BASE_URL, equipment_id))
        .bearer_auth(&admin)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 204);

    // Repeated delete on a missing id is an error
    let response = client
        .delete(format!("{}/equipment/{}", BASE_URL, equipment_id))
        .bearer_auth(&admin)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 404);
}

#[tokio::test]
#[ignore]
async fn test_user_deactivation_is_soft_and_not_repeatable() {
    let client = Client::new();
    let admin = register_admin(&client).await;
    let (_, student_id) = register(&client, "Student", Some("ICT")).await;

    let response = client
        .delete(format!("{}/users/{}", BASE_URL, student_id))
        .bearer_auth(&admin)
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "Inactive");

    // Deactivating an already-Inactive account is an error, not a no-op
    let response = client
        .delete(format!("{}/users/{}", BASE_URL, student_id))
        .bearer_auth(&admin)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore]
async fn test_user_management_requires_admin() {
    let client = Client::new();
    let (student, _) = register(&client, "Student", Some("ICT")).await;

    let response = client
        .get(format!("{}/users", BASE_URL))
        .bearer_auth(&student)
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore]
async fn test_resource_publication_rights() {
    let client = Client::new();
    let (lecturer, _) = register(&client, "Lecturer", Some("ICT")).await;
    let (student, _) = register(&client, "Student", Some("ICT")).await;

    let resource = json!({
        "title": "Oscilloscope basics",
        "resource_type": "Video",
        "url": "https://example.com/oscilloscope-basics",
        "category": "Measurement",
        "is_essential": true,
    });

    let response = client
        .post(format!("{}/resources", BASE_URL))
        .bearer_auth(&student)
        .json(&resource)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = client
        .post(format!("{}/resources", BASE_URL))
        .bearer_auth(&lecturer)
        .json(&resource)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);

    // Public listing
    let response = client
        .get(format!("{}/resources", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
}

#[tokio::test]
#[ignore]
async fn test_reports_restricted_to_admin_and_hod() {
    let client = Client::new();
    let admin = register_admin(&client).await;
    let (hod, _) = register(&client, "HOD", Some("ICT")).await;
    let (stock_manager, _) = register(&client, "StockManager", Some("ICT")).await;

    for token in [&admin, &hod] {
        let response = client
            .get(format!("{}/dashboard/reports", BASE_URL))
            .bearer_auth(token)
            .send()
            .await
            .expect("Failed to send request");
        assert!(response.status().is_success());
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["weekly_activity"].as_array().unwrap().len(), 7);
        assert!(body["dept_distribution"].is_array());
        assert!(body["role_distribution"].is_array());
    }

    let response = client
        .get(format!("{}/dashboard/reports", BASE_URL))
        .bearer_auth(&stock_manager)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
