//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, equipment, health, reservations, resources, stats, users};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Labtrack API",
        version = "1.0.0",
        description = "University Laboratory Equipment Reservation and Inventory REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::register,
        auth::login,
        auth::me,
        // Equipment
        equipment::list_equipment,
        equipment::get_equipment,
        equipment::create_equipment,
        equipment::update_equipment,
        equipment::delete_equipment,
        // Reservations
        reservations::create_reservation,
        reservations::my_reservations,
        reservations::all_reservations,
        reservations::update_reservation_status,
        // Users
        users::list_users,
        users::create_user,
        users::update_user,
        users::delete_user,
        // Resources
        resources::list_resources,
        resources::create_resource,
        // Dashboard
        stats::dashboard_stats,
        stats::dashboard_reports,
    ),
    components(
        schemas(
            // Auth
            auth::LoginRequest,
            auth::AuthResponse,
            // Users
            crate::models::user::User,
            crate::models::user::UserBrief,
            crate::models::user::CreateUser,
            crate::models::user::UpdateUser,
            crate::models::user::RegisterRequest,
            crate::models::user::Role,
            crate::models::user::Department,
            crate::models::user::UserStatus,
            crate::models::user::Permissions,
            // Equipment
            crate::models::equipment::Equipment,
            crate::models::equipment::EquipmentBrief,
            crate::models::equipment::EquipmentPage,
            crate::models::equipment::EquipmentQuery,
            crate::models::equipment::CreateEquipment,
            crate::models::equipment::UpdateEquipment,
            crate::models::equipment::EquipmentStatus,
            // Reservations
            crate::models::reservation::Reservation,
            crate::models::reservation::ReservationDetails,
            crate::models::reservation::ReservationStatus,
            crate::models::reservation::CreateReservation,
            crate::models::reservation::UpdateReservationStatus,
            // Resources
            crate::models::resource::Resource,
            crate::models::resource::ResourceType,
            crate::models::resource::ResourceQuery,
            crate::models::resource::CreateResource,
            // Dashboard
            stats::DashboardStats,
            stats::StockSlice,
            stats::StatEntry,
            stats::WeeklyActivityEntry,
            stats::ReportTotals,
            stats::ReportsResponse,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication endpoints"),
        (name = "equipment", description = "Equipment catalog management"),
        (name = "reservations", description = "Reservation lifecycle"),
        (name = "users", description = "User management"),
        (name = "resources", description = "Learning resources"),
        (name = "dashboard", description = "Statistics and reports")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
