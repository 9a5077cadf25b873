//! Reservation lifecycle endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::reservation::{CreateReservation, ReservationDetails, UpdateReservationStatus},
};

use super::AuthenticatedUser;

/// Create a Pending reservation for the acting user
#[utoipa::path(
    post,
    path = "/reservations",
    tag = "reservations",
    security(("bearer_auth" = [])),
    request_body = CreateReservation,
    responses(
        (status = 201, description = "Reservation created", body = ReservationDetails),
        (status = 403, description = "Borrowing not permitted for this account"),
        (status = 404, description = "Equipment not found"),
        (status = 409, description = "Equipment not available")
    )
)]
pub async fn create_reservation(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateReservation>,
) -> AppResult<(StatusCode, Json<ReservationDetails>)> {
    let reservation = state.services.reservations.create(&claims, request).await?;
    Ok((StatusCode::CREATED, Json(reservation)))
}

/// List the acting user's reservations with equipment detail
#[utoipa::path(
    get,
    path = "/reservations/my",
    tag = "reservations",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Own reservations", body = Vec<ReservationDetails>)
    )
)]
pub async fn my_reservations(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<ReservationDetails>>> {
    let reservations = state.services.reservations.my_reservations(&claims).await?;
    Ok(Json(reservations))
}

/// List all reservations (staff; department-scoped unless admin)
#[utoipa::path(
    get,
    path = "/reservations/all",
    tag = "reservations",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All visible reservations", body = Vec<ReservationDetails>),
        (status = 403, description = "Staff privileges required")
    )
)]
pub async fn all_reservations(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<ReservationDetails>>> {
    let reservations = state.services.reservations.all_reservations(&claims).await?;
    Ok(Json(reservations))
}

/// Transition a reservation's status (approve/issue/return/cancel)
#[utoipa::path(
    put,
    path = "/reservations/{id}",
    tag = "reservations",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Reservation ID")),
    request_body = UpdateReservationStatus,
    responses(
        (status = 200, description = "Status updated", body = ReservationDetails),
        (status = 403, description = "No authority over the equipment's department"),
        (status = 404, description = "Reservation not found"),
        (status = 409, description = "Invalid transition or stock exhausted")
    )
)]
pub async fn update_reservation_status(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateReservationStatus>,
) -> AppResult<Json<ReservationDetails>> {
    let reservation = state
        .services
        .reservations
        .update_status(&claims, id, request)
        .await?;
    Ok(Json(reservation))
}
