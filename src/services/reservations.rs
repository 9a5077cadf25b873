//! Reservation lifecycle service
//!
//! Owns the status state machine and its stock side effects. Status
//! transitions require department authority over the referenced equipment,
//! except that owners may cancel their own Pending reservations.

use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        reservation::{
            CreateReservation, ReservationDetails, ReservationStatus, UpdateReservationStatus,
        },
        user::UserClaims,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct ReservationsService {
    repository: Repository,
}

impl ReservationsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Create a Pending reservation for the acting user.
    ///
    /// Availability here is an advisory gate (no record is created against
    /// exhausted stock); the authoritative re-check happens at approval.
    pub async fn create(
        &self,
        claims: &UserClaims,
        data: CreateReservation,
    ) -> AppResult<ReservationDetails> {
        claims.require_reserve()?;
        data.validate()?;

        if data.end_date <= data.start_date {
            return Err(AppError::Validation("End date must be after start date".to_string()));
        }

        let equipment = self.repository.equipment.get_by_id(data.equipment_id).await?;
        if equipment.available <= 0 {
            return Err(AppError::Conflict("Equipment is not available".to_string()));
        }

        let reservation = self.repository.reservations.create(claims.user_id, &data).await?;
        self.repository.reservations.details_by_id(reservation.id, false).await
    }

    /// The acting user's own reservations, with equipment detail
    pub async fn my_reservations(&self, claims: &UserClaims) -> AppResult<Vec<ReservationDetails>> {
        self.repository.reservations.list_for_user(claims.user_id).await
    }

    /// All reservations with user and equipment detail. Departmental staff
    /// see only reservations against their department's equipment; admins
    /// see everything.
    pub async fn all_reservations(&self, claims: &UserClaims) -> AppResult<Vec<ReservationDetails>> {
        claims.require_staff()?;

        if claims.is_admin() {
            return self.repository.reservations.list_all(None).await;
        }
        match claims.department {
            Some(department) => self.repository.reservations.list_all(Some(department)).await,
            // Departmental staff without a department have authority over nothing
            None => Ok(Vec::new()),
        }
    }

    /// Transition a reservation's status.
    ///
    /// Staff with authority over the equipment's department drive the whole
    /// lifecycle; the owner may only cancel while the reservation is still
    /// Pending.
    pub async fn update_status(
        &self,
        claims: &UserClaims,
        id: Uuid,
        request: UpdateReservationStatus,
    ) -> AppResult<ReservationDetails> {
        let reservation = self.repository.reservations.get_by_id(id).await?;
        let equipment = self.repository.equipment.get_by_id(reservation.equipment_id).await?;

        let owner_cancel = request.status == ReservationStatus::Cancelled
            && reservation.user_id == claims.user_id
            && reservation.status == ReservationStatus::Pending;
        if !owner_cancel {
            claims.require_manage_department(equipment.department)?;
        }

        if !reservation.status.can_transition_to(request.status) {
            return Err(AppError::Conflict(format!(
                "Cannot transition a reservation from {} to {}",
                reservation.status, request.status
            )));
        }

        match request.status {
            ReservationStatus::Approved => {
                self.repository.reservations.approve(id, claims.user_id).await?;
            }
            ReservationStatus::Borrowed => {
                self.repository.reservations.issue(id).await?;
            }
            ReservationStatus::Returned | ReservationStatus::Cancelled => {
                self.repository
                    .reservations
                    .finish(id, request.status, request.return_condition.as_deref())
                    .await?;
            }
            ReservationStatus::Overdue => {
                self.repository.reservations.set_overdue(id).await?;
            }
            ReservationStatus::Pending => {
                // Unreachable through the transition table; kept for exhaustiveness
                return Err(AppError::Conflict(
                    "A reservation cannot be moved back to Pending".to_string(),
                ));
            }
        }

        self.repository.reservations.details_by_id(id, true).await
    }

    /// Mark live reservations whose end date has passed as Overdue.
    /// Invoked by the periodic sweep task; idempotent and safe to run
    /// concurrently with approvals and returns.
    pub async fn sweep_overdue(&self) -> AppResult<u64> {
        self.repository.reservations.mark_overdue(Utc::now()).await
    }
}
