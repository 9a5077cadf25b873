//! Reservation model and status state machine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::equipment::EquipmentBrief;
use super::user::UserBrief;

// ---------------------------------------------------------------------------
// ReservationStatus
// ---------------------------------------------------------------------------

/// Reservation lifecycle status.
///
/// Happy path is Pending -> Approved -> Borrowed -> Returned. Returned and
/// Cancelled are terminal. Overdue is entered by the periodic sweep when the
/// end date passes before a terminal state is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum ReservationStatus {
    Pending,
    Approved,
    Borrowed,
    Returned,
    Overdue,
    Cancelled,
}

impl ReservationStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ReservationStatus::Returned | ReservationStatus::Cancelled)
    }

    /// Transition table. Staff may cancel an Approved reservation (the held
    /// stock unit is restocked); owners may only cancel while Pending.
    pub fn can_transition_to(&self, next: ReservationStatus) -> bool {
        use ReservationStatus::*;
        matches!(
            (*self, next),
            (Pending, Approved)
                | (Pending, Cancelled)
                | (Approved, Borrowed)
                | (Approved, Cancelled)
                | (Borrowed, Returned)
                | (Overdue, Returned)
                | (Overdue, Cancelled)
                | (Pending | Approved | Borrowed, Overdue)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Pending => "Pending",
            ReservationStatus::Approved => "Approved",
            ReservationStatus::Borrowed => "Borrowed",
            ReservationStatus::Returned => "Returned",
            ReservationStatus::Overdue => "Overdue",
            ReservationStatus::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ReservationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(ReservationStatus::Pending),
            "Approved" => Ok(ReservationStatus::Approved),
            "Borrowed" => Ok(ReservationStatus::Borrowed),
            "Returned" => Ok(ReservationStatus::Returned),
            "Overdue" => Ok(ReservationStatus::Overdue),
            "Cancelled" => Ok(ReservationStatus::Cancelled),
            _ => Err(format!("Invalid reservation status: {}", s)),
        }
    }
}

impl sqlx::Type<Postgres> for ReservationStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for ReservationStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for ReservationStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <String as Encode<Postgres>>::encode(self.as_str().to_string(), buf)
    }
}

// ---------------------------------------------------------------------------
// Reservation
// ---------------------------------------------------------------------------

/// Reservation record from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Reservation {
    pub id: Uuid,
    /// Owner; ownership never transfers
    pub user_id: Uuid,
    pub equipment_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: ReservationStatus,
    pub purpose: Option<String>,
    /// Module/course code the loan is for
    pub module_code: Option<String>,
    pub approved_by: Option<Uuid>,
    pub return_condition: Option<String>,
    /// True exactly while this reservation holds one decremented unit of
    /// the equipment's availability. Makes restock on terminal transitions
    /// idempotent regardless of the status path taken.
    #[serde(skip_serializing)]
    pub stock_held: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Reservation with user/equipment detail joined at query time
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReservationDetails {
    pub id: Uuid,
    pub status: ReservationStatus,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub purpose: Option<String>,
    pub module_code: Option<String>,
    pub return_condition: Option<String>,
    pub approved_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub equipment: EquipmentBrief,
    /// Present only in staff listings
    pub user: Option<UserBrief>,
}

/// Create reservation request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateReservation {
    pub equipment_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[validate(length(max = 500, message = "Purpose too long"))]
    pub purpose: Option<String>,
    pub module_code: Option<String>,
}

/// Status transition request
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateReservationStatus {
    pub status: ReservationStatus,
    /// Condition note recorded on return, e.g. "Good" or "Damaged"
    pub return_condition: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::ReservationStatus::*;

    #[test]
    fn happy_path_transitions() {
        assert!(Pending.can_transition_to(Approved));
        assert!(Approved.can_transition_to(Borrowed));
        assert!(Borrowed.can_transition_to(Returned));
    }

    #[test]
    fn cancellation_paths() {
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Approved.can_transition_to(Cancelled));
        assert!(!Borrowed.can_transition_to(Cancelled));
    }

    #[test]
    fn overdue_reachable_from_any_live_state() {
        assert!(Pending.can_transition_to(Overdue));
        assert!(Approved.can_transition_to(Overdue));
        assert!(Borrowed.can_transition_to(Overdue));
        assert!(Overdue.can_transition_to(Returned));
        assert!(Overdue.can_transition_to(Cancelled));
    }

    #[test]
    fn terminal_states_absorb() {
        for terminal in [Returned, Cancelled] {
            assert!(terminal.is_terminal());
            for next in [Pending, Approved, Borrowed, Returned, Overdue, Cancelled] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn no_skipping_approval() {
        assert!(!Pending.can_transition_to(Borrowed));
        assert!(!Pending.can_transition_to(Returned));
        assert!(!Approved.can_transition_to(Returned));
    }
}
