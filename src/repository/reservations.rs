//! Reservations repository for database operations
//!
//! Stock adjustments live here: the approve path atomically re-checks and
//! decrements the equipment's available count inside a transaction, and
//! terminal transitions restock through the reservation's stock_held flag.

use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, Pool, Postgres, Row};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        equipment::EquipmentBrief,
        reservation::{CreateReservation, Reservation, ReservationDetails, ReservationStatus},
        user::{Department, UserBrief},
    },
};

const DETAILS_SELECT: &str = r#"
    SELECT r.id, r.status, r.start_date, r.end_date, r.purpose, r.module_code,
           r.return_condition, r.approved_by, r.created_at, r.updated_at,
           e.id AS equipment_id, e.name AS equipment_name,
           e.category AS equipment_category, e.department AS equipment_department,
           e.image AS equipment_image,
           u.id AS owner_id, u.full_name AS owner_name, u.email AS owner_email,
           u.student_id AS owner_student_id, u.role AS owner_role
    FROM reservations r
    JOIN equipment e ON r.equipment_id = e.id
    JOIN users u ON r.user_id = u.id
"#;

/// Build the joined read model from a DETAILS_SELECT row
fn details_from_row(row: &PgRow, include_user: bool) -> ReservationDetails {
    ReservationDetails {
        id: row.get("id"),
        status: row.get("status"),
        start_date: row.get("start_date"),
        end_date: row.get("end_date"),
        purpose: row.get("purpose"),
        module_code: row.get("module_code"),
        return_condition: row.get("return_condition"),
        approved_by: row.get("approved_by"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        equipment: EquipmentBrief {
            id: row.get("equipment_id"),
            name: row.get("equipment_name"),
            category: row.get("equipment_category"),
            department: row.get("equipment_department"),
            image: row.get("equipment_image"),
        },
        user: if include_user {
            Some(UserBrief {
                id: row.get("owner_id"),
                full_name: row.get("owner_name"),
                email: row.get("owner_email"),
                student_id: row.get("owner_student_id"),
                role: row.get("owner_role"),
            })
        } else {
            None
        },
    }
}

#[derive(Clone)]
pub struct ReservationsRepository {
    pool: Pool<Postgres>,
}

impl ReservationsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get reservation by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Reservation> {
        sqlx::query_as::<_, Reservation>("SELECT * FROM reservations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Reservation {} not found", id)))
    }

    /// Create a new Pending reservation
    pub async fn create(&self, user_id: Uuid, data: &CreateReservation) -> AppResult<Reservation> {
        let reservation = sqlx::query_as::<_, Reservation>(
            r#"
            INSERT INTO reservations (user_id, equipment_id, start_date, end_date, purpose, module_code)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(data.equipment_id)
        .bind(data.start_date)
        .bind(data.end_date)
        .bind(&data.purpose)
        .bind(&data.module_code)
        .fetch_one(&self.pool)
        .await?;
        Ok(reservation)
    }

    /// Get joined details for one reservation
    pub async fn details_by_id(&self, id: Uuid, include_user: bool) -> AppResult<ReservationDetails> {
        let query = format!("{} WHERE r.id = $1", DETAILS_SELECT);
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Reservation {} not found", id)))?;
        Ok(details_from_row(&row, include_user))
    }

    /// List a user's reservations with equipment detail, newest first
    pub async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<ReservationDetails>> {
        let query = format!("{} WHERE r.user_id = $1 ORDER BY r.created_at DESC", DETAILS_SELECT);
        let rows = sqlx::query(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(|row| details_from_row(row, false)).collect())
    }

    /// List all reservations with user and equipment detail, newest first,
    /// optionally restricted to equipment owned by one department
    pub async fn list_all(&self, department: Option<Department>) -> AppResult<Vec<ReservationDetails>> {
        let rows = if let Some(department) = department {
            let query = format!("{} WHERE e.department = $1 ORDER BY r.created_at DESC", DETAILS_SELECT);
            sqlx::query(&query)
                .bind(department)
                .fetch_all(&self.pool)
                .await?
        } else {
            let query = format!("{} ORDER BY r.created_at DESC", DETAILS_SELECT);
            sqlx::query(&query).fetch_all(&self.pool).await?
        };
        Ok(rows.iter().map(|row| details_from_row(row, true)).collect())
    }

    /// Up to `limit` of a user's live reservations, most recently updated first
    pub async fn list_user_active(&self, user_id: Uuid, limit: i64) -> AppResult<Vec<ReservationDetails>> {
        let query = format!(
            r#"{} WHERE r.user_id = $1 AND r.status IN ('Pending', 'Approved', 'Borrowed', 'Overdue')
               ORDER BY r.updated_at DESC LIMIT $2"#,
            DETAILS_SELECT
        );
        let rows = sqlx::query(&query)
            .bind(user_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(|row| details_from_row(row, false)).collect())
    }

    /// The `limit` most recently updated reservations with joined names
    pub async fn recent_activity(&self, limit: i64) -> AppResult<Vec<ReservationDetails>> {
        let query = format!("{} ORDER BY r.updated_at DESC LIMIT $1", DETAILS_SELECT);
        let rows = sqlx::query(&query)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(|row| details_from_row(row, true)).collect())
    }

    /// Approve a Pending reservation, atomically taking one available unit.
    ///
    /// Availability is re-checked at approval time inside the transaction:
    /// two concurrent approvals of the last unit cannot both succeed, and
    /// the second receives a Conflict.
    pub async fn approve(&self, id: Uuid, approver: Uuid) -> AppResult<Reservation> {
        let mut tx = self.pool.begin().await?;

        let reservation = sqlx::query_as::<_, Reservation>(
            r#"
            UPDATE reservations
            SET status = 'Approved', approved_by = $2, stock_held = TRUE, updated_at = NOW()
            WHERE id = $1 AND status = 'Pending'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(approver)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(reservation) = reservation else {
            tx.rollback().await?;
            let current = self.get_by_id(id).await?;
            return Err(AppError::Conflict(format!(
                "Cannot approve a reservation in status {}",
                current.status
            )));
        };

        let updated = sqlx::query(
            r#"
            UPDATE equipment
            SET available = available - 1,
                status = CASE WHEN available - 1 = 0 THEN 'In Use' ELSE status END,
                updated_at = NOW()
            WHERE id = $1 AND available > 0
            "#,
        )
        .bind(reservation.equipment_id)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(AppError::Conflict("Equipment is no longer available".to_string()));
        }

        tx.commit().await?;
        Ok(reservation)
    }

    /// Issue an Approved reservation (hand the item over). Stock was
    /// already taken at approval time.
    pub async fn issue(&self, id: Uuid) -> AppResult<Reservation> {
        let reservation = sqlx::query_as::<_, Reservation>(
            r#"
            UPDATE reservations
            SET status = 'Borrowed', updated_at = NOW()
            WHERE id = $1 AND status = 'Approved'
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match reservation {
            Some(reservation) => Ok(reservation),
            None => {
                let current = self.get_by_id(id).await?;
                Err(AppError::Conflict(format!(
                    "Cannot issue a reservation in status {}",
                    current.status
                )))
            }
        }
    }

    /// Transition into a terminal state (Returned or Cancelled), restocking
    /// the held unit if one was taken at approval time.
    pub async fn finish(
        &self,
        id: Uuid,
        target: ReservationStatus,
        return_condition: Option<&str>,
    ) -> AppResult<Reservation> {
        if !target.is_terminal() {
            return Err(AppError::Validation(format!("{} is not a terminal status", target)));
        }

        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, Reservation>(
            "SELECT * FROM reservations WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Reservation {} not found", id)))?;

        if !current.status.can_transition_to(target) {
            tx.rollback().await?;
            return Err(AppError::Conflict(format!(
                "Cannot transition a reservation from {} to {}",
                current.status, target
            )));
        }

        if current.stock_held {
            sqlx::query(
                r#"
                UPDATE equipment
                SET available = available + 1, status = 'Available', updated_at = NOW()
                WHERE id = $1
                "#,
            )
            .bind(current.equipment_id)
            .execute(&mut *tx)
            .await?;
        }

        let reservation = sqlx::query_as::<_, Reservation>(
            r#"
            UPDATE reservations
            SET status = $2, return_condition = COALESCE($3, return_condition),
                stock_held = FALSE, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(target)
        .bind(return_condition)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(reservation)
    }

    /// Explicitly mark one live reservation Overdue
    pub async fn set_overdue(&self, id: Uuid) -> AppResult<Reservation> {
        let reservation = sqlx::query_as::<_, Reservation>(
            r#"
            UPDATE reservations
            SET status = 'Overdue', updated_at = NOW()
            WHERE id = $1 AND status IN ('Pending', 'Approved', 'Borrowed')
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match reservation {
            Some(reservation) => Ok(reservation),
            None => {
                let current = self.get_by_id(id).await?;
                Err(AppError::Conflict(format!(
                    "Cannot mark a reservation in status {} overdue",
                    current.status
                )))
            }
        }
    }

    /// Mark every live reservation whose end date has passed as Overdue.
    /// The WHERE clause is its own guard, so concurrent sweeps and
    /// transitions are safe. Returns the number of rows touched.
    pub async fn mark_overdue(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE reservations
            SET status = 'Overdue', updated_at = NOW()
            WHERE end_date < $1 AND status IN ('Pending', 'Approved', 'Borrowed')
            "#,
        )
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Count reservations in one status
    pub async fn count_by_status(&self, status: ReservationStatus) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reservations WHERE status = $1")
            .bind(status)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Count one user's reservations in one status
    pub async fn count_user_by_status(&self, user_id: Uuid, status: ReservationStatus) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM reservations WHERE user_id = $1 AND status = $2",
        )
        .bind(user_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}
