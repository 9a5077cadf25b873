//! Dashboard statistics and reporting service
//!
//! Read-only: every figure is derived by querying the normalized stores at
//! request time. Nothing here mutates state.

use std::collections::HashMap;

use chrono::{Duration, NaiveDate, Utc};
use sqlx::Row;

use crate::{
    api::stats::{
        DashboardStats, ReportTotals, ReportsResponse, StatEntry, StockSlice, WeeklyActivityEntry,
    },
    error::AppResult,
    models::{
        reservation::ReservationStatus,
        user::{Department, Role, UserClaims},
    },
    repository::Repository,
};

/// Number of campus laboratories shown on the public landing page
const CAMPUS_LABS: i64 = 12;

#[derive(Clone)]
pub struct StatsService {
    repository: Repository,
}

impl StatsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Dashboard statistics, shaped by the actor:
    /// institution-wide totals for everyone, activity detail for staff,
    /// personal counts for borrowers.
    pub async fn dashboard(&self, claims: Option<&UserClaims>) -> AppResult<DashboardStats> {
        let mut stats = DashboardStats {
            total_equipment: self.repository.equipment.count().await?,
            total_users: self.repository.users.count().await?,
            total_resources: self.repository.resources.count().await?,
            campus_labs: CAMPUS_LABS,
            ..Default::default()
        };

        let Some(claims) = claims else {
            return Ok(stats);
        };

        if claims.can_view_reports() {
            let available_now = self.repository.equipment.sum_available().await?;
            let active_loans = self
                .repository
                .reservations
                .count_by_status(ReservationStatus::Borrowed)
                .await?;

            stats.available_now = Some(available_now);
            stats.active_loans = Some(active_loans);
            stats.recent_activity = Some(self.repository.reservations.recent_activity(5).await?);
            stats.stock_status = Some(vec![
                StockSlice {
                    name: "Available".to_string(),
                    value: available_now,
                    color: "#22c55e".to_string(),
                },
                StockSlice {
                    name: "Borrowed".to_string(),
                    value: active_loans,
                    color: "#f59e0b".to_string(),
                },
            ]);
        } else {
            let user_id = claims.user_id;
            stats.my_borrowed_items = Some(
                self.repository
                    .reservations
                    .count_user_by_status(user_id, ReservationStatus::Borrowed)
                    .await?,
            );
            stats.pending_requests = Some(
                self.repository
                    .reservations
                    .count_user_by_status(user_id, ReservationStatus::Pending)
                    .await?,
            );
            stats.overdue_items = Some(
                self.repository
                    .reservations
                    .count_user_by_status(user_id, ReservationStatus::Overdue)
                    .await?,
            );
            stats.my_active_reservations =
                Some(self.repository.reservations.list_user_active(user_id, 5).await?);
        }

        Ok(stats)
    }

    /// Full analytics report: weekly reservation activity with a
    /// previous-week comparison, department-wise equipment distribution,
    /// role-wise user distribution, and summary totals.
    pub async fn reports(&self) -> AppResult<ReportsResponse> {
        let weekly_activity = self.weekly_activity().await?;

        let mut dept_distribution = Vec::with_capacity(Department::ALL.len());
        for department in Department::ALL {
            let count = self.repository.equipment.count_by_department(department).await?;
            dept_distribution.push(StatEntry {
                label: department.as_str().to_string(),
                value: count,
            });
        }

        let mut role_distribution = Vec::with_capacity(Role::ALL.len());
        for role in Role::ALL {
            let count = self.repository.users.count_by_role(role).await?;
            role_distribution.push(StatEntry {
                label: role.as_str().to_string(),
                value: count,
            });
        }

        let total_users = self.repository.users.count().await?;
        let total_equipment = self.repository.equipment.count().await?;
        let active_loans = self
            .repository
            .reservations
            .count_by_status(ReservationStatus::Borrowed)
            .await?;
        let pending_requests = self
            .repository
            .reservations
            .count_by_status(ReservationStatus::Pending)
            .await?;

        let returned = self
            .repository
            .reservations
            .count_by_status(ReservationStatus::Returned)
            .await?;
        let overdue = self
            .repository
            .reservations
            .count_by_status(ReservationStatus::Overdue)
            .await?;
        let return_rate = if returned + overdue > 0 {
            format!("{:.1}%", 100.0 * returned as f64 / (returned + overdue) as f64)
        } else {
            "100.0%".to_string()
        };

        Ok(ReportsResponse {
            weekly_activity,
            dept_distribution,
            role_distribution,
            stats: ReportTotals {
                total_users,
                total_equipment,
                active_loans,
                pending_requests,
                return_rate,
            },
        })
    }

    /// Reservations created per day for the last 7 calendar days, paired
    /// with the count for the same weekday one week prior.
    async fn weekly_activity(&self) -> AppResult<Vec<WeeklyActivityEntry>> {
        let today = Utc::now().date_naive();
        let window_start = today - Duration::days(13);

        let rows = sqlx::query(
            r#"
            SELECT DATE(created_at) AS day, COUNT(*) AS count
            FROM reservations
            WHERE DATE(created_at) >= $1
            GROUP BY DATE(created_at)
            "#,
        )
        .bind(window_start)
        .fetch_all(&self.repository.pool)
        .await?;

        let mut by_day: HashMap<NaiveDate, i64> = HashMap::new();
        for row in rows {
            let day: NaiveDate = row.get("day");
            let count: i64 = row.get("count");
            by_day.insert(day, count);
        }

        let mut entries = Vec::with_capacity(7);
        for offset in (0..7).rev() {
            let day = today - Duration::days(offset);
            let prev_day = day - Duration::days(7);
            entries.push(WeeklyActivityEntry {
                name: day.format("%a").to_string(),
                value: by_day.get(&day).copied().unwrap_or(0),
                prev: by_day.get(&prev_day).copied().unwrap_or(0),
            });
        }

        Ok(entries)
    }
}
