//! Dashboard statistics and report endpoints

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{error::AppResult, models::reservation::ReservationDetails};

use super::{AuthenticatedUser, OptionalUser};

/// Dashboard statistics. The populated sections depend on the actor:
/// anonymous callers get institution-wide totals only, staff get activity
/// detail, borrowers get their own counts.
#[derive(Debug, Default, Serialize, ToSchema)]
pub struct DashboardStats {
    /// Total equipment records
    pub total_equipment: i64,
    /// Total user accounts
    pub total_users: i64,
    /// Total learning resources
    pub total_resources: i64,
    /// Number of campus laboratories
    pub campus_labs: i64,
    /// Sum of available units across all equipment (staff only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_now: Option<i64>,
    /// Reservations currently Borrowed (staff only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_loans: Option<i64>,
    /// Five most recently updated reservations (staff only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recent_activity: Option<Vec<ReservationDetails>>,
    /// Available-vs-Borrowed breakdown for charting (staff only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock_status: Option<Vec<StockSlice>>,
    /// Own Borrowed count (borrowers only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub my_borrowed_items: Option<i64>,
    /// Own Pending count (borrowers only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_requests: Option<i64>,
    /// Own Overdue count (borrowers only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overdue_items: Option<i64>,
    /// Up to five own live reservations (borrowers only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub my_active_reservations: Option<Vec<ReservationDetails>>,
}

/// One slice of the stock-status chart
#[derive(Debug, Serialize, ToSchema)]
pub struct StockSlice {
    pub name: String,
    pub value: i64,
    pub color: String,
}

/// Label/value pair for distribution breakdowns
#[derive(Debug, Serialize, ToSchema)]
pub struct StatEntry {
    pub label: String,
    pub value: i64,
}

/// One day of reservation activity with the same weekday a week earlier
#[derive(Debug, Serialize, ToSchema)]
pub struct WeeklyActivityEntry {
    /// Short weekday name, e.g. "Mon"
    pub name: String,
    /// Reservations created that day
    pub value: i64,
    /// Reservations created the same weekday one week prior
    pub prev: i64,
}

/// Report summary totals
#[derive(Debug, Serialize, ToSchema)]
pub struct ReportTotals {
    pub total_users: i64,
    pub total_equipment: i64,
    pub active_loans: i64,
    pub pending_requests: i64,
    /// Returned vs overdue ratio, formatted as a percentage
    pub return_rate: String,
}

/// Full analytics report
#[derive(Debug, Serialize, ToSchema)]
pub struct ReportsResponse {
    pub weekly_activity: Vec<WeeklyActivityEntry>,
    pub dept_distribution: Vec<StatEntry>,
    pub role_distribution: Vec<StatEntry>,
    pub stats: ReportTotals,
}

/// Dashboard statistics, shaped by the (optional) actor
#[utoipa::path(
    get,
    path = "/dashboard/stats",
    tag = "dashboard",
    responses(
        (status = 200, description = "Dashboard statistics", body = DashboardStats)
    )
)]
pub async fn dashboard_stats(
    State(state): State<crate::AppState>,
    OptionalUser(claims): OptionalUser,
) -> AppResult<Json<DashboardStats>> {
    let stats = state.services.stats.dashboard(claims.as_ref()).await?;
    Ok(Json(stats))
}

/// Full analytics report (admin/HOD)
#[utoipa::path(
    get,
    path = "/dashboard/reports",
    tag = "dashboard",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Analytics report", body = ReportsResponse),
        (status = 403, description = "Insufficient rights to view reports")
    )
)]
pub async fn dashboard_reports(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<ReportsResponse>> {
    claims.require_view_analytics()?;

    let reports = state.services.stats.reports().await?;
    Ok(Json(reports))
}
