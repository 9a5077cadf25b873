//! Equipment model and related types

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::user::Department;

// ---------------------------------------------------------------------------
// EquipmentStatus
// ---------------------------------------------------------------------------

/// Equipment lifecycle status.
///
/// Available/InUse derive from the available count on reservation
/// transitions; Maintenance/Lost are set directly by staff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum EquipmentStatus {
    Available,
    #[serde(rename = "In Use")]
    InUse,
    Maintenance,
    Lost,
}

impl EquipmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EquipmentStatus::Available => "Available",
            EquipmentStatus::InUse => "In Use",
            EquipmentStatus::Maintenance => "Maintenance",
            EquipmentStatus::Lost => "Lost",
        }
    }
}

impl std::fmt::Display for EquipmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for EquipmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Available" => Ok(EquipmentStatus::Available),
            "In Use" => Ok(EquipmentStatus::InUse),
            "Maintenance" => Ok(EquipmentStatus::Maintenance),
            "Lost" => Ok(EquipmentStatus::Lost),
            _ => Err(format!("Invalid equipment status: {}", s)),
        }
    }
}

impl sqlx::Type<Postgres> for EquipmentStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for EquipmentStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for EquipmentStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <String as Encode<Postgres>>::encode(self.as_str().to_string(), buf)
    }
}

// ---------------------------------------------------------------------------
// Equipment
// ---------------------------------------------------------------------------

/// Equipment record
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Equipment {
    pub id: Uuid,
    pub name: String,
    pub model_number: Option<String>,
    pub category: String,
    /// Owning department; None means institution-wide
    pub department: Option<Department>,
    pub serial_number: Option<String>,
    pub asset_tag: Option<String>,
    pub description: Option<String>,
    pub purchase_date: Option<NaiveDate>,
    pub warranty_expiry: Option<NaiveDate>,
    #[schema(value_type = Option<f64>)]
    pub cost: Option<Decimal>,
    pub supplier: Option<String>,
    pub requires_maintenance: bool,
    pub allow_overnight: bool,
    pub status: EquipmentStatus,
    pub location: Option<String>,
    /// Total owned units
    pub stock: i32,
    /// Units not currently checked out; 0 <= available <= stock
    pub available: i32,
    pub image: Option<String>,
    #[schema(value_type = Vec<String>)]
    pub gallery_images: serde_json::Value,
    #[schema(value_type = Vec<String>)]
    pub video_urls: serde_json::Value,
    pub manual_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Short equipment representation joined into reservation listings
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EquipmentBrief {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub department: Option<Department>,
    pub image: Option<String>,
}

/// Create equipment request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateEquipment {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "Category is required"))]
    pub category: String,
    pub model_number: Option<String>,
    pub department: Option<Department>,
    pub serial_number: Option<String>,
    pub asset_tag: Option<String>,
    pub description: Option<String>,
    pub purchase_date: Option<NaiveDate>,
    pub warranty_expiry: Option<NaiveDate>,
    #[schema(value_type = Option<f64>)]
    pub cost: Option<Decimal>,
    pub supplier: Option<String>,
    pub requires_maintenance: Option<bool>,
    pub allow_overnight: Option<bool>,
    pub status: Option<EquipmentStatus>,
    pub location: Option<String>,
    /// Total units; defaults to 1
    pub stock: Option<i32>,
    /// Units currently available; defaults to stock
    pub available: Option<i32>,
    pub image: Option<String>,
    #[schema(value_type = Option<Vec<String>>)]
    pub gallery_images: Option<serde_json::Value>,
    #[schema(value_type = Option<Vec<String>>)]
    pub video_urls: Option<serde_json::Value>,
    pub manual_url: Option<String>,
}

/// Update equipment request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateEquipment {
    pub name: Option<String>,
    pub category: Option<String>,
    pub model_number: Option<String>,
    pub department: Option<Department>,
    pub serial_number: Option<String>,
    pub asset_tag: Option<String>,
    pub description: Option<String>,
    pub purchase_date: Option<NaiveDate>,
    pub warranty_expiry: Option<NaiveDate>,
    #[schema(value_type = Option<f64>)]
    pub cost: Option<Decimal>,
    pub supplier: Option<String>,
    pub requires_maintenance: Option<bool>,
    pub allow_overnight: Option<bool>,
    pub status: Option<EquipmentStatus>,
    pub location: Option<String>,
    pub stock: Option<i32>,
    pub available: Option<i32>,
    pub image: Option<String>,
    #[schema(value_type = Option<Vec<String>>)]
    pub gallery_images: Option<serde_json::Value>,
    #[schema(value_type = Option<Vec<String>>)]
    pub video_urls: Option<serde_json::Value>,
    pub manual_url: Option<String>,
}

/// Equipment listing query parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct EquipmentQuery {
    pub category: Option<String>,
    pub status: Option<EquipmentStatus>,
    pub department: Option<Department>,
    /// Page number (default: 1)
    pub page: Option<i64>,
    /// Page size (default: 20)
    pub limit: Option<i64>,
}

/// Paginated equipment listing
#[derive(Debug, Serialize, ToSchema)]
pub struct EquipmentPage {
    pub total: i64,
    pub pages: i64,
    pub current_page: i64,
    pub equipment: Vec<Equipment>,
}
