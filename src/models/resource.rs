//! Learning resource model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

// ---------------------------------------------------------------------------
// ResourceType
// ---------------------------------------------------------------------------

/// Learning resource media type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum ResourceType {
    Video,
    #[serde(rename = "PDF")]
    Pdf,
    Link,
    Document,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Video => "Video",
            ResourceType::Pdf => "PDF",
            ResourceType::Link => "Link",
            ResourceType::Document => "Document",
        }
    }
}

impl std::str::FromStr for ResourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Video" => Ok(ResourceType::Video),
            "PDF" => Ok(ResourceType::Pdf),
            "Link" => Ok(ResourceType::Link),
            "Document" => Ok(ResourceType::Document),
            _ => Err(format!("Invalid resource type: {}", s)),
        }
    }
}

impl sqlx::Type<Postgres> for ResourceType {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for ResourceType {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for ResourceType {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <String as Encode<Postgres>>::encode(self.as_str().to_string(), buf)
    }
}

// ---------------------------------------------------------------------------
// Resource
// ---------------------------------------------------------------------------

/// Learning resource record. No lifecycle beyond creation.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Resource {
    pub id: Uuid,
    pub title: String,
    pub resource_type: ResourceType,
    pub url: String,
    pub category: Option<String>,
    /// Department scope; "All" means institution-wide
    pub department: String,
    pub duration: Option<String>,
    pub size: Option<String>,
    pub thumbnail: Option<String>,
    /// Flagged for pinned/priority display
    pub is_essential: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create resource request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateResource {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    pub resource_type: ResourceType,
    #[validate(url(message = "Invalid URL"))]
    pub url: String,
    pub category: Option<String>,
    pub department: Option<String>,
    pub duration: Option<String>,
    pub size: Option<String>,
    pub thumbnail: Option<String>,
    pub is_essential: Option<bool>,
}

/// Resource listing query parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ResourceQuery {
    pub category: Option<String>,
    #[serde(rename = "type")]
    pub resource_type: Option<ResourceType>,
}
