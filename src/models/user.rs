//! User model, roles, capabilities and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// User roles (fixed enumeration)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Role {
    Student,
    Lecturer,
    Admin,
    #[serde(rename = "Lab Staff")]
    LabStaff,
    #[serde(rename = "HOD")]
    Hod,
    StockManager,
}

impl Role {
    /// All roles, in the order used by role-wise report breakdowns
    pub const ALL: [Role; 6] = [
        Role::Student,
        Role::Lecturer,
        Role::Admin,
        Role::LabStaff,
        Role::Hod,
        Role::StockManager,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "Student",
            Role::Lecturer => "Lecturer",
            Role::Admin => "Admin",
            Role::LabStaff => "Lab Staff",
            Role::Hod => "HOD",
            Role::StockManager => "StockManager",
        }
    }

    /// Capability set for this role.
    ///
    /// Policy checks test capabilities, never role literals, so adding a
    /// role only requires a new row here.
    pub fn capabilities(&self) -> &'static [Capability] {
        use Capability::*;
        match self {
            Role::Admin => &[ManageAllDepartments, ManageUsers, ViewReports, ViewAnalytics, AccessResources, PublishResources],
            Role::Hod => &[ManageOwnDepartment, ViewReports, ViewAnalytics, AccessResources, PublishResources],
            Role::StockManager => &[ManageOwnDepartment, ViewReports, AccessResources],
            Role::LabStaff => &[ManageOwnDepartment, AccessResources],
            Role::Lecturer => &[Borrow, Reserve, AccessResources, PublishResources],
            Role::Student => &[Borrow, Reserve, AccessResources],
        }
    }

    pub fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Student" => Ok(Role::Student),
            "Lecturer" => Ok(Role::Lecturer),
            "Admin" => Ok(Role::Admin),
            "Lab Staff" => Ok(Role::LabStaff),
            "HOD" => Ok(Role::Hod),
            "StockManager" => Ok(Role::StockManager),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

// SQLx conversion for Role (stored as TEXT)
impl sqlx::Type<Postgres> for Role {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for Role {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for Role {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <String as Encode<Postgres>>::encode(self.as_str().to_string(), buf)
    }
}

// ---------------------------------------------------------------------------
// Capability
// ---------------------------------------------------------------------------

/// Capabilities granted by roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Capability {
    /// Manage equipment and reservations in every department
    ManageAllDepartments,
    /// Manage equipment and reservations in the actor's own department
    ManageOwnDepartment,
    /// Administer user accounts
    ManageUsers,
    /// View dashboard statistics and the staff activity feed
    ViewReports,
    /// View the full analytics report (time series, distributions)
    ViewAnalytics,
    /// Borrow equipment
    Borrow,
    /// Reserve equipment
    Reserve,
    /// Access learning resources
    AccessResources,
    /// Publish learning resources
    PublishResources,
}

// ---------------------------------------------------------------------------
// Department
// ---------------------------------------------------------------------------

/// Departments (fixed enumeration)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Department {
    #[serde(rename = "Renewable Energy")]
    RenewableEnergy,
    Mechatronic,
    #[serde(rename = "ICT")]
    Ict,
    #[serde(rename = "Electronic and Telecommunication")]
    ElectronicTelecom,
}

impl Department {
    /// All departments, in the order used by report breakdowns
    pub const ALL: [Department; 4] = [
        Department::RenewableEnergy,
        Department::Mechatronic,
        Department::Ict,
        Department::ElectronicTelecom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Department::RenewableEnergy => "Renewable Energy",
            Department::Mechatronic => "Mechatronic",
            Department::Ict => "ICT",
            Department::ElectronicTelecom => "Electronic and Telecommunication",
        }
    }
}

impl std::fmt::Display for Department {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Department {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Renewable Energy" => Ok(Department::RenewableEnergy),
            "Mechatronic" => Ok(Department::Mechatronic),
            "ICT" => Ok(Department::Ict),
            "Electronic and Telecommunication" => Ok(Department::ElectronicTelecom),
            _ => Err(format!("Invalid department: {}", s)),
        }
    }
}

impl sqlx::Type<Postgres> for Department {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for Department {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for Department {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <String as Encode<Postgres>>::encode(self.as_str().to_string(), buf)
    }
}

// ---------------------------------------------------------------------------
// UserStatus
// ---------------------------------------------------------------------------

/// User lifecycle status. Users are never hard-deleted; deactivation is a
/// transition to Inactive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum UserStatus {
    Active,
    Offline,
    Inactive,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Active => "Active",
            UserStatus::Offline => "Offline",
            UserStatus::Inactive => "Inactive",
        }
    }
}

impl std::str::FromStr for UserStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Active" => Ok(UserStatus::Active),
            "Offline" => Ok(UserStatus::Offline),
            "Inactive" => Ok(UserStatus::Inactive),
            _ => Err(format!("Invalid user status: {}", s)),
        }
    }
}

impl sqlx::Type<Postgres> for UserStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for UserStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for UserStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <String as Encode<Postgres>>::encode(self.as_str().to_string(), buf)
    }
}

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// Per-user permission flags, granted independently of role
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct Permissions {
    pub can_borrow: bool,
    pub can_reserve: bool,
    pub can_access_resources: bool,
    pub can_view_reports: bool,
}

/// Full user model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    /// Hashed password (argon2)
    #[serde(skip_serializing)]
    pub password: String,
    pub role: Role,
    pub department: Option<Department>,
    /// External student/staff identifier, unique when present
    pub student_id: Option<String>,
    pub avatar: Option<String>,
    pub status: UserStatus,
    pub can_borrow: bool,
    pub can_reserve: bool,
    pub can_access_resources: bool,
    pub can_view_reports: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn permissions(&self) -> Permissions {
        Permissions {
            can_borrow: self.can_borrow,
            can_reserve: self.can_reserve,
            can_access_resources: self.can_access_resources,
            can_view_reports: self.can_view_reports,
        }
    }
}

/// Short user representation joined into reservation listings
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserBrief {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub student_id: Option<String>,
    pub role: Role,
}

/// Create user request (admin)
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUser {
    #[validate(length(min = 1, message = "Full name is required"))]
    pub full_name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    /// Initial password; a temporary one is assigned when omitted
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: Option<String>,
    pub role: Role,
    pub department: Option<Department>,
    pub student_id: Option<String>,
    pub can_borrow: Option<bool>,
    pub can_reserve: Option<bool>,
    pub can_access_resources: Option<bool>,
    pub can_view_reports: Option<bool>,
}

/// Self-registration request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(length(min = 1, message = "Full name is required"))]
    pub full_name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    pub role: Role,
    pub department: Option<Department>,
    pub student_id: Option<String>,
    pub can_borrow: Option<bool>,
    pub can_reserve: Option<bool>,
    pub can_access_resources: Option<bool>,
    pub can_view_reports: Option<bool>,
}

/// Update user request (admin). Password changes go through the profile
/// endpoint, not here.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateUser {
    pub full_name: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    pub role: Option<Role>,
    pub department: Option<Department>,
    pub student_id: Option<String>,
    pub avatar: Option<String>,
    pub status: Option<UserStatus>,
    pub can_borrow: Option<bool>,
    pub can_reserve: Option<bool>,
    pub can_access_resources: Option<bool>,
    pub can_view_reports: Option<bool>,
}

// ---------------------------------------------------------------------------
// Claims
// ---------------------------------------------------------------------------

/// JWT claims for authenticated users. This is the explicit per-request
/// actor context handed to every policy check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: String,
    pub user_id: Uuid,
    pub role: Role,
    pub department: Option<Department>,
    pub permissions: Permissions,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    pub fn has_capability(&self, capability: Capability) -> bool {
        self.role.has_capability(capability)
    }

    /// Whether the actor can manage every department's resources
    pub fn is_admin(&self) -> bool {
        self.has_capability(Capability::ManageAllDepartments)
    }

    /// Staff whose authority is scoped to their own department
    pub fn is_departmental_staff(&self) -> bool {
        self.has_capability(Capability::ManageOwnDepartment)
    }

    /// Whether the actor has authority over resources owned by `department`.
    ///
    /// Department-less (institution-wide) resources are managed by admins only.
    pub fn can_manage_department(&self, department: Option<Department>) -> bool {
        if self.is_admin() {
            return true;
        }
        if self.is_departmental_staff() {
            return self.department.is_some() && self.department == department;
        }
        false
    }

    pub fn require_manage_department(&self, department: Option<Department>) -> Result<(), AppError> {
        if self.can_manage_department(department) {
            Ok(())
        } else {
            Err(AppError::Authorization(
                "You can only manage equipment in your department".to_string(),
            ))
        }
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Authorization("Administrator privileges required".to_string()))
        }
    }

    pub fn require_manage_users(&self) -> Result<(), AppError> {
        if self.has_capability(Capability::ManageUsers) {
            Ok(())
        } else {
            Err(AppError::Authorization("Insufficient rights to manage users".to_string()))
        }
    }

    pub fn require_staff(&self) -> Result<(), AppError> {
        if self.is_admin() || self.is_departmental_staff() {
            Ok(())
        } else {
            Err(AppError::Authorization("Staff privileges required".to_string()))
        }
    }

    /// Dashboard/report access: granted by role capability or by the
    /// per-user permission flag.
    pub fn can_view_reports(&self) -> bool {
        self.has_capability(Capability::ViewReports) || self.permissions.can_view_reports
    }

    pub fn require_view_analytics(&self) -> Result<(), AppError> {
        if self.has_capability(Capability::ViewAnalytics) {
            Ok(())
        } else {
            Err(AppError::Authorization("Insufficient rights to view reports".to_string()))
        }
    }

    pub fn require_publish_resources(&self) -> Result<(), AppError> {
        if self.has_capability(Capability::PublishResources) {
            Ok(())
        } else {
            Err(AppError::Authorization("Insufficient rights to publish resources".to_string()))
        }
    }

    /// Borrowing requires the role capability and the per-user flag
    pub fn require_reserve(&self) -> Result<(), AppError> {
        let capable = self.has_capability(Capability::Borrow) || self.has_capability(Capability::Reserve);
        let permitted = self.permissions.can_borrow || self.permissions.can_reserve;
        if capable && permitted {
            Ok(())
        } else {
            Err(AppError::Authorization("You are not permitted to reserve equipment".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(role: Role, department: Option<Department>) -> UserClaims {
        UserClaims {
            sub: "test@example.com".to_string(),
            user_id: Uuid::new_v4(),
            role,
            department,
            permissions: Permissions {
                can_borrow: true,
                can_reserve: true,
                can_access_resources: true,
                can_view_reports: false,
            },
            exp: 0,
            iat: 0,
        }
    }

    #[test]
    fn admin_manages_every_department() {
        let admin = claims(Role::Admin, None);
        assert!(admin.can_manage_department(Some(Department::Ict)));
        assert!(admin.can_manage_department(Some(Department::Mechatronic)));
        assert!(admin.can_manage_department(None));
    }

    #[test]
    fn departmental_staff_scoped_to_own_department() {
        let staff = claims(Role::StockManager, Some(Department::Ict));
        assert!(staff.can_manage_department(Some(Department::Ict)));
        assert!(!staff.can_manage_department(Some(Department::Mechatronic)));
        // Institution-wide equipment is admin territory
        assert!(!staff.can_manage_department(None));
    }

    #[test]
    fn borrowers_manage_nothing() {
        let student = claims(Role::Student, Some(Department::Ict));
        assert!(!student.can_manage_department(Some(Department::Ict)));
        assert!(student.require_staff().is_err());
        assert!(student.require_reserve().is_ok());
    }

    #[test]
    fn reserve_denied_without_permission_flags() {
        let mut student = claims(Role::Student, None);
        student.permissions.can_borrow = false;
        student.permissions.can_reserve = false;
        assert!(student.require_reserve().is_err());
    }

    #[test]
    fn reserve_denied_for_staff_without_borrow_capability() {
        let staff = claims(Role::LabStaff, Some(Department::Ict));
        assert!(staff.require_reserve().is_err());
    }

    #[test]
    fn role_strings_round_trip() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        for dept in Department::ALL {
            assert_eq!(dept.as_str().parse::<Department>().unwrap(), dept);
        }
    }
}
