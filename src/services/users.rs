//! Authentication and user management service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::{CreateUser, RegisterRequest, Role, UpdateUser, User, UserClaims, UserStatus},
    repository::Repository,
};

/// Fallback password assigned when an admin creates an account without one
const TEMPORARY_PASSWORD: &str = "TemporaryPassword123!";

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
    config: AuthConfig,
}

impl UsersService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Authenticate by email and return a JWT token plus the user record
    pub async fn authenticate(&self, email: &str, password: &str) -> AppResult<(String, User)> {
        let user = self
            .repository
            .users
            .get_by_email(email)
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid email or password".to_string()))?;

        if user.status == UserStatus::Inactive {
            return Err(AppError::Authentication("Account is deactivated".to_string()));
        }

        if !Self::verify_password(&user.password, password)? {
            return Err(AppError::Authentication("Invalid email or password".to_string()));
        }

        let token = self.create_token(&user)?;
        Ok((token, user))
    }

    /// Register a new account and log it in
    pub async fn register(&self, data: RegisterRequest) -> AppResult<(String, User)> {
        data.validate()?;

        if self.repository.users.email_exists(&data.email, None).await? {
            return Err(AppError::Conflict("User already exists".to_string()));
        }
        if let Some(ref student_id) = data.student_id {
            if self.repository.users.student_id_exists(student_id, None).await? {
                return Err(AppError::Conflict("Student ID already registered".to_string()));
            }
        }

        let password_hash = Self::hash_password(&data.password)?;
        let avatar = Self::default_avatar(&data.full_name);
        // External identifier only kept for students
        let student_id = if data.role == Role::Student {
            data.student_id.as_deref()
        } else {
            None
        };

        let create = CreateUser {
            full_name: data.full_name.clone(),
            email: data.email.clone(),
            password: None,
            role: data.role,
            department: data.department,
            student_id: None,
            can_borrow: data.can_borrow,
            can_reserve: data.can_reserve,
            can_access_resources: data.can_access_resources,
            can_view_reports: data.can_view_reports,
        };
        let user = self
            .repository
            .users
            .create(&create, &password_hash, student_id, Some(&avatar))
            .await?;

        let token = self.create_token(&user)?;
        Ok((token, user))
    }

    /// Build a signed JWT for a user
    pub fn create_token(&self, user: &User) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let exp = now + (self.config.jwt_expiration_hours as i64 * 3600);

        let claims = UserClaims {
            sub: user.email.clone(),
            user_id: user.id,
            role: user.role,
            department: user.department,
            permissions: user.permissions(),
            exp,
            iat: now,
        };

        claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    /// Get a user by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<User> {
        self.repository.users.get_by_id(id).await
    }

    /// List all users, newest first
    pub async fn list(&self) -> AppResult<Vec<User>> {
        self.repository.users.list().await
    }

    /// Create a user account (admin path)
    pub async fn create_user(&self, data: CreateUser) -> AppResult<User> {
        data.validate()?;

        if self.repository.users.email_exists(&data.email, None).await? {
            return Err(AppError::Conflict("User already exists".to_string()));
        }
        if let Some(ref student_id) = data.student_id {
            if self.repository.users.student_id_exists(student_id, None).await? {
                return Err(AppError::Conflict("Student ID already registered".to_string()));
            }
        }

        let password_hash =
            Self::hash_password(data.password.as_deref().unwrap_or(TEMPORARY_PASSWORD))?;
        let avatar = Self::default_avatar(&data.full_name);
        let student_id = data.student_id.clone();

        self.repository
            .users
            .create(&data, &password_hash, student_id.as_deref(), Some(&avatar))
            .await
    }

    /// Update a user account (admin path)
    pub async fn update_user(&self, id: Uuid, data: UpdateUser) -> AppResult<User> {
        data.validate()?;

        if let Some(ref email) = data.email {
            if self.repository.users.email_exists(email, Some(id)).await? {
                return Err(AppError::Conflict("Email already in use".to_string()));
            }
        }
        if let Some(ref student_id) = data.student_id {
            if self.repository.users.student_id_exists(student_id, Some(id)).await? {
                return Err(AppError::Conflict("Student ID already registered".to_string()));
            }
        }

        self.repository.users.update(id, &data).await
    }

    /// Deactivate a user. A second deactivation of the same account is an
    /// error, not a no-op, and self-deactivation is rejected.
    pub async fn deactivate(&self, id: Uuid, actor_id: Uuid) -> AppResult<User> {
        let user = self.repository.users.get_by_id(id).await?;

        if user.id == actor_id {
            return Err(AppError::Validation(
                "You cannot deactivate your own account".to_string(),
            ));
        }
        if user.status == UserStatus::Inactive {
            return Err(AppError::Conflict("User is already deactivated".to_string()));
        }

        self.repository.users.set_status(id, UserStatus::Inactive).await
    }

    fn hash_password(password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
        Ok(hash.to_string())
    }

    fn verify_password(hash: &str, password: &str) -> AppResult<bool> {
        let parsed = PasswordHash::new(hash)
            .map_err(|e| AppError::Internal(format!("Invalid password hash: {}", e)))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }

    fn default_avatar(full_name: &str) -> String {
        format!(
            "https://ui-avatars.com/api/?name={}&background=1f4fa3&color=fff",
            full_name.replace(' ', "+")
        )
    }
}
