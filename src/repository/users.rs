//! Users repository for database operations

use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::user::{CreateUser, Role, UpdateUser, User, UserStatus},
};

#[derive(Clone)]
pub struct UsersRepository {
    pool: Pool<Postgres>,
}

impl UsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    /// Get user by email (primary authentication method)
    pub async fn get_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE LOWER(email) = LOWER($1)",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Check if email already exists
    pub async fn email_exists(&self, email: &str, exclude_id: Option<Uuid>) -> AppResult<bool> {
        let exists: bool = if let Some(id) = exclude_id {
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = LOWER($1) AND id != $2)")
                .bind(email)
                .bind(id)
                .fetch_one(&self.pool)
                .await?
        } else {
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = LOWER($1))")
                .bind(email)
                .fetch_one(&self.pool)
                .await?
        };
        Ok(exists)
    }

    /// Check if a student/staff identifier already exists
    pub async fn student_id_exists(&self, student_id: &str, exclude_id: Option<Uuid>) -> AppResult<bool> {
        let exists: bool = if let Some(id) = exclude_id {
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE student_id = $1 AND id != $2)")
                .bind(student_id)
                .bind(id)
                .fetch_one(&self.pool)
                .await?
        } else {
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE student_id = $1)")
                .bind(student_id)
                .fetch_one(&self.pool)
                .await?
        };
        Ok(exists)
    }

    /// List all users, most recently created first
    pub async fn list(&self) -> AppResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    /// Create a user. The password hash and avatar are resolved by the
    /// caller; permission flags fall back to their defaults when omitted.
    pub async fn create(
        &self,
        data: &CreateUser,
        password_hash: &str,
        student_id: Option<&str>,
        avatar: Option<&str>,
    ) -> AppResult<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (
                full_name, email, password, role, department, student_id, avatar,
                can_borrow, can_reserve, can_access_resources, can_view_reports
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(&data.full_name)
        .bind(&data.email)
        .bind(password_hash)
        .bind(data.role)
        .bind(data.department)
        .bind(student_id)
        .bind(avatar)
        .bind(data.can_borrow.unwrap_or(true))
        .bind(data.can_reserve.unwrap_or(true))
        .bind(data.can_access_resources.unwrap_or(true))
        .bind(data.can_view_reports.unwrap_or(false))
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    /// Update a user, merging only the provided fields
    pub async fn update(&self, id: Uuid, data: &UpdateUser) -> AppResult<User> {
        let mut sets = vec!["updated_at = NOW()".to_string()];
        let mut idx = 2;

        macro_rules! add_field {
            ($field:expr, $name:expr) => {
                if $field.is_some() {
                    sets.push(format!("{} = ${}", $name, idx));
                    idx += 1;
                }
            };
        }

        add_field!(data.full_name, "full_name");
        add_field!(data.email, "email");
        add_field!(data.role, "role");
        add_field!(data.department, "department");
        add_field!(data.student_id, "student_id");
        add_field!(data.avatar, "avatar");
        add_field!(data.status, "status");
        add_field!(data.can_borrow, "can_borrow");
        add_field!(data.can_reserve, "can_reserve");
        add_field!(data.can_access_resources, "can_access_resources");
        add_field!(data.can_view_reports, "can_view_reports");
        let _ = idx;

        let query = format!("UPDATE users SET {} WHERE id = $1 RETURNING *", sets.join(", "));

        let mut builder = sqlx::query_as::<_, User>(&query).bind(id);

        macro_rules! bind_field {
            ($field:expr) => {
                if let Some(ref val) = $field {
                    builder = builder.bind(val);
                }
            };
        }

        bind_field!(data.full_name);
        bind_field!(data.email);
        bind_field!(data.role);
        bind_field!(data.department);
        bind_field!(data.student_id);
        bind_field!(data.avatar);
        bind_field!(data.status);
        bind_field!(data.can_borrow);
        bind_field!(data.can_reserve);
        bind_field!(data.can_access_resources);
        bind_field!(data.can_view_reports);

        builder
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    /// Change lifecycle status (soft-deactivation path)
    pub async fn set_status(&self, id: Uuid, status: UserStatus) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            "UPDATE users SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    /// Total user count
    pub async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// User count for one role
    pub async fn count_by_role(&self, role: Role) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = $1")
            .bind(role)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
