//! Learning resources repository for database operations

use sqlx::{Pool, Postgres};

use crate::{
    error::AppResult,
    models::resource::{CreateResource, Resource, ResourceQuery},
};

#[derive(Clone)]
pub struct ResourcesRepository {
    pool: Pool<Postgres>,
}

impl ResourcesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List resources, optionally filtered by category and type
    pub async fn list(&self, query: &ResourceQuery) -> AppResult<Vec<Resource>> {
        let mut conditions = Vec::new();
        let mut params: Vec<String> = Vec::new();

        if let Some(ref category) = query.category {
            params.push(category.clone());
            conditions.push(format!("category = ${}", params.len()));
        }
        if let Some(resource_type) = query.resource_type {
            params.push(resource_type.as_str().to_string());
            conditions.push(format!("resource_type = ${}", params.len()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let select_query = format!(
            "SELECT * FROM resources {} ORDER BY created_at DESC",
            where_clause
        );
        let mut builder = sqlx::query_as::<_, Resource>(&select_query);
        for param in &params {
            builder = builder.bind(param);
        }
        let resources = builder.fetch_all(&self.pool).await?;

        Ok(resources)
    }

    /// Create a resource. Department scope defaults to institution-wide.
    pub async fn create(&self, data: &CreateResource) -> AppResult<Resource> {
        let resource = sqlx::query_as::<_, Resource>(
            r#"
            INSERT INTO resources (title, resource_type, url, category, department,
                                   duration, size, thumbnail, is_essential)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(&data.title)
        .bind(data.resource_type)
        .bind(&data.url)
        .bind(&data.category)
        .bind(data.department.as_deref().unwrap_or("All"))
        .bind(&data.duration)
        .bind(&data.size)
        .bind(&data.thumbnail)
        .bind(data.is_essential.unwrap_or(false))
        .fetch_one(&self.pool)
        .await?;
        Ok(resource)
    }

    /// Total resource count
    pub async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM resources")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
