//! Equipment repository for database operations

use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        equipment::{CreateEquipment, Equipment, EquipmentStatus, UpdateEquipment},
        user::Department,
    },
};

/// Resolved listing filter; the department scoping decision is made by the
/// service before it reaches the repository.
#[derive(Debug, Default)]
pub struct EquipmentFilter {
    pub category: Option<String>,
    pub status: Option<EquipmentStatus>,
    pub department: Option<Department>,
    pub page: i64,
    pub per_page: i64,
}

#[derive(Clone)]
pub struct EquipmentRepository {
    pool: Pool<Postgres>,
}

impl EquipmentRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List equipment with filters and pagination, most recently created
    /// first. Returns the page slice and the total matching count.
    pub async fn list(&self, filter: &EquipmentFilter) -> AppResult<(Vec<Equipment>, i64)> {
        let mut conditions = Vec::new();
        let mut params: Vec<String> = Vec::new();

        if let Some(ref category) = filter.category {
            params.push(category.clone());
            conditions.push(format!("category = ${}", params.len()));
        }
        if let Some(status) = filter.status {
            params.push(status.as_str().to_string());
            conditions.push(format!("status = ${}", params.len()));
        }
        if let Some(department) = filter.department {
            params.push(department.as_str().to_string());
            conditions.push(format!("department = ${}", params.len()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let count_query = format!("SELECT COUNT(*) FROM equipment {}", where_clause);
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_query);
        for param in &params {
            count_builder = count_builder.bind(param);
        }
        let total = count_builder.fetch_one(&self.pool).await?;

        let offset = (filter.page - 1) * filter.per_page;
        let select_query = format!(
            "SELECT * FROM equipment {} ORDER BY created_at DESC, id DESC LIMIT {} OFFSET {}",
            where_clause, filter.per_page, offset
        );
        let mut select_builder = sqlx::query_as::<_, Equipment>(&select_query);
        for param in &params {
            select_builder = select_builder.bind(param);
        }
        let equipment = select_builder.fetch_all(&self.pool).await?;

        Ok((equipment, total))
    }

    /// Get equipment by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Equipment> {
        sqlx::query_as::<_, Equipment>("SELECT * FROM equipment WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Equipment {} not found", id)))
    }

    /// Create equipment. Stock defaults to 1, available to the stock count,
    /// status to Available.
    pub async fn create(&self, data: &CreateEquipment) -> AppResult<Equipment> {
        let stock = data.stock.unwrap_or(1);
        let available = data.available.unwrap_or(stock);
        let row = sqlx::query_as::<_, Equipment>(
            r#"
            INSERT INTO equipment (
                name, category, model_number, department, serial_number, asset_tag,
                description, purchase_date, warranty_expiry, cost, supplier,
                requires_maintenance, allow_overnight, status, location,
                stock, available, image, gallery_images, video_urls, manual_url
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15,
                    $16, $17, $18, $19, $20, $21)
            RETURNING *
            "#,
        )
        .bind(&data.name)
        .bind(&data.category)
        .bind(&data.model_number)
        .bind(data.department)
        .bind(&data.serial_number)
        .bind(&data.asset_tag)
        .bind(&data.description)
        .bind(data.purchase_date)
        .bind(data.warranty_expiry)
        .bind(data.cost)
        .bind(&data.supplier)
        .bind(data.requires_maintenance.unwrap_or(false))
        .bind(data.allow_overnight.unwrap_or(false))
        .bind(data.status.unwrap_or(EquipmentStatus::Available))
        .bind(&data.location)
        .bind(stock)
        .bind(available)
        .bind(&data.image)
        .bind(data.gallery_images.clone().unwrap_or_else(|| serde_json::json!([])))
        .bind(data.video_urls.clone().unwrap_or_else(|| serde_json::json!([])))
        .bind(&data.manual_url)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// Update equipment, merging only the provided fields
    pub async fn update(&self, id: Uuid, data: &UpdateEquipment) -> AppResult<Equipment> {
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

        add_field!(data.name, "name");
        add_field!(data.category, "category");
        add_field!(data.model_number, "model_number");
        add_field!(data.department, "department");
        add_field!(data.serial_number, "serial_number");
        add_field!(data.asset_tag, "asset_tag");
        add_field!(data.description, "description");
        add_field!(data.purchase_date, "purchase_date");
        add_field!(data.warranty_expiry, "warranty_expiry");
        add_field!(data.cost, "cost");
        add_field!(data.supplier, "supplier");
        add_field!(data.requires_maintenance, "requires_maintenance");
        add_field!(data.allow_overnight, "allow_overnight");
        add_field!(data.status, "status");
        add_field!(data.location, "location");
        add_field!(data.stock, "stock");
        add_field!(data.available, "available");
        add_field!(data.image, "image");
        add_field!(data.gallery_images, "gallery_images");
        add_field!(data.video_urls, "video_urls");
        add_field!(data.manual_url, "manual_url");
        let _ = idx;

        let query = format!("UPDATE equipment SET {} WHERE id = $1 RETURNING *", sets.join(", "));

        let mut builder = sqlx::query_as::<_, Equipment>(&query).bind(id);

        macro_rules! bind_field {
            ($field:expr) => {
                if let Some(ref val) = $field {
                    builder = builder.bind(val);
                }
            };
        }

        bind_field!(data.name);
        bind_field!(data.category);
        bind_field!(data.model_number);
        bind_field!(data.department);
        bind_field!(data.serial_number);
        bind_field!(data.asset_tag);
        bind_field!(data.description);
        bind_field!(data.purchase_date);
        bind_field!(data.warranty_expiry);
        bind_field!(data.cost);
        bind_field!(data.supplier);
        bind_field!(data.requires_maintenance);
        bind_field!(data.allow_overnight);
        bind_field!(data.status);
        bind_field!(data.location);
        bind_field!(data.stock);
        bind_field!(data.available);
        bind_field!(data.image);
        bind_field!(data.gallery_images);
        bind_field!(data.video_urls);
        bind_field!(data.manual_url);

        builder
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Equipment {} not found", id)))
    }

    /// Delete equipment. Repeated delete on a missing id is an error.
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM equipment WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Equipment {} not found", id)));
        }
        Ok(())
    }

    /// Total equipment count
    pub async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM equipment")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Equipment count for one department
    pub async fn count_by_department(&self, department: Department) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM equipment WHERE department = $1")
            .bind(department)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Sum of available units across all equipment
    pub async fn sum_available(&self) -> AppResult<i64> {
        let sum: i64 = sqlx::query_scalar("SELECT COALESCE(SUM(available), 0)::bigint FROM equipment")
            .fetch_one(&self.pool)
            .await?;
        Ok(sum)
    }
}
