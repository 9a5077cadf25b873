//! Equipment catalog service

use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppResult,
    models::{
        equipment::{CreateEquipment, Equipment, EquipmentPage, EquipmentQuery, UpdateEquipment},
        user::UserClaims,
    },
    repository::{equipment::EquipmentFilter, Repository},
};

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

#[derive(Clone)]
pub struct EquipmentService {
    repository: Repository,
}

impl EquipmentService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// List equipment. For departmental staff the department filter is
    /// forced to their own department, overriding any requested value;
    /// everyone else (including anonymous callers) filters freely.
    pub async fn list(
        &self,
        query: EquipmentQuery,
        claims: Option<&UserClaims>,
    ) -> AppResult<EquipmentPage> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);

        let department = match claims {
            Some(claims) if claims.is_departmental_staff() && claims.department.is_some() => {
                claims.department
            }
            _ => query.department,
        };

        let filter = EquipmentFilter {
            category: query.category,
            status: query.status,
            department,
            page,
            per_page,
        };

        let (equipment, total) = self.repository.equipment.list(&filter).await?;
        let pages = if total == 0 { 0 } else { (total + per_page - 1) / per_page };

        Ok(EquipmentPage {
            total,
            pages,
            current_page: page,
            equipment,
        })
    }

    /// Get equipment by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Equipment> {
        self.repository.equipment.get_by_id(id).await
    }

    /// Create equipment. The owning department is forced to the actor's
    /// department for non-admin staff, overriding any supplied value.
    pub async fn create(&self, mut data: CreateEquipment, claims: &UserClaims) -> AppResult<Equipment> {
        claims.require_staff()?;
        data.validate()?;

        let stock = data.stock.unwrap_or(1);
        let available = data.available.unwrap_or(stock);
        Self::check_counts(stock, available)?;

        if !claims.is_admin() && claims.department.is_some() {
            data.department = claims.department;
        }

        self.repository.equipment.create(&data).await
    }

    /// Update equipment, enforcing department authority
    pub async fn update(
        &self,
        id: Uuid,
        mut data: UpdateEquipment,
        claims: &UserClaims,
    ) -> AppResult<Equipment> {
        let existing = self.repository.equipment.get_by_id(id).await?;
        claims.require_manage_department(existing.department)?;
        data.validate()?;

        let stock = data.stock.unwrap_or(existing.stock);
        let available = data.available.unwrap_or(existing.available);
        Self::check_counts(stock, available)?;

        if !claims.is_admin() && claims.department.is_some() {
            data.department = claims.department;
        }

        self.repository.equipment.update(id, &data).await
    }

    /// Delete equipment (admin only, regardless of department)
    pub async fn delete(&self, id: Uuid, claims: &UserClaims) -> AppResult<()> {
        claims.require_admin()?;
        self.repository.equipment.delete(id).await
    }

    fn check_counts(stock: i32, available: i32) -> AppResult<()> {
        if stock < 0 || available < 0 || available > stock {
            return Err(crate::error::AppError::Validation(
                "available must be between 0 and stock".to_string(),
            ));
        }
        Ok(())
    }
}
