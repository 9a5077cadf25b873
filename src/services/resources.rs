//! Learning resources service

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        resource::{CreateResource, Resource, ResourceQuery},
        user::{Capability, UserClaims},
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct ResourcesService {
    repository: Repository,
}

impl ResourcesService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// List resources. Anonymous callers get the public listing; an
    /// authenticated user whose resource-access permission was revoked is
    /// denied.
    pub async fn list(
        &self,
        query: &ResourceQuery,
        claims: Option<&UserClaims>,
    ) -> AppResult<Vec<Resource>> {
        if let Some(claims) = claims {
            let allowed = claims.has_capability(Capability::AccessResources)
                && claims.permissions.can_access_resources;
            if !allowed {
                return Err(AppError::Authorization(
                    "Resource access has been revoked for this account".to_string(),
                ));
            }
        }
        self.repository.resources.list(query).await
    }

    /// Publish a resource
    pub async fn create(&self, data: CreateResource, claims: &UserClaims) -> AppResult<Resource> {
        claims.require_publish_resources()?;
        data.validate()?;
        self.repository.resources.create(&data).await
    }
}
