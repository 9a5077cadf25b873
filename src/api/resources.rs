//! Learning resource endpoints

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::resource::{CreateResource, Resource, ResourceQuery},
};

use super::{AuthenticatedUser, OptionalUser};

/// List learning resources. Public endpoint.
#[utoipa::path(
    get,
    path = "/resources",
    tag = "resources",
    params(ResourceQuery),
    responses(
        (status = 200, description = "Resource listing", body = Vec<Resource>),
        (status = 403, description = "Resource access revoked")
    )
)]
pub async fn list_resources(
    State(state): State<crate::AppState>,
    OptionalUser(claims): OptionalUser,
    Query(query): Query<ResourceQuery>,
) -> AppResult<Json<Vec<Resource>>> {
    let resources = state.services.resources.list(&query, claims.as_ref()).await?;
    Ok(Json(resources))
}

/// Publish a learning resource
#[utoipa::path(
    post,
    path = "/resources",
    tag = "resources",
    security(("bearer_auth" = [])),
    request_body = CreateResource,
    responses(
        (status = 201, description = "Resource published", body = Resource),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Insufficient rights to publish")
    )
)]
pub async fn create_resource(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(data): Json<CreateResource>,
) -> AppResult<(StatusCode, Json<Resource>)> {
    let resource = state.services.resources.create(data, &claims).await?;
    Ok((StatusCode::CREATED, Json(resource)))
}
