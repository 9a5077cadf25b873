//! API handlers for Labtrack REST endpoints

pub mod auth;
pub mod equipment;
pub mod health;
pub mod openapi;
pub mod reservations;
pub mod resources;
pub mod stats;
pub mod users;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::{error::AppError, models::user::UserClaims, AppState};

/// Extractor for authenticated user from JWT token
pub struct AuthenticatedUser(pub UserClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let claims = claims_from_parts(parts, state)?
            .ok_or_else(|| AppError::Authentication("Missing authorization header".to_string()))?;
        Ok(AuthenticatedUser(claims))
    }
}

/// Extractor for endpoints with optional authentication. A missing header
/// yields an anonymous actor; a present-but-invalid credential is still
/// rejected.
pub struct OptionalUser(pub Option<UserClaims>);

#[async_trait]
impl FromRequestParts<AppState> for OptionalUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(OptionalUser(claims_from_parts(parts, state)?))
    }
}

fn claims_from_parts(parts: &Parts, state: &AppState) -> Result<Option<UserClaims>, AppError> {
    let Some(auth_header) = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
    else {
        return Ok(None);
    };

    if !auth_header.starts_with("Bearer ") {
        return Err(AppError::Authentication("Invalid authorization header format".to_string()));
    }

    let token = &auth_header[7..];
    let claims = UserClaims::from_token(token, &state.config.auth.jwt_secret)
        .map_err(|e| AppError::Authentication(e.to_string()))?;

    Ok(Some(claims))
}
