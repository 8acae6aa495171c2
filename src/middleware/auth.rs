use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use crate::error::AppError;
use crate::policy::Principal;
use crate::repo::users;
use crate::state::AppState;

/// Extracts the calling principal from `Authorization: Bearer <token>`.
///
/// Missing, malformed or unknown tokens are rejected with 401.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Principal);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or_else(|| AppError::Unauthorized("Authentication required".into()))?;

        // Token hashes are compared by the database index, not byte by byte here
        match users::find_by_token(&state.db, token).await? {
            Some(user) => Ok(AuthUser(user.into())),
            None => {
                tracing::debug!("rejected unknown bearer token");
                Err(AppError::Unauthorized("Invalid credentials".into()))
            }
        }
    }
}

/// Like [`AuthUser`] but additionally requires the superuser capability.
#[derive(Debug, Clone)]
pub struct RequireSuperuser(pub Principal);

impl FromRequestParts<AppState> for RequireSuperuser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let AuthUser(principal) = AuthUser::from_request_parts(parts, state).await?;
        if !principal.is_superuser {
            return Err(AppError::Forbidden("Superuser access required".into()));
        }
        Ok(RequireSuperuser(principal))
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
        Some(token)
    } else {
        None
    }
}
