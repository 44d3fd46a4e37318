// src/middleware/scope.rs

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    services::scope_set::ScopeSet,
};

/// The caller's resolved scope. Resolved at most once per request and kept
/// in the request extensions; never shared across requests.
#[derive(Debug, Clone)]
pub struct UserScope(pub ScopeSet);

impl<S> FromRequestParts<S> for UserScope
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(cached) = parts.extensions.get::<UserScope>() {
            return Ok(cached.clone());
        }

        let app_state = AppState::from_ref(state);
        let Ok(locale) = Locale::from_request_parts(parts, state).await;

        let AuthenticatedUser(user) = parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| AppError::InvalidToken.to_api_error(&locale))?;

        let scope = app_state
            .scope_service
            .resolve_scope(&user)
            .await
            .map_err(|e| e.to_api_error(&locale))?;

        let scope = UserScope(scope);
        parts.extensions.insert(scope.clone());
        Ok(scope)
    }
}
