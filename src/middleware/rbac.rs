// src/middleware/rbac.rs

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use std::marker::PhantomData;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
};

/// A permission slug granted through `role_permissions`.
pub trait PermissionDef: Send + Sync + 'static {
    fn slug() -> &'static str;
}

/// Guard extractor: the caller's role must hold `T::slug()`.
pub struct RequirePermission<T>(pub PhantomData<T>);

impl<T, S> FromRequestParts<S> for RequirePermission<T>
where
    T: PermissionDef,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let Ok(locale) = Locale::from_request_parts(parts, state).await;

        let AuthenticatedUser(user) = parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| AppError::InvalidToken.to_api_error(&locale))?;

        let required = T::slug();
        let granted = app_state
            .rbac_repo
            .role_has_permission(user.role_id, required)
            .await
            .map_err(|e| e.to_api_error(&locale))?;

        if !granted {
            tracing::info!(user_id = user.id, permission = required, "permission denied");
            return Err(AppError::PermissionDenied(required).to_api_error(&locale));
        }

        Ok(RequirePermission(PhantomData))
    }
}

// ---
// PERMISSIONS
// ---

pub struct PermOutletRead;
impl PermissionDef for PermOutletRead {
    fn slug() -> &'static str { "outlet:read" }
}

pub struct PermOutletWrite;
impl PermissionDef for PermOutletWrite {
    fn slug() -> &'static str { "outlet:write" }
}

pub struct PermOutletApprove;
impl PermissionDef for PermOutletApprove {
    fn slug() -> &'static str { "outlet:approve" }
}

pub struct PermUserRead;
impl PermissionDef for PermUserRead {
    fn slug() -> &'static str { "user:read" }
}

pub struct PermVisitRead;
impl PermissionDef for PermVisitRead {
    fn slug() -> &'static str { "visit:read" }
}

pub struct PermScopeWrite;
impl PermissionDef for PermScopeWrite {
    fn slug() -> &'static str { "scope:write" }
}

pub struct PermOrgWrite;
impl PermissionDef for PermOrgWrite {
    fn slug() -> &'static str { "org:write" }
}
