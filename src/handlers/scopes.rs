// src/handlers/scopes.rs

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{PermScopeWrite, PermUserRead, RequirePermission},
        scope::UserScope,
    },
    models::scope::{MyScope, ReplaceScopesPayload, ScopeAssignment, ScopeRow},
    services::scope_set::ScopeSet,
};

// GET /api/me/scope
#[utoipa::path(
    get,
    path = "/api/me/scope",
    tag = "Scopes",
    responses(
        (status = 200, description = "The caller's resolved scope and permissions", body = MyScope)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_my_scope(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    UserScope(scope): UserScope,
) -> Result<impl IntoResponse, ApiError> {
    let role = app_state
        .rbac_repo
        .find_role(&app_state.db_pool, user.role_id)
        .await
        .and_then(|role| role.ok_or(AppError::NotFound("Role")))
        .map_err(|e| e.to_api_error(&locale))?;

    let permissions = app_state
        .rbac_repo
        .list_permissions(user.role_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let (unrestricted, entries) = match &scope {
        ScopeSet::Unrestricted => (true, Vec::new()),
        ScopeSet::Restricted(entries) => (false, entries.iter().map(ScopeAssignment::from).collect()),
    };

    Ok(Json(MyScope { user, role, unrestricted, entries, permissions }))
}

// GET /api/users/{id}/scopes
#[utoipa::path(
    get,
    path = "/api/users/{id}/scopes",
    tag = "Scopes",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "Stored scope rows of the user", body = [ScopeRow]),
        (status = 403, description = "User outside the caller's scope")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_user_scopes(
    State(app_state): State<AppState>,
    locale: Locale,
    _perm: RequirePermission<PermUserRead>,
    UserScope(scope): UserScope,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = app_state
        .scope_service
        .list_scopes(&scope, user_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(rows))
}

// PUT /api/users/{id}/scopes
#[utoipa::path(
    put,
    path = "/api/users/{id}/scopes",
    tag = "Scopes",
    request_body = ReplaceScopesPayload,
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "All scope rows replaced", body = [ScopeRow]),
        (status = 403, description = "User or granted rows outside the caller's scope"),
        (status = 422, description = "Assignment inconsistent with the hierarchy or the user's role")
    ),
    security(("api_jwt" = []))
)]
pub async fn replace_user_scopes(
    State(app_state): State<AppState>,
    locale: Locale,
    _perm: RequirePermission<PermScopeWrite>,
    UserScope(scope): UserScope,
    Path(user_id): Path<i64>,
    Json(payload): Json<ReplaceScopesPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let rows = app_state
        .scope_service
        .replace_scopes(&scope, user_id, payload.scopes)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(rows))
}
