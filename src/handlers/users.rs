// src/handlers/users.rs

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use validator::Validate;

use crate::{
    common::{
        error::{ApiError, AppError},
        pagination::Pagination,
    },
    config::AppState,
    middleware::{
        i18n::Locale,
        rbac::{PermUserRead, RequirePermission},
        scope::UserScope,
    },
    models::auth::User,
};

// GET /api/users
#[utoipa::path(
    get,
    path = "/api/users",
    tag = "Users",
    params(Pagination),
    responses(
        (status = 200, description = "Users inside the caller's scope", body = [User])
    ),
    security(("api_jwt" = []))
)]
pub async fn list_users(
    State(app_state): State<AppState>,
    locale: Locale,
    _perm: RequirePermission<PermUserRead>,
    UserScope(scope): UserScope,
    Query(page): Query<Pagination>,
) -> Result<impl IntoResponse, ApiError> {
    page.validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;
    let (limit, offset) = page.limit_offset();

    let users = app_state
        .user_service
        .list_users(&scope, limit, offset)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(users))
}
