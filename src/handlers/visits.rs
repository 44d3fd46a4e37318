// src/handlers/visits.rs

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
        rbac::{PermVisitRead, RequirePermission},
        scope::UserScope,
    },
    models::visit::Visit,
};

// GET /api/visits
#[utoipa::path(
    get,
    path = "/api/visits",
    tag = "Visits",
    params(Pagination),
    responses(
        (status = 200, description = "Visits to outlets inside the caller's scope, newest first", body = [Visit])
    ),
    security(("api_jwt" = []))
)]
pub async fn list_visits(
    State(app_state): State<AppState>,
    locale: Locale,
    _perm: RequirePermission<PermVisitRead>,
    UserScope(scope): UserScope,
    Query(page): Query<Pagination>,
) -> Result<impl IntoResponse, ApiError> {
    page.validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;
    let (limit, offset) = page.limit_offset();

    let visits = app_state
        .visit_service
        .list_visits(&scope, limit, offset)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(visits))
}
