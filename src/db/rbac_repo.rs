// src/db/rbac_repo.rs

use sqlx::{Executor, PgPool, Postgres};

use crate::common::error::AppError;
use crate::models::rbac::Role;

#[derive(Clone)]
pub struct RbacRepository {
    pool: PgPool,
}

impl RbacRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_role<'e, E>(&self, executor: E, role_id: i64) -> Result<Option<Role>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let role = sqlx::query_as::<_, Role>(
            r#"
            SELECT id, name, scope_required_fields, scope_multiple_fields, created_at
            FROM roles
            WHERE id = $1
            "#,
        )
        .bind(role_id)
        .fetch_optional(executor)
        .await?;

        Ok(role)
    }

    pub async fn role_has_permission(&self, role_id: i64, permission_slug: &str) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM role_permissions
                WHERE role_id = $1 AND permission_slug = $2
            )
            "#,
        )
        .bind(role_id)
        .bind(permission_slug)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    // Slugs granted to a role (shown on GET /api/me/scope)
    pub async fn list_permissions(&self, role_id: i64) -> Result<Vec<String>, AppError> {
        let slugs = sqlx::query_scalar::<_, String>(
            "SELECT permission_slug FROM role_permissions WHERE role_id = $1 ORDER BY permission_slug",
        )
        .bind(role_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(slugs)
    }
}
