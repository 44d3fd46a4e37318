// src/db/scope_repo.rs

use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::error::AppError,
    models::scope::{ScopeAssignment, ScopeRow},
};

#[derive(Clone)]
pub struct ScopeRepository {
    pool: PgPool,
}

impl ScopeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_for_user(&self, user_id: i64) -> Result<Vec<ScopeRow>, AppError> {
        let rows = sqlx::query_as::<_, ScopeRow>(
            r#"
            SELECT id, user_id, badan_usaha_ids, division_ids, region_ids, cluster_ids, created_at
            FROM scopes
            WHERE user_id = $1
            ORDER BY id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn delete_for_user<'e, E>(&self, executor: E, user_id: i64) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM scopes WHERE user_id = $1")
            .bind(user_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }

    pub async fn insert<'e, E>(
        &self,
        executor: E,
        user_id: i64,
        scope: &ScopeAssignment,
    ) -> Result<ScopeRow, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, ScopeRow>(
            r#"
            INSERT INTO scopes (user_id, badan_usaha_ids, division_ids, region_ids, cluster_ids)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, badan_usaha_ids, division_ids, region_ids, cluster_ids, created_at
            "#,
        )
        .bind(user_id)
        .bind(scope.badan_usaha_ids.as_deref())
        .bind(scope.division_ids.as_deref())
        .bind(scope.region_ids.as_deref())
        .bind(scope.cluster_ids.as_deref())
        .fetch_one(executor)
        .await?;

        Ok(row)
    }
}
