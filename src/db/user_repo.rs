// src/db/user_repo.rs

use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::{common::error::AppError, models::auth::User, services::scope_set::Predicate};

const USER_COLUMNS: &str = "u.id, u.name, u.email, u.role_id, u.badan_usaha_id, u.division_id, \
                            u.region_id, u.cluster_id, u.created_at, u.updated_at";

// Repository for the `users` table
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Active (not soft-deleted) user by id
    pub async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users u WHERE u.id = $1 AND u.deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Users visible through `filter` (built from the caller's scope).
    pub async fn list_scoped(&self, filter: &Predicate, limit: i64, offset: i64) -> Result<Vec<User>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {USER_COLUMNS} FROM users u WHERE u.deleted_at IS NULL AND "
        ));
        filter.push_sql(&mut qb);
        qb.push(" ORDER BY u.name, u.id LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let users = qb.build_query_as::<User>().fetch_all(&self.pool).await?;
        Ok(users)
    }
}
