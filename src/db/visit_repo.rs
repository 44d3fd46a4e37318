// src/db/visit_repo.rs

use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::{common::error::AppError, models::visit::Visit, services::scope_set::Predicate};

#[derive(Clone)]
pub struct VisitRepository {
    pool: PgPool,
}

impl VisitRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Visits scoped through the visited outlet's hierarchy (alias `o`).
    pub async fn list_scoped(&self, filter: &Predicate, limit: i64, offset: i64) -> Result<Vec<Visit>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new(
            r#"
            SELECT v.id, v.user_id, v.outlet_id, o.name AS outlet_name,
                   v.checked_in_at, v.checked_out_at, v.notes,
                   o.badan_usaha_id, o.division_id, o.region_id, o.cluster_id
            FROM visits v
            INNER JOIN outlets o ON o.id = v.outlet_id
            WHERE o.deleted_at IS NULL AND "#,
        );
        filter.push_sql(&mut qb);
        qb.push(" ORDER BY v.checked_in_at DESC, v.id DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let visits = qb.build_query_as::<Visit>().fetch_all(&self.pool).await?;
        Ok(visits)
    }
}
