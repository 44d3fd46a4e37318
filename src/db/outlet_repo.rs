// src/db/outlet_repo.rs

use sqlx::{Executor, PgPool, Postgres, QueryBuilder};

use crate::{
    common::error::AppError,
    models::outlet::{NewOutlet, NewOutletHistory, Outlet, OutletHistory, OutletLevel, OutletStatus},
    services::{outlet_lifecycle::OutletChange, scope_set::Predicate},
};

const OUTLET_COLUMNS: &str = r#"o.id, o.name, o.code, o.address, o.level, o.status, o."limit",
    o.badan_usaha_id, o.division_id, o.region_id, o.cluster_id,
    o.created_at, o.updated_at, o.deleted_at"#;

const HISTORY_COLUMNS: &str = "h.id, h.outlet_id, h.from_level, h.to_level, h.requested_by, \
    h.approved_by, h.approval_status, h.approval_notes, h.requested_at, h.approved_at";

#[derive(Clone)]
pub struct OutletRepository {
    pool: PgPool,
}

impl OutletRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  OUTLETS
    // =========================================================================

    pub async fn find_by_id<'e, E>(&self, executor: E, id: i64) -> Result<Option<Outlet>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let outlet = sqlx::query_as::<_, Outlet>(&format!(
            "SELECT {OUTLET_COLUMNS} FROM outlets o WHERE o.id = $1 AND o.deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(outlet)
    }

    /// Same as `find_by_id` but takes the row lock; concurrent lifecycle
    /// operations on the outlet queue behind it until commit.
    pub async fn lock_by_id<'e, E>(&self, executor: E, id: i64) -> Result<Option<Outlet>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let outlet = sqlx::query_as::<_, Outlet>(&format!(
            "SELECT {OUTLET_COLUMNS} FROM outlets o WHERE o.id = $1 AND o.deleted_at IS NULL FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(outlet)
    }

    pub async fn create_outlet<'e, E>(&self, executor: E, outlet: &NewOutlet) -> Result<Outlet, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Outlet>(&format!(
            r#"
            INSERT INTO outlets AS o (
                name, code, address, level, status,
                badan_usaha_id, division_id, region_id, cluster_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {OUTLET_COLUMNS}
            "#
        ))
        .bind(&outlet.name)
        .bind(outlet.code.as_deref())
        .bind(outlet.address.as_deref())
        .bind(outlet.level)
        .bind(OutletStatus::Maintain)
        .bind(outlet.badan_usaha_id)
        .bind(outlet.division_id)
        .bind(outlet.region_id)
        .bind(outlet.cluster_id)
        .fetch_one(executor)
        .await
        .map_err(|e| AppError::from_outlet_write(e, outlet.code.as_deref()))
    }

    /// Writes a planned lifecycle change. `Unchanged` is a plain re-read.
    pub async fn apply_change<'e, E>(
        &self,
        executor: E,
        outlet_id: i64,
        change: &OutletChange,
    ) -> Result<Outlet, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let returning = format!("RETURNING {OUTLET_COLUMNS}");

        let outlet = match change {
            OutletChange::Unchanged => {
                return self
                    .find_by_id(executor, outlet_id)
                    .await?
                    .ok_or(AppError::NotFound("Outlet"));
            }
            OutletChange::Level(level) => {
                sqlx::query_as::<_, Outlet>(&format!(
                    "UPDATE outlets AS o SET level = $2, updated_at = NOW() WHERE o.id = $1 {returning}"
                ))
                .bind(outlet_id)
                .bind(*level)
                .fetch_one(executor)
                .await?
            }
            OutletChange::Promote { code, limit } => {
                sqlx::query_as::<_, Outlet>(&format!(
                    r#"UPDATE outlets AS o
                       SET level = $2, status = $3, code = $4, "limit" = $5, updated_at = NOW()
                       WHERE o.id = $1 {returning}"#
                ))
                .bind(outlet_id)
                .bind(OutletLevel::Member)
                .bind(OutletStatus::Maintain)
                .bind(code.as_str())
                .bind(*limit)
                .fetch_one(executor)
                .await
                .map_err(|e| AppError::from_outlet_write(e, Some(code)))?
            }
            OutletChange::MarkUnproductive => {
                sqlx::query_as::<_, Outlet>(&format!(
                    "UPDATE outlets AS o SET status = $2, updated_at = NOW() WHERE o.id = $1 {returning}"
                ))
                .bind(outlet_id)
                .bind(OutletStatus::Unproductive)
                .fetch_one(executor)
                .await?
            }
        };

        Ok(outlet)
    }

    /// Outlets visible through `filter`, optionally narrowed to one level.
    pub async fn list_scoped(
        &self,
        filter: &Predicate,
        level: Option<OutletLevel>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Outlet>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {OUTLET_COLUMNS} FROM outlets o WHERE o.deleted_at IS NULL AND "
        ));
        filter.push_sql(&mut qb);
        if let Some(level) = level {
            qb.push(" AND o.level = ").push_bind(level);
        }
        qb.push(" ORDER BY o.id DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let outlets = qb.build_query_as::<Outlet>().fetch_all(&self.pool).await?;
        Ok(outlets)
    }

    // =========================================================================
    //  HISTORY (append-only)
    // =========================================================================

    pub async fn latest_history<'e, E>(&self, executor: E, outlet_id: i64) -> Result<Option<OutletHistory>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let history = sqlx::query_as::<_, OutletHistory>(&format!(
            "SELECT {HISTORY_COLUMNS} FROM outlet_histories h WHERE h.outlet_id = $1 ORDER BY h.id DESC LIMIT 1"
        ))
        .bind(outlet_id)
        .fetch_optional(executor)
        .await?;

        Ok(history)
    }

    pub async fn find_history<'e, E>(&self, executor: E, id: i64) -> Result<Option<OutletHistory>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let history = sqlx::query_as::<_, OutletHistory>(&format!(
            "SELECT {HISTORY_COLUMNS} FROM outlet_histories h WHERE h.id = $1"
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(history)
    }

    pub async fn list_histories(&self, outlet_id: i64) -> Result<Vec<OutletHistory>, AppError> {
        let rows = sqlx::query_as::<_, OutletHistory>(&format!(
            "SELECT {HISTORY_COLUMNS} FROM outlet_histories h WHERE h.outlet_id = $1 ORDER BY h.id"
        ))
        .bind(outlet_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn insert_history<'e, E>(&self, executor: E, new: &NewOutletHistory) -> Result<OutletHistory, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let history = sqlx::query_as::<_, OutletHistory>(&format!(
            r#"
            INSERT INTO outlet_histories AS h (
                outlet_id, from_level, to_level, requested_by, approved_by,
                approval_status, approval_notes, requested_at, approved_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {HISTORY_COLUMNS}
            "#
        ))
        .bind(new.outlet_id)
        .bind(new.from_level)
        .bind(new.to_level)
        .bind(new.requested_by)
        .bind(new.approved_by)
        .bind(new.approval_status)
        .bind(new.approval_notes.as_deref())
        .bind(new.requested_at)
        .bind(new.approved_at)
        .fetch_one(executor)
        .await?;

        Ok(history)
    }
}
