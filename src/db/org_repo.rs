// src/db/org_repo.rs

use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::error::AppError,
    models::org::{BadanUsaha, Cluster, Division, OrgTree, Region},
    services::hierarchy::OrgHierarchy,
};

#[derive(Clone)]
pub struct OrgRepository {
    pool: PgPool,
}

impl OrgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  READ
    // =========================================================================

    /// Loads the whole tree. It is small (hundreds of nodes) and read on
    /// every hierarchy-checked write.
    pub async fn load_tree(&self) -> Result<OrgTree, AppError> {
        let badan_usaha = sqlx::query_as::<_, BadanUsaha>(
            "SELECT id, name, created_at FROM badan_usaha ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        let divisions = sqlx::query_as::<_, Division>(
            "SELECT id, badan_usaha_id, name, created_at FROM divisions ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        let regions = sqlx::query_as::<_, Region>(
            "SELECT id, badan_usaha_id, division_id, name, created_at FROM regions ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        let clusters = sqlx::query_as::<_, Cluster>(
            "SELECT id, badan_usaha_id, division_id, region_id, name, created_at FROM clusters ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(OrgTree { badan_usaha, divisions, regions, clusters })
    }

    pub async fn load_hierarchy(&self) -> Result<OrgHierarchy, AppError> {
        let tree = self.load_tree().await?;
        Ok(OrgHierarchy::from_nodes(
            &tree.badan_usaha,
            &tree.divisions,
            &tree.regions,
            &tree.clusters,
        ))
    }

    // =========================================================================
    //  WRITE (parent ids are checked by the service before getting here)
    // =========================================================================

    pub async fn create_badan_usaha<'e, E>(&self, executor: E, name: &str) -> Result<BadanUsaha, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let node = sqlx::query_as::<_, BadanUsaha>(
            "INSERT INTO badan_usaha (name) VALUES ($1) RETURNING id, name, created_at",
        )
        .bind(name)
        .fetch_one(executor)
        .await?;

        Ok(node)
    }

    pub async fn create_division<'e, E>(
        &self,
        executor: E,
        badan_usaha_id: i64,
        name: &str,
    ) -> Result<Division, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let node = sqlx::query_as::<_, Division>(
            r#"
            INSERT INTO divisions (badan_usaha_id, name)
            VALUES ($1, $2)
            RETURNING id, badan_usaha_id, name, created_at
            "#,
        )
        .bind(badan_usaha_id)
        .bind(name)
        .fetch_one(executor)
        .await?;

        Ok(node)
    }

    pub async fn create_region<'e, E>(
        &self,
        executor: E,
        badan_usaha_id: i64,
        division_id: i64,
        name: &str,
    ) -> Result<Region, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let node = sqlx::query_as::<_, Region>(
            r#"
            INSERT INTO regions (badan_usaha_id, division_id, name)
            VALUES ($1, $2, $3)
            RETURNING id, badan_usaha_id, division_id, name, created_at
            "#,
        )
        .bind(badan_usaha_id)
        .bind(division_id)
        .bind(name)
        .fetch_one(executor)
        .await?;

        Ok(node)
    }

    pub async fn create_cluster<'e, E>(
        &self,
        executor: E,
        badan_usaha_id: i64,
        division_id: i64,
        region_id: i64,
        name: &str,
    ) -> Result<Cluster, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let node = sqlx::query_as::<_, Cluster>(
            r#"
            INSERT INTO clusters (badan_usaha_id, division_id, region_id, name)
            VALUES ($1, $2, $3, $4)
            RETURNING id, badan_usaha_id, division_id, region_id, name, created_at
            "#,
        )
        .bind(badan_usaha_id)
        .bind(division_id)
        .bind(region_id)
        .bind(name)
        .fetch_one(executor)
        .await?;

        Ok(node)
    }
}
