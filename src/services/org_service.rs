// src/services/org_service.rs

use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::OrgRepository,
    models::org::{BadanUsaha, Cluster, Division, HierarchyPath, OrgTree, Region},
    services::scope_set::ScopeSet,
};

#[derive(Clone)]
pub struct OrgService {
    pool: PgPool,
    repo: OrgRepository,
}

impl OrgService {
    pub fn new(pool: PgPool, repo: OrgRepository) -> Self {
        Self { pool, repo }
    }

    /// Tree trimmed to the nodes some scope row of the caller permits.
    pub async fn visible_tree(&self, scope: &ScopeSet) -> Result<OrgTree, AppError> {
        let tree = self.repo.load_tree().await?;
        Ok(prune_tree(tree, scope))
    }

    pub async fn create_badan_usaha(&self, name: &str) -> Result<BadanUsaha, AppError> {
        let node = self.repo.create_badan_usaha(&self.pool, name).await?;
        tracing::info!(id = node.id, "badan usaha created");
        Ok(node)
    }

    pub async fn create_division(&self, badan_usaha_id: i64, name: &str) -> Result<Division, AppError> {
        self.check_parents(HierarchyPath { badan_usaha_id, ..HierarchyPath::default() })
            .await?;

        let node = self.repo.create_division(&self.pool, badan_usaha_id, name).await?;
        tracing::info!(id = node.id, badan_usaha_id, "division created");
        Ok(node)
    }

    pub async fn create_region(&self, badan_usaha_id: i64, division_id: i64, name: &str) -> Result<Region, AppError> {
        self.check_parents(HierarchyPath {
            badan_usaha_id,
            division_id: Some(division_id),
            ..HierarchyPath::default()
        })
        .await?;

        let node = self
            .repo
            .create_region(&self.pool, badan_usaha_id, division_id, name)
            .await?;
        tracing::info!(id = node.id, division_id, "region created");
        Ok(node)
    }

    pub async fn create_cluster(
        &self,
        badan_usaha_id: i64,
        division_id: i64,
        region_id: i64,
        name: &str,
    ) -> Result<Cluster, AppError> {
        self.check_parents(HierarchyPath {
            badan_usaha_id,
            division_id: Some(division_id),
            region_id: Some(region_id),
            cluster_id: None,
        })
        .await?;

        let node = self
            .repo
            .create_cluster(&self.pool, badan_usaha_id, division_id, region_id, name)
            .await?;
        tracing::info!(id = node.id, region_id, "cluster created");
        Ok(node)
    }

    // The parent chain of a new node must already exist and agree with itself
    async fn check_parents(&self, path: HierarchyPath) -> Result<(), AppError> {
        self.repo.load_hierarchy().await?.validate_consistency(&path)?;
        Ok(())
    }
}

fn prune_tree(tree: OrgTree, scope: &ScopeSet) -> OrgTree {
    let visible = |path: HierarchyPath| scope.permits_node(&path);

    OrgTree {
        badan_usaha: tree
            .badan_usaha
            .into_iter()
            .filter(|n| visible(HierarchyPath { badan_usaha_id: n.id, ..HierarchyPath::default() }))
            .collect(),
        divisions: tree
            .divisions
            .into_iter()
            .filter(|n| {
                visible(HierarchyPath {
                    badan_usaha_id: n.badan_usaha_id,
                    division_id: Some(n.id),
                    ..HierarchyPath::default()
                })
            })
            .collect(),
        regions: tree
            .regions
            .into_iter()
            .filter(|n| {
                visible(HierarchyPath {
                    badan_usaha_id: n.badan_usaha_id,
                    division_id: Some(n.division_id),
                    region_id: Some(n.id),
                    cluster_id: None,
                })
            })
            .collect(),
        clusters: tree
            .clusters
            .into_iter()
            .filter(|n| {
                visible(HierarchyPath {
                    badan_usaha_id: n.badan_usaha_id,
                    division_id: Some(n.division_id),
                    region_id: Some(n.region_id),
                    cluster_id: Some(n.id),
                })
            })
            .collect(),
    }
}
