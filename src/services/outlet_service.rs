// src/services/outlet_service.rs

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::{
    common::{db_utils::retry_once_on_conflict, error::AppError},
    db::{OrgRepository, OutletRepository},
    models::{
        org::{HierarchyLevel, HierarchyPath, HierarchyScoped},
        outlet::{ApprovalDecision, NewOutlet, Outlet, OutletHistory, OutletLevel, TransitionResult},
    },
    services::{
        notification::Notifier,
        outlet_lifecycle::{self, LifecyclePlan},
        scope_set::{EntityKind, ScopeSet},
    },
};

type Notification = Option<(ApprovalDecision, Option<i64>)>;

#[derive(Clone)]
pub struct OutletService {
    pool: PgPool,
    repo: OutletRepository,
    org_repo: OrgRepository,
    notifier: Arc<dyn Notifier>,
}

impl OutletService {
    pub fn new(pool: PgPool, repo: OutletRepository, org_repo: OrgRepository, notifier: Arc<dyn Notifier>) -> Self {
        Self { pool, repo, org_repo, notifier }
    }

    // =========================================================================
    //  READ
    // =========================================================================

    pub async fn list_outlets(
        &self,
        scope: &ScopeSet,
        level: Option<OutletLevel>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Outlet>, AppError> {
        let filter = scope.filter_for(EntityKind::Outlet);
        self.repo.list_scoped(&filter, level, limit, offset).await
    }

    pub async fn get_outlet(&self, scope: &ScopeSet, outlet_id: i64) -> Result<Outlet, AppError> {
        let outlet = self
            .repo
            .find_by_id(&self.pool, outlet_id)
            .await?
            .ok_or(AppError::NotFound("Outlet"))?;
        ensure_in_scope(scope, &outlet)?;
        Ok(outlet)
    }

    pub async fn list_histories(&self, scope: &ScopeSet, outlet_id: i64) -> Result<Vec<OutletHistory>, AppError> {
        self.get_outlet(scope, outlet_id).await?;
        self.repo.list_histories(outlet_id).await
    }

    // =========================================================================
    //  CREATE
    // =========================================================================

    /// Inserts the outlet and its creation history row in one transaction.
    pub async fn create_outlet(
        &self,
        scope: &ScopeSet,
        created_by: i64,
        new: NewOutlet,
    ) -> Result<TransitionResult, AppError> {
        let path = HierarchyPath {
            badan_usaha_id: new.badan_usaha_id,
            division_id: Some(new.division_id),
            region_id: new.region_id,
            cluster_id: new.cluster_id,
        };
        self.org_repo.load_hierarchy().await?.validate_consistency(&path)?;

        if !scope.matches(&new) {
            let (entity, id) = deepest_node(&new);
            return Err(AppError::ScopeDenied { entity, id });
        }

        let mut tx = self.pool.begin().await?;

        let outlet = self.repo.create_outlet(&mut *tx, &new).await?;
        let planned = outlet_lifecycle::plan_creation(&outlet, created_by, Utc::now());
        let history = self.repo.insert_history(&mut *tx, &planned).await?;

        tx.commit().await?;

        tracing::info!(outlet_id = outlet.id, level = %outlet.level, created_by, "🏪 outlet created");
        Ok(TransitionResult { outlet, history })
    }

    // =========================================================================
    //  LIFECYCLE (row-locked, retried once on serialization conflicts)
    // =========================================================================

    pub async fn request_transition(
        &self,
        scope: &ScopeSet,
        outlet_id: i64,
        to: OutletLevel,
        requested_by: i64,
    ) -> Result<TransitionResult, AppError> {
        let (result, _) = retry_once_on_conflict(outlet_id, move || {
            self.run_locked(scope, outlet_id, move |outlet, latest| {
                outlet_lifecycle::plan_transition(outlet, latest, to, requested_by, Utc::now())
            })
        })
        .await?;

        tracing::info!(
            outlet_id,
            history_id = result.history.id,
            status = ?result.history.approval_status,
            "outlet transition to {to} recorded"
        );
        Ok(result)
    }

    pub async fn approve(
        &self,
        scope: &ScopeSet,
        history_id: i64,
        approver_id: i64,
        code: String,
        limit: Decimal,
    ) -> Result<TransitionResult, AppError> {
        let outlet_id = self.outlet_of_history(history_id).await?;

        let (result, notification) = retry_once_on_conflict(outlet_id, move || {
            let code = code.clone();
            self.run_locked(scope, outlet_id, move |outlet, latest| {
                outlet_lifecycle::plan_approval(outlet, latest, history_id, approver_id, code, limit, Utc::now())
            })
        })
        .await?;

        tracing::info!(outlet_id, history_id, approver_id, "✅ outlet approved as MEMBER");
        self.dispatch(&result.outlet, notification).await;
        Ok(result)
    }

    pub async fn reject(
        &self,
        scope: &ScopeSet,
        history_id: i64,
        approver_id: i64,
        reason: String,
    ) -> Result<TransitionResult, AppError> {
        let outlet_id = self.outlet_of_history(history_id).await?;

        let (result, notification) = retry_once_on_conflict(outlet_id, move || {
            let reason = reason.clone();
            self.run_locked(scope, outlet_id, move |outlet, latest| {
                outlet_lifecycle::plan_rejection(outlet, latest, history_id, approver_id, reason, Utc::now())
            })
        })
        .await?;

        tracing::info!(outlet_id, history_id, approver_id, "⛔ outlet request rejected");
        self.dispatch(&result.outlet, notification).await;
        Ok(result)
    }

    /// Locks the outlet row, plans against the latest history row and writes
    /// the plan. Nothing is written when planning fails.
    async fn run_locked<P>(
        &self,
        scope: &ScopeSet,
        outlet_id: i64,
        plan: P,
    ) -> Result<(TransitionResult, Notification), AppError>
    where
        P: FnOnce(&Outlet, Option<&OutletHistory>) -> Result<LifecyclePlan, AppError>,
    {
        let mut tx = self.pool.begin().await?;

        let outlet = self
            .repo
            .lock_by_id(&mut *tx, outlet_id)
            .await?
            .ok_or(AppError::NotFound("Outlet"))?;
        ensure_in_scope(scope, &outlet)?;

        let latest = self.repo.latest_history(&mut *tx, outlet_id).await?;
        let LifecyclePlan { change, history, notify } = plan(&outlet, latest.as_ref())?;

        let outlet = self.repo.apply_change(&mut *tx, outlet_id, &change).await?;
        let history = self.repo.insert_history(&mut *tx, &history).await?;

        tx.commit().await?;

        Ok((TransitionResult { outlet, history }, notify))
    }

    async fn outlet_of_history(&self, history_id: i64) -> Result<i64, AppError> {
        self.repo
            .find_history(&self.pool, history_id)
            .await?
            .map(|h| h.outlet_id)
            .ok_or(AppError::NotFound("Outlet history"))
    }

    // Delivery failures never undo a committed decision
    async fn dispatch(&self, outlet: &Outlet, notification: Notification) {
        let Some((decision, Some(recipient))) = notification else {
            return;
        };
        if let Err(e) = self.notifier.notify(outlet, decision, recipient).await {
            tracing::warn!(outlet_id = outlet.id, recipient, ?decision, "notification failed: {e:#}");
        }
    }
}

fn ensure_in_scope(scope: &ScopeSet, outlet: &Outlet) -> Result<(), AppError> {
    if scope.matches(outlet) {
        Ok(())
    } else {
        Err(AppError::ScopeDenied { entity: "Outlet", id: outlet.id })
    }
}

// Most specific node the new outlet hangs from, for the denial message
fn deepest_node(new: &NewOutlet) -> (&'static str, i64) {
    HierarchyLevel::ALL
        .into_iter()
        .rev()
        .find_map(|level| new.hierarchy_id(level).map(|id| (level_label(level), id)))
        .unwrap_or(("Division", new.division_id))
}

fn level_label(level: HierarchyLevel) -> &'static str {
    match level {
        HierarchyLevel::BadanUsaha => "Badan usaha",
        HierarchyLevel::Division => "Division",
        HierarchyLevel::Region => "Region",
        HierarchyLevel::Cluster => "Cluster",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::notification::LogNotifier;

    fn new_outlet(region_id: Option<i64>, cluster_id: Option<i64>) -> NewOutlet {
        NewOutlet {
            name: "Toko Baru".into(),
            code: None,
            address: None,
            level: OutletLevel::Lead,
            badan_usaha_id: 1,
            division_id: 10,
            region_id,
            cluster_id,
        }
    }

    #[test]
    fn denial_names_the_most_specific_node() {
        assert_eq!(deepest_node(&new_outlet(Some(100), Some(1000))), ("Cluster", 1000));
        assert_eq!(deepest_node(&new_outlet(Some(100), None)), ("Region", 100));
        assert_eq!(deepest_node(&new_outlet(None, None)), ("Division", 10));
    }

    // --- Against a database (cargo test -- --ignored, DATABASE_URL set) ---

    async fn seed_division(pool: &PgPool, name: &str) -> (i64, i64) {
        let bu: i64 = sqlx::query_scalar("INSERT INTO badan_usaha (name) VALUES ($1) RETURNING id")
            .bind(name)
            .fetch_one(pool)
            .await
            .unwrap();
        let div: i64 = sqlx::query_scalar("INSERT INTO divisions (badan_usaha_id, name) VALUES ($1, $2) RETURNING id")
            .bind(bu)
            .bind(name)
            .fetch_one(pool)
            .await
            .unwrap();
        (bu, div)
    }

    async fn seed_admin(pool: &PgPool) -> i64 {
        sqlx::query_scalar(
            "INSERT INTO users (name, email, role_id) \
             SELECT 'Admin', 'admin@example.co.id', id FROM roles WHERE name = 'SUPER_ADMIN' RETURNING id",
        )
        .fetch_one(pool)
        .await
        .unwrap()
    }

    fn service(pool: &PgPool) -> OutletService {
        OutletService::new(
            pool.clone(),
            OutletRepository::new(pool.clone()),
            OrgRepository::new(pool.clone()),
            Arc::new(LogNotifier),
        )
    }

    #[sqlx::test]
    #[ignore = "needs DATABASE_URL"]
    async fn concurrent_approvals_promote_once(pool: PgPool) {
        let (bu, div) = seed_division(&pool, "PT Uji").await;
        let admin = seed_admin(&pool).await;
        let outlets = service(&pool);
        let scope = ScopeSet::Unrestricted;

        let created = outlets
            .create_outlet(
                &scope,
                admin,
                NewOutlet { level: OutletLevel::Noo, badan_usaha_id: bu, division_id: div, ..new_outlet(None, None) },
            )
            .await
            .unwrap();
        let history_id = created.history.id;

        let (first, second) = tokio::join!(
            outlets.approve(&scope, history_id, admin, "UJI-1".into(), Decimal::from(100)),
            outlets.approve(&scope, history_id, admin, "UJI-2".into(), Decimal::from(200)),
        );
        assert_eq!([&first, &second].iter().filter(|r| r.is_ok()).count(), 1);

        let loser = first.err().or(second.err()).unwrap();
        assert!(matches!(
            loser,
            AppError::InvalidApprovalState { .. } | AppError::NoOpenApprovalRequest(_) | AppError::ConcurrentModification(_)
        ));

        let approved: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM outlet_histories WHERE outlet_id = $1 AND approval_status = 'APPROVED'",
        )
        .bind(created.outlet.id)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(approved, 1);
    }

    #[sqlx::test]
    #[ignore = "needs DATABASE_URL"]
    async fn division_of_another_badan_usaha_is_refused(pool: PgPool) {
        let (_, div_a) = seed_division(&pool, "PT A").await;
        let (bu_b, _) = seed_division(&pool, "PT B").await;
        let admin = seed_admin(&pool).await;

        let err = service(&pool)
            .create_outlet(
                &ScopeSet::Unrestricted,
                admin,
                NewOutlet { badan_usaha_id: bu_b, division_id: div_a, ..new_outlet(None, None) },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::HierarchyMismatch(_)));

        let outlets: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM outlets").fetch_one(&pool).await.unwrap();
        assert_eq!(outlets, 0);
    }
}
