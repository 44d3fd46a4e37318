// src/services/scope_service.rs

use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::{OrgRepository, RbacRepository, ScopeRepository, UserRepository},
    models::{
        auth::User,
        scope::{ScopeAssignment, ScopeRow},
    },
    services::{
        scope_set::{ScopeEntry, ScopeSet},
        scope_validator::validate_scope_assignment,
    },
};

#[derive(Clone)]
pub struct ScopeService {
    pool: PgPool,
    scope_repo: ScopeRepository,
    rbac_repo: RbacRepository,
    user_repo: UserRepository,
    org_repo: OrgRepository,
}

impl ScopeService {
    pub fn new(
        pool: PgPool,
        scope_repo: ScopeRepository,
        rbac_repo: RbacRepository,
        user_repo: UserRepository,
        org_repo: OrgRepository,
    ) -> Self {
        Self { pool, scope_repo, rbac_repo, user_repo, org_repo }
    }

    /// Role + stored rows of `user`, resolved into what they may see.
    pub async fn resolve_scope(&self, user: &User) -> Result<ScopeSet, AppError> {
        let role = self
            .rbac_repo
            .find_role(&self.pool, user.role_id)
            .await?
            .ok_or(AppError::NotFound("Role"))?;
        let rows = self.scope_repo.list_for_user(user.id).await?;

        Ok(ScopeSet::resolve(&role, &rows))
    }

    pub async fn list_scopes(&self, caller_scope: &ScopeSet, user_id: i64) -> Result<Vec<ScopeRow>, AppError> {
        self.visible_user(caller_scope, user_id).await?;
        self.scope_repo.list_for_user(user_id).await
    }

    /// Replaces every scope row of `user_id` (resync). All assignments are
    /// validated against the user's role and the org tree first; a single
    /// problem rejects the whole request. A caller can only grant what lies
    /// inside one of their own rows.
    pub async fn replace_scopes(
        &self,
        caller_scope: &ScopeSet,
        user_id: i64,
        assignments: Vec<ScopeAssignment>,
    ) -> Result<Vec<ScopeRow>, AppError> {
        let target = self.visible_user(caller_scope, user_id).await?;
        ensure_grantable(caller_scope, user_id, &assignments)?;
        let role = self
            .rbac_repo
            .find_role(&self.pool, target.role_id)
            .await?
            .ok_or(AppError::NotFound("Role"))?;
        let hierarchy = self.org_repo.load_hierarchy().await?;

        let problems: Vec<_> = assignments
            .iter()
            .filter_map(|a| validate_scope_assignment(a, &role, &hierarchy).err())
            .flatten()
            .collect();
        if !problems.is_empty() {
            tracing::info!(user_id, problems = problems.len(), "scope assignment rejected");
            return Err(AppError::ScopeValidation(problems));
        }

        let mut tx = self.pool.begin().await?;

        let removed = self.scope_repo.delete_for_user(&mut *tx, user_id).await?;
        let mut rows = Vec::with_capacity(assignments.len());
        for assignment in &assignments {
            rows.push(self.scope_repo.insert(&mut *tx, user_id, assignment).await?);
        }

        tx.commit().await?;

        tracing::info!(user_id, removed, inserted = rows.len(), "🔐 user scopes replaced");
        Ok(rows)
    }

    // Target user, provided the caller's scope covers them
    async fn visible_user(&self, caller_scope: &ScopeSet, user_id: i64) -> Result<User, AppError> {
        let user = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(AppError::NotFound("User"))?;

        if !caller_scope.matches(&user) {
            return Err(AppError::ScopeDenied { entity: "User", id: user_id });
        }
        Ok(user)
    }
}

fn ensure_grantable(caller_scope: &ScopeSet, user_id: i64, assignments: &[ScopeAssignment]) -> Result<(), AppError> {
    let widening = assignments
        .iter()
        .position(|a| !caller_scope.covers(&ScopeEntry::from(a)));

    match widening {
        Some(index) => {
            tracing::warn!(user_id, index, "scope grant exceeds the caller's own scope");
            Err(AppError::ScopeDenied { entity: "User scope", id: user_id })
        }
        None => Ok(()),
    }
}
