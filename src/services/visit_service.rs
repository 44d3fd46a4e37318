// src/services/visit_service.rs

use crate::{
    common::error::AppError,
    db::VisitRepository,
    models::visit::Visit,
    services::scope_set::{EntityKind, ScopeSet},
};

#[derive(Clone)]
pub struct VisitService {
    repo: VisitRepository,
}

impl VisitService {
    pub fn new(repo: VisitRepository) -> Self {
        Self { repo }
    }

    /// Visits are visible when the visited outlet is.
    pub async fn list_visits(&self, scope: &ScopeSet, limit: i64, offset: i64) -> Result<Vec<Visit>, AppError> {
        let filter = scope.filter_for(EntityKind::Visit);
        self.repo.list_scoped(&filter, limit, offset).await
    }
}
