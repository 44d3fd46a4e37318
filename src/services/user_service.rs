// src/services/user_service.rs

use crate::{
    common::error::AppError,
    db::UserRepository,
    models::auth::User,
    services::scope_set::{EntityKind, ScopeSet},
};

#[derive(Clone)]
pub struct UserService {
    repo: UserRepository,
}

impl UserService {
    pub fn new(repo: UserRepository) -> Self {
        Self { repo }
    }

    // Loads the user behind a validated token
    pub async fn find_active(&self, user_id: i64) -> Result<User, AppError> {
        self.repo.find_by_id(user_id).await?.ok_or(AppError::InvalidToken)
    }

    pub async fn list_users(&self, scope: &ScopeSet, limit: i64, offset: i64) -> Result<Vec<User>, AppError> {
        let filter = scope.filter_for(EntityKind::User);
        self.repo.list_scoped(&filter, limit, offset).await
    }
}
