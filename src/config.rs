// src/config.rs

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{env, sync::Arc, time::Duration};

use crate::{
    db::{OrgRepository, OutletRepository, RbacRepository, ScopeRepository, UserRepository, VisitRepository},
    services::{
        auth::AuthService,
        notification::{LogNotifier, Notifier},
        org_service::OrgService,
        outlet_service::OutletService,
        scope_service::ScopeService,
        user_service::UserService,
        visit_service::VisitService,
    },
};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Process configuration, read from the environment (and `.env` if present).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub db_max_connections: u32,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET must be set")?;
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
        let db_max_connections = match env::var("DB_MAX_CONNECTIONS") {
            Ok(raw) => raw
                .parse()
                .with_context(|| format!("DB_MAX_CONNECTIONS must be a positive integer, got '{raw}'"))?,
            Err(_) => DEFAULT_MAX_CONNECTIONS,
        };

        Ok(Self { database_url, jwt_secret, bind_addr, db_max_connections })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub rbac_repo: RbacRepository,
    pub auth_service: AuthService,
    pub scope_service: ScopeService,
    pub outlet_service: OutletService,
    pub org_service: OrgService,
    pub user_service: UserService,
    pub visit_service: VisitService,
}

impl AppState {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let db_pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
            .context("failed to connect to the database")?;

        tracing::info!("✅ Database connection established");

        Ok(Self::with_notifier(db_pool, config, Arc::new(LogNotifier)))
    }

    // --- Dependency graph ---
    pub fn with_notifier(db_pool: PgPool, config: &Config, notifier: Arc<dyn Notifier>) -> Self {
        let user_repo = UserRepository::new(db_pool.clone());
        let rbac_repo = RbacRepository::new(db_pool.clone());
        let scope_repo = ScopeRepository::new(db_pool.clone());
        let org_repo = OrgRepository::new(db_pool.clone());
        let outlet_repo = OutletRepository::new(db_pool.clone());
        let visit_repo = VisitRepository::new(db_pool.clone());

        let user_service = UserService::new(user_repo.clone());
        let auth_service = AuthService::new(user_service.clone(), config.jwt_secret.clone());
        let scope_service = ScopeService::new(
            db_pool.clone(),
            scope_repo,
            rbac_repo.clone(),
            user_repo,
            org_repo.clone(),
        );
        let outlet_service = OutletService::new(db_pool.clone(), outlet_repo, org_repo.clone(), notifier);
        let org_service = OrgService::new(db_pool.clone(), org_repo);
        let visit_service = VisitService::new(visit_repo);

        Self {
            db_pool,
            rbac_repo,
            auth_service,
            scope_service,
            outlet_service,
            org_service,
            user_service,
            visit_service,
        }
    }
}
