//src/main.rs

use anyhow::Context;
use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::{AppState, Config};
use crate::docs::ApiDoc;
use crate::middleware::auth::auth_guard;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let config = Config::from_env()?;
    let app_state = AppState::new(&config).await?;

    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .context("failed to run database migrations")?;
    tracing::info!("✅ Database migrations applied");

    let app = router(app_state);

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!("🚀 Listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

fn router(app_state: AppState) -> Router {
    let me_routes = Router::new()
        .route("/scope", get(handlers::scopes::get_my_scope));

    let outlet_routes = Router::new()
        .route(
            "/",
            get(handlers::outlets::list_outlets).post(handlers::outlets::create_outlet),
        )
        .route("/{id}", get(handlers::outlets::get_outlet))
        .route("/{id}/histories", get(handlers::outlets::list_histories))
        .route("/{id}/transitions", post(handlers::outlets::request_transition));

    let history_routes = Router::new()
        .route("/{id}/approve", post(handlers::outlets::approve))
        .route("/{id}/reject", post(handlers::outlets::reject));

    let user_routes = Router::new()
        .route("/", get(handlers::users::list_users))
        .route(
            "/{id}/scopes",
            get(handlers::scopes::list_user_scopes).put(handlers::scopes::replace_user_scopes),
        );

    let visit_routes = Router::new()
        .route("/", get(handlers::visits::list_visits));

    let org_routes = Router::new()
        .route("/tree", get(handlers::org::get_tree))
        .route("/badan-usaha", post(handlers::org::create_badan_usaha))
        .route("/divisions", post(handlers::org::create_division))
        .route("/regions", post(handlers::org::create_region))
        .route("/clusters", post(handlers::org::create_cluster));

    // Everything under /api except health needs a bearer token
    let protected = Router::new()
        .nest("/me", me_routes)
        .nest("/outlets", outlet_routes)
        .nest("/outlet-histories", history_routes)
        .nest("/users", user_routes)
        .nest("/visits", visit_routes)
        .nest("/org", org_routes)
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api", protected)
        .with_state(app_state)
}
