//! VTU Wallet Server - Main Application Entry Point
//!
//! This is a REST API server for a mobile-data reselling platform. End
//! users fund a wallet through a hosted payment gateway, spend the balance
//! on vendor-delivered data bundles, and dispute transactions that went
//! wrong; administrators resolve disputes, adjust plan pricing, and manage
//! accounts with a full audit trail.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Database**: PostgreSQL with sqlx (async queries)
//! - **Authentication**: Bearer tokens with SHA-256 hashing
//! - **External collaborators**: data vendor API, payment gateway
//! - **Format**: JSON requests/responses
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment variables
//! 2. Create database connection pool
//! 3. Run database migrations
//! 4. Construct the vendor and gateway clients
//! 5. Build HTTP router with routes and middleware
//! 6. Start server on configured port

mod clients;
mod config;
mod db;
mod error;
mod handlers;
mod middleware;
mod models;
mod services;
mod state;

use tracing_subscriber::EnvFilter;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post, put},
};
use tower_http::trace::TraceLayer;

use crate::clients::{PaystackClient, VtuClient};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging with tracing subscriber. Reads RUST_LOG environment variable (defaults to "info" level)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // Load configuration
    let config = config::Config::from_env()?;
    tracing::info!("Configuration loaded");

    // Create database pool
    let pool = db::create_pool(&config.database_url).await?;
    tracing::info!("Database pool created");

    // Run migrations
    db::run_migrations(&pool).await?;
    tracing::info!("Database migrations complete");

    // Construct external clients. Either can be absent; the flows that
    // need them fail with a configuration error instead of at boot.
    let vtu = VtuClient::from_config(&config)?;
    if vtu.is_none() {
        tracing::warn!("VTU_API_TOKEN not set; data purchases are disabled");
    }
    let paystack = PaystackClient::from_config(&config)?;
    if paystack.is_none() {
        tracing::warn!("PAYSTACK_SECRET_KEY not set; wallet funding is disabled");
    }

    let state = AppState {
        pool,
        vtu,
        paystack,
    };

    // Authenticated user routes
    let user_routes = Router::new()
        .route("/api/v1/plans", get(handlers::plans::list_plans))
        .route(
            "/api/v1/purchases",
            post(handlers::transactions::create_purchase),
        )
        .route(
            "/api/v1/transactions",
            get(handlers::transactions::list_transactions),
        )
        .route(
            "/api/v1/transactions/{id}",
            get(handlers::transactions::get_transaction),
        )
        .route(
            "/api/v1/transactions/{id}/dispute",
            post(handlers::disputes::open_dispute),
        )
        .route("/api/v1/wallet", get(handlers::wallet::get_wallet))
        .route(
            "/api/v1/wallet/fundings",
            post(handlers::wallet::initiate_funding),
        )
        .route(
            "/api/v1/wallet/fundings/verify",
            post(handlers::wallet::verify_funding),
        )
        // Apply authentication middleware to all routes in this group
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::auth_middleware,
        ));

    // Admin routes: authentication plus the role guard. Layers run
    // outermost-last, so the auth layer added second runs first.
    let admin_routes = Router::new()
        .route("/api/v1/admin/disputes", get(handlers::disputes::list_disputes))
        .route(
            "/api/v1/admin/disputes/{id}/resolve",
            post(handlers::disputes::resolve_dispute),
        )
        .route("/api/v1/admin/plans", get(handlers::plans::list_all_plans))
        .route(
            "/api/v1/admin/plans/{plan_id}",
            put(handlers::plans::upsert_plan_override),
        )
        .route("/api/v1/admin/users", get(handlers::admin::list_users))
        .route("/api/v1/admin/users/{id}/ban", post(handlers::admin::ban_user))
        .route(
            "/api/v1/admin/users/{id}/unban",
            post(handlers::admin::unban_user),
        )
        .route(
            "/api/v1/admin/audit-logs",
            get(handlers::admin::list_audit_logs),
        )
        .route_layer(axum_middleware::from_fn(middleware::auth::require_admin))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::auth_middleware,
        ));

    // Combine authenticated routes with public routes
    let app = Router::new()
        // Public routes: liveness and the signature-authenticated webhook
        .route("/health", get(handlers::health::health_check))
        .route(
            "/api/v1/webhooks/gateway",
            post(handlers::webhooks::gateway_webhook),
        )
        .merge(user_routes)
        .merge(admin_routes)
        // Add distributed tracing middleware for observability
        .layer(TraceLayer::new_for_http())
        // Share application state with all handlers via State extraction
        .with_state(state);

    // Bind to network address and start server
    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    // Start serving HTTP requests
    // This blocks forever, handling requests concurrently with tokio
    axum::serve(listener, app).await?;

    Ok(())
}
