//! bijoux-api server entry point.
//!
//! Starts the Axum HTTP server with the configured persistence backend
//! and notification channel.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use bijoux_api::api;
use bijoux_api::app_state::AppState;
use bijoux_api::config::StoreConfig;
use bijoux_api::notify::email::{HttpEmailNotifier, SimulatedNotifier};
use bijoux_api::notify::Notifier;
use bijoux_api::persistence::json_file::JsonFileStore;
use bijoux_api::persistence::postgres::PostgresStore;
use bijoux_api::persistence::{OrderStore, ProductStore, StorageBackend};
use bijoux_api::security::{AdminGate, RateLimiter};
use bijoux_api::service::{CatalogService, OrderService};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = StoreConfig::from_env()?;
    tracing::info!(addr = %config.listen_addr, backend = ?config.storage_backend, "starting bijoux-api");

    // Build persistence layer
    let (order_store, product_store): (Arc<dyn OrderStore>, Arc<dyn ProductStore>) =
        match config.storage_backend {
            StorageBackend::JsonFile => {
                let store = Arc::new(JsonFileStore::open(&config.data_dir).await?);
                tracing::info!(dir = %config.data_dir, "using JSON file storage");
                (Arc::clone(&store) as Arc<dyn OrderStore>, store)
            }
            StorageBackend::Postgres => {
                let pool = sqlx::postgres::PgPoolOptions::new()
                    .max_connections(config.database_max_connections)
                    .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
                    .connect(&config.database_url)
                    .await?;
                let store = PostgresStore::new(pool);
                store.migrate().await?;
                tracing::info!("using PostgreSQL storage");
                let store = Arc::new(store);
                (Arc::clone(&store) as Arc<dyn OrderStore>, store)
            }
        };

    // Build notification channel
    let notifier: Arc<dyn Notifier> = match config.email_config() {
        Some((url, key, from)) => {
            tracing::info!("email notifications enabled");
            Arc::new(HttpEmailNotifier::new(url, key, from))
        }
        None => {
            tracing::info!("email not configured, notifications are simulated");
            Arc::new(SimulatedNotifier)
        }
    };

    // Build service layer
    let orders = Arc::new(OrderService::new(
        order_store,
        Arc::clone(&product_store),
        notifier,
    ));
    let catalog = Arc::new(CatalogService::new(product_store));

    // Build application state
    let app_state = AppState {
        orders,
        catalog,
        rate_limiter: Arc::new(RateLimiter::new(config.rate_policies)),
        admin_gate: Arc::new(AdminGate::new(config.admin_api_key.clone())),
    };

    // Build router
    let app = Router::new()
        .merge(api::build_router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
