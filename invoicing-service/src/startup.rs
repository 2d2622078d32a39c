//! Application startup and lifecycle management.

use crate::config::InvoicingConfig;
use crate::handlers::{catalog, health, invoices};
use crate::services::repository::{
    CatalogItemRepository, CustomerRepository, InvoiceRepository, StoreHealth,
};
use crate::services::{init_metrics, CatalogService, Database, InvoiceService};
use axum::{middleware, routing::get, Router};
use service_core::error::AppError;
use service_core::middleware::request_id_middleware;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub invoices: Arc<InvoiceService>,
    pub catalog: Arc<CatalogService>,
    pub health: Arc<dyn StoreHealth>,
}

impl AppState {
    /// Wires every service against one store.
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: InvoiceRepository + CustomerRepository + CatalogItemRepository + StoreHealth + 'static,
    {
        Self {
            invoices: Arc::new(InvoiceService::new(
                store.clone(),
                store.clone(),
                store.clone(),
            )),
            catalog: Arc::new(CatalogService::new(store.clone(), store.clone())),
            health: store,
        }
    }
}

/// Every route, with tracing, request ids and the request deadline applied.
pub fn router(state: AppState, request_timeout: Duration) -> Router {
    let v1 = Router::new()
        .route(
            "/invoices",
            get(invoices::list_invoices)
                .post(invoices::create_invoice)
                .patch(invoices::edit_invoice),
        )
        .route(
            "/invoices/:invoice_id",
            get(invoices::get_invoice).delete(invoices::delete_invoice),
        )
        .route("/customers", get(catalog::list_customers))
        .route("/items", get(catalog::list_items));

    Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .route("/metrics", get(health::metrics_handler))
        .nest("/v1", v1)
        // Dropping the handler future on timeout rolls back any open transaction.
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Connects, migrates and binds the listener.
    pub async fn build(config: InvoicingConfig) -> Result<Self, AppError> {
        init_metrics();

        let db = Database::new(
            &config.database.url,
            config.database.max_connections,
            config.database.min_connections,
        )
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to connect to PostgreSQL");
            e
        })?;

        db.run_migrations().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to run migrations");
            e
        })?;

        let router = router(AppState::from_store(Arc::new(db)), config.request_timeout);

        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!(error = %e, addr = %addr, "Failed to bind HTTP listener");
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(port = port, "Invoicing service listener bound");

        Ok(Self {
            port,
            listener,
            router,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Run the application until stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        tracing::info!(
            service = "invoicing-service",
            version = env!("CARGO_PKG_VERSION"),
            port = self.port,
            "Service ready to accept connections"
        );

        axum::serve(self.listener, self.router).await.map_err(|e| {
            tracing::error!(error = %e, "HTTP server error");
            std::io::Error::other(format!("HTTP server error: {}", e))
        })
    }
}
