//! # Userdir API Server
//!
//! Dual-protocol user directory service: one listener exposing the same
//! user operations as JSON-over-HTTP (REST, under `/api`) and
//! XML-over-HTTP (SOAP, at `/soap`, WSDL-described), backed by a single
//! MongoDB record store.
//!
//! ## Architecture
//!
//! The server is built with Axum and provides:
//! - REST endpoints for user CRUD and search
//! - SOAP operations matching the published WSDL contract
//! - A health probe reporting live store connectivity
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p userdir-api
//! ```

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use userdir_api::app::{build_router, AppState};
use userdir_api::config::Config;
use userdir_shared::db::MongoStore;
use userdir_shared::directory::Directory;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "userdir_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "userdir API server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    // An unreachable store aborts boot; the process must not accept
    // traffic claiming a working store.
    let store = MongoStore::connect(&config.store.uri, &config.store.database)
        .await
        .map_err(|err| anyhow::anyhow!("MongoDB connection failed: {}", err))?;

    let directory = Directory::new(Arc::new(store));
    let bind_address = config.bind_address();
    let state = AppState::new(directory, config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);
    tracing::info!("SOAP service  -> /soap");
    tracing::info!("WSDL document -> /soap?wsdl");
    tracing::info!("REST API      -> /api");

    axum::serve(listener, app).await?;

    Ok(())
}
