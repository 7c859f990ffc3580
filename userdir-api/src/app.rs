/// Application state and router builder
///
/// This module defines the shared application state and builds the single
/// axum router that fronts both protocols. Routing happens once, by path:
/// `/soap` belongs to the SOAP adapter, `/api/users…` to the REST adapter
/// and `/health` to the probe; no request is ever evaluated by more than
/// one adapter.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use userdir_api::{app::{build_router, AppState}, config::Config};
/// use userdir_shared::{db::MongoStore, directory::Directory};
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let store = MongoStore::connect(&config.store.uri, &config.store.database).await?;
/// let state = AppState::new(Directory::new(Arc::new(store)), config);
/// let app = build_router(state);
///
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:5000").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```

use crate::config::Config;
use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use userdir_shared::directory::Directory;

/// Shared application state
///
/// This is cloned for each request handler via axum's `State` extractor.
/// The directory holds the store handle behind an Arc, so cloning is cheap
/// and no client-side locking is involved.
#[derive(Clone)]
pub struct AppState {
    /// Protocol-agnostic directory core
    pub directory: Directory,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(directory: Directory, config: Config) -> Self {
        Self {
            directory,
            config: Arc::new(config),
        }
    }
}

/// Builds the complete axum router
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                  # Health probe (store connectivity)
/// ├── /soap                    # SOAP adapter
/// │   ├── GET    ?wsdl         # WSDL document, served verbatim
/// │   ├── POST                 # SOAP envelope processing
/// │   └── OPTIONS              # Pre-flight acknowledgement
/// └── /api/                    # REST adapter
///     ├── GET    /users        # List (page, limit)
///     ├── GET    /users/search # Search (q)
///     ├── GET    /users/:id    # Fetch one
///     ├── POST   /users        # Create
///     ├── PUT    /users/:id    # Partial update
///     └── DELETE /users/:id    # Delete
/// ```
///
/// # Middleware Stack
///
/// 1. Logging (tower-http TraceLayer: method and path for every request)
/// 2. CORS (tower-http CorsLayer)
pub fn build_router(state: AppState) -> Router {
    use crate::{routes, soap};

    // Health probe (public)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // REST adapter
    let user_routes = Router::new()
        .route(
            "/users",
            get(routes::users::list_users).post(routes::users::create_user),
        )
        .route("/users/search", get(routes::users::search_users))
        .route(
            "/users/:id",
            get(routes::users::get_user)
                .put(routes::users::update_user)
                .delete(routes::users::delete_user),
        );

    // SOAP adapter: one fixed path, three verbs
    let soap_routes = Router::new().route(
        "/soap",
        get(soap::serve_wsdl)
            .post(soap::handle_envelope)
            .options(soap::preflight),
    );

    Router::new()
        .merge(health_routes)
        .merge(soap_routes)
        .nest("/api", user_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}
