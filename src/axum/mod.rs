pub mod auth;
pub mod extract;
pub mod gallery;
pub mod post;

pub use extract::Identity;

use std::sync::Arc;

use axum::routing::get;
use axum::Extension;
use tower_http::trace::TraceLayer;

use crate::{routes, Config, Database, Result};

pub type Router = axum::Router;

pub type ConfigExt<C = Config> = Extension<Arc<C>>;
pub type DbExt = Extension<Arc<Database>>;

/// Assembles all service routes.
pub fn router() -> Router {
    Router::new()
        .route(routes::ROOT, get(root))
        .merge(auth::router())
        .merge(gallery::router())
        .merge(post::router())
}

/// Liveness probe, answers on the bare root path.
async fn root() -> &'static str {
    "Gallery API is running."
}

/// Builds the complete application: all routes plus the request trace layer
/// and the config/database extensions every handler relies on.
pub fn app(config: Config, db: Database) -> Router {
    router()
        .layer(TraceLayer::new_for_http())
        .layer(Extension(Arc::new(config)))
        .layer(Extension(Arc::new(db)))
}

/// Initializes application state and starts the web server.
pub async fn start(config: Config) -> Result<()> {
    let db = Database::new(&config.db.path)?;
    start_with(db, config).await
}

pub async fn start_with(db: Database, config: Config) -> Result<()> {
    if config.tracing.enabled {
        crate::tracing::init(&config).unwrap_or_else(|e| {
            log::warn!("failed to initialize tracing (perhaps it was already initialized?): {e}")
        });
    }

    // Provide initial state as defined in config
    if config.init.enabled {
        crate::init::initialize(&config, &db)?;
    }

    // Generate mock data, a full synthetic state made of all the different
    // data items.
    if config.dev.enabled && config.dev.mock {
        crate::mock::generate(&config, &db)
            .unwrap_or_else(|e| log::warn!("skipped mock generation: {e}"));
    }

    let addr = config.address;
    let router = app(config, db);

    // Serve the application
    tracing::info!("starting server at {addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await.map_err(|e| e.into())
}
