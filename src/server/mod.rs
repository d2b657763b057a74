//! # HTTP Server for Certificate Rendering
//!
//! JSON API over the compositor and the workspace.
//!
//! ## Usage
//!
//! ```bash
//! certigen serve --listen 0.0.0.0:8080 --data-dir ./certigen-data
//! ```
//!
//! ## Routes
//!
//! | Method | Path | |
//! |--------|------|-|
//! | GET / POST | `/api/fonts` | list / upload fonts |
//! | POST | `/api/render` | render one certificate (jpg, pdf, png) |
//! | POST | `/api/preview` | live PNG preview, `204` when superseded |
//! | GET / PUT | `/api/template` | current background image |
//! | GET / PUT | `/api/elements` | current element list |
//! | GET / POST | `/api/recipients` | list / add recipients |
//! | DELETE | `/api/recipients/:id` | remove a recipient |
//! | GET / POST | `/api/templates` | list / save template snapshots |
//! | POST | `/api/templates/:id/open` | reopen a snapshot for editing |
//!
//! Templates named in a request body must be inline data URIs or files
//! inside the data directory. Remote URLs need `allow_remote_templates`.

mod handlers;
mod state;

pub use state::{AppState, ServerConfig};

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::error::CertigenError;

/// Upload limit for fonts and inline template images.
const BODY_LIMIT: usize = 50 * 1024 * 1024;

/// Build the API router over shared state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // Fonts
        .route(
            "/api/fonts",
            get(handlers::fonts::list).post(handlers::fonts::upload),
        )
        // Rendering
        .route("/api/render", post(handlers::render::render))
        .route("/api/preview", post(handlers::render::preview))
        // Workspace
        .route(
            "/api/template",
            get(handlers::workspace::current).put(handlers::workspace::set_current),
        )
        .route(
            "/api/elements",
            get(handlers::workspace::elements).put(handlers::workspace::set_elements),
        )
        .route(
            "/api/recipients",
            get(handlers::workspace::recipients).post(handlers::workspace::add_recipient),
        )
        .route(
            "/api/recipients/:id",
            delete(handlers::workspace::remove_recipient),
        )
        .route(
            "/api/templates",
            get(handlers::workspace::saved).post(handlers::workspace::save),
        )
        .route("/api/templates/:id/open", post(handlers::workspace::open))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server.
///
/// ## Example
///
/// ```no_run
/// use certigen::server::{serve, ServerConfig};
///
/// # async fn example() -> Result<(), certigen::error::CertigenError> {
/// let config = ServerConfig {
///     listen_addr: "0.0.0.0:8080".to_string(),
///     data_dir: "./certigen-data".into(),
///     allow_remote_templates: false,
/// };
///
/// serve(config).await?;
/// # Ok(())
/// # }
/// ```
pub async fn serve(config: ServerConfig) -> Result<(), CertigenError> {
    let state = Arc::new(AppState::new(config.clone())?);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .map_err(|e| {
            CertigenError::InvalidInput(format!("Failed to bind to {}: {}", config.listen_addr, e))
        })?;

    tracing::info!(
        listen = %config.listen_addr,
        data_dir = %config.data_dir.display(),
        "certigen HTTP server listening"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
