//! Sekela HTTP API.
//! Serves the university catalog, the wizard recommender, the insight histograms,
//! and the administrative seed/refresh operations as JSON over HTTP.

pub mod error;
pub(crate) mod params;
pub mod routes;
pub mod server;

use axum::Router;
use axum::http::HeaderValue;
use sekela_core::config::ServerConfig;
use server::AppState;
use std::future::Future;
use std::net::SocketAddr;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

/// CORS policy for the configured frontend origins.
///
/// Credentials are allowed, so methods and headers mirror the request instead of `*`.
pub fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

/// The full application: routes plus CORS and request tracing.
pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.config.server);
    routes::router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Bind `addr` and serve until `shutdown` resolves.
pub async fn serve(
    state: AppState,
    addr: SocketAddr,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "sekela API listening");
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown)
        .await
}
