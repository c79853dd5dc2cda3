//! HTTP surface over [`LocationService`].

mod handlers;
mod state;

use axum::http::{header, HeaderValue};
use axum::routing::{delete, get};
use axum::Router;
use state::AppState;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::info;

use crate::location::LocationService;

pub fn build_router(service: Arc<LocationService>) -> Router {
    let state = Arc::new(AppState { service });

    Router::new()
        .route("/api/location", get(handlers::location))
        .route("/api/location/stats", get(handlers::stats))
        .route("/api/location/cache", delete(handlers::invalidate))
        // Locations are per-client; intermediaries must not reuse them.
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start(service: Arc<LocationService>, host: &str, port: u16) -> std::io::Result<()> {
    let app = build_router(service);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("geofix server listening on http://{}", addr);
    axum::serve(listener, app).await
}
