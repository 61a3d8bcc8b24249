//! Axum server setup and router configuration.

use crate::api;
use crate::state::{PublisherState, SubscriberState};
use axum::{Json, Router, response::IntoResponse, routing::get};
use serde::Serialize;
use std::future::Future;
use std::net::SocketAddr;
use tokio::net::TcpListener;

/// Build the `subscribe` service router.
///
/// With `publisher` set (local mode), `POST /publish` is mounted as well.
pub fn build_subscriber_router(state: SubscriberState, publisher: Option<PublisherState>) -> Router {
    let router = Router::new()
        // Health check endpoint
        .route("/health", get(health_check))
        .merge(api::subscriber::router())
        .with_state(state);

    match publisher {
        Some(publisher) => router.merge(api::publisher::publish_router().with_state(publisher)),
        None => router,
    }
}

/// Build the `publish` service router.
pub fn build_publisher_router(state: PublisherState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .merge(api::publisher::router())
        .with_state(state)
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Simple health check - returns OK if the server is running.
async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Run the server until `shutdown` completes, then drain connections.
pub async fn run_server(
    router: Router,
    addr: SocketAddr,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), std::io::Error> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
}
