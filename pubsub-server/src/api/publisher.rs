//! Publisher handlers.
//!
//! # Endpoints
//!
//! - `GET  /`        – publish form
//! - `POST /publish` – publish the submitted `message` and redirect to `/`

use axum::{
    Form, Router,
    extract::State,
    http::{StatusCode, header},
    response::{Html, IntoResponse},
    routing::{get, post},
};
use bytes::Bytes;
use pubsub_core::broker::BrokerError;
use serde::Deserialize;

use super::html::publisher_page;
use crate::state::PublisherState;

/// Build the full publisher router.
pub fn router() -> Router<PublisherState> {
    Router::new()
        .route("/", get(publish_form))
        .merge(publish_router())
}

/// Only `POST /publish`, for mounting next to another service's pages.
pub fn publish_router() -> Router<PublisherState> {
    Router::new().route("/publish", post(publish))
}

/// `GET /`: the publish form.
async fn publish_form() -> Html<String> {
    Html(publisher_page())
}

#[derive(Debug, Deserialize)]
struct PublishForm {
    #[serde(default)]
    message: String,
}

/// `POST /publish`: publish one message.
///
/// Redirects back to `/` with `302 Found` once the broker has assigned an id.
async fn publish(
    State(state): State<PublisherState>,
    Form(form): Form<PublishForm>,
) -> Result<impl IntoResponse, PublishError> {
    if form.message.is_empty() {
        return Err(PublishError::EmptyMessage);
    }

    let message_id = state
        .topic
        .publish(Bytes::from(form.message))
        .await
        .map_err(PublishError::Broker)?;

    tracing::info!(topic = %state.topic.name(), %message_id, "Published message");
    Ok((StatusCode::FOUND, [(header::LOCATION, "/")]))
}

/// Errors that can occur in publisher handlers.
#[derive(Debug)]
enum PublishError {
    /// The form carried no message text.
    EmptyMessage,
    /// The broker rejected or failed the publish.
    Broker(BrokerError),
}

impl IntoResponse for PublishError {
    fn into_response(self) -> axum::response::Response {
        match self {
            PublishError::EmptyMessage => {
                (StatusCode::BAD_REQUEST, "message must not be empty").into_response()
            }
            PublishError::Broker(e) => {
                tracing::error!(error = %e, "Failed to publish");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Failed to publish: {e}"),
                )
                    .into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::server::build_publisher_router;
    use crate::state::PublisherState;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use axum::response::Response;
    use pubsub_core::broker::{InMemoryBroker, Subscription};
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn post_form(broker: &InMemoryBroker, body: &'static str) -> Response {
        build_publisher_router(PublisherState::new(Arc::new(broker.clone())))
            .oneshot(
                Request::post("/publish")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    async fn body_text(response: Response) -> String {
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(body.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_form_page() {
        let router = build_publisher_router(PublisherState::new(Arc::new(InMemoryBroker::new())));
        let response = router
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_text(response).await;
        assert!(body.contains("action='/publish'"));
        assert!(body.contains("name='message'"));
    }

    #[tokio::test]
    async fn test_publish_redirects_home() {
        let broker = InMemoryBroker::new();
        let response = post_form(&broker, "message=hello+world").await;

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "/");

        let deliveries = broker.pull(10).await.unwrap();
        assert_eq!(deliveries.len(), 1);
        let message = deliveries[0].message.as_ref().unwrap();
        assert_eq!(message.id(), "1");
        assert_eq!(message.payload_lossy(), "hello world");
    }

    #[tokio::test]
    async fn test_empty_message_is_rejected() {
        let broker = InMemoryBroker::new();

        let response = post_form(&broker, "message=").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = post_form(&broker, "other=field").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        assert_eq!(broker.pending().await, 0);
    }

    #[tokio::test]
    async fn test_broker_failure_is_server_error() {
        let broker = InMemoryBroker::new();
        broker.close().await;

        let response = post_form(&broker, "message=lost").await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_text(response).await, "Failed to publish: broker is closed");
    }
}
