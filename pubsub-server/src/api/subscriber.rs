//! Subscriber handlers.
//!
//! # Endpoints
//!
//! - `GET /` – list every message received so far

use axum::{Router, extract::State, response::Html, routing::get};

use super::html::message_list_page;
use crate::state::SubscriberState;

/// Build the subscriber router.
pub fn router() -> Router<SubscriberState> {
    Router::new().route("/", get(list_messages))
}

/// `GET /`: render a snapshot of the buffer as an HTML list.
async fn list_messages(State(state): State<SubscriberState>) -> Html<String> {
    let messages = state.buffer.snapshot().await;
    Html(message_list_page(&messages, state.publish_form))
}
