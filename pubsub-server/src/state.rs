//! Application state shared across request handlers.

use pubsub_core::EventBuffer;
use pubsub_core::broker::Topic;
use std::sync::Arc;

/// State of the `subscribe` service.
///
/// Cloneable and cheap to pass around; the buffer is a shared handle.
#[derive(Clone)]
pub struct SubscriberState {
    /// Messages received so far. Written only by the ingestor.
    pub buffer: EventBuffer,
    /// Render the publish form above the message list (local mode).
    pub publish_form: bool,
}

impl SubscriberState {
    pub fn new(buffer: EventBuffer, publish_form: bool) -> Self {
        Self {
            buffer,
            publish_form,
        }
    }
}

/// State of the `publish` service.
#[derive(Clone)]
pub struct PublisherState {
    pub topic: Arc<dyn Topic>,
}

impl PublisherState {
    pub fn new(topic: Arc<dyn Topic>) -> Self {
        Self { topic }
    }
}
