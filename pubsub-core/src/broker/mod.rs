//! Broker seams.
//!
//! The ingestion loop and the publish handler only see these traits. Two
//! implementations exist: the REST clients from `pubsub-sdk` and an
//! in-process [`InMemoryBroker`].

mod memory;
mod rest;

pub use memory::InMemoryBroker;

use crate::buffer::Message;
use async_trait::async_trait;
use bytes::Bytes;
use pubsub_sdk::client::ClientError;
use pubsub_sdk::objects::DataDecodeError;
use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced by a broker implementation.
#[derive(Debug, Error)]
pub enum BrokerError {
    /// The REST call failed.
    #[error("broker request failed: {0}")]
    Client(#[from] ClientError),

    /// A delivered message carried data that could not be decoded.
    #[error("message {message_id} has undecodable data: {source}")]
    Decode {
        message_id: String,
        source: DataDecodeError,
    },

    /// The broker has been shut down and will deliver nothing more.
    #[error("broker is closed")]
    Closed,
}

impl BrokerError {
    /// `true` when the broker reports the resource as missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, BrokerError::Client(e) if e.is_not_found())
    }

    /// `true` when retrying the call may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            BrokerError::Client(e) => !e.is_permanent(),
            BrokerError::Decode { .. } => true,
            BrokerError::Closed => false,
        }
    }
}

/// One message handed out by [`Subscription::pull`].
///
/// Undecodable deliveries still carry their ack id so they can be
/// acknowledged with the rest of the batch.
#[derive(Debug)]
pub struct Delivery {
    pub ack_id: String,
    pub message: Result<Message, BrokerError>,
}

/// Pull side of a subscription.
#[async_trait]
pub trait Subscription: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    async fn exists(&self) -> Result<bool, BrokerError>;

    /// Fetch up to `max_messages`. May wait for messages to arrive and may
    /// return an empty batch.
    async fn pull(&self, max_messages: u32) -> Result<Vec<Delivery>, BrokerError>;

    async fn acknowledge(&self, ack_ids: &[String]) -> Result<(), BrokerError>;
}

/// Publish side of a topic.
#[async_trait]
pub trait Topic: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    async fn exists(&self) -> Result<bool, BrokerError>;

    /// Publish `payload` and return the broker-assigned message id.
    async fn publish(&self, payload: Bytes) -> Result<String, BrokerError>;
}

#[async_trait]
impl<T: Subscription + ?Sized> Subscription for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn exists(&self) -> Result<bool, BrokerError> {
        (**self).exists().await
    }

    async fn pull(&self, max_messages: u32) -> Result<Vec<Delivery>, BrokerError> {
        (**self).pull(max_messages).await
    }

    async fn acknowledge(&self, ack_ids: &[String]) -> Result<(), BrokerError> {
        (**self).acknowledge(ack_ids).await
    }
}

#[async_trait]
impl<T: Topic + ?Sized> Topic for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn exists(&self) -> Result<bool, BrokerError> {
        (**self).exists().await
    }

    async fn publish(&self, payload: Bytes) -> Result<String, BrokerError> {
        (**self).publish(payload).await
    }
}
