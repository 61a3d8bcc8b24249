//! Topic client (publisher → broker).

use super::{ClientError, Endpoint, parse_exists, parse_response};
use crate::objects::{PublishRequest, PublishResponse, PubsubMessage};
use crate::resource::ResourcePath;

/// Typed HTTP client for a single topic.
#[derive(Debug, Clone)]
pub struct PublisherClient {
    endpoint: Endpoint,
    topic: ResourcePath,
}

impl PublisherClient {
    /// Create a new `PublisherClient`.
    ///
    /// * `endpoint` – broker location and credentials.
    /// * `topic` – `projects/{project}/topics/{name}`.
    pub fn new(endpoint: Endpoint, topic: ResourcePath) -> Self {
        Self { endpoint, topic }
    }

    pub fn topic(&self) -> &ResourcePath {
        &self.topic
    }

    /// `GET /v1/{topic}` – `false` when the broker answers 404.
    ///
    /// Requires the caller to hold at least viewer access on the topic.
    pub async fn exists(&self) -> Result<bool, ClientError> {
        let url = self.endpoint.url(&self.topic, "")?;
        let resp = self.endpoint.get(url).send().await?;
        parse_exists(resp).await
    }

    /// `POST /v1/{topic}:publish` – publish one message and return the
    /// broker-assigned message id.
    pub async fn publish(&self, payload: &[u8]) -> Result<String, ClientError> {
        let url = self.endpoint.url(&self.topic, ":publish")?;
        let resp = self
            .endpoint
            .post(url)
            .json(&PublishRequest {
                messages: vec![PubsubMessage::from_payload(payload)],
            })
            .send()
            .await?;

        let body: PublishResponse = parse_response(resp).await?;
        body.message_ids
            .into_iter()
            .next()
            .ok_or(ClientError::EmptyPublishResponse)
    }
}
