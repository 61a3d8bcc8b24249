//! Subscription client (broker → subscriber).

use super::{ClientError, Endpoint, parse_exists, parse_response};
use crate::objects::{AcknowledgeRequest, PullRequest, PullResponse, ReceivedMessage};
use crate::resource::ResourcePath;

/// Typed HTTP client for a single subscription.
#[derive(Debug, Clone)]
pub struct SubscriberClient {
    endpoint: Endpoint,
    subscription: ResourcePath,
}

impl SubscriberClient {
    /// Create a new `SubscriberClient`.
    ///
    /// * `endpoint` – broker location and credentials.
    /// * `subscription` – `projects/{project}/subscriptions/{name}`.
    pub fn new(endpoint: Endpoint, subscription: ResourcePath) -> Self {
        Self {
            endpoint,
            subscription,
        }
    }

    pub fn subscription(&self) -> &ResourcePath {
        &self.subscription
    }

    /// `GET /v1/{subscription}` – `false` when the broker answers 404.
    pub async fn exists(&self) -> Result<bool, ClientError> {
        let url = self.endpoint.url(&self.subscription, "")?;
        let resp = self.endpoint.get(url).send().await?;
        parse_exists(resp).await
    }

    /// `POST /v1/{subscription}:pull` – fetch up to `max_messages`.
    ///
    /// The broker may hold the request open until messages arrive and may
    /// return an empty batch.
    pub async fn pull(&self, max_messages: u32) -> Result<Vec<ReceivedMessage>, ClientError> {
        let url = self.endpoint.url(&self.subscription, ":pull")?;
        let resp = self
            .endpoint
            .post(url)
            .json(&PullRequest { max_messages })
            .send()
            .await?;

        let body: PullResponse = parse_response(resp).await?;
        Ok(body.received_messages)
    }

    /// `POST /v1/{subscription}:acknowledge`.
    ///
    /// An empty `ack_ids` slice returns immediately without a request.
    pub async fn acknowledge(&self, ack_ids: &[String]) -> Result<(), ClientError> {
        if ack_ids.is_empty() {
            return Ok(());
        }

        let url = self.endpoint.url(&self.subscription, ":acknowledge")?;
        let resp = self
            .endpoint
            .post(url)
            .json(&AcknowledgeRequest {
                ack_ids: ack_ids.to_vec(),
            })
            .send()
            .await?;

        // The broker answers with an empty JSON object.
        let _: serde_json::Value = parse_response(resp).await?;
        Ok(())
    }
}
