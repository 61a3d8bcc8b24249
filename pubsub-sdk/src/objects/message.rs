use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The message payload could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DataDecodeError {
    #[error("message data is not valid base64")]
    InvalidBase64,
}

/// A message as it appears on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PubsubMessage {
    /// Base64-encoded payload.
    #[serde(default)]
    pub data: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    /// Assigned by the broker on publish; absent in outgoing messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    /// RFC 3339 timestamp assigned by the broker.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish_time: Option<String>,
}

impl PubsubMessage {
    /// Build an outgoing message carrying `payload`.
    pub fn from_payload(payload: &[u8]) -> Self {
        Self {
            data: fast32::base64::RFC4648.encode(payload),
            ..Default::default()
        }
    }

    /// Decode the base64 payload.
    pub fn payload(&self) -> Result<Bytes, DataDecodeError> {
        if self.data.is_empty() {
            return Ok(Bytes::new());
        }
        fast32::base64::RFC4648
            .decode_str(&self.data)
            .map(Bytes::from)
            .map_err(|_| DataDecodeError::InvalidBase64)
    }
}

/// A message delivered by a pull, paired with the id used to acknowledge it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceivedMessage {
    pub ack_id: String,
    pub message: PubsubMessage,
}
