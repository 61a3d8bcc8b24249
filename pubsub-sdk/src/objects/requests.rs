use serde::{Deserialize, Serialize};

use super::message::{PubsubMessage, ReceivedMessage};

/// Body of `POST /v1/{subscription}:pull`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequest {
    pub max_messages: u32,
}

/// Response of `POST /v1/{subscription}:pull`.
///
/// The broker omits `receivedMessages` entirely when nothing is available.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullResponse {
    #[serde(default)]
    pub received_messages: Vec<ReceivedMessage>,
}

/// Body of `POST /v1/{subscription}:acknowledge`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcknowledgeRequest {
    pub ack_ids: Vec<String>,
}

/// Body of `POST /v1/{topic}:publish`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishRequest {
    pub messages: Vec<PubsubMessage>,
}

/// Response of `POST /v1/{topic}:publish`, one id per published message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishResponse {
    #[serde(default)]
    pub message_ids: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_pull_response() {
        let response: PullResponse = serde_json::from_str("{}").unwrap();
        assert!(response.received_messages.is_empty());
    }

    #[test]
    fn test_request_field_names() {
        let pull = serde_json::to_value(PullRequest { max_messages: 10 }).unwrap();
        assert_eq!(pull, serde_json::json!({ "maxMessages": 10 }));

        let ack = serde_json::to_value(AcknowledgeRequest {
            ack_ids: vec!["a".into(), "b".into()],
        })
        .unwrap();
        assert_eq!(ack, serde_json::json!({ "ackIds": ["a", "b"] }));
    }

    #[test]
    fn test_publish_response_parsing() {
        let response: PublishResponse =
            serde_json::from_str(r#"{"messageIds":["1001"]}"#).unwrap();
        assert_eq!(response.message_ids, vec!["1001".to_string()]);
    }
}
