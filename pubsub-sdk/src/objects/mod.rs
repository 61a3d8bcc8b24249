//! REST v1 wire objects.
//!
//! Field names follow the broker's JSON contract (camelCase). Message data
//! travels as padded base64.

pub mod message;
pub mod requests;

pub use message::{DataDecodeError, PubsubMessage, ReceivedMessage};
pub use requests::{
    AcknowledgeRequest, PublishRequest, PublishResponse, PullRequest, PullResponse,
};
