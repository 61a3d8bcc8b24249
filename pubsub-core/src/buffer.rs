//! Append-only message buffer.
//!
//! [`EventBuffer`] is written by a single ingestion loop and read by any
//! number of request handlers. Readers take point-in-time snapshots; a
//! snapshot always reflects a whole number of completed appends, and a later
//! snapshot always extends an earlier one.

use bytes::Bytes;
use std::borrow::Cow;
use std::sync::Arc;
use tokio::sync::RwLock;

/// An immutable message record.
///
/// Ids carry no uniqueness guarantee; duplicates are kept in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    id: String,
    payload: Bytes,
}

impl Message {
    pub fn new(id: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            id: id.into(),
            payload: payload.into(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// The payload as text, with invalid UTF-8 replaced.
    pub fn payload_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }
}

/// Ordered, append-only sequence of [`Message`]s.
///
/// Cloning is cheap and yields another handle to the same sequence. The
/// sequence sits behind one readers-writer lock: appends are exclusive,
/// snapshots run concurrently with each other. Nothing awaits while the lock
/// is held other than acquiring it.
#[derive(Debug, Clone, Default)]
pub struct EventBuffer {
    messages: Arc<RwLock<Vec<Message>>>,
}

impl EventBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `message` at the end of the sequence.
    ///
    /// The message is visible to every snapshot that starts after this
    /// returns. Growth is unbounded.
    pub async fn append(&self, message: Message) {
        self.messages.write().await.push(message);
    }

    /// Copy of every message appended before the call, in arrival order.
    pub async fn snapshot(&self) -> Vec<Message> {
        self.messages.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.messages.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.messages.read().await.is_empty()
    }
}
