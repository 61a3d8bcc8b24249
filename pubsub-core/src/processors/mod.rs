//! Long-running processors.
//!
//! - `Ingestor`: pulls from a [`Subscription`](crate::broker::Subscription),
//!   appends to the [`EventBuffer`](crate::buffer::EventBuffer) and
//!   acknowledges each batch

pub mod ingestor;

pub use ingestor::{DEFAULT_MAX_MESSAGES, IngestError, Ingestor};
