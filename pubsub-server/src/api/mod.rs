//! HTTP handlers.
//!
//! - [`subscriber`]: the received-message list
//! - [`publisher`]: the publish form and its submit endpoint

mod html;
pub mod publisher;
pub mod subscriber;
