//! Pub/Sub SDK.
//!
//! Wire objects for the broker's REST v1 contract, resource-name helpers and,
//! behind the `client` feature, typed HTTP clients for publishing and pulling.

#[cfg(feature = "client")]
pub mod client;
pub mod objects;
pub mod resource;
