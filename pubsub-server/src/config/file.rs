//! TOML file configuration structures.
//!
//! Every section and key is optional; values missing here may come from
//! environment variables or CLI flags instead.

use pubsub_core::processors::DEFAULT_MAX_MESSAGES;
use serde::Deserialize;
use std::net::SocketAddr;

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub broker: BrokerConfig,
    #[serde(default)]
    pub subscriber: SubscriberConfig,
    #[serde(default)]
    pub publisher: PublisherConfig,
}

/// Server configuration section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// The address and port to listen on (e.g., "0.0.0.0:8080").
    #[serde(default = "default_listen_addr")]
    pub listen: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen_addr(),
        }
    }
}

pub(crate) fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

/// Broker connection section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BrokerConfig {
    /// Project that owns the topic / subscription.
    pub project: Option<String>,
    /// `host:port` of a local emulator; the managed broker is used if unset.
    pub emulator_host: Option<String>,
    /// Pre-minted OAuth bearer token.
    pub access_token: Option<String>,
}

/// Subscriber section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubscriberConfig {
    pub subscription: Option<String>,
    /// Upper bound on deliveries fetched per pull.
    #[serde(default = "default_max_messages")]
    pub max_messages: u32,
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self {
            subscription: None,
            max_messages: default_max_messages(),
        }
    }
}

fn default_max_messages() -> u32 {
    DEFAULT_MAX_MESSAGES
}

/// Publisher section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PublisherConfig {
    pub topic: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_config_parsing() {
        let toml_str = r#"
[server]
listen = "127.0.0.1:3000"

[broker]
project = "demo-project"
emulator_host = "localhost:8085"

[subscriber]
subscription = "board-sub"
max_messages = 25

[publisher]
topic = "board"
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.listen.port(), 3000);
        assert_eq!(config.broker.project.as_deref(), Some("demo-project"));
        assert_eq!(config.broker.emulator_host.as_deref(), Some("localhost:8085"));
        assert!(config.broker.access_token.is_none());
        assert_eq!(config.subscriber.subscription.as_deref(), Some("board-sub"));
        assert_eq!(config.subscriber.max_messages, 25);
        assert_eq!(config.publisher.topic.as_deref(), Some("board"));
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: FileConfig = toml::from_str("").unwrap();
        assert_eq!(config.server.listen, default_listen_addr());
        assert_eq!(config.subscriber.max_messages, DEFAULT_MAX_MESSAGES);
        assert!(config.broker.project.is_none());
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let result: Result<FileConfig, _> = toml::from_str("[broker]\nprojcet = \"typo\"\n");
        assert!(result.is_err());
    }
}
