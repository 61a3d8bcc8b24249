//! Configuration module for pubsub-server.
//!
//! Handles loading configuration from an optional TOML file, environment
//! variables and CLI arguments. Precedence: CLI flag, then environment
//! variable (both resolved by clap), then file, then default.

pub mod file;

use crate::config::file::FileConfig;
use pubsub_sdk::client::{ClientError, Endpoint};
use pubsub_sdk::resource::{self, ResourceNameError, ResourcePath};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const PROJECT_ENV: &str = "GOOGLE_CLOUD_PROJECT";
pub const SUBSCRIPTION_ENV: &str = "PUBSUB_SUBSCRIPTION";
pub const TOPIC_ENV: &str = "PUBSUB_TOPIC";
pub const EMULATOR_HOST_ENV: &str = "PUBSUB_EMULATOR_HOST";
pub const ACCESS_TOKEN_ENV: &str = "PUBSUB_ACCESS_TOKEN";
pub const LISTEN_ENV: &str = "PUBSUB_LISTEN";

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("couldn't find {0} in env or config file")]
    Missing(&'static str),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("invalid resource name: {0}")]
    ResourceName(#[from] ResourceNameError),

    #[error("invalid broker endpoint: {0}")]
    Endpoint(#[from] ClientError),
}

/// Values supplied on the command line or through the environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub listen: Option<SocketAddr>,
    pub project: Option<String>,
    pub emulator_host: Option<String>,
    pub access_token: Option<String>,
    pub subscription: Option<String>,
    pub topic: Option<String>,
    pub max_messages: Option<u32>,
    pub in_memory: bool,
}

/// Which broker a service talks to.
#[derive(Debug, Clone)]
pub enum BrokerSelection {
    /// An in-process broker; nothing leaves the process.
    InMemory,
    /// The REST broker at `endpoint`, addressing `path`.
    Rest {
        endpoint: Endpoint,
        path: ResourcePath,
    },
}

/// Validated settings for the `subscribe` command.
#[derive(Debug, Clone)]
pub struct SubscriberSettings {
    pub listen: SocketAddr,
    pub max_messages: u32,
    pub broker: BrokerSelection,
}

/// Validated settings for the `publish` command.
#[derive(Debug, Clone)]
pub struct PublisherSettings {
    pub listen: SocketAddr,
    pub endpoint: Endpoint,
    pub topic: ResourcePath,
}

/// Configuration loader that merges file values with overrides.
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
    overrides: Overrides,
}

impl ConfigLoader {
    /// Create a new config loader.
    pub fn new(config_path: Option<&Path>, overrides: Overrides) -> Self {
        Self {
            config_path: config_path.map(Path::to_path_buf),
            overrides,
        }
    }

    /// Settings for the `subscribe` command.
    pub fn load_subscriber(&self) -> Result<SubscriberSettings, ConfigError> {
        let file = self.read_file()?;

        let max_messages = self
            .overrides
            .max_messages
            .unwrap_or(file.subscriber.max_messages);
        if max_messages == 0 {
            return Err(ConfigError::ValidationError(
                "max_messages must be at least 1".to_string(),
            ));
        }

        let broker = if self.overrides.in_memory {
            BrokerSelection::InMemory
        } else {
            let project = self.project(&file)?;
            let subscription = pick(&self.overrides.subscription, &file.subscriber.subscription)
                .ok_or(ConfigError::Missing(SUBSCRIPTION_ENV))?;
            BrokerSelection::Rest {
                endpoint: self.endpoint(&file)?,
                path: resource::subscription_path(&project, &subscription)?,
            }
        };

        Ok(SubscriberSettings {
            listen: self.listen(&file),
            max_messages,
            broker,
        })
    }

    /// Settings for the `publish` command.
    pub fn load_publisher(&self) -> Result<PublisherSettings, ConfigError> {
        let file = self.read_file()?;

        let project = self.project(&file)?;
        let topic = pick(&self.overrides.topic, &file.publisher.topic)
            .ok_or(ConfigError::Missing(TOPIC_ENV))?;

        Ok(PublisherSettings {
            listen: self.listen(&file),
            endpoint: self.endpoint(&file)?,
            topic: resource::topic_path(&project, &topic)?,
        })
    }

    fn read_file(&self) -> Result<FileConfig, ConfigError> {
        match &self.config_path {
            Some(path) => {
                let content = std::fs::read_to_string(path)?;
                Ok(toml::from_str(&content)?)
            }
            None => Ok(FileConfig::default()),
        }
    }

    fn listen(&self, file: &FileConfig) -> SocketAddr {
        self.overrides.listen.unwrap_or(file.server.listen)
    }

    fn project(&self, file: &FileConfig) -> Result<String, ConfigError> {
        pick(&self.overrides.project, &file.broker.project).ok_or(ConfigError::Missing(PROJECT_ENV))
    }

    fn endpoint(&self, file: &FileConfig) -> Result<Endpoint, ConfigError> {
        let endpoint = match pick(&self.overrides.emulator_host, &file.broker.emulator_host) {
            Some(host) => Endpoint::emulator(&host)?,
            None => Endpoint::production()?,
        };
        Ok(
            match pick(&self.overrides.access_token, &file.broker.access_token) {
                Some(token) => endpoint.with_access_token(token),
                None => endpoint,
            },
        )
    }
}

/// First non-empty value, override before file.
fn pick(over: &Option<String>, file: &Option<String>) -> Option<String> {
    over.iter()
        .chain(file.iter())
        .find(|value| !value.is_empty())
        .cloned()
}
