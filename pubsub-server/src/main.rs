//! Pub/Sub message board server
//!
//! `subscribe` pulls messages from a subscription into memory and lists them;
//! `publish` serves a form that publishes to a topic.

mod api;
mod config;
mod server;
mod shutdown;
mod state;

use anyhow::Context;
use clap::{Parser, Subcommand};
use config::{
    ACCESS_TOKEN_ENV, BrokerSelection, ConfigLoader, EMULATOR_HOST_ENV, LISTEN_ENV, Overrides,
    PROJECT_ENV, SUBSCRIPTION_ENV, TOPIC_ENV,
};
use pubsub_core::EventBuffer;
use pubsub_core::broker::{InMemoryBroker, Subscription};
use pubsub_core::processors::{IngestError, Ingestor};
use pubsub_sdk::client::{PublisherClient, SubscriberClient};
use server::{build_publisher_router, build_subscriber_router, run_server};
use shutdown::{shutdown_signal, wait_for_shutdown};
use state::{PublisherState, SubscriberState};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Pub/Sub message board - publish through a form, list what a subscription receives
#[derive(Parser, Debug)]
#[command(name = "pubsub-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to an optional TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the listen address (e.g., 0.0.0.0:8080)
    #[arg(short, long, global = true, env = LISTEN_ENV)]
    listen: Option<SocketAddr>,

    /// Project that owns the topic or subscription
    #[arg(long, global = true, env = PROJECT_ENV)]
    project: Option<String>,

    /// host:port of a local broker emulator
    #[arg(long, global = true, env = EMULATOR_HOST_ENV)]
    emulator_host: Option<String>,

    /// OAuth bearer token sent with every broker request
    #[arg(long, global = true, env = ACCESS_TOKEN_ENV, hide_env_values = true)]
    access_token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Receive messages from a subscription and list them at `/`
    Subscribe {
        /// Subscription to pull from
        #[arg(long, env = SUBSCRIPTION_ENV)]
        subscription: Option<String>,

        /// Upper bound on messages fetched per pull
        #[arg(long)]
        max_messages: Option<u32>,

        /// Use an in-process broker and serve the publish form alongside the list
        #[arg(long)]
        in_memory: bool,
    },
    /// Serve a form at `/` that publishes to a topic
    Publish {
        /// Topic to publish to
        #[arg(long, env = TOPIC_ENV)]
        topic: Option<String>,
    },
}

impl Args {
    fn overrides(&self) -> Overrides {
        let mut overrides = Overrides {
            listen: self.listen,
            project: self.project.clone(),
            emulator_host: self.emulator_host.clone(),
            access_token: self.access_token.clone(),
            ..Default::default()
        };
        match &self.command {
            Command::Subscribe {
                subscription,
                max_messages,
                in_memory,
            } => {
                overrides.subscription = subscription.clone();
                overrides.max_messages = *max_messages;
                overrides.in_memory = *in_memory;
            }
            Command::Publish { topic } => {
                overrides.topic = topic.clone();
            }
        }
        overrides
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    init_tracing();

    // Parse command line arguments
    let args = Args::parse();

    tracing::info!("Starting pubsub-server v{}", env!("CARGO_PKG_VERSION"));

    let loader = ConfigLoader::new(args.config.as_deref(), args.overrides());

    match args.command {
        Command::Subscribe { .. } => run_subscriber(&loader).await,
        Command::Publish { .. } => run_publisher(&loader).await,
    }
}

/// `subscribe`: verify the subscription, start ingesting, then serve the list.
async fn run_subscriber(loader: &ConfigLoader) -> anyhow::Result<()> {
    let settings = loader.load_subscriber().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;

    let buffer = EventBuffer::new();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let (ingest_task, publisher) = match settings.broker {
        BrokerSelection::InMemory => {
            tracing::info!("Using in-memory broker");
            let broker = InMemoryBroker::new();
            let task = start_ingestor(
                broker.clone(),
                buffer.clone(),
                settings.max_messages,
                shutdown_rx.clone(),
            )
            .await?;
            (task, Some(PublisherState::new(Arc::new(broker))))
        }
        BrokerSelection::Rest { endpoint, path } => {
            tracing::info!(subscription = %path, base_url = %endpoint.base_url(), "Created client");
            let client = SubscriberClient::new(endpoint, path);
            let task = start_ingestor(
                client,
                buffer.clone(),
                settings.max_messages,
                shutdown_rx.clone(),
            )
            .await?;
            (task, None)
        }
    };

    let supervisor = tokio::spawn(supervise_ingestor(ingest_task, shutdown_tx));

    let router = build_subscriber_router(
        SubscriberState::new(buffer, publisher.is_some()),
        publisher,
    );

    tracing::info!("Starting HTTP server on {}", settings.listen);
    run_server(router, settings.listen, wait_for_shutdown(shutdown_rx)).await?;

    supervisor
        .await
        .context("ingestion supervisor panicked")??;
    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Check the subscription exists and spawn the pull loop.
///
/// A missing subscription or unreachable broker is fatal: the server does
/// not start without a working ingestion path.
async fn start_ingestor<S: Subscription + 'static>(
    subscription: S,
    buffer: EventBuffer,
    max_messages: u32,
    shutdown_rx: watch::Receiver<bool>,
) -> anyhow::Result<JoinHandle<Result<(), IngestError>>> {
    let ingestor = Ingestor::new(subscription, buffer).with_max_messages(max_messages);
    ingestor.verify().await.map_err(|e| {
        tracing::error!("Error finding subscription: {}", e);
        e
    })?;
    Ok(tokio::spawn(ingestor.run(shutdown_rx)))
}

/// Wait for either an OS shutdown signal or the ingestor stopping on its
/// own, then broadcast shutdown and return the ingestor's outcome.
async fn supervise_ingestor(
    mut ingest_task: JoinHandle<Result<(), IngestError>>,
    shutdown_tx: watch::Sender<bool>,
) -> anyhow::Result<()> {
    let finished_early = tokio::select! {
        joined = &mut ingest_task => Some(joined),
        _ = shutdown_signal() => None,
    };

    let _ = shutdown_tx.send(true);

    let joined = match finished_early {
        Some(joined) => {
            tracing::error!("Ingestion stopped while serving, shutting down");
            joined
        }
        None => ingest_task.await,
    };

    joined.context("ingestion task panicked")?.map_err(|e| {
        tracing::error!("Failed to receive: {}", e);
        e.into()
    })
}

/// `publish`: verify the topic, then serve the form.
async fn run_publisher(loader: &ConfigLoader) -> anyhow::Result<()> {
    let settings = loader.load_publisher().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;

    let client = PublisherClient::new(settings.endpoint, settings.topic);
    tracing::info!(topic = %client.topic(), "Created client");

    // The existence check requires viewer access on the topic.
    let exists = client.exists().await.map_err(|e| {
        tracing::error!("Error finding topic: {}", e);
        e
    })?;
    if !exists {
        tracing::error!("Couldn't find topic {}", client.topic());
        anyhow::bail!("topic {} does not exist", client.topic());
    }

    let router = build_publisher_router(PublisherState::new(Arc::new(client)));

    tracing::info!("Starting HTTP server on {}", settings.listen);
    run_server(router, settings.listen, shutdown_signal()).await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
