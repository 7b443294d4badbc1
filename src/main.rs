//! condor - Main Entry Point
//!
//! Assembles the engine's composition root: the event registry, the
//! job-processing services, and the processor factory table. Venue
//! connectivity and job persistence attach through the collaborator
//! traits.

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use condor::config::load_config;
use condor::job::{
    InMemoryJobSubmitter, LoggingNotificationService, ProcessorFactoryTable, ServiceContext,
};
use condor::registry::{ExchangeEventRegistry, LoggingFeedConnector};
use condor::sizing::StaticInstrumentCatalog;

/// CLI arguments for the application
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting condor engine");
    info!("Configuration file: {}", args.config);

    let config = load_config(Some(&args.config))?;
    let _catalog = StaticInstrumentCatalog::from_config(&config.instruments);
    info!(instruments = config.instruments.len(), "Loaded instrument catalog");

    let registry = Arc::new(ExchangeEventRegistry::new(Arc::new(LoggingFeedConnector)));
    // Held until the venue connector and job host attach; they consume
    // these through the collaborator traits.
    let _services = ServiceContext {
        registry: registry.clone(),
        job_submitter: Arc::new(InMemoryJobSubmitter::new()),
        notifier: Arc::new(LoggingNotificationService),
    };
    let _factories = ProcessorFactoryTable::standard();

    info!("Engine initialized; waiting for shutdown signal");
    tokio::signal::ctrl_c().await?;
    info!("Received shutdown signal, cleaning up...");

    Ok(())
}
