pub mod cli;
pub mod config;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use config::{load_config, load_env_config, AppConfig};
use geyser_watch_connector::{
    credentials::EnvCredentialResolver, filter::SubscriptionFilter, telemetry::TracingSink,
    transport::GrpcTransport, ConnectorError, StreamController,
};
use solana_sdk::pubkey::Pubkey;
use std::{str::FromStr, sync::Arc};
use tokio::signal;

/// The main entry point of the `geyser-watch` binary.
/// Handles CLI parsing, configuration and logging, then streams until Ctrl+C.
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    let Commands::Run(run_cmd) = cli.command;
    let mut config = load_config_from_cli(&run_cmd)?;
    if let Some(program) = run_cmd.program {
        config.connector.subscription.program_id = program;
    }
    geyser_watch_logger::init(&config.log)?;
    tracing::debug!("Configuration loaded: {:#?}", &config);
    run_stream(config).await
}

fn load_config_from_cli(run_cmd: &cli::RunCmd) -> Result<AppConfig> {
    if let Some(config_path) = &run_cmd.config {
        println!("Loading configuration from '{}'", config_path);
        load_config(config_path)
    } else {
        println!("No config file provided, using default settings.");
        load_env_config()
    }
}

/// Builds the subscription for the configured program.
pub fn subscription_filter(config: &AppConfig) -> Result<SubscriptionFilter> {
    let subscription = &config.connector.subscription;
    let program = Pubkey::from_str(&subscription.program_id).with_context(|| {
        format!("Invalid program id '{}'", subscription.program_id)
    })?;

    let mut filter = SubscriptionFilter::watch_program(program, subscription.commitment);
    filter.keep_alive = subscription.keep_alive;
    Ok(filter)
}

/// Runs the stream controller and stops it on Ctrl+C.
async fn run_stream(config: AppConfig) -> Result<()> {
    let filter = Arc::new(subscription_filter(&config)?);
    let connector = Arc::new(config.connector);

    let (controller, handle) = StreamController::new(
        connector.clone(),
        Arc::new(GrpcTransport::new(connector.clone())),
        Arc::new(EnvCredentialResolver::from_config(&connector.endpoint)),
        filter,
        Arc::new(TracingSink),
    );
    let mut task = tokio::spawn(controller.run());

    let outcome = tokio::select! {
        joined = &mut task => joined,
        signal = signal::ctrl_c() => {
            match signal {
                Ok(()) => tracing::info!("Received Ctrl+C, initiating graceful shutdown..."),
                Err(err) => tracing::error!(error = %err, "Failed to listen for shutdown signal."),
            }
            handle.stop();
            task.await
        }
    };

    let result: Result<(), ConnectorError> = outcome.context("Stream controller task panicked")?;
    result.context("Stream controller aborted")?;
    tracing::info!("Shutdown complete.");
    Ok(())
}
