use clap::{Parser, Subcommand};

/// Streams a program's transactions and accounts from a Geyser gRPC feed.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Subscribe to the feed and log every decoded event until Ctrl+C.
    Run(RunCmd),
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunCmd {
    /// Path to the configuration TOML file.
    /// If not provided, default values will be used.
    #[arg(short, long)]
    pub config: Option<String>,

    /// Program to watch, overriding `connector.subscription.program-id`.
    #[arg(short, long)]
    pub program: Option<String>,
}
