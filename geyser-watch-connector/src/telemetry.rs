//! # Telemetry
//!
//! Everything the controller observes leaves through a [`TelemetrySink`]: one
//! [`Lifecycle`] record per state transition and one `Decoded` record per decoded
//! event. Records are emitted sequentially, so a sink sees them in arrival order.

use crate::{error::ErrorKind, events::DecodedEvent};
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::mpsc;

/// A state transition of the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lifecycle {
    Connecting { attempt: u64 },
    /// The stream is open; `version` is the server's answer to the handshake.
    Subscribing {
        endpoint: String,
        version: Option<String>,
    },
    Subscribed,
    Error { kind: ErrorKind, message: String },
    Backoff { retries: u32, delay: Duration },
    Aborted { kind: ErrorKind, message: String },
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Telemetry {
    Lifecycle(Lifecycle),
    Decoded(DecodedEvent),
}

#[async_trait]
pub trait TelemetrySink: Send + Sync {
    async fn emit(&self, record: Telemetry);
}

/// Writes every record to the `tracing` subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

#[async_trait]
impl TelemetrySink for TracingSink {
    async fn emit(&self, record: Telemetry) {
        match record {
            Telemetry::Decoded(DecodedEvent::Transaction { slot, signature }) => {
                tracing::info!(slot, signature = %signature, "transaction");
            }
            Telemetry::Decoded(DecodedEvent::Account {
                slot,
                pubkey,
                txn_signature,
            }) => {
                tracing::info!(
                    slot,
                    pubkey = %pubkey,
                    txn_signature = txn_signature.as_deref().unwrap_or("-"),
                    "account"
                );
            }
            Telemetry::Lifecycle(Lifecycle::Connecting { attempt }) => {
                tracing::info!(attempt, "connecting");
            }
            Telemetry::Lifecycle(Lifecycle::Subscribing { endpoint, version }) => {
                tracing::info!(
                    endpoint = %endpoint,
                    server_version = version.as_deref().unwrap_or("unknown"),
                    "subscribing"
                );
            }
            Telemetry::Lifecycle(Lifecycle::Subscribed) => tracing::info!("subscribed"),
            Telemetry::Lifecycle(Lifecycle::Error { kind, message }) => {
                tracing::warn!(kind = %kind, "error: {}", message);
            }
            Telemetry::Lifecycle(Lifecycle::Backoff { retries, delay }) => {
                tracing::info!(
                    retries,
                    delay_ms = delay.as_millis() as u64,
                    "reconnecting after backoff"
                );
            }
            Telemetry::Lifecycle(Lifecycle::Aborted { kind, message }) => {
                tracing::error!(kind = %kind, "aborted: {}", message);
            }
            Telemetry::Lifecycle(Lifecycle::Stopped) => tracing::info!("stopped"),
        }
    }
}

/// Forwards every record into an `mpsc` channel.
///
/// Sending awaits channel capacity, so a slow consumer slows the stream down
/// instead of losing records. Records are dropped once the receiver is gone.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<Telemetry>,
}

impl ChannelSink {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Telemetry>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

#[async_trait]
impl TelemetrySink for ChannelSink {
    async fn emit(&self, record: Telemetry) {
        if self.tx.send(record).await.is_err() {
            tracing::debug!("telemetry receiver dropped, record discarded");
        }
    }
}
