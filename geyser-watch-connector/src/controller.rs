//! # Reconnecting Stream Controller
//!
//! The [`StreamController`] owns the whole connect → subscribe → consume → fail →
//! backoff → reconnect lifecycle as an explicit loop:
//!
//! ```text
//! Idle → Connecting → Subscribing → Streaming → Failed → Backoff → Connecting …
//!            │                                      │
//!            └── missing credential ──→ Aborted ←── retry ceiling crossed
//! ```
//!
//! - Exactly one stream is open at any time. The handle lives inside a single
//!   session and is dropped before the controller backs off.
//! - Events are decoded and emitted one by one, in the order the transport
//!   delivers them.
//! - Every await point, the backoff sleep included, races the shutdown signal
//!   sent through [`ControllerHandle::stop`].
//!
//! Only `MissingCredential` and `RetryExhausted` are returned from
//! [`StreamController::run`]; all other errors cause a reconnect.

use crate::{
    backoff::{ConnectionAttempt, ReconnectPolicy},
    config::{ConnectorConfig, RetryBudget},
    credentials::{CredentialResolver, Credentials},
    error::{ConnectorError, ErrorKind, TransportError},
    events::{self, StreamEvent},
    filter::SubscriptionFilter,
    telemetry::{Lifecycle, Telemetry, TelemetrySink},
    transport::{StreamHandle, Transport},
};
use std::{sync::Arc, time::Duration};
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    Connecting,
    Subscribing,
    Streaming,
    Failed,
    Backoff,
    /// Terminal: credentials were missing or the retry ceiling was crossed.
    Aborted,
    /// Terminal: shutdown was requested.
    Stopped,
}

/// A snapshot of the controller, published on every transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerStatus {
    pub state: ControllerState,
    /// Failures counted against the retry ceiling so far.
    pub retries: u32,
    /// The error behind the latest failure, cleared once a subscription succeeds.
    pub last_error: Option<String>,
}

/// A clonable handle for stopping and observing a running [`StreamController`].
#[derive(Debug, Clone)]
pub struct ControllerHandle {
    shutdown_tx: Arc<watch::Sender<bool>>,
    status_rx: watch::Receiver<ControllerStatus>,
}

impl ControllerHandle {
    /// Asks the controller to close its stream and return from `run`.
    ///
    /// Takes effect at the next await point, including a pending backoff sleep.
    pub fn stop(&self) {
        self.shutdown_tx.send_replace(true);
    }

    pub fn status(&self) -> ControllerStatus {
        self.status_rx.borrow().clone()
    }

    /// A receiver that is notified on every state transition.
    pub fn subscribe_status(&self) -> watch::Receiver<ControllerStatus> {
        self.status_rx.clone()
    }
}

enum SessionEnd {
    Shutdown,
    Failed(ConnectorError),
}

/// Keeps one subscription alive for the lifetime of the process.
pub struct StreamController {
    transport: Arc<dyn Transport>,
    resolver: Arc<dyn CredentialResolver>,
    filter: Arc<SubscriptionFilter>,
    sink: Arc<dyn TelemetrySink>,
    policy: ReconnectPolicy,
    version_timeout: Duration,
    shutdown_rx: watch::Receiver<bool>,
    status_tx: watch::Sender<ControllerStatus>,
    retries: u32,
    connections: u64,
    ping_id: i32,
}

impl StreamController {
    /// Creates a controller and its [`ControllerHandle`].
    ///
    /// Nothing is opened until [`run()`](Self::run) is awaited.
    pub fn new(
        config: Arc<ConnectorConfig>,
        transport: Arc<dyn Transport>,
        resolver: Arc<dyn CredentialResolver>,
        filter: Arc<SubscriptionFilter>,
        sink: Arc<dyn TelemetrySink>,
    ) -> (Self, ControllerHandle) {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (status_tx, status_rx) = watch::channel(ControllerStatus {
            state: ControllerState::Idle,
            retries: 0,
            last_error: None,
        });

        let controller = Self {
            transport,
            resolver,
            filter,
            sink,
            policy: ReconnectPolicy::from(&config.reconnect),
            version_timeout: Duration::from_secs(config.endpoint.version_timeout_secs),
            shutdown_rx,
            status_tx,
            retries: 0,
            connections: 0,
            ping_id: 0,
        };
        let handle = ControllerHandle {
            shutdown_tx: Arc::new(shutdown_tx),
            status_rx,
        };
        (controller, handle)
    }

    /// Runs the reconnect loop until shutdown or a fatal error.
    ///
    /// Returns `Ok(())` after [`ControllerHandle::stop`], and
    /// `Err(MissingCredential | RetryExhausted)` otherwise.
    pub async fn run(mut self) -> Result<(), ConnectorError> {
        tracing::info!(
            max_retries = self.policy.max_retries,
            budget = ?self.policy.budget,
            "Stream controller started."
        );
        let mut attempt = ConnectionAttempt::new(&self.policy);

        loop {
            if shutdown_requested(&self.shutdown_rx) {
                self.stopped().await;
                return Ok(());
            }

            self.connections += 1;
            self.set_state(ControllerState::Connecting);
            self.emit(Lifecycle::Connecting {
                attempt: self.connections,
            })
            .await;

            let credentials = match self.resolver.resolve() {
                Ok(credentials) => credentials,
                Err(e) => return Err(self.abort(ConnectorError::MissingCredential(e)).await),
            };

            let error = match self.session(&credentials, &mut attempt).await {
                SessionEnd::Shutdown => {
                    self.stopped().await;
                    return Ok(());
                }
                SessionEnd::Failed(error) => error,
            };
            if !error.is_recoverable() {
                return Err(self.abort(error).await);
            }

            attempt.record_failure(&error);
            self.retries = self.retries.saturating_add(1);
            self.status_tx.send_modify(|status| {
                status.state = ControllerState::Failed;
                status.last_error = Some(error.to_string());
            });
            self.publish_retries();
            self.emit(Lifecycle::Error {
                kind: error.kind(),
                message: error.to_string(),
            })
            .await;

            if self.policy.is_exhausted(self.retries) {
                let exhausted = ConnectorError::RetryExhausted {
                    retries: self.retries,
                    last_error: attempt.last_error().unwrap_or_default().to_string(),
                };
                return Err(self.abort(exhausted).await);
            }

            let delay = attempt.next_delay();
            self.set_state(ControllerState::Backoff);
            self.emit(Lifecycle::Backoff {
                retries: self.retries,
                delay,
            })
            .await;

            tokio::select! {
                biased;
                _ = wait_for_shutdown(&mut self.shutdown_rx) => {
                    self.stopped().await;
                    return Ok(());
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    /// One connection, from open to the error that ends it. The stream handle
    /// is dropped when this returns.
    async fn session(
        &mut self,
        credentials: &Credentials,
        attempt: &mut ConnectionAttempt,
    ) -> SessionEnd {
        let opened = tokio::select! {
            biased;
            _ = wait_for_shutdown(&mut self.shutdown_rx) => return SessionEnd::Shutdown,
            opened = self.transport.open(credentials) => opened,
        };
        let mut stream = match opened {
            Ok(stream) => stream,
            Err(e) => return SessionEnd::Failed(ConnectorError::Connect(e)),
        };

        self.set_state(ControllerState::Subscribing);
        let version = tokio::select! {
            biased;
            _ = wait_for_shutdown(&mut self.shutdown_rx) => return SessionEnd::Shutdown,
            version = tokio::time::timeout(self.version_timeout, stream.version()) => version,
        };
        let version = match version {
            Ok(Ok(version)) => Some(version),
            Ok(Err(e)) => {
                tracing::debug!(error = %e, "Version check failed, subscribing anyway.");
                None
            }
            Err(_) => {
                tracing::debug!(
                    timeout_ms = self.version_timeout.as_millis() as u64,
                    "Version check timed out, subscribing anyway."
                );
                None
            }
        };
        self.emit(Lifecycle::Subscribing {
            endpoint: credentials.endpoint.clone(),
            version,
        })
        .await;

        let written = tokio::select! {
            biased;
            _ = wait_for_shutdown(&mut self.shutdown_rx) => return SessionEnd::Shutdown,
            written = stream.write(&self.filter) => written,
        };
        if let Err(e) = written {
            return SessionEnd::Failed(ConnectorError::SubscribeWrite(e));
        }

        *attempt = ConnectionAttempt::new(&self.policy);
        if self.policy.budget == RetryBudget::PerConnection {
            self.retries = 0;
        }
        self.status_tx.send_modify(|status| {
            status.state = ControllerState::Streaming;
            status.last_error = None;
        });
        self.publish_retries();
        self.emit(Lifecycle::Subscribed).await;

        loop {
            let next = tokio::select! {
                biased;
                _ = wait_for_shutdown(&mut self.shutdown_rx) => return SessionEnd::Shutdown,
                next = stream.next_event() => next,
            };
            let result = match next {
                Some(Ok(event)) => self.handle_event(stream.as_mut(), event).await,
                Some(Err(e)) => Err(e),
                None => Err(TransportError::EndOfStream),
            };
            if let Err(e) = result {
                return SessionEnd::Failed(ConnectorError::Stream(e));
            }
        }
    }

    async fn handle_event(
        &mut self,
        stream: &mut dyn StreamHandle,
        event: StreamEvent,
    ) -> Result<(), TransportError> {
        if event == StreamEvent::Ping {
            if self.filter.keep_alive {
                self.ping_id = self.ping_id.wrapping_add(1);
                stream.ping(self.ping_id).await?;
                tracing::trace!(id = self.ping_id, "Answered server ping.");
            }
            return Ok(());
        }

        match events::decode(&event) {
            Some(Ok(decoded)) => self.sink.emit(Telemetry::Decoded(decoded)).await,
            Some(Err(anomaly)) => {
                tracing::warn!(
                    kind = %ErrorKind::DecodeAnomaly,
                    error = %anomaly,
                    "Skipping malformed event."
                );
            }
            None => tracing::trace!(?event, "Ignoring event."),
        }
        Ok(())
    }

    async fn abort(&mut self, error: ConnectorError) -> ConnectorError {
        self.set_state(ControllerState::Aborted);
        self.emit(Lifecycle::Aborted {
            kind: error.kind(),
            message: error.to_string(),
        })
        .await;
        error
    }

    async fn stopped(&mut self) {
        self.set_state(ControllerState::Stopped);
        self.emit(Lifecycle::Stopped).await;
        tracing::info!("Stream controller has shut down.");
    }

    fn set_state(&self, state: ControllerState) {
        self.status_tx.send_modify(|status| status.state = state);
    }

    fn publish_retries(&self) {
        let retries = self.retries;
        self.status_tx.send_modify(|status| status.retries = retries);
    }

    async fn emit(&self, lifecycle: Lifecycle) {
        self.sink.emit(Telemetry::Lifecycle(lifecycle)).await;
    }
}

fn shutdown_requested(rx: &watch::Receiver<bool>) -> bool {
    *rx.borrow()
}

async fn wait_for_shutdown(rx: &mut watch::Receiver<bool>) {
    let closed = rx.wait_for(|stop| *stop).await.is_err();
    if closed {
        // Every handle is gone, so nothing can ask for a shutdown any more.
        std::future::pending::<()>().await;
    }
}
