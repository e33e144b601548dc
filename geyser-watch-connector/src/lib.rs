//! A Rust client for the Solana Geyser real-time feed.
//!
//! The crate keeps a single subscription to a Geyser gRPC endpoint alive across
//! network and server failures, and decodes the binary identifiers of incoming
//! transaction and account updates into base-58 text.
//!
//! # Key Components
//!
//! *   [`filter`]: The `SubscriptionFilter` builder describing what the server pushes.
//! *   [`events`]: The `StreamEvent` union and the base-58 decoder.
//! *   [`controller`]: The `StreamController` reconnect loop and its `ControllerHandle`.
//! *   [`transport`]: The `Transport` seam and its gRPC implementation.
//! *   [`telemetry`]: Sinks that receive decoded events and lifecycle notices.
/// Delay curve and retry ceiling for reconnects.
pub mod backoff;
/// Defines configuration structures for the connector.
pub mod config;
pub mod controller;
/// Resolution of the endpoint and access token.
pub mod credentials;
pub mod error;
pub mod events;
pub mod filter;
pub mod telemetry;
pub mod transport;

/// Wire messages of the Geyser gRPC service.
pub mod proto {
    pub use yellowstone_grpc_proto::prelude::*;
}

pub use controller::{ControllerHandle, ControllerState, ControllerStatus, StreamController};
pub use error::ConnectorError;
