//! # Transport seam
//!
//! The controller never touches the network directly. It opens streams through a
//! [`Transport`] and drives them through the returned [`StreamHandle`], which lets
//! tests substitute a scripted transport for the gRPC one.

mod grpc;

pub use grpc::{GrpcStream, GrpcTransport};

use crate::{
    credentials::Credentials, error::TransportError, events::StreamEvent,
    filter::SubscriptionFilter,
};
use async_trait::async_trait;

/// Opens subscription streams.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn open(
        &self,
        credentials: &Credentials,
    ) -> Result<Box<dyn StreamHandle>, TransportError>;
}

/// One open, bidirectional subscription stream.
///
/// Dropping the handle closes the stream.
#[async_trait]
pub trait StreamHandle: Send {
    /// Asks the server for its version. Advisory only.
    async fn version(&mut self) -> Result<String, TransportError>;

    /// Writes the subscription request. Returns once the request is accepted by
    /// the stream.
    async fn write(&mut self, filter: &SubscriptionFilter) -> Result<(), TransportError>;

    /// Sends a keep-alive ping on the open stream.
    async fn ping(&mut self, id: i32) -> Result<(), TransportError>;

    /// The next event, in arrival order. `None` once the server has closed the
    /// stream.
    async fn next_event(&mut self) -> Option<Result<StreamEvent, TransportError>>;
}
