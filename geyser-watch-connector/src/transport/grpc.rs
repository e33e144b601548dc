use crate::{
    config::ConnectorConfig,
    credentials::Credentials,
    error::TransportError,
    events::StreamEvent,
    filter::SubscriptionFilter,
    proto::{SubscribeRequest, SubscribeUpdate},
    transport::{StreamHandle, Transport},
};
use async_trait::async_trait;
use std::{sync::Arc, time::Duration};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tonic::{service::Interceptor, Streaming};
use yellowstone_grpc_client::{ClientTlsConfig, GeyserGrpcBuilder, GeyserGrpcClient};

/// A [`Transport`] over the Geyser gRPC service.
///
/// Every call to [`Transport::open`] builds a new channel, so no connection state
/// survives a reconnect.
#[derive(Debug, Clone)]
pub struct GrpcTransport {
    config: Arc<ConnectorConfig>,
}

impl GrpcTransport {
    pub fn new(config: Arc<ConnectorConfig>) -> Self {
        Self { config }
    }

    /// The client builder for `credentials`, with the token attached to every call.
    pub fn builder(&self, credentials: &Credentials) -> Result<GeyserGrpcBuilder, TransportError> {
        let url = credentials.endpoint.as_str();
        let invalid = |reason: String| TransportError::InvalidEndpoint {
            endpoint: url.to_string(),
            reason,
        };

        let mut builder = GeyserGrpcClient::build_from_shared(url.to_string())
            .map_err(|e| invalid(e.to_string()))?
            .x_token(Some(credentials.token.clone()))
            .map_err(|_| TransportError::InvalidToken)?
            .connect_timeout(Duration::from_secs(
                self.config.endpoint.connect_timeout_secs,
            ))
            .tcp_nodelay(true)
            .http2_keep_alive_interval(Duration::from_secs(30))
            .keep_alive_while_idle(true)
            .max_decoding_message_size(self.config.endpoint.max_decoding_message_size);

        if url.starts_with("https://") {
            builder = builder
                .tls_config(ClientTlsConfig::new().with_native_roots())
                .map_err(|e| invalid(e.to_string()))?;
        }
        Ok(builder)
    }
}

#[async_trait]
impl Transport for GrpcTransport {
    async fn open(
        &self,
        credentials: &Credentials,
    ) -> Result<Box<dyn StreamHandle>, TransportError> {
        let client = self.builder(credentials)?.connect().await?;
        tracing::debug!(endpoint = %credentials.endpoint, "gRPC channel established");

        Ok(Box::new(GrpcStream::new(
            client,
            self.config.channels.request_buffer,
        )))
    }
}

/// One Geyser `Subscribe` call.
///
/// The call itself starts on the first [`StreamHandle::write`]: the subscribe
/// request is queued before the call is made, so servers that wait for the first
/// request before answering are served too.
pub struct GrpcStream<F> {
    client: GeyserGrpcClient<F>,
    request_buffer: usize,
    requests: Option<mpsc::Sender<SubscribeRequest>>,
    updates: Option<Streaming<SubscribeUpdate>>,
}

impl<F> GrpcStream<F>
where
    F: Interceptor + Send + Sync + 'static,
{
    pub fn new(client: GeyserGrpcClient<F>, request_buffer: usize) -> Self {
        Self {
            client,
            request_buffer,
            requests: None,
            updates: None,
        }
    }

    /// Whether the `Subscribe` call has been made.
    pub fn is_subscribed(&self) -> bool {
        self.requests.is_some()
    }

    async fn start(&mut self, first: SubscribeRequest) -> Result<(), TransportError> {
        let (tx, rx) = mpsc::channel(self.request_buffer.max(1));
        tx.send(first)
            .await
            .map_err(|_| TransportError::RequestChannelClosed)?;

        let response = self.client.geyser.subscribe(ReceiverStream::new(rx)).await?;

        self.requests = Some(tx);
        self.updates = Some(response.into_inner());
        Ok(())
    }

    async fn send(&mut self, request: SubscribeRequest) -> Result<(), TransportError> {
        match &self.requests {
            Some(tx) => tx
                .send(request)
                .await
                .map_err(|_| TransportError::RequestChannelClosed),
            None => self.start(request).await,
        }
    }
}

#[async_trait]
impl<F> StreamHandle for GrpcStream<F>
where
    F: Interceptor + Send + Sync + 'static,
{
    async fn version(&mut self) -> Result<String, TransportError> {
        let response = self.client.get_version().await?;
        Ok(response.version)
    }

    async fn write(&mut self, filter: &SubscriptionFilter) -> Result<(), TransportError> {
        self.send(filter.to_request()).await
    }

    async fn ping(&mut self, id: i32) -> Result<(), TransportError> {
        if !self.is_subscribed() {
            return Err(TransportError::NotSubscribed);
        }
        self.send(SubscriptionFilter::ping_request(id)).await
    }

    async fn next_event(&mut self) -> Option<Result<StreamEvent, TransportError>> {
        let Some(updates) = self.updates.as_mut() else {
            return Some(Err(TransportError::NotSubscribed));
        };
        match updates.message().await {
            Ok(Some(update)) => Some(Ok(StreamEvent::from(update))),
            Ok(None) => None,
            Err(status) => Some(Err(TransportError::Status(status))),
        }
    }
}
