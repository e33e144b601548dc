#![allow(dead_code)]

use async_trait::async_trait;
use geyser_watch_connector::{
    config::{ConnectorConfig, ReconnectConfig},
    credentials::Credentials,
    error::TransportError,
    events::StreamEvent,
    filter::SubscriptionFilter,
    telemetry::{Lifecycle, Telemetry},
    transport::{StreamHandle, Transport},
};
use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};
use tokio::sync::mpsc;

/// What a scripted stream does after its events are exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum After {
    /// Stay open without delivering anything.
    Hang,
    /// End the stream from the server side.
    Close,
}

/// An item delivered by a scripted stream.
#[derive(Debug, Clone)]
pub enum Item {
    Event(StreamEvent),
    Fail(&'static str),
}

/// How a scripted stream answers the version check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handshake {
    Answer,
    Fail,
    /// Never answer.
    Hang,
}

/// The outcome of one `open` call.
#[derive(Debug, Clone)]
pub enum Open {
    Refuse,
    Stream {
        handshake: Handshake,
        write_fails: bool,
        items: Vec<Item>,
        after: After,
    },
}

impl Open {
    pub fn streaming(events: Vec<StreamEvent>, after: After) -> Self {
        Open::Stream {
            handshake: Handshake::Answer,
            write_fails: false,
            items: events.into_iter().map(Item::Event).collect(),
            after,
        }
    }

    pub fn with_handshake(handshake: Handshake, events: Vec<StreamEvent>) -> Self {
        Open::Stream {
            handshake,
            write_fails: false,
            items: events.into_iter().map(Item::Event).collect(),
            after: After::Hang,
        }
    }
}

#[derive(Debug, Default)]
pub struct Counters {
    pub opens: AtomicUsize,
    pub writes: AtomicUsize,
    pub pings: AtomicUsize,
    /// Handles currently alive.
    pub live: AtomicUsize,
    /// The highest value `live` ever reached.
    pub max_live: AtomicUsize,
}

/// A transport that plays back a script, one entry per `open` call. Once the
/// script is exhausted every further `open` is refused.
#[derive(Debug, Clone, Default)]
pub struct ScriptedTransport {
    script: Arc<Mutex<VecDeque<Open>>>,
    pub counters: Arc<Counters>,
}

impl ScriptedTransport {
    pub fn new(script: Vec<Open>) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into())),
            counters: Arc::new(Counters::default()),
        }
    }

    pub fn opens(&self) -> usize {
        self.counters.opens.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn open(
        &self,
        _credentials: &Credentials,
    ) -> Result<Box<dyn StreamHandle>, TransportError> {
        self.counters.opens.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front().unwrap_or(Open::Refuse);
        match next {
            Open::Refuse => Err(TransportError::Status(tonic::Status::unavailable(
                "connection refused",
            ))),
            Open::Stream {
                handshake,
                write_fails,
                items,
                after,
            } => {
                let live = self.counters.live.fetch_add(1, Ordering::SeqCst) + 1;
                self.counters.max_live.fetch_max(live, Ordering::SeqCst);
                Ok(Box::new(ScriptedStream {
                    handshake,
                    write_fails,
                    items: items.into(),
                    after,
                    counters: self.counters.clone(),
                }))
            }
        }
    }
}

struct ScriptedStream {
    handshake: Handshake,
    write_fails: bool,
    items: VecDeque<Item>,
    after: After,
    counters: Arc<Counters>,
}

impl Drop for ScriptedStream {
    fn drop(&mut self) {
        self.counters.live.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl StreamHandle for ScriptedStream {
    async fn version(&mut self) -> Result<String, TransportError> {
        match self.handshake {
            Handshake::Answer => Ok("scripted 1.0.0".to_string()),
            Handshake::Fail => Err(TransportError::Status(tonic::Status::unimplemented(
                "GetVersion",
            ))),
            Handshake::Hang => std::future::pending().await,
        }
    }

    async fn write(&mut self, _filter: &SubscriptionFilter) -> Result<(), TransportError> {
        self.counters.writes.fetch_add(1, Ordering::SeqCst);
        if self.write_fails {
            return Err(TransportError::RequestChannelClosed);
        }
        Ok(())
    }

    async fn ping(&mut self, _id: i32) -> Result<(), TransportError> {
        self.counters.pings.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn next_event(&mut self) -> Option<Result<StreamEvent, TransportError>> {
        match self.items.pop_front() {
            Some(Item::Event(event)) => Some(Ok(event)),
            Some(Item::Fail(reason)) => {
                Some(Err(TransportError::Status(tonic::Status::internal(reason))))
            }
            None => match self.after {
                After::Close => None,
                After::Hang => std::future::pending().await,
            },
        }
    }
}

/// A config with a deterministic, short backoff.
pub fn config(max_retries: u32) -> Arc<ConnectorConfig> {
    Arc::new(ConnectorConfig {
        reconnect: ReconnectConfig {
            max_retries,
            initial_delay_ms: 100,
            max_delay_ms: 1_000,
            multiplier: 2.0,
            jitter: 0.0,
            ..Default::default()
        },
        ..Default::default()
    })
}

pub fn transaction(slot: u64, fill: u8) -> StreamEvent {
    StreamEvent::Transaction {
        slot,
        signature: vec![fill; 64],
    }
}

pub fn account(slot: u64, fill: u8) -> StreamEvent {
    StreamEvent::Account {
        slot,
        pubkey: vec![fill; 32],
        txn_signature: Some(vec![fill; 64]),
    }
}

/// Receives records until `stop` returns true for one of them, with a timeout.
pub async fn collect_until(
    rx: &mut mpsc::Receiver<Telemetry>,
    stop: impl Fn(&Telemetry) -> bool,
) -> Vec<Telemetry> {
    let mut records = Vec::new();
    loop {
        let record = tokio::time::timeout(Duration::from_secs(60), rx.recv())
            .await
            .expect("timed out waiting for telemetry")
            .expect("telemetry channel closed");
        let done = stop(&record);
        records.push(record);
        if done {
            return records;
        }
    }
}

/// Drains whatever is left once the controller has returned.
pub fn drain(rx: &mut mpsc::Receiver<Telemetry>) -> Vec<Telemetry> {
    let mut records = Vec::new();
    while let Ok(record) = rx.try_recv() {
        records.push(record);
    }
    records
}

pub fn is_subscribed(record: &Telemetry) -> bool {
    matches!(record, Telemetry::Lifecycle(Lifecycle::Subscribed))
}

pub fn connecting_count(records: &[Telemetry]) -> usize {
    records
        .iter()
        .filter(|r| matches!(r, Telemetry::Lifecycle(Lifecycle::Connecting { .. })))
        .count()
}
