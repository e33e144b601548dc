//! # Stream events and their decoding
//!
//! Raw updates are resolved into a [`StreamEvent`] once, at the transport boundary.
//! The decoder then turns the binary identifiers of transaction and account events
//! into base-58 text; every other kind passes through undecoded.

use crate::{
    error::DecodeAnomaly,
    proto::{subscribe_update::UpdateOneof, SubscribeUpdate},
};
use solana_sdk::{pubkey::Pubkey, signature::Signature};

const PUBKEY_BYTES: usize = 32;
const SIGNATURE_BYTES: usize = 64;

/// An update pushed by the feed, with identifiers still in binary form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Transaction {
        slot: u64,
        signature: Vec<u8>,
    },
    Account {
        slot: u64,
        pubkey: Vec<u8>,
        /// Absent for accounts sent as part of the startup snapshot.
        txn_signature: Option<Vec<u8>>,
    },
    /// A server heartbeat. Answered when keep-alive is enabled.
    Ping,
    /// Any other update kind. Acknowledged but not decoded.
    Other { kind: &'static str },
}

/// The human-readable form of a transaction or account event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedEvent {
    Transaction {
        slot: u64,
        signature: String,
    },
    Account {
        slot: u64,
        pubkey: String,
        txn_signature: Option<String>,
    },
}

impl From<SubscribeUpdate> for StreamEvent {
    fn from(update: SubscribeUpdate) -> Self {
        match update.update_oneof {
            Some(UpdateOneof::Transaction(tx)) => match tx.transaction {
                Some(info) => StreamEvent::Transaction {
                    slot: tx.slot,
                    signature: info.signature,
                },
                None => StreamEvent::Other {
                    kind: "transaction-without-info",
                },
            },
            Some(UpdateOneof::Account(update)) => match update.account {
                Some(info) => StreamEvent::Account {
                    slot: update.slot,
                    pubkey: info.pubkey,
                    txn_signature: info.txn_signature,
                },
                None => StreamEvent::Other {
                    kind: "account-without-info",
                },
            },
            Some(UpdateOneof::Ping(_)) => StreamEvent::Ping,
            Some(UpdateOneof::Pong(_)) => StreamEvent::Other { kind: "pong" },
            Some(UpdateOneof::Slot(_)) => StreamEvent::Other { kind: "slot" },
            Some(UpdateOneof::TransactionStatus(_)) => StreamEvent::Other {
                kind: "transaction-status",
            },
            Some(UpdateOneof::Block(_)) => StreamEvent::Other { kind: "block" },
            Some(UpdateOneof::BlockMeta(_)) => StreamEvent::Other { kind: "block-meta" },
            Some(UpdateOneof::Entry(_)) => StreamEvent::Other { kind: "entry" },
            None => StreamEvent::Other { kind: "unknown" },
        }
    }
}

/// Encodes a 32-byte public key as base-58.
pub fn encode_pubkey(bytes: &[u8]) -> Result<String, DecodeAnomaly> {
    let array = fixed::<PUBKEY_BYTES>(bytes, "pubkey")?;
    Ok(Pubkey::new_from_array(array).to_string())
}

/// Encodes a 64-byte transaction signature as base-58.
pub fn encode_signature(bytes: &[u8]) -> Result<String, DecodeAnomaly> {
    let array = fixed::<SIGNATURE_BYTES>(bytes, "signature")?;
    Ok(Signature::from(array).to_string())
}

fn fixed<const N: usize>(bytes: &[u8], field: &'static str) -> Result<[u8; N], DecodeAnomaly> {
    bytes.try_into().map_err(|_| DecodeAnomaly::UnexpectedLength {
        field,
        expected: N,
        actual: bytes.len(),
    })
}

/// Decodes the identifiers of an event.
///
/// Returns `None` for kinds that are not decoded (pings and everything in
/// [`StreamEvent::Other`]).
pub fn decode(event: &StreamEvent) -> Option<Result<DecodedEvent, DecodeAnomaly>> {
    match event {
        StreamEvent::Transaction { slot, signature } => Some(
            encode_signature(signature).map(|signature| DecodedEvent::Transaction {
                slot: *slot,
                signature,
            }),
        ),
        StreamEvent::Account {
            slot,
            pubkey,
            txn_signature,
        } => Some(decode_account(*slot, pubkey, txn_signature.as_deref())),
        StreamEvent::Ping | StreamEvent::Other { .. } => None,
    }
}

fn decode_account(
    slot: u64,
    pubkey: &[u8],
    txn_signature: Option<&[u8]>,
) -> Result<DecodedEvent, DecodeAnomaly> {
    let pubkey = encode_pubkey(pubkey)?;
    let txn_signature = txn_signature.map(encode_signature).transpose()?;
    Ok(DecodedEvent::Account {
        slot,
        pubkey,
        txn_signature,
    })
}
