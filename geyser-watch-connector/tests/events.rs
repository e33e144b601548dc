use geyser_watch_connector::{
    error::DecodeAnomaly,
    events::{decode, encode_pubkey, encode_signature, DecodedEvent, StreamEvent},
    proto::{
        subscribe_update::UpdateOneof, SubscribeUpdate, SubscribeUpdateAccount,
        SubscribeUpdateAccountInfo, SubscribeUpdatePing, SubscribeUpdateSlot,
        SubscribeUpdateTransaction, SubscribeUpdateTransactionInfo,
    },
};
use prost::Message;
use solana_sdk::{pubkey::Pubkey, signature::Signature};

#[test]
fn all_zero_identifiers_encode_to_ones() {
    assert_eq!(encode_pubkey(&[0; 32]).unwrap(), "1".repeat(32));
    assert_eq!(encode_signature(&[0; 64]).unwrap(), "1".repeat(64));
}

#[test]
fn encoding_matches_solana_display_and_is_deterministic() {
    let pubkey = Pubkey::new_unique();
    let first = encode_pubkey(pubkey.as_ref()).unwrap();
    assert_eq!(first, pubkey.to_string());
    assert_eq!(encode_pubkey(pubkey.as_ref()).unwrap(), first);

    let bytes: Vec<u8> = (0..64).collect();
    let signature = Signature::from(<[u8; 64]>::try_from(bytes.as_slice()).unwrap());
    assert_eq!(encode_signature(&bytes).unwrap(), signature.to_string());
    assert_eq!(
        encode_signature(&bytes).unwrap(),
        encode_signature(&bytes).unwrap()
    );
}

#[test]
fn unexpected_lengths_are_reported_not_panicked() {
    assert_eq!(
        encode_pubkey(&[1; 31]),
        Err(DecodeAnomaly::UnexpectedLength {
            field: "pubkey",
            expected: 32,
            actual: 31,
        })
    );
    assert_eq!(
        encode_signature(&[]),
        Err(DecodeAnomaly::UnexpectedLength {
            field: "signature",
            expected: 64,
            actual: 0,
        })
    );
}

#[test]
fn account_without_signature_decodes_with_none() {
    let event = StreamEvent::Account {
        slot: 10,
        pubkey: vec![0; 32],
        txn_signature: None,
    };
    assert_eq!(
        decode(&event),
        Some(Ok(DecodedEvent::Account {
            slot: 10,
            pubkey: "1".repeat(32),
            txn_signature: None,
        }))
    );
}

#[test]
fn account_with_short_signature_is_an_anomaly() {
    let event = StreamEvent::Account {
        slot: 10,
        pubkey: vec![0; 32],
        txn_signature: Some(vec![0; 63]),
    };
    assert!(matches!(
        decode(&event),
        Some(Err(DecodeAnomaly::UnexpectedLength {
            field: "signature",
            ..
        }))
    ));
}

#[test]
fn unrecognized_events_pass_through() {
    assert_eq!(decode(&StreamEvent::Ping), None);
    assert_eq!(decode(&StreamEvent::Other { kind: "slot" }), None);
}

#[test]
fn wire_updates_resolve_to_stream_events() {
    let transaction = SubscribeUpdate {
        filters: vec!["program".to_string()],
        update_oneof: Some(UpdateOneof::Transaction(SubscribeUpdateTransaction {
            transaction: Some(SubscribeUpdateTransactionInfo {
                signature: vec![7; 64],
                index: 3,
                ..Default::default()
            }),
            slot: 99,
        })),
        ..Default::default()
    };
    assert_eq!(
        StreamEvent::from(transaction),
        StreamEvent::Transaction {
            slot: 99,
            signature: vec![7; 64],
        }
    );

    let account = SubscribeUpdate {
        filters: vec![],
        update_oneof: Some(UpdateOneof::Account(SubscribeUpdateAccount {
            account: Some(SubscribeUpdateAccountInfo {
                pubkey: vec![1; 32],
                txn_signature: Some(vec![2; 64]),
                ..Default::default()
            }),
            slot: 5,
            is_startup: false,
        })),
        ..Default::default()
    };
    assert_eq!(
        StreamEvent::from(account),
        StreamEvent::Account {
            slot: 5,
            pubkey: vec![1; 32],
            txn_signature: Some(vec![2; 64]),
        }
    );

    let ping = SubscribeUpdate {
        update_oneof: Some(UpdateOneof::Ping(SubscribeUpdatePing {})),
        ..Default::default()
    };
    assert_eq!(StreamEvent::from(ping), StreamEvent::Ping);

    let slot = SubscribeUpdate {
        update_oneof: Some(UpdateOneof::Slot(SubscribeUpdateSlot {
            slot: 1,
            ..Default::default()
        })),
        ..Default::default()
    };
    assert_eq!(StreamEvent::from(slot), StreamEvent::Other { kind: "slot" });
}

#[test]
fn undeclared_update_kinds_decode_as_unknown() {
    // An update kind tag this client does not know about.
    let mut bytes = Vec::new();
    prost::encoding::message::encode(42, &SubscribeUpdatePing {}, &mut bytes);

    let update = SubscribeUpdate::decode(bytes.as_slice()).unwrap();
    assert_eq!(StreamEvent::from(update), StreamEvent::Other { kind: "unknown" });
}
