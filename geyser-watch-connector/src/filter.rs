//! # Subscription Filters
//!
//! A [`SubscriptionFilter`] declares which on-chain entities the server pushes to
//! the client. It is built once, shared read-only across reconnects, and turned
//! into a wire [`SubscribeRequest`] every time a stream is opened.
//!
//! Each entity kind has its own group of labelled predicates. Groups are ordered
//! maps, so a label appears at most once per group; an empty group means no
//! subscription of that kind.

use crate::proto::{
    self, subscribe_request_filter_accounts_filter::Filter as AccountsFilterOneof,
    subscribe_request_filter_accounts_filter_lamports::Cmp as LamportsCmp,
    subscribe_request_filter_accounts_filter_memcmp::Data as MemcmpData, SubscribeRequest,
};
use solana_sdk::{commitment_config::CommitmentLevel, pubkey::Pubkey, signature::Signature};
use std::collections::BTreeMap;

/// Predicate for account updates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountFilter {
    pub accounts: Vec<Pubkey>,
    pub owners: Vec<Pubkey>,
    pub filters: Vec<AccountDataFilter>,
    pub nonempty_txn_signature: Option<bool>,
}

/// Constraints on account data, evaluated by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountDataFilter {
    DataSize(u64),
    Memcmp { offset: u64, bytes: Vec<u8> },
    TokenAccountState,
    Lamports(LamportsFilter),
}

/// Comparison of an account's balance against a fixed amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LamportsFilter {
    Eq(u64),
    Ne(u64),
    Lt(u64),
    Gt(u64),
}

/// Predicate for transactions (also used for the transaction-status group).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionFilter {
    pub vote: Option<bool>,
    pub failed: Option<bool>,
    /// Restricts the group to a single transaction.
    pub signature: Option<Signature>,
    pub account_include: Vec<Pubkey>,
    pub account_exclude: Vec<Pubkey>,
    pub account_required: Vec<Pubkey>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotFilter {
    pub filter_by_commitment: Option<bool>,
    /// Also report intermediate slot states, not just the commitment transitions.
    pub interslot_updates: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockFilter {
    pub account_include: Vec<Pubkey>,
    pub include_transactions: Option<bool>,
    pub include_accounts: Option<bool>,
    pub include_entries: Option<bool>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockMetaFilter;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntryFilter;

/// A byte range of account data the server should send instead of the full data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataSlice {
    pub offset: u64,
    pub length: u64,
}

/// The immutable description of one subscription.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubscriptionFilter {
    pub accounts: BTreeMap<String, AccountFilter>,
    pub slots: BTreeMap<String, SlotFilter>,
    pub transactions: BTreeMap<String, TransactionFilter>,
    pub transactions_status: BTreeMap<String, TransactionFilter>,
    pub blocks: BTreeMap<String, BlockFilter>,
    pub blocks_meta: BTreeMap<String, BlockMetaFilter>,
    pub entry: BTreeMap<String, EntryFilter>,
    pub accounts_data_slice: Vec<DataSlice>,
    pub commitment: Option<CommitmentLevel>,
    /// Reply to server pings on the open stream.
    pub keep_alive: bool,
}

impl SubscriptionFilter {
    pub fn builder() -> SubscriptionFilterBuilder {
        SubscriptionFilterBuilder::default()
    }

    /// The standard filter for watching a single program: every transaction that
    /// mentions it and every account it owns.
    pub fn watch_program(program: Pubkey, commitment: CommitmentLevel) -> Self {
        Self::builder()
            .commitment(commitment)
            .transactions(
                "program",
                TransactionFilter {
                    account_include: vec![program],
                    ..Default::default()
                },
            )
            .accounts(
                "program",
                AccountFilter {
                    owners: vec![program],
                    ..Default::default()
                },
            )
            .build()
    }

    /// Returns `true` when no group is populated, i.e. the server would push nothing.
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
            && self.slots.is_empty()
            && self.transactions.is_empty()
            && self.transactions_status.is_empty()
            && self.blocks.is_empty()
            && self.blocks_meta.is_empty()
            && self.entry.is_empty()
    }

    /// Converts the filter into the request written onto a fresh stream.
    pub fn to_request(&self) -> SubscribeRequest {
        SubscribeRequest {
            accounts: convert_group(&self.accounts, account_to_proto),
            slots: convert_group(&self.slots, |f| proto::SubscribeRequestFilterSlots {
                filter_by_commitment: f.filter_by_commitment,
                interslot_updates: f.interslot_updates,
            }),
            transactions: convert_group(&self.transactions, transaction_to_proto),
            transactions_status: convert_group(&self.transactions_status, transaction_to_proto),
            blocks: convert_group(&self.blocks, |f| proto::SubscribeRequestFilterBlocks {
                account_include: to_strings(&f.account_include),
                include_transactions: f.include_transactions,
                include_accounts: f.include_accounts,
                include_entries: f.include_entries,
            }),
            blocks_meta: convert_group(&self.blocks_meta, |_| {
                proto::SubscribeRequestFilterBlocksMeta {}
            }),
            entry: convert_group(&self.entry, |_| proto::SubscribeRequestFilterEntry {}),
            commitment: self.commitment.map(|c| commitment_to_proto(c) as i32),
            accounts_data_slice: self
                .accounts_data_slice
                .iter()
                .map(|s| proto::SubscribeRequestAccountsDataSlice {
                    offset: s.offset,
                    length: s.length,
                })
                .collect(),
            ..Default::default()
        }
    }

    /// A request that carries nothing but a ping. Writing it on an open stream
    /// keeps the current filters in place.
    pub fn ping_request(id: i32) -> SubscribeRequest {
        SubscribeRequest {
            ping: Some(proto::SubscribeRequestPing { id }),
            ..Default::default()
        }
    }
}

/// Incremental construction of a [`SubscriptionFilter`].
///
/// Inserting a label that already exists in a group replaces the earlier predicate.
#[derive(Debug, Default)]
pub struct SubscriptionFilterBuilder {
    filter: SubscriptionFilter,
}

impl SubscriptionFilterBuilder {
    pub fn commitment(mut self, commitment: CommitmentLevel) -> Self {
        self.filter.commitment = Some(commitment);
        self
    }

    pub fn keep_alive(mut self, enabled: bool) -> Self {
        self.filter.keep_alive = enabled;
        self
    }

    pub fn accounts(mut self, label: impl Into<String>, filter: AccountFilter) -> Self {
        self.filter.accounts.insert(label.into(), filter);
        self
    }

    pub fn slots(mut self, label: impl Into<String>, filter: SlotFilter) -> Self {
        self.filter.slots.insert(label.into(), filter);
        self
    }

    pub fn transactions(mut self, label: impl Into<String>, filter: TransactionFilter) -> Self {
        self.filter.transactions.insert(label.into(), filter);
        self
    }

    pub fn transactions_status(
        mut self,
        label: impl Into<String>,
        filter: TransactionFilter,
    ) -> Self {
        self.filter.transactions_status.insert(label.into(), filter);
        self
    }

    pub fn blocks(mut self, label: impl Into<String>, filter: BlockFilter) -> Self {
        self.filter.blocks.insert(label.into(), filter);
        self
    }

    pub fn blocks_meta(mut self, label: impl Into<String>) -> Self {
        self.filter.blocks_meta.insert(label.into(), BlockMetaFilter);
        self
    }

    pub fn entry(mut self, label: impl Into<String>) -> Self {
        self.filter.entry.insert(label.into(), EntryFilter);
        self
    }

    pub fn data_slice(mut self, offset: u64, length: u64) -> Self {
        self.filter
            .accounts_data_slice
            .push(DataSlice { offset, length });
        self
    }

    pub fn build(self) -> SubscriptionFilter {
        self.filter
    }
}

pub fn commitment_to_proto(level: CommitmentLevel) -> proto::CommitmentLevel {
    match level {
        CommitmentLevel::Processed => proto::CommitmentLevel::Processed,
        CommitmentLevel::Confirmed => proto::CommitmentLevel::Confirmed,
        CommitmentLevel::Finalized => proto::CommitmentLevel::Finalized,
    }
}

fn convert_group<F, P>(
    group: &BTreeMap<String, F>,
    convert: impl Fn(&F) -> P,
) -> std::collections::HashMap<String, P> {
    group
        .iter()
        .map(|(label, f)| (label.clone(), convert(f)))
        .collect()
}

fn to_strings(keys: &[Pubkey]) -> Vec<String> {
    keys.iter().map(Pubkey::to_string).collect()
}

fn account_to_proto(f: &AccountFilter) -> proto::SubscribeRequestFilterAccounts {
    proto::SubscribeRequestFilterAccounts {
        account: to_strings(&f.accounts),
        owner: to_strings(&f.owners),
        filters: f
            .filters
            .iter()
            .map(|data_filter| {
                let filter = match data_filter {
                    AccountDataFilter::DataSize(size) => AccountsFilterOneof::Datasize(*size),
                    AccountDataFilter::Memcmp { offset, bytes } => {
                        AccountsFilterOneof::Memcmp(proto::SubscribeRequestFilterAccountsFilterMemcmp {
                            offset: *offset,
                            data: Some(MemcmpData::Bytes(bytes.clone())),
                        })
                    }
                    AccountDataFilter::TokenAccountState => {
                        AccountsFilterOneof::TokenAccountState(true)
                    }
                    AccountDataFilter::Lamports(cmp) => {
                        AccountsFilterOneof::Lamports(proto::SubscribeRequestFilterAccountsFilterLamports {
                            cmp: Some(lamports_to_proto(*cmp)),
                        })
                    }
                };
                proto::SubscribeRequestFilterAccountsFilter {
                    filter: Some(filter),
                }
            })
            .collect(),
        nonempty_txn_signature: f.nonempty_txn_signature,
    }
}

fn transaction_to_proto(f: &TransactionFilter) -> proto::SubscribeRequestFilterTransactions {
    proto::SubscribeRequestFilterTransactions {
        vote: f.vote,
        failed: f.failed,
        signature: f.signature.as_ref().map(Signature::to_string),
        account_include: to_strings(&f.account_include),
        account_exclude: to_strings(&f.account_exclude),
        account_required: to_strings(&f.account_required),
    }
}

fn lamports_to_proto(cmp: LamportsFilter) -> LamportsCmp {
    match cmp {
        LamportsFilter::Eq(lamports) => LamportsCmp::Eq(lamports),
        LamportsFilter::Ne(lamports) => LamportsCmp::Ne(lamports),
        LamportsFilter::Lt(lamports) => LamportsCmp::Lt(lamports),
        LamportsFilter::Gt(lamports) => LamportsCmp::Gt(lamports),
    }
}
