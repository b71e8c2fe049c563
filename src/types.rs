//! Shared data model for one discovery run
//!
//! All entities here are per-run values: built once, read-only afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

/// Criteria for one correlated request/reply exchange. Immutable per invocation.
#[derive(Debug, Clone)]
pub struct PollRequest {
    /// Chat the command is sent to and replies are expected in
    pub target_chat: String,
    /// Bot handle the reply must come from (without `@`); when absent,
    /// any bot-flagged sender qualifies
    pub expected_sender: Option<String>,
    /// Only messages at or after this instant qualify
    pub since: DateTime<Utc>,
    /// Reply-thread id to match, when the channel exposes threading
    pub reply_thread_id: Option<i64>,
    /// Substrings that mark a reply as a response to our command
    pub text_hints: Vec<String>,
    /// Overall wait bound
    pub timeout: Duration,
    /// Sleep between store scans on the poll path
    pub poll_interval: Duration,
    /// Cap on messages examined per scan
    pub max_messages_per_scan: usize,
}

/// A message as seen in the buffered store. Owned by the store, read-only here.
#[derive(Debug, Clone)]
pub struct RawMessage {
    pub id: i64,
    pub chat_id: String,
    pub sender_handle: Option<String>,
    pub is_bot: bool,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub inline_urls: Vec<String>,
    pub reply_thread_id: Option<i64>,
}

/// Correlated reply: concatenated text plus any inline URLs
#[derive(Debug, Clone, Default)]
pub struct BotReply {
    pub text: String,
    pub urls: Vec<String>,
}

impl BotReply {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.urls.is_empty()
    }
}

/// Structured view of one combined trend-bot reply
#[derive(Debug, Clone, Serialize)]
pub struct ParsedTrend {
    pub raw_text: String,
    pub evm_addresses: BTreeSet<String>,
    pub solana_addresses: BTreeSet<String>,
    pub tweet_urls: BTreeSet<String>,
    pub profile_urls: BTreeSet<String>,
    /// Lower-cased, deduped `@` handles
    pub profile_handles: BTreeSet<String>,
    /// Every http(s) token, in order of appearance, not deduped
    pub generic_urls: Vec<String>,
    pub parsed_at: DateTime<Utc>,
}

/// Addresses found on one fetched page. Never a union of other pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanDetail {
    pub source_url: String,
    pub evm_addresses: BTreeSet<String>,
    pub solana_addresses: BTreeSet<String>,
}

impl ScanDetail {
    pub fn is_empty(&self) -> bool {
        self.evm_addresses.is_empty() && self.solana_addresses.is_empty()
    }
}

/// Union of everything a scan batch found, plus per-page attribution records
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanResult {
    pub evm_addresses: BTreeSet<String>,
    pub solana_addresses: BTreeSet<String>,
    pub details: Vec<ScanDetail>,
}

/// Final merged discovery with source attribution
#[derive(Debug, Clone, Serialize)]
pub struct AggregatedDiscovery {
    /// Deduped, lower-cased
    pub evm_addresses: BTreeSet<String>,
    /// Deduped, case-preserved
    pub solana_addresses: BTreeSet<String>,
    pub details: Vec<ScanDetail>,
    /// Lower-cased EVM address -> canonical origin URLs it was seen on
    pub evm_sources: BTreeMap<String, BTreeSet<String>>,
    /// Solana address -> canonical origin URLs it was seen on
    pub sol_sources: BTreeMap<String, BTreeSet<String>>,
}
