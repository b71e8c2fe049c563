//! Command/reply correlation
//!
//! Sends a command toward the trend bot and waits for a qualifying reply.
//! Three delivery paths, in priority order: a live reply-capable channel,
//! a polling fallback over the buffered message store, and a final relaxed
//! pass over recent bot messages. Channel and store errors are degraded to
//! "no data"; `request` never fails.

#[cfg(test)]
mod tests;

use crate::error::Result;
use crate::notify::Notify;
use crate::store::MessageStore;
use crate::types::{BotReply, PollRequest, RawMessage};
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

/// Extra slack added to the poll-path recency cutoff
const POLL_CUTOFF_SLACK: Duration = Duration::from_secs(15);

/// Recency window for the final relaxed pass, independent of the timeout
const RELAXED_WINDOW: Duration = Duration::from_secs(3 * 60);

/// A channel that can both send a command and correlate the reply itself
#[async_trait]
pub trait ReplyChannel: Send + Sync {
    fn is_ready(&self) -> bool;

    /// Send the command; returns the sent message id when the channel knows it
    async fn send_command(&self, chat_id: &str, text: &str) -> Result<Option<i64>>;

    /// Wait for a reply qualifying under `request`, up to `request.timeout`
    async fn wait_for_reply(&self, request: &PollRequest) -> Result<BotReply>;
}

/// Correlates one command with the trend bot's asynchronous reply
pub struct ResponseCorrelator {
    store: Arc<dyn MessageStore>,
    reply_channel: Option<Arc<dyn ReplyChannel>>,
    notifier: Arc<dyn Notify>,
    /// Expected reply sender, without `@`; `None` accepts any bot sender
    expected_sender: Option<String>,
    text_hints: Vec<String>,
    poll_interval: Duration,
    max_messages_per_scan: usize,
}

impl ResponseCorrelator {
    pub fn new(store: Arc<dyn MessageStore>, notifier: Arc<dyn Notify>) -> Self {
        Self {
            store,
            reply_channel: None,
            notifier,
            expected_sender: None,
            text_hints: Vec::new(),
            poll_interval: Duration::from_secs(3),
            max_messages_per_scan: 120,
        }
    }

    pub fn with_reply_channel(mut self, channel: Arc<dyn ReplyChannel>) -> Self {
        self.reply_channel = Some(channel);
        self
    }

    pub fn expected_sender(mut self, handle: &str) -> Self {
        self.expected_sender = Some(handle.trim_start_matches('@').to_string());
        self
    }

    pub fn text_hints(mut self, hints: Vec<String>) -> Self {
        self.text_hints = hints;
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Send `command` into `chat_id` and wait for a qualifying reply.
    /// Returns an empty reply when nothing qualifies before `timeout`;
    /// callers treat empty as "not found", never as an error.
    pub async fn request(&self, command: &str, chat_id: &str, timeout: Duration) -> BotReply {
        if let Some(reply) = self.try_push_path(command, chat_id, timeout).await {
            if !reply.is_empty() {
                return reply;
            }
        }

        if let Some(reply) = self.poll_store(chat_id, timeout).await {
            return reply;
        }

        self.relaxed_scan(chat_id).unwrap_or_default()
    }

    /// Push path: live channel sends the command and correlates the reply
    /// itself. Returns None when no ready channel exists (the command is then
    /// sent fire-and-forget so the poll path has something to correlate).
    async fn try_push_path(
        &self,
        command: &str,
        chat_id: &str,
        timeout: Duration,
    ) -> Option<BotReply> {
        let channel = match &self.reply_channel {
            Some(channel) if channel.is_ready() => channel.clone(),
            _ => {
                if let Err(e) = self.notifier.send_text(chat_id, command).await {
                    tracing::warn!("Fire-and-forget command send failed: {e}");
                }
                return None;
            }
        };

        let since = Utc::now() - ChronoDuration::seconds(1);
        let sent_id = match channel.send_command(chat_id, command).await {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!("Command send over reply channel failed: {e}");
                return None;
            }
        };

        let request = PollRequest {
            target_chat: chat_id.to_string(),
            expected_sender: self.expected_sender.clone(),
            since,
            reply_thread_id: sent_id,
            text_hints: self.text_hints.clone(),
            timeout,
            poll_interval: self.poll_interval,
            max_messages_per_scan: self.max_messages_per_scan,
        };

        match channel.wait_for_reply(&request).await {
            Ok(reply) => Some(reply),
            Err(e) => {
                tracing::warn!("Reply channel wait failed: {e}");
                None
            }
        }
    }

    /// Poll fallback: scan the buffered store every `poll_interval` until
    /// `timeout` elapses.
    async fn poll_store(&self, chat_id: &str, timeout: Duration) -> Option<BotReply> {
        let started = std::time::Instant::now();

        while started.elapsed() < timeout {
            tokio::time::sleep(self.poll_interval).await;

            let cutoff = Utc::now()
                - ChronoDuration::from_std(timeout + POLL_CUTOFF_SLACK)
                    .unwrap_or_else(|_| ChronoDuration::zero());
            let messages = self.store.recent_messages();
            let hits: Vec<&RawMessage> = messages
                .iter()
                .rev()
                .take(self.max_messages_per_scan)
                .filter(|m| m.timestamp >= cutoff && m.chat_id == chat_id)
                .filter(|m| self.sender_qualifies(m))
                .collect();

            if !hits.is_empty() {
                return Some(combine(hits));
            }
        }

        None
    }

    /// Final relaxed pass: any bot-flagged message in the chat within a fixed
    /// short recency window, regardless of sender handle.
    fn relaxed_scan(&self, chat_id: &str) -> Option<BotReply> {
        let cutoff = Utc::now()
            - ChronoDuration::from_std(RELAXED_WINDOW).unwrap_or_else(|_| ChronoDuration::zero());
        let messages = self.store.recent_messages();
        let hits: Vec<&RawMessage> = messages
            .iter()
            .filter(|m| m.is_bot && m.chat_id == chat_id && m.timestamp >= cutoff)
            .collect();

        if hits.is_empty() {
            None
        } else {
            Some(combine(hits))
        }
    }

    fn sender_qualifies(&self, message: &RawMessage) -> bool {
        match &self.expected_sender {
            Some(expected) => message
                .sender_handle
                .as_deref()
                .map(|h| h.trim_start_matches('@') == expected)
                .unwrap_or(false),
            None => message.is_bot,
        }
    }
}

/// Concatenate texts in ascending timestamp order and union inline URLs
fn combine(mut hits: Vec<&RawMessage>) -> BotReply {
    hits.sort_by_key(|m| m.timestamp);

    let text = hits
        .iter()
        .map(|m| m.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    let mut seen = BTreeSet::new();
    let urls = hits
        .iter()
        .flat_map(|m| m.inline_urls.iter())
        .filter(|u| seen.insert(u.as_str()))
        .cloned()
        .collect();

    BotReply { text, urls }
}
