//! Discovery run orchestration
//!
//! One run walks a fixed state machine: ask the trend bot for trending
//! tweets, then profiles, parse the combined reply, scan tweet links, scan
//! everything else, aggregate, deliver. Failures up to aggregation yield
//! "no discovery"; delivery failures are swallowed.


use crate::config::TelegramConfig;
use crate::correlator::ResponseCorrelator;
use crate::error::Result;
use crate::notify::Notify;
use crate::parser;
use crate::report::AggregationSummary;
use crate::scraper::MirrorScraper;
use crate::types::{AggregatedDiscovery, ScanResult};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// States of one discovery run, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    AwaitingTweetsReply,
    AwaitingProfilesReply,
    Parsing,
    ScanningTweets,
    ScanningOtherLinks,
    Aggregating,
    Delivering,
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RunState::Idle => "idle",
            RunState::AwaitingTweetsReply => "awaiting_tweets_reply",
            RunState::AwaitingProfilesReply => "awaiting_profiles_reply",
            RunState::Parsing => "parsing",
            RunState::ScanningTweets => "scanning_tweets",
            RunState::ScanningOtherLinks => "scanning_other_links",
            RunState::Aggregating => "aggregating",
            RunState::Delivering => "delivering",
        };
        f.write_str(name)
    }
}

/// Drives one discovery run end to end
pub struct DiscoveryEngine {
    correlator: ResponseCorrelator,
    scraper: MirrorScraper,
    summary: AggregationSummary,
    notifier: Arc<dyn Notify>,
    tweets_command: String,
    profiles_command: String,
    reply_wait: Duration,
}

impl DiscoveryEngine {
    pub fn new(
        correlator: ResponseCorrelator,
        scraper: MirrorScraper,
        summary: AggregationSummary,
        notifier: Arc<dyn Notify>,
        telegram: &TelegramConfig,
    ) -> Self {
        Self {
            correlator,
            scraper,
            summary,
            notifier,
            tweets_command: telegram.tweets_command.clone(),
            profiles_command: telegram.profiles_command.clone(),
            reply_wait: Duration::from_secs(telegram.reply_wait_secs),
        }
    }

    /// Execute one discovery run against `chat_id`. `Ok(None)` means the
    /// trend bot gave us nothing to work with.
    pub async fn run(&self, chat_id: &str) -> Result<Option<AggregatedDiscovery>> {
        let mut state = RunState::Idle;

        // The two correlator requests are strictly sequential: the profiles
        // command is not issued until the tweets request completed or timed out.
        self.transition(&mut state, RunState::AwaitingTweetsReply);
        let tweets_reply = self
            .correlator
            .request(&self.tweets_command, chat_id, self.reply_wait)
            .await;

        self.transition(&mut state, RunState::AwaitingProfilesReply);
        let profiles_reply = self
            .correlator
            .request(&self.profiles_command, chat_id, self.reply_wait)
            .await;

        let combined_text = [tweets_reply.text.as_str(), profiles_reply.text.as_str()]
            .iter()
            .filter(|t| !t.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join("\n");
        let inline_urls: Vec<String> = tweets_reply
            .urls
            .iter()
            .chain(profiles_reply.urls.iter())
            .cloned()
            .collect();

        if combined_text.is_empty() {
            tracing::warn!("No response from trend bot");
            return Ok(None);
        }

        self.transition(&mut state, RunState::Parsing);
        let parsed = parser::parse(&combined_text);

        let tweet_inputs = dedupe(
            parsed
                .tweet_urls
                .iter()
                .cloned()
                .chain(inline_urls.iter().filter(|u| is_post_url(u)).cloned()),
        );

        self.transition(&mut state, RunState::ScanningTweets);
        let tweet_scan = self.scan_tweets_with_profile_fallback(&tweet_inputs).await;

        let handle_urls = parsed
            .profile_handles
            .iter()
            .map(|h| h.trim_start_matches('@'))
            .filter(|h| !h.is_empty())
            .map(|h| format!("https://x.com/{h}"));
        let other_inputs = dedupe(
            parsed
                .profile_urls
                .iter()
                .cloned()
                .chain(handle_urls)
                .chain(inline_urls.iter().filter(|u| !is_post_url(u)).cloned())
                .chain(parsed.generic_urls.iter().cloned()),
        );

        self.transition(&mut state, RunState::ScanningOtherLinks);
        let link_scan = self.scraper.scan(&other_inputs).await;

        self.transition(&mut state, RunState::Aggregating);
        let discovery = self.summary.aggregate(&parsed, &[tweet_scan, link_scan]);

        tracing::info!(
            evm = discovery.evm_addresses.len(),
            sol = discovery.solana_addresses.len(),
            tweets = parsed.tweet_urls.len(),
            profiles = parsed.profile_handles.len(),
            "Discovery aggregated"
        );

        self.transition(&mut state, RunState::Delivering);
        self.deliver(&discovery, chat_id).await;

        self.transition(&mut state, RunState::Idle);
        Ok(Some(discovery))
    }

    /// Scan the tweet batch; when it finds no addresses at all, fall back to
    /// the tweets' profile pages once and merge whatever that finds.
    async fn scan_tweets_with_profile_fallback(&self, tweet_urls: &[String]) -> ScanResult {
        if tweet_urls.is_empty() {
            return ScanResult::default();
        }

        let mut primary = self.scraper.scan(tweet_urls).await;
        if !primary.evm_addresses.is_empty() || !primary.solana_addresses.is_empty() {
            return primary;
        }

        let profiles = dedupe(tweet_urls.iter().filter_map(|u| profile_of(u)));
        if profiles.is_empty() {
            return primary;
        }
        tracing::info!(count = profiles.len(), "Tweet scan empty, trying author profiles");

        let fallback = self.scraper.scan(&profiles).await;
        primary
            .evm_addresses
            .extend(fallback.evm_addresses.into_iter());
        primary
            .solana_addresses
            .extend(fallback.solana_addresses.into_iter());
        primary.details.extend(fallback.details.into_iter());
        primary
    }

    /// Render, chunk, and deliver. Delivery failures do not fail the run.
    async fn deliver(&self, discovery: &AggregatedDiscovery, chat_id: &str) {
        let text = self.summary.render(discovery);
        for chunk in self.summary.chunk(&text) {
            if let Err(e) = self.notifier.send_text(chat_id, &chunk).await {
                tracing::warn!("Summary delivery failed: {e}");
            }
        }
    }

    fn transition(&self, state: &mut RunState, next: RunState) {
        tracing::debug!(from = %state, to = %next, "Run state transition");
        *state = next;
    }
}

fn is_post_url(url: &str) -> bool {
    url.to_lowercase().contains("/status/")
}

/// Profile URL of a platform post link, e.g.
/// `https://x.com/alpha/status/1` -> `https://x.com/alpha`
fn profile_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_lowercase();
    if !host.ends_with("x.com") && !host.ends_with("twitter.com") {
        return None;
    }
    let handle = parsed.path_segments()?.find(|s| !s.is_empty())?;
    Some(format!("{}://{}/{}", parsed.scheme(), host, handle))
}

/// Dedupe preserving first-seen order
fn dedupe<I: IntoIterator<Item = String>>(urls: I) -> Vec<String> {
    let mut seen = BTreeSet::new();
    urls.into_iter()
        .filter(|u| !u.is_empty() && seen.insert(u.clone()))
        .collect()
}
