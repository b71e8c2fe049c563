//! Trend-reply parsing
//!
//! Turns one combined trend-bot reply into a [`ParsedTrend`]: address sets
//! plus tweet URLs, profile URLs, handles, and the raw ordered URL list.
//! The five extractions run independently over the same sanitized text;
//! none consumes another's matches.

use crate::extract::{extract_addresses, sanitize_html_to_text};
use crate::types::ParsedTrend;
use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

static TWEET_URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)https?://(?:x\.com|twitter\.com)/[A-Za-z0-9_]+/status/\d+")
        .expect("valid regex")
});

// Handle-path match on the platform hosts; tweet URLs are excluded
// positionally afterwards since the regex crate has no lookahead.
static PLATFORM_URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)https?://(?:x\.com|twitter\.com)/[A-Za-z0-9_]+").expect("valid regex")
});

static HANDLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@[A-Za-z0-9_]{1,15}").expect("valid regex"));

static URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://[^\s]+").expect("valid regex"));

/// Parse one combined reply blob. Calling twice on identical input yields
/// identical results.
pub fn parse(text: &str) -> ParsedTrend {
    let cleaned = sanitize_html_to_text(text);
    let addresses = extract_addresses(text);

    let tweet_urls: BTreeSet<String> = TWEET_URL_RE
        .find_iter(&cleaned)
        .map(|m| m.as_str().to_string())
        .collect();

    // A platform-URL match immediately followed by "/status/" in the text is
    // the handle prefix of a tweet permalink, not a profile page.
    let profile_urls: BTreeSet<String> = PLATFORM_URL_RE
        .find_iter(&cleaned)
        .filter(|m| !cleaned[m.end()..].starts_with("/status/"))
        .map(|m| m.as_str().to_string())
        .filter(|u| !tweet_urls.contains(u))
        .collect();

    let profile_handles: BTreeSet<String> = HANDLE_RE
        .find_iter(&cleaned)
        .map(|m| m.as_str().to_lowercase())
        .collect();

    let generic_urls: Vec<String> = URL_RE
        .find_iter(&cleaned)
        .map(|m| m.as_str().to_string())
        .collect();

    ParsedTrend {
        raw_text: text.to_string(),
        evm_addresses: addresses.evm,
        solana_addresses: addresses.sol,
        tweet_urls,
        profile_urls,
        profile_handles,
        generic_urls,
        parsed_at: Utc::now(),
    }
}
