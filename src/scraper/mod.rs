//! Multi-mirror scraping engine
//!
//! Resolves social-platform source URLs against an ordered mirror list,
//! accepts the first usable page per source, and performs one bounded hop of
//! off-platform link following. Everything is best-effort: a failure on one
//! URL, mirror, or hop never aborts the rest of the batch.

pub mod heuristics;


use crate::config::ScraperConfig;
use crate::error::{BotError, Result};
use crate::extract::extract_addresses;
use crate::types::{ScanDetail, ScanResult};
use async_trait::async_trait;
use heuristics::looks_like_mirror_html;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::Arc;
use url::Url;

/// Mirrors tried after the configured primary and fallbacks, in this order
pub const DEFAULT_MIRRORS: &[&str] = &[
    "https://nitter.net",
    "https://nitter.it",
    "https://nitter.fdn.fr",
    "https://nitter.domain.glass",
    "https://nitter.poast.org",
    "https://nitter.moomoo.me",
    "https://twitt.re",
    "https://nitter.privacydev.net",
    "https://xcancel.com",
];

static HREF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"href\s*=\s*["']([^"']+)["']"#).expect("valid regex"));
static STATUS_PATH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/status/\d+").expect("valid regex"));
static HANDLE_SEGMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_]{1,15}$").expect("valid regex"));

/// One fetched page: final HTTP status plus raw body
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub status: u16,
    pub body: String,
}

/// HTTP seam so tests can script responses instead of hitting the network
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn get(&self, url: &str, referer: Option<&str>) -> Result<FetchedPage>;
}

/// reqwest-backed fetcher with per-request timeout and bounded redirects
pub struct HttpFetcher {
    http: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.fetch_timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { http })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn get(&self, url: &str, referer: Option<&str>) -> Result<FetchedPage> {
        let mut req = self
            .http
            .get(url)
            .header("accept", "text/html,application/json;q=0.9,*/*;q=0.8")
            .header("accept-language", "en-US,en;q=0.9");
        if let Some(referer) = referer {
            req = req.header("referer", referer);
        }
        let resp = req.send().await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        Ok(FetchedPage { status, body })
    }
}

/// Why a single candidate fetch did not produce a usable page
#[derive(Debug)]
enum FetchFailure {
    Transport(BotError),
    Status(u16),
    Unusable,
}

impl std::fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchFailure::Transport(e) => write!(f, "transport error: {e}"),
            FetchFailure::Status(s) => write!(f, "unexpected status {s}"),
            FetchFailure::Unusable => write!(f, "unusable mirror response"),
        }
    }
}

/// Mirror-backed page scraper
pub struct MirrorScraper {
    fetcher: Arc<dyn PageFetcher>,
    mirrors: Vec<String>,
    max_profile_posts: usize,
    max_offsite_links: usize,
}

impl MirrorScraper {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        // A malformed mirror would otherwise fail silently on every candidate.
        for mirror in config.primary_mirror.iter().chain(&config.fallback_mirrors) {
            if !mirror.is_empty() && Url::parse(mirror).is_err() {
                return Err(BotError::Config(format!("invalid mirror url: {mirror}")));
            }
        }
        let fetcher = Arc::new(HttpFetcher::new(config)?);
        Ok(Self::with_fetcher(fetcher, config))
    }

    pub fn with_fetcher(fetcher: Arc<dyn PageFetcher>, config: &ScraperConfig) -> Self {
        Self {
            fetcher,
            mirrors: mirror_list(config),
            max_profile_posts: config.max_profile_posts,
            max_offsite_links: config.max_offsite_links,
        }
    }

    /// Scan a batch of source URLs. Empty or all-failing input returns empty
    /// sets and no details, never an error.
    pub async fn scan(&self, urls: &[String]) -> ScanResult {
        let mut result = ScanResult::default();

        let mut seen = BTreeSet::new();
        let unique: Vec<&String> = urls
            .iter()
            .filter(|u| !u.is_empty() && seen.insert(u.as_str()))
            .collect();

        for src in unique {
            let Some((fetch_url, raw)) = self.resolve_via_mirrors(src).await else {
                tracing::warn!(url = %src, "No usable mirror page for source");
                continue;
            };

            let found = extract_addresses(&raw);
            result.evm_addresses.extend(found.evm.iter().cloned());
            result.solana_addresses.extend(found.sol.iter().cloned());
            result.details.push(ScanDetail {
                source_url: fetch_url.clone(),
                evm_addresses: found.evm,
                solana_addresses: found.sol,
            });

            // Post pages feed the off-platform hop directly; profile pages
            // contribute up to max_profile_posts recent post permalinks first.
            let mut post_pages: Vec<(String, String)> = Vec::new();
            if STATUS_PATH_RE.is_match(&fetch_url) {
                post_pages.push((fetch_url.clone(), raw));
            } else {
                let links = harvest_post_links(&raw, &fetch_url, self.max_profile_posts);
                for link in links {
                    match self.fetch_accepted(&link, Some(&fetch_url)).await {
                        Ok(post_raw) => {
                            let tx = extract_addresses(&post_raw);
                            result.evm_addresses.extend(tx.evm.iter().cloned());
                            result.solana_addresses.extend(tx.sol.iter().cloned());
                            if !tx.is_empty() {
                                result.details.push(ScanDetail {
                                    source_url: link.clone(),
                                    evm_addresses: tx.evm,
                                    solana_addresses: tx.sol,
                                });
                            }
                            post_pages.push((link, post_raw));
                        }
                        Err(failure) => {
                            tracing::warn!(url = %link, %failure, "Failed to fetch post page");
                        }
                    }
                }
            }

            for (post_url, post_raw) in post_pages {
                self.follow_offsite_links(&post_url, &post_raw, &mut result)
                    .await;
            }
        }

        result
    }

    /// Walk the mirror list for one source URL and return the first usable
    /// page as (fetched URL, raw body). First usable response wins; later
    /// mirrors are never attempted.
    async fn resolve_via_mirrors(&self, src: &str) -> Option<(String, String)> {
        for (index, mirror) in self.mirrors.iter().enumerate() {
            let candidates = mirror_candidates(src, mirror, index == 0);
            let mut last_failure: Option<FetchFailure> = None;

            for candidate in candidates {
                tracing::info!(url = %candidate, "Scanning page");
                match self.fetch_accepted(&candidate, None).await {
                    Ok(raw) => {
                        let found = extract_addresses(&raw);
                        let has_post_links = if STATUS_PATH_RE.is_match(&candidate) {
                            false
                        } else {
                            !harvest_post_links(&raw, &candidate, self.max_profile_posts)
                                .is_empty()
                        };
                        let usable =
                            looks_like_mirror_html(&raw) || !found.is_empty() || has_post_links;
                        if usable {
                            return Some((candidate, raw));
                        }
                        last_failure = Some(FetchFailure::Unusable);
                    }
                    Err(failure) => {
                        last_failure = Some(failure);
                    }
                }
            }

            if let Some(failure) = last_failure {
                tracing::warn!(mirror = %mirror, %failure, "Mirror attempt failed");
            }
        }
        None
    }

    /// Fetch one page; only 2xx/3xx outcomes are accepted
    async fn fetch_accepted(
        &self,
        url: &str,
        referer: Option<&str>,
    ) -> std::result::Result<String, FetchFailure> {
        match self.fetcher.get(url, referer).await {
            Ok(page) if page.status < 400 && page.status >= 200 => Ok(page.body),
            Ok(page) => Err(FetchFailure::Status(page.status)),
            Err(e) => Err(FetchFailure::Transport(e)),
        }
    }

    /// The single permitted hop: fetch off-platform links found on one post
    /// page. Results found here never trigger further hops.
    async fn follow_offsite_links(&self, post_url: &str, post_raw: &str, result: &mut ScanResult) {
        let links = harvest_offsite_links(post_raw, &self.mirrors, self.max_offsite_links);
        for link in links {
            match self.fetch_accepted(&link, Some(post_url)).await {
                Ok(raw) => {
                    let found = extract_addresses(&raw);
                    result.evm_addresses.extend(found.evm.iter().cloned());
                    result.solana_addresses.extend(found.sol.iter().cloned());
                    if !found.is_empty() {
                        result.details.push(ScanDetail {
                            source_url: link,
                            evm_addresses: found.evm,
                            solana_addresses: found.sol,
                        });
                    }
                }
                Err(failure) => {
                    tracing::warn!(url = %link, %failure, "Failed to fetch offsite link");
                }
            }
        }
    }
}

/// Effective mirror order: configured primary, configured fallbacks, then the
/// built-in defaults. Fixed order, trailing slashes trimmed.
fn mirror_list(config: &ScraperConfig) -> Vec<String> {
    let mut mirrors = Vec::new();
    if let Some(primary) = &config.primary_mirror {
        if !primary.is_empty() {
            mirrors.push(primary.trim_end_matches('/').to_string());
        }
    }
    for fallback in &config.fallback_mirrors {
        if !fallback.is_empty() {
            mirrors.push(fallback.trim_end_matches('/').to_string());
        }
    }
    for default in DEFAULT_MIRRORS {
        mirrors.push((*default).to_string());
    }
    mirrors
}

/// Candidate request URLs for one source on one mirror. Post links map to
/// `<mirror>/<handle>/status/<id>`, profile links to `<mirror>/<handle>`.
/// Unrecognized input passes through unchanged, but only on the first mirror.
fn mirror_candidates(src: &str, mirror: &str, first_mirror: bool) -> Vec<String> {
    let mut out = Vec::new();
    if let Ok(parsed) = Url::parse(src) {
        if let Some(host) = parsed.host_str() {
            let host = host.to_lowercase();
            if host.ends_with("x.com") || host.ends_with("twitter.com") {
                let segments: Vec<&str> = parsed
                    .path_segments()
                    .map(|s| s.filter(|p| !p.is_empty()).collect())
                    .unwrap_or_default();
                if STATUS_PATH_RE.is_match(parsed.path()) {
                    if let (Some(handle), Some(id)) = (segments.first(), segments.get(2)) {
                        out.push(format!("{mirror}/{handle}/status/{id}"));
                    }
                } else if let Some(handle) = segments.first() {
                    if HANDLE_SEGMENT_RE.is_match(handle) {
                        out.push(format!("{mirror}/{handle}"));
                    }
                }
            }
        }
    }
    if out.is_empty() && first_mirror {
        out.push(src.to_string());
    }
    out
}

/// Harvest up to `cap` distinct post permalinks from a profile page body,
/// resolving relative hrefs against the fetched URL.
fn harvest_post_links(html: &str, base_url: &str, cap: usize) -> Vec<String> {
    let base = Url::parse(base_url).ok();
    let mut seen = BTreeSet::new();
    let mut links = Vec::new();

    for cap_match in HREF_RE.captures_iter(html) {
        let raw = &cap_match[1];
        if !STATUS_PATH_RE.is_match(raw) {
            continue;
        }
        let resolved = if raw.starts_with("http://") || raw.starts_with("https://") {
            raw.to_string()
        } else if let Some(ref b) = base {
            match b.join(raw) {
                Ok(u) => u.to_string(),
                Err(_) => continue,
            }
        } else {
            continue;
        };
        if seen.insert(resolved.clone()) {
            links.push(resolved);
            if links.len() >= cap {
                break;
            }
        }
    }

    links
}

/// Harvest absolute links whose host is outside the mirror/platform family,
/// deduped and capped
fn harvest_offsite_links(html: &str, mirrors: &[String], cap: usize) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut links = Vec::new();

    for cap_match in HREF_RE.captures_iter(html) {
        let raw = &cap_match[1];
        if !raw.starts_with("http://") && !raw.starts_with("https://") {
            continue;
        }
        let Ok(parsed) = Url::parse(raw) else { continue };
        let Some(host) = parsed.host_str() else { continue };
        if is_platform_family_host(host, mirrors) {
            continue;
        }
        if seen.insert(raw.to_string()) {
            links.push(raw.to_string());
            if links.len() >= cap {
                break;
            }
        }
    }

    links
}

/// Hosts that belong to the source platform or its mirror family
pub fn is_platform_family_host(host: &str, mirrors: &[String]) -> bool {
    let host = host.to_lowercase();
    if host.ends_with("x.com") || host.ends_with("twitter.com") || host.contains("nitter") {
        return true;
    }
    mirrors.iter().any(|m| {
        Url::parse(m)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.eq_ignore_ascii_case(&host)))
            .unwrap_or(false)
    })
}
