//! Configuration management

use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub scraper: ScraperConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
    /// Bot API token for the notification channel
    pub bot_token: Option<String>,
    /// Target group chat for commands and the delivered summary
    pub group_id: Option<String>,
    /// Trend bot whose replies we correlate (with or without `@`)
    #[serde(default = "default_trend_bot")]
    pub trend_bot_handle: String,
    /// How long to wait for the trend bot to reply, per command
    #[serde(default = "default_reply_wait")]
    pub reply_wait_secs: u64,
    /// Sleep between message-store scans while waiting
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// Command that asks the trend bot for trending tweets
    #[serde(default = "default_tweets_command")]
    pub tweets_command: String,
    /// Command that asks the trend bot for trending profiles
    #[serde(default = "default_profiles_command")]
    pub profiles_command: String,
    /// Substrings that mark a message as a trend-bot response
    #[serde(default = "default_response_hints")]
    pub response_hints: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScraperConfig {
    /// Preferred mirror, tried before everything else
    pub primary_mirror: Option<String>,
    /// Additional mirrors tried after the primary, in the given order
    #[serde(default)]
    pub fallback_mirrors: Vec<String>,
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Post permalinks harvested from a usable profile page
    #[serde(default = "default_max_profile_posts")]
    pub max_profile_posts: usize,
    /// Off-platform links followed from each post page (the single hop)
    #[serde(default = "default_max_offsite_links")]
    pub max_offsite_links: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    /// Maximum length of one delivered chunk
    #[serde(default = "default_max_chunk_len")]
    pub max_chunk_len: usize,
}

fn default_trend_bot() -> String {
    "@RickBurpBot".to_string()
}

fn default_reply_wait() -> u64 {
    15
}

fn default_poll_interval() -> u64 {
    3
}

fn default_tweets_command() -> String {
    "/tt@rick".to_string()
}

fn default_profiles_command() -> String {
    "/xt@rick".to_string()
}

fn default_response_hints() -> Vec<String> {
    vec![
        "Trending".to_string(),
        "twitter.com".to_string(),
        "x.com".to_string(),
    ]
}

fn default_fetch_timeout() -> u64 {
    12
}

fn default_max_redirects() -> usize {
    5
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (compatible; TrendScoutBot/1.0; +https://example.com/bot)".to_string()
}

fn default_max_profile_posts() -> usize {
    5
}

fn default_max_offsite_links() -> usize {
    10
}

fn default_max_chunk_len() -> usize {
    3500
}

impl Config {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path.as_ref().to_str().unwrap()))
            .add_source(config::Environment::with_prefix("TRENDSCOUT").separator("__"))
            .build()?;

        let config: Config = settings.try_deserialize()?;
        Ok(config)
    }

    /// Load from default locations
    pub fn load_default() -> anyhow::Result<Self> {
        Self::load_first(&[
            "config.toml",
            "config.yaml",
            "~/.config/trendscout-bot/config.toml",
        ])
    }

    fn load_first(paths: &[&str]) -> anyhow::Result<Self> {
        for path in paths {
            let expanded = shellexpand::tilde(path);
            if Path::new(expanded.as_ref()).exists() {
                return Self::load(expanded.as_ref());
            }
        }

        anyhow::bail!("No configuration file found")
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            group_id: None,
            trend_bot_handle: default_trend_bot(),
            reply_wait_secs: default_reply_wait(),
            poll_interval_secs: default_poll_interval(),
            tweets_command: default_tweets_command(),
            profiles_command: default_profiles_command(),
            response_hints: default_response_hints(),
        }
    }
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            primary_mirror: None,
            fallback_mirrors: Vec::new(),
            fetch_timeout_secs: default_fetch_timeout(),
            max_redirects: default_max_redirects(),
            user_agent: default_user_agent(),
            max_profile_posts: default_max_profile_posts(),
            max_offsite_links: default_max_offsite_links(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            max_chunk_len: default_max_chunk_len(),
        }
    }
}
