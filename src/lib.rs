//! Trend-bot token discovery
//!
//! Correlates a trend bot's chat replies with sent commands, parses the
//! replies into addresses/links/handles, resolves the links through a list
//! of page mirrors, and delivers a source-attributed summary.

pub mod config;
pub mod correlator;
pub mod discovery;
pub mod error;
pub mod extract;
pub mod notify;
pub mod parser;
pub mod report;
pub mod scraper;
pub mod store;
pub mod types;
