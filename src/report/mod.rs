//! Discovery aggregation and report rendering
//!
//! Folds the parsed trend reply and every per-page scan record into one
//! [`AggregatedDiscovery`] with source attribution, renders it as text, and
//! splits the text into delivery-sized chunks.

#[cfg(test)]
mod tests;

use crate::types::{AggregatedDiscovery, ParsedTrend, ScanResult};
use std::collections::{BTreeMap, BTreeSet};
use url::Url;

/// Aggregates scans and renders the delivery report
pub struct AggregationSummary {
    /// Mirror base URLs whose hosts are rewritten back to the canonical host
    mirrors: Vec<String>,
    max_chunk_len: usize,
}

impl AggregationSummary {
    pub fn new(mirrors: Vec<String>, max_chunk_len: usize) -> Self {
        Self {
            mirrors,
            max_chunk_len,
        }
    }

    /// Merge the parsed reply with all scan batches. EVM addresses are
    /// lower-cased here (and only here) so differently-cased spellings from
    /// different pages collapse into one entity with merged origins.
    /// Parser-only addresses appear in the totals without an index entry.
    pub fn aggregate(&self, parsed: &ParsedTrend, scans: &[ScanResult]) -> AggregatedDiscovery {
        let mut evm: BTreeSet<String> = parsed
            .evm_addresses
            .iter()
            .map(|a| a.to_lowercase())
            .collect();
        let mut sol: BTreeSet<String> = parsed.solana_addresses.clone();

        let mut details = Vec::new();
        let mut evm_sources: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        let mut sol_sources: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

        for scan in scans {
            evm.extend(scan.evm_addresses.iter().map(|a| a.to_lowercase()));
            sol.extend(scan.solana_addresses.iter().cloned());

            for detail in &scan.details {
                let origin = self.to_canonical_url(&detail.source_url);
                for addr in &detail.evm_addresses {
                    evm.insert(addr.to_lowercase());
                    evm_sources
                        .entry(addr.to_lowercase())
                        .or_default()
                        .insert(origin.clone());
                }
                for addr in &detail.solana_addresses {
                    sol.insert(addr.clone());
                    sol_sources
                        .entry(addr.clone())
                        .or_default()
                        .insert(origin.clone());
                }
                details.push(detail.clone());
            }
        }

        AggregatedDiscovery {
            evm_addresses: evm,
            solana_addresses: sol,
            details,
            evm_sources,
            sol_sources,
        }
    }

    /// Render the full report text
    pub fn render(&self, discovery: &AggregatedDiscovery) -> String {
        let evm: Vec<&str> = discovery.evm_addresses.iter().map(|s| s.as_str()).collect();
        let sol: Vec<&str> = discovery
            .solana_addresses
            .iter()
            .map(|s| s.as_str())
            .collect();

        let mut lines = vec![
            "Latest Trend Discoveries".to_string(),
            format!("EVM ({}):", evm.len()),
            if evm.is_empty() {
                "(none)".to_string()
            } else {
                evm.join(", ")
            },
            format!("SOL ({}):", sol.len()),
            if sol.is_empty() {
                "(none)".to_string()
            } else {
                sol.join(", ")
            },
        ];

        if !discovery.evm_sources.is_empty() || !discovery.sol_sources.is_empty() {
            lines.push(String::new());
            if !discovery.evm_sources.is_empty() {
                lines.push("Sources (EVM):".to_string());
                for addr in &discovery.evm_addresses {
                    if let Some(sources) = discovery.evm_sources.get(addr) {
                        let joined: Vec<&str> = sources.iter().map(|s| s.as_str()).collect();
                        lines.push(format!("- {} <- {}", addr, joined.join(", ")));
                    }
                }
            }
            if !discovery.sol_sources.is_empty() {
                lines.push("Sources (SOL):".to_string());
                for addr in &discovery.solana_addresses {
                    if let Some(sources) = discovery.sol_sources.get(addr) {
                        let joined: Vec<&str> = sources.iter().map(|s| s.as_str()).collect();
                        lines.push(format!("- {} <- {}", addr, joined.join(", ")));
                    }
                }
            }
        }

        lines.join("\n")
    }

    /// Split rendered text at line boundaries into chunks not exceeding the
    /// configured maximum. A single line longer than the maximum is emitted
    /// whole as its own chunk, never truncated.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        chunk_lines(text, self.max_chunk_len)
    }

    /// Rewrite a mirror-host URL back to the canonical platform host for
    /// display; anything unrecognized is returned unchanged.
    fn to_canonical_url(&self, url: &str) -> String {
        let Ok(parsed) = Url::parse(url) else {
            return url.to_string();
        };
        let Some(host) = parsed.host_str() else {
            return url.to_string();
        };
        if !crate::scraper::is_platform_family_host(host, &self.mirrors)
            || host.ends_with("x.com")
            || host.ends_with("twitter.com")
        {
            return url.to_string();
        }

        let segments: Vec<&str> = parsed
            .path_segments()
            .map(|s| s.filter(|p| !p.is_empty()).collect())
            .unwrap_or_default();
        match (segments.first(), segments.get(1), segments.get(2)) {
            (Some(user), Some(&"status"), Some(id)) => {
                format!("https://x.com/{user}/status/{id}")
            }
            (Some(user), _, _) => format!("https://x.com/{user}"),
            _ => url.to_string(),
        }
    }
}

fn chunk_lines(text: &str, max_len: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();

    for line in text.split('\n') {
        if !current.is_empty() && current.len() + 1 + line.len() > max_len {
            out.push(std::mem::take(&mut current));
        }
        if current.is_empty() {
            current = line.to_string();
        } else {
            current.push('\n');
            current.push_str(line);
        }
    }
    if !current.is_empty() {
        out.push(current);
    }

    out
}
