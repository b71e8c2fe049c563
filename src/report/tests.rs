//! Tests for aggregation and report rendering

use super::*;
use crate::types::{ScanDetail, ScanResult};
use chrono::Utc;
use std::collections::BTreeSet;

const EVM_LOWER: &str = "0xaabbccddeeff00112233445566778899aabbccdd";
const EVM_MIXED: &str = "0xAaBbCcDdEeFf00112233445566778899AaBbCcDd";
const SOL_ADDR: &str = "7EYnhQoR9YM3N7UoaKRoA44Uy8JeaZV3qyouov87awMs";

fn summary() -> AggregationSummary {
    AggregationSummary::new(vec!["https://xcancel.com".to_string()], 3500)
}

fn empty_parsed() -> crate::types::ParsedTrend {
    crate::types::ParsedTrend {
        raw_text: String::new(),
        evm_addresses: BTreeSet::new(),
        solana_addresses: BTreeSet::new(),
        tweet_urls: BTreeSet::new(),
        profile_urls: BTreeSet::new(),
        profile_handles: BTreeSet::new(),
        generic_urls: Vec::new(),
        parsed_at: Utc::now(),
    }
}

fn detail(url: &str, evm: &[&str], sol: &[&str]) -> ScanDetail {
    ScanDetail {
        source_url: url.to_string(),
        evm_addresses: evm.iter().map(|s| s.to_string()).collect(),
        solana_addresses: sol.iter().map(|s| s.to_string()).collect(),
    }
}

fn scan_with(details: Vec<ScanDetail>) -> ScanResult {
    let mut result = ScanResult {
        details: details.clone(),
        ..ScanResult::default()
    };
    for d in details {
        result.evm_addresses.extend(d.evm_addresses);
        result.solana_addresses.extend(d.solana_addresses);
    }
    result
}

#[test]
fn case_insensitive_evm_collapse_with_merged_origins() {
    let scans = vec![scan_with(vec![
        detail("https://nitter.net/alpha/status/1", &[EVM_MIXED], &[]),
        detail("https://nitter.net/beta/status/2", &[EVM_LOWER], &[]),
    ])];

    let discovery = summary().aggregate(&empty_parsed(), &scans);

    assert_eq!(discovery.evm_addresses.len(), 1);
    assert!(discovery.evm_addresses.contains(EVM_LOWER));
    let origins = discovery.evm_sources.get(EVM_LOWER).unwrap();
    assert_eq!(origins.len(), 2);
    assert!(origins.contains("https://x.com/alpha/status/1"));
    assert!(origins.contains("https://x.com/beta/status/2"));
}

#[test]
fn solana_addresses_keep_their_case() {
    let scans = vec![scan_with(vec![detail(
        "https://nitter.net/alpha/status/1",
        &[],
        &[SOL_ADDR],
    )])];

    let discovery = summary().aggregate(&empty_parsed(), &scans);

    assert!(discovery.solana_addresses.contains(SOL_ADDR));
    assert!(discovery.sol_sources.contains_key(SOL_ADDR));
}

#[test]
fn parser_only_addresses_have_no_source_entry() {
    let mut parsed = empty_parsed();
    parsed.evm_addresses.insert(EVM_MIXED.to_string());

    let discovery = summary().aggregate(&parsed, &[]);

    assert!(discovery.evm_addresses.contains(EVM_LOWER));
    assert!(discovery.evm_sources.is_empty());
}

#[test]
fn mirror_urls_are_canonicalized_for_attribution() {
    let scans = vec![scan_with(vec![
        detail("https://xcancel.com/alpha", &[EVM_LOWER], &[]),
        detail("https://token-site.example/buy", &[], &[SOL_ADDR]),
    ])];

    let discovery = summary().aggregate(&empty_parsed(), &scans);

    assert!(discovery
        .evm_sources
        .get(EVM_LOWER)
        .unwrap()
        .contains("https://x.com/alpha"));
    // Off-platform origins are left as-is
    assert!(discovery
        .sol_sources
        .get(SOL_ADDR)
        .unwrap()
        .contains("https://token-site.example/buy"));
}

#[test]
fn render_lists_counts_and_sources() {
    let scans = vec![scan_with(vec![detail(
        "https://nitter.net/alpha/status/1",
        &[EVM_LOWER],
        &[SOL_ADDR],
    )])];
    let s = summary();
    let discovery = s.aggregate(&empty_parsed(), &scans);
    let text = s.render(&discovery);

    assert!(text.starts_with("Latest Trend Discoveries"));
    assert!(text.contains("EVM (1):"));
    assert!(text.contains(EVM_LOWER));
    assert!(text.contains("SOL (1):"));
    assert!(text.contains(SOL_ADDR));
    assert!(text.contains("Sources (EVM):"));
    assert!(text.contains(&format!("- {} <- https://x.com/alpha/status/1", EVM_LOWER)));
}

#[test]
fn render_empty_discovery_uses_none_placeholders() {
    let s = summary();
    let discovery = s.aggregate(&empty_parsed(), &[]);
    let text = s.render(&discovery);

    assert!(text.contains("EVM (0):"));
    assert!(text.contains("SOL (0):"));
    assert_eq!(text.matches("(none)").count(), 2);
    assert!(!text.contains("Sources"));
}

#[test]
fn overlong_single_line_is_one_full_chunk() {
    let line = "x".repeat(3501);
    let chunks = chunk_lines(&line, 3500);
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].len(), 3501);
}

#[test]
fn multiline_text_splits_only_at_line_boundaries() {
    let lines: Vec<String> = (0..10).map(|i| format!("line-{i:02} {}", "y".repeat(20))).collect();
    let text = lines.join("\n");
    let chunks = chunk_lines(&text, 60);

    assert!(chunks.len() > 1);
    for chunk in &chunks {
        assert!(chunk.len() <= 60);
        for line in chunk.split('\n') {
            assert!(lines.iter().any(|l| l == line));
        }
    }
    // Nothing lost or reordered
    assert_eq!(chunks.join("\n"), text);
}

#[test]
fn chunking_text_within_limit_yields_one_chunk() {
    let chunks = chunk_lines("short\nreport", 3500);
    assert_eq!(chunks, vec!["short\nreport".to_string()]);
}
