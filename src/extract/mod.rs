//! Contract-address extraction from noisy page/message text
//!
//! Pure functions, no I/O. Every caller (parser, scraper) goes through
//! [`extract_addresses`], which sanitizes HTML-ish input first and then
//! applies the EVM and Solana candidate regexes.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

static EVM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"0x[a-fA-F0-9]{40}").expect("valid regex"));

// Allow up to 60 so "<address>pump" style suffixed candidates are captured,
// then normalized down to the valid 32..=44 range.
static SOL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[1-9A-HJ-NP-Za-km-z]{32,60}\b").expect("valid regex"));

static SCRIPT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<script.*?</script>").expect("valid regex"));
static STYLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<style.*?</style>").expect("valid regex"));
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));
static ZERO_WIDTH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\x{200B}-\x{200D}\x{FEFF}]").expect("valid regex"));
static DASH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\x{2010}-\x{2015}\x{2212}]").expect("valid regex"));
static WS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Address sets found in one piece of text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressSet {
    pub evm: BTreeSet<String>,
    pub sol: BTreeSet<String>,
}

impl AddressSet {
    pub fn is_empty(&self) -> bool {
        self.evm.is_empty() && self.sol.is_empty()
    }

    pub fn len(&self) -> usize {
        self.evm.len() + self.sol.len()
    }
}

/// Reduce HTML-ish input to plain text: decode entities, drop script/style
/// blocks and remaining tags, strip zero-width characters, normalize dash
/// variants to `-`, collapse whitespace runs to single spaces.
pub fn sanitize_html_to_text(input: &str) -> String {
    let decoded = html_escape::decode_html_entities(input);
    let no_scripts = SCRIPT_RE.replace_all(&decoded, " ");
    let no_styles = STYLE_RE.replace_all(&no_scripts, " ");
    let no_tags = TAG_RE.replace_all(&no_styles, " ");
    let no_zero_width = ZERO_WIDTH_RE.replace_all(&no_tags, "");
    let ascii_dashes = DASH_RE.replace_all(&no_zero_width, "-");
    WS_RE.replace_all(&ascii_dashes, " ").into_owned()
}

/// Extract EVM and Solana address candidates from arbitrary text.
///
/// EVM case is preserved here; aggregation lower-cases when merging so that
/// differently-cased spellings from different pages collapse into one entity.
pub fn extract_addresses(text: &str) -> AddressSet {
    if text.is_empty() {
        return AddressSet::default();
    }
    let cleaned = sanitize_html_to_text(text);

    let evm: BTreeSet<String> = EVM_RE
        .find_iter(&cleaned)
        .map(|m| m.as_str().to_string())
        .collect();

    let sol: BTreeSet<String> = SOL_RE
        .find_iter(&cleaned)
        .filter_map(|m| normalize_sol_candidate(m.as_str()))
        .collect();

    AddressSet { evm, sol }
}

/// Strip a trailing `pump` suffix in any case, truncate to 44 characters,
/// then re-validate length 32..=44 and reject anything starting with `0x`.
fn normalize_sol_candidate(candidate: &str) -> Option<String> {
    // Base58 candidates are pure ASCII, so byte slicing is safe here.
    let stripped = match candidate.len().checked_sub(4) {
        Some(cut) if candidate[cut..].eq_ignore_ascii_case("pump") => &candidate[..cut],
        _ => candidate,
    };
    let truncated: String = stripped.chars().take(44).collect();
    if truncated.len() < 32 || truncated.len() > 44 || truncated.starts_with("0x") {
        return None;
    }
    Some(truncated)
}
