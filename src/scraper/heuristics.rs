//! Usability heuristics for fetched mirror pages
//!
//! A mirror can answer 200 OK with a parked or anti-bot placeholder. These
//! checks look for structural markers of a genuine mirrored page.

/// Structural check: does this raw body look like a real mirrored
/// profile/post page rather than a placeholder?
///
/// Known quirk, kept on purpose: a parked page that happens to contain a
/// `/status/` substring passes. Callers additionally accept pages where
/// address extraction or post-link harvesting succeeded.
pub fn looks_like_mirror_html(html: &str) -> bool {
    let s = html.to_lowercase();

    if s.contains(r#"name="generator" content="nitter""#) {
        return true;
    }
    if s.contains(r#"class="profile-card""#) {
        return true;
    }
    if s.contains(r#"class="timeline""#) {
        return true;
    }
    if s.contains(r#"class="tweet""#) || s.contains("/status/") {
        return true;
    }

    // Markers of parked/anti-bot pages
    if s.contains("window.park") || s.contains("data-adblockkey") {
        return false;
    }

    // Very short HTML is rarely a real page
    if s.len() < 2000 {
        return false;
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nitter_generator_marker_is_usable() {
        assert!(looks_like_mirror_html(
            r#"<meta name="generator" content="nitter" />"#
        ));
    }

    #[test]
    fn profile_card_marker_is_usable() {
        assert!(looks_like_mirror_html(r#"<div class="profile-card"></div>"#));
    }

    #[test]
    fn status_link_marker_is_usable() {
        assert!(looks_like_mirror_html(r#"<a href="/someone/status/123">post</a>"#));
    }

    #[test]
    fn parked_page_is_rejected() {
        assert!(!looks_like_mirror_html(
            r#"<html><script>window.park = "a";</script></html>"#
        ));
    }

    #[test]
    fn adblock_key_page_is_rejected() {
        assert!(!looks_like_mirror_html(
            r#"<html data-adblockkey="abc"><body>for sale</body></html>"#
        ));
    }

    #[test]
    fn short_unmarked_html_is_rejected() {
        assert!(!looks_like_mirror_html("<html><body>hi</body></html>"));
    }

    #[test]
    fn long_unmarked_html_is_accepted() {
        let body = format!("<html><body>{}</body></html>", "content ".repeat(400));
        assert!(looks_like_mirror_html(&body));
    }
}
