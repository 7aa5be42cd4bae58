//! User-supplied text sanitization.
//!
//! Names and topics are broadcast verbatim to every client in a room, so any
//! markup must be stripped before storage. This is a security invariant, not
//! cosmetics.

/// Maximum length of a display name, in characters.
pub const NAME_MAX: usize = 20;

/// Maximum length of a topic, in characters.
pub const TOPIC_MAX: usize = 100;

/// Placeholder used when a submitted topic is blank.
pub const DEFAULT_TOPIC: &str = "User story";

/// Remove HTML/script tags from `input`.
///
/// Everything between `<` and `>` is dropped, as are stray angle brackets.
/// An unterminated `<` drops the rest of the string.
pub fn strip_tags(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_tag = false;
    for c in input.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

/// Sanitize a display name: trim, strip markup, cap at [`NAME_MAX`] chars.
/// Returns an empty string when nothing survives; callers treat that as
/// "keep the current name".
pub fn sanitize_name(raw: &str) -> String {
    clamp_chars(strip_tags(raw).trim(), NAME_MAX)
}

/// Sanitize a topic: blank input becomes [`DEFAULT_TOPIC`], otherwise the
/// text is stripped of markup and capped at [`TOPIC_MAX`] chars. A topic
/// that is empty after stripping also falls back to the placeholder.
pub fn sanitize_topic(raw: &str) -> String {
    let cleaned = clamp_chars(strip_tags(raw).trim(), TOPIC_MAX);
    if cleaned.is_empty() {
        DEFAULT_TOPIC.to_string()
    } else {
        cleaned
    }
}

fn clamp_chars(input: &str, max: usize) -> String {
    input.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_tags_removes_script_blocks() {
        assert_eq!(strip_tags("<script>x</script>"), "x");
        assert_eq!(strip_tags("a<b>b</b>c"), "abc");
    }

    #[test]
    fn test_strip_tags_drops_stray_brackets() {
        assert_eq!(strip_tags("a < b > c"), "a  c");
        assert_eq!(strip_tags("trailing<img src=x onerror=alert(1)"), "trailing");
    }

    #[test]
    fn test_sanitize_name_trims_and_caps_length() {
        assert_eq!(sanitize_name("  Alice  "), "Alice");
        let long = "x".repeat(50);
        assert_eq!(sanitize_name(&long).chars().count(), NAME_MAX);
    }

    #[test]
    fn test_sanitize_name_counts_characters_not_bytes() {
        // 25 multi-byte chars must clamp to 20 chars without splitting one
        let raw = "é".repeat(25);
        assert_eq!(sanitize_name(&raw).chars().count(), NAME_MAX);
    }

    #[test]
    fn test_sanitize_name_of_pure_markup_is_empty() {
        assert_eq!(sanitize_name("<script></script>"), "");
        assert_eq!(sanitize_name("   "), "");
    }

    #[test]
    fn test_sanitize_topic_blank_becomes_placeholder() {
        assert_eq!(sanitize_topic(""), DEFAULT_TOPIC);
        assert_eq!(sanitize_topic("   "), DEFAULT_TOPIC);
        assert_eq!(sanitize_topic("<b></b>"), DEFAULT_TOPIC);
    }

    #[test]
    fn test_sanitize_topic_strips_and_caps() {
        assert_eq!(sanitize_topic("Estimate <b>login</b> flow"), "Estimate login flow");
        let long = "y".repeat(300);
        assert_eq!(sanitize_topic(&long).chars().count(), TOPIC_MAX);
    }
}
