//! Text cleanup for feed-supplied strings.

/// Default length cap for news descriptions.
pub const SUMMARY_MAX_CHARS: usize = 150;

/// Replaces the handful of entities feeds actually emit.
#[must_use]
pub fn unescape_entities(s: &str) -> String {
    s.replace("&quot;", "\"")
        .replace("&#039;", "'")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

/// Drops everything between `<` and the next `>`.
#[must_use]
pub fn strip_tags(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;
    for c in s.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

/// Cuts `s` to `max_chars` characters and appends `...` when it was longer.
#[must_use]
pub fn truncate_with_ellipsis(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

/// Tags stripped, entities unescaped, newlines flattened, trimmed and truncated.
#[must_use]
pub fn clean_summary(raw: &str) -> String {
    let text = unescape_entities(&strip_tags(raw)).replace(['\r', '\n'], " ");
    truncate_with_ellipsis(text.trim(), SUMMARY_MAX_CHARS)
}

/// Lowercases `s` and capitalizes the first letter of every word.
#[must_use]
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if at_word_start {
            out.extend(c.to_uppercase());
        } else {
            out.extend(c.to_lowercase());
        }
        at_word_start = c.is_whitespace();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_summary() {
        let raw = "<p>Shares of &quot;ACME&quot; rose\nafter the company&#039;s report.</p>  ";
        assert_eq!(
            clean_summary(raw),
            "Shares of \"ACME\" rose after the company's report."
        );
    }

    #[test]
    fn test_truncate() {
        let long = "x".repeat(151);
        let cut = truncate_with_ellipsis(&long, 150);
        assert_eq!(cut.len(), 153);
        assert!(cut.ends_with("..."));

        let exact = "y".repeat(150);
        assert_eq!(truncate_with_ellipsis(&exact, 150), exact);

        // Multi-byte characters are counted, not bytes.
        assert_eq!(truncate_with_ellipsis("ééé", 2), "éé...");
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("SERVICES-PREPACKAGED SOFTWARE"), "Services-prepackaged Software");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn test_strip_tags_keeps_lone_gt() {
        assert_eq!(strip_tags("a > b <b>c</b>"), "a > b c");
    }
}
