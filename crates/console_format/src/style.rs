//! CSS declaration heuristic.

/// Substrings that mark an argument as a CSS declaration string.
const CSS_KEYWORDS: [&str; 10] = [
    "color:",
    "font-",
    "background",
    "padding",
    "margin",
    "border",
    "text-",
    "display",
    "width",
    "height",
];

/// Whether `s` looks like a CSS declaration string.
///
/// This is a plain substring check and is knowingly approximate: a message
/// such as `"border crossing"` is treated as a style. Style arguments are
/// consumed by `%c` and stray ones are dropped from message text, so the
/// check is used on both paths and must stay identical for both.
pub fn looks_like_css(s: &str) -> bool {
    CSS_KEYWORDS.iter().any(|keyword| s.contains(keyword))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_css_detection() {
        assert!(looks_like_css("color: red"));
        assert!(looks_like_css("font-weight: bold; padding: 2px"));
        assert!(looks_like_css("background:#222"));
        assert!(!looks_like_css("not-a-style"));
        assert!(!looks_like_css("color red"));
    }

    #[test]
    fn test_known_false_positive() {
        assert!(looks_like_css("the border was crossed"));
    }
}
