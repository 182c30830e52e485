//! Console argument formatting.
//!
//! Reconstructs the `%c` styling protocol: the first string argument that
//! contains `%c` is the format string, each `%c` opens a span styled by the
//! next trailing argument when that argument looks like CSS, and everything
//! left over is appended as plain value spans.

use common::Value;

use crate::message::{Span, StyledMessage};
use crate::serialize::serialize;
use crate::style::looks_like_css;

const STYLE_MARKER: &str = "%c";

/// Format a console call's arguments into styled spans.
pub fn format_args(args: &[Value]) -> StyledMessage {
    let format = args.iter().enumerate().find_map(|(index, arg)| match arg {
        Value::String(s) if s.contains(STYLE_MARKER) => Some((index, s.as_str())),
        _ => None,
    });

    match format {
        Some((index, format)) => format_with_styles(args, index, format),
        None => {
            let mut builder = SpanBuilder::default();
            for arg in args {
                builder.push_value(arg, false);
            }
            // Without a format string nothing can carry a style.
            StyledMessage {
                parts: builder.parts.into_iter().collect(),
                has_styles: false,
            }
        }
    }
}

fn format_with_styles(args: &[Value], format_index: usize, format: &str) -> StyledMessage {
    let trailing = &args[format_index + 1..];
    let mut consumed = vec![false; trailing.len()];
    let mut next_candidate = 0;

    let mut builder = SpanBuilder::default();
    for arg in &args[..format_index] {
        builder.push_value(arg, true);
    }

    let (leading, mut rest) = match format.find(STYLE_MARKER) {
        Some(at) => (&format[..at], &format[at + STYLE_MARKER.len()..]),
        None => (format, ""),
    };
    if !leading.is_empty() {
        builder.push_segment(leading, None);
    }

    loop {
        let (text, remainder) = match rest.find(STYLE_MARKER) {
            Some(at) => (&rest[..at], Some(&rest[at + STYLE_MARKER.len()..])),
            None => (rest, None),
        };

        // An empty segment takes no style. A rejected candidate stays queued
        // for the next non-empty segment.
        if !text.is_empty() {
            let mut style = None;
            if let Some(Value::String(s)) = trailing.get(next_candidate) {
                if looks_like_css(s) {
                    consumed[next_candidate] = true;
                    style = Some(s.clone());
                    next_candidate += 1;
                }
            }
            builder.push_segment(text, style);
        }

        match remainder {
            Some(r) => rest = r,
            None => break,
        }
    }

    for (arg, used) in trailing.iter().zip(&consumed) {
        if !used {
            builder.push_value(arg, true);
        }
    }

    StyledMessage::from_parts(builder.parts)
}

#[derive(Default)]
struct SpanBuilder {
    parts: Vec<Span>,
    in_format: bool,
}

impl SpanBuilder {
    /// Append a piece of the format string. Only the first piece is set
    /// apart from value spans that precede the format string.
    fn push_segment(&mut self, text: &str, style: Option<String>) {
        let mut span = Span::new(text, style);
        span.spaced = !self.parts.is_empty() && !self.in_format;
        self.in_format = true;
        self.parts.push(span);
    }

    /// Append an argument as a value span. With `drop_css`, strings that
    /// look like style declarations are treated as stray styles and skipped.
    fn push_value(&mut self, arg: &Value, drop_css: bool) {
        let text = match arg {
            Value::String(s) if drop_css && looks_like_css(s) => return,
            Value::Function(_) => serialize(arg),
            v if v.is_object() => serialize(v),
            other => other.to_js_string(),
        };
        if text.is_empty() {
            return;
        }

        let joins_label = self
            .parts
            .last()
            .map(|last| last.text.trim_end().ends_with(':') && opens_structure(text.trim()))
            .unwrap_or(false);

        if joins_label {
            self.parts.push(Span::value(format!(" {}", text), false));
        } else {
            let spaced = !self.parts.is_empty();
            self.parts.push(Span::value(text, spaced));
        }
    }
}

/// `{`, `[` or an array count prefix such as `(3)`.
fn opens_structure(text: &str) -> bool {
    if text.starts_with('{') || text.starts_with('[') {
        return true;
    }
    let Some(inner) = text.strip_prefix('(') else {
        return false;
    };
    let digits = inner.chars().take_while(|c| c.is_ascii_digit()).count();
    digits > 0 && inner[digits..].starts_with(')')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(message: &StyledMessage) -> Vec<&str> {
        message.parts.iter().map(|p| p.text.as_str()).collect()
    }

    #[test]
    fn test_no_arguments() {
        let message = format_args(&[]);
        assert!(message.parts.is_empty());
        assert!(!message.has_styles);
    }

    #[test]
    fn test_single_styled_span() {
        let message = format_args(&["%cHello".into(), "color: red".into()]);
        assert_eq!(message.parts.len(), 1);
        assert_eq!(message.parts[0].text, "Hello");
        assert_eq!(message.parts[0].style.as_deref(), Some("color: red"));
        assert!(message.has_styles);
    }

    #[test]
    fn test_non_style_argument_is_not_consumed() {
        let message = format_args(&["%cHello".into(), "not-a-style".into()]);
        assert_eq!(texts(&message), vec!["Hello", "not-a-style"]);
        assert_eq!(message.parts[0].style, None);
        assert_eq!(message.parts[1].style, None);
        assert!(!message.has_styles);
    }

    #[test]
    fn test_plain_arguments_keep_order() {
        let message = format_args(&["a".into(), "b".into(), "c".into()]);
        assert_eq!(texts(&message), vec!["a", "b", "c"]);
        assert!(message.parts.iter().all(|p| p.style.is_none()));
        assert!(!message.has_styles);
        assert_eq!(message.plain_text(), "a b c");
    }

    #[test]
    fn test_leading_text_and_multiple_markers() {
        let message = format_args(&[
            "pre %cred%c blue".into(),
            "color: red".into(),
            "color: blue".into(),
        ]);
        assert_eq!(texts(&message), vec!["pre ", "red", " blue"]);
        assert_eq!(message.parts[0].style, None);
        assert_eq!(message.parts[1].style.as_deref(), Some("color: red"));
        assert_eq!(message.parts[2].style.as_deref(), Some("color: blue"));
        assert_eq!(message.plain_text(), "pre red blue");
    }

    #[test]
    fn test_marker_without_argument() {
        let message = format_args(&["%cA%cB".into(), "font-weight: bold".into()]);
        assert_eq!(texts(&message), vec!["A", "B"]);
        assert!(message.parts[0].style.is_some());
        assert_eq!(message.parts[1].style, None);
    }

    #[test]
    fn test_rejected_candidate_stays_queued() {
        let message = format_args(&["%cA%cB".into(), "x".into(), "color: red".into()]);
        assert_eq!(texts(&message), vec!["A", "B", "x"]);
        assert_eq!(message.parts[0].style, None);
        assert_eq!(message.parts[1].style, None);
        assert_eq!(message.parts[2].style, None);
        assert!(!message.has_styles);
    }

    #[test]
    fn test_empty_segment_takes_no_style() {
        let message = format_args(&["%c%cX".into(), "color: red".into(), "color: blue".into()]);
        assert_eq!(texts(&message), vec!["X"]);
        assert_eq!(message.parts[0].style.as_deref(), Some("color: red"));
    }

    #[test]
    fn test_rejected_candidate_is_printed_after_styled_text() {
        let message = format_args(&["%cA".into(), Value::from(3), "color: red".into()]);
        assert_eq!(texts(&message), vec!["A", "3"]);
        assert_eq!(message.parts[0].style, None);
    }

    #[test]
    fn test_stray_style_strings_are_dropped() {
        let message = format_args(&["%cA".into(), "color: red".into(), "margin: 0".into()]);
        assert_eq!(texts(&message), vec!["A"]);
    }

    #[test]
    fn test_css_like_strings_survive_without_format_string() {
        let message = format_args(&["border".into(), "color: red".into()]);
        assert_eq!(texts(&message), vec!["border", "color: red"]);
    }

    #[test]
    fn test_label_adjacency() {
        let object = Value::object([("a", 1)]);
        let message = format_args(&["user:".into(), object]);
        assert_eq!(texts(&message), vec!["user:", " {\"a\": 1}"]);
        assert_eq!(message.plain_text(), "user: {\"a\": 1}");

        let list = Value::array([1, 2]);
        let message = format_args(&["%citems:".into(), "color: red".into(), list]);
        assert_eq!(texts(&message), vec!["items:", " (2) [1, 2]"]);
    }

    #[test]
    fn test_values_are_stringified() {
        let message = format_args(&[
            Value::from(1),
            Value::Null,
            Value::Undefined,
            Value::from(true),
            Value::Function(Some("f".into())),
        ]);
        assert_eq!(
            texts(&message),
            vec!["1", "null", "undefined", "true", "[Function: f]"]
        );
    }

    #[test]
    fn test_arguments_before_format_string() {
        let message = format_args(&[Value::from(7), "%cX".into(), "color: red".into()]);
        assert_eq!(texts(&message), vec!["7", "X"]);
        assert!(message.has_styles);
        assert_eq!(message.plain_text(), "7 X");
    }

    #[test]
    fn test_opens_structure() {
        assert!(opens_structure("{\"a\": 1}"));
        assert!(opens_structure("[1]"));
        assert!(opens_structure("(12) [..]"));
        assert!(!opens_structure("(x)"));
        assert!(!opens_structure("()"));
        assert!(!opens_structure("plain"));
    }
}
