//! Styled message model.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// A run of message text with an optional raw CSS declaration string.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub text: String,
    pub style: Option<String>,
    /// Rendered with a separating space before it.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub spaced: bool,
}

impl Span {
    /// A span cut from a format string.
    pub fn new(text: impl Into<String>, style: Option<String>) -> Self {
        Self {
            text: text.into(),
            style,
            spaced: false,
        }
    }

    /// A span produced from a standalone argument.
    pub fn value(text: impl Into<String>, spaced: bool) -> Self {
        Self {
            text: text.into(),
            style: None,
            spaced,
        }
    }
}

/// Ordered styled spans for one console call.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyledMessage {
    pub parts: SmallVec<[Span; 4]>,
    pub has_styles: bool,
}

impl StyledMessage {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from spans, deriving `has_styles`.
    pub fn from_parts(parts: impl IntoIterator<Item = Span>) -> Self {
        let parts: SmallVec<[Span; 4]> = parts.into_iter().collect();
        let has_styles = parts.iter().any(|p| p.style.is_some());
        Self { parts, has_styles }
    }

    /// Single unstyled span.
    pub fn plain(text: impl Into<String>) -> Self {
        Self::from_parts([Span::new(text, None)])
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Flattened text, as used for filtering and copying.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 && part.spaced {
                out.push(' ');
            }
            out.push_str(&part.text);
        }
        out
    }
}
