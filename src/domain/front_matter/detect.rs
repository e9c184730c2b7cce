//! Marker detection and the missing-opening-marker repair policy.

use std::borrow::Cow;

use serde::Serialize;

pub const YAML_MARKER: &str = "---";
pub const JSON_MARKER: &str = ";;;";

/// Header dialect selected by [`classify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FrontMatterStyle {
    Yaml,
    Json,
    NoMarker,
}

impl FrontMatterStyle {
    pub fn marker(self) -> Option<&'static str> {
        match self {
            FrontMatterStyle::Yaml => Some(YAML_MARKER),
            FrontMatterStyle::Json => Some(JSON_MARKER),
            FrontMatterStyle::NoMarker => None,
        }
    }
}

/// A document after detection, possibly with a synthetic opening marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified<'a> {
    pub text: Cow<'a, str>,
    pub style: FrontMatterStyle,
    /// Length of the injected prefix, zero when the text is untouched.
    pub injected: usize,
}

impl Classified<'_> {
    pub fn is_coerced(&self) -> bool {
        self.injected > 0
    }

    /// The text with any injected prefix removed again.
    pub fn without_injection(&self) -> &str {
        &self.text[self.injected..]
    }
}

/// Style of a document that already opens with a marker.
pub fn detect_style(text: &str) -> Option<FrontMatterStyle> {
    if text.starts_with(YAML_MARKER) {
        Some(FrontMatterStyle::Yaml)
    } else if text.starts_with(JSON_MARKER) {
        Some(FrontMatterStyle::Json)
    } else {
        None
    }
}

/// Repair documents whose opening marker was omitted.
///
/// When the text does not open with a marker but contains one later, the
/// matching marker plus a newline is prepended. `;;;` wins over `---` when
/// both occur.
pub fn coerce_missing_marker(text: &str) -> Classified<'_> {
    let style = if text.contains(JSON_MARKER) {
        FrontMatterStyle::Json
    } else if text.contains(YAML_MARKER) {
        FrontMatterStyle::Yaml
    } else {
        return Classified {
            text: Cow::Borrowed(text),
            style: FrontMatterStyle::NoMarker,
            injected: 0,
        };
    };

    let marker = style.marker().unwrap_or_default();
    let prefix = format!("{marker}\n");
    let injected = prefix.len();
    Classified {
        text: Cow::Owned(prefix + text),
        style,
        injected,
    }
}

/// Single detection step feeding the parse strategies.
pub fn classify(text: &str) -> Classified<'_> {
    match detect_style(text) {
        Some(style) => Classified {
            text: Cow::Borrowed(text),
            style,
            injected: 0,
        },
        None => coerce_missing_marker(text),
    }
}
