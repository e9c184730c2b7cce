//! Front-matter extraction for Hexo-style documents.
//!
//! Two header dialects are understood:
//!
//! - YAML between `---` markers;
//! - a JSON object body (without braces) between `;;;` markers.
//!
//! Documents missing the opening marker are repaired by
//! [`coerce_missing_marker`]. Parsing never fails: any problem yields a
//! fallback record with empty metadata and the best-effort body.

mod detect;
mod normalize;
mod placeholders;

pub use detect::{
    Classified, FrontMatterStyle, JSON_MARKER, YAML_MARKER, classify, coerce_missing_marker,
    detect_style,
};
pub use placeholders::Placeholders;

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::domain::abbrlink::AbbrlinkSettings;

const MARKER_LEN: usize = 3;

#[derive(Debug, Error)]
pub(crate) enum HeaderError {
    #[error("document has no front-matter marker")]
    Missing,
    #[error("closing `{0}` marker not found")]
    Unterminated(&'static str),
    #[error("invalid yaml header: {0}")]
    Yaml(#[from] yaml_rust2::scanner::ScanError),
    #[error("invalid json header: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Structure(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseOutcome {
    Parsed,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrontMatterRecord {
    pub fields: Map<String, Value>,
    pub body: String,
    pub style: FrontMatterStyle,
    pub outcome: ParseOutcome,
}

impl FrontMatterRecord {
    pub fn is_parsed(&self) -> bool {
        self.outcome == ParseOutcome::Parsed
    }

    pub fn title(&self) -> Option<&str> {
        self.fields.get("title").and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Render the body as an escaped debug string.
    pub safe: bool,
    pub abbrlink: AbbrlinkSettings,
}

/// Parse a document, capturing placeholder values for this call.
pub fn parse(text: &str, options: &ParseOptions) -> FrontMatterRecord {
    let placeholders = Placeholders::capture(&options.abbrlink);
    parse_with(text, options.safe, &placeholders)
}

/// Parse a document with pre-computed placeholder values.
pub fn parse_with(text: &str, safe: bool, placeholders: &Placeholders) -> FrontMatterRecord {
    let classified = classify(text);
    let style = classified.style;

    let header = match style {
        FrontMatterStyle::Yaml => parse_yaml_header(&classified.text, placeholders),
        FrontMatterStyle::Json => parse_json_header(&classified.text, placeholders),
        FrontMatterStyle::NoMarker => Err(HeaderError::Missing),
    };

    let fields = match header {
        Ok(Some(fields)) if !fields.is_empty() => fields,
        Ok(_) => {
            debug!(style = ?style, "front matter is not a non-empty mapping");
            return fallback(&classified, safe);
        }
        Err(err) => {
            debug!(style = ?style, error = %err, "front matter could not be parsed");
            return fallback(&classified, safe);
        }
    };

    let Some(body) = body_after_header(&classified.text) else {
        return fallback(&classified, safe);
    };

    FrontMatterRecord {
        fields,
        body: render_body(body, safe),
        style,
        outcome: ParseOutcome::Parsed,
    }
}

/// Escaped debug rendering that neutralizes markup characters.
pub fn escape_body(text: &str) -> String {
    format!("{text:?}")
        .replace('<', "\\<")
        .replace('>', "\\>")
        .replace('!', "\\!")
}

fn render_body(text: &str, safe: bool) -> String {
    if safe {
        escape_body(text)
    } else {
        text.to_string()
    }
}

fn fallback(classified: &Classified<'_>, safe: bool) -> FrontMatterRecord {
    FrontMatterRecord {
        fields: Map::new(),
        body: render_body(classified.without_injection(), safe),
        style: classified.style,
        outcome: ParseOutcome::Fallback,
    }
}

/// Header text between the opening marker and the next occurrence of it,
/// without the line break that precedes the closing marker.
fn extract_header<'a>(text: &'a str, marker: &'static str) -> Result<&'a str, HeaderError> {
    let rest = &text[MARKER_LEN..];
    let end = rest.find(marker).ok_or(HeaderError::Unterminated(marker))?;
    let inner = &rest[..end];
    let inner = inner.strip_suffix('\n').unwrap_or(inner);
    Ok(inner.strip_suffix('\r').unwrap_or(inner))
}

fn parse_yaml_header(
    text: &str,
    placeholders: &Placeholders,
) -> Result<Option<Map<String, Value>>, HeaderError> {
    let header = extract_header(text, YAML_MARKER)?;
    let substituted: String = placeholders
        .apply(header)
        .chars()
        .filter(|ch| !matches!(ch, '{' | '}'))
        .collect();
    normalize::load_mapping(&substituted)
}

fn parse_json_header(
    text: &str,
    placeholders: &Placeholders,
) -> Result<Option<Map<String, Value>>, HeaderError> {
    let header = extract_header(text, JSON_MARKER)?;
    let wrapped = format!("{{{}}}", placeholders.apply(header));
    match serde_json::from_str::<Value>(&wrapped)? {
        Value::Object(fields) => Ok(Some(fields)),
        _ => Ok(None),
    }
}

/// Body following the closing marker: the first run of three `-`/`;`
/// characters after the opening marker. One leading line break is dropped.
fn body_after_header(text: &str) -> Option<&str> {
    let rest = &text[MARKER_LEN..];
    let bytes = rest.as_bytes();
    let is_marker = |byte: &u8| matches!(byte, b'-' | b';');
    let start = bytes
        .windows(MARKER_LEN)
        .position(|window| window.iter().all(is_marker))?;
    let body = &rest[start + MARKER_LEN..];
    Some(
        body.strip_prefix("\r\n")
            .or_else(|| body.strip_prefix('\n'))
            .unwrap_or(body),
    )
}
