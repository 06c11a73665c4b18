//! MIME type allow-list checks.

use crate::error::{DepotError, DepotResult};

/// MIME types accepted when no allow-list is configured.
pub const DEFAULT_ALLOWED_TYPES: &[&str] = &[
    // Images
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/svg+xml",
    // Documents
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "text/plain",
    "text/csv",
    // Archives
    "application/zip",
    "application/gzip",
];

/// Type reported for content no signature matches.
pub const UNKNOWN_MIME_TYPE: &str = "application/octet-stream";

/// Validates MIME types against an allow-list.
#[derive(Debug, Clone)]
pub struct TypeValidator {
    default_allowed: Vec<String>,
}

impl TypeValidator {
    /// Create a validator whose default allow-list is `default_allowed`.
    pub fn new<I, S>(default_allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            default_allowed: default_allowed
                .into_iter()
                .map(|s| normalize(s.as_ref()))
                .collect(),
        }
    }

    pub fn default_allowed(&self) -> &[String] {
        &self.default_allowed
    }

    /// Check `mime_type` against `allow_list`, or the default list when
    /// `allow_list` is `None` or empty.
    pub fn validate(&self, mime_type: &str, allow_list: Option<&[String]>) -> DepotResult<()> {
        let allowed = match allow_list {
            Some(list) if !list.is_empty() => list,
            _ => self.default_allowed.as_slice(),
        };

        let wanted = normalize(mime_type);
        if allowed.iter().any(|a| normalize(a) == wanted) {
            Ok(())
        } else {
            Err(DepotError::DisallowedType(mime_type.to_string()))
        }
    }
}

impl Default for TypeValidator {
    fn default() -> Self {
        Self::new(DEFAULT_ALLOWED_TYPES)
    }
}

/// Sniff a MIME type from leading content bytes.
///
/// Formats with a signature come from `infer`. SVG markup is recognised
/// ahead of the generic XML match. Content with no signature is reported
/// as text when it reads as UTF-8 without NUL bytes.
pub fn sniff(data: &[u8]) -> &'static str {
    let text = text_of(data);
    if text.is_some_and(is_svg) {
        return "image/svg+xml";
    }
    if let Some(kind) = infer::get(data) {
        return kind.mime_type();
    }
    match text {
        Some(_) => "text/plain",
        None => UNKNOWN_MIME_TYPE,
    }
}

/// Leading bytes as text, tolerating a code point cut off at the end.
fn text_of(data: &[u8]) -> Option<&str> {
    if data.is_empty() || data.contains(&0) {
        return None;
    }
    match std::str::from_utf8(data) {
        Ok(text) => Some(text),
        // error_len() is None only for an incomplete trailing sequence.
        Err(e) if e.error_len().is_none() => std::str::from_utf8(&data[..e.valid_up_to()]).ok(),
        Err(_) => None,
    }
}

fn is_svg(text: &str) -> bool {
    let head = text.trim_start_matches('\u{feff}').trim_start();
    (head.starts_with("<?xml") || head.starts_with("<svg") || head.starts_with("<!DOCTYPE svg"))
        && head.contains("<svg")
}

/// Lowercase essence of a MIME type, without parameters.
fn normalize(mime_type: &str) -> String {
    mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}
