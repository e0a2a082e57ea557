//! Syntactic checks on tag codes, before anything touches the store
use crate::error::FormatError;
use regex::Regex;
use std::sync::LazyLock;

static CODE_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z0-9]+-[A-Z0-9]+$").expect("code pattern is valid"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatCheck {
    pub valid: bool,
    pub normalized: String,
    pub message: String,
}

/// Trim surrounding whitespace and uppercase
pub fn normalize(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Checks the normalized code against `PREFIX-ALNUM`
pub fn check(raw: &str) -> Result<String, FormatError> {
    let normalized = normalize(raw);
    if normalized.is_empty() {
        return Err(FormatError::Empty);
    }
    if !CODE_SHAPE.is_match(&normalized) {
        return Err(FormatError::Malformed);
    }
    Ok(normalized)
}

/// Like [`check`], but also requires the code to start with `prefix`
pub fn check_with_prefix(raw: &str, prefix: &str) -> Result<String, FormatError> {
    let normalized = check(raw)?;
    let prefix = normalize(prefix);
    if !normalized.starts_with(&prefix) {
        return Err(FormatError::WrongPrefix(prefix));
    }
    Ok(normalized)
}

pub fn validate_format(raw: &str) -> FormatCheck {
    to_format_check(raw, check(raw))
}

pub fn validate_format_with_prefix(raw: &str, prefix: &str) -> FormatCheck {
    to_format_check(raw, check_with_prefix(raw, prefix))
}

fn to_format_check(raw: &str, result: Result<String, FormatError>) -> FormatCheck {
    match result {
        Ok(normalized) => FormatCheck {
            valid: true,
            normalized,
            message: "Code is valid".to_string(),
        },
        Err(err) => FormatCheck {
            valid: false,
            normalized: normalize(raw),
            message: err.to_string(),
        },
    }
}

/// Pull a code out of scanner output: a bare code, a `/code/IFL-ABC123` path or a full URL.
///
/// Only the last non-empty path segment is considered, and only if it contains a hyphen.
/// The result is normalized but not shape checked.
pub fn extract_code(input: &str) -> Option<String> {
    let input = input.trim();
    let without_query = input.split(['?', '#']).next().unwrap_or_default();
    let path = match without_query.split_once("://") {
        Some((_, rest)) => rest.split_once('/').map(|(_, p)| p).unwrap_or_default(),
        None => without_query,
    };

    path.split('/')
        .filter(|segment| !segment.is_empty())
        .next_back()
        .filter(|segment| segment.contains('-'))
        .map(normalize)
}
