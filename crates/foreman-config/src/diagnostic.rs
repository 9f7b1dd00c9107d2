// SPDX-FileCopyrightText: 2026 Foreman Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Config error reporting.
//!
//! Figment reports what went wrong; this module turns each of its errors into
//! a [`ConfigError`] that miette can render against the offending
//! `foreman.toml`, including a "did you mean" hint for misspelled keys.

#![allow(unused_assignments)] // emitted by miette's Diagnostic derive

use figment::error::{Error as FigmentError, Kind};
use miette::{Diagnostic, GraphicalReportHandler, NamedSource, SourceSpan};
use thiserror::Error;

/// Jaro-Winkler score a valid key must beat to be offered as a correction.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// Everything that can be wrong with a Foreman config file.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// A table contains a key Foreman does not read.
    #[error("unknown configuration key `{key}`")]
    #[diagnostic(
        code(foreman::config::unknown_key),
        help("{}", unknown_key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        key: String,
        /// Closest valid key, when one is close enough.
        suggestion: Option<String>,
        /// Comma-separated keys accepted by the enclosing table.
        valid_keys: String,
        #[label("not a recognized key")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("invalid type for key `{key}`: {detail}")]
    #[diagnostic(code(foreman::config::invalid_type), help("expected {expected}"))]
    InvalidType {
        /// Dotted path, e.g. `cache.max_entries`.
        key: String,
        detail: String,
        expected: String,
        #[label("wrong type")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("missing required key `{key}`")]
    #[diagnostic(
        code(foreman::config::missing_key),
        help("set `{key}` in foreman.toml")
    )]
    MissingKey { key: String },

    /// A value parsed but is out of range or inconsistent with another value.
    #[error("validation error: {message}")]
    #[diagnostic(code(foreman::config::validation))]
    Validation { message: String },

    #[error("configuration error: {0}")]
    #[diagnostic(code(foreman::config::other))]
    Other(String),
}

fn unknown_key_help(suggestion: Option<&str>, valid_keys: &str) -> String {
    if let Some(closest) = suggestion {
        format!("did you mean `{closest}`? Valid keys: {valid_keys}")
    } else {
        format!("valid keys: {valid_keys}")
    }
}

/// Splits a figment error into one [`ConfigError`] per underlying failure.
///
/// `toml_sources` holds `(path, contents)` for every TOML file that fed the
/// figment; it is used to attach source spans to unknown keys.
pub fn figment_to_config_errors(
    err: FigmentError,
    toml_sources: &[(String, String)],
) -> Vec<ConfigError> {
    err.into_iter()
        .map(|error| convert(error, toml_sources))
        .collect()
}

fn convert(error: FigmentError, toml_sources: &[(String, String)]) -> ConfigError {
    match &error.kind {
        Kind::UnknownField(field, expected) => {
            let (span, src) = locate_key(&error, field, toml_sources);
            ConfigError::UnknownKey {
                key: field.clone(),
                suggestion: suggest_key(field, expected),
                valid_keys: expected.join(", "),
                span,
                src,
            }
        }
        Kind::MissingField(field) => ConfigError::MissingKey {
            key: qualified(&error.path, field),
        },
        Kind::InvalidType(actual, expected) => ConfigError::InvalidType {
            key: error.path.join("."),
            detail: format!("found {actual}, expected {expected}"),
            expected: expected.clone(),
            span: None,
            src: None,
        },
        _ => ConfigError::Other(error.to_string()),
    }
}

/// `["cache"]` + `ttl_secs` becomes `cache.ttl_secs`.
fn qualified(path: &[String], field: &str) -> String {
    if path.is_empty() {
        field.to_string()
    } else {
        format!("{}.{field}", path.join("."))
    }
}

/// Pairs the file an error came from with the position of `field` in it.
fn locate_key(
    error: &FigmentError,
    field: &str,
    toml_sources: &[(String, String)],
) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
    let origin = error
        .metadata
        .as_ref()
        .and_then(|meta| meta.source.as_ref())
        .and_then(|source| match source {
            figment::Source::File(path) => Some(path.display().to_string()),
            _ => None,
        });

    // Strings merged with `Toml::string` have no file metadata.
    let file = match origin {
        Some(origin) => toml_sources.iter().find(|(path, _)| *path == origin),
        None if toml_sources.len() == 1 => toml_sources.first(),
        None => None,
    };

    let Some((path, contents)) = file else {
        return (None, None);
    };
    match find_key_offset(contents, &error.path, field) {
        Some(offset) => (
            Some(SourceSpan::new(offset.into(), field.len())),
            Some(NamedSource::new(path, contents.clone())),
        ),
        None => (None, None),
    }
}

/// Byte offset of `field` inside the table named by `path`.
///
/// Table headers are tracked line by line, so only a key that sits directly
/// under `[path.joined]` (or before any header when `path` is empty) matches.
pub fn find_key_offset(content: &str, path: &[String], field: &str) -> Option<usize> {
    let wanted = path.join(".");
    let mut in_table = wanted.is_empty();
    let mut offset = 0;

    for line in content.split_inclusive('\n') {
        let text = line.trim_start();
        if let Some(header) = table_header(text) {
            in_table = header == wanted;
        } else if in_table && assigns(text, field) {
            return Some(offset + line.len() - text.len());
        }
        offset += line.len();
    }
    None
}

/// `[tiers.fast]` yields `tiers.fast`; non-header lines yield `None`.
fn table_header(line: &str) -> Option<&str> {
    let inner = line.strip_prefix('[')?.trim_start_matches('[');
    let end = inner.find(']')?;
    Some(inner[..end].trim())
}

fn assigns(line: &str, field: &str) -> bool {
    line.strip_prefix(field)
        .is_some_and(|rest| rest.trim_start().starts_with('='))
}

/// Closest key in `valid_keys` by Jaro-Winkler similarity, if any clears
/// the suggestion threshold.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    valid_keys
        .iter()
        .map(|key| (*key, strsim::jaro_winkler(unknown, key)))
        .filter(|(_, score)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(key, _)| key.to_string())
}

/// Writes every error to stderr as a miette report.
pub fn render_errors(errors: &[ConfigError]) {
    let handler = GraphicalReportHandler::new();
    let mut out = String::new();
    for error in errors {
        let before = out.len();
        if handler.render_report(&mut out, error).is_err() {
            out.truncate(before);
            out.push_str(&format!("Error: {error}\n"));
        }
    }
    eprint!("{out}");
}
