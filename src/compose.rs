//! Template composer – fragment loading, concatenation, section injection,
//! HTML encoding and structural validation.
//!
//! Placeholder substitution lives in [`crate::placeholders`] and is
//! re-exported here so that the whole composer API is reachable from one
//! module.

use std::fs;
use std::io;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::StructuralError;

pub use crate::placeholders::{
    substitute_placeholders, substitute_placeholders_with, PlaceholderMap, Substitution,
};

static HTML_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<html[^>]*>").expect("valid <html> pattern"));
static BODY_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<body[^>]*>").expect("valid <body> pattern"));
static BODY_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</body>").expect("valid </body> pattern"));

/// Check that `html` is non-blank and carries `<html …>`, `<body …>` and
/// `</body>` (case-insensitive).
///
/// This is a presence check, not an HTML grammar check: anything else in the
/// document may be malformed.
pub fn validate(html: &str) -> Result<(), StructuralError> {
    if html.trim().is_empty() {
        return Err(StructuralError::Empty);
    }
    if !HTML_OPEN.is_match(html) {
        return Err(StructuralError::MissingHtml);
    }
    if !BODY_OPEN.is_match(html) {
        return Err(StructuralError::MissingBody);
    }
    if !BODY_CLOSE.is_match(html) {
        return Err(StructuralError::MissingBodyClose);
    }
    Ok(())
}

/// Escape text for use inside HTML markup or attribute values.
///
/// Escapes `& < > " '`, Latin-1 supplement characters (U+00A0–U+00FF) and
/// characters outside the Basic Multilingual Plane as numeric references.
/// `None` yields an empty string.
pub fn encode<'a>(text: impl Into<Option<&'a str>>) -> String {
    let Some(text) = text.into() else {
        return String::new();
    };

    let mut out = String::with_capacity(text.len() + text.len() / 8);
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '\u{A0}'..='\u{FF}' | '\u{10000}'..='\u{10FFFF}' => {
                out.push_str("&#");
                out.push_str(&(c as u32).to_string());
                out.push(';');
            }
            c => out.push(c),
        }
    }
    out
}

/// Resolve HTML character references.
///
/// Handles the named entities [`encode`] and common templates produce plus
/// decimal (`&#233;`) and hexadecimal (`&#xE9;`) references. Anything
/// unrecognised is copied through unchanged.
pub fn decode(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];

        // References are short, so only the next few bytes can hold the `;`.
        let window = &rest.as_bytes()[..rest.len().min(MAX_REFERENCE_LEN + 1)];
        let resolved = window
            .iter()
            .position(|&b| b == b';')
            .and_then(|semi| resolve_reference(&rest[1..semi]).map(|c| (c, semi)));

        match resolved {
            Some((c, semi)) => {
                out.push(c);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Longest reference recognised, `&` through `;` exclusive.
const MAX_REFERENCE_LEN: usize = 12;

fn resolve_reference(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{A0}'),
        _ => {
            let digits = name.strip_prefix('#')?;
            let code = match digits.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => digits.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

/// Read a fragment file as text.
///
/// A path that does not name a regular file (missing, a directory, or below
/// a file) is not an error and yields an empty string. Invalid UTF-8 is replaced rather than rejected.
pub fn load_fragment(path: impl AsRef<Path>) -> io::Result<String> {
    let path = path.as_ref();
    match fs::read(path) {
        Ok(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
        Err(_) if !path.is_file() => {
            log::debug!("Fragment {} not found, using empty text", path.display());
            Ok(String::new())
        }
        Err(e) => Err(e),
    }
}

/// Replace every occurrence of `token` in `template` with `fragment`.
///
/// A `None` fragment removes the token. An empty token leaves the template
/// untouched.
pub fn inject_fragment<'a>(
    template: &str,
    token: &str,
    fragment: impl Into<Option<&'a str>>,
) -> String {
    if token.is_empty() {
        log::warn!("Ignoring injection with an empty section token");
        return template.to_string();
    }
    template.replace(token, fragment.into().unwrap_or_default())
}

/// Join fragments in order, each followed by a line break.
pub fn concat_fragments<I, S>(fragments: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    fragments.into_iter().fold(String::new(), |mut acc, fragment| {
        acc.push_str(fragment.as_ref());
        acc.push('\n');
        acc
    })
}
