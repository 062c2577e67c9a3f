//! Placeholder maps and the two substitution strategies.
//!
//! Tokens are plain substrings chosen by the template author (`{{name}}`,
//! `%TOTAL%`, anything). There is no escaping and no pattern syntax.

use std::collections::HashMap;
use std::path::Path;

use serde_json::Value;

use crate::error::ComposeError;

/// How [`substitute_placeholders_with`] applies a [`PlaceholderMap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Substitution {
    /// One left-to-right scan. At each position the longest matching token is
    /// replaced and the scan continues after it; inserted values are never
    /// scanned again.
    #[default]
    SinglePass,
    /// Entries are applied one after another, each replacing every occurrence
    /// in the whole document. A value that contains a later token gets
    /// replaced again. Only useful for byte-for-byte parity with templates
    /// written against that behaviour.
    Cascading,
}

/// Ordered token → replacement map.
///
/// Re-inserting a token overwrites its value but keeps its position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaceholderMap {
    entries: Vec<(String, String)>,
}

impl PlaceholderMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a token.
    pub fn insert(&mut self, token: impl Into<String>, value: impl Into<String>) {
        let token = token.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(t, _)| *t == token) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((token, value)),
        }
    }

    /// Insert a possibly absent value; `None` becomes the empty string.
    pub fn insert_opt(&mut self, token: impl Into<String>, value: Option<&str>) {
        self.insert(token, value.unwrap_or_default());
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, token: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(token, value);
        self
    }

    pub fn get(&self, token: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(t, _)| t == token)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(t, v)| (t.as_str(), v.as_str()))
    }

    /// Parse a JSON object of `token: value` pairs.
    ///
    /// Strings are taken as-is, numbers and booleans are formatted, `null`
    /// becomes the empty string. Document order is kept.
    pub fn from_json(json: &str) -> Result<Self, ComposeError> {
        let value: Value = serde_json::from_str(json)?;
        let object = match value {
            Value::Object(object) => object,
            other => {
                return Err(ComposeError::InvalidData(format!(
                    "expected a JSON object, got {}",
                    json_kind(&other)
                )))
            }
        };

        let mut map = Self::new();
        for (token, value) in object {
            let replacement = match value {
                Value::Null => String::new(),
                Value::String(s) => s,
                Value::Bool(b) => b.to_string(),
                Value::Number(n) => n.to_string(),
                other => {
                    return Err(ComposeError::InvalidData(format!(
                        "value for {token:?} must be a string, number, boolean or null, got {}",
                        json_kind(&other)
                    )))
                }
            };
            map.insert(token, replacement);
        }
        Ok(map)
    }

    /// Read and parse a JSON placeholder file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ComposeError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PlaceholderMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (token, value) in iter {
            map.insert(token, value);
        }
        map
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for PlaceholderMap {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (token, value) in iter {
            self.insert(token, value);
        }
    }
}

impl From<HashMap<String, String>> for PlaceholderMap {
    fn from(map: HashMap<String, String>) -> Self {
        map.into_iter().collect()
    }
}

impl From<HashMap<String, Option<String>>> for PlaceholderMap {
    fn from(map: HashMap<String, Option<String>>) -> Self {
        map.into_iter()
            .map(|(token, value)| (token, value.unwrap_or_default()))
            .collect()
    }
}

/// Replace every token of `map` in `html` with a single-pass scan.
pub fn substitute_placeholders(html: &str, map: &PlaceholderMap) -> String {
    substitute_placeholders_with(html, map, Substitution::SinglePass)
}

/// Replace every token of `map` in `html` with the given strategy.
///
/// Empty tokens are skipped.
pub fn substitute_placeholders_with(
    html: &str,
    map: &PlaceholderMap,
    strategy: Substitution,
) -> String {
    if map.iter().any(|(token, _)| token.is_empty()) {
        log::warn!("Ignoring empty placeholder token");
    }

    match strategy {
        Substitution::SinglePass => single_pass(html, map),
        Substitution::Cascading => cascading(html, map),
    }
}

fn single_pass(html: &str, map: &PlaceholderMap) -> String {
    // Longest tokens first so the first hit at a position is the longest one.
    let mut tokens: Vec<(&str, &str)> = map.iter().filter(|(t, _)| !t.is_empty()).collect();
    if tokens.is_empty() {
        return html.to_string();
    }
    tokens.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

    let mut out = String::with_capacity(html.len());
    let mut rest = html;
    while let Some(c) = rest.chars().next() {
        match tokens.iter().find(|(token, _)| rest.starts_with(token)) {
            Some((token, value)) => {
                out.push_str(value);
                rest = &rest[token.len()..];
            }
            None => {
                out.push(c);
                rest = &rest[c.len_utf8()..];
            }
        }
    }
    out
}

fn cascading(html: &str, map: &PlaceholderMap) -> String {
    map.iter()
        .filter(|(token, _)| !token.is_empty())
        .fold(html.to_string(), |acc, (token, value)| {
            acc.replace(token, value)
        })
}
