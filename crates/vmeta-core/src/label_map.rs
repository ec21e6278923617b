//! Classification label substitution.
//!
//! A mapping table replaces labels by exact match first. Entries that look like
//! patterns (escapes, or `.*`/`.+`/`.?` in the key) are also compiled as anchored
//! regular expressions and tried in table order when no literal key matches.
//!
//! ```yaml
//! # literal replacement
//! "carry/hold (an object)": "carry/hold"
//! # pattern replacement, `\1` refers to the first group
//! "(.+) \\(an object\\)": "\\1 <something>"
//! ```

use std::collections::HashMap;

use regex::Regex;
use serde_json::{Map, Value};

use crate::error::MappingError;

/// Literal and pattern label substitutions.
#[derive(Debug, Clone, Default)]
pub struct LabelMapper {
    table: Vec<(String, String)>,
    literal: HashMap<String, String>,
    patterns: Vec<(Regex, String)>,
}

impl LabelMapper {
    /// Builds a mapper from `(old, new)` pairs in definition order.
    pub fn new<I>(pairs: I) -> Result<Self, MappingError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let table: Vec<(String, String)> = pairs.into_iter().collect();
        let literal = table.iter().cloned().collect();

        let mut patterns = Vec::new();
        for (key, value) in table.iter().filter(|(k, v)| is_pattern(k, v)) {
            let anchored = anchor(key);
            let regex = Regex::new(&anchored).map_err(|source| MappingError::InvalidPattern {
                pattern: key.clone(),
                source,
            })?;
            patterns.push((regex, replacement(value)));
        }

        tracing::debug!(
            literals = table.len(),
            patterns = patterns.len(),
            "label mapping loaded"
        );

        Ok(Self {
            table,
            literal,
            patterns,
        })
    }

    /// Builds a mapper from an already-parsed mapping document (a flat object).
    pub fn from_document(document: &Value) -> Result<Self, MappingError> {
        let obj = document.as_object().ok_or(MappingError::NotAMapping)?;
        let pairs = obj
            .iter()
            .map(|(key, value)| {
                value
                    .as_str()
                    .map(|v| (key.clone(), v.to_string()))
                    .ok_or_else(|| MappingError::NonStringValue { key: key.clone() })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(pairs)
    }

    /// Maps a label, returning it unchanged when nothing applies.
    #[must_use]
    pub fn map(&self, label: &str) -> String {
        if let Some(mapped) = self.literal.get(label) {
            return mapped.clone();
        }
        for (regex, replace) in &self.patterns {
            let mapped = regex.replace(label, replace.as_str());
            if mapped != label {
                return mapped.into_owned();
            }
        }
        label.to_string()
    }

    /// Maps every string of a JSON array in place; other values are left alone.
    pub(crate) fn map_labels(&self, labels: &mut Value) {
        if self.is_empty() {
            return;
        }
        if let Some(items) = labels.as_array_mut() {
            for item in items {
                if let Some(label) = item.as_str() {
                    *item = Value::String(self.map(label));
                }
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// The mapping table as an ordered document, for provenance in merged output.
    pub fn to_document(&self) -> Value {
        let map: Map<String, Value> = self
            .table
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        Value::Object(map)
    }
}

fn is_pattern(key: &str, value: &str) -> bool {
    key.contains('\\')
        || value.contains('\\')
        || [".*", ".+", ".?"].iter().any(|p| key.contains(p))
        || key.starts_with('^')
        || key.ends_with('$')
}

fn anchor(key: &str) -> String {
    let mut anchored = String::with_capacity(key.len() + 2);
    if !key.starts_with('^') {
        anchored.push('^');
    }
    anchored.push_str(key);
    if !key.ends_with('$') {
        anchored.push('$');
    }
    anchored
}

/// Converts a `\1` / `\g<name>` style replacement into `regex` syntax.
fn replacement(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '$' => out.push_str("$$"),
            '\\' => match chars.peek().copied() {
                Some(d) if d.is_ascii_digit() => {
                    let mut group = String::new();
                    while let Some(d) = chars.peek().copied().filter(char::is_ascii_digit) {
                        group.push(d);
                        chars.next();
                    }
                    out.push_str("${");
                    out.push_str(&group);
                    out.push('}');
                }
                Some('g') => {
                    chars.next();
                    if chars.peek() == Some(&'<') {
                        chars.next();
                        let name: String = chars.by_ref().take_while(|c| *c != '>').collect();
                        out.push_str("${");
                        out.push_str(&name);
                        out.push('}');
                    } else {
                        out.push('g');
                    }
                }
                Some('$') => {
                    chars.next();
                    out.push_str("$$");
                }
                Some(escaped) => {
                    chars.next();
                    out.push(escaped);
                }
                None => out.push('\\'),
            },
            other => out.push(other),
        }
    }
    out
}
