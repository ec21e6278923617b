//! Canonical timed entries and the sources that own them.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::source_kind::SourceKind;
use crate::types::SourceId;

/// One timestamped record of a source, covering `[start_ms, end_ms)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimedEntry {
    pub start_ms: f64,
    pub end_ms: f64,
    /// The entry content, opaque to the engine.
    pub payload: Value,
}

impl TimedEntry {
    pub const fn new(start_ms: f64, end_ms: f64, payload: Value) -> Self {
        Self {
            start_ms,
            end_ms,
            payload,
        }
    }

    /// The payload as a standalone record: an object payload gains this entry's
    /// `start_ms`/`end_ms` in front of its own keys, anything else is returned as is.
    #[must_use]
    pub fn record(&self) -> Value {
        let Value::Object(payload) = &self.payload else {
            return self.payload.clone();
        };
        let mut record = Map::with_capacity(payload.len() + 2);
        record.insert("start_ms".to_string(), json!(self.start_ms));
        record.insert("end_ms".to_string(), json!(self.end_ms));
        for (key, value) in payload {
            if key != "start_ms" && key != "end_ms" {
                record.insert(key.clone(), value.clone());
            }
        }
        Value::Object(record)
    }

    /// Sub-entries of a multi-region entry, sharing this entry's span.
    #[must_use]
    pub fn regions(&self) -> &[Value] {
        self.payload
            .get("regions")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// An ordered, named stream of timed entries.
///
/// Entries are sorted ascending by `start_ms` and immutable once normalized.
#[derive(Debug, Clone)]
pub struct Source {
    pub id: SourceId,
    pub kind: SourceKind,
    /// Human readable title found in the document, if any.
    pub title: Option<String>,
    /// Entries carry a nested `regions` list each.
    pub multi_region: bool,
    pub entries: Vec<TimedEntry>,
    /// Provenance: the document without its bulk entry list.
    pub details: Value,
    /// Same-document records referenced from payloads, keyed by JSON pointer (`#/...`).
    pub links: BTreeMap<String, Value>,
}

impl Source {
    /// Creates a source with no entries, standing in for a missing or failed document.
    pub fn absent(id: SourceId, kind: SourceKind) -> Self {
        Self {
            id,
            kind,
            title: None,
            multi_region: false,
            entries: Vec::new(),
            details: Value::Null,
            links: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Start of the first entry.
    pub fn first_start(&self) -> Option<f64> {
        self.entries.first().map(|e| e.start_ms)
    }

    /// End of the last entry.
    pub fn last_end(&self) -> Option<f64> {
        self.entries.last().map(|e| e.end_ms)
    }

    /// Looks up a linked record by its `#/...` pointer.
    pub fn resolve_link(&self, pointer: &str) -> Option<&Value> {
        self.links.get(pointer)
    }
}

/// Returns the `$ref` pointer if `value` is a same-document link object.
pub(crate) fn link_pointer(value: &Value) -> Option<&str> {
    let obj = value.as_object()?;
    if obj.len() != 1 {
        return None;
    }
    obj.get("$ref")
        .and_then(Value::as_str)
        .filter(|p| p.starts_with("#/"))
}
