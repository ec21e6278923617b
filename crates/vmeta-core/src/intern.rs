//! Deduplication of entry payloads behind stable reference identifiers.
//!
//! Entries have no natural key, so identity is their position: the source they belong to and
//! their index within it. Interning the same position twice yields the same link. Nested
//! same-document links (`{"$ref": "#/actors/0"}`) found in a payload are interned as well, into a
//! section named after the pointer's first segment, so a shared record is stored once no matter
//! how many entries point to it.

use std::collections::{BTreeMap, HashMap};

use serde::{Serialize, Serializer, ser::SerializeMap};
use serde_json::{Map, Value, json};

use crate::source::{Source, TimedEntry, link_pointer};
use crate::types::RefId;

/// Nesting limit when inlining links, guarding against link cycles.
const MAX_INLINE_DEPTH: usize = 16;

/// A link to a record of the reference table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RefLink {
    pub section: String,
    pub id: RefId,
}

impl RefLink {
    /// Pointer to the record within the merged document.
    pub fn pointer(&self) -> String {
        format!("#/references/{}/{}", self.section, self.id)
    }

    pub fn to_value(&self) -> Value {
        json!({ "$ref": self.pointer() })
    }
}

impl Serialize for RefLink {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry("$ref", &self.pointer())?;
        map.end()
    }
}

/// Records keyed by section, then identifier in assignment order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ReferenceTable {
    sections: BTreeMap<String, Map<String, Value>>,
}

impl ReferenceTable {
    pub fn get(&self, link: &RefLink) -> Option<&Value> {
        self.sections.get(&link.section)?.get(link.id.as_str())
    }

    /// Looks up a `#/references/<section>/<id>` pointer.
    pub fn resolve(&self, pointer: &str) -> Option<&Value> {
        let rest = pointer.strip_prefix("#/references/")?;
        let (section, id) = rest.split_once('/')?;
        self.sections.get(section)?.get(id)
    }

    pub fn section(&self, name: &str) -> Option<&Map<String, Value>> {
        self.sections.get(name)
    }

    /// Total number of records across sections.
    pub fn len(&self) -> usize {
        self.sections.values().map(Map::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.values().all(Map::is_empty)
    }

    fn insert(&mut self, link: &RefLink, value: Value) {
        self.sections
            .entry(link.section.clone())
            .or_default()
            .insert(link.id.to_string(), value);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum RefKey {
    Entry { source: usize, index: usize },
    Link { source: usize, pointer: String },
}

/// Assigns identifiers to entries and linked records, building the reference table.
///
/// `source` positions passed to the interner must refer to one fixed list of sources.
#[derive(Debug, Default)]
pub struct ReferenceInterner {
    ids: HashMap<RefKey, RefLink>,
    counters: HashMap<String, usize>,
    table: ReferenceTable,
}

impl ReferenceInterner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns entry `index` of `source`, found at `position` in the source list.
    pub fn intern_entry(&mut self, position: usize, source: &Source, index: usize) -> RefLink {
        let key = RefKey::Entry {
            source: position,
            index,
        };
        self.intern_with(key, source.kind.as_str(), source.kind.code(), |interner| {
            let mut record = source
                .entries
                .get(index)
                .map_or(Value::Null, TimedEntry::record);
            interner.rewrite_links(position, source, &mut record);
            record
        })
    }

    /// Interns the linked record `pointer` of `source`. `None` if the source has no such link.
    pub fn intern_link(
        &mut self,
        position: usize,
        source: &Source,
        pointer: &str,
    ) -> Option<RefLink> {
        let record = source.resolve_link(pointer)?;
        let section = link_section(pointer);
        let key = RefKey::Link {
            source: position,
            pointer: pointer.to_string(),
        };
        Some(self.intern_with(key, &section, &section, |interner| {
            let mut record = record.clone();
            interner.rewrite_links(position, source, &mut record);
            record
        }))
    }

    pub fn into_table(self) -> ReferenceTable {
        self.table
    }

    fn intern_with<F>(&mut self, key: RefKey, section: &str, prefix: &str, build: F) -> RefLink
    where
        F: FnOnce(&mut Self) -> Value,
    {
        if let Some(link) = self.ids.get(&key) {
            return link.clone();
        }

        let counter = self.counters.entry(section.to_string()).or_insert(0);
        *counter += 1;
        let link = RefLink {
            section: section.to_string(),
            id: RefId::numbered(prefix, *counter),
        };
        // registered before building so link cycles resolve to this record
        self.ids.insert(key, link.clone());
        self.table.insert(&link, Value::Null);

        let value = build(self);
        self.table.insert(&link, value);
        link
    }

    fn rewrite_links(&mut self, position: usize, source: &Source, value: &mut Value) {
        if let Some(pointer) = link_pointer(value).map(str::to_string) {
            match self.intern_link(position, source, &pointer) {
                Some(link) => *value = link.to_value(),
                None => tracing::debug!(pointer, "leaving unknown link in place"),
            }
            return;
        }
        match value {
            Value::Array(items) => {
                for item in items {
                    self.rewrite_links(position, source, item);
                }
            }
            Value::Object(map) => {
                for item in map.values_mut() {
                    self.rewrite_links(position, source, item);
                }
            }
            _ => {}
        }
    }
}

/// Replaces same-document links in `value` by copies of their records.
pub fn inline_links(source: &Source, value: &mut Value) {
    inline_at_depth(source, value, 0);
}

fn inline_at_depth(source: &Source, value: &mut Value, depth: usize) {
    if let Some(pointer) = link_pointer(value) {
        if depth >= MAX_INLINE_DEPTH {
            tracing::debug!(pointer, "link nesting too deep, left as is");
            return;
        }
        if let Some(record) = source.resolve_link(pointer) {
            *value = record.clone();
            inline_at_depth(source, value, depth + 1);
        }
        return;
    }
    match value {
        Value::Array(items) => {
            for item in items {
                inline_at_depth(source, item, depth);
            }
        }
        Value::Object(map) => {
            for item in map.values_mut() {
                inline_at_depth(source, item, depth);
            }
        }
        _ => {}
    }
}

/// Reference section for a `#/...` pointer: its first segment, unescaped.
fn link_section(pointer: &str) -> String {
    let first = pointer
        .trim_start_matches("#/")
        .split('/')
        .next()
        .unwrap_or_default();
    if first.is_empty() {
        return "links".to_string();
    }
    first.replace("~1", "/").replace("~0", "~")
}
