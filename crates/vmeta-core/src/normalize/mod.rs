//! Interval normalization of raw source documents.
//!
//! Each source kind has its own parser turning an already-deserialized document into
//! canonical [`TimedEntry`] values. This module applies what every kind shares: rounding,
//! interval validation, ordering, provenance details and same-document link collection.

mod sentences;
mod text_annotation;
mod text_inference;
mod video_description;
mod video_inference;

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde_json::{Map, Value};

use crate::config::AlignConfig;
use crate::error::ParseError;
use crate::label_map::LabelMapper;
use crate::source::{Source, TimedEntry, link_pointer};
use crate::source_kind::SourceKind;
use crate::time;
use crate::types::SourceId;

pub use sentences::{reconcile_groups, split_sentences};
pub use text_annotation::{AnnotatedSentence, TextSchema, Token};

/// A raw document tagged with the source it should become.
#[derive(Debug, Clone)]
pub struct SourceInput {
    pub id: SourceId,
    pub kind: SourceKind,
    pub document: Value,
}

impl SourceInput {
    pub const fn new(id: SourceId, kind: SourceKind, document: Value) -> Self {
        Self { id, kind, document }
    }
}

/// Output of a kind-specific parser, before the shared post-processing.
struct Parsed {
    title: Option<String>,
    multi_region: bool,
    entries: Vec<TimedEntry>,
    details: Value,
}

/// Settings handed to kind-specific parsers.
struct Context<'a> {
    kind: SourceKind,
    precision: u32,
    frame_rate: Option<f64>,
    mapper: Option<&'a LabelMapper>,
}

impl Context<'_> {
    /// Rounded, validated bounds of one raw entry.
    fn bounds(&self, entry: &Map<String, Value>) -> Result<(f64, f64), ParseError> {
        let (start, end) = time::entry_bounds(entry, self.frame_rate)?;
        let start = time::round_to(start, self.precision);
        let end = time::round_to(end, self.precision);
        if end < start {
            return Err(ParseError::InvertedInterval {
                start_ms: start,
                end_ms: end,
            });
        }
        Ok((start, end))
    }

    fn map_label(&self, label: &str) -> String {
        self.mapper
            .map_or_else(|| label.to_string(), |mapper| mapper.map(label))
    }

    fn map_labels(&self, labels: &mut Value) {
        if let Some(mapper) = self.mapper {
            mapper.map_labels(labels);
        }
    }

    /// The raw entry as an object, or an error naming the entry.
    fn entry_object<'v>(&self, raw: &'v Value) -> Result<&'v Map<String, Value>, ParseError> {
        raw.as_object()
            .ok_or_else(|| ParseError::unrecognized(self.kind, "entries must be objects"))
    }
}

/// Normalizes one document into a canonical source.
pub fn normalize(
    input: &SourceInput,
    config: &AlignConfig,
    mapper: Option<&LabelMapper>,
) -> Result<Source, ParseError> {
    let document = &input.document;
    if !document.is_object() {
        return Err(ParseError::unrecognized(input.kind, "expected an object"));
    }

    let ctx = Context {
        kind: input.kind,
        precision: config.precision,
        frame_rate: document
            .get("fps")
            .and_then(Value::as_f64)
            .or(config.frame_rate),
        mapper,
    };

    let parsed = match input.kind {
        SourceKind::VideoDescription => video_description::parse(document, &ctx)?,
        SourceKind::VideoInference => video_inference::parse(document, &ctx)?,
        SourceKind::TextAnnotation => text_annotation::parse(document, &ctx)?,
        SourceKind::TextInference => text_inference::parse(document, &ctx)?,
    };

    let mut entries = parsed.entries;
    entries.sort_by(|a, b| a.start_ms.total_cmp(&b.start_ms));
    let links = collect_links(document, &entries)?;

    tracing::debug!(
        source = %input.id,
        kind = %input.kind,
        entries = entries.len(),
        links = links.len(),
        "normalized source"
    );

    Ok(Source {
        id: input.id.clone(),
        kind: input.kind,
        title: parsed.title,
        multi_region: parsed.multi_region,
        entries,
        details: parsed.details,
        links,
    })
}

/// Normalizes every input in parallel.
///
/// A document that fails to parse is logged and replaced by an absent (empty) source, so
/// the output always lines up with `inputs`.
pub fn normalize_all(
    inputs: &[SourceInput],
    config: &AlignConfig,
    mapper: Option<&LabelMapper>,
) -> Vec<Source> {
    inputs
        .par_iter()
        .map(|input| match normalize(input, config, mapper) {
            Ok(source) => source,
            Err(e) => {
                tracing::warn!(source = %input.id, kind = %input.kind, error = %e, "skipping invalid metadata source");
                Source::absent(input.id.clone(), input.kind)
            }
        })
        .collect()
}

/// Clones `document` without its bulk entry lists.
fn strip_keys(document: &Value, keys: &[&str]) -> Value {
    match document {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(k, _)| !keys.contains(&k.as_str()))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Resolves every `{"$ref": "#/..."}` reachable from the payloads against the document.
fn collect_links(
    document: &Value,
    entries: &[TimedEntry],
) -> Result<BTreeMap<String, Value>, ParseError> {
    let mut links = BTreeMap::new();
    let mut pending: Vec<&Value> = entries.iter().map(|e| &e.payload).collect();

    while let Some(value) = pending.pop() {
        if let Some(pointer) = link_pointer(value) {
            if links.contains_key(pointer) {
                continue;
            }
            let target = document.pointer(&pointer[1..]).ok_or_else(|| {
                ParseError::UnresolvedReference {
                    pointer: pointer.to_string(),
                }
            })?;
            links.insert(pointer.to_string(), target.clone());
            pending.push(target);
            continue;
        }
        match value {
            Value::Array(items) => pending.extend(items),
            Value::Object(map) => pending.extend(map.values()),
            _ => {}
        }
    }

    Ok(links)
}
