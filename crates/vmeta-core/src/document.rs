//! The persisted form of a merge: one document holding provenance, segments and references.

use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::intern::ReferenceTable;
use crate::label_map::LabelMapper;
use crate::merge::{EntryRef, MergedTimeline};
use crate::source::Source;
use crate::source_kind::SourceKind;

/// Merged output document.
///
/// Keys of `details` and of every segment are source kind names. Kinds allowing several
/// sources hold a list with one item per source.
#[derive(Debug, Clone, Serialize)]
pub struct MergedDocument {
    pub details: Map<String, Value>,
    pub merged: Vec<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub references: Option<ReferenceTable>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mapping: Option<Value>,
}

/// Source positions grouped by kind, in display order.
struct Layout {
    groups: Vec<(SourceKind, Vec<usize>)>,
}

impl Layout {
    fn new(sources: &[Source]) -> Self {
        let groups = SourceKind::ALL
            .iter()
            .filter_map(|&kind| {
                let positions: Vec<usize> = sources
                    .iter()
                    .enumerate()
                    .filter(|(_, s)| s.kind == kind)
                    .map(|(i, _)| i)
                    .collect();
                (!positions.is_empty()).then_some((kind, positions))
            })
            .collect();
        Self { groups }
    }

    /// Collapses per-source values into one value per kind.
    fn collect<F>(&self, mut value_of: F) -> Map<String, Value>
    where
        F: FnMut(usize) -> Value,
    {
        let mut map = Map::new();
        for (kind, positions) in &self.groups {
            let value = if kind.allows_multiple() || positions.len() > 1 {
                Value::Array(positions.iter().map(|&i| value_of(i)).collect())
            } else {
                value_of(positions[0])
            };
            map.insert(kind.as_str().to_string(), value);
        }
        map
    }
}

impl MergedDocument {
    /// Builds the document of `timeline`, merged from `sources`.
    pub fn build(
        sources: &[Source],
        timeline: MergedTimeline,
        mapper: Option<&LabelMapper>,
    ) -> Self {
        let layout = Layout::new(sources);

        let mut details = layout.collect(|i| sources[i].details.clone());
        details.insert("start_ms".to_string(), json!(timeline.start_ms));
        details.insert("end_ms".to_string(), json!(timeline.end_ms));
        details.insert("total_merged".to_string(), json!(timeline.segments.len()));
        for (key, count) in layout.collect(|i| json!(sources[i].len())) {
            details.insert(format!("total_{key}"), count);
        }

        let merged = timeline
            .segments
            .into_iter()
            .map(|segment| {
                let mut slots = segment.per_source;
                let mut row = Map::new();
                row.insert("start_ms".to_string(), json!(segment.start_ms));
                row.insert("end_ms".to_string(), json!(segment.end_ms));
                row.extend(layout.collect(|i| {
                    match slots.get_mut(i).and_then(Option::take) {
                        Some(EntryRef::Inline(value)) => value,
                        Some(EntryRef::Link(link)) => link.to_value(),
                        None => Value::Null,
                    }
                }));
                row
            })
            .collect();

        Self {
            details,
            merged,
            references: timeline.references,
            mapping: mapper.filter(|m| !m.is_empty()).map(LabelMapper::to_document),
        }
    }
}
