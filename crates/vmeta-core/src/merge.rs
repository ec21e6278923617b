//! Offline sweep merge of independently timed sources.
//!
//! Produces the coarsest common partition of the sources' time ranges: segment boundaries fall
//! exactly on entry boundaries, so within a segment every source's active entry is constant.
//!
//! # Algorithm Summary
//!
//! 1. Start the sweep at the earliest entry start over all sources.
//! 2. Skip, per source, every entry ending at or before the sweep time; a source whose entries
//!    are all skipped is done.
//! 3. The segment ends at the nearest upcoming boundary: the start of an entry not begun yet, or
//!    the end of an entry already running.
//! 4. Each source contributes its running entry, or nothing if its next entry starts later.
//! 5. Continue from the segment end until every source is done.
//!
//! Spans covered by no source at all still produce a segment, so segments are contiguous from
//! the first start to the last end. Boundaries are compared after rounding to the configured
//! precision; entries that round to zero length are skipped.

use serde::Serialize;
use serde_json::Value;

use crate::config::AlignConfig;
use crate::error::MergeError;
use crate::intern::{RefLink, ReferenceInterner, ReferenceTable, inline_links};
use crate::source::Source;

/// Options for the offline merge.
#[derive(Debug, Clone, Default)]
pub struct MergeOptions {
    /// Replace entry payloads by links into a shared reference table.
    /// Default: false.
    pub dedup: bool,
}

/// One source's contribution to a segment.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EntryRef {
    /// The entry record, with same-document links inlined.
    Inline(Value),
    /// A link into the reference table.
    Link(RefLink),
}

/// A span of time during which every source's active entry is constant.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedSegment {
    pub start_ms: f64,
    pub end_ms: f64,
    /// Contribution per source, in the order sources were given to [`merge`].
    pub per_source: Vec<Option<EntryRef>>,
}

/// Result of a merge.
#[derive(Debug, Clone)]
pub struct MergedTimeline {
    pub segments: Vec<MergedSegment>,

    /// Start of the earliest entry.
    pub start_ms: f64,

    /// End of the latest entry.
    pub end_ms: f64,

    /// Interned records, when merged with deduplication.
    pub references: Option<ReferenceTable>,
}

/// Merges sources into contiguous segments.
///
/// Sources must be normalized (sorted, non-overlapping entries). Empty sources take part and
/// contribute nothing.
///
/// # Errors
///
/// [`MergeError::NoSources`] when no source has any entry.
pub fn merge(
    sources: &[Source],
    options: &MergeOptions,
    config: &AlignConfig,
) -> Result<MergedTimeline, MergeError> {
    let first_start = sources
        .iter()
        .filter_map(Source::first_start)
        .reduce(f64::min)
        .ok_or(MergeError::NoSources)?;

    let mut cursors: Vec<Option<usize>> = sources
        .iter()
        .map(|s| (!s.is_empty()).then_some(0))
        .collect();
    let mut interner = options.dedup.then(ReferenceInterner::new);
    let mut segments = Vec::new();
    let start_ms = config.round(first_start);
    let mut last_time = start_ms;

    loop {
        for (cursor, source) in cursors.iter_mut().zip(sources) {
            if let Some(index) = cursor {
                while source
                    .entries
                    .get(*index)
                    .is_some_and(|e| config.round(e.end_ms) <= last_time)
                {
                    *index += 1;
                }
                if *index >= source.len() {
                    *cursor = None;
                }
            }
        }

        let Some(end_time) = cursors
            .iter()
            .zip(sources)
            .filter_map(|(cursor, source)| source.entries.get((*cursor)?))
            .map(|e| {
                let start = config.round(e.start_ms);
                if start > last_time {
                    start
                } else {
                    config.round(e.end_ms)
                }
            })
            .reduce(f64::min)
        else {
            break;
        };

        let per_source = cursors
            .iter()
            .zip(sources)
            .enumerate()
            .map(|(position, (cursor, source))| {
                let index = (*cursor)?;
                let entry = source.entries.get(index)?;
                if config.round(entry.start_ms) > last_time {
                    return None;
                }
                Some(match interner.as_mut() {
                    Some(interner) => EntryRef::Link(interner.intern_entry(position, source, index)),
                    None => {
                        let mut record = entry.record();
                        inline_links(source, &mut record);
                        EntryRef::Inline(record)
                    }
                })
            })
            .collect();

        segments.push(MergedSegment {
            start_ms: last_time,
            end_ms: end_time,
            per_source,
        });
        last_time = end_time;
    }

    let references = interner.map(ReferenceInterner::into_table);
    tracing::debug!(
        sources = sources.len(),
        segments = segments.len(),
        references = references.as_ref().map_or(0, ReferenceTable::len),
        "merged sources"
    );

    Ok(MergedTimeline {
        segments,
        start_ms,
        end_ms: last_time,
        references,
    })
}
