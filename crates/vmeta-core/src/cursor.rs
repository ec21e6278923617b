//! Online tracking of the active entry of each source during playback.
//!
//! A [`Cursor`] is an index into one source's entries with three states: not yet started,
//! active at an index, or exhausted. Playback drives it with [`Cursor::advance`] (monotonic,
//! one step per call) and [`Cursor::seek`] (random jump, the only backward move).
//!
//! Entries cover `[start_ms, end_ms)`, except the last entry of a source which stays active
//! up to and including its end. Between two entries the upcoming one is active.
//!
//! `advance` takes at most one step per call: it must be called at least once per entry
//! (e.g. once per displayed frame) or entries get skipped.

use serde_json::Value;

use crate::source::{Source, TimedEntry};

/// Placeholder for a source without data.
pub const NO_DATA_TEXT: &str = "<no-metadata>";
/// Placeholder for a source whose entries are all in the past.
pub const NO_MORE_TEXT: &str = "(metadata exhausted)";
/// Placeholder for a source whose first entry has not started yet.
pub const PENDING_TEXT: &str = "(metadata pending)";

/// Position of a cursor within its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    NotStarted,
    Active(usize),
    Exhausted,
}

/// Cursor over the entries of one non-empty source.
#[derive(Debug, Clone)]
pub struct Cursor {
    state: CursorState,
}

impl Cursor {
    /// Creates a cursor, or `None` for an empty source which never has one.
    pub fn new(entries: &[TimedEntry]) -> Option<Self> {
        (!entries.is_empty()).then_some(Self {
            state: CursorState::NotStarted,
        })
    }

    pub const fn state(&self) -> CursorState {
        self.state
    }

    /// Jumps to the entry applicable at `t`. Returns whether the state changed.
    pub fn seek(&mut self, entries: &[TimedEntry], t: f64) -> bool {
        let previous = self.state;
        // ends are ascending since entries are sorted and non-overlapping
        let index = entries.partition_point(|e| e.end_ms <= t);

        self.state = match entries.get(index) {
            Some(first) if index == 0 && t < first.start_ms => CursorState::NotStarted,
            Some(_) => CursorState::Active(index),
            None => match entries.last() {
                Some(last) if last.end_ms >= t => CursorState::Active(entries.len() - 1),
                _ => {
                    tracing::debug!(t, "seek beyond source range, cursor exhausted");
                    CursorState::Exhausted
                }
            },
        };
        previous != self.state
    }

    /// Moves forward by at most one entry for the new time `t`. Returns whether the state
    /// changed.
    pub fn advance(&mut self, entries: &[TimedEntry], t: f64) -> bool {
        let previous = self.state;
        self.state = match self.state {
            CursorState::NotStarted => match entries.first() {
                Some(first) if t >= first.start_ms => CursorState::Active(0),
                _ => CursorState::NotStarted,
            },
            CursorState::Active(i) => match entries.get(i) {
                Some(entry) if i + 1 == entries.len() => {
                    if t > entry.end_ms {
                        CursorState::Exhausted
                    } else {
                        CursorState::Active(i)
                    }
                }
                Some(entry) if t >= entry.end_ms => CursorState::Active(i + 1),
                Some(_) => CursorState::Active(i),
                None => CursorState::Exhausted,
            },
            CursorState::Exhausted => CursorState::Exhausted,
        };
        previous != self.state
    }

    /// The active entry, `None` unless the cursor is active.
    pub fn current<'e>(&self, entries: &'e [TimedEntry]) -> Option<&'e TimedEntry> {
        match self.state {
            CursorState::Active(i) => entries.get(i),
            CursorState::NotStarted | CursorState::Exhausted => None,
        }
    }
}

/// What a display slot shows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SlotState<'a> {
    /// Absent, empty or failed source.
    NoData,
    NotStarted,
    Exhausted,
    Entry {
        index: usize,
        entry: &'a TimedEntry,
        /// The region sub-entry, for multi-region sources.
        region: Option<&'a Value>,
    },
}

impl SlotState<'_> {
    /// Placeholder text for states without an entry.
    pub const fn placeholder(&self) -> Option<&'static str> {
        match self {
            Self::NoData => Some(NO_DATA_TEXT),
            Self::NotStarted => Some(PENDING_TEXT),
            Self::Exhausted => Some(NO_MORE_TEXT),
            Self::Entry { .. } => None,
        }
    }
}

/// One displayed column: a source, or one region of a multi-region source.
#[derive(Debug, Clone, Copy)]
pub struct Slot<'a> {
    pub source: &'a Source,
    pub region: Option<usize>,
    pub state: SlotState<'a>,
}

/// Sources and their cursors, driven together by the playback loop.
#[derive(Debug, Clone)]
pub struct Timeline {
    sources: Vec<Source>,
    cursors: Vec<Option<Cursor>>,
}

impl Timeline {
    pub fn new(sources: Vec<Source>) -> Self {
        let cursors = sources.iter().map(|s| Cursor::new(&s.entries)).collect();
        Self { sources, cursors }
    }

    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    /// Cursor state of the source at `index`, `None` for empty sources.
    pub fn state(&self, index: usize) -> Option<CursorState> {
        self.cursors.get(index)?.as_ref().map(Cursor::state)
    }

    /// Active entry of the source at `index`.
    pub fn current(&self, index: usize) -> Option<&TimedEntry> {
        let cursor = self.cursors.get(index)?.as_ref()?;
        cursor.current(&self.sources[index].entries)
    }

    /// Seeks every source to `t`. Returns whether anything displayed changed.
    pub fn seek(&mut self, t: f64) -> bool {
        tracing::debug!(t, "seek");
        self.each_cursor(|cursor, entries| cursor.seek(entries, t))
    }

    /// Advances every source to `t`. Returns whether anything displayed changed.
    pub fn advance(&mut self, t: f64) -> bool {
        self.each_cursor(|cursor, entries| cursor.advance(entries, t))
    }

    fn each_cursor<F>(&mut self, mut step: F) -> bool
    where
        F: FnMut(&mut Cursor, &[TimedEntry]) -> bool,
    {
        let mut changed = false;
        for (cursor, source) in self.cursors.iter_mut().zip(&self.sources) {
            if let Some(cursor) = cursor {
                changed |= step(cursor, &source.entries);
            }
        }
        changed
    }

    /// Flattened display view: one slot per source, or per region of the active entry of a
    /// multi-region source.
    pub fn slots(&self) -> Vec<Slot<'_>> {
        let mut slots = Vec::with_capacity(self.sources.len());
        for (source, cursor) in self.sources.iter().zip(&self.cursors) {
            let state = match cursor.as_ref().map(Cursor::state) {
                None => SlotState::NoData,
                Some(CursorState::NotStarted) => SlotState::NotStarted,
                Some(CursorState::Exhausted) => SlotState::Exhausted,
                Some(CursorState::Active(index)) => {
                    let entry = &source.entries[index];
                    let regions = entry.regions();
                    if source.multi_region && !regions.is_empty() {
                        slots.extend(regions.iter().enumerate().map(|(r, region)| Slot {
                            source,
                            region: Some(r),
                            state: SlotState::Entry {
                                index,
                                entry,
                                region: Some(region),
                            },
                        }));
                        continue;
                    }
                    SlotState::Entry {
                        index,
                        entry,
                        region: None,
                    }
                }
            };
            slots.push(Slot {
                source,
                region: None,
                state,
            });
        }
        slots
    }
}
