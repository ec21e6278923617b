//! Core alignment engine for video metadata streams.
//!
//! This crate contains the fundamental types and logic for:
//! - Normalization: turning heterogeneous metadata documents into sorted timed entries
//! - Label mapping: rewriting class labels through a literal/pattern table
//! - Cursors: tracking the active entry of every source during playback
//! - Merging: partitioning all sources into common segments, optionally deduplicated
//!
//! The crate performs no file I/O; documents arrive already deserialized.

pub mod config;
pub mod cursor;
pub mod document;
pub mod error;
pub mod intern;
pub mod label_map;
mod merge;
pub mod normalize;
pub mod source;
pub mod source_kind;
pub mod time;
pub mod types;

pub use config::AlignConfig;
pub use cursor::{Cursor, CursorState, Slot, SlotState, Timeline};
pub use document::MergedDocument;
pub use error::{MappingError, MergeError, ParseError};
pub use intern::{RefLink, ReferenceInterner, ReferenceTable};
pub use label_map::LabelMapper;
pub use merge::{EntryRef, MergeOptions, MergedSegment, MergedTimeline, merge};
pub use normalize::{SourceInput, normalize, normalize_all};
pub use source::{Source, TimedEntry};
pub use source_kind::{SourceKind, UnknownSourceKind};
pub use types::{RefId, SourceId, ValidationError};
