//! Error types of the alignment engine.

use thiserror::Error;

use crate::source_kind::SourceKind;

/// A source document could not be normalized.
///
/// The caller treats the whole source as absent; sibling sources are unaffected.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    /// A field required to place or describe an entry is missing or has the wrong type.
    #[error("missing required field `{field}`")]
    MissingField { field: String },

    /// A time value could not be interpreted.
    #[error("malformed timestamp `{value}`: {reason}")]
    MalformedTimestamp { value: String, reason: String },

    /// No known document shape matched.
    #[error("unrecognized {kind} document: {reason}")]
    UnrecognizedDocument { kind: SourceKind, reason: String },

    /// An entry ends before it starts.
    #[error("interval ends before it starts ({start_ms} > {end_ms})")]
    InvertedInterval { start_ms: f64, end_ms: f64 },

    /// A `$ref` link points outside the document.
    #[error("unresolved reference `{pointer}`")]
    UnresolvedReference { pointer: String },

    /// Wraps an error raised while reading one entry.
    #[error("entry {index}: {source}")]
    InEntry {
        index: usize,
        #[source]
        source: Box<ParseError>,
    },
}

impl ParseError {
    pub(crate) fn missing(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    pub(crate) fn timestamp(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedTimestamp {
            value: value.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn unrecognized(kind: SourceKind, reason: impl Into<String>) -> Self {
        Self::UnrecognizedDocument {
            kind,
            reason: reason.into(),
        }
    }

    pub(crate) fn in_entry(self, index: usize) -> Self {
        Self::InEntry {
            index,
            source: Box::new(self),
        }
    }
}

/// The offline merge could not run.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MergeError {
    /// Every supplied source is empty, or none was supplied.
    #[error("no metadata provided, nothing to merge")]
    NoSources,
}

/// A label mapping table could not be loaded.
#[derive(Debug, Error)]
pub enum MappingError {
    /// The mapping document is not a flat object.
    #[error("label mapping must be an object of label pairs")]
    NotAMapping,

    /// A mapping value is not a string.
    #[error("label mapping value for `{key}` must be a string")]
    NonStringValue { key: String },

    /// A pattern entry failed to compile.
    #[error("invalid label pattern `{pattern}`")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}
