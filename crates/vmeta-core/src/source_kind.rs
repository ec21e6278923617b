//! Source kind enum as the single source of truth for metadata stream keys.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kinds of metadata streams aligned against the video timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceKind {
    /// Scene/segment descriptions written by annotators.
    VideoDescription,
    /// Action recognition predictions, optionally per region.
    VideoInference,
    /// Linguistic annotations (sentences and tokens) of the descriptions.
    TextAnnotation,
    /// Lexical inference mappings from lemmas to classes.
    TextInference,
}

impl SourceKind {
    /// All kinds, in document output order.
    pub const ALL: [Self; 4] = [
        Self::VideoDescription,
        Self::TextAnnotation,
        Self::VideoInference,
        Self::TextInference,
    ];

    /// Key used for this kind in documents.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::VideoDescription => "video_description",
            Self::VideoInference => "video_inference",
            Self::TextAnnotation => "text_annotation",
            Self::TextInference => "text_inference",
        }
    }

    /// Short code, used as the prefix of reference identifiers.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::VideoDescription => "vd",
            Self::VideoInference => "vi",
            Self::TextAnnotation => "ta",
            Self::TextInference => "ti",
        }
    }

    /// Whether several sources of this kind may be displayed side-by-side.
    ///
    /// Such kinds are always serialized as lists in merged documents.
    #[must_use]
    pub const fn allows_multiple(&self) -> bool {
        matches!(self, Self::VideoInference | Self::TextInference)
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = UnknownSourceKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "video_description" | "vd" => Ok(Self::VideoDescription),
            "video_inference" | "vi" => Ok(Self::VideoInference),
            "text_annotation" | "ta" => Ok(Self::TextAnnotation),
            "text_inference" | "ti" => Ok(Self::TextInference),
            _ => Err(UnknownSourceKind(s.to_string())),
        }
    }
}

impl Serialize for SourceKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SourceKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Error type for unknown source kind strings.
#[derive(Debug, Clone)]
pub struct UnknownSourceKind(String);

impl fmt::Display for UnknownSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown source kind: {}", self.0)
    }
}

impl std::error::Error for UnknownSourceKind {}
