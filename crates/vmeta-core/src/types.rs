//! Identifier newtypes with validation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },
}

/// Generates a validated string ID newtype with common trait implementations.
macro_rules! define_string_id {
    (
        $(#[$meta:meta])*
        $name:ident, $field_name:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new ID after validation.
            pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
                let id = id.into();
                if id.is_empty() {
                    return Err(ValidationError::Empty { field: $field_name });
                }
                Ok(Self(id))
            }

            /// Returns the ID as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_string_id!(
    /// A validated source identifier.
    ///
    /// Source IDs name one metadata stream within a run (e.g. `video_description`,
    /// `video_inference_1`). They must be non-empty.
    SourceId, "source ID"
);

define_string_id!(
    /// Identifier of a record in a reference table.
    ///
    /// Assigned by the interner as `<section code>-<n>`.
    RefId, "reference ID"
);

impl RefId {
    /// Builds the `n`-th identifier of a section, e.g. `vd-3`.
    pub(crate) fn numbered(prefix: &str, n: usize) -> Self {
        Self(format!("{prefix}-{n}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_id_rejects_empty() {
        assert!(SourceId::new("").is_err());
        assert!(SourceId::new("video_description").is_ok());
    }

    #[test]
    fn ref_id_rejects_empty() {
        let err = RefId::new("").unwrap_err();
        assert_eq!(err.to_string(), "reference ID cannot be empty");
    }

    #[test]
    fn source_id_serializes_as_plain_string() {
        let id = SourceId::new("text_annotation").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"text_annotation\"");
        let parsed: SourceId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn source_id_serde_rejects_empty() {
        let result: Result<SourceId, _> = serde_json::from_str("\"\"");
        assert!(result.is_err());
    }
}
