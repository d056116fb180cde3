use serde::Serialize;
use thiserror::Error;

use crate::section::RegionKind;

/// Fatal, document-scoped failure of a reconstruction. Nothing is emitted for
/// a document that hits one of these.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FileError {
    #[error("no translated text available for section `{key}`")]
    MissingTranslation { key: String },

    #[error("translation of section `{key}` failed: {message}")]
    Translation { key: String, message: String },

    #[error("no prior translation could be located for unchanged section `{key}`")]
    UnresolvedSection { key: String },

    #[error("translated text for section `{key}` is invalid: {reason}")]
    Validation { key: String, reason: String },
}

impl FileError {
    pub fn key(&self) -> &str {
        match self {
            Self::MissingTranslation { key }
            | Self::Translation { key, .. }
            | Self::UnresolvedSection { key }
            | Self::Validation { key, .. } => key,
        }
    }
}

/// Structural oddity found while parsing. Parsing always completes.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ParseWarning {
    #[error("unclosed {kind} opened on line {line} runs to the end of the document")]
    UnclosedRegion { kind: RegionKind, line: usize },
}

/// A prior target section was located by a fallback rule.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MatchWarning {
    #[error("section `{key}` matched by position {position}; heading-map lookup failed")]
    PositionFallback { key: String, position: usize },

    #[error("no target heading found for `{key}`; recorded the source heading instead")]
    SourceHeadingFallback { key: String },

    #[error("unchanged preamble has no counterpart in the target document")]
    MissingPreamble,
}

/// Failure reported by a translation collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TranslationError {
    pub message: String,
}

impl TranslationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_warning_serializes_with_type_tag() {
        let warning = ParseWarning::UnclosedRegion {
            kind: RegionKind::Fence,
            line: 4,
        };
        let value = serde_json::to_value(&warning).unwrap();

        assert_eq!(
            value,
            serde_json::json!({"type": "unclosed_region", "kind": "fence", "line": 4})
        );
    }

    #[test]
    fn file_error_serializes_key_and_reason() {
        let error = FileError::Validation {
            key: "setup/install".to_string(),
            reason: "unclosed code fence opened on line 3".to_string(),
        };
        let value = serde_json::to_value(&error).unwrap();

        assert_eq!(value["type"], "validation");
        assert_eq!(value["key"], "setup/install");
        assert_eq!(error.key(), "setup/install");
    }
}
