//! Error types for the kernel library.
//!
//! Nothing in here is fatal to the process: store errors are recovered or
//! logged, merge and wire errors drop a single event, and policy denials are
//! plain return values rather than errors.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by a key-value store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access store file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize value for key '{key}'")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors raised while applying a domain event to the document.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MergeError {
    #[error("skill category name must not be empty")]
    EmptyCategory,

    #[error("skill name must not be empty (category '{category}')")]
    EmptySkill { category: String },
}

/// Errors raised while decoding a wire-form event.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("unknown event '{0}'")]
    UnknownEvent(String),

    #[error("unknown action '{action}' for event '{event}'")]
    UnknownAction { event: String, action: String },

    #[error("missing field '{0}'")]
    MissingField(&'static str),

    #[error("malformed payload")]
    Payload(#[from] serde_json::Error),
}

/// Errors raised while constructing services.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("no tokio runtime available to drive the update queue")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn merge_error_messages_name_the_category() {
        let err = MergeError::EmptySkill {
            category: "Languages".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "skill name must not be empty (category 'Languages')"
        );
    }

    #[test]
    fn wire_error_wraps_json_errors() {
        let json_err = serde_json::from_str::<u64>("not a number").unwrap_err();
        let err: WireError = json_err.into();
        assert!(matches!(err, WireError::Payload(_)));
    }
}
