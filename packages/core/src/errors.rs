//! Error types for the drop pipeline

use crate::rules::RawDraggable;
use serde::Serialize;
use thiserror::Error;

/// Raised while building a [`crate::DragAndDrop`] module. Always fatal:
/// a malformed rule is never skipped.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("draggables should have contentTypePattern, tag and attr keys (got {draggable:?})")]
    IncompleteDraggable { draggable: RawDraggable },

    #[error("Invalid contentTypePattern {pattern:?}: {source}")]
    InvalidPattern {
        draggable: RawDraggable,
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

impl ConfigurationError {
    /// The raw descriptor that failed validation
    pub fn invalid_draggable(&self) -> &RawDraggable {
        match self {
            ConfigurationError::IncompleteDraggable { draggable } => draggable,
            ConfigurationError::InvalidPattern { draggable, .. } => draggable,
        }
    }
}

/// Failure of a single file while a drop is processed
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DropError {
    #[error("Failed to read {name}: {message}")]
    Read { name: String, message: String },

    #[error("Drop hook failed: {0}")]
    Hook(String),

    #[error("Host error: {0}")]
    Host(String),
}

impl DropError {
    pub fn read(name: impl Into<String>, message: impl ToString) -> Self {
        DropError::Read {
            name: name.into(),
            message: message.to_string(),
        }
    }
}

/// Failure of [`crate::DragAndDrop::install`]
#[derive(Error, Debug)]
pub enum InstallError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Failed to attach drop listener: {0}")]
    Attach(#[from] DropError),
}
