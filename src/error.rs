//! Error types for ui5-yaml-edit

use std::path::PathBuf;

/// Errors that can occur when working with UI5 YAML documents
#[derive(Debug, thiserror::Error)]
pub enum YamlError {
    /// The configuration file to update does not exist
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// I/O error when reading or writing files
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The text is not valid YAML
    #[error("parse error: {0}")]
    Parse(#[from] crate::ParseError),

    /// A path could not be resolved against a document or an appended value
    #[error("cannot resolve path '{path}': {reason}")]
    PathResolution {
        /// The path as given by the caller
        path: String,
        /// Why the path could not be resolved
        reason: String,
    },

    /// Appending a mapping would introduce a key that already exists
    #[error("key '{0}' already exists")]
    DuplicateKey(String),

    /// A middleware or task descriptor is malformed
    #[error("invalid descriptor: {0}")]
    InvalidDescriptor(String),

    /// Conversion between serde data and YAML values failed
    #[error("JSON conversion error: {0}")]
    Json(#[from] serde_json::Error),
}

impl YamlError {
    pub(crate) fn path_resolution(path: impl Into<String>, reason: impl Into<String>) -> Self {
        YamlError::PathResolution {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for ui5-yaml-edit operations
pub type YamlResult<T> = Result<T, YamlError>;
