#![deny(missing_docs)]
#![allow(clippy::type_complexity)]
#![warn(clippy::unnecessary_to_owned)]
#![warn(clippy::redundant_clone)]
#![warn(clippy::inefficient_to_string)]
#![warn(clippy::manual_string_new)]
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/README.md"))]

//! Lossless editing of UI5 tooling configuration files.
//!
//! The documents are parsed into a lossless syntax tree based on the
//! [rowan] library, so whitespace, comments and formatting survive every
//! edit. On top of that sit typed helpers for the `ui5.yaml` sections that
//! generators extend, and a staged file system for writing the results.

mod builder;
mod error;
mod fs;
mod lex;
mod materialize;
mod middleware;
mod mutation;
mod parse;
mod path;
mod scalar;
mod ui5;
mod value;
mod yaml;

pub use error::{YamlError, YamlResult};
pub use fs::{FileSystem, MemFs};
pub use lex::{lex, SyntaxKind};
pub use materialize::{add_libraries_config, add_middleware_config, update_config};
pub use middleware::{CustomTask, Library, MiddlewareDescriptor, MiddlewarePosition, TaskPosition};
pub use mutation::NodeComment;
pub use parse::Parse;
pub use path::{PathSegment, YamlPath};
pub use rowan::TextRange;
pub use scalar::{ScalarStyle, ScalarType, ScalarValue};
pub use ui5::{ConfigSection, Ui5Config};
pub use value::YamlValue;
pub use yaml::{
    Document, Lang, Mapping, MappingEntry, Scalar, Sequence, SequenceEntry, Yaml, YamlNode,
};

/// A positioned parse error containing location information.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PositionedParseError {
    /// The error message
    pub message: String,
    /// The text range where the error occurred
    pub range: rowan::TextRange,
    /// Optional error code for categorization
    pub code: Option<String>,
}

impl std::fmt::Display for PositionedParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for PositionedParseError {}

/// List of encountered syntax errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParseError(pub Vec<String>);

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        for err in &self.0 {
            writeln!(f, "{}", err)?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}

/// The indentation to use for lines added to a YAML file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indentation {
    /// The number of spaces per nesting level.
    Spaces(u32),

    /// Use the step of the file's first nested block collection, falling
    /// back to two spaces.
    Detect,
}

impl Default for Indentation {
    fn default() -> Self {
        Indentation::Spaces(2)
    }
}
