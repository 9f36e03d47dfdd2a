//! Error types for SAMM import, export and transformation
//!
//! Only conditions that abort a whole top-level call live here. Unrecognized
//! elements, single-field decode failures and dangling references are logged
//! and recovered where they occur.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SammError {
    #[error("Turtle syntax error in {source_name}: {message}")]
    Syntax {
        source_name: String,
        message: String,
    },

    #[error("Invalid IRI '{iri}': {reason}")]
    InvalidIri { iri: String, reason: String },

    #[error("Invalid namespace prefix '{0}'")]
    InvalidPrefix(String),

    #[error("No Aspect found in document")]
    MissingAspect,

    #[error("Container '{0}' not found")]
    UnknownContainer(String),

    #[error("Container '{0}' does not hold an Aspect")]
    NotAnAspect(String),

    #[error("Unknown element type marker '{0}' in extension payload")]
    UnknownTypeMarker(String),

    #[error("Export exceeded maximum reference depth of {0}")]
    DepthExceeded(usize),

    #[error("Invalid model structure: {0}")]
    InvalidStructure(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SammError>;
