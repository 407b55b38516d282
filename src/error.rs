//! Error types for the taxonomy classifier.
//!
//! Every fallible operation returns [`Result`], whose error side is the
//! [`ClassifierError`] enum. Failures never leave shared state half-updated:
//! the operation that returned the error is the only thing aborted.

use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClassifierError {
    /// Missing or malformed configuration, raised before any side effect
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Taxonomy or artifact read/write failure
    #[error("I/O error while {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    /// Taxonomy source text that cannot be turned into a tree
    #[error("Malformed taxonomy at line {line}: {reason}")]
    MalformedTaxonomy { line: usize, reason: String },

    #[error("Duplicate document: {0}")]
    DuplicateDocument(String),

    #[error("Empty corpus: no documents were added")]
    EmptyCorpus,

    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Corrupt, truncated or foreign persisted artifact
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Classifier is not initialized: no model has been loaded")]
    NotInitialized,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, ClassifierError>;

impl ClassifierError {
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        ClassifierError::InvalidConfig(msg.into())
    }

    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        ClassifierError::InvalidArgument(msg.into())
    }

    pub fn deserialization<S: Into<String>>(msg: S) -> Self {
        ClassifierError::Deserialization(msg.into())
    }

    pub fn serialization<S: Into<String>>(msg: S) -> Self {
        ClassifierError::Serialization(msg.into())
    }

    pub fn malformed_taxonomy<S: Into<String>>(line: usize, reason: S) -> Self {
        ClassifierError::MalformedTaxonomy { line, reason: reason.into() }
    }

    /// Wrap an I/O error with a short description of what was being done
    pub fn io<S: Into<String>>(context: S, source: io::Error) -> Self {
        ClassifierError::Io { context: context.into(), source }
    }
}
