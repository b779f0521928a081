//! Metadata and model generation errors

use std::path::PathBuf;

use thiserror::Error;

/// Why an MTD document could not be read
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MtdError {
    #[error("malformed table metadata: {0}")]
    Xml(String),

    #[error("table metadata has no <name>")]
    MissingName,

    #[error("invalid value '{value}' for <{tag}>")]
    InvalidValue { tag: String, value: String },
}

/// Why no model was generated for a table
#[derive(Error, Debug)]
pub enum OrmError {
    #[error("failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("table '{0}' has no primary key")]
    NoPrimaryKey(String),

    #[error("table '{table}' declares field '{field}' more than once")]
    DuplicateField { table: String, field: String },

    #[error("no metadata for table '{0}'")]
    MetadataNotFound(String),
}
