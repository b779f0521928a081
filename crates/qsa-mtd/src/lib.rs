//! QSA MTD - table metadata and ORM models
//!
//! This crate turns `.mtd` table definitions into Python ORM models:
//! - Parser: MTD XML into a [`Table`] model
//! - ORM: SQLAlchemy class generation with a legacy metadata dictionary
//! - Source: metadata lookup by table name

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Table, field and relation model
pub mod model;

/// MTD document parser
pub mod parser;

/// ORM model generator
pub mod orm;

/// Metadata lookup contracts
pub mod source;

/// ORM generation settings
pub mod config;

/// Parse and generation errors
pub mod error;

/// Convenience re-export of the model types
pub use model::{Association, Cardinality, Field, FieldType, Relation, Table};

/// Convenience re-export of the generator entry points
pub use orm::{generate_model, render_model, ModelOutcome};

pub use config::OrmConfig;
pub use error::{MtdError, OrmError};
pub use parser::parse_mtd;
pub use source::{MetadataSource, MtdProject};
