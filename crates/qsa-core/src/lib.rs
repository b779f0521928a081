//! QSA Core - QS script parser and Python transpiler
//!
//! This crate provides the transpilation pipeline for QS/QSA scripts:
//! - Lexer: Tokenization of QS source
//! - Parser: Concrete syntax tree construction
//! - AST: Typed tree built from the syntax tree
//! - Polisher: Rewrites for constructs Python lacks (`switch`, `with`, C-style `for`)
//! - Emitter: Token stream and indented Python writer
//! - Batch: Parallel conversion of script lists

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Lexer module - tokenization of QS source code
pub mod lexer;

/// Parser module - builds the concrete syntax tree
pub mod parser;

/// Abstract Syntax Tree - typed representation of QS scripts
pub mod ast;

/// QS to Python identifier mapping
pub mod names;

/// Post-parser rewrites
pub mod polish;

/// Python code generation
pub mod emit;

/// Transpiler configuration
pub mod config;

/// File access contracts and their filesystem implementations
pub mod source;

/// Per-file conversion errors
pub mod error;

/// Batch driver
pub mod batch;

/// Convenience re-export of parser
pub use parser::Parser;

/// Convenience re-export of the batch entry points
pub use batch::{parse_script_list, parse_script_list_with, transpile_source, BatchReport, FileOutcome};

/// Convenience re-export of configuration types
pub use config::{ConfigError, Encoding, KnownSymbols, TranspileConfig};

pub use error::ConvertError;
