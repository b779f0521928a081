//! Conversion errors

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::Encoding;
use crate::emit::WriterError;
use crate::lexer::{LineIndex, Location};
use crate::parser::ParseError;

/// Placeholder file name for text converted without a path
pub const UNNAMED_SOURCE: &str = "<source>";

/// Why one translation unit could not be converted
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is not valid {} text", .path.display(), .encoding.name())]
    Decode { path: PathBuf, encoding: Encoding },

    #[error("{}:{location}: {message}", .file.display())]
    Syntax {
        file: PathBuf,
        location: Location,
        message: String,
    },

    #[error("{}: {source}", .file.display())]
    Writer {
        file: PathBuf,
        #[source]
        source: WriterError,
    },
}

/// Result type for conversions
pub type Result<T> = std::result::Result<T, ConvertError>;

impl ConvertError {
    /// Syntax error from the parser's error list, reporting the first one
    pub(crate) fn syntax(text: &str, errors: &[ParseError]) -> Self {
        let index = LineIndex::new(text);
        let (location, mut message) = match errors.first() {
            Some(first) => (first.location(&index), first.to_string()),
            None => (index.location(0), "invalid script".to_string()),
        };
        if errors.len() > 1 {
            message.push_str(&format!(" (and {} more)", errors.len() - 1));
        }
        ConvertError::Syntax {
            file: PathBuf::from(UNNAMED_SOURCE),
            location,
            message,
        }
    }

    /// Attach the file the error belongs to
    #[must_use]
    pub fn with_file(self, path: &Path) -> Self {
        match self {
            ConvertError::Syntax {
                location, message, ..
            } => ConvertError::Syntax {
                file: path.to_path_buf(),
                location,
                message,
            },
            ConvertError::Writer { source, .. } => ConvertError::Writer {
                file: path.to_path_buf(),
                source,
            },
            other => other,
        }
    }

    pub(crate) fn io(path: &Path) -> impl FnOnce(std::io::Error) -> Self + '_ {
        move |source| ConvertError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;

    #[test]
    fn syntax_error_location_and_file() {
        let text = "var a = 1;\nvar = 2;\n";
        let errors = Parser::parse_source(text).unwrap_err();
        let err = ConvertError::syntax(text, &errors).with_file(Path::new("scripts/a.qs"));
        match &err {
            ConvertError::Syntax { location, .. } => assert_eq!(location.line, 2),
            other => panic!("expected syntax error, got {other:?}"),
        }
        assert!(err.to_string().starts_with("scripts/a.qs:2:"));
    }

    #[test]
    fn decode_message_names_encoding() {
        let err = ConvertError::Decode {
            path: PathBuf::from("a.qs"),
            encoding: Encoding::Utf8,
        };
        assert_eq!(err.to_string(), "a.qs is not valid utf-8 text");
    }
}
