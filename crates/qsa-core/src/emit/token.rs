//! Emitted tokens

use std::fmt;

/// Identifies one block between its `Begin` and `End`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockTag {
    pub kind: &'static str,
    pub id: u32,
}

impl fmt::Display for BlockTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.kind, self.id)
    }
}

/// One item of the flat stream the writer turns into indented text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmitToken {
    /// A statement line at the current indent
    Line(String),
    /// A line held back until the next statement line has been written
    LineDeferred(String),
    /// An expression statement
    Expr(String),
    /// Block header (`if x:`); indents until the matching `End`
    Begin { tag: BlockTag, header: String },
    End(BlockTag),
    /// Blank separator line
    Break,
    /// Visible marker for a construct that was not translated
    Debug(String),
}

impl EmitToken {
    /// Short kind name, as used in diagnostics
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            EmitToken::Line(_) => "line",
            EmitToken::LineDeferred(_) => "line_deferred",
            EmitToken::Expr(_) => "expr",
            EmitToken::Begin { .. } => "begin",
            EmitToken::End(_) => "end",
            EmitToken::Break => "break",
            EmitToken::Debug(_) => "debug",
        }
    }
}

impl fmt::Display for EmitToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmitToken::Line(text)
            | EmitToken::LineDeferred(text)
            | EmitToken::Expr(text)
            | EmitToken::Debug(text) => write!(f, "{}: {}", self.kind(), text),
            EmitToken::Begin { tag, header } => write!(f, "begin {tag}: {header}"),
            EmitToken::End(tag) => write!(f, "end {tag}"),
            EmitToken::Break => f.write_str("break"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        let tag = BlockTag { kind: "if", id: 4 };
        assert_eq!(tag.to_string(), "if#4");
        let begin = EmitToken::Begin {
            tag,
            header: "if x:".into(),
        };
        assert_eq!(begin.to_string(), "begin if#4: if x:");
        assert_eq!(EmitToken::LineDeferred("i += 1".into()).kind(), "line_deferred");
    }
}
