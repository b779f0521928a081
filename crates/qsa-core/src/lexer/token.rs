//! Token kinds of the QS scripting language

use logos::Logos;

/// The kind of a lexed QS token
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[logos(skip r"[ \t\r\f\u{feff}]+")]
pub enum TokenKind {
    // ========== Keywords ==========
    #[token("function")]
    Function,
    #[token("class")]
    Class,
    #[token("extends")]
    Extends,
    #[token("static")]
    Static,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("while")]
    While,
    #[token("do")]
    Do,
    #[token("for")]
    For,
    #[token("in")]
    In,
    #[token("switch")]
    Switch,
    #[token("case")]
    Case,
    #[token("default")]
    Default,
    #[token("break")]
    Break,
    #[token("continue")]
    Continue,
    #[token("return")]
    Return,
    #[token("try")]
    Try,
    #[token("catch")]
    Catch,
    #[token("finally")]
    Finally,
    #[token("throw")]
    Throw,
    #[token("new")]
    New,
    #[token("delete")]
    Delete,
    #[token("with")]
    With,
    #[token("var")]
    Var,
    #[token("const")]
    Const,
    #[token("this")]
    This,
    #[token("typeof")]
    Typeof,
    #[token("instanceof")]
    Instanceof,
    #[token("void")]
    Void,

    // ========== Literals ==========
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("null")]
    Null,
    #[token("undefined")]
    Undefined,

    #[regex(r"[0-9]+")]
    Int,

    #[regex(r"0[xX][0-9a-fA-F]+")]
    HexInt,

    #[regex(r"[0-9]+\.[0-9]*([eE][+-]?[0-9]+)?")]
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?")]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+")]
    Float,

    /// Double-quoted string, lexeme includes the quotes
    #[regex(r#""([^"\\\n]|\\(.|\n))*""#)]
    DoubleString,

    /// Single-quoted string, lexeme includes the quotes
    #[regex(r"'([^'\\\n]|\\(.|\n))*'")]
    SingleString,

    /// `/body/flags`, produced by the lexer when a regex is allowed
    Regex,

    // ========== Identifiers ==========
    #[regex(r"[a-zA-Z_$][a-zA-Z0-9_$]*", priority = 3)]
    Ident,

    #[regex(r"[\p{XID_Start}][\p{XID_Continue}]*", priority = 2)]
    UnicodeIdent,

    // ========== Operators ==========
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("++")]
    PlusPlus,
    #[token("--")]
    MinusMinus,

    #[token("=")]
    Eq,
    #[token("+=")]
    PlusEq,
    #[token("-=")]
    MinusEq,
    #[token("*=")]
    StarEq,
    #[token("/=")]
    SlashEq,
    #[token("%=")]
    PercentEq,
    #[token("&=")]
    AmpEq,
    #[token("|=")]
    PipeEq,
    #[token("^=")]
    CaretEq,
    #[token("<<=")]
    ShlEq,
    #[token(">>=")]
    ShrEq,
    #[token(">>>=")]
    UShrEq,

    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("===")]
    EqEqEq,
    #[token("!==")]
    NotEqEq,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,

    #[token("&&")]
    AndAnd,
    #[token("||")]
    OrOr,
    #[token("!")]
    Not,

    #[token("&")]
    Amp,
    #[token("|")]
    Pipe,
    #[token("^")]
    Caret,
    #[token("~")]
    Tilde,
    #[token("<<")]
    Shl,
    #[token(">>")]
    Shr,
    #[token(">>>")]
    UShr,

    #[token("?")]
    Question,
    #[token(":")]
    Colon,

    // ========== Delimiters ==========
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,
    #[token(".")]
    Dot,

    // ========== Trivia ==========
    #[regex(r"//[^\n]*")]
    LineComment,

    /// `/* ... */`, matched on its opening and scanned to the end by the lexer
    #[token("/*")]
    BlockComment,

    #[token("\n")]
    Newline,

    /// End of input (added by the lexer)
    Eof,

    /// Invalid input
    Error,
}

impl TokenKind {
    #[must_use]
    pub const fn is_keyword(&self) -> bool {
        matches!(
            self,
            Self::Function
                | Self::Class
                | Self::Extends
                | Self::Static
                | Self::If
                | Self::Else
                | Self::While
                | Self::Do
                | Self::For
                | Self::In
                | Self::Switch
                | Self::Case
                | Self::Default
                | Self::Break
                | Self::Continue
                | Self::Return
                | Self::Try
                | Self::Catch
                | Self::Finally
                | Self::Throw
                | Self::New
                | Self::Delete
                | Self::With
                | Self::Var
                | Self::Const
                | Self::This
                | Self::Typeof
                | Self::Instanceof
                | Self::Void
                | Self::True
                | Self::False
                | Self::Null
                | Self::Undefined
        )
    }

    #[must_use]
    pub const fn is_trivia(&self) -> bool {
        matches!(self, Self::LineComment | Self::BlockComment | Self::Newline)
    }

    /// Compound and plain assignment operators
    #[must_use]
    pub const fn is_assignment(&self) -> bool {
        matches!(
            self,
            Self::Eq
                | Self::PlusEq
                | Self::MinusEq
                | Self::StarEq
                | Self::SlashEq
                | Self::PercentEq
                | Self::AmpEq
                | Self::PipeEq
                | Self::CaretEq
                | Self::ShlEq
                | Self::ShrEq
                | Self::UShrEq
        )
    }

    /// Whether a `/` following this token starts a regex literal rather than a division
    #[must_use]
    pub const fn allows_regex_after(&self) -> bool {
        !matches!(
            self,
            Self::Ident
                | Self::UnicodeIdent
                | Self::Int
                | Self::HexInt
                | Self::Float
                | Self::DoubleString
                | Self::SingleString
                | Self::Regex
                | Self::RParen
                | Self::RBracket
                | Self::RBrace
                | Self::This
                | Self::True
                | Self::False
                | Self::Null
                | Self::Undefined
                | Self::PlusPlus
                | Self::MinusMinus
        )
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::Function => "function",
            Self::Class => "class",
            Self::Extends => "extends",
            Self::Static => "static",
            Self::If => "if",
            Self::Else => "else",
            Self::While => "while",
            Self::Do => "do",
            Self::For => "for",
            Self::In => "in",
            Self::Switch => "switch",
            Self::Case => "case",
            Self::Default => "default",
            Self::Break => "break",
            Self::Continue => "continue",
            Self::Return => "return",
            Self::Try => "try",
            Self::Catch => "catch",
            Self::Finally => "finally",
            Self::Throw => "throw",
            Self::New => "new",
            Self::Delete => "delete",
            Self::With => "with",
            Self::Var => "var",
            Self::Const => "const",
            Self::This => "this",
            Self::Typeof => "typeof",
            Self::Instanceof => "instanceof",
            Self::Void => "void",
            Self::True => "true",
            Self::False => "false",
            Self::Null => "null",
            Self::Undefined => "undefined",
            Self::Int | Self::HexInt => "integer",
            Self::Float => "float",
            Self::DoubleString | Self::SingleString => "string",
            Self::Regex => "regex",
            Self::Ident | Self::UnicodeIdent => "identifier",
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Star => "*",
            Self::Slash => "/",
            Self::Percent => "%",
            Self::PlusPlus => "++",
            Self::MinusMinus => "--",
            Self::Eq => "=",
            Self::PlusEq => "+=",
            Self::MinusEq => "-=",
            Self::StarEq => "*=",
            Self::SlashEq => "/=",
            Self::PercentEq => "%=",
            Self::AmpEq => "&=",
            Self::PipeEq => "|=",
            Self::CaretEq => "^=",
            Self::ShlEq => "<<=",
            Self::ShrEq => ">>=",
            Self::UShrEq => ">>>=",
            Self::EqEq => "==",
            Self::NotEq => "!=",
            Self::EqEqEq => "===",
            Self::NotEqEq => "!==",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::LtEq => "<=",
            Self::GtEq => ">=",
            Self::AndAnd => "&&",
            Self::OrOr => "||",
            Self::Not => "!",
            Self::Amp => "&",
            Self::Pipe => "|",
            Self::Caret => "^",
            Self::Tilde => "~",
            Self::Shl => "<<",
            Self::Shr => ">>",
            Self::UShr => ">>>",
            Self::Question => "?",
            Self::Colon => ":",
            Self::LParen => "(",
            Self::RParen => ")",
            Self::LBrace => "{",
            Self::RBrace => "}",
            Self::LBracket => "[",
            Self::RBracket => "]",
            Self::Comma => ",",
            Self::Semicolon => ";",
            Self::Dot => ".",
            Self::LineComment => "// comment",
            Self::BlockComment => "/* comment */",
            Self::Newline => "newline",
            Self::Eof => "end of file",
            Self::Error => "error",
        };
        f.write_str(text)
    }
}
