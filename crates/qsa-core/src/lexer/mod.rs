//! Lexer for QS scripts
//!
//! Converts QS source text into a flat token stream. Whitespace is skipped,
//! newlines and comments are kept as trivia so the parser can apply the
//! lenient semicolon rules of the language. Regex literals are resolved here
//! because they depend on the previous significant token.

#![allow(clippy::cast_possible_truncation)] // Spans are u32; files over 4GB are unsupported

mod span;
mod token;

pub use span::{LineIndex, Location, Span};
pub use token::TokenKind;

use logos::Logos;
use thiserror::Error;

/// A token with its kind, span, and source text
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub lexeme: String,
}

impl Token {
    #[must_use]
    pub fn new(kind: TokenKind, span: Span, lexeme: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            lexeme: lexeme.into(),
        }
    }
}

/// Lexer error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LexError {
    #[error("unexpected character")]
    UnexpectedChar,
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("unterminated block comment")]
    UnterminatedBlockComment,
    #[error("unterminated regular expression")]
    UnterminatedRegex,
}

/// A lexer error with location information
#[derive(Debug, Clone)]
pub struct SpannedError {
    pub error: LexError,
    pub span: Span,
}

impl SpannedError {
    #[must_use]
    pub fn new(error: LexError, span: Span) -> Self {
        Self { error, span }
    }
}

impl std::fmt::Display for SpannedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at {}", self.error, self.span)
    }
}

impl std::error::Error for SpannedError {}

/// The QS lexer
pub struct Lexer<'source> {
    source: &'source str,
    /// Current byte offset
    position: usize,
    /// Last non-trivia token kind, decides between `/` and a regex literal
    previous: Option<TokenKind>,
    errors: Vec<SpannedError>,
}

impl<'source> Lexer<'source> {
    #[must_use]
    pub fn new(source: &'source str) -> Self {
        Self {
            source,
            position: 0,
            previous: None,
            errors: Vec::new(),
        }
    }

    /// Tokenize the entire source, returning all tokens and any errors
    #[must_use]
    pub fn tokenize(source: &str) -> (Vec<Token>, Vec<SpannedError>) {
        let mut lexer = Lexer::new(source);
        let tokens = lexer.collect_all();
        (tokens, lexer.errors)
    }

    /// Collect all tokens up to and including `Eof`
    pub fn collect_all(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }

    /// Get the next token
    pub fn next_token(&mut self) -> Token {
        let token = self.lex_one();
        if !token.kind.is_trivia() {
            self.previous = Some(token.kind);
        }
        token
    }

    fn eof(&self) -> Token {
        let end = self.source.len() as u32;
        Token::new(TokenKind::Eof, Span::new(end, end), "")
    }

    fn lex_one(&mut self) -> Token {
        if self.position >= self.source.len() {
            return self.eof();
        }

        let remaining = &self.source[self.position..];
        let mut logos_lexer = TokenKind::lexer(remaining);

        match logos_lexer.next() {
            Some(Ok(kind)) => {
                let range = logos_lexer.span();
                let start = self.position + range.start;
                let end = self.position + range.end;

                if kind == TokenKind::BlockComment {
                    return self.lex_block_comment(start);
                }
                if matches!(kind, TokenKind::Slash | TokenKind::SlashEq) && self.regex_allowed() {
                    return self.lex_regex(start);
                }

                self.position = end;
                Token::new(
                    kind,
                    Span::new(start as u32, end as u32),
                    logos_lexer.slice(),
                )
            }
            Some(Err(())) => {
                // logos skipped leading whitespace before failing
                let skipped = remaining.len() - remaining.trim_start_matches([' ', '\t', '\r', '\u{c}', '\u{feff}']).len();
                let start = self.position + skipped;
                self.recover(start)
            }
            None => {
                self.position = self.source.len();
                self.eof()
            }
        }
    }

    fn regex_allowed(&self) -> bool {
        self.previous.map_or(true, |kind| kind.allows_regex_after())
    }

    /// Scan `/body/flags` starting at the opening slash
    fn lex_regex(&mut self, start: usize) -> Token {
        let mut in_class = false;
        let mut escaped = false;
        let mut body_end = None;

        for (offset, c) in self.source[start + 1..].char_indices() {
            if c == '\n' {
                break;
            }
            if escaped {
                escaped = false;
                continue;
            }
            match c {
                '\\' => escaped = true,
                '[' => in_class = true,
                ']' => in_class = false,
                '/' if !in_class => {
                    body_end = Some(start + 1 + offset);
                    break;
                }
                _ => {}
            }
        }

        let Some(body_end) = body_end else {
            let end = self.source[start..]
                .find('\n')
                .map_or(self.source.len(), |i| start + i);
            self.position = end;
            self.errors.push(SpannedError::new(
                LexError::UnterminatedRegex,
                Span::new(start as u32, end as u32),
            ));
            return Token::new(
                TokenKind::Error,
                Span::new(start as u32, end as u32),
                &self.source[start..end],
            );
        };

        let flags_len = self.source[body_end + 1..]
            .chars()
            .take_while(char::is_ascii_alphabetic)
            .count();
        let end = body_end + 1 + flags_len;
        self.position = end;
        Token::new(
            TokenKind::Regex,
            Span::new(start as u32, end as u32),
            &self.source[start..end],
        )
    }

    /// Scan `/* ... */` starting at the opening slash
    fn lex_block_comment(&mut self, start: usize) -> Token {
        let Some(close) = self.source[start + 2..].find("*/") else {
            return self.recover(start);
        };
        let end = start + 2 + close + 2;
        self.position = end;
        Token::new(
            TokenKind::BlockComment,
            Span::new(start as u32, end as u32),
            &self.source[start..end],
        )
    }

    /// Error recovery: classify the failure and skip past it
    fn recover(&mut self, start: usize) -> Token {
        let rest = &self.source[start..];
        let (error, end) = if rest.starts_with('"') || rest.starts_with('\'') {
            let end = rest.find('\n').map_or(self.source.len(), |i| start + i);
            (LexError::UnterminatedString, end)
        } else if rest.starts_with("/*") {
            (LexError::UnterminatedBlockComment, self.source.len())
        } else {
            let len = rest.chars().next().map_or(1, char::len_utf8);
            (LexError::UnexpectedChar, start + len)
        };

        self.position = end;
        let span = Span::new(start as u32, end as u32);
        self.errors.push(SpannedError::new(error, span));
        Token::new(TokenKind::Error, span, &self.source[start..end])
    }

    #[must_use]
    pub fn errors(&self) -> &[SpannedError] {
        &self.errors
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.next_token();
        if token.kind == TokenKind::Eof {
            None
        } else {
            Some(token)
        }
    }
}
