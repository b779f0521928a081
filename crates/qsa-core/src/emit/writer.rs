//! Indented text writer
//!
//! Indentation follows the `Begin`/`End` stack alone. Every `End` must close
//! the innermost open block.

use thiserror::Error;

use super::token::{BlockTag, EmitToken};

const INDENT: &str = "    ";

/// Malformed token stream
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WriterError {
    #[error("block {found} closed while {expected} is open")]
    Mismatched { expected: BlockTag, found: BlockTag },

    #[error("block {0} closed but no block is open")]
    EndWithoutBegin(BlockTag),

    #[error("block {0} is never closed")]
    Unclosed(BlockTag),
}

#[derive(Debug)]
struct Frame {
    tag: BlockTag,
    /// A statement line was written inside this block
    has_code: bool,
}

/// Turns a token stream into Python source text
#[derive(Debug)]
pub struct Writer {
    out: String,
    stack: Vec<Frame>,
    deferred: Vec<String>,
    blank_line_threshold: usize,
    lines_since_indent: usize,
    last_blank: bool,
}

impl Writer {
    #[must_use]
    pub fn new(blank_line_threshold: usize) -> Self {
        Self {
            out: String::new(),
            stack: Vec::new(),
            deferred: Vec::new(),
            blank_line_threshold,
            lines_since_indent: 0,
            // no blank line at the top of the file
            last_blank: true,
        }
    }

    /// Current block depth
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn write(&mut self, token: &EmitToken) -> Result<(), WriterError> {
        match token {
            EmitToken::Line(text) | EmitToken::Expr(text) => {
                self.line(text, true);
                self.flush_deferred();
            }
            EmitToken::LineDeferred(text) => self.deferred.push(text.clone()),
            EmitToken::Begin { tag, header } => {
                self.flush_deferred();
                self.separate();
                self.line(header, true);
                self.stack.push(Frame {
                    tag: *tag,
                    has_code: false,
                });
                self.lines_since_indent = 0;
            }
            EmitToken::End(tag) => {
                self.flush_deferred();
                let top = self.stack.last().ok_or(WriterError::EndWithoutBegin(*tag))?;
                if top.tag != *tag {
                    return Err(WriterError::Mismatched {
                        expected: top.tag,
                        found: *tag,
                    });
                }
                if !top.has_code {
                    self.line("pass", true);
                }
                self.stack.pop();
                self.separate();
                self.lines_since_indent = 0;
            }
            EmitToken::Break => self.blank(),
            EmitToken::Debug(text) => self.line(&format!("# DEBUG:: {text}"), false),
        }
        Ok(())
    }

    /// Finish the stream and return the text
    pub fn finish(mut self) -> Result<String, WriterError> {
        self.flush_deferred();
        if let Some(frame) = self.stack.last() {
            return Err(WriterError::Unclosed(frame.tag));
        }
        while self.out.ends_with("\n\n") {
            self.out.pop();
        }
        Ok(self.out)
    }

    fn line(&mut self, text: &str, code: bool) {
        for _ in 0..self.stack.len() {
            self.out.push_str(INDENT);
        }
        self.out.push_str(text);
        self.out.push('\n');
        if code {
            if let Some(frame) = self.stack.last_mut() {
                frame.has_code = true;
            }
        }
        self.lines_since_indent += 1;
        self.last_blank = false;
    }

    fn flush_deferred(&mut self) {
        for text in std::mem::take(&mut self.deferred) {
            self.line(&text, true);
        }
    }

    /// Blank line once a long run of lines at one indent ends
    fn separate(&mut self) {
        if self.lines_since_indent > self.blank_line_threshold {
            self.blank();
        }
    }

    fn blank(&mut self) {
        if !self.last_blank {
            self.out.push('\n');
            self.last_blank = true;
        }
    }
}

/// Write a whole token stream
pub fn write_tokens(tokens: &[EmitToken], blank_line_threshold: usize) -> Result<String, WriterError> {
    let mut writer = Writer::new(blank_line_threshold);
    for token in tokens {
        writer.write(token)?;
    }
    writer.finish()
}
