//! Stateful line lexer abstraction.
//!
//! A lexer sees one line at a time together with the state the previous line ended in, and
//! reports the tokens of the line plus the state it ends in. Because [`Lexer::lex_line`] must be a
//! pure function of `(text, entry_state)`, a line whose text and entry state are unchanged can reuse
//! its previous result; this is what [`relex`](crate::relex::relex) relies on.
//!
//! Constructs that are still open at the end of a line (block comments, strings, fences) must be
//! reported through a non-default exit state instead of being closed silently.

use crate::error::LexError;
use crate::token::{LexState, Token};

/// Output of lexing a single line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LineLex {
    /// Tokens of the line, sorted and non-overlapping.
    pub tokens: Vec<Token>,
    /// State the next line starts in.
    pub exit_state: LexState,
}

impl LineLex {
    /// Build a line result.
    pub fn new(tokens: Vec<Token>, exit_state: LexState) -> Self {
        Self { tokens, exit_state }
    }
}

/// A single-pass, line-oriented tokenizer.
pub trait Lexer: Send + Sync {
    /// State of the first line of a document.
    fn initial_state(&self) -> LexState {
        LexState::DEFAULT
    }

    /// Tokenize `line` (without its line terminator) starting in `entry_state`.
    fn lex_line(&self, line: &str, entry_state: LexState) -> Result<LineLex, LexError>;
}

/// A lexer that produces no tokens; the guaranteed fallback for unknown languages.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextLexer;

impl Lexer for PlainTextLexer {
    fn lex_line(&self, _line: &str, _entry_state: LexState) -> Result<LineLex, LexError> {
        Ok(LineLex::default())
    }
}
