//! Char cursor shared by the hand-written lexers.

use editor_syntax::{Token, TokenCategory};

/// Walks one line by `char` and collects tokens with char columns.
pub(crate) struct Scanner {
    chars: Vec<char>,
    pos: usize,
    tokens: Vec<Token>,
}

impl Scanner {
    pub(crate) fn new(line: &str) -> Self {
        Self {
            chars: line.chars().collect(),
            pos: 0,
            tokens: Vec::new(),
        }
    }

    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    pub(crate) fn len(&self) -> usize {
        self.chars.len()
    }

    pub(crate) fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    pub(crate) fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    pub(crate) fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    pub(crate) fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    pub(crate) fn advance(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.chars.len());
    }

    pub(crate) fn skip_to_end(&mut self) {
        self.pos = self.chars.len();
    }

    /// Returns `true` if the text at the cursor starts with `pat`.
    pub(crate) fn starts_with(&self, pat: &str) -> bool {
        let mut idx = self.pos;
        for expected in pat.chars() {
            if self.chars.get(idx) != Some(&expected) {
                return false;
            }
            idx += 1;
        }
        true
    }

    /// Consume chars while `pred` holds; returns how many were consumed.
    pub(crate) fn eat_while(&mut self, pred: impl Fn(char) -> bool) -> usize {
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.pos += 1;
        }
        self.pos - start
    }

    /// Text of `start..pos`.
    pub(crate) fn text_from(&self, start: usize) -> String {
        self.chars[start.min(self.pos)..self.pos].iter().collect()
    }

    /// Emit a token covering `start..pos`; empty spans are ignored.
    pub(crate) fn emit(&mut self, start: usize, category: TokenCategory) {
        if self.pos > start {
            self.tokens
                .push(Token::new(start, self.pos - start, category));
        }
    }

    /// Emit a token covering `start..end` without moving the cursor.
    pub(crate) fn emit_span(&mut self, start: usize, end: usize, category: TokenCategory) {
        if end > start {
            self.tokens.push(Token::new(start, end - start, category));
        }
    }

    pub(crate) fn finish(self) -> Vec<Token> {
        self.tokens
    }
}

/// Char column of a byte offset in `line`.
pub(crate) fn char_column(line: &str, byte: usize) -> usize {
    line.get(..byte).map_or(0, |prefix| prefix.chars().count())
}
