//! Token data model.
//!
//! Everything in here is immutable once built and cheap to share between the worker thread that
//! produces it and the interactive thread that reads it.

use std::sync::Arc;

/// Category of a lexed token.
///
/// The UI/theme layer maps categories to colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenCategory {
    /// Reserved word of the language.
    Keyword,
    /// Any other identifier.
    Identifier,
    /// String literal (any quote kind, including multi-line continuations).
    String,
    /// Numeric literal.
    Number,
    /// `true` / `false`.
    Boolean,
    /// `null`.
    Null,
    /// Comment running to the end of the line.
    LineComment,
    /// Comment that may span lines.
    BlockComment,
    /// Structural punctuation (`{`, `;`, `,`, ...).
    Punctuation,
    /// Operator run (`+=`, `===`, ...).
    Operator,
    /// Markdown ATX heading.
    Heading,
    /// Markdown list marker (`-`, `*`, `1.`).
    ListMarker,
    /// Markdown code fence delimiter line.
    CodeFence,
    /// Markdown fenced code block content.
    CodeBlock,
    /// Plain text run.
    Text,
}

/// A span within a single line.
///
/// Columns count `char`s (Unicode scalar values).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Token {
    /// First column covered by the token.
    pub start_column: usize,
    /// Number of columns covered; always non-zero.
    pub length: usize,
    /// Token category.
    pub category: TokenCategory,
}

impl Token {
    /// Create a token. `length` must be non-zero.
    pub fn new(start_column: usize, length: usize, category: TokenCategory) -> Self {
        debug_assert!(length > 0, "tokens must cover at least one column");
        Self {
            start_column,
            length,
            category,
        }
    }

    /// Exclusive end column.
    pub fn end_column(&self) -> usize {
        self.start_column + self.length
    }

    /// Check if the token covers `column`.
    pub fn contains(&self, column: usize) -> bool {
        self.start_column <= column && column < self.end_column()
    }
}

/// Lexer continuation state carried across a line boundary.
///
/// Codes are private to each lexer; only [`LexState::DEFAULT`] has a shared meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct LexState(pub u32);

impl LexState {
    /// "Nothing open" state.
    pub const DEFAULT: Self = Self(0);

    /// Create a state from a raw code.
    pub const fn new(code: u32) -> Self {
        Self(code)
    }

    /// Raw code.
    pub const fn code(self) -> u32 {
        self.0
    }

    /// Returns `true` for [`LexState::DEFAULT`].
    pub const fn is_default(self) -> bool {
        self.0 == 0
    }
}

/// Lexed form of one logical line: the unit of incremental reuse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineTokens {
    text: Arc<str>,
    tokens: Vec<Token>,
    entry_state: LexState,
    exit_state: LexState,
}

impl LineTokens {
    /// Build a lexed line.
    pub fn new(
        text: impl Into<Arc<str>>,
        tokens: Vec<Token>,
        entry_state: LexState,
        exit_state: LexState,
    ) -> Self {
        Self {
            text: text.into(),
            tokens,
            entry_state,
            exit_state,
        }
    }

    /// The text the tokens were computed from.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Tokens, ordered by start column.
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// State the line was lexed with.
    pub fn entry_state(&self) -> LexState {
        self.entry_state
    }

    /// State after the last character of the line.
    pub fn exit_state(&self) -> LexState {
        self.exit_state
    }

    /// A line can be reused iff both its text and its entry state are unchanged.
    pub fn is_reusable_for(&self, text: &str, entry_state: LexState) -> bool {
        self.entry_state == entry_state && &*self.text == text
    }

    /// Token covering `column`, if any.
    pub fn token_at(&self, column: usize) -> Option<&Token> {
        let idx = self
            .tokens
            .partition_point(|t| t.end_column() <= column);
        self.tokens.get(idx).filter(|t| t.contains(column))
    }
}

/// Lexed form of a whole document: one [`LineTokens`] per logical line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TokenMap {
    lines: Vec<Arc<LineTokens>>,
}

impl TokenMap {
    /// A map with no lines.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a map from already lexed lines.
    pub fn from_lines(lines: Vec<Arc<LineTokens>>) -> Self {
        Self { lines }
    }

    /// Number of logical lines.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Returns `true` if the map covers no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// All lexed lines.
    pub fn lines(&self) -> &[Arc<LineTokens>] {
        &self.lines
    }

    /// The lexed line at `line`, if it exists.
    pub fn line(&self, line: usize) -> Option<&LineTokens> {
        self.lines.get(line).map(|l| l.as_ref())
    }

    /// Tokens of `line`; empty for out-of-range lines.
    pub fn tokens_for_line(&self, line: usize) -> &[Token] {
        self.lines.get(line).map(|l| l.tokens()).unwrap_or(&[])
    }

    /// Token covering `(line, column)`, if any.
    pub fn token_at(&self, line: usize, column: usize) -> Option<&Token> {
        self.lines.get(line)?.token_at(column)
    }

    /// Exit state of the last line (the state an appended line would start in).
    pub fn final_state(&self) -> LexState {
        self.lines
            .last()
            .map(|l| l.exit_state())
            .unwrap_or(LexState::DEFAULT)
    }

    /// Total token count across all lines.
    pub fn token_count(&self) -> usize {
        self.lines.iter().map(|l| l.tokens().len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(text: &str, tokens: Vec<Token>) -> LineTokens {
        LineTokens::new(text, tokens, LexState::DEFAULT, LexState::DEFAULT)
    }

    #[test]
    fn test_token_contains() {
        let token = Token::new(4, 3, TokenCategory::Keyword);
        assert_eq!(token.end_column(), 7);
        assert!(token.contains(4));
        assert!(token.contains(6));
        assert!(!token.contains(7));
        assert!(!token.contains(3));
    }

    #[test]
    fn test_token_at_uses_sorted_spans() {
        let lexed = line(
            "int x = 1;",
            vec![
                Token::new(0, 3, TokenCategory::Keyword),
                Token::new(4, 1, TokenCategory::Identifier),
                Token::new(6, 1, TokenCategory::Operator),
                Token::new(8, 1, TokenCategory::Number),
                Token::new(9, 1, TokenCategory::Punctuation),
            ],
        );
        assert_eq!(lexed.token_at(1).unwrap().category, TokenCategory::Keyword);
        assert!(lexed.token_at(3).is_none());
        assert_eq!(lexed.token_at(8).unwrap().category, TokenCategory::Number);
        assert!(lexed.token_at(42).is_none());
    }

    #[test]
    fn test_reusable_requires_text_and_state() {
        let lexed = LineTokens::new("abc", Vec::new(), LexState::new(2), LexState::new(2));
        assert!(lexed.is_reusable_for("abc", LexState::new(2)));
        assert!(!lexed.is_reusable_for("abc", LexState::DEFAULT));
        assert!(!lexed.is_reusable_for("abd", LexState::new(2)));
    }

    #[test]
    fn test_token_map_out_of_range_is_empty() {
        let map = TokenMap::from_lines(vec![Arc::new(line(
            "x",
            vec![Token::new(0, 1, TokenCategory::Identifier)],
        ))]);
        assert_eq!(map.line_count(), 1);
        assert_eq!(map.tokens_for_line(0).len(), 1);
        assert!(map.tokens_for_line(5).is_empty());
        assert!(map.token_at(5, 0).is_none());
        assert_eq!(map.final_state(), LexState::DEFAULT);
        assert_eq!(TokenMap::empty().final_state(), LexState::DEFAULT);
    }
}
