//! C-style lexer engine (Java, JavaScript).
//!
//! One engine parameterized by [`CStyleConfig`]: keyword sets, literal words, comment tokens and
//! which quote kinds may span lines.

use crate::scanner::Scanner;
use editor_syntax::{LexError, LexState, Lexer, LineLex, TokenCategory};
use editor_syntax_lang::{CommentConfig, LanguageId};
use std::collections::HashSet;

const BLOCK_COMMENT: u32 = 1;
const SINGLE: u32 = 2;
const SINGLE_ESC: u32 = 3;
const DOUBLE: u32 = 4;
const DOUBLE_ESC: u32 = 5;
const TEMPLATE: u32 = 6;
const TEMPLATE_ESC: u32 = 7;
const TEXT_BLOCK: u32 = 8;

/// Reserved words of Java.
pub const JAVA_KEYWORDS: &[&str] = &[
    "abstract", "assert", "boolean", "break", "byte", "case", "catch", "char", "class", "const",
    "continue", "default", "do", "double", "else", "enum", "extends", "final", "finally", "float",
    "for", "goto", "if", "implements", "import", "instanceof", "int", "interface", "long",
    "native", "new", "package", "private", "protected", "public", "record", "return", "sealed",
    "short", "static", "strictfp", "super", "switch", "synchronized", "this", "throw", "throws",
    "transient", "try", "var", "void", "volatile", "while", "yield",
];

/// Reserved words of JavaScript.
pub const JAVASCRIPT_KEYWORDS: &[&str] = &[
    "async", "await", "break", "case", "catch", "class", "const", "continue", "debugger",
    "default", "delete", "do", "else", "export", "extends", "finally", "for", "from", "function",
    "get", "if", "import", "in", "instanceof", "let", "new", "of", "return", "set", "static",
    "super", "switch", "this", "throw", "try", "typeof", "var", "void", "while", "with", "yield",
];

const OPERATOR_CHARS: &str = "+-*/%=<>!&|^~?:";
const PUNCTUATION_CHARS: &str = "{}()[];,.@#";

/// Configuration for [`CStyleLexer`].
#[derive(Debug, Clone)]
pub struct CStyleConfig {
    /// Reserved words, classified as [`TokenCategory::Keyword`].
    pub keywords: Vec<String>,
    /// Boolean literal words.
    pub booleans: Vec<String>,
    /// Null-like literal words.
    pub nulls: Vec<String>,
    /// Comment tokens.
    pub comments: CommentConfig,
    /// Whether backtick template literals exist (and span lines).
    pub template_literals: bool,
    /// Whether `"""` text blocks exist.
    pub text_blocks: bool,
}

impl CStyleConfig {
    /// Create a config with the given comment tokens and no keywords.
    ///
    /// By default:
    /// - `booleans` are `true` / `false`
    /// - `nulls` is `null`
    /// - template literals and text blocks are disabled
    pub fn new(comments: CommentConfig) -> Self {
        Self {
            keywords: Vec::new(),
            booleans: vec!["true".to_string(), "false".to_string()],
            nulls: vec!["null".to_string()],
            comments,
            template_literals: false,
            text_blocks: false,
        }
    }

    /// Java: text blocks, no template literals.
    pub fn java() -> Self {
        Self::new(LanguageId::Java.comment_config())
            .with_keywords(JAVA_KEYWORDS.iter().copied())
            .with_text_blocks(true)
    }

    /// JavaScript: template literals, `null` and `undefined`.
    pub fn javascript() -> Self {
        Self::new(LanguageId::JavaScript.comment_config())
            .with_keywords(JAVASCRIPT_KEYWORDS.iter().copied())
            .with_nulls(["null", "undefined"])
            .with_template_literals(true)
    }

    /// Set the keyword list.
    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    /// Set the null-like literal words.
    pub fn with_nulls<I, S>(mut self, nulls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.nulls = nulls.into_iter().map(Into::into).collect();
        self
    }

    /// Enable or disable template literals.
    pub fn with_template_literals(mut self, enabled: bool) -> Self {
        self.template_literals = enabled;
        self
    }

    /// Enable or disable `"""` text blocks.
    pub fn with_text_blocks(mut self, enabled: bool) -> Self {
        self.text_blocks = enabled;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Quote {
    Single,
    Double,
    Template,
    TextBlock,
}

impl Quote {
    fn state(self, escaped: bool) -> LexState {
        let code = match (self, escaped) {
            (Quote::Single, false) => SINGLE,
            (Quote::Single, true) => SINGLE_ESC,
            (Quote::Double, false) => DOUBLE,
            (Quote::Double, true) => DOUBLE_ESC,
            (Quote::Template, false) => TEMPLATE,
            (Quote::Template, true) => TEMPLATE_ESC,
            (Quote::TextBlock, _) => TEXT_BLOCK,
        };
        LexState::new(code)
    }

    fn delimiter(self) -> &'static str {
        match self {
            Quote::Single => "'",
            Quote::Double => "\"",
            Quote::Template => "`",
            Quote::TextBlock => "\"\"\"",
        }
    }
}

/// What a line starts inside of.
enum Resume {
    Code,
    BlockComment,
    Quoted(Quote),
}

/// Lexer for C-family syntax.
#[derive(Debug, Clone)]
pub struct CStyleLexer {
    config: CStyleConfig,
    keywords: HashSet<String>,
    booleans: HashSet<String>,
    nulls: HashSet<String>,
}

impl CStyleLexer {
    /// Build a lexer from `config`.
    pub fn new(config: CStyleConfig) -> Self {
        Self {
            keywords: config.keywords.iter().cloned().collect(),
            booleans: config.booleans.iter().cloned().collect(),
            nulls: config.nulls.iter().cloned().collect(),
            config,
        }
    }

    /// Java lexer.
    pub fn java() -> Self {
        Self::new(CStyleConfig::java())
    }

    /// JavaScript lexer.
    pub fn javascript() -> Self {
        Self::new(CStyleConfig::javascript())
    }

    /// The configuration in use.
    pub fn config(&self) -> &CStyleConfig {
        &self.config
    }

    fn resume(&self, state: LexState) -> Result<Resume, LexError> {
        let resume = match state.code() {
            0 => Resume::Code,
            BLOCK_COMMENT if self.config.comments.has_block() => Resume::BlockComment,
            SINGLE | SINGLE_ESC => Resume::Quoted(Quote::Single),
            DOUBLE | DOUBLE_ESC => Resume::Quoted(Quote::Double),
            TEMPLATE | TEMPLATE_ESC if self.config.template_literals => {
                Resume::Quoted(Quote::Template)
            }
            TEXT_BLOCK if self.config.text_blocks => Resume::Quoted(Quote::TextBlock),
            _ => return Err(LexError::UnknownState(state)),
        };
        Ok(resume)
    }

    /// Scan a block comment body from the cursor; `None` once closed, otherwise the open state.
    fn block_comment(&self, s: &mut Scanner, start: usize) -> Option<LexState> {
        let Some((_, end)) = self.config.comments.block_tokens() else {
            return None;
        };
        while !s.at_end() {
            if s.starts_with(end) {
                s.advance(end.chars().count());
                s.emit(start, TokenCategory::BlockComment);
                return None;
            }
            s.bump();
        }
        s.emit(start, TokenCategory::BlockComment);
        Some(LexState::new(BLOCK_COMMENT))
    }

    /// Scan a string body from the cursor; `None` once closed, otherwise the open state.
    fn quoted(s: &mut Scanner, start: usize, quote: Quote) -> Option<LexState> {
        let delimiter = quote.delimiter();
        while let Some(c) = s.peek() {
            if c == '\\' {
                s.bump();
                if s.bump().is_none() {
                    // Backslash escapes the line break.
                    s.emit(start, TokenCategory::String);
                    return Some(quote.state(true));
                }
                continue;
            }
            if s.starts_with(delimiter) {
                s.advance(delimiter.chars().count());
                s.emit(start, TokenCategory::String);
                return None;
            }
            s.bump();
        }
        s.emit(start, TokenCategory::String);
        Some(quote.state(false))
    }

    fn at_comment_start(&self, s: &Scanner) -> bool {
        self.config
            .comments
            .line_token()
            .is_some_and(|token| s.starts_with(token))
            || self
                .config
                .comments
                .block_tokens()
                .is_some_and(|(open, _)| s.starts_with(open))
    }

    fn classify(&self, word: &str) -> TokenCategory {
        if self.booleans.contains(word) {
            TokenCategory::Boolean
        } else if self.nulls.contains(word) {
            TokenCategory::Null
        } else if self.keywords.contains(word) {
            TokenCategory::Keyword
        } else {
            TokenCategory::Identifier
        }
    }
}

impl Lexer for CStyleLexer {
    fn lex_line(&self, line: &str, entry_state: LexState) -> Result<LineLex, LexError> {
        let mut s = Scanner::new(line);

        let carried = match self.resume(entry_state)? {
            Resume::Code => None,
            Resume::BlockComment => self.block_comment(&mut s, 0),
            Resume::Quoted(quote) => Self::quoted(&mut s, 0, quote),
        };
        if let Some(exit) = carried {
            return Ok(LineLex::new(s.finish(), exit));
        }

        while let Some(c) = s.peek() {
            let start = s.pos();

            if let Some(token) = self.config.comments.line_token()
                && s.starts_with(token)
            {
                s.skip_to_end();
                s.emit(start, TokenCategory::LineComment);
                break;
            }
            if let Some((open, _)) = self.config.comments.block_tokens()
                && s.starts_with(open)
            {
                s.advance(open.chars().count());
                if let Some(exit) = self.block_comment(&mut s, start) {
                    return Ok(LineLex::new(s.finish(), exit));
                }
                continue;
            }

            let quote = match c {
                '"' if self.config.text_blocks && s.starts_with("\"\"\"") => Some(Quote::TextBlock),
                '"' => Some(Quote::Double),
                '\'' => Some(Quote::Single),
                '`' if self.config.template_literals => Some(Quote::Template),
                _ => None,
            };
            if let Some(quote) = quote {
                s.advance(quote.delimiter().chars().count());
                if let Some(exit) = Self::quoted(&mut s, start, quote) {
                    return Ok(LineLex::new(s.finish(), exit));
                }
                continue;
            }

            if c.is_ascii_digit() || (c == '.' && s.peek_at(1).is_some_and(|n| n.is_ascii_digit())) {
                lex_number(&mut s);
                s.emit(start, TokenCategory::Number);
            } else if is_ident_start(c) {
                s.eat_while(is_ident_continue);
                let word = s.text_from(start);
                s.emit(start, self.classify(&word));
            } else if c.is_whitespace() {
                s.eat_while(char::is_whitespace);
            } else if PUNCTUATION_CHARS.contains(c) {
                s.bump();
                s.emit(start, TokenCategory::Punctuation);
            } else if OPERATOR_CHARS.contains(c) {
                s.bump();
                while s.peek().is_some_and(|n| OPERATOR_CHARS.contains(n)) && !self.at_comment_start(&s) {
                    s.bump();
                }
                s.emit(start, TokenCategory::Operator);
            } else {
                s.bump();
            }
        }

        Ok(LineLex::new(s.finish(), LexState::DEFAULT))
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Consume a numeric literal: radix prefixes, fractions, exponents and one type suffix.
fn lex_number(s: &mut Scanner) {
    let radix_digits: Option<fn(char) -> bool> = match (s.peek(), s.peek_at(1)) {
        (Some('0'), Some('x' | 'X')) => Some(|c| c.is_ascii_hexdigit() || c == '_'),
        (Some('0'), Some('b' | 'B')) => Some(|c| matches!(c, '0' | '1' | '_')),
        (Some('0'), Some('o' | 'O')) => Some(|c| matches!(c, '0'..='7' | '_')),
        _ => None,
    };

    if let Some(digits) = radix_digits {
        s.advance(2);
        s.eat_while(digits);
    } else {
        s.eat_while(|c| c.is_ascii_digit() || c == '_');
        if s.peek() == Some('.') && s.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            s.bump();
            s.eat_while(|c| c.is_ascii_digit() || c == '_');
        }
        let exponent = match (s.peek(), s.peek_at(1), s.peek_at(2)) {
            (Some('e' | 'E'), Some(d), _) if d.is_ascii_digit() => 1,
            (Some('e' | 'E'), Some('+' | '-'), Some(d)) if d.is_ascii_digit() => 2,
            _ => 0,
        };
        if exponent > 0 {
            s.advance(exponent);
            s.eat_while(|c| c.is_ascii_digit());
        }
    }

    if s
        .peek()
        .is_some_and(|c| matches!(c, 'l' | 'L' | 'f' | 'F' | 'd' | 'D' | 'n'))
    {
        s.bump();
    }
}
