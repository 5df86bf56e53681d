//! Markdown lexer.
//!
//! Block structure (fences, ATX headings, list markers) is recognised with regexes on the whole
//! line; inline text is split into punctuation and plain-text runs.

use crate::scanner::{Scanner, char_column};
use editor_syntax::{LexError, LexState, Lexer, LineLex, TokenCategory};
use regex::Regex;
use std::sync::LazyLock;

const FENCE_BACKTICK: u32 = 0x100;
const FENCE_TILDE: u32 = 0x200;
const FENCE_LEN_MASK: u32 = 0xFF;

static FENCE_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ {0,3}(`{3,}|~{3,})(.*)$").expect("valid fence regex"));
static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ {0,3}(#{1,6})(?:[ \t]|$)").expect("valid heading regex"));
static LIST_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[ \t]*([-*+]|[0-9]{1,9}[.)])(?:[ \t]|$)").expect("valid list regex")
});

/// An open code fence: marker char and run length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Fence {
    pub(crate) marker: char,
    pub(crate) len: usize,
}

impl Fence {
    fn state(self) -> LexState {
        let base = if self.marker == '`' {
            FENCE_BACKTICK
        } else {
            FENCE_TILDE
        };
        LexState::new(base | self.len as u32)
    }

    fn from_state(state: LexState) -> Option<Self> {
        let code = state.code();
        let marker = match code & !FENCE_LEN_MASK {
            FENCE_BACKTICK => '`',
            FENCE_TILDE => '~',
            _ => return None,
        };
        let len = (code & FENCE_LEN_MASK) as usize;
        (len >= 3).then_some(Self { marker, len })
    }

    /// Returns `true` if `line` closes this fence.
    pub(crate) fn is_closed_by(self, line: &str) -> bool {
        let indent = line.len() - line.trim_start_matches(' ').len();
        if indent > 3 {
            return false;
        }
        let rest = &line[indent..];
        let run = rest.chars().take_while(|&c| c == self.marker).count();
        run >= self.len && rest[run * self.marker.len_utf8()..].trim().is_empty()
    }
}

/// Opening fence on `line`, if any.
///
/// Runs longer than 255 markers are treated as 255 long, which is all a lexer state can carry.
pub(crate) fn fence_open(line: &str) -> Option<Fence> {
    let caps = FENCE_OPEN.captures(line)?;
    let run = caps.get(1)?.as_str();
    let marker = run.chars().next()?;
    // Backtick fences cannot carry backticks in their info string.
    if marker == '`' && caps.get(2).is_some_and(|info| info.as_str().contains('`')) {
        return None;
    }
    Some(Fence {
        marker,
        len: run.len().min(FENCE_LEN_MASK as usize),
    })
}

/// ATX heading level of `line`, if it is a heading.
pub(crate) fn heading_level(line: &str) -> Option<usize> {
    HEADING.captures(line)?.get(1).map(|m| m.as_str().len())
}

/// Lexer for CommonMark-style Markdown.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownLexer;

impl Lexer for MarkdownLexer {
    fn lex_line(&self, line: &str, entry_state: LexState) -> Result<LineLex, LexError> {
        let mut s = Scanner::new(line);
        let content_end = char_column(line, line.trim_end().len());

        if !entry_state.is_default() {
            let fence =
                Fence::from_state(entry_state).ok_or(LexError::UnknownState(entry_state))?;
            if fence.is_closed_by(line) {
                let start = char_column(line, line.len() - line.trim_start().len());
                s.emit_span(start, content_end, TokenCategory::CodeFence);
                return Ok(LineLex::new(s.finish(), LexState::DEFAULT));
            }
            s.emit_span(0, s.len(), TokenCategory::CodeBlock);
            return Ok(LineLex::new(s.finish(), entry_state));
        }

        if let Some(fence) = fence_open(line) {
            let start = char_column(line, line.len() - line.trim_start().len());
            s.emit_span(start, content_end, TokenCategory::CodeFence);
            return Ok(LineLex::new(s.finish(), fence.state()));
        }

        if heading_level(line).is_some() {
            let start = char_column(line, line.len() - line.trim_start().len());
            s.emit_span(start, content_end, TokenCategory::Heading);
            return Ok(LineLex::new(s.finish(), LexState::DEFAULT));
        }

        if let Some(marker) = LIST_MARKER.captures(line).and_then(|caps| caps.get(1)) {
            let start = char_column(line, marker.start());
            let end = char_column(line, marker.end());
            s.emit_span(start, end, TokenCategory::ListMarker);
            s.advance(end);
        }

        lex_inline(&mut s);
        Ok(LineLex::new(s.finish(), LexState::DEFAULT))
    }
}

/// Split the rest of the line into punctuation runs and plain-text runs.
fn lex_inline(s: &mut Scanner) {
    while let Some(c) = s.peek() {
        let start = s.pos();
        if c.is_whitespace() {
            s.eat_while(char::is_whitespace);
        } else if c.is_ascii_punctuation() {
            s.eat_while(|c| c.is_ascii_punctuation());
            s.emit(start, TokenCategory::Punctuation);
        } else {
            s.eat_while(|c| !c.is_whitespace() && !c.is_ascii_punctuation());
            s.emit(start, TokenCategory::Text);
        }
    }
}
