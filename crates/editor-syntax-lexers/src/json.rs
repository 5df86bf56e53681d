//! JSON lexer.

use crate::scanner::Scanner;
use editor_syntax::{LexError, LexState, Lexer, LineLex, TokenCategory};

const STRING: u32 = 1;
const STRING_ESC: u32 = 2;

/// Lexer for JSON: strings, numbers, `true`/`false`/`null` and structural punctuation.
///
/// Anything else is skipped without a token. Strings left open at the end of a line continue on
/// the next one.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonLexer;

impl JsonLexer {
    /// Scan a string body; `None` once closed, otherwise the open state.
    fn string(s: &mut Scanner, start: usize) -> Option<LexState> {
        while let Some(c) = s.bump() {
            match c {
                '\\' => {
                    if s.bump().is_none() {
                        s.emit(start, TokenCategory::String);
                        return Some(LexState::new(STRING_ESC));
                    }
                }
                '"' => {
                    s.emit(start, TokenCategory::String);
                    return None;
                }
                _ => {}
            }
        }
        s.emit(start, TokenCategory::String);
        Some(LexState::new(STRING))
    }
}

impl Lexer for JsonLexer {
    fn lex_line(&self, line: &str, entry_state: LexState) -> Result<LineLex, LexError> {
        let mut s = Scanner::new(line);

        match entry_state.code() {
            0 => {}
            STRING | STRING_ESC => {
                if let Some(exit) = Self::string(&mut s, 0) {
                    return Ok(LineLex::new(s.finish(), exit));
                }
            }
            _ => return Err(LexError::UnknownState(entry_state)),
        }

        while let Some(c) = s.peek() {
            let start = s.pos();
            match c {
                '"' => {
                    s.bump();
                    if let Some(exit) = Self::string(&mut s, start) {
                        return Ok(LineLex::new(s.finish(), exit));
                    }
                }
                '{' | '}' | '[' | ']' | ':' | ',' => {
                    s.bump();
                    s.emit(start, TokenCategory::Punctuation);
                }
                '-' | '0'..='9' => {
                    s.bump();
                    s.eat_while(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'));
                    if s.pos() - start == 1 && c == '-' {
                        continue;
                    }
                    s.emit(start, TokenCategory::Number);
                }
                c if c.is_ascii_alphabetic() => {
                    s.eat_while(|c| c.is_ascii_alphanumeric());
                    let word = s.text_from(start);
                    match word.as_str() {
                        "true" | "false" => s.emit(start, TokenCategory::Boolean),
                        "null" => s.emit(start, TokenCategory::Null),
                        _ => {}
                    }
                }
                _ => {
                    s.bump();
                }
            }
        }

        Ok(LineLex::new(s.finish(), LexState::DEFAULT))
    }
}
