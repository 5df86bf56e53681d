//! Incremental relexing.
//!
//! [`relex`] recomputes a [`TokenMap`] for the current lines of a document, reusing as much of the
//! previous map as it can prove is still valid:
//!
//! 1. **Prefix reuse**: lines before the dirty-start hint are reused while their text still matches.
//!    The hint is only a lower bound; the first text mismatch decides where lexing really starts.
//! 2. **Forward lexing**: lexing resumes with the exit state of the last reused line.
//! 3. **Suffix fast-path**: when the line count is unchanged and, from the current line on, all
//!    remaining lines have the same text and the freshly computed entry state equals the stored one,
//!    the rest of the previous map is spliced in unchanged. The cost of an edit is then bounded by
//!    the distance to the point where lexer state re-converges, not by the document length.
//!
//! The fast-path is only sound when the line count is unchanged; text and state equality alone would
//! splice tokens onto shifted content after a newline insertion or deletion.

use crate::cancel::CancelToken;
use crate::error::RelexError;
use crate::lexer::Lexer;
use crate::token::{LineTokens, TokenMap};
use std::sync::Arc;

/// How much work a relex performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RelexStats {
    /// Lines reused from the start of the previous map.
    pub reused_prefix: usize,
    /// Lines passed through the lexer.
    pub relexed: usize,
    /// Lines spliced in by the suffix fast-path.
    pub reused_suffix: usize,
}

/// Recompute a token map, reusing `previous` where possible.
///
/// `lines` are the current logical lines without terminators.
pub fn relex<S: AsRef<str>>(
    previous: Option<&TokenMap>,
    lines: &[S],
    dirty_start_line: usize,
    lexer: &dyn Lexer,
    cancel: &CancelToken,
) -> Result<TokenMap, RelexError> {
    relex_with_stats(previous, lines, dirty_start_line, lexer, cancel).map(|(map, _)| map)
}

/// Like [`relex`], additionally reporting how many lines were reused.
pub fn relex_with_stats<S: AsRef<str>>(
    previous: Option<&TokenMap>,
    lines: &[S],
    dirty_start_line: usize,
    lexer: &dyn Lexer,
    cancel: &CancelToken,
) -> Result<(TokenMap, RelexStats), RelexError> {
    let prev_lines: &[Arc<LineTokens>] = previous.map(|m| m.lines()).unwrap_or(&[]);
    let mut stats = RelexStats::default();
    let mut out: Vec<Arc<LineTokens>> = Vec::with_capacity(lines.len());

    let prefix_limit = dirty_start_line.min(prev_lines.len()).min(lines.len());
    while out.len() < prefix_limit {
        let idx = out.len();
        if prev_lines[idx].text() != lines[idx].as_ref() {
            break;
        }
        out.push(prev_lines[idx].clone());
    }
    stats.reused_prefix = out.len();

    let mut state = out
        .last()
        .map(|l| l.exit_state())
        .unwrap_or_else(|| lexer.initial_state());

    // First index from which every remaining line's text is unchanged. Only meaningful when the
    // line count is unchanged.
    let unchanged_from = (prev_lines.len() == lines.len())
        .then(|| unchanged_suffix_start(prev_lines, lines, out.len()));

    let mut line = out.len();
    while line < lines.len() {
        if cancel.is_cancelled() {
            return Err(RelexError::Cancelled);
        }

        if let Some(from) = unchanged_from
            && line >= from
            && prev_lines[line].entry_state() == state
        {
            stats.reused_suffix = lines.len() - line;
            out.extend(prev_lines[line..].iter().cloned());
            break;
        }

        let text = lines[line].as_ref();
        let lexed = lexer
            .lex_line(text, state)
            .map_err(|source| RelexError::Lex { line, source })?;
        out.push(Arc::new(LineTokens::new(
            text,
            lexed.tokens,
            state,
            lexed.exit_state,
        )));
        stats.relexed += 1;
        state = lexed.exit_state;
        line += 1;
    }

    Ok((TokenMap::from_lines(out), stats))
}

fn unchanged_suffix_start<S: AsRef<str>>(
    prev_lines: &[Arc<LineTokens>],
    lines: &[S],
    floor: usize,
) -> usize {
    let mut from = lines.len();
    while from > floor && prev_lines[from - 1].text() == lines[from - 1].as_ref() {
        from -= 1;
    }
    from
}
