//! Error types.

use crate::token::LexState;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Errors a [`Lexer`](crate::lexer::Lexer) can report for a single line.
pub enum LexError {
    #[error("unknown lexer state {0:?}")]
    /// The entry state was not produced by this lexer.
    UnknownState(LexState),

    #[error("lexer failed: {0}")]
    /// Any other lexer-specific failure.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Errors a [`FoldExtractor`](crate::fold::FoldExtractor) can report.
pub enum FoldError {
    #[error("fold extraction cancelled")]
    /// The cancellation token fired mid-scan.
    Cancelled,

    #[error("fold extraction failed: {0}")]
    /// Extractor-specific failure.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Errors produced by [`relex`](crate::relex::relex).
pub enum RelexError {
    #[error("relex cancelled")]
    /// The cancellation token fired mid-scan.
    Cancelled,

    #[error("lexing line {line} failed: {source}")]
    /// The lexer rejected a line.
    Lex {
        /// Logical line that failed.
        line: usize,
        /// Underlying lexer error.
        #[source]
        source: LexError,
    },
}

#[derive(Debug, Error)]
/// Errors produced while running a recomputation pipeline.
pub enum PipelineError {
    #[error("recomputation cancelled")]
    /// The computation was abandoned; not a failure.
    Cancelled,

    #[error("lexing line {line} failed: {source}")]
    /// A lexer failed.
    Lex {
        /// Logical line that failed.
        line: usize,
        /// Underlying lexer error.
        #[source]
        source: LexError,
    },

    #[error(transparent)]
    /// A fold extractor failed.
    Fold(FoldError),

    #[error("computation panicked: {0}")]
    /// A lexer or fold extractor panicked; the panic was contained on the worker thread.
    Panicked(String),

    #[error("failed to spawn pipeline worker: {0}")]
    /// The worker thread could not be started.
    Spawn(#[from] std::io::Error),
}

impl PipelineError {
    /// Returns `true` if this is a cancellation rather than a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl From<RelexError> for PipelineError {
    fn from(err: RelexError) -> Self {
        match err {
            RelexError::Cancelled => Self::Cancelled,
            RelexError::Lex { line, source } => Self::Lex { line, source },
        }
    }
}

impl From<FoldError> for PipelineError {
    fn from(err: FoldError) -> Self {
        match err {
            FoldError::Cancelled => Self::Cancelled,
            other => Self::Fold(other),
        }
    }
}
