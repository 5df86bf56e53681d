//! Code folding model.
//!
//! Fold extractors scan a document once and report [`FoldRegion`]s; a [`FoldMap`] indexes those
//! regions together with the set of collapsed header lines.

mod map;

pub use map::FoldMap;

use crate::cancel::CancelToken;
use crate::error::FoldError;

/// What produced a fold region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FoldKind {
    /// `{ ... }` block.
    BraceBlock,
    /// Multi-line block comment.
    BlockComment,
    /// Java `"""` text block.
    JavaTextBlock,
    /// JavaScript template literal.
    JsTemplateBlock,
    /// `${ ... }` expression inside a JavaScript template literal.
    JsTemplateExpression,
    /// JSON object.
    JsonObject,
    /// JSON array.
    JsonArray,
    /// Markdown fenced code block.
    MarkdownFence,
    /// Markdown heading and the content below it.
    MarkdownSection,
}

/// A foldable line range.
///
/// `start_line` is the header line, which stays visible when the region is collapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FoldRegion {
    /// Header line.
    pub start_line: usize,
    /// Last line (inclusive).
    pub end_line: usize,
    /// Region kind.
    pub kind: FoldKind,
    /// Nesting depth, 1 for outermost.
    pub depth: usize,
    /// Whether the region is currently collapsed.
    pub collapsed: bool,
}

impl FoldRegion {
    /// Create an expanded region.
    pub fn new(start_line: usize, end_line: usize, kind: FoldKind, depth: usize) -> Self {
        Self {
            start_line,
            end_line,
            kind,
            depth: depth.max(1),
            collapsed: false,
        }
    }

    /// Number of lines hidden when collapsed.
    pub fn span(&self) -> usize {
        self.end_line.saturating_sub(self.start_line)
    }

    /// Check if line number is within the region (header included).
    pub fn contains_line(&self, line: usize) -> bool {
        line >= self.start_line && line <= self.end_line
    }

    /// Single-line ranges are never foldable.
    pub fn is_foldable(&self) -> bool {
        self.end_line > self.start_line
    }
}

/// Computes fold regions for one language.
pub trait FoldExtractor: Send + Sync {
    /// Scan `lines` (logical lines without terminators) and report fold regions.
    ///
    /// Implementations poll `cancel` and return [`FoldError::Cancelled`] once it fires.
    fn extract(&self, lines: &[String], cancel: &CancelToken) -> Result<Vec<FoldRegion>, FoldError>;
}

/// Extractor that never reports regions; the fallback for plain text.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFolds;

impl FoldExtractor for NoFolds {
    fn extract(&self, _lines: &[String], cancel: &CancelToken) -> Result<Vec<FoldRegion>, FoldError> {
        if cancel.is_cancelled() {
            return Err(FoldError::Cancelled);
        }
        Ok(Vec::new())
    }
}

/// Open-region stack helper shared by the built-in extractors.
///
/// Tracks `(start_line, kind)` entries; closing an entry emits a region when it spans more than one
/// line, and [`OpenStack::finish`] closes everything still open at the last line.
#[derive(Debug, Default)]
pub struct OpenStack {
    open: Vec<(usize, FoldKind)>,
    regions: Vec<FoldRegion>,
}

impl OpenStack {
    /// An empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of currently open entries.
    pub fn depth(&self) -> usize {
        self.open.len()
    }

    /// Kind of the innermost open entry.
    pub fn top(&self) -> Option<FoldKind> {
        self.open.last().map(|&(_, kind)| kind)
    }

    /// Open an entry at `line`.
    pub fn push(&mut self, line: usize, kind: FoldKind) {
        self.open.push((line, kind));
    }

    /// Close the innermost entry at `line`; returns its kind.
    pub fn pop(&mut self, line: usize) -> Option<FoldKind> {
        let (start, kind) = self.open.pop()?;
        let depth = self.open.len() + 1;
        self.emit(start, line, kind, depth);
        Some(kind)
    }

    /// Emit a standalone (non-nesting) region such as a block comment.
    pub fn emit(&mut self, start_line: usize, end_line: usize, kind: FoldKind, depth: usize) {
        if end_line > start_line {
            self.regions
                .push(FoldRegion::new(start_line, end_line, kind, depth));
        }
    }

    /// Close everything still open at `last_line` and return all regions.
    pub fn finish(mut self, last_line: usize) -> Vec<FoldRegion> {
        while self.pop(last_line).is_some() {}
        self.regions
    }
}
