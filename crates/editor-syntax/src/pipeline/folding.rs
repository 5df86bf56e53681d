//! Fold layout pipeline.

use super::{ComputeContext, Computation, Pipeline, Snapshot};
use crate::config::PipelineConfig;
use crate::dispatch::Dispatcher;
use crate::document::Document;
use crate::error::PipelineError;
use crate::fold::{FoldKind, FoldMap};
use crate::registry::LanguageRegistry;
use crate::visible::VisibleLineMap;
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::sync::Arc;

/// A fold map together with the visible-line tables derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoldLayout {
    folds: FoldMap,
    visible: VisibleLineMap,
}

impl FoldLayout {
    /// Derive the visible-line tables for `folds`.
    pub fn new(folds: FoldMap) -> Self {
        let visible = VisibleLineMap::new(&folds, folds.line_count());
        Self { folds, visible }
    }

    /// The fold map.
    pub fn folds(&self) -> &FoldMap {
        &self.folds
    }

    /// Logical ↔ visible translation for the fold map.
    pub fn visible(&self) -> &VisibleLineMap {
        &self.visible
    }
}

/// Fold extraction for the whole document.
///
/// Collapsed headers of the installed layout carry over to each fresh result. Headers requested
/// before the first result exists are held back and applied to it.
#[derive(Debug, Default)]
pub struct FoldComputation {
    initial_headers: Mutex<BTreeSet<usize>>,
}

impl FoldComputation {
    /// Create a computation with no collapsed headers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a computation that collapses `headers` in its first result.
    pub fn with_collapsed_headers(headers: impl IntoIterator<Item = usize>) -> Self {
        Self {
            initial_headers: Mutex::new(headers.into_iter().collect()),
        }
    }
}

impl Computation for FoldComputation {
    type Output = FoldLayout;

    fn name(&self) -> &'static str {
        "folding"
    }

    fn compute(&self, ctx: &ComputeContext<'_, FoldLayout>) -> Result<FoldLayout, PipelineError> {
        let extractor = ctx.registry.fold_extractor(&ctx.request.language);
        let regions = extractor.extract(ctx.lines, ctx.cancel)?;
        Ok(FoldLayout::new(FoldMap::new(regions, ctx.lines.len())))
    }

    fn fallback(&self, ctx: &ComputeContext<'_, FoldLayout>) -> Result<FoldLayout, PipelineError> {
        let extractor = ctx.registry.fallback_fold_extractor();
        let regions = extractor.extract(ctx.lines, ctx.cancel)?;
        Ok(FoldLayout::new(FoldMap::new(regions, ctx.lines.len())))
    }

    fn reconcile(&self, current: Option<&FoldLayout>, fresh: FoldLayout) -> FoldLayout {
        let headers = match current {
            Some(current) => carry_collapsed(&current.folds, &fresh.folds),
            None => std::mem::take(&mut *self.initial_headers.lock()),
        };
        if headers.is_empty() {
            return fresh;
        }
        FoldLayout::new(fresh.folds.with_collapsed_headers(headers))
    }
}

/// Map the collapsed headers of `previous` onto the regions of `fresh`.
///
/// A collapsed region is matched by its exact span and kind, then by that span shifted by the
/// change in line count (an edit above it), then by its header line alone (an edit inside it).
/// Regions with no match are dropped.
fn carry_collapsed(previous: &FoldMap, fresh: &FoldMap) -> BTreeSet<usize> {
    let delta = fresh.line_count() as isize - previous.line_count() as isize;
    let same_span = |start: usize, end: usize, kind: FoldKind| {
        fresh
            .region_at_header(start)
            .is_some_and(|r| r.end_line == end && r.kind == kind)
    };

    previous
        .collapsed_headers()
        .iter()
        .filter_map(|&header| {
            let region = previous.region_at_header(header)?;
            if same_span(region.start_line, region.end_line, region.kind) {
                return Some(header);
            }
            let shifted_start = region.start_line.checked_add_signed(delta);
            let shifted_end = region.end_line.checked_add_signed(delta);
            if let (Some(start), Some(end)) = (shifted_start, shifted_end)
                && same_span(start, end, region.kind)
            {
                return Some(start);
            }
            fresh
                .region_at_header(header)
                .is_some_and(|r| r.kind == region.kind)
                .then_some(header)
        })
        .collect()
}

/// Pipeline keeping a [`FoldLayout`] current.
pub type FoldingPipeline = Pipeline<FoldComputation>;

impl Pipeline<FoldComputation> {
    /// Start a folding pipeline for `document`.
    pub fn folding(
        document: Arc<dyn Document>,
        registry: Arc<LanguageRegistry>,
        dispatcher: Arc<dyn Dispatcher>,
        language: &str,
        config: PipelineConfig,
    ) -> Result<Self, PipelineError> {
        Self::new(
            FoldComputation::new(),
            document,
            registry,
            dispatcher,
            language,
            config,
        )
    }

    /// Installed fold layout, if any computation has completed.
    pub fn fold_layout(&self) -> Option<Arc<Snapshot<FoldLayout>>> {
        self.current()
    }

    /// Headers currently collapsed.
    pub fn collapsed_headers(&self) -> BTreeSet<usize> {
        self.current()
            .map(|snapshot| snapshot.value.folds.collapsed_headers().clone())
            .unwrap_or_default()
    }

    /// Replace the collapsed header set.
    ///
    /// Before the first result exists the headers are held and applied to it. Returns `true` if
    /// the installed layout changed.
    pub fn set_collapsed_headers(&self, headers: impl IntoIterator<Item = usize>) -> bool {
        let headers: BTreeSet<usize> = headers.into_iter().collect();
        // Held across the check so the first install cannot slip in between.
        let _guard = self.shared.apply_lock.lock();
        if self.current().is_none() {
            *self.computation().initial_headers.lock() = headers;
            return false;
        }
        self.update_folds(|folds| folds.set_collapsed(headers))
    }

    /// Collapse `headers`.
    pub fn collapse(&self, headers: impl IntoIterator<Item = usize>) -> bool {
        self.update_folds(|folds| folds.collapse(headers))
    }

    /// Expand `headers`.
    pub fn expand(&self, headers: impl IntoIterator<Item = usize>) -> bool {
        self.update_folds(|folds| folds.expand(headers))
    }

    /// Toggle the region starting at `header`.
    pub fn toggle_header(&self, header: usize) -> bool {
        self.update_folds(|folds| folds.toggle(header))
    }

    /// Collapse every region.
    pub fn collapse_all(&self) -> bool {
        self.update_folds(FoldMap::collapse_all)
    }

    /// Expand every region.
    pub fn expand_all(&self) -> bool {
        self.update_folds(FoldMap::expand_all)
    }

    fn update_folds<F>(&self, update: F) -> bool
    where
        F: FnOnce(&FoldMap) -> Option<FoldMap>,
    {
        self.modify(|layout| update(&layout.folds).map(FoldLayout::new))
    }
}
