//! Logical ↔ visible line translation.
//!
//! A [`VisibleLineMap`] is derived from one [`FoldMap`] snapshot and a logical line count, and lets
//! caret movement and rendering treat a collapsed region as a single line.

use crate::fold::FoldMap;

/// Dense logical/visible line translation tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleLineMap {
    logical_to_visible: Vec<Option<usize>>,
    visible_to_logical: Vec<usize>,
    /// Nearest visible logical line at or before each logical line.
    anchor: Vec<usize>,
}

impl VisibleLineMap {
    /// Build the tables for `line_count` logical lines.
    pub fn new(folds: &FoldMap, line_count: usize) -> Self {
        let mut logical_to_visible = Vec::with_capacity(line_count);
        let mut visible_to_logical = Vec::with_capacity(line_count);
        let mut anchor = Vec::with_capacity(line_count);
        let mut last_visible = 0usize;

        for line in 0..line_count {
            if folds.is_hidden_line(line) {
                logical_to_visible.push(None);
            } else {
                logical_to_visible.push(Some(visible_to_logical.len()));
                visible_to_logical.push(line);
                last_visible = line;
            }
            anchor.push(last_visible);
        }

        // Never expose an empty visible range.
        if visible_to_logical.is_empty() {
            visible_to_logical.push(0);
        }

        Self {
            logical_to_visible,
            visible_to_logical,
            anchor,
        }
    }

    /// Tables for an unfolded document.
    pub fn identity(line_count: usize) -> Self {
        Self::new(&FoldMap::empty(line_count), line_count)
    }

    /// Number of logical lines covered.
    pub fn logical_line_count(&self) -> usize {
        self.logical_to_visible.len()
    }

    /// Number of visible lines (at least 1).
    pub fn visible_line_count(&self) -> usize {
        self.visible_to_logical.len()
    }

    /// Visible index of `logical_line`; `None` if it is hidden or out of range.
    pub fn logical_to_visible(&self, logical_line: usize) -> Option<usize> {
        self.logical_to_visible.get(logical_line).copied().flatten()
    }

    /// Logical line shown at `visible_line`; clamped to the last visible line.
    pub fn visible_to_logical(&self, visible_line: usize) -> usize {
        let idx = visible_line.min(self.visible_to_logical.len() - 1);
        self.visible_to_logical[idx]
    }

    /// Returns `true` if `logical_line` exists and is not hidden.
    pub fn is_visible(&self, logical_line: usize) -> bool {
        self.logical_to_visible(logical_line).is_some()
    }

    /// `logical_line` itself if visible, otherwise the visible line it is folded into (its header).
    ///
    /// Lines past the end are clamped to the last logical line first.
    pub fn nearest_visible_logical_line(&self, logical_line: usize) -> usize {
        if self.anchor.is_empty() {
            return 0;
        }
        let line = logical_line.min(self.anchor.len() - 1);
        self.anchor[line]
    }

    /// Closest visible logical line strictly before `logical_line`.
    pub fn previous_visible_logical_line(&self, logical_line: usize) -> Option<usize> {
        let current = self.nearest_visible_logical_line(logical_line);
        let visible = self.logical_to_visible(current)?;
        if logical_line.min(self.logical_line_count()) > current {
            // `logical_line` itself was hidden (or past the end): its header is the previous line.
            return Some(current);
        }
        visible
            .checked_sub(1)
            .map(|prev| self.visible_to_logical[prev])
    }

    /// Closest visible logical line strictly after `logical_line`.
    pub fn next_visible_logical_line(&self, logical_line: usize) -> Option<usize> {
        let current = self.nearest_visible_logical_line(logical_line);
        let visible = self.logical_to_visible(current)?;
        self.visible_to_logical.get(visible + 1).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fold::{FoldKind, FoldRegion};
    use pretty_assertions::assert_eq;

    fn folded(regions: &[(usize, usize)], collapsed: &[usize], line_count: usize) -> FoldMap {
        let regions = regions
            .iter()
            .map(|&(s, e)| FoldRegion::new(s, e, FoldKind::BraceBlock, 1))
            .collect();
        FoldMap::new(regions, line_count).with_collapsed_headers(collapsed.iter().copied())
    }

    #[test]
    fn test_identity_map() {
        let map = VisibleLineMap::identity(4);
        assert_eq!(map.visible_line_count(), 4);
        for line in 0..4 {
            assert_eq!(map.logical_to_visible(line), Some(line));
            assert_eq!(map.visible_to_logical(line), line);
        }
        assert_eq!(map.logical_to_visible(4), None);
        assert_eq!(map.visible_to_logical(99), 3);
    }

    #[test]
    fn test_collapsed_region_becomes_one_line() {
        let folds = folded(&[(1, 3)], &[1], 6);
        let map = VisibleLineMap::new(&folds, 6);
        assert_eq!(map.visible_line_count(), 3);
        assert_eq!(map.logical_to_visible(1), Some(1));
        assert_eq!(map.logical_to_visible(2), None);
        assert_eq!(map.logical_to_visible(4), Some(2));
        assert_eq!(map.visible_to_logical(2), 4);
        assert_eq!(map.nearest_visible_logical_line(3), 1);
        assert_eq!(map.nearest_visible_logical_line(4), 4);
    }

    #[test]
    fn test_previous_and_next_skip_hidden_lines() {
        let folds = folded(&[(1, 3)], &[1], 6);
        let map = VisibleLineMap::new(&folds, 6);
        assert_eq!(map.next_visible_logical_line(1), Some(4));
        assert_eq!(map.next_visible_logical_line(2), Some(4));
        assert_eq!(map.previous_visible_logical_line(4), Some(1));
        assert_eq!(map.previous_visible_logical_line(2), Some(1));
        assert_eq!(map.previous_visible_logical_line(0), None);
        assert_eq!(map.next_visible_logical_line(5), None);
    }

    #[test]
    fn test_out_of_range_is_clamped() {
        let map = VisibleLineMap::identity(3);
        assert_eq!(map.nearest_visible_logical_line(50), 2);
        assert_eq!(map.previous_visible_logical_line(50), Some(2));
        assert_eq!(map.next_visible_logical_line(50), None);
    }

    #[test]
    fn test_empty_document_exposes_one_visible_slot() {
        let map = VisibleLineMap::identity(0);
        assert_eq!(map.visible_line_count(), 1);
        assert_eq!(map.visible_to_logical(0), 0);
        assert_eq!(map.nearest_visible_logical_line(3), 0);
    }
}
