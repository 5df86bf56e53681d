use super::FoldRegion;
use std::collections::{BTreeMap, BTreeSet};

/// Immutable fold index for one document revision.
///
/// Derived indices:
/// - regions grouped by header line, ranked by shortest span then shallowest depth (the first entry
///   is the canonical region for that header)
/// - the set of collapsed header lines
/// - disjoint, sorted, inclusive hidden-line intervals for O(log n) [`FoldMap::is_hidden_line`]
///
/// All "mutators" return a new map.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FoldMap {
    regions: Vec<FoldRegion>,
    by_start: BTreeMap<usize, Vec<usize>>,
    collapsed: BTreeSet<usize>,
    hidden: Vec<(usize, usize)>,
    line_count: usize,
}

impl FoldMap {
    /// Build a map from extracted regions.
    ///
    /// Regions are clamped to `line_count`, single-line spans are dropped, exact duplicates are
    /// removed. Headers of regions flagged `collapsed` start out collapsed.
    pub fn new(regions: Vec<FoldRegion>, line_count: usize) -> Self {
        let headers: Vec<usize> = regions
            .iter()
            .filter(|r| r.collapsed)
            .map(|r| r.start_line)
            .collect();
        Self::build(regions, line_count, headers)
    }

    /// An empty map for a document of `line_count` lines.
    pub fn empty(line_count: usize) -> Self {
        Self::build(Vec::new(), line_count, [])
    }

    fn build(
        mut regions: Vec<FoldRegion>,
        line_count: usize,
        requested: impl IntoIterator<Item = usize>,
    ) -> Self {
        let max_line = line_count.saturating_sub(1);
        for region in regions.iter_mut() {
            region.end_line = region.end_line.min(max_line);
            region.collapsed = false;
        }
        regions.retain(|r| r.is_foldable());
        regions.sort_by_key(|r| (r.start_line, r.end_line, r.kind));
        regions.dedup_by(|a, b| {
            a.start_line == b.start_line && a.end_line == b.end_line && a.kind == b.kind
        });

        let mut by_start: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (idx, region) in regions.iter().enumerate() {
            by_start.entry(region.start_line).or_default().push(idx);
        }
        for ranked in by_start.values_mut() {
            ranked.sort_by_key(|&idx| (regions[idx].span(), regions[idx].depth));
        }

        // Stale headers (no region starts there any more) are dropped silently.
        let collapsed: BTreeSet<usize> = requested
            .into_iter()
            .filter(|line| by_start.contains_key(line))
            .collect();

        let mut hidden: Vec<(usize, usize)> = Vec::with_capacity(collapsed.len());
        for header in &collapsed {
            let idx = by_start[header][0];
            regions[idx].collapsed = true;

            let (start, end) = (header + 1, regions[idx].end_line);
            let merges = hidden
                .last()
                .is_some_and(|last| start <= last.1.saturating_add(1));
            if merges {
                if let Some(last) = hidden.last_mut() {
                    last.1 = last.1.max(end);
                }
            } else {
                hidden.push((start, end));
            }
        }

        Self {
            regions,
            by_start,
            collapsed,
            hidden,
            line_count,
        }
    }

    /// Logical line count the map was built for.
    pub fn line_count(&self) -> usize {
        self.line_count
    }

    /// All regions, sorted by `(start, end, kind)`.
    pub fn regions(&self) -> &[FoldRegion] {
        &self.regions
    }

    /// Returns `true` if the map has no regions.
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Collapsed header lines.
    pub fn collapsed_headers(&self) -> &BTreeSet<usize> {
        &self.collapsed
    }

    /// Returns `true` if `line` is a collapsed header.
    pub fn is_collapsed_header(&self, line: usize) -> bool {
        self.collapsed.contains(&line)
    }

    /// Returns `true` if at least one region starts at `line`.
    pub fn is_header(&self, line: usize) -> bool {
        self.by_start.contains_key(&line)
    }

    /// Canonical (shortest, then shallowest) region starting at `line`.
    pub fn region_at_header(&self, line: usize) -> Option<&FoldRegion> {
        let idx = *self.by_start.get(&line)?.first()?;
        self.regions.get(idx)
    }

    /// All regions starting at `line`, canonical first.
    pub fn regions_starting_at(&self, line: usize) -> impl Iterator<Item = &FoldRegion> + '_ {
        self.by_start
            .get(&line)
            .into_iter()
            .flatten()
            .map(|&idx| &self.regions[idx])
    }

    /// Smallest region containing `line` (header included).
    pub fn innermost_region_containing(&self, line: usize) -> Option<&FoldRegion> {
        self.regions
            .iter()
            .filter(|r| r.contains_line(line))
            .min_by_key(|r| (r.span(), std::cmp::Reverse(r.depth)))
    }

    /// Returns `true` if `line` lies inside a collapsed region (header lines are never hidden).
    pub fn is_hidden_line(&self, line: usize) -> bool {
        let idx = self.hidden.partition_point(|&(start, _)| start <= line);
        idx > 0 && self.hidden[idx - 1].1 >= line
    }

    /// Disjoint, sorted, inclusive `(first, last)` hidden-line intervals.
    pub fn hidden_intervals(&self) -> &[(usize, usize)] {
        &self.hidden
    }

    /// Total number of hidden lines.
    pub fn hidden_line_count(&self) -> usize {
        self.hidden.iter().map(|(s, e)| e - s + 1).sum()
    }

    /// Rebuild with exactly `headers` collapsed (filtered to real headers), even if nothing changed.
    pub fn with_collapsed_headers(&self, headers: impl IntoIterator<Item = usize>) -> FoldMap {
        Self::build(self.regions.clone(), self.line_count, headers)
    }

    /// Replace the collapsed set; `None` if the effective set is unchanged.
    pub fn set_collapsed(&self, headers: impl IntoIterator<Item = usize>) -> Option<FoldMap> {
        let effective: BTreeSet<usize> = headers
            .into_iter()
            .filter(|line| self.is_header(*line))
            .collect();
        if effective == self.collapsed {
            return None;
        }
        Some(Self::build(self.regions.clone(), self.line_count, effective))
    }

    /// Collapse `headers` in addition to the already collapsed ones.
    pub fn collapse(&self, headers: impl IntoIterator<Item = usize>) -> Option<FoldMap> {
        let mut next = self.collapsed.clone();
        next.extend(headers);
        self.set_collapsed(next)
    }

    /// Expand `headers`.
    pub fn expand(&self, headers: impl IntoIterator<Item = usize>) -> Option<FoldMap> {
        let mut next = self.collapsed.clone();
        for header in headers {
            next.remove(&header);
        }
        self.set_collapsed(next)
    }

    /// Toggle the collapsed state of `header`.
    pub fn toggle(&self, header: usize) -> Option<FoldMap> {
        if self.is_collapsed_header(header) {
            self.expand([header])
        } else {
            self.collapse([header])
        }
    }

    /// Collapse every header.
    pub fn collapse_all(&self) -> Option<FoldMap> {
        self.set_collapsed(self.by_start.keys().copied().collect::<Vec<_>>())
    }

    /// Expand every header.
    pub fn expand_all(&self) -> Option<FoldMap> {
        self.set_collapsed([])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fold::FoldKind;
    use pretty_assertions::assert_eq;

    fn region(start: usize, end: usize, depth: usize) -> FoldRegion {
        FoldRegion::new(start, end, FoldKind::BraceBlock, depth)
    }

    #[test]
    fn test_construction_drops_sorts_and_dedups() {
        let map = FoldMap::new(
            vec![
                region(4, 6, 2),
                region(0, 9, 1),
                region(3, 3, 1),
                region(4, 6, 2),
                region(7, 5, 1),
            ],
            10,
        );
        let spans: Vec<(usize, usize)> = map
            .regions()
            .iter()
            .map(|r| (r.start_line, r.end_line))
            .collect();
        assert_eq!(spans, vec![(0, 9), (4, 6)]);
    }

    #[test]
    fn test_regions_are_clamped_to_line_count() {
        let map = FoldMap::new(vec![region(1, 40, 1), region(5, 40, 1)], 6);
        assert_eq!(map.regions().len(), 1);
        assert_eq!(map.regions()[0].end_line, 5);
    }

    #[test]
    fn test_canonical_region_is_shortest_then_shallowest() {
        let map = FoldMap::new(
            vec![
                region(2, 10, 1),
                region(2, 5, 3),
                FoldRegion::new(2, 5, FoldKind::BlockComment, 2),
            ],
            12,
        );
        let canonical = map.region_at_header(2).unwrap();
        assert_eq!((canonical.end_line, canonical.depth), (5, 2));
        assert_eq!(map.regions_starting_at(2).count(), 3);
        assert_eq!(map.regions_starting_at(3).count(), 0);
    }

    #[test]
    fn test_collapsed_region_hides_interior_only() {
        let map = FoldMap::new(vec![region(2, 5, 1)], 8).collapse([2]).unwrap();
        assert!(!map.is_hidden_line(2));
        for line in 3..=5 {
            assert!(map.is_hidden_line(line));
        }
        assert!(!map.is_hidden_line(6));
        assert!(!map.is_hidden_line(1));
        assert_eq!(map.hidden_line_count(), 3);
        assert!(map.region_at_header(2).unwrap().collapsed);
    }

    #[test]
    fn test_nested_and_adjacent_hidden_ranges_merge() {
        let base = FoldMap::new(
            vec![region(0, 10, 1), region(2, 4, 2), region(10, 13, 2), region(20, 22, 1)],
            30,
        );
        let map = base.collapse([0, 2, 10, 20]).unwrap();
        assert_eq!(map.hidden_intervals(), &[(1, 13), (21, 22)]);
        assert!(map.is_hidden_line(12));
        assert!(!map.is_hidden_line(11 + 7));

        let inner_only = base.collapse([2]).unwrap();
        assert_eq!(inner_only.hidden_intervals(), &[(3, 4)]);
    }

    #[test]
    fn test_stale_headers_are_filtered_and_unchanged_returns_none() {
        let map = FoldMap::new(vec![region(1, 3, 1)], 5);
        assert!(map.collapse([0, 2, 99]).is_none());
        let collapsed = map.collapse([1, 99]).unwrap();
        assert_eq!(collapsed.collapsed_headers().iter().copied().collect::<Vec<_>>(), vec![1]);
        assert!(collapsed.collapse([1]).is_none());
        assert!(collapsed.expand([4]).is_none());
        let expanded = collapsed.toggle(1).unwrap();
        assert!(expanded.collapsed_headers().is_empty());
        assert!(!expanded.is_hidden_line(2));
    }

    #[test]
    fn test_collapse_all_and_expand_all() {
        let map = FoldMap::new(vec![region(0, 4, 1), region(1, 2, 2), region(6, 8, 1)], 9);
        let all = map.collapse_all().unwrap();
        assert_eq!(all.collapsed_headers().len(), 3);
        assert_eq!(all.hidden_intervals(), &[(1, 4), (7, 8)]);
        assert!(all.collapse_all().is_none());
        let none = all.expand_all().unwrap();
        assert_eq!(none.hidden_line_count(), 0);
    }

    #[test]
    fn test_flagged_regions_start_collapsed() {
        let mut folded = region(1, 4, 1);
        folded.collapsed = true;
        let map = FoldMap::new(vec![folded, region(5, 7, 1)], 8);
        assert!(map.is_collapsed_header(1));
        assert!(!map.is_collapsed_header(5));
    }

    #[test]
    fn test_with_collapsed_headers_reapplies_on_new_regions() {
        let old = FoldMap::new(vec![region(1, 4, 1)], 6).collapse([1]).unwrap();
        let fresh = FoldMap::new(vec![region(1, 5, 1)], 6);
        let merged = fresh.with_collapsed_headers(old.collapsed_headers().iter().copied());
        assert!(merged.is_hidden_line(5));
    }

    #[test]
    fn test_innermost_region_containing() {
        let map = FoldMap::new(vec![region(0, 10, 1), region(2, 6, 2), region(3, 4, 3)], 11);
        assert_eq!(map.innermost_region_containing(3).unwrap().start_line, 3);
        assert_eq!(map.innermost_region_containing(5).unwrap().start_line, 2);
        assert_eq!(map.innermost_region_containing(9).unwrap().start_line, 0);
        assert!(map.innermost_region_containing(11).is_none());
    }
}
