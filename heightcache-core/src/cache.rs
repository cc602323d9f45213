use std::collections::BTreeSet;

use tracing::{debug, trace, warn};

use crate::config::{CacheConfig, MoveStrategy};
use crate::index_path::IndexPath;

pub type Height = f64;

/// Stored in every slot that is backed but has no measurement.
pub const INVALIDATED_HEIGHT: Height = -1.0;

/// Anything strictly above this counts as a cached height. Kept a hair
/// below zero so drift around `0.0` still reads as present.
pub const PRESENCE_THRESHOLD: Height = -0.000_000_000_1;

/// Row heights keyed by index path.
///
/// Storage is one `Vec` of rows per section, indexed positionally so it
/// lines up with the list's own indexing. Every mutator first grows the
/// store until the coordinates it touches are addressable, so no call can
/// go out of bounds; slots created by growth hold [`INVALIDATED_HEIGHT`].
#[derive(Debug, Clone, Default)]
pub struct IndexPathHeightCache {
    heights: Vec<Vec<Height>>,
    move_strategy: MoveStrategy,
}

impl IndexPathHeightCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_move_strategy(move_strategy: MoveStrategy) -> Self {
        Self {
            heights: Vec::new(),
            move_strategy,
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::with_move_strategy(config.move_strategy)
    }

    pub fn move_strategy(&self) -> MoveStrategy {
        self.move_strategy
    }

    /// Raw slot value, or `None` when the path is not backed.
    ///
    /// A backed but unmeasured slot yields `Some(INVALIDATED_HEIGHT)`; use
    /// [`exists`](Self::exists) to ask whether a usable height is cached.
    pub fn get(&self, index_path: IndexPath) -> Option<Height> {
        self.heights
            .get(index_path.section)
            .and_then(|rows| rows.get(index_path.row))
            .copied()
    }

    /// Cache a measured height, growing the store as needed.
    pub fn set(&mut self, index_path: IndexPath, height: Height) {
        if height < 0.0 {
            warn!(%index_path, height, "caching a negative row height");
        }
        self.write(index_path, height);
    }

    pub fn exists(&self, index_path: IndexPath) -> bool {
        matches!(self.get(index_path), Some(height) if height > PRESENCE_THRESHOLD)
    }

    pub fn invalidate(&mut self, index_path: IndexPath) {
        self.write(index_path, INVALIDATED_HEIGHT);
    }

    /// Forget everything, including the shape of the store.
    pub fn invalidate_all(&mut self) {
        debug!(sections = self.heights.len(), "invalidating all cached heights");
        self.heights = Vec::new();
    }

    pub fn section_count(&self) -> usize {
        self.heights.len()
    }

    /// Backed rows in `section`; zero when the section is not backed.
    pub fn row_count(&self, section: usize) -> usize {
        self.heights.get(section).map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.heights.is_empty()
    }

    /// Read-only view of the whole store, one slice of slots per section.
    pub fn sections(&self) -> &[Vec<Height>] {
        &self.heights
    }

    // Growth

    /// Append empty sections until `section` is addressable.
    pub fn ensure_section(&mut self, section: usize) {
        if section >= self.heights.len() {
            trace!(from = self.heights.len(), to = section + 1, "growing sections");
            self.heights.resize_with(section + 1, Vec::new);
        }
    }

    /// Append unmeasured slots until `row` is addressable in `section`.
    /// Does nothing if the section itself is not backed yet.
    pub fn ensure_row(&mut self, section: usize, row: usize) {
        if let Some(rows) = self.heights.get_mut(section) {
            if row >= rows.len() {
                trace!(section, from = rows.len(), to = row + 1, "growing rows");
                rows.resize(row + 1, INVALIDATED_HEIGHT);
            }
        }
    }

    pub fn ensure_index_path(&mut self, index_path: IndexPath) {
        self.ensure_section(index_path.section);
        self.ensure_row(index_path.section, index_path.row);
    }

    // Section edits

    /// Insert empty sections. Indices are applied lowest first so each one
    /// refers to the layout after the previous insertions.
    pub fn insert_sections<I>(&mut self, sections: I)
    where
        I: IntoIterator<Item = usize>,
    {
        let sections: BTreeSet<usize> = sections.into_iter().collect();
        debug!(?sections, "insert sections");
        for section in sections {
            self.ensure_section(section);
            self.heights.insert(section, Vec::new());
        }
    }

    /// Remove sections. Indices are applied highest first so each one still
    /// refers to the layout before the edit.
    pub fn delete_sections<I>(&mut self, sections: I)
    where
        I: IntoIterator<Item = usize>,
    {
        let sections: BTreeSet<usize> = sections.into_iter().collect();
        debug!(?sections, "delete sections");
        for section in sections.into_iter().rev() {
            self.ensure_section(section);
            self.heights.remove(section);
        }
    }

    /// Drop every cached row of the given sections, keeping the sections.
    pub fn reload_sections<I>(&mut self, sections: I)
    where
        I: IntoIterator<Item = usize>,
    {
        for section in sections {
            debug!(section, "reload section");
            self.ensure_section(section);
            if let Some(rows) = self.heights.get_mut(section) {
                *rows = Vec::new();
            }
        }
    }

    pub fn move_section(&mut self, section: usize, new_section: usize) {
        debug!(section, new_section, strategy = ?self.move_strategy, "move section");
        self.ensure_section(section);
        self.ensure_section(new_section);
        match self.move_strategy {
            MoveStrategy::Exchange => self.heights.swap(section, new_section),
            MoveStrategy::Shift => {
                let rows = self.heights.remove(section);
                self.heights.insert(new_section, rows);
            }
        }
    }

    // Row edits

    /// Insert unmeasured slots, lowest path first.
    pub fn insert_rows<I>(&mut self, index_paths: I)
    where
        I: IntoIterator<Item = IndexPath>,
    {
        let index_paths: BTreeSet<IndexPath> = index_paths.into_iter().collect();
        debug!(count = index_paths.len(), "insert rows");
        for index_path in index_paths {
            self.ensure_index_path(index_path);
            if let Some(rows) = self.heights.get_mut(index_path.section) {
                rows.insert(index_path.row, INVALIDATED_HEIGHT);
            }
        }
    }

    /// Remove slots, highest path first, so the caller may pass the paths in
    /// any order and each one still refers to the layout before the edit.
    pub fn delete_rows<I>(&mut self, index_paths: I)
    where
        I: IntoIterator<Item = IndexPath>,
    {
        let index_paths: BTreeSet<IndexPath> = index_paths.into_iter().collect();
        debug!(count = index_paths.len(), "delete rows");
        for index_path in index_paths.into_iter().rev() {
            self.ensure_index_path(index_path);
            if let Some(rows) = self.heights.get_mut(index_path.section) {
                rows.remove(index_path.row);
            }
        }
    }

    /// Blank the given slots without removing them.
    pub fn reload_rows<I>(&mut self, index_paths: I)
    where
        I: IntoIterator<Item = IndexPath>,
    {
        for index_path in index_paths {
            self.invalidate(index_path);
        }
    }

    pub fn move_row(&mut self, index_path: IndexPath, new_index_path: IndexPath) {
        debug!(%index_path, %new_index_path, strategy = ?self.move_strategy, "move row");
        self.ensure_index_path(index_path);
        self.ensure_index_path(new_index_path);
        match self.move_strategy {
            MoveStrategy::Exchange => {
                if index_path.section == new_index_path.section {
                    if let Some(rows) = self.heights.get_mut(index_path.section) {
                        rows.swap(index_path.row, new_index_path.row);
                    }
                } else if let (Some(a), Some(b)) = (self.get(index_path), self.get(new_index_path)) {
                    self.write(index_path, b);
                    self.write(new_index_path, a);
                }
            }
            MoveStrategy::Shift => {
                let height = match self.heights.get_mut(index_path.section) {
                    Some(rows) => rows.remove(index_path.row),
                    None => return,
                };
                if let Some(rows) = self.heights.get_mut(new_index_path.section) {
                    let row = new_index_path.row.min(rows.len());
                    rows.insert(row, height);
                }
            }
        }
    }

    fn write(&mut self, index_path: IndexPath, height: Height) {
        self.ensure_index_path(index_path);
        if let Some(slot) = self
            .heights
            .get_mut(index_path.section)
            .and_then(|rows| rows.get_mut(index_path.row))
        {
            *slot = height;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ip(section: usize, row: usize) -> IndexPath {
        IndexPath::new(section, row)
    }

    /// Section 0 holds rows measured as 0.0, 10.0, 20.0, ...
    fn filled(rows: usize) -> IndexPathHeightCache {
        let mut cache = IndexPathHeightCache::new();
        for row in 0..rows {
            cache.set(ip(0, row), row as f64 * 10.0);
        }
        cache
    }

    fn shape(cache: &IndexPathHeightCache) -> Vec<usize> {
        (0..cache.section_count()).map(|s| cache.row_count(s)).collect()
    }

    #[test]
    fn empty_cache_has_nothing() {
        let cache = IndexPathHeightCache::new();
        assert!(cache.is_empty());
        assert_eq!(cache.get(ip(0, 0)), None);
        assert!(!cache.exists(ip(0, 0)));
    }

    #[test]
    fn set_then_get_round_trips() {
        let mut cache = IndexPathHeightCache::new();
        cache.set(ip(2, 5), 44.5);
        assert_eq!(cache.get(ip(2, 5)), Some(44.5));
        assert!(cache.exists(ip(2, 5)));

        cache.set(ip(2, 5), 0.0);
        assert_eq!(cache.get(ip(2, 5)), Some(0.0));
        assert!(cache.exists(ip(2, 5)));
    }

    #[test]
    fn set_far_away_grows_with_unmeasured_slots() {
        let mut cache = IndexPathHeightCache::new();
        cache.set(ip(3, 3), 10.0);

        assert_eq!(shape(&cache), vec![0, 0, 0, 4]);
        for row in 0..3 {
            assert_eq!(cache.get(ip(3, row)), Some(INVALIDATED_HEIGHT));
            assert!(!cache.exists(ip(3, row)));
        }
        assert_eq!(cache.get(ip(0, 0)), None);
        assert!(cache.exists(ip(3, 3)));
        assert_eq!(cache.get(ip(3, 4)), None);
    }

    #[test]
    fn growth_is_idempotent() {
        let mut once = IndexPathHeightCache::new();
        once.ensure_index_path(ip(2, 4));

        let mut twice = IndexPathHeightCache::new();
        twice.ensure_index_path(ip(2, 4));
        twice.ensure_index_path(ip(2, 4));
        twice.ensure_section(1);
        twice.ensure_row(2, 3);

        assert_eq!(once.sections(), twice.sections());
        assert_eq!(shape(&once), vec![0, 0, 5]);
    }

    #[test]
    fn ensure_row_ignores_unbacked_section() {
        let mut cache = IndexPathHeightCache::new();
        cache.ensure_row(4, 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn invalidate_keeps_slot_but_blanks_it() {
        let mut cache = filled(3);
        cache.invalidate(ip(0, 1));
        assert!(!cache.exists(ip(0, 1)));
        assert_eq!(cache.get(ip(0, 1)), Some(INVALIDATED_HEIGHT));
        assert!(cache.exists(ip(0, 2)));

        // beyond bounds: records the slot as backed
        cache.invalidate(ip(1, 2));
        assert_eq!(shape(&cache), vec![3, 3]);
        assert_eq!(cache.get(ip(1, 2)), Some(INVALIDATED_HEIGHT));
    }

    #[test]
    fn presence_uses_threshold() {
        let mut cache = IndexPathHeightCache::new();
        cache.set(ip(0, 0), -0.000_000_000_01);
        assert!(cache.exists(ip(0, 0)));
        cache.set(ip(0, 0), -0.5);
        assert!(!cache.exists(ip(0, 0)));
    }

    #[test]
    fn invalidate_all_discards_shape() {
        let mut cache = filled(4);
        cache.set(ip(2, 2), 8.0);
        cache.invalidate_all();

        assert!(cache.is_empty());
        assert_eq!(cache.get(ip(0, 0)), None);
        assert_eq!(cache.get(ip(2, 2)), None);
    }

    #[test]
    fn insert_section_shifts_existing_sections() {
        let mut cache = IndexPathHeightCache::new();
        cache.set(ip(0, 0), 44.0);
        cache.set(ip(0, 1), 22.0);

        cache.insert_sections([0]);

        assert_eq!(cache.get(ip(1, 0)), Some(44.0));
        assert_eq!(cache.get(ip(1, 1)), Some(22.0));
        assert_eq!(cache.get(ip(0, 0)), None);
    }

    #[test]
    fn insert_sections_apply_lowest_first() {
        let mut cache = IndexPathHeightCache::new();
        cache.set(ip(0, 0), 1.0);
        cache.set(ip(1, 0), 2.0);

        // new sections end up at 0 and 2 of the final layout
        cache.insert_sections([2, 0]);

        assert_eq!(shape(&cache), vec![0, 1, 0, 1]);
        assert_eq!(cache.get(ip(1, 0)), Some(1.0));
        assert_eq!(cache.get(ip(3, 0)), Some(2.0));
    }

    #[test]
    fn insert_section_beyond_bounds_grows_first() {
        let mut cache = IndexPathHeightCache::new();
        cache.insert_sections([2]);
        assert_eq!(cache.section_count(), 4);
    }

    #[test]
    fn delete_sections_apply_highest_first() {
        let mut cache = IndexPathHeightCache::new();
        for section in 0..5 {
            cache.set(ip(section, 0), section as f64);
        }

        cache.delete_sections([1, 3]);

        assert_eq!(cache.section_count(), 3);
        assert_eq!(cache.get(ip(0, 0)), Some(0.0));
        assert_eq!(cache.get(ip(1, 0)), Some(2.0));
        assert_eq!(cache.get(ip(2, 0)), Some(4.0));
    }

    #[test]
    fn delete_section_out_of_bounds_is_harmless() {
        let mut cache = filled(2);
        cache.delete_sections([3]);
        // grown to four sections, then the last removed
        assert_eq!(shape(&cache), vec![2, 0, 0]);
        assert_eq!(cache.get(ip(0, 1)), Some(10.0));
    }

    #[test]
    fn reload_sections_empties_rows_but_keeps_section() {
        let mut cache = filled(3);
        cache.set(ip(1, 0), 5.0);

        cache.reload_sections([0, 4]);

        assert_eq!(shape(&cache), vec![0, 1, 0, 0, 0]);
        assert_eq!(cache.get(ip(0, 0)), None);
        assert_eq!(cache.get(ip(1, 0)), Some(5.0));
    }

    #[test]
    fn move_section_exchanges_contents() {
        let mut cache = IndexPathHeightCache::new();
        for section in 0..6 {
            for row in 0..=section {
                cache.set(ip(section, row), (section * 10 + row) as f64);
            }
        }
        let before = cache.sections().to_vec();

        cache.move_section(2, 5);

        assert_eq!(cache.sections()[2], before[5]);
        assert_eq!(cache.sections()[5], before[2]);
        for section in [0, 1, 3, 4] {
            assert_eq!(cache.sections()[section], before[section]);
        }

        cache.move_section(2, 5);
        assert_eq!(cache.sections(), before.as_slice());
    }

    #[test]
    fn move_section_shift_slides_in_between() {
        let mut cache = IndexPathHeightCache::with_move_strategy(MoveStrategy::Shift);
        for section in 0..4 {
            cache.set(ip(section, 0), section as f64);
        }

        cache.move_section(0, 2);

        let firsts: Vec<_> = (0..4).map(|s| cache.get(ip(s, 0))).collect();
        assert_eq!(firsts, vec![Some(1.0), Some(2.0), Some(0.0), Some(3.0)]);
    }

    #[test]
    fn move_section_grows_to_reach_target() {
        let mut cache = filled(1);
        cache.move_section(0, 3);
        assert_eq!(shape(&cache), vec![0, 0, 0, 1]);
        assert_eq!(cache.get(ip(3, 0)), Some(0.0));
    }

    #[test]
    fn insert_rows_shifts_later_rows() {
        let mut cache = filled(3);
        cache.insert_rows([ip(0, 1)]);

        assert_eq!(cache.row_count(0), 4);
        assert_eq!(cache.get(ip(0, 0)), Some(0.0));
        assert_eq!(cache.get(ip(0, 1)), Some(INVALIDATED_HEIGHT));
        assert_eq!(cache.get(ip(0, 2)), Some(10.0));
        assert_eq!(cache.get(ip(0, 3)), Some(20.0));
    }

    #[test]
    fn insert_rows_out_of_bounds_grows_first() {
        let mut cache = IndexPathHeightCache::new();
        cache.insert_rows([ip(1, 2)]);
        // grown to three rows, then one more inserted
        assert_eq!(shape(&cache), vec![0, 4]);
        assert!(!cache.exists(ip(1, 3)));
    }

    #[test]
    fn insert_then_delete_row_restores_section() {
        let mut cache = filled(6);
        let before = cache.sections().to_vec();

        cache.insert_rows([ip(0, 2)]);
        cache.set(ip(0, 2), 99.0);
        cache.delete_rows([ip(0, 2)]);

        assert_eq!(cache.sections(), before.as_slice());
    }

    #[test]
    fn delete_rows_order_does_not_matter() {
        let mut batch = filled(10);
        batch.delete_rows([ip(0, 5), ip(0, 2), ip(0, 8)]);

        let mut one_by_one = filled(10);
        for row in [8, 5, 2] {
            one_by_one.delete_rows([ip(0, row)]);
        }

        assert_eq!(batch.sections(), one_by_one.sections());
        let remaining: Vec<_> = batch.sections()[0].clone();
        assert_eq!(remaining, vec![0.0, 10.0, 30.0, 40.0, 60.0, 70.0, 90.0]);
    }

    #[test]
    fn delete_rows_across_sections() {
        let mut cache = IndexPathHeightCache::new();
        for section in 0..2 {
            for row in 0..4 {
                cache.set(ip(section, row), (section * 10 + row) as f64);
            }
        }

        cache.delete_rows([ip(0, 1), ip(1, 0), ip(0, 3)]);

        assert_eq!(cache.sections()[0], vec![0.0, 2.0]);
        assert_eq!(cache.sections()[1], vec![11.0, 12.0, 13.0]);
    }

    #[test]
    fn reload_rows_blanks_without_removing() {
        let mut cache = filled(3);
        cache.reload_rows([ip(0, 0), ip(0, 2)]);

        assert_eq!(cache.row_count(0), 3);
        assert!(!cache.exists(ip(0, 0)));
        assert!(cache.exists(ip(0, 1)));
        assert!(!cache.exists(ip(0, 2)));
    }

    // Swapping a slot with itself would leave the store untouched; a move
    // has to relocate the cached height.
    #[test]
    fn move_row_relocates_height_instead_of_no_op() {
        let mut cache = filled(4);
        cache.move_row(ip(0, 0), ip(0, 3));

        assert_eq!(cache.get(ip(0, 0)), Some(30.0));
        assert_eq!(cache.get(ip(0, 3)), Some(0.0));
        assert_eq!(cache.get(ip(0, 1)), Some(10.0));
    }

    #[test]
    fn move_row_across_sections_exchanges() {
        let mut cache = filled(2);
        cache.set(ip(1, 0), 7.0);

        cache.move_row(ip(0, 1), ip(1, 2));

        assert_eq!(cache.get(ip(0, 1)), Some(INVALIDATED_HEIGHT));
        assert_eq!(cache.get(ip(1, 2)), Some(10.0));
        assert_eq!(cache.get(ip(1, 0)), Some(7.0));
    }

    #[test]
    fn move_row_shift_slides_rows() {
        let mut cache = IndexPathHeightCache::with_move_strategy(MoveStrategy::Shift);
        for row in 0..4 {
            cache.set(ip(0, row), row as f64);
        }

        cache.move_row(ip(0, 0), ip(0, 3));
        assert_eq!(cache.sections()[0], vec![1.0, 2.0, 3.0, 0.0]);

        cache.set(ip(1, 0), 9.0);
        cache.move_row(ip(0, 3), ip(1, 0));
        assert_eq!(cache.sections()[0], vec![1.0, 2.0, 3.0]);
        assert_eq!(cache.sections()[1], vec![0.0, 9.0]);
    }

    #[test]
    fn from_config_picks_strategy() {
        let config = CacheConfig {
            move_strategy: MoveStrategy::Shift,
            ..CacheConfig::default()
        };
        let cache = IndexPathHeightCache::from_config(&config);
        assert_eq!(cache.move_strategy(), MoveStrategy::Shift);
    }
}
