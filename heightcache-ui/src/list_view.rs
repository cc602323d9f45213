use std::collections::BTreeSet;
use std::rc::Rc;

use anyhow::{anyhow, ensure, Result};
use heightcache_core::{CacheConfig, Height, IndexPath, MoveStrategy};
use tracing::{debug, trace};

use crate::events::NotificationCenter;
use crate::observed::ObservedHeightCache;

/// Minimal sectioned list that memoizes row heights.
///
/// The view owns its structure (row count per section) and a measurement
/// routine. Every structural edit is checked against the structure, applied
/// to it, then mirrored into the height cache so cached heights follow their
/// rows around.
pub struct ListView<M> {
    sections: Vec<usize>,
    measure: M,
    measure_count: usize,
    center: Rc<NotificationCenter>,
    config: CacheConfig,
    height_cache: Option<ObservedHeightCache>,
}

impl<M> ListView<M>
where
    M: FnMut(IndexPath) -> Height,
{
    pub fn new(
        center: Rc<NotificationCenter>,
        config: CacheConfig,
        sections: Vec<usize>,
        measure: M,
    ) -> Self {
        Self {
            sections,
            measure,
            measure_count: 0,
            center,
            config,
            height_cache: None,
        }
    }

    pub fn number_of_sections(&self) -> usize {
        self.sections.len()
    }

    pub fn number_of_rows(&self, section: usize) -> usize {
        self.sections.get(section).copied().unwrap_or(0)
    }

    /// Every index path of the current structure, in list order.
    pub fn index_paths(&self) -> Vec<IndexPath> {
        self.sections
            .iter()
            .enumerate()
            .flat_map(|(section, &rows)| (0..rows).map(move |row| IndexPath::new(section, row)))
            .collect()
    }

    /// How many times the measurement routine has run.
    pub fn measure_count(&self) -> usize {
        self.measure_count
    }

    /// The view's height cache, created and subscribed on first access.
    pub fn height_cache(&mut self) -> &ObservedHeightCache {
        let center = &self.center;
        let config = &self.config;
        self.height_cache.get_or_insert_with(|| {
            debug!("creating height cache");
            ObservedHeightCache::new(center, config)
        })
    }

    pub fn has_height_cache(&self) -> bool {
        self.height_cache.is_some()
    }

    /// Cached height for the row, measuring and caching it on a miss.
    pub fn height_for_row(&mut self, index_path: IndexPath) -> Result<Height> {
        self.check_index_path(index_path)?;

        let cached = {
            let cache = self.height_cache().borrow();
            if cache.exists(index_path) {
                cache.get(index_path)
            } else {
                None
            }
        };
        if let Some(height) = cached {
            trace!(%index_path, height, "height cache hit");
            return Ok(height);
        }

        let height = (self.measure)(index_path);
        self.measure_count += 1;
        trace!(%index_path, height, "measured row");
        self.height_cache().borrow_mut().set(index_path, height);
        Ok(height)
    }

    pub fn total_height(&mut self) -> Result<Height> {
        let mut total = 0.0;
        for index_path in self.index_paths() {
            total += self.height_for_row(index_path)?;
        }
        Ok(total)
    }

    /// Drop every cached height; the next lookups measure again.
    pub fn reload_data(&mut self) {
        if let Some(cache) = &self.height_cache {
            cache.borrow_mut().invalidate_all();
        }
    }

    /// Insert sections with `rows` rows each. Indices refer to the layout
    /// after the insertion.
    pub fn insert_sections(&mut self, sections: &[usize], rows: usize) -> Result<()> {
        let sections: BTreeSet<usize> = sections.iter().copied().collect();
        let mut count = self.sections.len();
        for &section in &sections {
            ensure!(
                section <= count,
                "cannot insert section {} into a list of {} sections",
                section,
                count
            );
            count += 1;
        }

        for &section in &sections {
            self.sections.insert(section, rows);
        }
        self.height_cache().borrow_mut().insert_sections(sections);
        Ok(())
    }

    pub fn delete_sections(&mut self, sections: &[usize]) -> Result<()> {
        let sections: BTreeSet<usize> = sections.iter().copied().collect();
        for &section in &sections {
            self.check_section(section)?;
        }

        for &section in sections.iter().rev() {
            self.sections.remove(section);
        }
        self.height_cache().borrow_mut().delete_sections(sections);
        Ok(())
    }

    pub fn reload_sections(&mut self, sections: &[usize]) -> Result<()> {
        for &section in sections {
            self.check_section(section)?;
        }
        self.height_cache()
            .borrow_mut()
            .reload_sections(sections.iter().copied());
        Ok(())
    }

    pub fn move_section(&mut self, section: usize, new_section: usize) -> Result<()> {
        self.check_section(section)?;
        self.check_section(new_section)?;

        match self.config.move_strategy {
            MoveStrategy::Exchange => self.sections.swap(section, new_section),
            MoveStrategy::Shift => {
                let rows = self.sections.remove(section);
                self.sections.insert(new_section, rows);
            }
        }
        self.height_cache().borrow_mut().move_section(section, new_section);
        Ok(())
    }

    /// Insert rows. Paths refer to the layout after the insertion.
    pub fn insert_rows(&mut self, index_paths: &[IndexPath]) -> Result<()> {
        let index_paths: BTreeSet<IndexPath> = index_paths.iter().copied().collect();
        let mut counts = self.sections.clone();
        for index_path in &index_paths {
            let count = counts
                .get_mut(index_path.section)
                .ok_or_else(|| anyhow!("cannot insert row {}: no such section", index_path))?;
            ensure!(
                index_path.row <= *count,
                "cannot insert row {} into a section of {} rows",
                index_path,
                count
            );
            *count += 1;
        }

        self.sections = counts;
        self.height_cache().borrow_mut().insert_rows(index_paths);
        Ok(())
    }

    /// Delete rows. Paths refer to the layout before the deletion.
    pub fn delete_rows(&mut self, index_paths: &[IndexPath]) -> Result<()> {
        let index_paths: BTreeSet<IndexPath> = index_paths.iter().copied().collect();
        for &index_path in &index_paths {
            self.check_index_path(index_path)?;
        }

        for index_path in &index_paths {
            if let Some(count) = self.sections.get_mut(index_path.section) {
                *count -= 1;
            }
        }
        self.height_cache().borrow_mut().delete_rows(index_paths);
        Ok(())
    }

    pub fn reload_rows(&mut self, index_paths: &[IndexPath]) -> Result<()> {
        for &index_path in index_paths {
            self.check_index_path(index_path)?;
        }
        self.height_cache()
            .borrow_mut()
            .reload_rows(index_paths.iter().copied());
        Ok(())
    }

    pub fn move_row(&mut self, index_path: IndexPath, new_index_path: IndexPath) -> Result<()> {
        self.check_index_path(index_path)?;

        match self.config.move_strategy {
            MoveStrategy::Exchange => self.check_index_path(new_index_path)?,
            MoveStrategy::Shift => {
                self.check_section(new_index_path.section)?;
                let limit = if index_path.section == new_index_path.section {
                    self.number_of_rows(new_index_path.section).saturating_sub(1)
                } else {
                    self.number_of_rows(new_index_path.section)
                };
                ensure!(
                    new_index_path.row <= limit,
                    "cannot move row {} to {}",
                    index_path,
                    new_index_path
                );
                if let Some(count) = self.sections.get_mut(index_path.section) {
                    *count -= 1;
                }
                if let Some(count) = self.sections.get_mut(new_index_path.section) {
                    *count += 1;
                }
            }
        }
        self.height_cache()
            .borrow_mut()
            .move_row(index_path, new_index_path);
        Ok(())
    }

    fn check_section(&self, section: usize) -> Result<()> {
        ensure!(
            section < self.sections.len(),
            "section {} is outside a list of {} sections",
            section,
            self.sections.len()
        );
        Ok(())
    }

    fn check_index_path(&self, index_path: IndexPath) -> Result<()> {
        self.check_section(index_path.section)?;
        ensure!(
            index_path.row < self.number_of_rows(index_path.section),
            "row {} is outside a section of {} rows",
            index_path,
            self.number_of_rows(index_path.section)
        );
        Ok(())
    }
}
