use std::cmp::Ordering;

use tracing::{debug, info};
use uuid::Uuid;

use super::data::{clamp_ratio, floor_counter, Pattern};
use super::draft::PatternDraft;
use super::error::ValidationError;
use super::preferences::KeyValueStore;
use super::store::PatternStore;

/// Fields to change in a progress update; `None` leaves a field as is
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProgressUpdate {
    pub round: Option<i64>,
    pub stitch: Option<i64>,
    pub x_ratio: Option<f64>,
    pub y_ratio: Option<f64>,
}

impl ProgressUpdate {
    pub fn round(round: i64) -> Self {
        Self {
            round: Some(round),
            ..Self::default()
        }
    }

    pub fn stitch(stitch: i64) -> Self {
        Self {
            stitch: Some(stitch),
            ..Self::default()
        }
    }

    pub fn marker(x_ratio: f64, y_ratio: f64) -> Self {
        Self {
            x_ratio: Some(x_ratio),
            y_ratio: Some(y_ratio),
            ..Self::default()
        }
    }
}

/// Start-date ordering for the works gallery
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DateOrder {
    /// Oldest first, undated works last
    EarliestFirst,
    /// Newest first, undated works first
    #[default]
    LatestFirst,
}

/// The authoritative in-memory pattern list.
///
/// Every mutation writes the full list through to the store before returning.
pub struct PatternRegistry<S: KeyValueStore> {
    store: PatternStore<S>,
    patterns: Vec<Pattern>,
}

impl<S: KeyValueStore> PatternRegistry<S> {
    /// Load the list once from the store
    pub fn open(store: PatternStore<S>) -> Self {
        let patterns = store.load();
        info!(count = patterns.len(), "pattern registry loaded");
        Self { store, patterns }
    }

    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    pub fn get(&self, id: Uuid) -> Option<&Pattern> {
        self.patterns.iter().find(|p| p.id == id)
    }

    pub fn index_of(&self, id: Uuid) -> Option<usize> {
        self.patterns.iter().position(|p| p.id == id)
    }

    /// Insert at the front (newest first). Returns the new index.
    pub fn add(&mut self, pattern: Pattern) -> usize {
        debug!(id = %pattern.id, name = %pattern.name, "adding pattern");
        self.patterns.insert(0, pattern);
        self.persist();
        0
    }

    /// Validate a draft and add the resulting pattern.
    ///
    /// Rejected drafts leave the list and the store untouched.
    pub fn create(&mut self, draft: &PatternDraft) -> Result<Uuid, ValidationError> {
        let pattern = draft.to_pattern()?;
        let id = pattern.id;
        self.add(pattern);
        Ok(id)
    }

    /// Replace the pattern with the same id. Returns false if there is none.
    pub fn update(&mut self, pattern: Pattern) -> bool {
        let Some(idx) = self.index_of(pattern.id) else {
            return false;
        };
        self.patterns[idx] = pattern;
        self.persist();
        true
    }

    /// Remove the patterns at the given positions of the current list.
    ///
    /// Out-of-range and repeated positions are ignored.
    pub fn delete(&mut self, indices: &[usize]) {
        let mut indices: Vec<usize> = indices
            .iter()
            .copied()
            .filter(|&i| i < self.patterns.len())
            .collect();
        indices.sort_unstable_by(|a, b| b.cmp(a));
        indices.dedup();
        for idx in indices {
            let removed = self.patterns.remove(idx);
            debug!(id = %removed.id, "deleted pattern");
        }
        self.persist();
    }

    /// Remove the pattern with this id. Returns false if there is none.
    pub fn delete_by_id(&mut self, id: Uuid) -> bool {
        match self.index_of(id) {
            Some(idx) => {
                self.delete(&[idx]);
                true
            }
            None => false,
        }
    }

    /// Flip the star on an existing pattern and save the edited record.
    pub fn toggle_star(&mut self, id: Uuid) -> bool {
        let Some(mut pattern) = self.get(id).cloned() else {
            return false;
        };
        pattern.is_starred = !pattern.is_starred;
        self.update(pattern)
    }

    /// Counters back to 0 and marker back to the center.
    pub fn reset_progress(&mut self, id: Uuid) -> bool {
        let Some(pattern) = self.patterns.iter_mut().find(|p| p.id == id) else {
            return false;
        };
        pattern.reset_progress();
        self.persist();
        true
    }

    /// Apply the provided progress fields, flooring counters at 0 and
    /// clamping marker ratios into [0, 1].
    pub fn update_progress(&mut self, id: Uuid, update: ProgressUpdate) -> bool {
        let Some(pattern) = self.patterns.iter_mut().find(|p| p.id == id) else {
            return false;
        };
        if let Some(round) = update.round {
            pattern.current_round = floor_counter(round);
        }
        if let Some(stitch) = update.stitch {
            pattern.current_stitch = floor_counter(stitch);
        }
        if let Some(x) = update.x_ratio {
            pattern.marker_x_ratio = clamp_ratio(x);
        }
        if let Some(y) = update.y_ratio {
            pattern.marker_y_ratio = clamp_ratio(y);
        }
        self.persist();
        true
    }

    /// Library patterns (not in the works gallery), in list order
    pub fn collection(&self) -> impl Iterator<Item = &Pattern> {
        self.patterns.iter().filter(|p| !p.is_in_works)
    }

    /// Works gallery patterns sorted by start date
    pub fn works_sorted(&self, order: DateOrder) -> Vec<&Pattern> {
        let mut works: Vec<&Pattern> = self.patterns.iter().filter(|p| p.is_in_works).collect();
        works.sort_by(|a, b| match (a.start_date, b.start_date) {
            (Some(da), Some(db)) => match order {
                DateOrder::EarliestFirst => da.cmp(&db),
                DateOrder::LatestFirst => db.cmp(&da),
            },
            (None, Some(_)) => match order {
                DateOrder::EarliestFirst => Ordering::Greater,
                DateOrder::LatestFirst => Ordering::Less,
            },
            (Some(_), None) => match order {
                DateOrder::EarliestFirst => Ordering::Less,
                DateOrder::LatestFirst => Ordering::Greater,
            },
            (None, None) => Ordering::Equal,
        });
        works
    }

    fn persist(&self) {
        self.store.save(&self.patterns);
    }

    #[cfg(test)]
    pub(crate) fn store(&self) -> &PatternStore<S> {
        &self.store
    }
}
