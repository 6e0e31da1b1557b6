//! Preview evaluation over the cached period items.
//!
//! The debounce lives in `sift-search`; this is the synchronous half.

use serde::{Deserialize, Serialize};

use crate::criteria::FilterCriteria;
use crate::item::Item;
use crate::predicate::matches;

pub const DEFAULT_PREVIEW_CAP: usize = 50;
pub const DEFAULT_MIN_PREVIEW_CHARS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewRules {
    /// Maximum number of items a preview may hold.
    pub cap: usize,
    /// Shortest trimmed query that gets previewed.
    pub min_query_chars: usize,
}

impl Default for PreviewRules {
    fn default() -> Self {
        Self {
            cap: DEFAULT_PREVIEW_CAP,
            min_query_chars: DEFAULT_MIN_PREVIEW_CHARS,
        }
    }
}

impl PreviewRules {
    /// Range-bounded criteria need the full dataset, so they are never
    /// previewed from the period cache.
    pub fn is_eligible(&self, criteria: &FilterCriteria, cached_len: usize) -> bool {
        cached_len > 0
            && !criteria.has_date_range()
            && criteria.trimmed_query().chars().count() >= self.min_query_chars
    }

    /// Matching cached items in cache order, capped.
    pub fn evaluate(&self, criteria: &FilterCriteria, cached: &[Item]) -> Vec<Item> {
        cached
            .iter()
            .filter(|item| matches(item, criteria))
            .take(self.cap)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn short_queries_are_not_previewed() {
        let rules = PreviewRules::default();
        assert!(!rules.is_eligible(&FilterCriteria::default().with_query("g"), 10));
        assert!(!rules.is_eligible(&FilterCriteria::default().with_query(" g "), 10));
        assert!(rules.is_eligible(&FilterCriteria::default().with_query("gr"), 10));
    }

    #[test]
    fn date_range_or_empty_cache_disables_preview() {
        let rules = PreviewRules::default();
        let d = NaiveDate::from_ymd_opt(2025, 1, 1);
        let c = FilterCriteria::default().with_query("groceries");
        assert!(!rules.is_eligible(&c.clone().with_date_range(d, None), 10));
        assert!(!rules.is_eligible(&c.clone().with_date_range(None, d), 10));
        assert!(!rules.is_eligible(&c, 0));
    }

    #[test]
    fn evaluation_is_capped_and_keeps_cache_order() {
        let cached: Vec<Item> = (0..80)
            .map(|i| Item::new(format!("{i}"), format!("task {i}")))
            .collect();
        let rules = PreviewRules::default();
        let out = rules.evaluate(&FilterCriteria::default().with_query("task"), &cached);
        assert_eq!(out.len(), DEFAULT_PREVIEW_CAP);
        assert_eq!(out[0].id, "0");
        assert_eq!(out[49].id, "49");
    }
}
