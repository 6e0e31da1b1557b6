//! Debounced preview over the cached period items.

use sift_core::{FilterCriteria, Item, PreviewRules};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

use crate::debounce::{Debouncer, Fired};

/// What `schedule_preview` did with the criteria.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewSchedule {
    /// Evaluation will run once the quiet period elapses.
    Scheduled,
    /// Not previewable; any pending evaluation was cancelled and the
    /// current preview must be dropped now.
    Cleared,
}

#[derive(Debug)]
pub struct PreviewFilter {
    rules: PreviewRules,
    debouncer: Debouncer<FilterCriteria>,
}

impl PreviewFilter {
    pub fn new(
        rules: PreviewRules,
        delay: Duration,
        tx: mpsc::UnboundedSender<Fired<FilterCriteria>>,
    ) -> Self {
        Self {
            rules,
            debouncer: Debouncer::new(delay, tx),
        }
    }

    pub fn schedule_preview(
        &mut self,
        criteria: &FilterCriteria,
        cached_len: usize,
    ) -> PreviewSchedule {
        if self.rules.is_eligible(criteria, cached_len) {
            self.debouncer.schedule(criteria.clone());
            PreviewSchedule::Scheduled
        } else {
            self.debouncer.cancel();
            PreviewSchedule::Cleared
        }
    }

    pub fn cancel(&mut self) {
        self.debouncer.cancel();
    }

    pub fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// Accept a firing if it is still the pending schedule.
    pub fn claim(&mut self, fired: Fired<FilterCriteria>) -> Option<FilterCriteria> {
        self.debouncer.claim(fired)
    }

    /// Evaluate claimed criteria against the cache as it is now.
    ///
    /// `None` means there is nothing to show: the cache no longer
    /// qualifies or nothing matched.
    pub fn evaluate(&self, criteria: &FilterCriteria, cached: &[Item]) -> Option<Vec<Item>> {
        if !self.rules.is_eligible(criteria, cached.len()) {
            return None;
        }
        let hits = self.rules.evaluate(criteria, cached);
        debug!(query = criteria.trimmed_query(), hits = hits.len(), "preview evaluated");
        (!hits.is_empty()).then_some(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn cache() -> Vec<Item> {
        (0..60)
            .map(|i| Item::new(i.to_string(), if i % 2 == 0 { "milk run" } else { "other" }))
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn eligible_query_is_evaluated_after_delay() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut p = PreviewFilter::new(PreviewRules::default(), Duration::from_millis(200), tx);
        let c = FilterCriteria::default().with_query("milk");
        assert_eq!(p.schedule_preview(&c, 60), PreviewSchedule::Scheduled);

        let claimed = p.claim(rx.recv().await.unwrap()).unwrap();
        let hits = p.evaluate(&claimed, &cache()).unwrap();
        assert_eq!(hits.len(), 30);
        assert_eq!(hits[0].id, "0");
    }

    #[tokio::test(start_paused = true)]
    async fn ineligible_criteria_clear_and_cancel() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut p = PreviewFilter::new(PreviewRules::default(), Duration::from_millis(200), tx);
        p.schedule_preview(&FilterCriteria::default().with_query("milk"), 60);

        let ranged = FilterCriteria::default()
            .with_query("milk")
            .with_date_range(NaiveDate::from_ymd_opt(2025, 1, 1), None);
        assert_eq!(p.schedule_preview(&ranged, 60), PreviewSchedule::Cleared);
        assert!(!p.is_pending());
        assert!(tokio::time::timeout(Duration::from_secs(1), rx.recv()).await.is_err());

        let short = FilterCriteria::default().with_query("m");
        assert_eq!(p.schedule_preview(&short, 60), PreviewSchedule::Cleared);
        let any = FilterCriteria::default().with_query("milk");
        assert_eq!(p.schedule_preview(&any, 0), PreviewSchedule::Cleared);
    }

    #[tokio::test(start_paused = true)]
    async fn no_match_yields_none() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut p = PreviewFilter::new(PreviewRules::default(), Duration::from_millis(10), tx);
        p.schedule_preview(&FilterCriteria::default().with_query("zzz"), 60);
        let claimed = p.claim(rx.recv().await.unwrap()).unwrap();
        assert_eq!(p.evaluate(&claimed, &cache()), None);
    }

    #[tokio::test(start_paused = true)]
    async fn emptied_cache_at_fire_time_yields_none() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut p = PreviewFilter::new(PreviewRules::default(), Duration::from_millis(10), tx);
        p.schedule_preview(&FilterCriteria::default().with_query("milk"), 60);
        let claimed = p.claim(rx.recv().await.unwrap()).unwrap();
        assert_eq!(p.evaluate(&claimed, &[]), None);
    }
}
