//! Request supersession.
//!
//! Every authoritative query gets a sequence id from a counter owned by one
//! `RequestSequencer`. A response is applied only if its id is still the
//! latest issued; anything older is dropped without touching state. Arrival
//! order does not matter, only issue order does.

use anyhow::Result;
use sift_core::{FilterCriteria, ResultPage};
use tracing::{debug, warn};

/// Immutable snapshot of the criteria a query was issued with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub sequence_id: u64,
    pub criteria: FilterCriteria,
}

#[derive(Debug, Default)]
pub struct RequestSequencer {
    latest: u64,
    /// Ids at or below this are stale even if nothing newer was issued.
    retired: u64,
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self, criteria: FilterCriteria) -> SearchRequest {
        self.latest += 1;
        SearchRequest {
            sequence_id: self.latest,
            criteria,
        }
    }

    /// 0 until the first request is issued.
    pub fn current_sequence_id(&self) -> u64 {
        self.latest
    }

    /// Make every id issued so far stale without issuing a new one.
    pub fn retire_all(&mut self) {
        self.retired = self.latest;
    }

    pub fn is_current(&self, sequence_id: u64) -> bool {
        sequence_id > self.retired && sequence_id == self.latest
    }
}

/// Authoritative result currently held for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiveResult {
    Page(ResultPage),
    /// The current request failed; show the period cache instead.
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Applied,
    FellBack,
    Discarded,
}

#[derive(Debug, Default)]
pub struct LiveState {
    sequencer: RequestSequencer,
    result: Option<LiveResult>,
    in_flight: bool,
}

impl LiveState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self, criteria: FilterCriteria) -> SearchRequest {
        self.in_flight = true;
        self.sequencer.issue(criteria)
    }

    pub fn current_sequence_id(&self) -> u64 {
        self.sequencer.current_sequence_id()
    }

    /// Handle a response for `sequence_id`.
    pub fn resolve(&mut self, sequence_id: u64, outcome: Result<ResultPage>) -> Resolution {
        if !self.sequencer.is_current(sequence_id) {
            debug!(
                sequence_id,
                current = self.sequencer.current_sequence_id(),
                "discarding superseded search response"
            );
            return Resolution::Discarded;
        }

        self.in_flight = false;
        match outcome {
            Ok(page) => {
                self.result = Some(LiveResult::Page(page));
                Resolution::Applied
            }
            Err(e) => {
                warn!(sequence_id, error = %e, "search failed; showing period cache");
                self.result = Some(LiveResult::Fallback);
                Resolution::FellBack
            }
        }
    }

    pub fn result(&self) -> Option<&LiveResult> {
        self.result.as_ref()
    }

    pub fn result_mut(&mut self) -> Option<&mut LiveResult> {
        self.result.as_mut()
    }

    /// True while the latest issued request has not answered.
    pub fn is_loading(&self) -> bool {
        self.in_flight
    }

    /// The criteria changed: drop the held result and make every
    /// outstanding request stale.
    pub fn supersede(&mut self) {
        self.sequencer.retire_all();
        self.result = None;
        self.in_flight = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use proptest::prelude::*;
    use sift_core::Item;

    fn page_for(seq: u64) -> ResultPage {
        ResultPage {
            items: vec![Item::new(format!("r{seq}"), "x")],
            total: seq as usize,
            page: 1,
        }
    }

    #[test]
    fn sequence_ids_strictly_increase() {
        let mut s = RequestSequencer::new();
        assert_eq!(s.current_sequence_id(), 0);
        assert!(!s.is_current(0));
        let a = s.issue(FilterCriteria::default());
        let b = s.issue(FilterCriteria::default());
        assert!(b.sequence_id > a.sequence_id);
        assert!(s.is_current(b.sequence_id));
        assert!(!s.is_current(a.sequence_id));
    }

    #[test]
    fn late_stale_response_is_discarded() {
        let mut live = LiveState::new();
        let first = live.issue(FilterCriteria::default().with_query("a"));
        let second = live.issue(FilterCriteria::default().with_query("ab"));

        assert_eq!(live.resolve(second.sequence_id, Ok(page_for(2))), Resolution::Applied);
        assert_eq!(live.resolve(first.sequence_id, Ok(page_for(1))), Resolution::Discarded);
        assert_eq!(live.result(), Some(&LiveResult::Page(page_for(2))));
        assert!(!live.is_loading());
    }

    #[test]
    fn early_stale_response_is_discarded_too() {
        let mut live = LiveState::new();
        let first = live.issue(FilterCriteria::default());
        let _second = live.issue(FilterCriteria::default());

        assert_eq!(live.resolve(first.sequence_id, Ok(page_for(1))), Resolution::Discarded);
        assert_eq!(live.result(), None);
        assert!(live.is_loading());
    }

    #[test]
    fn supersede_without_issuing_retires_the_outstanding_request() {
        let mut live = LiveState::new();
        let old = live.issue(FilterCriteria::default().with_page(2));
        live.supersede();

        assert!(!live.is_loading());
        assert_eq!(live.current_sequence_id(), old.sequence_id);
        assert_eq!(live.resolve(old.sequence_id, Ok(page_for(1))), Resolution::Discarded);
        assert_eq!(live.result(), None);

        let next = live.issue(FilterCriteria::default());
        assert!(next.sequence_id > old.sequence_id);
        assert_eq!(live.resolve(next.sequence_id, Ok(page_for(2))), Resolution::Applied);
    }

    #[test]
    fn failure_of_current_request_falls_back() {
        let mut live = LiveState::new();
        let req = live.issue(FilterCriteria::default());
        assert_eq!(live.resolve(req.sequence_id, Err(anyhow!("503"))), Resolution::FellBack);
        assert_eq!(live.result(), Some(&LiveResult::Fallback));
    }

    #[test]
    fn failure_of_stale_request_changes_nothing() {
        let mut live = LiveState::new();
        let old = live.issue(FilterCriteria::default());
        let new = live.issue(FilterCriteria::default());
        live.resolve(new.sequence_id, Ok(page_for(2)));
        assert_eq!(live.resolve(old.sequence_id, Err(anyhow!("timeout"))), Resolution::Discarded);
        assert_eq!(live.result(), Some(&LiveResult::Page(page_for(2))));
    }

    proptest! {
        /// Whatever order responses arrive in, only the last-issued request
        /// can ever land, and once it has it stays.
        #[test]
        fn latest_issued_wins_under_any_arrival_order(
            order in (1usize..10)
                .prop_flat_map(|n| Just((1..=n as u64).collect::<Vec<_>>()).prop_shuffle())
        ) {
            let n = order.len() as u64;
            let mut live = LiveState::new();
            for _ in 0..n {
                live.issue(FilterCriteria::default());
            }

            let mut latest_seen = false;
            for seq in order {
                let res = live.resolve(seq, Ok(page_for(seq)));
                if seq == n {
                    latest_seen = true;
                    prop_assert_eq!(res, Resolution::Applied);
                } else {
                    prop_assert_eq!(res, Resolution::Discarded);
                }
                if latest_seen {
                    prop_assert_eq!(live.result(), Some(&LiveResult::Page(page_for(n))));
                } else {
                    prop_assert_eq!(live.result(), None);
                }
            }
            prop_assert!(latest_seen);
        }
    }
}
