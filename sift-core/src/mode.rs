//! Mode selector: which result set is on screen.

use serde::{Deserialize, Serialize};

use crate::criteria::FilterCriteria;
use crate::item::Item;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    /// No filters: the period cache as-is.
    Default,
    /// A non-empty local preview.
    Preview,
    /// Authoritative server results.
    Live,
}

/// Preview beats live, live beats default.
///
/// Always derived from the inputs; callers must not cache the answer.
pub fn select_mode(criteria: &FilterCriteria, preview: Option<&[Item]>) -> DisplayMode {
    if preview.is_some_and(|p| !p.is_empty()) {
        DisplayMode::Preview
    } else if criteria.has_filters() {
        DisplayMode::Live
    } else {
        DisplayMode::Default
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precedence() {
        let none = FilterCriteria::default();
        let q = FilterCriteria::default().with_query("milk");
        let preview = vec![Item::new("1", "milk")];

        assert_eq!(select_mode(&none, None), DisplayMode::Default);
        assert_eq!(select_mode(&q, None), DisplayMode::Live);
        assert_eq!(select_mode(&q, Some(&[])), DisplayMode::Live);
        assert_eq!(select_mode(&q, Some(&preview)), DisplayMode::Preview);
    }
}
