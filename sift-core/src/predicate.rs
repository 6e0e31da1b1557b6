//! Filter predicate evaluator.
//!
//! Pure functions over `Item` + `FilterCriteria`. The preview filter, the
//! in-memory backend and the provisional live view all go through here so a
//! given item is judged the same way everywhere.

use chrono::NaiveDate;
use std::cmp::{Ordering, Reverse};

use crate::criteria::{FilterCriteria, SortBy};
use crate::item::Item;

/// Does `item` satisfy every filter in `criteria`?
///
/// Sort and paging fields are ignored.
pub fn matches(item: &Item, criteria: &FilterCriteria) -> bool {
    matches_text(item, criteria.trimmed_query())
        && criteria.tags.iter().all(|tag| item.has_tag(tag))
        && criteria.priority.accepts(item.priority)
        && criteria.status.accepts(item.is_completed)
        && (!criteria.flagged_only || item.is_flagged)
        && matches_dates(item.due_date, criteria.start_date, criteria.end_date)
        && criteria.min_duration.is_none_or(|min| item.minutes() >= min)
        && criteria.max_duration.is_none_or(|max| item.minutes() <= max)
        && criteria.task_number.is_none_or(|n| item.task_number == Some(n))
}

/// Case-insensitive substring match on title or description.
pub fn matches_text(item: &Item, query: &str) -> bool {
    let q = query.trim();
    if q.is_empty() {
        return true;
    }
    let q = q.to_lowercase();
    item.title.to_lowercase().contains(&q)
        || item
            .description
            .as_deref()
            .is_some_and(|d| d.to_lowercase().contains(&q))
}

fn matches_dates(due: Option<NaiveDate>, start: Option<NaiveDate>, end: Option<NaiveDate>) -> bool {
    if start.is_none() && end.is_none() {
        return true;
    }
    let Some(due) = due else { return false };
    start.is_none_or(|s| due >= s) && end.is_none_or(|e| due <= e)
}

/// Orderable key for one item under a sort.
///
/// Keys are only comparable with keys built for the same `SortBy`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SortKey {
    /// `(missing, date)`: a missing date is never the smallest.
    DateAsc(bool, Option<NaiveDate>),
    DateDesc(bool, Reverse<Option<NaiveDate>>),
    Priority(Reverse<u8>),
    Duration(Reverse<u32>),
    Name(String),
}

pub fn sort_key(item: &Item, sort: SortBy) -> SortKey {
    match sort {
        SortBy::DateAsc => SortKey::DateAsc(item.due_date.is_none(), item.due_date),
        SortBy::DateDesc => SortKey::DateDesc(item.due_date.is_none(), Reverse(item.due_date)),
        SortBy::Priority => SortKey::Priority(Reverse(item.priority.weight())),
        SortBy::Duration => SortKey::Duration(Reverse(item.minutes())),
        SortBy::Name => SortKey::Name(item.title.clone()),
    }
}

/// Same ordering as comparing `sort_key`s, without allocating.
pub fn compare(a: &Item, b: &Item, sort: SortBy) -> Ordering {
    match sort {
        SortBy::DateAsc => compare_dates(a.due_date, b.due_date, false),
        SortBy::DateDesc => compare_dates(a.due_date, b.due_date, true),
        SortBy::Priority => b.priority.weight().cmp(&a.priority.weight()),
        SortBy::Duration => b.minutes().cmp(&a.minutes()),
        // Byte-wise, so case-sensitive: "Zoo" < "apple".
        SortBy::Name => a.title.cmp(&b.title),
    }
}

fn compare_dates(a: Option<NaiveDate>, b: Option<NaiveDate>, descending: bool) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(x), Some(y)) if descending => y.cmp(&x),
        (Some(x), Some(y)) => x.cmp(&y),
    }
}

/// Stable in-place sort; ties keep their incoming order.
pub fn sort_items(items: &mut [Item], sort: SortBy) {
    items.sort_by(|a, b| compare(a, b, sort));
}

/// Matching items in sorted order.
pub fn filter_sorted<'a>(
    items: impl IntoIterator<Item = &'a Item>,
    criteria: &FilterCriteria,
) -> Vec<Item> {
    let mut out: Vec<Item> = items
        .into_iter()
        .filter(|item| matches(item, criteria))
        .cloned()
        .collect();
    sort_items(&mut out, criteria.sort);
    out
}
