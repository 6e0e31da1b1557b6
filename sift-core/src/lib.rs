//! sift-core: todo items, filter criteria and the pure parts of advanced
//! search (predicate, preview evaluation, mode selection, paging).

pub mod criteria;
pub mod item;
pub mod mode;
pub mod pager;
pub mod patch;
pub mod period;
pub mod predicate;
pub mod preview;

pub use criteria::{
    DEFAULT_PAGE_SIZE, FilterCriteria, PriorityFilter, SortBy, StatusFilter, TaskNumberPattern,
};
pub use item::{Item, Priority, Tag};
pub use mode::{DisplayMode, select_mode};
pub use pager::{PageMode, PageMove, Pager};
pub use patch::{BatchAction, apply_patch};
pub use period::{Period, current_month, today_in};
pub use predicate::{SortKey, compare, filter_sorted, matches, sort_items, sort_key};
pub use preview::{DEFAULT_MIN_PREVIEW_CHARS, DEFAULT_PREVIEW_CAP, PreviewRules};

/// One page of authoritative search results.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ResultPage {
    pub items: Vec<Item>,
    /// Full server-side match count, independent of page size.
    pub total: usize,
    pub page: u32,
}
