//! Filter criteria: the full set of user-chosen filter, sort and paging
//! parameters for one search.

use anyhow::{Result, bail};
use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;

use crate::item::Priority;

pub const DEFAULT_PAGE_SIZE: u32 = 30;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorityFilter {
    #[default]
    Any,
    Low,
    Medium,
    High,
}

impl PriorityFilter {
    pub fn accepts(self, priority: Priority) -> bool {
        match self {
            PriorityFilter::Any => true,
            PriorityFilter::Low => priority == Priority::Low,
            PriorityFilter::Medium => priority == Priority::Medium,
            PriorityFilter::High => priority == Priority::High,
        }
    }

    pub fn as_param(self) -> Option<&'static str> {
        match self {
            PriorityFilter::Any => None,
            PriorityFilter::Low => Some("low"),
            PriorityFilter::Medium => Some("medium"),
            PriorityFilter::High => Some("high"),
        }
    }
}

impl FromStr for PriorityFilter {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s.trim().to_lowercase().as_str() {
            "any" => PriorityFilter::Any,
            "low" => PriorityFilter::Low,
            "medium" => PriorityFilter::Medium,
            "high" => PriorityFilter::High,
            other => bail!("unknown priority filter: {other} (any|low|medium|high)"),
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    Any,
    Active,
    Completed,
}

impl StatusFilter {
    pub fn accepts(self, is_completed: bool) -> bool {
        match self {
            StatusFilter::Any => true,
            StatusFilter::Active => !is_completed,
            StatusFilter::Completed => is_completed,
        }
    }

    pub fn as_param(self) -> Option<&'static str> {
        match self {
            StatusFilter::Any => None,
            StatusFilter::Active => Some("active"),
            StatusFilter::Completed => Some("completed"),
        }
    }
}

impl FromStr for StatusFilter {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s.trim().to_lowercase().as_str() {
            "any" => StatusFilter::Any,
            "active" => StatusFilter::Active,
            "completed" | "done" => StatusFilter::Completed,
            other => bail!("unknown status filter: {other} (any|active|completed)"),
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortBy {
    #[default]
    DateAsc,
    DateDesc,
    Priority,
    Duration,
    Name,
}

impl SortBy {
    /// Value of the `sortBy` query parameter understood by the todo server.
    pub fn as_param(self) -> &'static str {
        match self {
            SortBy::DateAsc => "date",
            SortBy::DateDesc => "date_desc",
            SortBy::Priority => "priority",
            SortBy::Duration => "duration",
            SortBy::Name => "name",
        }
    }
}

impl FromStr for SortBy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s.trim().to_lowercase().as_str() {
            "date" | "date-asc" => SortBy::DateAsc,
            "date-desc" => SortBy::DateDesc,
            "priority" => SortBy::Priority,
            "duration" => SortBy::Duration,
            "name" => SortBy::Name,
            other => bail!("unknown sort: {other} (date-asc|date-desc|priority|duration|name)"),
        })
    }
}

/// Criteria for one search. Compared by value to decide whether a re-query
/// is warranted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub query: String,
    pub tags: BTreeSet<String>,
    pub priority: PriorityFilter,
    pub status: StatusFilter,
    pub flagged_only: bool,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub min_duration: Option<u32>,
    pub max_duration: Option<u32>,
    pub sort: SortBy,
    pub task_number: Option<u32>,
    /// 1-based.
    pub page: u32,
    pub page_size: u32,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            query: String::new(),
            tags: BTreeSet::new(),
            priority: PriorityFilter::Any,
            status: StatusFilter::Any,
            flagged_only: false,
            start_date: None,
            end_date: None,
            min_duration: None,
            max_duration: None,
            sort: SortBy::DateAsc,
            task_number: None,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl FilterCriteria {
    pub fn new(page_size: u32) -> Self {
        Self {
            page_size: page_size.max(1),
            ..Self::default()
        }
    }

    /// Criteria selecting every item due within `[start, end]`.
    pub fn for_period(start: NaiveDate, end: NaiveDate, page_size: u32) -> Self {
        Self::new(page_size).with_date_range(Some(start), Some(end))
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    pub fn with_tag(mut self, tag_id: impl Into<String>) -> Self {
        self.tags.insert(tag_id.into());
        self
    }

    pub fn with_priority(mut self, priority: PriorityFilter) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_status(mut self, status: StatusFilter) -> Self {
        self.status = status;
        self
    }

    pub fn with_flagged_only(mut self, flagged_only: bool) -> Self {
        self.flagged_only = flagged_only;
        self
    }

    pub fn with_date_range(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.start_date = start;
        self.end_date = end;
        self
    }

    pub fn with_duration_range(mut self, min: Option<u32>, max: Option<u32>) -> Self {
        self.min_duration = min;
        self.max_duration = max;
        self
    }

    pub fn with_sort(mut self, sort: SortBy) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_task_number(mut self, n: Option<u32>) -> Self {
        self.task_number = n;
        self
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    pub fn trimmed_query(&self) -> &str {
        self.query.trim()
    }

    pub fn has_date_range(&self) -> bool {
        self.start_date.is_some() || self.end_date.is_some()
    }

    /// True when at least one filter field narrows the result set.
    ///
    /// Sort and paging never count as filters.
    pub fn has_filters(&self) -> bool {
        !self.trimmed_query().is_empty()
            || !self.tags.is_empty()
            || self.priority != PriorityFilter::Any
            || self.status != StatusFilter::Any
            || self.flagged_only
            || self.has_date_range()
            || self.min_duration.is_some()
            || self.max_duration.is_some()
            || self.task_number.is_some()
    }

    /// Equality on everything except the page index.
    pub fn same_filters(&self, other: &FilterCriteria) -> bool {
        self.with_page_of(other) == *other
    }

    fn with_page_of(&self, other: &FilterCriteria) -> FilterCriteria {
        FilterCriteria {
            page: other.page,
            ..self.clone()
        }
    }

    /// Offset of the first item on the current page.
    pub fn offset(&self) -> usize {
        (self.page.max(1) as usize - 1) * self.page_size as usize
    }
}

/// Recognises queries like `12` or `#12` that name a task number.
#[derive(Debug, Clone)]
pub struct TaskNumberPattern {
    re: Regex,
}

impl TaskNumberPattern {
    pub fn new() -> Result<Self> {
        Ok(Self {
            re: Regex::new(r"^#?\s*(\d+)$")?,
        })
    }

    pub fn parse(&self, query: &str) -> Option<u32> {
        let caps = self.re.captures(query.trim())?;
        caps.get(1)?.as_str().parse().ok()
    }
}
