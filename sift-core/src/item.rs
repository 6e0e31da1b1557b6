//! Todo item model shared by the preview filter, the backends and the CLI.
//!
//! Field names serialize as camelCase so the same type reads the JSON the
//! todo server returns from `/api/todos/search`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    /// Sort weight: high > medium > low.
    pub fn weight(self) -> u8 {
        match self {
            Priority::Low => 1,
            Priority::Medium => 2,
            Priority::High => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Tag {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            color: None,
        }
    }
}

/// A single todo.
///
/// `due_date` is a plain calendar date; `NaiveDate` ordering is the same as
/// comparing ISO `YYYY-MM-DD` strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub due_date: Option<NaiveDate>,

    #[serde(default)]
    pub tags: Vec<Tag>,

    #[serde(default)]
    pub priority: Priority,

    /// Minutes. Missing counts as 0 for range filters.
    #[serde(default)]
    pub duration: Option<u32>,

    #[serde(default)]
    pub is_completed: bool,

    #[serde(default)]
    pub is_flagged: bool,

    /// Per-owner sequence number, shown to users as `#n`.
    #[serde(default)]
    pub task_number: Option<u32>,
}

impl Item {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            due_date: None,
            tags: Vec::new(),
            priority: Priority::Medium,
            duration: None,
            is_completed: false,
            is_flagged: false,
            task_number: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_due_date(mut self, due: NaiveDate) -> Self {
        self.due_date = Some(due);
        self
    }

    pub fn with_tag(mut self, tag: Tag) -> Self {
        self.tags.push(tag);
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_duration(mut self, minutes: u32) -> Self {
        self.duration = Some(minutes);
        self
    }

    pub fn with_completed(mut self, completed: bool) -> Self {
        self.is_completed = completed;
        self
    }

    pub fn with_flagged(mut self, flagged: bool) -> Self {
        self.is_flagged = flagged;
        self
    }

    pub fn with_task_number(mut self, n: u32) -> Self {
        self.task_number = Some(n);
        self
    }

    pub fn has_tag(&self, tag_id: &str) -> bool {
        self.tags.iter().any(|t| t.id == tag_id)
    }

    /// Duration in minutes with a missing value read as 0.
    pub fn minutes(&self) -> u32 {
        self.duration.unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_server_json() {
        let raw = r##"{
            "id": "42",
            "title": "Buy groceries",
            "isCompleted": false,
            "dueDate": "2025-01-15",
            "tags": [{"id": "t1", "name": "home", "color": "#ff0000"}],
            "isFlagged": true,
            "duration": null,
            "priority": "high",
            "description": "milk, eggs",
            "taskNumber": 7
        }"##;

        let item: Item = serde_json::from_str(raw).unwrap();
        assert_eq!(item.id, "42");
        assert_eq!(item.due_date, NaiveDate::from_ymd_opt(2025, 1, 15));
        assert_eq!(item.priority, Priority::High);
        assert!(item.is_flagged);
        assert_eq!(item.minutes(), 0);
        assert_eq!(item.task_number, Some(7));
        assert!(item.has_tag("t1"));
    }

    #[test]
    fn missing_fields_take_server_defaults() {
        let item: Item = serde_json::from_str(r#"{"id": "a", "title": "x"}"#).unwrap();
        assert_eq!(item.priority, Priority::Medium);
        assert!(item.tags.is_empty());
        assert!(item.due_date.is_none());
        assert!(!item.is_completed);
    }
}
