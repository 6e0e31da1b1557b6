//! Optimistic patches applied after a successful batch mutation.

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;

use crate::item::Item;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchAction {
    Delete,
    Complete,
    Uncomplete,
}

impl FromStr for BatchAction {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s.trim().to_lowercase().as_str() {
            "delete" => BatchAction::Delete,
            "complete" | "done" => BatchAction::Complete,
            "uncomplete" | "undo" => BatchAction::Uncomplete,
            other => bail!("unknown batch action: {other} (delete|complete|uncomplete)"),
        })
    }
}

/// Apply `action` to every item in `items` whose id is in `ids`.
///
/// Returns how many items were touched. The same function is used for
/// every locally held result set, whichever one is on screen.
pub fn apply_patch(items: &mut Vec<Item>, action: BatchAction, ids: &[String]) -> usize {
    let ids: HashSet<&str> = ids.iter().map(String::as_str).collect();
    match action {
        BatchAction::Delete => {
            let before = items.len();
            items.retain(|item| !ids.contains(item.id.as_str()));
            before - items.len()
        }
        BatchAction::Complete | BatchAction::Uncomplete => {
            let done = action == BatchAction::Complete;
            let mut touched = 0;
            for item in items.iter_mut().filter(|i| ids.contains(i.id.as_str())) {
                item.is_completed = done;
                touched += 1;
            }
            touched
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Item> {
        vec![Item::new("a", "x"), Item::new("b", "y"), Item::new("c", "z")]
    }

    #[test]
    fn delete_removes_selected() {
        let mut items = sample();
        let ids = ["a".into(), "c".into(), "missing".into()];
        let n = apply_patch(&mut items, BatchAction::Delete, &ids);
        assert_eq!(n, 2);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "b");
    }

    #[test]
    fn complete_and_uncomplete_flip_status() {
        let mut items = sample();
        assert_eq!(apply_patch(&mut items, BatchAction::Complete, &["b".into()]), 1);
        assert!(items[1].is_completed);
        assert!(!items[0].is_completed);

        apply_patch(&mut items, BatchAction::Uncomplete, &["b".into()]);
        assert!(!items[1].is_completed);
    }
}
