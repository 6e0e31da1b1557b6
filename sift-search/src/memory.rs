//! In-memory backend with the todo server's search semantics.
//!
//! Used by the CLI for local JSON data and by tests as a real backend.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sift_core::{
    BatchAction, FilterCriteria, Item, ResultPage, TaskNumberPattern, apply_patch, matches,
    sort_items,
};
use std::path::Path;
use tokio::sync::RwLock;

use crate::backend::SearchBackend;

#[derive(Debug)]
pub struct MemoryBackend {
    items: RwLock<Vec<Item>>,
    task_numbers: TaskNumberPattern,
}

impl MemoryBackend {
    pub fn new(items: Vec<Item>) -> Result<Self> {
        Ok(Self {
            items: RwLock::new(items),
            task_numbers: TaskNumberPattern::new()?,
        })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let items: Vec<Item> = serde_json::from_str(json).context("parse todo JSON")?;
        Self::new(items)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let s = std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        Self::from_json(&s).with_context(|| format!("load {}", path.display()))
    }

    pub async fn snapshot(&self) -> Vec<Item> {
        self.items.read().await.clone()
    }

    pub async fn count(&self) -> usize {
        self.items.read().await.len()
    }

    /// A numeric query such as `12` or `#12` also matches task number 12.
    fn is_match(&self, item: &Item, criteria: &FilterCriteria, bare: &FilterCriteria) -> bool {
        if matches(item, criteria) {
            return true;
        }
        match self.task_numbers.parse(&criteria.query) {
            Some(n) => item.task_number == Some(n) && matches(item, bare),
            None => false,
        }
    }
}

#[async_trait]
impl SearchBackend for MemoryBackend {
    async fn search(&self, criteria: &FilterCriteria) -> Result<ResultPage> {
        let bare = criteria.clone().with_query("");
        let items = self.items.read().await;

        let mut hits: Vec<Item> = items
            .iter()
            .filter(|item| self.is_match(item, criteria, &bare))
            .cloned()
            .collect();
        sort_items(&mut hits, criteria.sort);

        let total = hits.len();
        let page_items = hits
            .into_iter()
            .skip(criteria.offset())
            .take(criteria.page_size as usize)
            .collect();

        Ok(ResultPage {
            items: page_items,
            total,
            page: criteria.page.max(1),
        })
    }

    async fn batch_mutate(&self, action: BatchAction, ids: &[String]) -> Result<()> {
        let mut items = self.items.write().await;
        apply_patch(&mut items, action, ids);
        Ok(())
    }
}
