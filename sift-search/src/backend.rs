//! Collaborator interfaces consumed by the coordinator.

use anyhow::Result;
use async_trait::async_trait;
use sift_core::{BatchAction, FilterCriteria, Item, Period, ResultPage};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::warn;

/// Page size used when pulling a whole period into the cache.
pub const PERIOD_FETCH_LIMIT: u32 = 1000;

/// The authoritative todo store.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// One page of items matching `criteria`, paged by `criteria.page`.
    async fn search(&self, criteria: &FilterCriteria) -> Result<ResultPage>;

    async fn batch_mutate(&self, action: BatchAction, ids: &[String]) -> Result<()>;
}

#[async_trait]
impl<B: SearchBackend + ?Sized> SearchBackend for Arc<B> {
    async fn search(&self, criteria: &FilterCriteria) -> Result<ResultPage> {
        (**self).search(criteria).await
    }

    async fn batch_mutate(&self, action: BatchAction, ids: &[String]) -> Result<()> {
        (**self).batch_mutate(action, ids).await
    }
}

/// Read-only view of the "current period" items.
///
/// The owner of the `watch::Sender` refreshes it (for example on month
/// navigation); the coordinator only reads and listens for changes.
#[derive(Debug, Clone)]
pub struct PeriodCache {
    rx: watch::Receiver<Vec<Item>>,
}

impl PeriodCache {
    pub fn new(rx: watch::Receiver<Vec<Item>>) -> Self {
        Self { rx }
    }

    pub fn channel(initial: Vec<Item>) -> (watch::Sender<Vec<Item>>, Self) {
        let (tx, rx) = watch::channel(initial);
        (tx, Self::new(rx))
    }

    pub fn current_period_items(&self) -> Vec<Item> {
        self.rx.borrow().clone()
    }

    /// Resolves when the owner publishes new items; errors once the owner
    /// is gone.
    pub async fn changed(&mut self) -> Result<()> {
        self.rx.changed().await?;
        Ok(())
    }
}

/// Fetch every item due within `period`.
///
/// A failure leaves the cache empty rather than failing the caller.
pub async fn load_period<B: SearchBackend + ?Sized>(backend: &B, period: Period) -> Vec<Item> {
    let criteria = FilterCriteria::for_period(period.start, period.end, PERIOD_FETCH_LIMIT);
    match backend.search(&criteria).await {
        Ok(page) => page.items,
        Err(e) => {
            warn!(start = %period.start, end = %period.end, error = %e, "period preload failed");
            Vec::new()
        }
    }
}
