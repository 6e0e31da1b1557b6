//! The search coordinator.
//!
//! One task owns every piece of mutable search state: the criteria, both
//! debounce timers, the live sequence counter, the held results and the
//! pager. Everything else talks to it through a `SearchHandle` and reads
//! the published `SearchView`.

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use sift_core::{
    BatchAction, DEFAULT_MIN_PREVIEW_CHARS, DEFAULT_PAGE_SIZE, DEFAULT_PREVIEW_CAP, DisplayMode,
    FilterCriteria, Item, PageMode, PageMove, Pager, PreviewRules, ResultPage, apply_patch,
    filter_sorted, select_mode,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, warn};

use crate::backend::{PeriodCache, SearchBackend};
use crate::debounce::{Debouncer, Fired};
use crate::preview::{PreviewFilter, PreviewSchedule};
use crate::supersede::{LiveResult, LiveState};

pub const DEFAULT_PREVIEW_DELAY_MS: u64 = 200;
pub const DEFAULT_LIVE_DELAY_MS: u64 = 400;

/// Tunables for one coordinator. Deserialised from the `[search]` config
/// table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub preview_delay_ms: u64,
    pub live_delay_ms: u64,
    pub preview_cap: usize,
    pub min_preview_chars: usize,
    pub page_size: u32,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            preview_delay_ms: DEFAULT_PREVIEW_DELAY_MS,
            live_delay_ms: DEFAULT_LIVE_DELAY_MS,
            preview_cap: DEFAULT_PREVIEW_CAP,
            min_preview_chars: DEFAULT_MIN_PREVIEW_CHARS,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl SearchSettings {
    pub fn preview_delay(&self) -> Duration {
        Duration::from_millis(self.preview_delay_ms)
    }

    pub fn live_delay(&self) -> Duration {
        Duration::from_millis(self.live_delay_ms)
    }

    pub fn preview_rules(&self) -> PreviewRules {
        PreviewRules {
            cap: self.preview_cap,
            min_query_chars: self.min_preview_chars,
        }
    }
}

/// Everything a renderer needs, derived fresh after every event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchView {
    pub mode: DisplayMode,
    pub criteria: FilterCriteria,
    /// The visible page.
    pub items: Vec<Item>,
    pub total: usize,
    pub page: u32,
    pub page_size: u32,
    pub has_next: bool,
    pub has_prev: bool,
    /// A live request for the current criteria has not answered yet.
    pub loading: bool,
    /// The current live request failed and the period cache is shown.
    pub fell_back: bool,
    pub sequence_id: u64,
}

enum Command {
    SetCriteria(FilterCriteria),
    SearchNow,
    NextPage,
    PrevPage,
    Clear,
    Batch {
        action: BatchAction,
        ids: Vec<String>,
        reply: oneshot::Sender<Result<()>>,
    },
}

struct MutationDone {
    action: BatchAction,
    ids: Vec<String>,
    result: Result<()>,
    reply: oneshot::Sender<Result<()>>,
}

/// Cheap to clone; the coordinator stops once every handle is dropped.
#[derive(Debug, Clone)]
pub struct SearchHandle {
    commands: mpsc::UnboundedSender<Command>,
    view: watch::Receiver<SearchView>,
}

impl SearchHandle {
    fn send(&self, cmd: Command) -> Result<()> {
        self.commands
            .send(cmd)
            .map_err(|_| anyhow!("search coordinator has stopped"))
    }

    /// Replace the criteria. Any filter change resets paging to page 1.
    pub fn set_criteria(&self, criteria: FilterCriteria) -> Result<()> {
        self.send(Command::SetCriteria(criteria))
    }

    /// Issue the live query now instead of waiting for the debounce.
    pub fn search_now(&self) -> Result<()> {
        self.send(Command::SearchNow)
    }

    pub fn next_page(&self) -> Result<()> {
        self.send(Command::NextPage)
    }

    pub fn prev_page(&self) -> Result<()> {
        self.send(Command::PrevPage)
    }

    /// Back to default criteria.
    pub fn clear(&self) -> Result<()> {
        self.send(Command::Clear)
    }

    /// Run a batch mutation. On success the affected items are patched in
    /// every held result set before this returns.
    pub async fn batch(&self, action: BatchAction, ids: Vec<String>) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Batch { action, ids, reply })?;
        rx.await.map_err(|_| anyhow!("search coordinator has stopped"))?
    }

    pub fn view(&self) -> SearchView {
        self.view.borrow().clone()
    }

    /// Criteria as last applied by the coordinator.
    pub fn criteria(&self) -> FilterCriteria {
        self.view.borrow().criteria.clone()
    }

    /// Wait for the next published view.
    pub async fn changed(&mut self) -> Result<SearchView> {
        self.view.changed().await?;
        Ok(self.view.borrow_and_update().clone())
    }
}

/// Start a coordinator on the current tokio runtime.
pub fn spawn(
    backend: Arc<dyn SearchBackend>,
    cache: PeriodCache,
    settings: SearchSettings,
) -> SearchHandle {
    let (commands_tx, commands_rx) = mpsc::unbounded_channel();
    let (preview_tx, preview_rx) = mpsc::unbounded_channel();
    let (live_tx, live_rx) = mpsc::unbounded_channel();
    let (responses_tx, responses_rx) = mpsc::unbounded_channel();
    let (mutations_tx, mutations_rx) = mpsc::unbounded_channel();

    let criteria = FilterCriteria::new(settings.page_size);
    let mut coordinator = Coordinator {
        backend,
        period_items: cache.current_period_items(),
        pager: Pager::new(criteria.page_size),
        criteria,
        preview: PreviewFilter::new(settings.preview_rules(), settings.preview_delay(), preview_tx),
        preview_items: None,
        live_debounce: Debouncer::new(settings.live_delay(), live_tx),
        live: LiveState::new(),
        responses_tx,
        mutations_tx,
        settings,
    };
    let (view_tx, view_rx) = watch::channel(coordinator.derive_view());

    tokio::spawn(coordinator.run(
        view_tx,
        cache,
        Inbox {
            commands: commands_rx,
            preview: preview_rx,
            live: live_rx,
            responses: responses_rx,
            mutations: mutations_rx,
        },
    ));

    SearchHandle {
        commands: commands_tx,
        view: view_rx,
    }
}

struct Inbox {
    commands: mpsc::UnboundedReceiver<Command>,
    preview: mpsc::UnboundedReceiver<Fired<FilterCriteria>>,
    live: mpsc::UnboundedReceiver<Fired<FilterCriteria>>,
    responses: mpsc::UnboundedReceiver<(u64, Result<ResultPage>)>,
    mutations: mpsc::UnboundedReceiver<MutationDone>,
}

struct Coordinator {
    backend: Arc<dyn SearchBackend>,
    settings: SearchSettings,
    /// Local copy of the period cache; batch patches land here until the
    /// owner publishes a fresh one.
    period_items: Vec<Item>,
    criteria: FilterCriteria,
    preview: PreviewFilter,
    preview_items: Option<Vec<Item>>,
    live_debounce: Debouncer<FilterCriteria>,
    live: LiveState,
    pager: Pager,
    responses_tx: mpsc::UnboundedSender<(u64, Result<ResultPage>)>,
    mutations_tx: mpsc::UnboundedSender<MutationDone>,
}

impl Coordinator {
    async fn run(
        mut self,
        view_tx: watch::Sender<SearchView>,
        mut cache: PeriodCache,
        mut inbox: Inbox,
    ) {
        let mut cache_open = true;
        loop {
            tokio::select! {
                cmd = inbox.commands.recv() => match cmd {
                    Some(cmd) => self.handle(cmd),
                    None => break,
                },
                Some(fired) = inbox.preview.recv() => self.on_preview_fired(fired),
                Some(fired) = inbox.live.recv() => self.on_live_fired(fired),
                Some((sequence_id, outcome)) = inbox.responses.recv() => {
                    self.live.resolve(sequence_id, outcome);
                }
                Some(done) = inbox.mutations.recv() => self.on_mutation(done),
                changed = cache.changed(), if cache_open => match changed {
                    Ok(()) => self.on_period_refresh(cache.current_period_items()),
                    Err(_) => {
                        debug!("period cache owner dropped; keeping last items");
                        cache_open = false;
                    }
                },
            }

            let view = self.derive_view();
            view_tx.send_if_modified(|current| {
                if *current == view {
                    false
                } else {
                    *current = view;
                    true
                }
            });
        }
        debug!("search coordinator stopped");
    }

    fn handle(&mut self, cmd: Command) {
        match cmd {
            Command::SetCriteria(criteria) => self.set_criteria(criteria),
            Command::SearchNow => self.search_now(),
            Command::NextPage => {
                if let Some(step) = self.pager.next() {
                    self.follow(step);
                }
            }
            Command::PrevPage => {
                if let Some(step) = self.pager.prev() {
                    self.follow(step);
                }
            }
            Command::Clear => self.set_criteria(FilterCriteria::new(self.settings.page_size)),
            Command::Batch { action, ids, reply } => self.start_mutation(action, ids, reply),
        }
    }

    fn set_criteria(&mut self, mut next: FilterCriteria) {
        if next == self.criteria {
            return;
        }
        self.pager.set_page_size(next.page_size);

        if next.same_filters(&self.criteria) {
            self.criteria = next;
            self.goto_page(self.criteria.page);
            return;
        }

        next.page = 1;
        self.pager.reset();
        self.criteria = next;
        self.live.supersede();

        self.reschedule_preview();
        if self.criteria.has_filters() {
            self.live_debounce.schedule(self.criteria.clone());
        } else {
            self.live_debounce.cancel();
        }
    }

    fn search_now(&mut self) {
        if !self.criteria.has_filters() {
            return;
        }
        self.live_debounce.cancel();
        self.issue(self.criteria.clone());
    }

    fn goto_page(&mut self, page: u32) {
        match self.pager.mode() {
            PageMode::Remote => self.follow(PageMove::Fetch(page)),
            PageMode::Local => self.pager.set_page(page),
        }
    }

    fn follow(&mut self, step: PageMove) {
        match step {
            // The pager has already moved.
            PageMove::Slice(_) => self.criteria.page = self.pager.page(),
            PageMove::Fetch(page) => {
                self.criteria.page = page;
                self.live_debounce.cancel();
                self.issue(self.criteria.clone());
            }
        }
    }

    fn issue(&mut self, criteria: FilterCriteria) {
        let request = self.live.issue(criteria);
        debug!(
            sequence_id = request.sequence_id,
            query = request.criteria.trimmed_query(),
            page = request.criteria.page,
            "issuing live search"
        );
        let backend = Arc::clone(&self.backend);
        let tx = self.responses_tx.clone();
        tokio::spawn(async move {
            let outcome = backend.search(&request.criteria).await;
            // Receiver gone means the coordinator stopped.
            let _ = tx.send((request.sequence_id, outcome));
        });
    }

    fn on_live_fired(&mut self, fired: Fired<FilterCriteria>) {
        if let Some(criteria) = self.live_debounce.claim(fired) {
            self.issue(criteria);
        }
    }

    fn on_preview_fired(&mut self, fired: Fired<FilterCriteria>) {
        if let Some(criteria) = self.preview.claim(fired) {
            self.preview_items = self.preview.evaluate(&criteria, &self.period_items);
        }
    }

    fn on_period_refresh(&mut self, items: Vec<Item>) {
        debug!(count = items.len(), "period cache refreshed");
        self.period_items = items;
        self.reschedule_preview();
    }

    fn reschedule_preview(&mut self) {
        let cached = self.period_items.len();
        if self.preview.schedule_preview(&self.criteria, cached) == PreviewSchedule::Cleared {
            self.preview_items = None;
        }
    }

    fn start_mutation(
        &mut self,
        action: BatchAction,
        ids: Vec<String>,
        reply: oneshot::Sender<Result<()>>,
    ) {
        let backend = Arc::clone(&self.backend);
        let tx = self.mutations_tx.clone();
        tokio::spawn(async move {
            let result = backend.batch_mutate(action, &ids).await;
            let _ = tx.send(MutationDone {
                action,
                ids,
                result,
                reply,
            });
        });
    }

    fn on_mutation(&mut self, done: MutationDone) {
        let MutationDone {
            action,
            ids,
            result,
            reply,
        } = done;
        match result {
            Ok(()) => {
                self.patch_held_results(action, &ids);
                let _ = reply.send(Ok(()));
            }
            Err(e) => {
                warn!(?action, count = ids.len(), error = %e, "batch mutation failed");
                let _ = reply.send(Err(e));
            }
        }
    }

    fn patch_held_results(&mut self, action: BatchAction, ids: &[String]) {
        apply_patch(&mut self.period_items, action, ids);

        if let Some(preview) = self.preview_items.as_mut() {
            apply_patch(preview, action, ids);
            if preview.is_empty() {
                self.preview_items = None;
            }
        }

        if let Some(LiveResult::Page(page)) = self.live.result_mut() {
            let touched = apply_patch(&mut page.items, action, ids);
            if action == BatchAction::Delete {
                page.total = page.total.saturating_sub(touched);
            }
        }
    }

    fn derive_view(&mut self) -> SearchView {
        let mode = select_mode(&self.criteria, self.preview_items.as_deref());
        let mut fell_back = false;

        let items = match mode {
            DisplayMode::Default => local_page(&mut self.pager, &self.period_items),
            DisplayMode::Preview => {
                let preview = self.preview_items.as_deref().unwrap_or_default();
                local_page(&mut self.pager, preview)
            }
            DisplayMode::Live => match self.live.result() {
                Some(LiveResult::Page(page)) => {
                    self.pager.enter(PageMode::Remote);
                    self.pager.set_total(page.total);
                    self.pager.set_page(page.page);
                    page.items.clone()
                }
                Some(LiveResult::Fallback) => {
                    fell_back = true;
                    local_page(&mut self.pager, &self.period_items)
                }
                // Nothing authoritative yet; show what the cache can say.
                None => {
                    let provisional = filter_sorted(&self.period_items, &self.criteria);
                    local_page(&mut self.pager, &provisional)
                }
            },
        };

        SearchView {
            mode,
            criteria: self.criteria.clone(),
            items,
            total: self.pager.total(),
            page: self.pager.page(),
            page_size: self.pager.page_size(),
            has_next: self.pager.has_next(),
            has_prev: self.pager.has_prev(),
            loading: mode == DisplayMode::Live
                && (self.live.is_loading() || self.live_debounce.is_pending()),
            fell_back,
            sequence_id: self.live.current_sequence_id(),
        }
    }
}

fn local_page(pager: &mut Pager, items: &[Item]) -> Vec<Item> {
    pager.enter(PageMode::Local);
    pager.set_total(items.len());
    pager.slice(items).to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_defaults_and_partial_overrides() {
        let s = SearchSettings::default();
        assert_eq!(s.preview_delay(), Duration::from_millis(200));
        assert_eq!(s.live_delay(), Duration::from_millis(400));
        assert_eq!(s.preview_rules(), PreviewRules::default());

        let raw = r#"{"live_delay_ms": 250, "page_size": 10}"#;
        let s: SearchSettings = serde_json::from_str(raw).unwrap();
        assert_eq!(s.live_delay_ms, 250);
        assert_eq!(s.page_size, 10);
        assert_eq!(s.preview_delay_ms, DEFAULT_PREVIEW_DELAY_MS);
    }

    #[test]
    fn local_page_clamps_to_last_page() {
        let items: Vec<Item> = (0..12).map(|i| Item::new(i.to_string(), "x")).collect();
        let mut pager = Pager::new(5);
        pager.set_page(4);
        let page = local_page(&mut pager, &items);
        assert_eq!(pager.page(), 3);
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].id, "10");
    }
}
