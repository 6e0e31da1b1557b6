//! sift-search: the asynchronous half of advanced search.
//!
//! `coordinator::spawn` starts the task that owns search state; the rest of
//! this crate is the machinery it is built from plus the two backends.

pub mod backend;
pub mod coordinator;
pub mod debounce;
pub mod http;
pub mod memory;
pub mod preview;
pub mod supersede;

pub use backend::{PERIOD_FETCH_LIMIT, PeriodCache, SearchBackend, load_period};
pub use coordinator::{SearchHandle, SearchSettings, SearchView, spawn};
pub use debounce::{Debouncer, Fired, ScheduledTask};
pub use http::HttpBackend;
pub use memory::MemoryBackend;
pub use preview::{PreviewFilter, PreviewSchedule};
pub use supersede::{LiveResult, LiveState, RequestSequencer, Resolution, SearchRequest};
