use anyhow::{Context, Result, bail};
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use sift_core::{DisplayMode, FilterCriteria, PriorityFilter, SortBy, StatusFilter, current_month};
use sift_search::{PeriodCache, SearchHandle, SearchView, load_period, spawn};
use std::time::Duration;
use tracing::debug;

mod config;
mod interactive;
mod logging;
mod render;
mod state;

use config::Config;

#[derive(Parser, Debug)]
#[command(
    name = "sift",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("SIFT_BUILD_SHA"), ")"),
    about = "Search and filter todos"
)]
struct Cli {
    /// Debug logging on stderr (SIFT_LOG / RUST_LOG take precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one search and print the page that would be displayed
    Search(SearchArgs),

    /// Edit filters line by line and watch results update
    Interactive,

    /// Manage ~/.sift/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write the default config if none exists
    Init,
    /// Print the effective config
    Show,
}

#[derive(Args, Debug, Default)]
struct SearchArgs {
    /// Free text matched against title and description
    #[arg(long, short)]
    query: Option<String>,

    /// Required tag id (repeatable; all must match)
    #[arg(long = "tag")]
    tags: Vec<String>,

    #[arg(long)]
    priority: Option<PriorityFilter>,

    #[arg(long)]
    status: Option<StatusFilter>,

    #[arg(long)]
    flagged: bool,

    /// Earliest due date (YYYY-MM-DD)
    #[arg(long)]
    from: Option<NaiveDate>,

    /// Latest due date (YYYY-MM-DD)
    #[arg(long)]
    to: Option<NaiveDate>,

    /// Minimum duration in minutes
    #[arg(long)]
    min_duration: Option<u32>,

    /// Maximum duration in minutes
    #[arg(long)]
    max_duration: Option<u32>,

    #[arg(long)]
    task_number: Option<u32>,

    #[arg(long)]
    sort: Option<SortBy>,

    #[arg(long, default_value_t = 1)]
    page: u32,

    /// Print the visible items as JSON instead of a table
    #[arg(long)]
    json: bool,
}

impl SearchArgs {
    fn criteria(&self, page_size: u32) -> FilterCriteria {
        let mut c = FilterCriteria::new(page_size)
            .with_query(self.query.clone().unwrap_or_default())
            .with_priority(self.priority.unwrap_or_default())
            .with_status(self.status.unwrap_or_default())
            .with_flagged_only(self.flagged)
            .with_date_range(self.from, self.to)
            .with_duration_range(self.min_duration, self.max_duration)
            .with_task_number(self.task_number)
            .with_sort(self.sort.unwrap_or_default());
        for tag in &self.tags {
            c = c.with_tag(tag.clone());
        }
        c
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli.command {
        Command::Search(args) => {
            let cfg = config::load_config()?;
            let (mut handle, _cache_tx) = start(&cfg).await?;
            let view = run_search(&mut handle, &args, cfg.search.page_size).await?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&view.items)?);
            } else {
                print!("{}", render::render_view(&view));
            }
        }

        Command::Interactive => {
            let cfg = config::load_config()?;
            let (handle, _cache_tx) = start(&cfg).await?;
            interactive::run(handle).await?;
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Show => {
                let cfg = config::load_config()?;
                println!("# {}", config::config_path()?.display());
                print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
            }
        },
    }

    Ok(())
}

/// Open the backend, preload this month and start a coordinator.
///
/// The returned sender owns the period cache; keep it alive for as long as
/// the handle is used.
async fn start(
    cfg: &Config,
) -> Result<(SearchHandle, tokio::sync::watch::Sender<Vec<sift_core::Item>>)> {
    let backend = cfg.backend.open()?;
    let period = current_month(&cfg.profile.timezone, Utc::now())?;
    let items = load_period(backend.as_ref(), period).await;
    debug!(start = %period.start, end = %period.end, count = items.len(), "period loaded");

    let (cache_tx, cache) = PeriodCache::channel(items);
    Ok((spawn(backend, cache, cfg.search), cache_tx))
}

async fn run_search(
    handle: &mut SearchHandle,
    args: &SearchArgs,
    page_size: u32,
) -> Result<SearchView> {
    if args.page == 0 {
        bail!("--page starts at 1");
    }
    let base = args.criteria(page_size);
    handle.set_criteria(base.clone())?;
    let expected = base.with_page(args.page);
    if args.page > 1 {
        handle.set_criteria(expected.clone())?;
    }
    handle.search_now()?;

    tokio::time::timeout(Duration::from_secs(30), settled(handle, &expected))
        .await
        .context("search timed out")?
}

/// Wait until the coordinator has applied `expected` and, for filtered
/// searches, the live query has answered.
async fn settled(handle: &mut SearchHandle, expected: &FilterCriteria) -> Result<SearchView> {
    let mut view = handle.view();
    loop {
        let applied = view.criteria == *expected;
        let answered = !expected.has_filters()
            || (view.sequence_id > 0 && !(view.mode == DisplayMode::Live && view.loading));
        if applied && answered {
            return Ok(view);
        }
        view = handle.changed().await?;
    }
}
