//! Tracing subscriber for the `sift` binary.
//!
//! Filter priority: `SIFT_LOG`, then `RUST_LOG`, then `-v` (debug), then
//! `warn`. Output goes to stderr so results on stdout stay clean.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

pub const LOG_ENV: &str = "SIFT_LOG";

pub fn init(verbose: bool) {
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(std::io::IsTerminal::is_terminal(&std::io::stderr()))
        .with_target(verbose);

    let registry = tracing_subscriber::registry().with(build_filter(verbose));
    if verbose {
        registry.with(fmt_layer.with_timer(fmt::time::uptime())).init();
    } else {
        registry.with(fmt_layer.without_time().compact()).init();
    }
}

fn build_filter(verbose: bool) -> EnvFilter {
    // An unparseable SIFT_LOG falls through instead of failing startup.
    if let Ok(directives) = std::env::var(LOG_ENV)
        && let Ok(filter) = EnvFilter::try_new(&directives)
    {
        return filter;
    }
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    EnvFilter::new(default_directive(verbose))
}

fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "warn,sift_core=debug,sift_search=debug,sift=debug"
    } else {
        "warn"
    }
}
