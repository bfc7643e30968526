//! Log setup for the `weir` binary.
//!
//! Events go to stderr so stdout carries only the run report. The level
//! comes from `-v` flags unless `WEIR_LOG` holds a filter directive, in
//! which case that wins.

use std::sync::Once;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Environment variable holding an `EnvFilter` directive.
pub const FILTER_ENV: &str = "WEIR_LOG";

static INIT: Once = Once::new();

/// Level for a `-v` count.
pub fn verbosity_level(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Install the global subscriber. Later calls are no-ops.
pub fn init(verbose: u8) {
    INIT.call_once(|| {
        let filter = EnvFilter::builder()
            .with_default_directive(verbosity_level(verbose).into())
            .with_env_var(FILTER_ENV)
            .from_env_lossy();
        let layer = fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_filter(filter);
        // A subscriber installed by an embedding program takes precedence.
        let _ = tracing_subscriber::registry().with(layer).try_init();
    });
}
