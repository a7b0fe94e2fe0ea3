// ABOUTME: Tracing subscriber setup for the regprune binary.
// ABOUTME: Console logs go to stderr; an optional log file records the full run at info level.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

const FILE_TIMESTAMP_FORMAT: &str = "[%Y-%m-%d %H:%M:%S]";

#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    pub verbose: bool,
    pub quiet: bool,
    pub log_file: Option<PathBuf>,
}

impl LogOptions {
    /// Console filter: `RUST_LOG` if set, else debug/warn/error by flag.
    fn console_filter(&self) -> EnvFilter {
        if self.verbose {
            return EnvFilter::new("debug");
        }
        if self.quiet {
            return EnvFilter::new("error");
        }
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    }
}

/// Install the global subscriber. Call once, from `main`.
pub fn init(options: &LogOptions) -> std::io::Result<()> {
    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_filter(options.console_filter());

    let file = match options.log_file {
        Some(ref path) => {
            let handle = OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                fmt::layer()
                    .with_writer(Mutex::new(handle))
                    .with_ansi(false)
                    .with_target(false)
                    .with_timer(ChronoLocal::new(FILE_TIMESTAMP_FORMAT.to_string()))
                    .with_filter(LevelFilter::INFO),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(console)
        .with(file)
        .init();

    Ok(())
}
