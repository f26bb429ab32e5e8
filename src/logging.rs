//! Tracing subscriber setup for the binary
//!
//! The library only emits events. `RUST_LOG` overrides the level chosen from
//! the command line flags.

use std::io::IsTerminal as _;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Verbosity levels for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Verbosity {
    /// No output at all
    Silent,
    /// Warnings and errors only
    Quiet,
    /// Task progress
    #[default]
    Normal,
    /// Slot resolution, copied files and generator arguments
    Verbose,
}

impl Verbosity {
    /// Filter level for this verbosity
    pub fn level(self) -> &'static str {
        match self {
            Verbosity::Silent => "off",
            Verbosity::Quiet => "warn",
            Verbosity::Normal => "info",
            Verbosity::Verbose => "debug",
        }
    }
}

/// Install the global subscriber, writing to stderr
pub fn init_logging(verbosity: Verbosity) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("plugbuild={}", verbosity.level())));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(verbosity >= Verbosity::Verbose)
        .without_time()
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialise tracing: {e}"))?;

    Ok(())
}
