//! Logger setup for the harness and tests.
use env_logger::{Builder, Env};
use log::LevelFilter;

/// Default level for the arena's own modules.
#[must_use]
pub const fn default_level(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

/// Installs `env_logger` as the global logger.
///
/// `RUST_LOG` overrides the default. With `verbose` the crate logs at debug
/// level, which includes every elimination, respawn and replan; otherwise
/// only summaries and warnings are shown. Dependencies stay at `warn`.
pub fn init(verbose: bool) {
    let filter = format!("warn,brawl={}", default_level(verbose));
    let mut builder = Builder::from_env(Env::default().default_filter_or(filter));
    builder.format_timestamp(None);

    // Only fails when a logger is already installed, which repeated calls
    // from tests do on purpose.
    if builder.try_init().is_err() {
        log::trace!("logger already installed");
    }
}
