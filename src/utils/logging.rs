use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable holding the filter directive for the debug log.
pub const LOG_FILTER_ENV: &str = "PARLEY_LOG";
const DEFAULT_FILTER: &str = "parley=debug";

/// Route `tracing` output to `path`.
///
/// The terminal belongs to the chat UI, so diagnostics never go to stdout or
/// stderr. Without `--debug-log` no subscriber is installed and the macros
/// compile down to cheap no-ops.
pub fn init_file_logging(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    let filter = EnvFilter::try_from_env(LOG_FILTER_ENV)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .try_init()?;

    tracing::info!(pid = std::process::id(), "parley starting with file logging");
    Ok(())
}
