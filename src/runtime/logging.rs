use std::fs::{self, OpenOptions};
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::config::LoggingSettings;

/// Install a file-backed subscriber when `logging.file` is set.
///
/// Returns `false` when no file is configured; nothing is logged then, since
/// the terminal belongs to the UI.
pub fn init(settings: &LoggingSettings) -> Result<bool, Box<dyn std::error::Error>> {
    let Some(path) = &settings.file else {
        return Ok(false);
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    let filter = match EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) => EnvFilter::try_new(&settings.filter)?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init()
        .map_err(|e| e as Box<dyn std::error::Error>)?;
    Ok(true)
}
