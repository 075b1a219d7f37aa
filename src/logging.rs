use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::error::Result;
use crate::settings::Settings;

/// Filter directives override, e.g. `DRE_LOG=dre=debug`.
pub const LOG_ENV: &str = "DRE_LOG";

pub fn log_path(settings: &Settings) -> PathBuf {
    settings.data_path().join("dre.log")
}

/// Send tracing output to `<data_dir>/dre.log`; stdout belongs to the TUI.
pub fn init(settings: &Settings) -> Result<PathBuf> {
    let path = log_path(settings);
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_level));

    // A subscriber may already be installed (tests); keep the existing one.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();

    tracing::debug!(path = %path.display(), "logging initialised");
    Ok(path)
}
