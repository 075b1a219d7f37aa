use std::path::PathBuf;

use crate::error::Result;
use crate::settings::{load_settings, save_settings, shellexpand_path};

/// Persist settings (merging into any existing file) and create the data and
/// exports directories.
pub fn run(data_dir: Option<String>) -> Result<()> {
    let mut settings = load_settings();
    if let Some(dir) = data_dir {
        settings.data_dir = shellexpand_path(&dir);
    }

    let resolved = PathBuf::from(&settings.data_dir);
    std::fs::create_dir_all(resolved.join("exports"))?;
    save_settings(&settings)?;

    tracing::info!(data_dir = %resolved.display(), "initialised");
    println!("Initialized DRE Analytics at {}", resolved.display());
    Ok(())
}
