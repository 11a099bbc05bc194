//! Centralized path resolution for WhaleWatch
//!
//! ```text
//! <data_local_dir>/WhaleWatch/
//! ├── data/
//! │ ├── config.toml
//! │ └── whalewatch.db
//! └── logs/
//!   └── whalewatch_<date>.log
//! ```

use once_cell::sync::Lazy;
use std::path::PathBuf;

/// Lazy-initialized base directory (thread-safe)
static BASE_DIRECTORY: Lazy<PathBuf> = Lazy::new(resolve_base_directory);

/// Platform data directory, falling back to the home directory and then the cwd
fn resolve_base_directory() -> PathBuf {
    const APP_DIR: &str = "WhaleWatch";

    if let Ok(dir) = std::env::var("WHALEWATCH_HOME") {
        return PathBuf::from(dir);
    }

    if let Some(dir) = dirs::data_local_dir() {
        return dir.join(APP_DIR);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(APP_DIR);
    }

    PathBuf::from(APP_DIR)
}

pub fn get_base_directory() -> PathBuf {
    BASE_DIRECTORY.clone()
}

/// Contains the database and config file
pub fn get_data_directory() -> PathBuf {
    BASE_DIRECTORY.join("data")
}

pub fn get_logs_directory() -> PathBuf {
    BASE_DIRECTORY.join("logs")
}

pub fn get_config_path() -> PathBuf {
    get_data_directory().join("config.toml")
}

pub fn get_database_path() -> PathBuf {
    get_data_directory().join("whalewatch.db")
}

/// Create the data and logs directories
pub fn ensure_all_directories() -> Result<(), String> {
    for dir in [get_data_directory(), get_logs_directory()] {
        std::fs::create_dir_all(&dir)
            .map_err(|e| format!("Failed to create directory {}: {}", dir.display(), e))?;
    }
    Ok(())
}
