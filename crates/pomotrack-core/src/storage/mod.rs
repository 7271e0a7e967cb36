mod config;
pub mod database;
pub mod ledger;

pub use config::{Config, LoggingConfig, StorageConfig, UserConfig};
pub use database::Database;
pub use ledger::{SessionId, SessionLedger, SessionRecord, SessionStats};

use std::path::PathBuf;

/// Returns `~/.config/pomotrack[-dev]/` based on POMOTRACK_ENV.
///
/// Set POMOTRACK_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> std::io::Result<PathBuf> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("POMOTRACK_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("pomotrack-dev")
    } else {
        base_dir.join("pomotrack")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
