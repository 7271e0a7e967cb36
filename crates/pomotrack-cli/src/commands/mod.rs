pub mod config;
pub mod sessions;
pub mod stats;
pub mod timer;

use pomotrack_core::{Config, Database};

/// Open the ledger named by the configuration.
pub fn open_database(config: &Config) -> Result<Database, Box<dyn std::error::Error>> {
    let path = config.database_path()?;
    Ok(Database::open_at(path)?)
}

/// Caller-supplied user id, or the configured default.
pub fn user_id(raw: Option<&str>, config: &Config) -> String {
    pomotrack_core::user::resolve_user_id_or(raw, &config.user.default_user_id)
}
