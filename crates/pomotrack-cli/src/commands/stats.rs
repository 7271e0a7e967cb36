use pomotrack_core::{Config, SessionLedger};

pub fn run(user: Option<&str>, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let db = super::open_database(config)?;
    let stats = db.stats(&super::user_id(user, config))?;
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}
