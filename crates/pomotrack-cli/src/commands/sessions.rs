use pomotrack_core::{Config, SessionLedger, SessionView};

pub fn run(user: Option<&str>, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let db = super::open_database(config)?;
    let user_id = super::user_id(user, config);
    let sessions: Vec<SessionView> = db.list(&user_id)?.iter().map(SessionView::from).collect();
    println!("{}", serde_json::to_string_pretty(&sessions)?);
    Ok(())
}
