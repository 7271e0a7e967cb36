use std::io::{BufRead, Write};
use std::sync::Arc;

use clap::Subcommand;
use pomotrack_core::{Config, SessionView, SystemClock, TimerStateStore, TimerView};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Read `<op> [user_id]` lines from stdin and print one JSON reply per line.
    ///
    /// Ops: start, pause, reset, status, sessions. Timer state lives as long
    /// as the shell; the session ledger is on disk.
    Shell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Start,
    Pause,
    Reset,
    Status,
    Sessions,
}

#[derive(Debug, PartialEq, Eq)]
struct Request {
    op: Op,
    user_id: Option<String>,
}

fn parse_request(line: &str) -> Result<Option<Request>, String> {
    let mut words = line.split_whitespace();
    let Some(op) = words.next() else {
        return Ok(None);
    };
    let op = match op {
        "start" => Op::Start,
        "pause" => Op::Pause,
        "reset" => Op::Reset,
        "status" => Op::Status,
        "sessions" => Op::Sessions,
        other => return Err(format!("unknown op '{other}'")),
    };
    let user_id = words.next().map(str::to_string);
    if words.next().is_some() {
        return Err("expected at most one user id".into());
    }
    Ok(Some(Request { op, user_id }))
}

fn handle(
    store: &TimerStateStore,
    request: &Request,
    config: &Config,
) -> Result<serde_json::Value, Box<dyn std::error::Error>> {
    let user_id = super::user_id(request.user_id.as_deref(), config);
    let reply = match request.op {
        Op::Start => serde_json::to_value(TimerView::from(&store.start(&user_id)?))?,
        Op::Pause => serde_json::to_value(TimerView::from(&store.pause(&user_id)?))?,
        Op::Reset => serde_json::to_value(TimerView::from(&store.reset(&user_id)?))?,
        Op::Status => serde_json::to_value(store.status(&user_id)?)?,
        Op::Sessions => {
            let sessions: Vec<SessionView> = store
                .sessions(&user_id)?
                .iter()
                .map(SessionView::from)
                .collect();
            serde_json::to_value(sessions)?
        }
    };
    Ok(reply)
}

fn serve<R: BufRead, W: Write>(
    store: &TimerStateStore,
    config: &Config,
    input: R,
    mut output: W,
) -> Result<(), Box<dyn std::error::Error>> {
    for line in input.lines() {
        let line = line?;
        let reply = match parse_request(&line) {
            Ok(None) => continue,
            Ok(Some(request)) => handle(store, &request, config).unwrap_or_else(|e| {
                tracing::warn!(%line, error = %e, "request failed");
                serde_json::json!({ "error": e.to_string() })
            }),
            Err(message) => serde_json::json!({ "error": message }),
        };
        writeln!(output, "{reply}")?;
        output.flush()?;
    }
    Ok(())
}

pub fn run(action: TimerAction, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        TimerAction::Shell => {
            let db = super::open_database(config)?;
            let store = TimerStateStore::new(Arc::new(db), Arc::new(SystemClock));
            let stdin = std::io::stdin();
            serve(&store, config, stdin.lock(), std::io::stdout().lock())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pomotrack_core::{Database, ManualClock};

    fn store() -> (TimerStateStore, ManualClock) {
        let clock = ManualClock::default();
        let db = Database::open_memory().unwrap();
        (
            TimerStateStore::new(Arc::new(db), Arc::new(clock.clone())),
            clock,
        )
    }

    fn replies(input: &str, store: &TimerStateStore) -> Vec<serde_json::Value> {
        let mut out = Vec::new();
        serve(store, &Config::default(), input.as_bytes(), &mut out).unwrap();
        String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn parses_ops_and_optional_user() {
        assert_eq!(
            parse_request("start alice").unwrap(),
            Some(Request {
                op: Op::Start,
                user_id: Some("alice".into())
            })
        );
        assert_eq!(
            parse_request("status").unwrap(),
            Some(Request {
                op: Op::Status,
                user_id: None
            })
        );
        assert_eq!(parse_request("   ").unwrap(), None);
        assert!(parse_request("jump").is_err());
        assert!(parse_request("start a b").is_err());
    }

    #[test]
    fn shell_round_trip() {
        let (store, _clock) = store();
        let out = replies("status\nstart bob\n\nsessions bob\nreset bob\n", &store);
        assert_eq!(out.len(), 4);
        assert_eq!(out[0]["type"], "work");
        assert_eq!(out[0]["duration"], 1500);
        assert_eq!(out[1]["is_running"], true);
        assert_eq!(out[2].as_array().unwrap().len(), 1);
        assert_eq!(out[3]["work_count"], 0);
        assert!(out[3]["current_session_id"].is_null());
    }

    #[test]
    fn missing_user_uses_configured_default() {
        let (store, _clock) = store();
        replies("start\n", &store);
        assert!(store.peek("default_user").running);
    }

    #[test]
    fn bad_lines_reply_with_error_and_continue() {
        let (store, _clock) = store();
        let out = replies("frobnicate\nstatus\n", &store);
        assert_eq!(out[0]["error"], "unknown op 'frobnicate'");
        assert_eq!(out[1]["is_running"], false);
    }
}
