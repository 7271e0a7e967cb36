//! Response shapes handed to the boundary layer.
//!
//! Field names are the wire contract; `type` carries the phase name.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::{SessionId, SessionRecord};
use crate::timer::{Phase, SoundEvent, TimerState};

/// Full timer view returned by start, pause and reset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerView {
    pub is_running: bool,
    /// Seconds.
    pub remaining_time: f64,
    pub paused: bool,
    #[serde(rename = "type")]
    pub phase: Phase,
    pub work_count: u8,
    pub current_session_id: Option<SessionId>,
}

impl From<&TimerState> for TimerView {
    fn from(state: &TimerState) -> Self {
        Self {
            is_running: state.running,
            remaining_time: state.remaining_secs(),
            paused: state.paused,
            phase: state.phase,
            work_count: state.work_count,
            current_session_id: state.current_session_id,
        }
    }
}

/// Reduced view returned by status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusView {
    pub is_running: bool,
    /// Seconds.
    pub remaining_time: f64,
    #[serde(rename = "type")]
    pub phase: Phase,
    /// Full length of the current phase in seconds.
    pub duration: u64,
    pub sound_event: Option<SoundEvent>,
}

/// One ledger entry as shown to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionView {
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub completed: bool,
    #[serde(rename = "type")]
    pub phase: Phase,
}

impl From<&SessionRecord> for SessionView {
    fn from(record: &SessionRecord) -> Self {
        Self {
            start_time: record.start_time,
            end_time: record.end_time,
            completed: record.completed,
            phase: record.phase,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timer_view_uses_wire_names() {
        let json = serde_json::to_value(TimerView::from(&TimerState::default())).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "is_running": false,
                "remaining_time": 1500.0,
                "paused": false,
                "type": "work",
                "work_count": 0,
                "current_session_id": null,
            })
        );
    }

    #[test]
    fn session_view_serializes_utc_iso() {
        let start = Utc.with_ymd_and_hms(2026, 2, 1, 10, 0, 0).unwrap();
        let record = SessionRecord {
            id: SessionId(4),
            user_id: "alice".into(),
            phase: Phase::LongBreak,
            start_time: start,
            end_time: None,
            completed: false,
        };
        let json = serde_json::to_value(SessionView::from(&record)).unwrap();
        assert_eq!(json["type"], "long_break");
        assert_eq!(json["start_time"], "2026-02-01T10:00:00Z");
        assert!(json["end_time"].is_null());
    }
}
