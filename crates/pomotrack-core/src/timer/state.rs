use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::phase::{Phase, SoundEvent, WORK_SESSIONS_PER_LONG_BREAK};
use crate::storage::SessionId;

/// Per-user timer state.
///
/// Owned by [`TimerStateStore`](super::TimerStateStore); every change goes
/// through the pure functions in [`scheduler`](super::scheduler).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    pub running: bool,
    pub paused: bool,
    /// When the current run began. Back-dated on resume so that
    /// `now - start_time` is the total elapsed time of the phase.
    pub start_time: Option<DateTime<Utc>>,
    /// Remaining time in milliseconds for the current phase.
    pub remaining_ms: u64,
    pub phase: Phase,
    /// Work phases completed since the last long break.
    pub work_count: u8,
    pub current_session_id: Option<SessionId>,
    pub pending_sound_event: Option<SoundEvent>,
}

impl Default for TimerState {
    fn default() -> Self {
        Self {
            running: false,
            paused: false,
            start_time: None,
            remaining_ms: Phase::Work.duration_ms(),
            phase: Phase::Work,
            work_count: 0,
            current_session_id: None,
            pending_sound_event: None,
        }
    }
}

impl TimerState {
    /// Remaining time in seconds.
    pub fn remaining_secs(&self) -> f64 {
        self.remaining_ms as f64 / 1000.0
    }

    /// True while a session is open for this state.
    pub fn has_open_session(&self) -> bool {
        self.running || self.paused
    }

    /// Returns the first broken invariant, if any.
    ///
    /// `current_session_id` is allowed to be absent while running only in
    /// the intermediate state returned by the scheduler before the store
    /// fills in the id, so that check is left to callers holding a
    /// committed state.
    pub fn check(&self) -> Result<(), String> {
        if self.start_time.is_some() != self.running {
            return Err("start_time must be set iff running".into());
        }
        if self.running && self.paused {
            return Err("running and paused are exclusive".into());
        }
        if self.remaining_ms > self.phase.duration_ms() {
            return Err(format!(
                "remaining {}ms exceeds {} duration",
                self.remaining_ms, self.phase
            ));
        }
        if self.work_count >= WORK_SESSIONS_PER_LONG_BREAK {
            return Err(format!("work_count {} out of range", self.work_count));
        }
        if self.phase == Phase::LongBreak && self.work_count != 0 {
            return Err("work_count must reset on long break".into());
        }
        Ok(())
    }

    /// Like [`check`](Self::check), plus the session-id invariant.
    pub fn check_committed(&self) -> Result<(), String> {
        self.check()?;
        if self.current_session_id.is_some() != self.has_open_session() {
            return Err("current_session_id must be set iff a session is open".into());
        }
        Ok(())
    }
}
