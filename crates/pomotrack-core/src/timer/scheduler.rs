//! Phase scheduling decisions.
//!
//! Every function here is pure: it takes the current [`TimerState`] and the
//! wall-clock instant `now` and returns the next state together with the
//! ledger writes that must back it. Nothing here touches storage, so the
//! store can refuse to commit a [`Transition`] whose writes failed.
//!
//! ## Phase Cycle
//!
//! ```text
//! Work -> Break -> Work -> Break -> Work -> Break -> Work -> LongBreak -> Work ...
//! ```
//!
//! Expiry is only noticed by [`refresh`]; at most one phase advance is
//! applied per call, however long the caller waited between polls.

use chrono::{DateTime, Duration, Utc};

use super::phase::{Phase, WORK_SESSIONS_PER_LONG_BREAK};
use super::state::TimerState;
use crate::storage::SessionId;

/// A ledger write requested by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerEffect {
    /// Open a session for `phase`. The id returned by the ledger becomes
    /// the state's `current_session_id`.
    Open {
        phase: Phase,
        start_time: DateTime<Utc>,
    },
    Close {
        session_id: SessionId,
        end_time: DateTime<Utc>,
        completed: bool,
    },
}

/// Next state plus the ledger writes, in the order they must be applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: TimerState,
    pub effects: Vec<LedgerEffect>,
}

impl Transition {
    fn unchanged(state: TimerState) -> Self {
        Self {
            state,
            effects: Vec::new(),
        }
    }

    /// True when the transition moved to a new phase.
    pub fn opens_session(&self) -> bool {
        self.effects
            .iter()
            .any(|e| matches!(e, LedgerEffect::Open { .. }))
    }
}

/// Start a fresh run, or resume a paused one. No-op while running.
pub fn begin(state: &TimerState, now: DateTime<Utc>) -> Transition {
    if state.running {
        return Transition::unchanged(state.clone());
    }

    let mut next = state.clone();
    if state.paused {
        let elapsed_ms = state.phase.duration_ms().saturating_sub(state.remaining_ms);
        next.start_time = Some(now - Duration::milliseconds(elapsed_ms as i64));
        next.paused = false;
        next.running = true;
        return Transition::unchanged(next);
    }

    next.remaining_ms = state.phase.duration_ms();
    next.start_time = Some(now);
    next.running = true;
    next.current_session_id = None;
    Transition {
        state: next,
        effects: vec![LedgerEffect::Open {
            phase: state.phase,
            start_time: now,
        }],
    }
}

/// Freeze the remaining time. The session stays open. No-op unless running.
pub fn suspend(state: &TimerState, now: DateTime<Utc>) -> TimerState {
    if !state.running {
        return state.clone();
    }
    let mut next = state.clone();
    next.remaining_ms = remaining_ms(state, now);
    next.running = false;
    next.start_time = None;
    next.paused = true;
    next
}

/// Drop the current phase and return to the initial default.
///
/// An open session is closed as not completed.
pub fn abandon(state: &TimerState, now: DateTime<Utc>) -> Transition {
    let mut effects = Vec::new();
    if state.has_open_session() {
        if let Some(session_id) = state.current_session_id {
            effects.push(LedgerEffect::Close {
                session_id,
                end_time: now,
                completed: false,
            });
        }
    }
    Transition {
        state: TimerState::default(),
        effects,
    }
}

/// Recompute remaining time and advance at most one phase on expiry.
pub fn refresh(state: &TimerState, now: DateTime<Utc>) -> Transition {
    if !state.running {
        return Transition::unchanged(state.clone());
    }

    let remaining = remaining_ms(state, now);
    if remaining > 0 {
        let mut next = state.clone();
        next.remaining_ms = remaining;
        return Transition::unchanged(next);
    }

    let mut effects = Vec::with_capacity(2);
    if let Some(session_id) = state.current_session_id {
        effects.push(LedgerEffect::Close {
            session_id,
            end_time: now,
            completed: true,
        });
    }

    let (phase, work_count) = next_phase(state.phase, state.work_count);
    let next = TimerState {
        running: true,
        paused: false,
        start_time: Some(now),
        remaining_ms: phase.duration_ms(),
        phase,
        work_count,
        current_session_id: None,
        pending_sound_event: Some(state.phase.end_sound()),
    };
    effects.push(LedgerEffect::Open {
        phase,
        start_time: now,
    });

    Transition {
        state: next,
        effects,
    }
}

/// Phase and work count that follow `phase` running out.
pub fn next_phase(phase: Phase, work_count: u8) -> (Phase, u8) {
    match phase {
        Phase::Work => {
            let done = work_count.saturating_add(1);
            if done >= WORK_SESSIONS_PER_LONG_BREAK {
                (Phase::LongBreak, 0)
            } else {
                (Phase::Break, done)
            }
        }
        Phase::Break | Phase::LongBreak => (Phase::Work, work_count),
    }
}

/// Time left in the running phase, clamped to `[0, duration]`.
fn remaining_ms(state: &TimerState, now: DateTime<Utc>) -> u64 {
    let total = state.phase.duration_ms();
    let Some(start) = state.start_time else {
        return state.remaining_ms.min(total);
    };
    // A clock that stepped backwards counts as no time elapsed.
    let elapsed = (now - start).num_milliseconds().max(0) as u64;
    total.saturating_sub(elapsed)
}
