//! Per-user timer registry.
//!
//! Each user's [`TimerState`] sits behind its own mutex. The registry map is
//! locked only long enough to fetch or create that mutex, so operations on
//! different users run in parallel while operations on one user are
//! serialized end to end, ledger writes included.
//!
//! A transition is committed only after every ledger write it requested has
//! succeeded. If a write fails the previous state stays in place and the
//! error is returned; because closing an already-closed session is a no-op,
//! repeating the operation later is safe.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use super::scheduler::{self, LedgerEffect, Transition};
use super::state::TimerState;
use crate::clock::Clock;
use crate::error::Result;
use crate::storage::{SessionLedger, SessionRecord, SessionStats};
use crate::views::StatusView;

type UserSlot = Arc<Mutex<TimerState>>;

pub struct TimerStateStore {
    users: Mutex<HashMap<String, UserSlot>>,
    ledger: Arc<dyn SessionLedger>,
    clock: Arc<dyn Clock>,
}

impl TimerStateStore {
    pub fn new(ledger: Arc<dyn SessionLedger>, clock: Arc<dyn Clock>) -> Self {
        Self {
            users: Mutex::new(HashMap::new()),
            ledger,
            clock,
        }
    }

    /// Start a fresh phase or resume a paused one.
    ///
    /// Already running is not an error; the state comes back unchanged.
    pub fn start(&self, user_id: &str) -> Result<TimerState> {
        self.with_user(user_id, scheduler::begin)
    }

    /// Freeze the remaining time. The open session stays open.
    pub fn pause(&self, user_id: &str) -> Result<TimerState> {
        self.with_user(user_id, |state, now| Transition {
            state: scheduler::suspend(state, now),
            effects: Vec::new(),
        })
    }

    /// Abandon the current phase and return to the initial default.
    pub fn reset(&self, user_id: &str) -> Result<TimerState> {
        self.with_user(user_id, scheduler::abandon)
    }

    /// Poll the timer. May advance the phase and write to the ledger.
    ///
    /// A pending sound event is handed out once and then cleared.
    pub fn status(&self, user_id: &str) -> Result<StatusView> {
        let slot = self.slot(user_id);
        let mut state = lock(&slot);
        let now = self.clock.now();

        let transition = scheduler::refresh(&state, now);
        let advanced = transition.opens_session();
        let mut next = self.apply(user_id, transition)?;
        if advanced {
            tracing::info!(
                %user_id,
                from = %state.phase,
                to = %next.phase,
                work_count = next.work_count,
                "phase advanced"
            );
        }
        let sound_event = next.pending_sound_event.take();
        *state = next;

        Ok(StatusView {
            is_running: state.running,
            remaining_time: state.remaining_secs(),
            phase: state.phase,
            duration: state.phase.duration_secs(),
            sound_event,
        })
    }

    /// Ledger history for `user_id`, newest first. Does not touch timer state.
    pub fn sessions(&self, user_id: &str) -> Result<Vec<SessionRecord>> {
        Ok(self.ledger.list(user_id)?)
    }

    pub fn stats(&self, user_id: &str) -> Result<SessionStats> {
        Ok(self.ledger.stats(user_id)?)
    }

    /// Current state without running the scheduler.
    pub fn peek(&self, user_id: &str) -> TimerState {
        lock(&self.slot(user_id)).clone()
    }

    /// Number of users with a timer in memory.
    pub fn user_count(&self) -> usize {
        self.users.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn with_user<F>(&self, user_id: &str, decide: F) -> Result<TimerState>
    where
        F: FnOnce(&TimerState, DateTime<Utc>) -> Transition,
    {
        let slot = self.slot(user_id);
        let mut state = lock(&slot);
        let now = self.clock.now();
        let next = self.apply(user_id, decide(&state, now))?;
        *state = next;
        Ok(state.clone())
    }

    /// Get-or-create the slot for `user_id`.
    fn slot(&self, user_id: &str) -> UserSlot {
        let mut users = self.users.lock().unwrap_or_else(|e| e.into_inner());
        users
            .entry(user_id.to_string())
            .or_insert_with(|| {
                tracing::debug!(%user_id, "created timer state");
                Arc::new(Mutex::new(TimerState::default()))
            })
            .clone()
    }

    /// Run the ledger writes of `transition` and return the state to commit.
    fn apply(&self, user_id: &str, transition: Transition) -> Result<TimerState> {
        let Transition { mut state, effects } = transition;
        for effect in effects {
            match effect {
                LedgerEffect::Open { phase, start_time } => {
                    let id = self
                        .ledger
                        .open(user_id, phase, start_time)
                        .inspect_err(|e| {
                            tracing::warn!(%user_id, %phase, error = %e, "session open failed; state not committed");
                        })?;
                    state.current_session_id = Some(id);
                }
                LedgerEffect::Close {
                    session_id,
                    end_time,
                    completed,
                } => {
                    self.ledger
                        .close(session_id, end_time, completed)
                        .inspect_err(|e| {
                            tracing::warn!(%user_id, %session_id, error = %e, "session close failed; state not committed");
                        })?;
                }
            }
        }
        debug_assert_eq!(state.check_committed(), Ok(()));
        Ok(state)
    }
}

fn lock(slot: &UserSlot) -> MutexGuard<'_, TimerState> {
    // State is only replaced wholesale, so a poisoned lock still holds a
    // consistent value.
    slot.lock().unwrap_or_else(|e| e.into_inner())
}
