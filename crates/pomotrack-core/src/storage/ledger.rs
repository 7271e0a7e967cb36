//! Session ledger contract.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DatabaseError;
use crate::timer::Phase;

/// Ledger-assigned session id. Strictly increasing within a ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub i64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: SessionId,
    pub user_id: String,
    pub phase: Phase,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub completed: bool,
}

impl SessionRecord {
    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }
}

/// Per-user session counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SessionStats {
    pub total_sessions: u64,
    pub completed_work: u64,
    pub completed_breaks: u64,
    pub completed_long_breaks: u64,
    /// Closed without completing (reset).
    pub abandoned: u64,
    pub open: u64,
}

/// Durable log of sessions.
///
/// Implementations must be safe to share between threads; the timer store
/// calls them while holding a single user's lock.
pub trait SessionLedger: Send + Sync {
    /// Append an open session and return its id.
    fn open(
        &self,
        user_id: &str,
        phase: Phase,
        start_time: DateTime<Utc>,
    ) -> Result<SessionId, DatabaseError>;

    /// Close an open session.
    ///
    /// Returns `false` without error when the id is unknown or the session
    /// is already closed, so a repeated close is harmless.
    fn close(
        &self,
        session_id: SessionId,
        end_time: DateTime<Utc>,
        completed: bool,
    ) -> Result<bool, DatabaseError>;

    /// All sessions of `user_id`, most recently opened first.
    fn list(&self, user_id: &str) -> Result<Vec<SessionRecord>, DatabaseError>;

    fn stats(&self, user_id: &str) -> Result<SessionStats, DatabaseError> {
        let mut stats = SessionStats::default();
        for record in self.list(user_id)? {
            stats.total_sessions += 1;
            match (record.end_time, record.completed, record.phase) {
                (None, _, _) => stats.open += 1,
                (Some(_), false, _) => stats.abandoned += 1,
                (Some(_), true, Phase::Work) => stats.completed_work += 1,
                (Some(_), true, Phase::Break) => stats.completed_breaks += 1,
                (Some(_), true, Phase::LongBreak) => stats.completed_long_breaks += 1,
            }
        }
        Ok(stats)
    }
}
