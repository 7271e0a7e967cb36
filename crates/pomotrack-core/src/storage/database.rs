//! SQLite-backed session ledger.
//!
//! Provides persistent storage for:
//! - Session records (open, completed and abandoned phases)
//! - Per-user session statistics

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::ledger::{SessionId, SessionLedger, SessionRecord, SessionStats};
use crate::error::DatabaseError;
use crate::timer::Phase;

/// Ledger file name under the data directory when none is configured.
pub const DEFAULT_DB_FILE: &str = "pomotrack.db";

/// SQLite database for session storage.
///
/// The connection sits behind a mutex so the ledger can be shared across
/// threads; an insert and its `last_insert_rowid` run under one lock, which
/// keeps ids unique under concurrent opens.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) the database at an explicit path.
    pub fn open_at(path: impl AsRef<Path>) -> Result<Self, DatabaseError> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.migrate()?;
        tracing::debug!(path = %path.display(), "opened session ledger");
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.migrate()?;
        Ok(db)
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        // A panic mid-statement leaves nothing half-written in SQLite.
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn migrate(&self) -> Result<(), DatabaseError> {
        self.conn()
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS sessions (
                    id          INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_id     TEXT NOT NULL,
                    phase       TEXT NOT NULL,
                    start_time  TEXT NOT NULL,
                    end_time    TEXT,
                    completed   INTEGER NOT NULL DEFAULT 0
                );

                CREATE INDEX IF NOT EXISTS idx_sessions_user_id ON sessions(user_id, id);",
            )
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))
    }
}

fn to_iso(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_iso(id: i64, raw: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| DatabaseError::CorruptRecord {
            id,
            message: format!("bad timestamp '{raw}': {e}"),
        })
}

struct RawRow {
    id: i64,
    user_id: String,
    phase: String,
    start_time: String,
    end_time: Option<String>,
    completed: bool,
}

impl RawRow {
    fn into_record(self) -> Result<SessionRecord, DatabaseError> {
        let phase = self
            .phase
            .parse::<Phase>()
            .map_err(|message| DatabaseError::CorruptRecord {
                id: self.id,
                message,
            })?;
        let start_time = parse_iso(self.id, &self.start_time)?;
        let end_time = match self.end_time.as_deref() {
            Some(raw) => Some(parse_iso(self.id, raw)?),
            None => None,
        };
        Ok(SessionRecord {
            id: SessionId(self.id),
            user_id: self.user_id,
            phase,
            start_time,
            end_time,
            completed: self.completed,
        })
    }
}

impl SessionLedger for Database {
    fn open(
        &self,
        user_id: &str,
        phase: Phase,
        start_time: DateTime<Utc>,
    ) -> Result<SessionId, DatabaseError> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO sessions (user_id, phase, start_time, end_time, completed)
             VALUES (?1, ?2, ?3, NULL, 0)",
            params![user_id, phase.as_str(), to_iso(start_time)],
        )?;
        let id = SessionId(conn.last_insert_rowid());
        tracing::debug!(%user_id, %phase, session_id = %id, "session opened");
        Ok(id)
    }

    fn close(
        &self,
        session_id: SessionId,
        end_time: DateTime<Utc>,
        completed: bool,
    ) -> Result<bool, DatabaseError> {
        let changed = self.conn().execute(
            "UPDATE sessions SET end_time = ?1, completed = ?2
             WHERE id = ?3 AND end_time IS NULL",
            params![to_iso(end_time), completed, session_id.0],
        )?;
        if changed == 0 {
            tracing::debug!(session_id = %session_id, "close ignored: no open session with this id");
            return Ok(false);
        }
        tracing::debug!(session_id = %session_id, completed, "session closed");
        Ok(true)
    }

    fn list(&self, user_id: &str) -> Result<Vec<SessionRecord>, DatabaseError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, user_id, phase, start_time, end_time, completed
             FROM sessions
             WHERE user_id = ?1
             ORDER BY id DESC",
        )?;
        let rows = stmt.query_map(params![user_id], |row| {
            Ok(RawRow {
                id: row.get(0)?,
                user_id: row.get(1)?,
                phase: row.get(2)?,
                start_time: row.get(3)?,
                end_time: row.get(4)?,
                completed: row.get(5)?,
            })
        })?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?.into_record()?);
        }
        Ok(records)
    }

    fn stats(&self, user_id: &str) -> Result<SessionStats, DatabaseError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT phase, end_time IS NULL, completed, COUNT(*)
             FROM sessions
             WHERE user_id = ?1
             GROUP BY phase, end_time IS NULL, completed",
        )?;
        let rows = stmt.query_map(params![user_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, bool>(1)?,
                row.get::<_, bool>(2)?,
                row.get::<_, u64>(3)?,
            ))
        })?;

        let mut stats = SessionStats::default();
        for row in rows {
            let (phase, open, completed, count) = row?;
            stats.total_sessions += count;
            if open {
                stats.open += count;
                continue;
            }
            if !completed {
                stats.abandoned += count;
                continue;
            }
            match phase.as_str() {
                "work" => stats.completed_work += count,
                "break" => stats.completed_breaks += count,
                "long_break" => stats.completed_long_breaks += count,
                _ => {}
            }
        }
        Ok(stats)
    }
}

impl Database {
    /// Look up a single session by id.
    pub fn get(&self, session_id: SessionId) -> Result<Option<SessionRecord>, DatabaseError> {
        let conn = self.conn();
        let raw = conn
            .query_row(
                "SELECT id, user_id, phase, start_time, end_time, completed
                 FROM sessions WHERE id = ?1",
                params![session_id.0],
                |row| {
                    Ok(RawRow {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        phase: row.get(2)?,
                        start_time: row.get(3)?,
                        end_time: row.get(4)?,
                        completed: row.get(5)?,
                    })
                },
            )
            .optional()?;
        raw.map(RawRow::into_record).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 4, 12, 0, 0).unwrap()
    }

    #[test]
    fn open_then_close() {
        let db = Database::open_memory().unwrap();
        let id = db.open("alice", Phase::Work, t0()).unwrap();

        let rec = db.get(id).unwrap().unwrap();
        assert!(rec.is_open());
        assert!(!rec.completed);

        let end = t0() + Duration::minutes(25);
        assert!(db.close(id, end, true).unwrap());
        let rec = db.get(id).unwrap().unwrap();
        assert_eq!(rec.end_time, Some(end));
        assert!(rec.completed);
    }

    #[test]
    fn duplicate_close_is_ignored() {
        let db = Database::open_memory().unwrap();
        let id = db.open("alice", Phase::Work, t0()).unwrap();
        assert!(db.close(id, t0() + Duration::seconds(5), false).unwrap());
        // Second close must not overwrite the first outcome.
        assert!(!db.close(id, t0() + Duration::seconds(9), true).unwrap());

        let rec = db.get(id).unwrap().unwrap();
        assert!(!rec.completed);
        assert_eq!(rec.end_time, Some(t0() + Duration::seconds(5)));
    }

    #[test]
    fn close_unknown_id_is_noop() {
        let db = Database::open_memory().unwrap();
        assert!(!db.close(SessionId(404), t0(), true).unwrap());
    }

    #[test]
    fn ids_strictly_increase() {
        let db = Database::open_memory().unwrap();
        let a = db.open("alice", Phase::Work, t0()).unwrap();
        let b = db.open("bob", Phase::Work, t0()).unwrap();
        let c = db.open("alice", Phase::Break, t0()).unwrap();
        assert!(a < b && b < c);
    }

    #[test]
    fn list_is_newest_first_and_per_user() {
        let db = Database::open_memory().unwrap();
        let first = db.open("alice", Phase::Work, t0()).unwrap();
        db.open("bob", Phase::Work, t0()).unwrap();
        let second = db.open("alice", Phase::Break, t0()).unwrap();
        // Closing the older one last must not reorder the listing.
        db.close(second, t0() + Duration::minutes(1), false).unwrap();
        db.close(first, t0() + Duration::minutes(2), true).unwrap();

        let ids: Vec<_> = db.list("alice").unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![second, first]);
        assert_eq!(db.list("carol").unwrap().len(), 0);
    }

    #[test]
    fn timestamps_are_stored_as_utc_iso() {
        let db = Database::open_memory().unwrap();
        db.open("alice", Phase::Work, t0()).unwrap();
        let raw: String = db
            .conn()
            .query_row("SELECT start_time FROM sessions", [], |row| row.get(0))
            .unwrap();
        assert_eq!(raw, "2026-05-04T12:00:00.000Z");
    }

    #[test]
    fn stats_group_by_outcome() {
        let db = Database::open_memory().unwrap();
        let w1 = db.open("alice", Phase::Work, t0()).unwrap();
        db.close(w1, t0(), true).unwrap();
        let b1 = db.open("alice", Phase::Break, t0()).unwrap();
        db.close(b1, t0(), true).unwrap();
        let w2 = db.open("alice", Phase::Work, t0()).unwrap();
        db.close(w2, t0(), false).unwrap();
        db.open("alice", Phase::Work, t0()).unwrap();

        let stats = db.stats("alice").unwrap();
        assert_eq!(
            stats,
            SessionStats {
                total_sessions: 4,
                completed_work: 1,
                completed_breaks: 1,
                completed_long_breaks: 0,
                abandoned: 1,
                open: 1,
            }
        );
    }

    #[test]
    fn corrupt_phase_is_reported() {
        let db = Database::open_memory().unwrap();
        db.conn()
            .execute(
                "INSERT INTO sessions (user_id, phase, start_time) VALUES ('alice', 'nap', '2026-05-04T12:00:00Z')",
                [],
            )
            .unwrap();
        assert!(matches!(
            db.list("alice"),
            Err(DatabaseError::CorruptRecord { .. })
        ));
    }
}
