//! # pomotrack Core Library
//!
//! Per-user Pomodoro timers backed by a durable session ledger.
//!
//! ## Architecture
//!
//! - **Scheduler**: pure functions that compute remaining time and decide
//!   phase transitions (work, break, long break) from wall-clock instants
//! - **Timer store**: owns every user's in-memory timer, one lock per user,
//!   and commits a transition only after the ledger has recorded it
//! - **Storage**: SQLite session ledger and TOML configuration
//!
//! There is no background thread. A running phase expires when `status` is
//! polled after its end, and a single poll advances at most one phase.
//!
//! ## Key Components
//!
//! - [`TimerStateStore`]: start / pause / reset / status / sessions per user
//! - [`SessionLedger`]: trait for durable session records, implemented by
//!   [`Database`]
//! - [`Clock`]: injectable time source
//! - [`Config`]: application configuration management

pub mod clock;
pub mod error;
pub mod storage;
pub mod timer;
pub mod user;
pub mod views;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ConfigError, CoreError, DatabaseError, ValidationError};
pub use storage::{Config, Database, SessionId, SessionLedger, SessionRecord, SessionStats};
pub use timer::{Phase, SoundEvent, TimerState, TimerStateStore};
pub use user::{resolve_user_id, DEFAULT_USER_ID};
pub use views::{SessionView, StatusView, TimerView};
