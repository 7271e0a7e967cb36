use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Work sessions completed before a long break replaces the short one.
pub const WORK_SESSIONS_PER_LONG_BREAK: u8 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Work,
    Break,
    LongBreak,
}

impl Phase {
    /// Fixed phase length in seconds.
    pub fn duration_secs(self) -> u64 {
        match self {
            Phase::Work => 25 * 60,
            Phase::Break => 5 * 60,
            Phase::LongBreak => 15 * 60,
        }
    }

    /// Phase length in milliseconds.
    pub fn duration_ms(self) -> u64 {
        self.duration_secs().saturating_mul(1000)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Work => "work",
            Phase::Break => "break",
            Phase::LongBreak => "long_break",
        }
    }

    /// Sound tag emitted when this phase runs out.
    pub fn end_sound(self) -> SoundEvent {
        match self {
            Phase::Work => SoundEvent::WorkEnd,
            Phase::Break => SoundEvent::BreakEnd,
            Phase::LongBreak => SoundEvent::LongBreakEnd,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "work" => Ok(Phase::Work),
            "break" => Ok(Phase::Break),
            "long_break" => Ok(Phase::LongBreak),
            other => Err(format!("unknown phase '{other}'")),
        }
    }
}

/// Which sound the presentation layer should play. Playing it is not our job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoundEvent {
    WorkEnd,
    BreakEnd,
    LongBreakEnd,
}
