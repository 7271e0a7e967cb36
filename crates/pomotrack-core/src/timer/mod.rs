mod phase;
pub mod scheduler;
mod state;
mod store;

pub use phase::{Phase, SoundEvent, WORK_SESSIONS_PER_LONG_BREAK};
pub use scheduler::{LedgerEffect, Transition};
pub use state::TimerState;
pub use store::TimerStateStore;
