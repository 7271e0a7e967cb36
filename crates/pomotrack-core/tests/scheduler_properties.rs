//! Property tests: random operation sequences never break timer invariants.

use std::sync::Arc;

use pomotrack_core::{Database, ManualClock, TimerStateStore};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Start,
    Pause,
    Reset,
    Status,
    Wait(i64),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => Just(Op::Start),
        2 => Just(Op::Pause),
        1 => Just(Op::Reset),
        3 => Just(Op::Status),
        4 => (1i64..4000).prop_map(Op::Wait),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn invariants_hold_after_every_operation(ops in prop::collection::vec(op(), 1..60)) {
        let clock = ManualClock::default();
        let db = Database::open_memory().unwrap();
        let store = TimerStateStore::new(Arc::new(db), Arc::new(clock.clone()));

        for op in ops {
            match op {
                Op::Start => { store.start("p").unwrap(); }
                Op::Pause => { store.pause("p").unwrap(); }
                Op::Reset => { store.reset("p").unwrap(); }
                Op::Status => {
                    let view = store.status("p").unwrap();
                    prop_assert!(view.remaining_time <= view.duration as f64);
                    prop_assert!(view.remaining_time >= 0.0);
                }
                Op::Wait(secs) => clock.advance_secs(secs),
            }

            let state = store.peek("p");
            prop_assert_eq!(state.check_committed(), Ok(()));

            let sessions = store.sessions("p").unwrap();
            let open: Vec<_> = sessions.iter().filter(|s| s.is_open()).collect();
            prop_assert!(open.len() <= 1);
            prop_assert_eq!(open.first().map(|s| s.id), state.current_session_id);
        }
    }
}
