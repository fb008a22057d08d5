//! Property-based tests for the screen scheduler and key reservations.

use std::collections::HashMap;

use lcdproc_core::{ClientId, KeyReservations, Priority, Screen, ScreenDefaults, ScreenList};
use proptest::prelude::*;

fn priority() -> impl Strategy<Value = Priority> {
    prop_oneof![
        Just(Priority::Hidden),
        Just(Priority::Background),
        Just(Priority::Info),
        Just(Priority::Foreground),
        Just(Priority::Alert),
        Just(Priority::Input),
    ]
}

fn screen(id: usize, priority: Priority, duration: i32) -> Screen {
    let mut screen = Screen::new(format!("s{id}"), Some(ClientId(1)), &ScreenDefaults::default());
    screen.priority = priority;
    screen.duration = duration;
    screen
}

#[derive(Debug, Clone)]
enum Op {
    Add(Priority),
    Remove(usize),
    Reprioritize(usize, Priority),
    Tick,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        priority().prop_map(Op::Add),
        any::<usize>().prop_map(Op::Remove),
        (any::<usize>(), priority()).prop_map(|(i, p)| Op::Reprioritize(i, p)),
        Just(Op::Tick),
        Just(Op::Tick),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Property: after every scheduler pass the current screen belongs to
    /// the highest priority class present
    #[test]
    fn prop_current_screen_has_top_priority(
        ops in prop::collection::vec(op(), 1..80),
        duration in 1i32..10,
    ) {
        let mut list = ScreenList::new();
        let mut timer = 0u64;
        let mut next_id = 0;

        for op in ops {
            match op {
                Op::Add(priority) => {
                    list.add(screen(next_id, priority, duration));
                    next_id += 1;
                },
                Op::Remove(pick) => {
                    let keys: Vec<_> = list.iter().map(|(k, _)| k).collect();
                    if !keys.is_empty() {
                        list.remove(keys[pick % keys.len()], timer);
                    }
                },
                Op::Reprioritize(pick, priority) => {
                    let keys: Vec<_> = list.iter().map(|(k, _)| k).collect();
                    if !keys.is_empty() {
                        list.get_mut(keys[pick % keys.len()]).unwrap().priority = priority;
                    }
                },
                Op::Tick => {
                    timer += 1;
                    list.process(timer);

                    let top = list.iter().map(|(_, s)| s.priority).max();
                    let current = list.current_screen().map(|s| s.priority);
                    prop_assert_eq!(current, top);
                },
            }
        }
    }

    /// Property: a screen with timeout k is destroyed by the (k+1)th pass,
    /// the first pass only making it current
    #[test]
    fn prop_timeout_counts_passes_while_current(timeout in 1i32..60) {
        let mut list = ScreenList::new();
        let mut doomed = screen(0, Priority::Foreground, 1000);
        doomed.timeout = timeout;
        list.add(doomed);
        list.add(screen(1, Priority::Background, 1000));

        for timer in 1..=u64::try_from(timeout).unwrap() {
            let outcome = list.process(timer);
            prop_assert!(outcome.expired.is_none());
            prop_assert_eq!(list.current_screen().map(|s| s.id.as_str()), Some("s0"));
        }

        let outcome = list.process(u64::try_from(timeout).unwrap() + 1);
        prop_assert_eq!(outcome.expired.map(|s| s.id), Some("s0".to_owned()));
        prop_assert_eq!(list.len(), 1);
    }

    /// Property: a non-current screen's timeout never runs down
    #[test]
    fn prop_timeout_frozen_while_hidden(passes in 1u64..100) {
        let mut list = ScreenList::new();
        list.add(screen(0, Priority::Alert, 1000));
        let mut waiting = screen(1, Priority::Info, 1000);
        waiting.timeout = 5;
        let key = list.add(waiting);

        for timer in 1..=passes {
            list.process(timer);
        }
        prop_assert_eq!(list.get(key).map(|s| s.timeout), Some(5));
    }

    /// Property: exclusive and shared reservations of one key never coexist
    #[test]
    fn prop_reservations_stay_consistent(
        ops in prop::collection::vec((0u8..4, any::<bool>(), 0u64..4, any::<bool>()), 1..60),
    ) {
        let keys = ["Up", "Down", "Enter", "Escape"];
        let mut reservations = KeyReservations::new();

        for (key, exclusive, client, release) in ops {
            let key = keys[usize::from(key)];
            let owner = Some(ClientId(client));
            if release {
                reservations.release(key, owner);
            } else {
                let _ = reservations.reserve(key, exclusive, owner);
            }

            let mut by_key: HashMap<&str, (usize, usize)> = HashMap::new();
            for kr in reservations.iter() {
                let entry = by_key.entry(kr.key.as_str()).or_default();
                if kr.exclusive {
                    entry.0 += 1;
                } else {
                    entry.1 += 1;
                }
            }
            for (key, (exclusive, shared)) in by_key {
                prop_assert!(exclusive <= 1, "{key}: {exclusive} exclusive");
                prop_assert!(exclusive == 0 || shared == 0, "{key}: mixed");
            }
        }
    }
}
