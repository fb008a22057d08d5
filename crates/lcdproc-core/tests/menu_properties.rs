//! Property-based tests for the menu system.
//!
//! Random client edits and key presses must never leave the menu pointing
//! at a removed item or let one client's items leak into another's menu.

use lcdproc_core::{
    ClientId, DisplayProps, Priority, Screen, ScreenDefaults,
    menu::{CheckboxValue, DriverControls, MenuKeys, MenuSystem, ServerMenuSettings},
};
use proptest::prelude::*;

const CLIENTS: [ClientId; 2] = [ClientId(1), ClientId(2)];
const IDS: [&str; 4] = ["a", "b", "c", "d"];
const TYPES: [&str; 9] = ["menu", "action", "checkbox", "ring", "slider", "numeric", "alpha", "ip", "bogus"];
const KEYS: [&str; 6] = ["Escape", "Enter", "Up", "Down", "Left", "x"];

fn keys() -> MenuKeys {
    MenuKeys {
        menu: Some("Escape".into()),
        enter: Some("Enter".into()),
        up: Some("Up".into()),
        down: Some("Down".into()),
        left: Some("Left".into()),
        right: Some("Right".into()),
    }
}

fn system() -> MenuSystem {
    let mut menus = MenuSystem::new(keys(), false);
    menus
        .install_server_menu(&ServerMenuSettings {
            heartbeat: CheckboxValue::Gray,
            backlight: CheckboxValue::On,
            titlespeed: 10,
            drivers: vec![DriverControls { name: "lcd".into(), contrast: Some(500), brightness: Some((1000, 0)) }],
        })
        .unwrap();
    menus
}

#[derive(Debug, Clone)]
enum Op {
    Add { client: usize, parent: usize, id: usize, kind: usize },
    Remove { client: usize, id: usize },
    Goto { client: usize, id: usize },
    Key(usize),
    Disconnect(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0..2usize, 0..5usize, 0..4usize, 0..9usize)
            .prop_map(|(client, parent, id, kind)| Op::Add { client, parent, id, kind }),
        1 => (0..2usize, 0..4usize).prop_map(|(client, id)| Op::Remove { client, id }),
        1 => (0..2usize, 0..4usize).prop_map(|(client, id)| Op::Goto { client, id }),
        4 => (0..6usize).prop_map(Op::Key),
        1 => (0..2usize).prop_map(Op::Disconnect),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Property: the active item always exists and the menu screen is shown
    /// exactly while the menu is open
    #[test]
    fn prop_active_item_always_exists(ops in prop::collection::vec(op(), 1..100)) {
        let props = DisplayProps::default();
        let mut menus = system();
        let mut screen = Screen::new("_menu_screen", None, &ScreenDefaults::default());

        for op in ops {
            match op {
                Op::Add { client, parent, id, kind } => {
                    let parent = IDS.get(parent).copied().unwrap_or("");
                    let _ = menus.add_item(CLIENTS[client], Some("test"), parent, IDS[id], TYPES[kind], "label");
                },
                Op::Remove { client, id } => {
                    let _ = menus.remove_item(CLIENTS[client], IDS[id]);
                },
                Op::Goto { client, id } => {
                    let _ = menus.goto(CLIENTS[client], IDS[id], None);
                },
                Op::Key(key) => {
                    let _ = menus.handle_key(KEYS[key], &props);
                },
                Op::Disconnect(client) => menus.remove_client(CLIENTS[client]),
            }

            menus.sync_screen(&mut screen, &props);
            if let Some(active) = menus.active() {
                prop_assert!(menus.tree().contains(active));
                prop_assert_eq!(screen.priority, Priority::Input);
            } else {
                prop_assert_eq!(screen.priority, Priority::Hidden);
            }
        }
    }

    /// Property: items below a client's menu belong to that client and
    /// their ids are unique there
    #[test]
    fn prop_client_menus_stay_private(ops in prop::collection::vec(op(), 1..100)) {
        let props = DisplayProps::default();
        let mut menus = system();

        for op in ops {
            match op {
                Op::Add { client, parent, id, kind } => {
                    let parent = IDS.get(parent).copied().unwrap_or("");
                    let _ = menus.add_item(CLIENTS[client], Some("test"), parent, IDS[id], TYPES[kind], "label");
                },
                Op::Remove { client, id } => {
                    let _ = menus.remove_item(CLIENTS[client], IDS[id]);
                },
                Op::Goto { client, id } => {
                    let _ = menus.goto(CLIENTS[client], IDS[id], None);
                },
                Op::Key(key) => {
                    let _ = menus.handle_key(KEYS[key], &props);
                },
                Op::Disconnect(client) => menus.remove_client(CLIENTS[client]),
            }

            for client in CLIENTS {
                let Some(top) = menus.client_menu(client) else {
                    continue;
                };
                let mut seen = Vec::new();
                for (item, entry) in menus.tree().iter() {
                    if item != top && menus.tree().is_within(item, top) {
                        prop_assert_eq!(entry.owner, Some(client));
                        prop_assert!(!seen.contains(&entry.id), "duplicate {}", entry.id);
                        seen.push(entry.id.clone());
                    }
                }
            }
        }
    }
}
