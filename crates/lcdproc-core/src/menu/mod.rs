//! Menu system: the item tree, the one active item and the menu screen.
//!
//! # Components
//!
//! - [`item`]: item types and their state
//! - [`tree`]: the arena holding all items, plus menu navigation
//! - [`input`]: key handling of the value editors
//! - [`edit`]: edit buffer shared by the numeric, alpha and ip editors
//! - [`layout`]: widgets of the menu screen
//! - [`options`]: the `menu_set_item` option list
//!
//! [`MenuSystem`] ties them together. It routes keys to the active item,
//! follows the navigation result, maintains the per-client menus and
//! collects [`MenuEvent`]s for the item owners. The menu screen itself lives
//! in the screen list; [`MenuSystem::sync_screen`] brings it up to date.

pub mod edit;
pub mod input;
pub mod item;
pub mod layout;
pub mod options;
pub mod tree;

use std::collections::BTreeMap;

pub use self::{
    input::MenuEventKind,
    item::{
        CheckboxValue, ItemKind, ItemRef, ItemType, KeyMask, MenuData, MenuItem, MenuResult,
        MenuToken, NavTarget, SliderData,
    },
    options::{OptionError, apply_options},
    tree::MenuTree,
};
use crate::{
    client::ClientId,
    driver::DisplayProps,
    error::{ClientMenuError, ItemError, MenuError},
    screen::{Priority, Screen},
};

/// Id of the server screen showing the active item.
pub const MENU_SCREEN_ID: &str = "_menu_screen";

/// Id of the menu holding a client's items.
pub const CLIENT_MENU_ID: &str = "_client_menu_";

/// `menu_set_main` argument restoring the server's main menu.
pub const MAIN_MENU_ALIAS: &str = "_main_";

/// Ids and values in events are cut to this many characters.
const EVENT_FIELD_LIMIT: usize = 40;

/// Highest title scroll speed.
pub const TITLESPEED_MAX: i32 = 10;

fn truncate(text: &str) -> String {
    text.chars().take(EVENT_FIELD_LIMIT).collect()
}

/// Keys bound to menu tokens. Unbound tokens are simply not available.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MenuKeys {
    /// Opens the menu and goes back
    pub menu: Option<String>,
    /// Selects and confirms
    pub enter: Option<String>,
    /// Moves up
    pub up: Option<String>,
    /// Moves down
    pub down: Option<String>,
    /// Moves left
    pub left: Option<String>,
    /// Moves right
    pub right: Option<String>,
}

impl MenuKeys {
    fn bindings(&self) -> [(Option<&str>, MenuToken); 6] {
        [
            (self.menu.as_deref(), MenuToken::Menu),
            (self.enter.as_deref(), MenuToken::Enter),
            (self.up.as_deref(), MenuToken::Up),
            (self.down.as_deref(), MenuToken::Down),
            (self.left.as_deref(), MenuToken::Left),
            (self.right.as_deref(), MenuToken::Right),
        ]
    }

    /// Mask of the bound tokens.
    pub fn mask(&self) -> KeyMask {
        let mut mask = KeyMask::default();
        for (key, token) in self.bindings() {
            if key.is_some() {
                mask.insert(token);
            }
        }
        mask
    }

    /// Token of a key; unbound keys are [`MenuToken::Other`].
    pub fn token(&self, key: &str) -> MenuToken {
        self.bindings()
            .into_iter()
            .find(|(bound, _)| *bound == Some(key))
            .map_or(MenuToken::Other, |(_, token)| token)
    }

    /// Whether `key` is the menu key.
    pub fn is_menu_key(&self, key: &str) -> bool {
        self.menu.as_deref() == Some(key)
    }

    /// Keys the server reserves, with their exclusivity. Only the menu key
    /// is exclusive; the others stay usable by clients.
    pub fn reservations(&self) -> impl Iterator<Item = (&str, bool)> + '_ {
        self.bindings()
            .into_iter()
            .filter_map(|(key, token)| key.map(|key| (key, token == MenuToken::Menu)))
    }
}

/// Something happened to an item; its owner may want to know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEvent {
    /// The item
    pub item: ItemRef,
    /// Owning client; `None` for the server's own items
    pub owner: Option<ClientId>,
    /// Item id, cut to 40 characters
    pub id: String,
    /// What happened
    pub kind: MenuEventKind,
    /// Item value for update, plus and minus events
    pub value: Option<String>,
    /// Driver association of the containing menu
    pub association: Option<usize>,
}

/// Contrast and brightness controls of one driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverControls {
    /// Driver name, used as menu id and title
    pub name: String,
    /// Current contrast, when adjustable
    pub contrast: Option<i32>,
    /// Current on and off brightness, when adjustable
    pub brightness: Option<(i32, i32)>,
}

/// Initial values of the server's options menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerMenuSettings {
    /// Heartbeat setting; gray defers to clients
    pub heartbeat: CheckboxValue,
    /// Backlight setting; gray defers to clients
    pub backlight: CheckboxValue,
    /// Title scroll speed
    pub titlespeed: i32,
    /// One entry per loaded driver, in driver order
    pub drivers: Vec<DriverControls>,
}

fn slider(id: &str, text: &str, (min, max, step): (i32, i32, i32), labels: (&str, &str), value: i32) -> MenuItem {
    MenuItem::new(
        id,
        text,
        None,
        ItemKind::Slider(SliderData {
            mintext: labels.0.into(),
            maxtext: labels.1.into(),
            min,
            max,
            step,
            value,
        }),
    )
}

/// The menu controller.
#[derive(Debug, Clone)]
pub struct MenuSystem {
    tree: MenuTree,
    custom_main: Option<ItemRef>,
    active: Option<ItemRef>,
    keys: MenuKeys,
    mask: KeyMask,
    permissive_goto: bool,
    client_menus: BTreeMap<ClientId, ItemRef>,
    events: Vec<MenuEvent>,
    dirty: bool,
}

impl MenuSystem {
    /// Menu system with an empty main menu. With `permissive_goto`, links
    /// and `menu_goto` may reach any item instead of only the client's own.
    pub fn new(keys: MenuKeys, permissive_goto: bool) -> Self {
        let root = MenuItem::new("mainmenu", "LCDproc Menu", None, ItemKind::Menu(MenuData::default()));
        let mask = keys.mask();
        Self {
            tree: MenuTree::new(root),
            custom_main: None,
            active: None,
            keys,
            mask,
            permissive_goto,
            client_menus: BTreeMap::new(),
            events: Vec::new(),
            dirty: false,
        }
    }

    /// Add the server's options menu: heartbeat, backlight, title speed and
    /// a submenu per driver with adjustable contrast or brightness. The
    /// submenu's association is the driver's index in `settings.drivers`.
    pub fn install_server_menu(&mut self, settings: &ServerMenuSettings) -> Result<(), ItemError> {
        let options = self.tree.insert(
            self.tree.root(),
            MenuItem::new("options", "Options", None, ItemKind::Menu(MenuData::default())),
        )?;
        self.tree.insert(
            options,
            MenuItem::new(
                "heartbeat",
                "Heartbeat",
                None,
                ItemKind::Checkbox { value: settings.heartbeat, allow_gray: true },
            ),
        )?;
        self.tree.insert(
            options,
            MenuItem::new(
                "backlight",
                "Backlight",
                None,
                ItemKind::Checkbox { value: settings.backlight, allow_gray: true },
            ),
        )?;
        self.tree.insert(
            options,
            slider("titlespeed", "TitleSpeed", (0, TITLESPEED_MAX, 1), ("0", "10"), settings.titlespeed),
        )?;

        for (index, driver) in settings.drivers.iter().enumerate() {
            if driver.contrast.is_none() && driver.brightness.is_none() {
                continue;
            }
            let menu = self.tree.insert(
                options,
                MenuItem::new(
                    driver.name.as_str(),
                    driver.name.as_str(),
                    None,
                    ItemKind::Menu(MenuData { association: Some(index), ..MenuData::default() }),
                ),
            )?;
            let range = (0, 1000, 25);
            if let Some(contrast) = driver.contrast {
                self.tree.insert(menu, slider("contrast", "Contrast", range, ("min", "max"), contrast))?;
            }
            if let Some((on, off)) = driver.brightness {
                self.tree
                    .insert(menu, slider("onbrightness", "On Brightness", range, ("min", "max"), on))?;
                self.tree
                    .insert(menu, slider("offbrightness", "Off Brightness", range, ("min", "max"), off))?;
            }
        }
        Ok(())
    }

    /// The item tree.
    pub fn tree(&self) -> &MenuTree {
        &self.tree
    }

    /// The item currently shown, if the menu is open.
    pub fn active(&self) -> Option<ItemRef> {
        self.active
    }

    /// Whether the menu is open.
    pub fn is_open(&self) -> bool {
        self.active.is_some()
    }

    /// The menu opened by the menu key: a client's custom main menu or the
    /// server's.
    pub fn main(&self) -> ItemRef {
        self.custom_main.unwrap_or_else(|| self.tree.root())
    }

    /// Key bindings.
    pub fn keys(&self) -> &MenuKeys {
        &self.keys
    }

    /// A client's menu, once it added an item.
    pub fn client_menu(&self, client: ClientId) -> Option<ItemRef> {
        self.client_menus.get(&client).copied()
    }

    /// Events collected since the last call.
    pub fn take_events(&mut self) -> Vec<MenuEvent> {
        std::mem::take(&mut self.events)
    }

    /// Bring the menu screen up to date: visible with input priority while
    /// the menu is open, rebuilt when anything shown changed.
    pub fn sync_screen(&mut self, screen: &mut Screen, props: &DisplayProps) {
        screen.priority = if self.active.is_some() { Priority::Input } else { Priority::Hidden };
        if self.dirty {
            layout::build_screen(&self.tree, self.active, screen, props);
            self.dirty = false;
        }
    }

    /// Feed a key. The first key opens the main menu; after that keys go to
    /// the active item and its result decides where to go.
    pub fn handle_key(&mut self, key: &str, props: &DisplayProps) -> Result<(), MenuError> {
        let token = self.keys.token(key);
        let Some(active) = self.active else {
            self.switch_item(Some(self.main()));
            return Ok(());
        };

        let size = (usize::try_from(props.width).unwrap_or(0), usize::try_from(props.height).unwrap_or(0));
        let input = self.tree.process_input(active, token, key, self.mask, size);
        if let Some((item, kind)) = input.event {
            self.emit(item, kind);
        }

        match input.result {
            MenuResult::Error => return Err(MenuError::Rejected { id: self.id_of(active) }),
            MenuResult::None => self.dirty = true,
            MenuResult::Enter => {
                let Some(sub) = self.tree.subitem(active) else {
                    return Err(MenuError::NoSelection { id: self.id_of(active) });
                };
                self.switch_item(Some(sub));
            },
            MenuResult::Close => {
                let target = if active == self.main() { None } else { self.tree.parent(active) };
                self.switch_item(target);
            },
            MenuResult::Quit => self.switch_item(None),
            MenuResult::Predecessor => self.follow_link(active, true)?,
            MenuResult::Successor => self.follow_link(active, false)?,
        }
        Ok(())
    }

    fn id_of(&self, item: ItemRef) -> String {
        self.tree.get(item).map(|i| i.id.clone()).unwrap_or_default()
    }

    /// Make `new` the active item, or close the menu with `None`. The new
    /// item keeps its state when coming back up from one of its children.
    fn switch_item(&mut self, new: Option<ItemRef>) {
        let old = self.active;
        self.active = new;

        match (old, new) {
            (None, Some(item)) => self.reset(item),
            (Some(old), Some(item)) if self.tree.parent(old) != Some(item) => self.reset(item),
            _ => {},
        }
        self.dirty = true;

        if let Some(old) = old {
            self.emit(old, MenuEventKind::Leave);
        }
        if let Some(new) = new {
            self.emit(new, MenuEventKind::Enter);
        }
    }

    fn reset(&mut self, item: ItemRef) {
        if let Some(item) = self.tree.get_mut(item) {
            item.reset();
        }
    }

    fn emit(&mut self, item: ItemRef, kind: MenuEventKind) {
        let Some(entry) = self.tree.get(item) else {
            return;
        };
        let association = entry
            .parent
            .and_then(|parent| self.tree.get(parent))
            .and_then(MenuItem::menu)
            .and_then(|menu| menu.association);
        let value = if kind.carries_value() { entry.event_value().map(|v| truncate(&v)) } else { None };
        self.events.push(MenuEvent {
            item,
            owner: entry.owner,
            id: truncate(&entry.id),
            kind,
            value,
            association,
        });
    }

    /// Follow the predecessor or successor link of the active item, or of
    /// the entry selected in the active menu.
    fn follow_link(&mut self, active: ItemRef, predecessor: bool) -> Result<(), MenuError> {
        let is_menu = self.tree.get(active).is_some_and(|item| item.item_type() == ItemType::Menu);
        let source = match (is_menu, predecessor) {
            (true, true) => self.tree.predecessor_source(active),
            (true, false) => self.tree.successor_source(active),
            (false, _) => active,
        };
        let Some(item) = self.tree.get(source) else {
            return Err(MenuError::Rejected { id: self.id_of(active) });
        };
        let link = if predecessor { item.predecessor.as_ref() } else { item.successor.as_ref() };
        let Some(NavTarget::Item(target_id)) = link else {
            return Ok(());
        };
        let target_id = target_id.clone();

        let owner = self.tree.get(active).and_then(|item| item.owner);
        let Some(target) = self.search(&target_id, owner) else {
            return Err(MenuError::TargetNotFound { id: item.id.clone(), target: target_id });
        };
        let Some(target_item) = self.tree.get(target) else {
            return Err(MenuError::TargetNotFound { id: self.id_of(source), target: target_id });
        };
        let parent = target_item.parent;

        if target_item.item_type().is_inline() {
            if Some(active) != parent {
                self.switch_item(parent);
            }
            if let Some(current) = self.active {
                self.tree.select(current, &target_id);
            }
            self.dirty = true;
        } else {
            if let Some(parent) = parent
                && self.tree.get(parent).is_some_and(|p| p.item_type() == ItemType::Menu)
            {
                self.tree.select(parent, &target_id);
            }
            self.switch_item(Some(target));
        }
        Ok(())
    }

    /// Find the item `id` as seen by `owner`: anywhere with permissive goto
    /// or for server items, otherwise only in the owner's menu.
    pub fn search(&self, id: &str, owner: Option<ClientId>) -> Option<ItemRef> {
        let top = match owner {
            Some(client) if !self.permissive_goto => self.client_menu(client)?,
            _ => self.tree.root(),
        };
        self.tree.find(top, id, true)
    }

    /// Redraw when `item` is shown, either active itself or as an entry of
    /// the active menu.
    fn item_modified(&mut self, item: ItemRef) {
        if let Some(active) = self.active
            && (active == item || self.tree.parent(item) == Some(active))
        {
            self.dirty = true;
        }
    }

    /// Remove an item and everything below it. When the active item is
    /// inside, the menu moves up to the removed item's parent first.
    fn destroy(&mut self, item: ItemRef) {
        if !self.tree.contains(item) || item == self.tree.root() {
            return;
        }
        let parent = self.tree.parent(item);
        if let Some(active) = self.active
            && self.tree.is_within(active, item)
        {
            self.switch_item(parent);
        }
        if let Some(custom) = self.custom_main
            && self.tree.is_within(custom, item)
        {
            self.custom_main = None;
        }
        self.tree.remove(item);
        if let Some(parent) = parent {
            self.item_modified(parent);
        }
    }

    /// `menu_add_item`: create an item in the client's menu, creating that
    /// menu on first use. `parent_id` empty means the client menu itself.
    pub fn add_item(
        &mut self,
        client: ClientId,
        client_name: Option<&str>,
        parent_id: &str,
        id: &str,
        type_name: &str,
        text: &str,
    ) -> Result<ItemRef, ClientMenuError> {
        let name = client_name.ok_or(ClientMenuError::Unnamed)?;
        let client_menu = match self.client_menu(client) {
            Some(menu) => menu,
            None => {
                let root = self.tree.root();
                let menu = MenuItem::new(CLIENT_MENU_ID, name, Some(client), ItemKind::Menu(MenuData::default()));
                let menu = self.tree.insert(root, menu).map_err(|_| ClientMenuError::MenuNotFound)?;
                self.client_menus.insert(client, menu);
                self.item_modified(root);
                menu
            },
        };

        let parent = if parent_id.is_empty() {
            client_menu
        } else {
            self.tree.find(client_menu, parent_id, true).ok_or(ClientMenuError::MenuNotFound)?
        };
        if self.tree.find(client_menu, id, true).is_some() {
            return Err(ClientMenuError::DuplicateId);
        }
        let item_type = ItemType::from_name(type_name).ok_or(ClientMenuError::InvalidType)?;

        let item = MenuItem::with_defaults(id, item_type, text, Some(client));
        let item = self.tree.insert(parent, item).map_err(|_| ClientMenuError::MenuNotFound)?;
        self.item_modified(parent);
        Ok(item)
    }

    /// `menu_set_item`: apply options to an item of the client's menu.
    /// Returns the rejected options; the rest are applied.
    pub fn set_item(
        &mut self,
        client: ClientId,
        id: &str,
        args: &[String],
    ) -> Result<Vec<OptionError>, ClientMenuError> {
        let item_ref = self
            .client_menu(client)
            .and_then(|menu| self.tree.find(menu, id, true))
            .ok_or(ClientMenuError::ItemNotFound)?;
        let mut item = self.tree.get(item_ref).cloned().ok_or(ClientMenuError::ItemNotFound)?;
        let errors = apply_options(&mut item, args, |target| self.search(target, Some(client)).is_some());
        if let Some(slot) = self.tree.get_mut(item_ref) {
            *slot = item;
        }
        self.item_modified(item_ref);
        Ok(errors)
    }

    /// `menu_del_item`: remove an item from the client's menu. An emptied
    /// client menu goes away too.
    pub fn remove_item(&mut self, client: ClientId, id: &str) -> Result<(), ClientMenuError> {
        let client_menu = self.client_menu(client).ok_or(ClientMenuError::NoMenu)?;
        let item = self.tree.find(client_menu, id, true).ok_or(ClientMenuError::ItemNotFound)?;
        self.destroy(item);
        if !self.tree.contains(client_menu) || self.tree.children(client_menu).is_empty() {
            self.remove_client(client);
        }
        Ok(())
    }

    /// Drop a client's menu, for example on disconnect.
    pub fn remove_client(&mut self, client: ClientId) {
        if let Some(menu) = self.client_menus.remove(&client) {
            self.destroy(menu);
        }
    }

    /// `menu_goto`: open the menu at an item, optionally setting its
    /// predecessor first. Returns the rejected predecessor, if any.
    pub fn goto(
        &mut self,
        client: ClientId,
        id: &str,
        predecessor: Option<&str>,
    ) -> Result<Vec<OptionError>, ClientMenuError> {
        let target = if id.is_empty() { self.client_menu(client) } else { self.search(id, Some(client)) }
            .ok_or(ClientMenuError::MenuNotFound)?;

        let mut errors = Vec::new();
        if let Some(predecessor) = predecessor {
            let mut item = self.tree.get(target).cloned().ok_or(ClientMenuError::MenuNotFound)?;
            let args = ["-prev".to_owned(), predecessor.to_owned()];
            errors = apply_options(&mut item, &args, |t| self.search(t, Some(client)).is_some());
            if let Some(slot) = self.tree.get_mut(target) {
                *slot = item;
            }
        }
        self.switch_item(Some(target));
        Ok(errors)
    }

    /// `menu_set_main`: choose what the menu key opens. `""` is the client
    /// menu, `_main_` the server's main menu, anything else a menu inside
    /// the client menu.
    pub fn set_main(&mut self, client: ClientId, id: &str) -> Result<(), ClientMenuError> {
        self.custom_main = match id {
            "" => self.client_menu(client),
            MAIN_MENU_ALIAS => None,
            _ => {
                let menu = self
                    .client_menu(client)
                    .and_then(|top| self.tree.find(top, id, true))
                    .filter(|&m| self.tree.get(m).is_some_and(|i| i.item_type() == ItemType::Menu))
                    .ok_or(ClientMenuError::MenuNotFound)?;
                Some(menu)
            },
        };
        Ok(())
    }

    /// Close the menu.
    pub fn close(&mut self) {
        self.switch_item(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screen::ScreenDefaults;

    const CLIENT: ClientId = ClientId(7);

    fn keys() -> MenuKeys {
        MenuKeys {
            menu: Some("Escape".into()),
            enter: Some("Enter".into()),
            up: Some("Up".into()),
            down: Some("Down".into()),
            left: None,
            right: None,
        }
    }

    fn props() -> DisplayProps {
        DisplayProps { width: 20, height: 4, cell_width: 5, cell_height: 8 }
    }

    fn settings() -> ServerMenuSettings {
        ServerMenuSettings {
            heartbeat: CheckboxValue::Gray,
            backlight: CheckboxValue::On,
            titlespeed: 10,
            drivers: vec![
                DriverControls { name: "text".into(), contrast: None, brightness: None },
                DriverControls { name: "curses".into(), contrast: Some(500), brightness: None },
            ],
        }
    }

    fn system() -> MenuSystem {
        let mut menus = MenuSystem::new(keys(), false);
        menus.install_server_menu(&settings()).unwrap();
        menus
    }

    fn press(menus: &mut MenuSystem, key: &str) {
        menus.handle_key(key, &props()).unwrap();
    }

    fn active_id(menus: &MenuSystem) -> Option<String> {
        menus.active().map(|r| menus.tree().get(r).unwrap().id.clone())
    }

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn keys_map_to_tokens() {
        let keys = keys();
        assert_eq!(keys.token("Enter"), MenuToken::Enter);
        assert_eq!(keys.token("a"), MenuToken::Other);
        assert!(keys.mask().has(MenuToken::Down));
        assert!(!keys.mask().has(MenuToken::Right));
        let reserved: Vec<_> = keys.reservations().collect();
        assert_eq!(reserved[0], ("Escape", true));
        assert_eq!(reserved[1], ("Enter", false));
        assert_eq!(reserved.len(), 4);
    }

    #[test]
    fn server_menu_layout() {
        let menus = system();
        let tree = menus.tree();
        let options = tree.find(tree.root(), "options", false).unwrap();
        assert_eq!(tree.children(options).len(), 4);
        let driver = tree.find(options, "curses", false).unwrap();
        assert_eq!(tree.get(driver).unwrap().menu().unwrap().association, Some(1));
        assert!(tree.find(options, "text", false).is_none());
    }

    #[test]
    fn open_navigate_and_close() {
        let mut menus = system();
        let mut screen = Screen::new(MENU_SCREEN_ID, None, &ScreenDefaults::default());
        screen.priority = Priority::Hidden;

        press(&mut menus, "Escape");
        assert_eq!(active_id(&menus).as_deref(), Some("mainmenu"));
        menus.sync_screen(&mut screen, &props());
        assert_eq!(screen.priority, Priority::Input);
        assert!(screen.find_widget("title").is_some());

        press(&mut menus, "Enter");
        assert_eq!(active_id(&menus).as_deref(), Some("options"));
        let kinds: Vec<_> = menus.take_events().iter().map(|e| (e.id.clone(), e.kind)).collect();
        assert_eq!(
            kinds,
            [
                ("mainmenu".to_owned(), MenuEventKind::Enter),
                ("mainmenu".to_owned(), MenuEventKind::Leave),
                ("options".to_owned(), MenuEventKind::Enter),
            ]
        );

        // heartbeat checkbox cycles gray -> off
        press(&mut menus, "Enter");
        let events = menus.take_events();
        assert_eq!(events[0].id, "heartbeat");
        assert_eq!(events[0].value.as_deref(), Some("off"));
        assert_eq!(events[0].owner, None);

        press(&mut menus, "Escape");
        assert_eq!(active_id(&menus).as_deref(), Some("mainmenu"));
        press(&mut menus, "Escape");
        assert!(!menus.is_open());
        menus.sync_screen(&mut screen, &props());
        assert_eq!(screen.priority, Priority::Hidden);
        assert_eq!(screen.widget_count(), 0);
    }

    #[test]
    fn driver_slider_events_carry_association() {
        let mut menus = system();
        let options = menus.search("options", None).unwrap();
        menus.switch_item(Some(options));
        for _ in 0..3 {
            press(&mut menus, "Down");
        }
        press(&mut menus, "Enter");
        assert_eq!(active_id(&menus).as_deref(), Some("curses"));
        press(&mut menus, "Enter");
        assert_eq!(active_id(&menus).as_deref(), Some("contrast"));
        menus.take_events();

        press(&mut menus, "Up");
        let events = menus.take_events();
        assert_eq!(events[0].kind, MenuEventKind::Plus);
        assert_eq!(events[0].value.as_deref(), Some("525"));
        assert_eq!(events[0].association, Some(1));
    }

    #[test]
    fn client_menu_lifecycle() {
        let mut menus = system();
        assert_eq!(
            menus.add_item(CLIENT, None, "", "a", "action", "A"),
            Err(ClientMenuError::Unnamed)
        );
        menus.add_item(CLIENT, Some("demo"), "", "a", "action", "A").unwrap();
        let client_menu = menus.client_menu(CLIENT).unwrap();
        assert_eq!(menus.tree().get(client_menu).unwrap().text, "demo");

        assert_eq!(
            menus.add_item(CLIENT, Some("demo"), "", "a", "checkbox", ""),
            Err(ClientMenuError::DuplicateId)
        );
        assert_eq!(
            menus.add_item(CLIENT, Some("demo"), "nope", "b", "action", ""),
            Err(ClientMenuError::MenuNotFound)
        );
        assert_eq!(
            menus.add_item(CLIENT, Some("demo"), "", "b", "gizmo", ""),
            Err(ClientMenuError::InvalidType)
        );

        assert_eq!(menus.remove_item(ClientId(9), "a"), Err(ClientMenuError::NoMenu));
        assert_eq!(menus.remove_item(CLIENT, "zz"), Err(ClientMenuError::ItemNotFound));
        menus.remove_item(CLIENT, "a").unwrap();
        assert!(menus.client_menu(CLIENT).is_none());
        assert!(!menus.tree().contains(client_menu));
    }

    #[test]
    fn removing_the_active_item_moves_up() {
        let mut menus = system();
        menus.add_item(CLIENT, Some("demo"), "", "sub", "menu", "Sub").unwrap();
        menus.add_item(CLIENT, Some("demo"), "sub", "n", "numeric", "N").unwrap();
        menus.add_item(CLIENT, Some("demo"), "", "keep", "action", "Keep").unwrap();
        menus.goto(CLIENT, "n", None).unwrap();
        assert_eq!(active_id(&menus).as_deref(), Some("n"));

        menus.remove_item(CLIENT, "sub").unwrap();
        assert_eq!(active_id(&menus).as_deref(), Some(CLIENT_MENU_ID));

        menus.remove_client(CLIENT);
        assert_eq!(active_id(&menus).as_deref(), Some("mainmenu"));
    }

    #[test]
    fn client_events_and_successor_links() {
        let mut menus = system();
        menus.add_item(CLIENT, Some("demo"), "", "num", "numeric", "Num").unwrap();
        menus.add_item(CLIENT, Some("demo"), "", "jump", "action", "Jump").unwrap();
        assert!(menus.set_item(CLIENT, "jump", &args(&["-next", "num"])).unwrap().is_empty());

        menus.goto(CLIENT, "", None).unwrap();
        press(&mut menus, "Down");
        menus.take_events();
        press(&mut menus, "Enter");
        assert_eq!(active_id(&menus).as_deref(), Some("num"));

        let events = menus.take_events();
        let select = &events[0];
        assert_eq!((select.owner, select.id.as_str(), select.kind), (Some(CLIENT), "jump", MenuEventKind::Select));
        assert!(events.iter().any(|e| e.id == "num" && e.kind == MenuEventKind::Enter));

        // numeric entry returns to the menu with "num" selected
        press(&mut menus, "Escape");
        assert_eq!(active_id(&menus).as_deref(), Some(CLIENT_MENU_ID));
        let menu = menus.active().unwrap();
        assert_eq!(menus.tree().subitem(menu), menus.search("num", Some(CLIENT)));
    }

    #[test]
    fn goto_reports_bad_predecessor() {
        let mut menus = system();
        menus.add_item(CLIENT, Some("demo"), "", "a", "alpha", "A").unwrap();
        assert_eq!(menus.goto(CLIENT, "x", None), Err(ClientMenuError::MenuNotFound));
        let errors = menus.goto(CLIENT, "a", Some("missing")).unwrap();
        assert_eq!(errors[0].to_string(), "Cannot find predecessor 'missing' for item 'a'");
        assert_eq!(active_id(&menus).as_deref(), Some("a"));
    }

    #[test]
    fn custom_main_menu() {
        let mut menus = system();
        menus.add_item(CLIENT, Some("demo"), "", "a", "action", "A").unwrap();
        assert_eq!(menus.set_main(CLIENT, "a"), Err(ClientMenuError::MenuNotFound));
        menus.set_main(CLIENT, "").unwrap();

        press(&mut menus, "Escape");
        assert_eq!(active_id(&menus).as_deref(), Some(CLIENT_MENU_ID));
        press(&mut menus, "Escape");
        assert!(!menus.is_open());

        menus.remove_client(CLIENT);
        assert_eq!(menus.main(), menus.tree().root());
    }

    #[test]
    fn other_clients_items_are_out_of_reach() {
        let mut menus = system();
        menus.add_item(CLIENT, Some("demo"), "", "mine", "action", "").unwrap();
        menus.add_item(ClientId(8), Some("other"), "", "theirs", "action", "").unwrap();
        assert!(menus.search("theirs", Some(CLIENT)).is_none());
        assert!(menus.search("options", Some(CLIENT)).is_none());

        let mut permissive = MenuSystem::new(keys(), true);
        permissive.add_item(CLIENT, Some("demo"), "", "mine", "action", "").unwrap();
        assert!(permissive.search("mainmenu", Some(CLIENT)).is_some());
    }
}
