//! Arena of menu items.
//!
//! Items are addressed by [`ItemRef`]; a menu lists its children by handle
//! and every item knows its parent, so removal and ancestry checks never
//! chase dangling pointers.

use std::collections::BTreeMap;

use super::{
    input::{process_editor, MenuEventKind},
    item::{ItemKind, ItemRef, ItemType, KeyMask, MenuItem, MenuResult, MenuToken},
};
use crate::error::ItemError;

/// Result of feeding a token to an item of the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeInput {
    /// Navigation outcome
    pub result: MenuResult,
    /// Event to report and the item it concerns
    pub event: Option<(ItemRef, MenuEventKind)>,
}

impl TreeInput {
    fn quiet(result: MenuResult) -> Self {
        Self { result, event: None }
    }

    fn event(result: MenuResult, item: ItemRef, kind: MenuEventKind) -> Self {
        Self { result, event: Some((item, kind)) }
    }
}

/// The menu tree, rooted at the server's main menu.
#[derive(Debug, Clone)]
pub struct MenuTree {
    items: BTreeMap<ItemRef, MenuItem>,
    next_ref: u64,
    root: ItemRef,
}

impl MenuTree {
    /// Tree holding only `root`.
    pub fn new(root: MenuItem) -> Self {
        let root_ref = ItemRef(0);
        let mut items = BTreeMap::new();
        items.insert(root_ref, MenuItem { parent: None, ..root });
        Self { items, next_ref: 1, root: root_ref }
    }

    /// The root menu.
    pub fn root(&self) -> ItemRef {
        self.root
    }

    /// Item behind a handle.
    pub fn get(&self, item: ItemRef) -> Option<&MenuItem> {
        self.items.get(&item)
    }

    /// Item behind a handle, for modification.
    pub fn get_mut(&mut self, item: ItemRef) -> Option<&mut MenuItem> {
        self.items.get_mut(&item)
    }

    /// Whether the handle refers to a live item.
    pub fn contains(&self, item: ItemRef) -> bool {
        self.items.contains_key(&item)
    }

    /// Number of live items, root included.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Always false: the root cannot be removed.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// All live items.
    pub fn iter(&self) -> impl Iterator<Item = (ItemRef, &MenuItem)> {
        self.items.iter().map(|(r, item)| (*r, item))
    }

    /// Append `item` to the menu `parent`.
    pub fn insert(&mut self, parent: ItemRef, item: MenuItem) -> Result<ItemRef, ItemError> {
        let parent_item = self.items.get_mut(&parent).ok_or(ItemError::Unknown)?;
        let parent_id = parent_item.id.clone();
        let menu = parent_item.menu_mut().ok_or(ItemError::NotAMenu { id: parent_id })?;

        let handle = ItemRef(self.next_ref);
        self.next_ref += 1;
        menu.children.push(handle);
        self.items.insert(handle, MenuItem { parent: Some(parent), ..item });
        Ok(handle)
    }

    /// Detach `item` from its parent and drop it with all its descendants.
    /// Returns the detached item. The root cannot be removed.
    pub fn remove(&mut self, item: ItemRef) -> Option<MenuItem> {
        if item == self.root {
            return None;
        }
        let parent = self.items.get(&item)?.parent;
        // The selector counts visible entries only
        let visible_index = parent.and_then(|p| self.visible_children(p).iter().position(|&c| c == item));
        if let Some(menu) = parent.and_then(|p| self.items.get_mut(&p)).and_then(MenuItem::menu_mut) {
            menu.children.retain(|&c| c != item);
            if let Some(index) = visible_index
                && menu.selector >= index
            {
                menu.selector = menu.selector.saturating_sub(1);
                menu.scroll = menu.scroll.saturating_sub(1);
            }
        }

        let mut stack = vec![item];
        let mut detached = None;
        while let Some(next) = stack.pop() {
            if let Some(removed) = self.items.remove(&next) {
                if let Some(menu) = removed.menu() {
                    stack.extend(menu.children.iter().copied());
                }
                if next == item {
                    detached = Some(removed);
                }
            }
        }
        detached
    }

    /// Children of a menu, hidden ones included. Empty for non-menus.
    pub fn children(&self, menu: ItemRef) -> &[ItemRef] {
        self.get(menu).and_then(MenuItem::menu).map_or(&[], |m| m.children.as_slice())
    }

    /// Children of a menu that are not hidden.
    pub fn visible_children(&self, menu: ItemRef) -> Vec<ItemRef> {
        self.children(menu)
            .iter()
            .copied()
            .filter(|c| self.get(*c).is_some_and(|item| !item.hidden))
            .collect()
    }

    /// The selected visible child of a menu.
    pub fn subitem(&self, menu: ItemRef) -> Option<ItemRef> {
        let selector = self.get(menu)?.menu()?.selector;
        self.visible_children(menu).get(selector).copied()
    }

    /// Select the visible child with `id`. Hidden or unknown ids are
    /// ignored.
    pub fn select(&mut self, menu: ItemRef, id: &str) {
        let Some(index) = self
            .visible_children(menu)
            .iter()
            .position(|c| self.get(*c).is_some_and(|item| item.id == id))
        else {
            return;
        };
        if let Some(data) = self.get_mut(menu).and_then(MenuItem::menu_mut) {
            data.selector = index;
            data.scroll = index;
        }
    }

    /// Find `id` starting at `top` (which is checked itself), optionally
    /// descending into submenus.
    pub fn find(&self, top: ItemRef, id: &str, recursive: bool) -> Option<ItemRef> {
        let item = self.get(top)?;
        if item.id == id {
            return Some(top);
        }
        for &child in self.children(top) {
            let Some(child_item) = self.get(child) else { continue };
            if child_item.id == id {
                return Some(child);
            }
            if recursive
                && child_item.item_type() == ItemType::Menu
                && let Some(found) = self.find(child, id, true)
            {
                return Some(found);
            }
        }
        None
    }

    /// Parent of an item.
    pub fn parent(&self, item: ItemRef) -> Option<ItemRef> {
        self.get(item)?.parent
    }

    /// The item itself followed by its ancestors up to the root.
    pub fn ancestry(&self, item: ItemRef) -> impl Iterator<Item = ItemRef> + '_ {
        std::iter::successors(self.contains(item).then_some(item), |r| self.parent(*r))
    }

    /// Whether `item` is `ancestor` or lies below it.
    pub fn is_within(&self, item: ItemRef, ancestor: ItemRef) -> bool {
        self.ancestry(item).any(|r| r == ancestor)
    }

    /// Item whose predecessor link applies when MENU is pressed in `menu`:
    /// an inline entry with its own predecessor, otherwise the menu.
    pub fn predecessor_source(&self, menu: ItemRef) -> ItemRef {
        self.subitem(menu)
            .filter(|&sub| {
                self.get(sub)
                    .is_some_and(|item| item.item_type().is_inline() && item.predecessor.is_some())
            })
            .unwrap_or(menu)
    }

    /// Item whose successor link applies when ENTER is pressed in `menu`:
    /// an inline entry, otherwise the menu.
    pub fn successor_source(&self, menu: ItemRef) -> ItemRef {
        self.subitem(menu)
            .filter(|&sub| self.get(sub).is_some_and(|item| item.item_type().is_inline()))
            .unwrap_or(menu)
    }

    /// Feed a token to the active item. `width` and `height` are the
    /// display size in characters.
    pub fn process_input(
        &mut self,
        active: ItemRef,
        token: MenuToken,
        key: &str,
        mask: KeyMask,
        (width, height): (usize, usize),
    ) -> TreeInput {
        let Some(item) = self.get_mut(active) else {
            return TreeInput::quiet(MenuResult::Error);
        };
        if item.item_type() == ItemType::Menu {
            return self.menu_input(active, token, mask, height);
        }
        let reaction = process_editor(item, token, key, mask, width);
        TreeInput { result: reaction.result, event: reaction.event.map(|kind| (active, kind)) }
    }

    fn menu_input(
        &mut self,
        menu: ItemRef,
        token: MenuToken,
        mask: KeyMask,
        height: usize,
    ) -> TreeInput {
        let sub = self.subitem(menu);
        match token {
            MenuToken::Menu => {
                let source = self.predecessor_source(menu);
                let link = self.get(source).and_then(|item| item.predecessor.as_ref());
                TreeInput::quiet(MenuResult::for_predecessor(link, MenuResult::Close))
            },
            MenuToken::Enter => {
                let Some(sub) = sub else {
                    return TreeInput::quiet(MenuResult::Error);
                };
                let Some(item) = self.get_mut(sub) else {
                    return TreeInput::quiet(MenuResult::Error);
                };
                let stay = |item: &MenuItem| {
                    MenuResult::for_successor(item.successor.as_ref(), MenuResult::None)
                };
                match &mut item.kind {
                    ItemKind::Action => TreeInput::event(stay(item), sub, MenuEventKind::Select),
                    ItemKind::Checkbox { value, allow_gray } => {
                        *value = value.next(*allow_gray);
                        TreeInput::event(stay(item), sub, MenuEventKind::Update)
                    },
                    ItemKind::Ring { strings, value } => {
                        *value = (*value + 1) % strings.len().max(1);
                        TreeInput::event(stay(item), sub, MenuEventKind::Update)
                    },
                    _ => TreeInput::quiet(MenuResult::Enter),
                }
            },
            MenuToken::Up | MenuToken::Down => {
                let count = self.visible_children(menu).len();
                if let Some(data) = self.get_mut(menu).and_then(MenuItem::menu_mut) {
                    if token == MenuToken::Up {
                        if data.selector > 0 {
                            if data.selector < data.scroll {
                                data.scroll -= 1;
                            }
                            data.selector -= 1;
                        } else if count > 0 {
                            data.selector = count - 1;
                            data.scroll =
                                if count >= height { (data.selector + 2).saturating_sub(height) } else { 0 };
                        }
                    } else if data.selector + 1 < count {
                        data.selector += 1;
                        if data.selector + 2 > data.scroll + height {
                            data.scroll += 1;
                        }
                    } else {
                        data.selector = 0;
                        data.scroll = 0;
                    }
                }
                TreeInput::quiet(MenuResult::None)
            },
            MenuToken::Left | MenuToken::Right => {
                if !mask.has(token) {
                    return TreeInput::quiet(MenuResult::None);
                }
                let Some(sub) = sub else {
                    return TreeInput::quiet(MenuResult::Error);
                };
                let Some(item) = self.get_mut(sub) else {
                    return TreeInput::quiet(MenuResult::Error);
                };
                let forward = token == MenuToken::Right;
                match &mut item.kind {
                    ItemKind::Checkbox { value, allow_gray } => {
                        *value = if forward { value.next(*allow_gray) } else { value.prev(*allow_gray) };
                        TreeInput::event(MenuResult::None, sub, MenuEventKind::Update)
                    },
                    ItemKind::Ring { strings, value } => {
                        let len = strings.len().max(1);
                        *value = if forward { (*value + 1) % len } else { (*value + len - 1) % len };
                        TreeInput::event(MenuResult::None, sub, MenuEventKind::Update)
                    },
                    ItemKind::Menu(_) if forward => TreeInput::quiet(MenuResult::Enter),
                    _ => TreeInput::quiet(MenuResult::None),
                }
            },
            MenuToken::Other => TreeInput::quiet(MenuResult::None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::item::{CheckboxValue, ItemType, NavTarget};

    const KEYS: KeyMask = KeyMask(0x3f);
    const SIZE: (usize, usize) = (20, 4);

    fn tree_with(children: &[(&str, ItemType)]) -> (MenuTree, Vec<ItemRef>) {
        let root = MenuItem::with_defaults("main", ItemType::Menu, "Main", None);
        let mut tree = MenuTree::new(root);
        let refs = children
            .iter()
            .map(|(id, ty)| {
                let item = MenuItem::with_defaults(*id, *ty, id.to_uppercase(), None);
                tree.insert(tree.root(), item).unwrap()
            })
            .collect();
        (tree, refs)
    }

    fn press(tree: &mut MenuTree, token: MenuToken) -> TreeInput {
        let root = tree.root();
        tree.process_input(root, token, "", KEYS, SIZE)
    }

    fn selector(tree: &MenuTree) -> (usize, usize) {
        let menu = tree.get(tree.root()).and_then(MenuItem::menu).unwrap();
        (menu.selector, menu.scroll)
    }

    #[test]
    fn insert_rejects_non_menu_parent() {
        let (mut tree, refs) = tree_with(&[("a", ItemType::Action)]);
        let child = MenuItem::with_defaults("b", ItemType::Action, "B", None);
        assert_eq!(tree.insert(refs[0], child), Err(ItemError::NotAMenu { id: "a".into() }));
    }

    #[test]
    fn remove_drops_subtree() {
        let (mut tree, refs) = tree_with(&[("sub", ItemType::Menu), ("x", ItemType::Action)]);
        let leaf = tree.insert(refs[0], MenuItem::with_defaults("leaf", ItemType::Alpha, "", None));
        let leaf = leaf.unwrap();

        let removed = tree.remove(refs[0]).unwrap();
        assert_eq!(removed.id, "sub");
        assert!(!tree.contains(leaf));
        assert_eq!(tree.children(tree.root()), &[refs[1]]);
        assert!(tree.remove(tree.root()).is_none());
    }

    #[test]
    fn removing_selected_entry_moves_selector_back() {
        let (mut tree, refs) = tree_with(&[("a", ItemType::Action), ("b", ItemType::Action)]);
        press(&mut tree, MenuToken::Down);
        assert_eq!(selector(&tree), (1, 0));
        tree.remove(refs[1]);
        assert_eq!(selector(&tree), (0, 0));
        tree.remove(refs[0]);
        assert_eq!(selector(&tree), (0, 0));
    }

    #[test]
    fn removing_selected_entry_after_hidden_one() {
        let entries = [("a", ItemType::Action), ("b", ItemType::Action), ("c", ItemType::Action), ("d", ItemType::Action)];
        let (mut tree, refs) = tree_with(&entries);
        tree.get_mut(refs[0]).unwrap().hidden = true;
        // visible entries are b, c, d; select c
        press(&mut tree, MenuToken::Down);
        assert_eq!(tree.subitem(tree.root()), Some(refs[2]));

        tree.remove(refs[2]);
        assert_eq!(selector(&tree).0, 0);
        assert_eq!(tree.subitem(tree.root()), Some(refs[1]));
    }

    #[test]
    fn removing_hidden_entry_leaves_selector() {
        let (mut tree, refs) = tree_with(&[("a", ItemType::Action), ("b", ItemType::Action), ("c", ItemType::Action)]);
        press(&mut tree, MenuToken::Down);
        tree.get_mut(refs[0]).unwrap().hidden = true;
        tree.remove(refs[0]);
        assert_eq!(tree.subitem(tree.root()), Some(refs[2]));
    }

    #[test]
    fn find_checks_top_and_descends() {
        let (mut tree, refs) = tree_with(&[("sub", ItemType::Menu)]);
        let deep = tree.insert(refs[0], MenuItem::with_defaults("deep", ItemType::Ring, "", None));
        let root = tree.root();
        assert_eq!(tree.find(root, "main", false), Some(root));
        assert_eq!(tree.find(root, "deep", false), None);
        assert_eq!(tree.find(root, "deep", true), deep.ok());
    }

    #[test]
    fn navigation_wraps_and_scrolls() {
        let ids = ["a", "b", "c", "d", "e"];
        let children: Vec<_> = ids.iter().map(|id| (*id, ItemType::Action)).collect();
        let (mut tree, _) = tree_with(&children);

        press(&mut tree, MenuToken::Up);
        // wrapped to the last of five entries on a four row display
        assert_eq!(selector(&tree), (4, 2));
        press(&mut tree, MenuToken::Down);
        assert_eq!(selector(&tree), (0, 0));
        press(&mut tree, MenuToken::Down);
        press(&mut tree, MenuToken::Down);
        press(&mut tree, MenuToken::Down);
        assert_eq!(selector(&tree), (3, 1));
    }

    #[test]
    fn hidden_entries_are_skipped() {
        let (mut tree, refs) = tree_with(&[("a", ItemType::Action), ("b", ItemType::Action)]);
        tree.get_mut(refs[0]).unwrap().hidden = true;
        assert_eq!(tree.subitem(tree.root()), Some(refs[1]));
        tree.select(tree.root(), "a");
        assert_eq!(selector(&tree), (0, 0));
    }

    #[test]
    fn enter_on_action_selects() {
        let (mut tree, refs) = tree_with(&[("go", ItemType::Action)]);
        let input = press(&mut tree, MenuToken::Enter);
        assert_eq!(input.result, MenuResult::None);
        assert_eq!(input.event, Some((refs[0], MenuEventKind::Select)));
    }

    #[test]
    fn enter_toggles_checkbox_in_place() {
        let (mut tree, refs) = tree_with(&[("cb", ItemType::Checkbox)]);
        let input = press(&mut tree, MenuToken::Enter);
        assert_eq!(input.event, Some((refs[0], MenuEventKind::Update)));
        let ItemKind::Checkbox { value, .. } = tree.get(refs[0]).unwrap().kind else {
            unreachable!()
        };
        assert_eq!(value, CheckboxValue::On);
    }

    #[test]
    fn enter_descends_into_editors() {
        let (mut tree, _) = tree_with(&[("n", ItemType::Numeric)]);
        assert_eq!(press(&mut tree, MenuToken::Enter), TreeInput::quiet(MenuResult::Enter));
        let (mut empty, _) = tree_with(&[]);
        assert_eq!(press(&mut empty, MenuToken::Enter).result, MenuResult::Error);
    }

    #[test]
    fn left_right_cycle_ring_when_configured() {
        let (mut tree, refs) = tree_with(&[("r", ItemType::Ring)]);
        if let ItemKind::Ring { strings, .. } = &mut tree.get_mut(refs[0]).unwrap().kind {
            *strings = vec!["x".into(), "y".into(), "z".into()];
        }
        press(&mut tree, MenuToken::Left);
        let ItemKind::Ring { value, .. } = tree.get(refs[0]).unwrap().kind else { unreachable!() };
        assert_eq!(value, 2);

        let root = tree.root();
        let without_left = tree.process_input(root, MenuToken::Left, "", KeyMask(0x0f), SIZE);
        assert_eq!(without_left, TreeInput::quiet(MenuResult::None));
    }

    #[test]
    fn menu_key_follows_inline_predecessor() {
        let (mut tree, refs) = tree_with(&[("a", ItemType::Action)]);
        assert_eq!(press(&mut tree, MenuToken::Menu).result, MenuResult::Close);
        tree.get_mut(refs[0]).unwrap().predecessor = Some(NavTarget::Quit);
        assert_eq!(press(&mut tree, MenuToken::Menu).result, MenuResult::Quit);
        assert_eq!(tree.predecessor_source(tree.root()), refs[0]);
    }
}
