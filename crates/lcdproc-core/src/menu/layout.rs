//! Widgets of the menu screen.
//!
//! The menu screen is rebuilt from scratch whenever the active item or its
//! state changes: a menu becomes a title plus one row per visible entry,
//! the editors get a label, their value field and an error line.

use super::{
    item::{CheckboxValue, ItemKind, ItemRef, MenuItem},
    tree::MenuTree,
};
use crate::{
    driver::DisplayProps,
    icon::Icon,
    screen::{Cursor, Screen},
    widget::{Widget, WidgetData},
};

/// How [`fill_labeled_value`] abbreviates when label and value do not fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Abbreviation {
    /// Label only
    LabelOnly,
    /// Value only, indented by one
    ValueOnly,
    /// Label and the beginning of the value
    LabelValue,
    /// Label and the end of the value
    LabelValueTail,
}

fn prefix(text: &str, len: i32) -> String {
    text.chars().take(usize::try_from(len).unwrap_or(0)).collect()
}

/// Compose `label  value` in a field of `len - 1` characters: the value is
/// right aligned when both fit, otherwise abbreviated per `mode`.
pub fn fill_labeled_value(len: i32, text: &str, value: Option<&str>, mode: Abbreviation) -> String {
    let len = len - 1;
    if len < 0 {
        return String::new();
    }
    let text_len = text.chars().count() as i32;

    if let Some(value) = value {
        let value_len = value.chars().count() as i32;
        if text_len + value_len < len - 1 {
            let pad = (len - value_len) as usize;
            return format!("{text:<pad$}{value}");
        }
    }

    let mode = match value {
        Some(_) if text_len < len - 3 => mode,
        _ => Abbreviation::LabelOnly,
    };
    let value = value.unwrap_or_default();
    match mode {
        Abbreviation::LabelValue => {
            format!("{text}  {}..", prefix(value, len - text_len - 4))
        },
        Abbreviation::LabelValueTail => {
            let keep = usize::try_from(len - text_len - 4).unwrap_or(0);
            let skip = value.chars().count().saturating_sub(keep);
            let tail: String = value.chars().skip(skip).collect();
            format!("{text}  ..{tail}")
        },
        Abbreviation::ValueOnly => format!(" {}", prefix(value, len - 1)),
        Abbreviation::LabelOnly => prefix(text, len),
    }
}

/// Replace the widgets of `screen` with the layout of `active`. Nothing is
/// drawn when no item is active.
pub fn build_screen(
    tree: &MenuTree,
    active: Option<ItemRef>,
    screen: &mut Screen,
    props: &DisplayProps,
) {
    screen.clear_widgets();
    screen.cursor = Cursor::Off;
    let Some(item) = active.and_then(|r| tree.get(r)) else {
        return;
    };

    let widgets = match &item.kind {
        ItemKind::Menu(_) => active.map(|r| menu_widgets(tree, r, props)).unwrap_or_default(),
        ItemKind::Slider(_) => slider_widgets(item, props),
        ItemKind::Numeric(_) | ItemKind::Alpha(_) | ItemKind::Ip(_) => {
            editor_widgets(item, screen, props)
        },
        ItemKind::Action | ItemKind::Checkbox { .. } | ItemKind::Ring { .. } => Vec::new(),
    };
    for widget in widgets {
        // ids are unique by construction
        let _ = screen.add_widget(widget);
    }
}

fn visible_row(y: i32, props: &DisplayProps) -> bool {
    y > 0 && y <= props.height
}

fn menu_widgets(tree: &MenuTree, menu_ref: ItemRef, props: &DisplayProps) -> Vec<Widget> {
    let Some(menu_item) = tree.get(menu_ref) else {
        return Vec::new();
    };
    let Some(menu) = menu_item.menu() else {
        return Vec::new();
    };
    let scroll = menu.scroll as i32;
    let width = props.width;
    let mut widgets = Vec::new();

    let title_y = 1 - scroll;
    if visible_row(title_y, props) {
        widgets.push(Widget {
            id: "title".into(),
            data: WidgetData::Title { x: 1, y: title_y, text: Some(menu_item.text.clone()) },
        });
    }

    let mut hidden = 0;
    for (number, &child) in tree.children(menu_ref).iter().enumerate() {
        let Some(sub) = tree.get(child) else { continue };
        if sub.hidden {
            hidden += 1;
            continue;
        }
        let y = 2 + number as i32 - hidden - scroll;
        if !visible_row(y, props) {
            continue;
        }
        widgets.push(Widget::string(format!("text{number}"), 2, y, entry_text(sub, width)));
        if let ItemKind::Checkbox { value, .. } = sub.kind {
            let icon = match value {
                CheckboxValue::Off => Icon::CheckboxOff,
                CheckboxValue::On => Icon::CheckboxOn,
                CheckboxValue::Gray => Icon::CheckboxGray,
            };
            widgets.push(Widget::icon(format!("icon{number}"), width - 1, y, icon));
        }
    }

    let selector_y = 2 + menu.selector as i32 - scroll;
    widgets.push(Widget::icon("selector", 1, selector_y, Icon::SelectorAtLeft));
    if scroll > 0 {
        widgets.push(Widget::icon("upscroller", width, 1, Icon::ArrowUp));
    }
    let visible = tree.visible_children(menu_ref).len() as i32;
    if visible >= scroll + props.height {
        widgets.push(Widget::icon("downscroller", width, props.height, Icon::ArrowDown));
    }
    widgets
}

/// Row text of one menu entry.
fn entry_text(sub: &MenuItem, width: i32) -> String {
    let len = width - 1;
    let text = sub.text.as_str();
    match &sub.kind {
        ItemKind::Checkbox { .. } => prefix(text, width - 2),
        ItemKind::Menu(_) => {
            let row = format!("{text} >");
            if text.chars().count() as i32 >= len { prefix(&row, len) } else { row }
        },
        ItemKind::Action => prefix(text, len),
        ItemKind::Ring { strings, value } => {
            let current = strings.get(*value).map(String::as_str);
            fill_labeled_value(len, text, current, Abbreviation::ValueOnly)
        },
        ItemKind::Slider(slider) => {
            let value = prefix(&slider.value.to_string(), width - 1);
            fill_labeled_value(len, text, Some(&value), Abbreviation::LabelValue)
        },
        ItemKind::Numeric(numeric) => {
            let value = prefix(&numeric.value.to_string(), width - 1);
            fill_labeled_value(len, text, Some(&value), Abbreviation::LabelValue)
        },
        ItemKind::Alpha(alpha) => {
            fill_labeled_value(len, text, Some(&alpha.value), Abbreviation::LabelValue)
        },
        ItemKind::Ip(ip) => fill_labeled_value(len, text, Some(&ip.value), Abbreviation::LabelValueTail),
    }
}

fn slider_widgets(item: &MenuItem, props: &DisplayProps) -> Vec<Widget> {
    let ItemKind::Slider(slider) = &item.kind else {
        return Vec::new();
    };
    let (width, height) = (props.width, props.height);
    let min_len = slider.mintext.chars().count() as i32;
    let max_len = slider.maxtext.chars().count() as i32;
    let mut widgets = Vec::new();

    if height >= 2 {
        widgets.push(Widget::string("text", 1, 1, item.text.clone()));
    }

    let (bar_x, bar_y, bar_width) = if height > 2 {
        (2, height / 2 + 1, width - 2)
    } else {
        (1 + min_len, height, width - min_len - max_len)
    };
    let range = slider.max - slider.min;
    let length = if range == 0 {
        0
    } else {
        bar_width * props.cell_width * (slider.value - slider.min) / range
    };
    widgets.push(Widget { id: "bar".into(), data: WidgetData::HBar { x: bar_x, y: bar_y, length } });

    let label_y = if height > 2 { height / 2 + 2 } else { height / 2 + 1 };
    widgets.push(Widget::string("min", 1, label_y, slider.mintext.clone()));
    widgets.push(Widget::string("max", 1 + width - max_len, label_y, slider.maxtext.clone()));
    widgets
}

fn editor_widgets(item: &MenuItem, screen: &mut Screen, props: &DisplayProps) -> Vec<Widget> {
    let (shown, edit) = match &item.kind {
        ItemKind::Numeric(numeric) => (numeric.edit.text_from(numeric.edit.offs), &numeric.edit),
        ItemKind::Alpha(alpha) => {
            let shown = match alpha.password_char {
                Some(mask) => {
                    let count = alpha.edit.len().saturating_sub(alpha.edit.offs);
                    std::iter::repeat_n(mask, count).collect()
                },
                None => alpha.edit.text_from(alpha.edit.offs),
            };
            (shown, &alpha.edit)
        },
        ItemKind::Ip(ip) => (ip.edit.text_from(ip.edit.offs), &ip.edit),
        _ => return Vec::new(),
    };

    let height = props.height;
    let mut widgets = Vec::new();
    if height >= 2 {
        widgets.push(Widget::string("text", 1, 1, item.text.clone()));
    }
    let value_y = height / 2 + 1;
    widgets.push(Widget::string("value", 2, value_y, shown));
    if height > 2 {
        widgets.push(Widget::string("error", 1, height, edit.error.message()));
    }

    screen.cursor = Cursor::On;
    screen.cursor_x = 2 + edit.pos as i32 - edit.offs as i32;
    screen.cursor_y = value_y;
    widgets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        menu::item::{ItemType, SliderData},
        screen::ScreenDefaults,
    };

    fn props() -> DisplayProps {
        DisplayProps { width: 20, height: 4, cell_width: 5, cell_height: 8 }
    }

    fn text_of(screen: &Screen, id: &str) -> Option<String> {
        match &screen.find_widget(id)?.data {
            WidgetData::String { text, .. } => text.clone(),
            _ => None,
        }
    }

    #[test]
    fn label_and_value_fit() {
        let row = fill_labeled_value(19, "Speed", Some("10"), Abbreviation::LabelValue);
        assert_eq!(row, "Speed           10");
        assert_eq!(row.len(), 18);
    }

    #[test]
    fn long_values_are_abbreviated() {
        let value = "abcdefghijklmnopqrstuvwxyz";
        let head = fill_labeled_value(19, "Name", Some(value), Abbreviation::LabelValue);
        assert_eq!(head, "Name  abcdefghij..");
        let tail = fill_labeled_value(19, "Name", Some(value), Abbreviation::LabelValueTail);
        assert_eq!(tail, "Name  ..qrstuvwxyz");
        let only = fill_labeled_value(19, "Name", Some(value), Abbreviation::ValueOnly);
        assert_eq!(only, " abcdefghijklmnopq");
    }

    #[test]
    fn long_label_wins() {
        let row = fill_labeled_value(10, "A very long label", Some("1"), Abbreviation::LabelValue);
        assert_eq!(row, "A very lo");
        assert_eq!(fill_labeled_value(10, "Label", None, Abbreviation::LabelValue), "Label");
    }

    #[test]
    fn menu_rows_skip_hidden_entries() {
        let root = MenuItem::with_defaults("main", ItemType::Menu, "Main", None);
        let mut tree = MenuTree::new(root);
        let root = tree.root();
        let hidden = MenuItem { hidden: true, ..MenuItem::with_defaults("h", ItemType::Action, "Hidden", None) };
        tree.insert(root, hidden).unwrap();
        tree.insert(root, MenuItem::with_defaults("cb", ItemType::Checkbox, "Check", None)).unwrap();
        tree.insert(root, MenuItem::with_defaults("sub", ItemType::Menu, "Sub", None)).unwrap();

        let mut screen = Screen::new("_menu_screen", None, &ScreenDefaults::default());
        build_screen(&tree, Some(root), &mut screen, &props());

        assert!(screen.find_widget("text0").is_none());
        assert_eq!(text_of(&screen, "text1").as_deref(), Some("Check"));
        assert_eq!(text_of(&screen, "text2").as_deref(), Some("Sub >"));
        let icon = screen.find_widget("icon1").map(|w| w.data.clone());
        assert_eq!(icon, Some(WidgetData::Icon { x: 19, y: 2, icon: Some(Icon::CheckboxOff) }));
        assert!(screen.find_widget("upscroller").is_none());
        assert!(screen.find_widget("downscroller").is_none());
    }

    #[test]
    fn slider_bar_scales_with_value() {
        let item = MenuItem::new(
            "s",
            "Level",
            None,
            ItemKind::Slider(SliderData {
                mintext: "lo".into(),
                maxtext: "hi".into(),
                min: 0,
                max: 10,
                step: 1,
                value: 5,
            }),
        );
        let mut tree = MenuTree::new(MenuItem::with_defaults("main", ItemType::Menu, "", None));
        let slider = tree.insert(tree.root(), item).unwrap();
        let mut screen = Screen::new("_menu_screen", None, &ScreenDefaults::default());
        build_screen(&tree, Some(slider), &mut screen, &props());

        let bar = screen.find_widget("bar").map(|w| w.data.clone());
        assert_eq!(bar, Some(WidgetData::HBar { x: 2, y: 3, length: 45 }));
        let max = screen.find_widget("max").map(|w| w.data.clone());
        assert_eq!(max, Some(WidgetData::String { x: 19, y: 4, text: Some("hi".into()) }));
    }

    #[test]
    fn editor_places_cursor() {
        let mut item = MenuItem::with_defaults("a", ItemType::Alpha, "Name", None);
        if let ItemKind::Alpha(alpha) = &mut item.kind {
            alpha.value = "SECRET".into();
            alpha.password_char = Some('*');
        }
        item.reset();
        if let ItemKind::Alpha(alpha) = &mut item.kind {
            alpha.edit.pos = 3;
        }
        let mut tree = MenuTree::new(MenuItem::with_defaults("main", ItemType::Menu, "", None));
        let alpha = tree.insert(tree.root(), item).unwrap();
        let mut screen = Screen::new("_menu_screen", None, &ScreenDefaults::default());
        build_screen(&tree, Some(alpha), &mut screen, &props());

        assert_eq!(text_of(&screen, "value").as_deref(), Some("******"));
        assert_eq!(text_of(&screen, "error").as_deref(), Some(""));
        assert_eq!((screen.cursor, screen.cursor_x, screen.cursor_y), (Cursor::On, 5, 3));
    }
}
