//! Widget commands.

use lcdproc_core::{ClientId, Icon, Screen, ScrollDirection, Widget, WidgetData, WidgetKind};

use super::{CommandError, atoi, huh, option_name, require_active, starts_with_digit, success};
use crate::state::ServerState;

/// `widget_add <screenid> <widgetid> <widgettype> [-in <frameid>]`
pub(super) fn widget_add(state: &mut ServerState, client: ClientId, args: &[String]) -> Result<(), CommandError> {
    require_active(state, client, args)?;
    if !(4..=6).contains(&args.len()) {
        huh(state, client, "Usage: widget_add <screenid> <widgetid> <widgettype> [-in <id>]");
        return Ok(());
    }
    let (screen_id, widget_id) = (&args[1], &args[2]);

    let Some(screen) = state.screens.find(Some(client), screen_id).and_then(|key| state.screens.get_mut(key))
    else {
        huh(state, client, "Invalid screen id");
        return Ok(());
    };
    let Some(kind) = WidgetKind::from_name(&args[3]) else {
        huh(state, client, "Invalid widget type");
        return Ok(());
    };
    let frame = if args.get(4).is_some_and(|flag| option_name(flag) == "in") {
        let Some(frame_id) = args.get(5) else {
            huh(state, client, "Specify a frame to place widget in");
            return Ok(());
        };
        Some(frame_id.as_str())
    } else {
        None
    };

    match add_widget(screen, frame, Widget::new(widget_id.as_str(), kind, Some(client))) {
        Ok(()) => success(state, client),
        Err(message) => huh(state, client, message),
    }
    Ok(())
}

/// Add `widget` to the screen, or to the nested screen of the frame with
/// id `frame`. Ids are unique across the screen and all of its frames.
fn add_widget(screen: &mut Screen, frame: Option<&str>, widget: Widget) -> Result<(), &'static str> {
    if screen.find_widget(&widget.id).is_some() {
        return Err("Error adding widget");
    }
    let target = match frame {
        Some(frame_id) => {
            screen.find_widget_mut(frame_id).and_then(Widget::frame_screen_mut).ok_or("Error finding frame")?
        },
        None => screen,
    };
    target.add_widget(widget).map_err(|_| "Error adding widget")
}

/// `widget_del <screenid> <widgetid>`
pub(super) fn widget_del(state: &mut ServerState, client: ClientId, args: &[String]) -> Result<(), CommandError> {
    require_active(state, client, args)?;
    let [_, screen_id, widget_id] = args else {
        huh(state, client, "Usage: widget_del <screenid> <widgetid>");
        return Ok(());
    };
    let Some(screen) = state.screens.find(Some(client), screen_id).and_then(|key| state.screens.get_mut(key))
    else {
        huh(state, client, "Invalid screen id");
        return Ok(());
    };
    if screen.find_widget(widget_id).is_none() {
        huh(state, client, "Invalid widget id");
        return Ok(());
    }
    match screen.remove_widget(widget_id) {
        Some(_) => success(state, client),
        None => huh(state, client, "Error removing widget"),
    }
    Ok(())
}

/// `widget_set <screenid> <widgetid> <widget-specific data>`
pub(super) fn widget_set(state: &mut ServerState, client: ClientId, args: &[String]) -> Result<(), CommandError> {
    require_active(state, client, args)?;
    if args.len() < 4 {
        huh(state, client, "Usage: widget_set <screenid> <widgetid> <widget-SPECIFIC-data>");
        return Ok(());
    }
    let (screen_id, widget_id) = (&args[1], &args[2]);

    let Some(screen) = state.screens.find(Some(client), screen_id).and_then(|key| state.screens.get_mut(key))
    else {
        huh(state, client, "Unknown screen id");
        return Ok(());
    };
    let Some(widget) = screen.find_widget_mut(widget_id) else {
        tracing::warn!(client = client.0, screen = %screen_id, widget = %widget_id, "widget_set on unknown widget");
        huh(state, client, "Unknown widget id");
        return Ok(());
    };

    match set_data(&mut widget.data, &args[3..]) {
        Ok(()) => success(state, client),
        Err(message) => huh(state, client, message),
    }
    Ok(())
}

fn expect_count(data: &[String], count: usize) -> Result<(), &'static str> {
    if data.len() == count { Ok(()) } else { Err("Wrong number of arguments") }
}

fn coordinates(data: &[String]) -> Result<(), &'static str> {
    if data.iter().all(|arg| starts_with_digit(arg)) { Ok(()) } else { Err("Invalid coordinates") }
}

fn set_data(data: &mut WidgetData, args: &[String]) -> Result<(), &'static str> {
    match data {
        WidgetData::String { x, y, text } => {
            expect_count(args, 3)?;
            coordinates(&args[..2])?;
            *x = atoi(&args[0]);
            *y = atoi(&args[1]);
            *text = Some(args[2].clone());
        },
        WidgetData::HBar { x, y, length } | WidgetData::VBar { x, y, length } => {
            expect_count(args, 3)?;
            coordinates(&args[..2])?;
            *x = atoi(&args[0]);
            *y = atoi(&args[1]);
            *length = atoi(&args[2]);
        },
        WidgetData::PBar { x, y, width, promille, begin_label, end_label } => {
            if !(4..=6).contains(&args.len()) {
                return Err("Wrong number of arguments");
            }
            coordinates(&args[..2])?;
            *x = atoi(&args[0]);
            *y = atoi(&args[1]);
            *width = atoi(&args[2]);
            *promille = atoi(&args[3]);
            *begin_label = args.get(4).cloned();
            *end_label = args.get(5).cloned();
        },
        WidgetData::Icon { x, y, icon } => {
            expect_count(args, 3)?;
            coordinates(&args[..2])?;
            let named = Icon::from_name(&args[2]).ok_or("Invalid icon name")?;
            *x = atoi(&args[0]);
            *y = atoi(&args[1]);
            *icon = Some(named);
        },
        WidgetData::Title { text, .. } => {
            expect_count(args, 1)?;
            *text = Some(args[0].clone());
        },
        WidgetData::Scroller { left, top, right, bottom, direction, speed, text } => {
            expect_count(args, 7)?;
            coordinates(&args[..4])?;
            let mode = ScrollDirection::from_arg(&args[4]).ok_or("Invalid direction")?;
            *left = atoi(&args[0]);
            *top = atoi(&args[1]);
            *right = atoi(&args[2]);
            *bottom = atoi(&args[3]);
            *direction = Some(mode);
            *speed = atoi(&args[5]);
            *text = Some(args[6].clone());
        },
        WidgetData::Frame { left, top, right, bottom, width, height, direction, speed, .. } => {
            expect_count(args, 8)?;
            coordinates(&args[..6])?;
            let mode = ScrollDirection::from_arg(&args[6])
                .filter(|&d| d != ScrollDirection::Marquee)
                .ok_or("Invalid direction")?;
            *left = atoi(&args[0]);
            *top = atoi(&args[1]);
            *right = atoi(&args[2]);
            *bottom = atoi(&args[3]);
            *width = atoi(&args[4]);
            *height = atoi(&args[5]);
            *direction = Some(mode);
            *speed = atoi(&args[7]);
        },
        WidgetData::Num { x, digit } => {
            expect_count(args, 2)?;
            coordinates(&args[..1])?;
            if !starts_with_digit(&args[1]) {
                return Err("Invalid number");
            }
            *x = atoi(&args[0]);
            *digit = atoi(&args[1]);
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(line: &str) -> Vec<String> {
        line.split(' ').map(str::to_owned).collect()
    }

    #[test]
    fn string_needs_numeric_coordinates() {
        let mut data = Widget::new("w", WidgetKind::String, None).data;
        assert_eq!(set_data(&mut data, &args("x 1 hi")), Err("Invalid coordinates"));
        assert_eq!(set_data(&mut data, &args("1 1")), Err("Wrong number of arguments"));
        assert_eq!(set_data(&mut data, &args("3 2 hi")), Ok(()));
        assert_eq!(data, WidgetData::String { x: 3, y: 2, text: Some("hi".into()) });
    }

    #[test]
    fn pbar_labels_are_optional_and_reset() {
        let mut data = Widget::new("p", WidgetKind::PBar, None).data;
        set_data(&mut data, &args("1 2 10 500 [ ]")).unwrap();
        set_data(&mut data, &args("1 2 10 750")).unwrap();
        assert_eq!(
            data,
            WidgetData::PBar { x: 1, y: 2, width: 10, promille: 750, begin_label: None, end_label: None }
        );
    }

    #[test]
    fn frame_refuses_marquee() {
        let mut data = Widget::new("f", WidgetKind::Frame, None).data;
        assert_eq!(set_data(&mut data, &args("1 1 10 2 10 4 m 1")), Err("Invalid direction"));
        assert_eq!(set_data(&mut data, &args("1 1 10 2 10 4 v 8")), Ok(()));
    }

    #[test]
    fn scroller_direction_by_first_letter() {
        let mut data = Widget::new("s", WidgetKind::Scroller, None).data;
        assert_eq!(set_data(&mut data, &args("1 1 20 1 x 1 text")), Err("Invalid direction"));
        assert_eq!(set_data(&mut data, &args("1 1 20 1 marquee 2 text")), Ok(()));
        assert!(matches!(data, WidgetData::Scroller { direction: Some(ScrollDirection::Marquee), speed: 2, .. }));
    }

    #[test]
    fn num_and_icon_checks() {
        let mut num = Widget::new("n", WidgetKind::Num, None).data;
        assert_eq!(set_data(&mut num, &args("1 x")), Err("Invalid number"));
        assert_eq!(set_data(&mut num, &args("5 10")), Ok(()));
        assert_eq!(num, WidgetData::Num { x: 5, digit: 10 });

        let mut icon = Widget::new("i", WidgetKind::Icon, None).data;
        assert_eq!(set_data(&mut icon, &args("1 1 SMILEY")), Err("Invalid icon name"));
        assert_eq!(set_data(&mut icon, &args("1 1 heart_filled")), Ok(()));
    }
}
