//! The server's own status screen and the shutdown message.

use lcdproc_core::{
    Cursor, DriverSet, Priority, Screen, ScreenDefaults, ScreenList, Switch, Widget, WidgetData,
    screenlist::ScreenKey,
};

use crate::settings::{ServerConfig, ServerScreenMode};

/// Id of the status screen.
pub const SERVER_SCREEN_ID: &str = "_server_screen";

const TITLE: &str = "LCDproc Server";

/// Handle on the status screen plus its greeting state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerScreen {
    key: ScreenKey,
    mode: ServerScreenMode,
    greeting: bool,
    width: i32,
    height: i32,
}

impl ServerScreen {
    /// Build the status screen and add it to `screens`. With `Hello` lines
    /// configured they are shown until the first client connects.
    pub fn install(screens: &mut ScreenList, defaults: &ScreenDefaults, config: &ServerConfig) -> Self {
        let mut screen = Screen::new(SERVER_SCREEN_ID, None, defaults);
        screen.name = Some("Server screen".to_owned());
        screen.duration = config.server_screen_duration();
        for row in 1..=defaults.height {
            let _ = screen.add_widget(Widget::string(format!("line{row}"), 1, row, ""));
        }

        let greeting = !config.hello.is_empty();
        let mut this = Self {
            key: ScreenKey(0),
            mode: config.server_screen,
            greeting,
            width: defaults.width,
            height: defaults.height,
        };
        this.reset(&mut screen, !greeting);
        if greeting {
            for (row, line) in (1..=defaults.height).zip(&config.hello) {
                set_line(&mut screen, row, line);
            }
        }
        this.key = screens.add(screen);
        this
    }

    /// Key of the status screen in the screen list.
    pub fn key(&self) -> ScreenKey {
        self.key
    }

    /// Whether the `Hello` lines are still up.
    pub fn greeting(&self) -> bool {
        self.greeting
    }

    fn reset(&self, screen: &mut Screen, decorated: bool) {
        let blank = self.mode == ServerScreenMode::Blank;
        screen.heartbeat = if decorated && !blank { Switch::Open } else { Switch::Off };
        screen.priority = if self.mode == ServerScreenMode::On { Priority::Info } else { Priority::Background };

        for row in 1..=self.height {
            let id = format!("line{row}");
            let Some(widget) = screen.find_widget_mut(&id) else {
                continue;
            };
            widget.data = if row == 1 && decorated && !blank {
                WidgetData::Title { x: 1, y: row, text: Some(TITLE.to_owned()) }
            } else {
                WidgetData::String { x: 1, y: row, text: Some(String::new()) }
            };
        }
    }

    /// Refresh the statistics. Called while the status screen is current.
    /// The greeting ends once a client is connected.
    pub fn update(&mut self, screen: &mut Screen, clients: usize, client_screens: usize) {
        if self.greeting {
            if clients == 0 {
                return;
            }
            self.greeting = false;
            self.reset(screen, true);
        }
        if self.mode == ServerScreenMode::Blank {
            return;
        }

        if self.height >= 3 {
            set_line(screen, 2, &format!("Clients: {clients}"));
            set_line(screen, 3, &format!("Screens: {client_screens}"));
        } else if self.width >= 16 {
            set_line(screen, 2, &format!("Cli: {clients}  Scr: {client_screens}"));
        } else {
            set_line(screen, 2, &format!("C: {clients}  S: {client_screens}"));
        }
    }
}

fn set_line(screen: &mut Screen, row: i32, line: &str) {
    if let Some(widget) = screen.find_widget_mut(&format!("line{row}"))
        && let WidgetData::String { text, .. } | WidgetData::Title { text, .. } = &mut widget.data
    {
        *text = Some(line.to_owned());
    }
}

/// Draw the farewell message: the `GoodBye` lines when configured, else a
/// centered default on displays of at least 16x2.
pub fn goodbye(drivers: &mut DriverSet, lines: Option<&[String]>) {
    let Some(props) = drivers.props() else {
        return;
    };
    drivers.clear();

    match lines {
        Some(lines) => {
            for (row, line) in (1..=props.height).zip(lines) {
                drivers.string(1, row, line);
            }
        },
        None if props.height >= 2 && props.width >= 16 => {
            let x = 1 + (props.width - 16) / 2;
            let y = 1 + (props.height - 2) / 2;
            drivers.string(x, y, "Thanks for using");
            drivers.string(x, y + 1, "LCDproc & Linux!");
        },
        None => {},
    }

    drivers.cursor(1, 1, Cursor::Off, 0);
    drivers.flush();
}
