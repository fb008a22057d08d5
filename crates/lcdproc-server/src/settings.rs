//! Typed server settings.
//!
//! Built from the `[server]` and `[menu]` sections of the configuration
//! file. Command line flags are applied on top by the binary.

use std::time::Duration;

use lcdproc_core::{
    Backlight, Switch,
    input::NavigationKeys,
    menu::{MenuKeys, TITLESPEED_MAX},
    pacer::DEFAULT_FRAME_INTERVAL,
};
use lcdproc_proto::{DEFAULT_BIND, DEFAULT_PORT};

use crate::config::{ConfigError, ConfigFile, Occurrence, Tristate};

/// Display driver used when none is configured.
pub const DEFAULT_DRIVER: &str = "curses";

/// Screen duration in render ticks when no wait time is configured.
pub const DEFAULT_SCREEN_DURATION: i32 = 32;

/// Shortest allowed wait time per screen.
pub const MIN_WAIT_TIME: Duration = Duration::from_secs(2);

const SERVER: &str = "server";
const MENU: &str = "menu";

/// How the server's own status screen takes part in rotation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ServerScreenMode {
    /// Rotates like any info screen
    #[default]
    On,
    /// Only shown when nothing else is
    Off,
    /// Like `Off`, and shown blank
    Blank,
}

impl ServerScreenMode {
    /// Parse `on`, `off` or `blank` (and the usual boolean spellings).
    pub fn from_arg(arg: &str) -> Option<Self> {
        let mut file = ConfigFile::new();
        file.push(SERVER, "ServerScreen", arg);
        file.get_tristate(SERVER, "ServerScreen", Occurrence::FIRST, "blank").map(Self::from)
    }
}

impl From<Tristate> for ServerScreenMode {
    fn from(value: Tristate) -> Self {
        match value {
            Tristate::On => Self::On,
            Tristate::Off => Self::Off,
            Tristate::Third => Self::Blank,
        }
    }
}

/// Everything the server needs to know at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Address to listen on
    pub bind: String,
    /// Port to listen on
    pub port: u16,
    /// Display drivers to load, in order
    pub drivers: Vec<String>,
    /// Render interval
    pub frame_interval: Duration,
    /// How long each screen stays up during rotation
    pub wait_time: Option<Duration>,
    /// Server status screen behavior
    pub server_screen: ServerScreenMode,
    /// Global backlight override
    pub backlight: Switch,
    /// Global heartbeat override
    pub heartbeat: Switch,
    /// Rotate screens of equal priority
    pub autorotate: bool,
    /// Title scroll speed, 0 (off) to 10
    pub titlespeed: i32,
    /// Lines shown until the first client connects
    pub hello: Vec<String>,
    /// Lines shown at shutdown; `None` shows the default farewell
    pub goodbye: Option<Vec<String>>,
    /// Legacy numeric report level, 0 (critical) to 5 (debug)
    pub report_level: Option<i64>,
    /// Screen navigation keys
    pub navigation: NavigationKeys,
    /// Menu keys
    pub menu_keys: MenuKeys,
    /// Allow menu links and `menu_goto` to reach other clients' items
    pub permissive_goto: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_owned(),
            port: DEFAULT_PORT,
            drivers: Vec::new(),
            frame_interval: DEFAULT_FRAME_INTERVAL,
            wait_time: None,
            server_screen: ServerScreenMode::On,
            backlight: Switch::Open,
            heartbeat: Switch::Open,
            autorotate: true,
            titlespeed: TITLESPEED_MAX,
            hello: Vec::new(),
            goodbye: None,
            report_level: None,
            navigation: NavigationKeys::default(),
            menu_keys: MenuKeys::default(),
            permissive_goto: false,
        }
    }
}

impl ServerConfig {
    /// Read settings from a parsed configuration file. Missing or
    /// unparsable values keep their defaults.
    pub fn from_file(file: &ConfigFile) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(bind) = file.get_str(SERVER, "Bind", Occurrence::FIRST) {
            config.bind = bind.to_owned();
        }
        if let Some(port) = file.get_int(SERVER, "Port", Occurrence::FIRST) {
            config.port = u16::try_from(port).map_err(|_| ConfigError::Invalid {
                key: "Port",
                value: port.to_string(),
                reason: "not a TCP port",
            })?;
        }
        config.drivers = file.values(SERVER, "Driver").filter(|d| !d.is_empty()).map(str::to_owned).collect();

        if let Some(interval) = file.get_int(SERVER, "FrameInterval", Occurrence::FIRST) {
            config.frame_interval = u64::try_from(interval)
                .ok()
                .filter(|&us| us > 0)
                .map(Duration::from_micros)
                .ok_or(ConfigError::Invalid {
                    key: "FrameInterval",
                    value: interval.to_string(),
                    reason: "must be a positive number of microseconds",
                })?;
        }
        if let Some(seconds) = file.get_float(SERVER, "WaitTime", Occurrence::FIRST) {
            config.wait_time = Duration::try_from_secs_f64(seconds).ok().filter(|d| !d.is_zero());
        }
        if let Some(mode) = file.get_tristate(SERVER, "ServerScreen", Occurrence::FIRST, "blank") {
            config.server_screen = mode.into();
        }
        if let Some(state) = file.get_tristate(SERVER, "Backlight", Occurrence::FIRST, "open") {
            config.backlight = switch(state);
        }
        if let Some(state) = file.get_tristate(SERVER, "Heartbeat", Occurrence::FIRST, "open") {
            config.heartbeat = switch(state);
        }
        if let Some(autorotate) = file.get_bool(SERVER, "AutoRotate", Occurrence::FIRST) {
            config.autorotate = autorotate;
        }
        if let Some(speed) = file.get_int(SERVER, "TitleSpeed", Occurrence::FIRST) {
            config.titlespeed = speed.clamp(0, i64::from(TITLESPEED_MAX)) as i32;
        }
        config.hello = file.values(SERVER, "Hello").map(str::to_owned).collect();
        if file.count(SERVER, "GoodBye") > 0 {
            config.goodbye = Some(file.values(SERVER, "GoodBye").map(str::to_owned).collect());
        }
        config.report_level = file.get_int(SERVER, "ReportLevel", Occurrence::FIRST);

        let key = |name: &str, default: &str| {
            file.get_str(SERVER, name, Occurrence::FIRST).unwrap_or(default).to_owned()
        };
        let defaults = NavigationKeys::default();
        config.navigation = NavigationKeys {
            toggle_rotate: key("ToggleRotateKey", &defaults.toggle_rotate),
            prev_screen: key("PrevScreenKey", &defaults.prev_screen),
            next_screen: key("NextScreenKey", &defaults.next_screen),
            scroll_up: key("ScrollUpKey", &defaults.scroll_up),
            scroll_down: key("ScrollDownKey", &defaults.scroll_down),
        };

        let menu_key = |name: &str| file.get_str(MENU, name, Occurrence::FIRST).map(str::to_owned);
        config.menu_keys = MenuKeys {
            menu: menu_key("MenuKey"),
            enter: menu_key("EnterKey"),
            up: menu_key("UpKey"),
            down: menu_key("DownKey"),
            left: menu_key("LeftKey"),
            right: menu_key("RightKey"),
        };
        if let Some(permissive) = file.get_bool(MENU, "PermissiveGoto", Occurrence::FIRST) {
            config.permissive_goto = permissive;
        }

        Ok(config)
    }

    /// Drivers to load, falling back to the default driver.
    pub fn driver_names(&self) -> Vec<String> {
        if self.drivers.is_empty() { vec![DEFAULT_DRIVER.to_owned()] } else { self.drivers.clone() }
    }

    /// Rotation duration of a screen in render ticks.
    ///
    /// Wait times below [`MIN_WAIT_TIME`] are raised to it.
    pub fn screen_duration(&self) -> i32 {
        let Some(wait) = self.wait_time else {
            return DEFAULT_SCREEN_DURATION;
        };
        let wait = wait.max(MIN_WAIT_TIME);
        ticks(wait, self.frame_interval)
    }

    /// Rotation duration of the server screen: about one second.
    pub fn server_screen_duration(&self) -> i32 {
        ticks(Duration::from_secs(1), self.frame_interval) + 1
    }

    /// Global backlight override as a renderer value.
    pub fn backlight_override(&self) -> Backlight {
        match self.backlight {
            Switch::On => Backlight::ON,
            Switch::Off => Backlight::OFF,
            Switch::Open => Backlight::OPEN,
        }
    }

    /// Log filter directive for the configured `ReportLevel`, if any.
    pub fn report_filter(&self) -> Option<&'static str> {
        self.report_level.map(|level| match level {
            i64::MIN..=1 => "error",
            2 => "warn",
            3 => "info",
            4 => "debug",
            _ => "trace",
        })
    }
}

fn switch(state: Tristate) -> Switch {
    match state {
        Tristate::On => Switch::On,
        Tristate::Off => Switch::Off,
        Tristate::Third => Switch::Open,
    }
}

fn ticks(span: Duration, frame_interval: Duration) -> i32 {
    let frame = frame_interval.as_micros().max(1);
    i32::try_from(span.as_micros() / frame).unwrap_or(i32::MAX)
}
