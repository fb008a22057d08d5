//! Everything the server knows, in one place.
//!
//! [`ServerState`] owns the client registry, the screen list, key
//! reservations, the menu system, the renderer and the drivers. Command
//! handlers and the render loop mutate it directly; replies to clients are
//! queued in an outbox that the driver drains into actions.

use lcdproc_core::{
    Backlight, ClientId, ClientRegistry, ClientState, DisplayProps, DriverSet, KeyReservations, MenuSystem,
    Priority, Renderer, Screen, ScreenDefaults, ScreenList, Switch,
    input::{NavigationAction, NavigationKeys},
    menu::{CheckboxValue, MENU_SCREEN_ID, MenuEvent, ServerMenuSettings, TITLESPEED_MAX},
    screenlist::{ScreenKey, Transition},
};
use lcdproc_proto::{Reply, tokenize};

use crate::{
    commands::{self, CommandError},
    drivers::DriverError,
    error::ServerError,
    serverscreen::{self, ServerScreen},
    settings::ServerConfig,
};

/// Keys read from the drivers per input pass.
const MAX_KEYS_PER_PASS: usize = 32;

/// Renders a navigation message stays up for.
const MESSAGE_RENDERS: u32 = 4;

/// Server context shared by command handlers and the main loop.
pub struct ServerState {
    pub(crate) clients: ClientRegistry,
    pub(crate) screens: ScreenList,
    pub(crate) keys: KeyReservations,
    pub(crate) menus: MenuSystem,
    pub(crate) renderer: Renderer,
    pub(crate) drivers: DriverSet,
    pub(crate) props: DisplayProps,
    pub(crate) defaults: ScreenDefaults,
    /// Render ticks since startup
    pub(crate) timer: u64,
    navigation: NavigationKeys,
    menu_screen: ScreenKey,
    server_screen: ServerScreen,
    goodbye: Option<Vec<String>>,
    outbox: Vec<(ClientId, Reply)>,
}

impl ServerState {
    /// Set up the server screens and menus on top of the loaded drivers.
    ///
    /// Fails when no driver provides output.
    pub fn new(config: &ServerConfig, drivers: DriverSet) -> Result<Self, ServerError> {
        let props = drivers.props().ok_or(DriverError::NoOutput)?;
        let defaults =
            ScreenDefaults { width: props.width, height: props.height, duration: config.screen_duration() };

        let mut menus = MenuSystem::new(config.menu_keys.clone(), config.permissive_goto);
        menus
            .install_server_menu(&ServerMenuSettings {
                heartbeat: checkbox(config.heartbeat),
                backlight: checkbox(config.backlight),
                titlespeed: config.titlespeed,
                drivers: drivers.controls(),
            })
            .map_err(|e| ServerError::Internal(format!("failed to build server menu: {e}")))?;

        let mut keys = KeyReservations::new();
        for (key, exclusive) in config.menu_keys.reservations() {
            if let Err(e) = keys.reserve(key, exclusive, None) {
                tracing::warn!(error = %e, "could not reserve menu key");
            }
        }

        let mut screens = ScreenList::new();
        screens.autorotate = config.autorotate;
        let mut menu_screen = Screen::new(MENU_SCREEN_ID, None, &defaults);
        menu_screen.priority = Priority::Hidden;
        let menu_screen = screens.add(menu_screen);
        let server_screen = ServerScreen::install(&mut screens, &defaults, config);

        let mut renderer = Renderer::new(config.titlespeed);
        renderer.backlight = config.backlight_override();
        renderer.heartbeat = config.heartbeat;

        Ok(Self {
            clients: ClientRegistry::new(),
            screens,
            keys,
            menus,
            renderer,
            drivers,
            props,
            defaults,
            timer: 0,
            navigation: config.navigation.clone(),
            menu_screen,
            server_screen,
            goodbye: config.goodbye.clone(),
            outbox: Vec::new(),
        })
    }

    /// Queue a reply. Replies to clients that are gone are dropped.
    pub(crate) fn send(&mut self, client: ClientId, reply: Reply) {
        if self.clients.get(client).is_some() {
            self.outbox.push((client, reply));
        }
    }

    /// Tell the owners of the screens involved in a switch.
    pub(crate) fn notify(&mut self, transition: Option<Transition>) {
        let Some(Transition { from, to }) = transition else {
            return;
        };
        if let Some(from) = from
            && let Some(owner) = from.owner
        {
            self.send(owner, Reply::Ignore(from.id));
        }
        if let Some(owner) = to.owner {
            self.send(owner, Reply::Listen(to.id));
        }
    }

    /// Register a freshly accepted connection.
    pub fn connect(&mut self, client: ClientId) {
        self.clients.add(client);
    }

    /// Forget a client along with its screens, key reservations and menu.
    pub fn destroy_client(&mut self, client: ClientId) {
        if self.clients.remove(client).is_none() {
            return;
        }
        for key in self.screens.owned_by(client) {
            if let Some((_, transition)) = self.screens.remove(key, self.timer) {
                self.notify(transition);
            }
        }
        let released = self.keys.release_all(Some(client));
        self.menus.remove_client(client);
        self.sync_menu_screen();
        tracing::debug!(client = client.0, released, "client destroyed");
    }

    /// Whether the client said `bye`.
    pub fn is_gone(&self, client: ClientId) -> bool {
        self.clients.get(client).is_some_and(|c| c.state == ClientState::Gone)
    }

    /// Run one command line from `client`.
    pub fn execute(&mut self, client: ClientId, line: &str) {
        let result =
            tokenize(line).map_err(CommandError::from).and_then(|args| commands::dispatch(self, client, &args));
        if let Err(e) = result {
            tracing::debug!(client = client.0, error = %e, "command failed");
            self.send(client, Reply::huh(e.to_string()));
        }
        self.flush_menu_events();
        self.sync_menu_screen();
    }

    /// Read pending keys from the drivers and route each one.
    pub fn poll_input(&mut self) {
        let current = self.screens.current_screen().and_then(|s| s.owner);
        for _ in 0..MAX_KEYS_PER_PASS {
            let Some((driver, key)) = self.drivers.get_key() else {
                break;
            };
            tracing::debug!(driver = %driver, key = %key, "key pressed");
            self.handle_key(&key, current);
        }
    }

    /// Route one key: to the client holding a reservation, else to the
    /// menu, else to screen navigation. `current` owns the current screen.
    pub fn handle_key(&mut self, key: &str, current: Option<ClientId>) {
        if let Some(owner) = self.keys.find(key, current).and_then(|kr| kr.owner) {
            self.send(owner, Reply::Key(key.to_owned()));
            return;
        }

        if self.screens.current() == Some(self.menu_screen) || self.menus.keys().is_menu_key(key) {
            if let Err(e) = self.menus.handle_key(key, &self.props) {
                tracing::warn!(key = %key, error = %e, "menu input failed");
            }
            self.flush_menu_events();
            self.sync_menu_screen();
            return;
        }

        match self.navigation.action(key) {
            Some(NavigationAction::ToggleRotate) => {
                self.screens.autorotate = !self.screens.autorotate;
                let message = if self.screens.autorotate { "Rotate" } else { "Hold" };
                self.renderer.show_message(message, MESSAGE_RENDERS);
            },
            Some(NavigationAction::PrevScreen) => {
                let transition = self.screens.goto_prev(self.timer);
                self.notify(transition);
                self.renderer.show_message("Prev", MESSAGE_RENDERS);
            },
            Some(NavigationAction::NextScreen) => {
                let transition = self.screens.goto_next(self.timer);
                self.notify(transition);
                self.renderer.show_message("Next", MESSAGE_RENDERS);
            },
            Some(NavigationAction::ScrollUp | NavigationAction::ScrollDown) | None => {},
        }
    }

    fn flush_menu_events(&mut self) {
        for event in self.menus.take_events() {
            match event.owner {
                Some(owner) => {
                    self.send(owner, Reply::MenuEvent { kind: event.kind, id: event.id, value: event.value });
                },
                None => self.apply_server_menu(&event),
            }
        }
    }

    /// Settings changed through the server's own options menu.
    fn apply_server_menu(&mut self, event: &MenuEvent) {
        if !event.kind.carries_value() {
            return;
        }
        let Some(value) = event.value.as_deref() else {
            return;
        };
        match event.id.as_str() {
            "heartbeat" => {
                if let Some(state) = CheckboxValue::from_name(value) {
                    self.renderer.heartbeat = match state {
                        CheckboxValue::Off => Switch::Off,
                        CheckboxValue::On => Switch::On,
                        CheckboxValue::Gray => Switch::Open,
                    };
                }
            },
            "backlight" => {
                if let Some(state) = CheckboxValue::from_name(value) {
                    self.renderer.backlight = match state {
                        CheckboxValue::Off => Backlight::OFF,
                        CheckboxValue::On => Backlight::ON,
                        CheckboxValue::Gray => Backlight::OPEN,
                    };
                }
            },
            "titlespeed" => {
                if let Ok(speed) = value.parse::<i32>() {
                    self.renderer.titlespeed = speed.clamp(0, TITLESPEED_MAX);
                }
            },
            id @ ("contrast" | "onbrightness" | "offbrightness") => {
                let (Some(index), Ok(promille)) = (event.association, value.parse::<i32>()) else {
                    return;
                };
                let Some(driver) = self.drivers.get_mut(index) else {
                    return;
                };
                match id {
                    "contrast" => driver.set_contrast(promille),
                    "onbrightness" => driver.set_brightness(true, promille),
                    _ => driver.set_brightness(false, promille),
                }
            },
            _ => {},
        }
    }

    fn sync_menu_screen(&mut self) {
        if let Some(screen) = self.screens.get_mut(self.menu_screen) {
            self.menus.sync_screen(screen, &self.props);
        }
    }

    /// One render stroke: advance the timer, schedule, draw.
    pub fn render(&mut self) {
        self.timer += 1;
        self.sync_menu_screen();

        let outcome = self.screens.process(self.timer);
        self.notify(outcome.transition);
        if let Some(expired) = outcome.expired {
            tracing::info!(screen = %expired.id, owner = ?expired.owner.map(|c| c.0), "screen timed out");
        }

        let server_key = self.server_screen.key();
        if self.screens.current() == Some(server_key) {
            let clients = self.clients.len();
            let client_screens = self.screens.iter().filter(|(_, s)| s.owner.is_some()).count();
            if let Some(screen) = self.screens.get_mut(server_key) {
                self.server_screen.update(screen, clients, client_screens);
            }
        }

        let Some(screen) = self.screens.current_screen() else {
            return;
        };
        let owner = screen.owner.and_then(|id| self.clients.get(id));
        self.renderer.render_screen(screen, owner, &mut self.drivers, self.timer);
    }

    /// Draw the farewell message before shutting down.
    pub fn goodbye(&mut self) {
        serverscreen::goodbye(&mut self.drivers, self.goodbye.as_deref());
    }

    /// Replies queued since the last call, in order.
    pub fn take_outbox(&mut self) -> Vec<(ClientId, Reply)> {
        std::mem::take(&mut self.outbox)
    }

    /// Id of the screen being shown, with its owner.
    pub fn current_screen(&self) -> Option<(Option<ClientId>, &str)> {
        self.screens.current_screen().map(|s| (s.owner, s.id.as_str()))
    }

    /// Display geometry.
    pub fn props(&self) -> DisplayProps {
        self.props
    }

    /// Number of connected clients.
    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// Number of screens, server screens included.
    pub fn screen_count(&self) -> usize {
        self.screens.len()
    }

    /// Owner and id of every screen, owner `None` for the server's own.
    pub fn screens(&self) -> impl Iterator<Item = (Option<ClientId>, &str)> + '_ {
        self.screens.iter().map(|(_, s)| (s.owner, s.id.as_str()))
    }

    /// Whether the menu is open.
    pub fn menu_open(&self) -> bool {
        self.menus.is_open()
    }
}

fn checkbox(state: Switch) -> CheckboxValue {
    match state {
        Switch::Off => CheckboxValue::Off,
        Switch::On => CheckboxValue::On,
        Switch::Open => CheckboxValue::Gray,
    }
}
