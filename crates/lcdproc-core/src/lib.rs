//! LCDproc display server model.
//!
//! Everything here is pure: no sockets, no clocks, no logging. The server
//! crate feeds commands, keys and ticks in and executes what comes out,
//! which keeps every rule of the display server testable with plain unit
//! tests and deterministic simulation.
//!
//! # Components
//!
//! - [`ClientRegistry`]: connected clients and their overrides
//! - [`Screen`] and [`Widget`]: what a client asks to show
//! - [`ScreenList`]: priority scheduler deciding which screen is current
//! - [`KeyReservations`]: which client receives which key
//! - [`MenuSystem`]: menu tree, its input state machine and menu screen
//! - [`Renderer`]: turns the current screen into driver calls
//! - [`DriverSet`]: fan-out to display drivers with character fallbacks
//! - [`Pacer`]: process and render rates of the main loop
//! - [`Environment`]: clock abstraction shared with the simulation harness

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod client;
pub mod driver;
pub mod env;
pub mod error;
pub mod framebuffer;
pub mod icon;
pub mod input;
pub mod menu;
pub mod pacer;
pub mod render;
pub mod screen;
pub mod screenlist;
pub mod widget;

pub use client::{Client, ClientId, ClientRegistry, ClientState};
pub use driver::{DisplayProps, Driver, DriverSet};
pub use env::Environment;
pub use framebuffer::FrameBuffer;
pub use icon::Icon;
pub use input::KeyReservations;
pub use menu::MenuSystem;
pub use pacer::{Pacer, Strokes};
pub use render::Renderer;
pub use screen::{Backlight, Cursor, Priority, Screen, ScreenDefaults, Switch};
pub use screenlist::ScreenList;
pub use widget::{ScrollDirection, Widget, WidgetData, WidgetKind};
