//! Display drivers shipped with the server.
//!
//! - `text`: dumps every changed frame to the log, for headless use
//! - `curses`: full-screen terminal display with keyboard input
//!
//! Drivers are selected by name with `[server] Driver` and read their own
//! section of the configuration file.

mod terminal;
mod text;

use lcdproc_core::{Driver, DriverSet};
use thiserror::Error;

pub use self::{terminal::TerminalDriver, text::TextDriver};
use crate::config::{ConfigFile, Occurrence};

/// Display size used when a driver has no valid `Size` setting.
pub const DEFAULT_SIZE: (i32, i32) = (20, 4);

/// Largest accepted display dimension.
const MAX_DIMENSION: i32 = 256;

/// Display driver failures. All of them abort startup.
#[derive(Error, Debug)]
pub enum DriverError {
    /// No driver with that name is built in
    #[error("unknown driver {0:?}")]
    Unknown(String),

    /// The terminal could not be set up
    #[error("terminal setup failed: {0}")]
    Terminal(#[from] std::io::Error),

    /// Every loaded driver is input-only
    #[error("no output driver loaded")]
    NoOutput,
}

/// Names accepted by [`load`].
pub const DRIVER_NAMES: [&str; 2] = ["text", "curses"];

/// Instantiate the driver called `name`, configured from its own section.
pub fn load(name: &str, config: &ConfigFile) -> Result<Box<dyn Driver>, DriverError> {
    let size = display_size(config, name);
    match name {
        "text" => Ok(Box::new(TextDriver::new(size))),
        "curses" => Ok(Box::new(TerminalDriver::new(size)?)),
        _ => Err(DriverError::Unknown(name.to_owned())),
    }
}

/// Load every driver in `names`, in order. Fails on the first driver that
/// cannot be loaded, or when none of them has output.
pub fn load_all(names: &[String], config: &ConfigFile) -> Result<DriverSet, DriverError> {
    let mut drivers = DriverSet::new();
    for name in names {
        let driver = load(name, config)?;
        tracing::info!(driver = %name, size = ?driver.size(), "driver loaded");
        drivers.add(driver);
    }
    if !drivers.has_output() {
        return Err(DriverError::NoOutput);
    }
    Ok(drivers)
}

/// `[<driver>] Size` as `WxH`, falling back to [`DEFAULT_SIZE`].
pub fn display_size(config: &ConfigFile, driver: &str) -> (i32, i32) {
    let Some(value) = config.get_str(driver, "Size", Occurrence::FIRST) else {
        return DEFAULT_SIZE;
    };
    match parse_size(value) {
        Some(size) => size,
        None => {
            tracing::warn!(driver, value, "cannot read display size, using {}x{}", DEFAULT_SIZE.0, DEFAULT_SIZE.1);
            DEFAULT_SIZE
        },
    }
}

fn parse_size(value: &str) -> Option<(i32, i32)> {
    let (width, height) = value.split_once(['x', 'X'])?;
    let width: i32 = width.trim().parse().ok()?;
    let height: i32 = height.trim().parse().ok()?;
    let valid = |n: i32| (1..=MAX_DIMENSION).contains(&n);
    (valid(width) && valid(height)).then_some((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_from_driver_section() {
        let config = ConfigFile::parse("[text]\nSize=16x2\n[curses]\nSize=huge\n");
        assert_eq!(display_size(&config, "text"), (16, 2));
        assert_eq!(display_size(&config, "curses"), DEFAULT_SIZE);
        assert_eq!(display_size(&config, "other"), DEFAULT_SIZE);
    }

    #[test]
    fn size_bounds() {
        assert_eq!(parse_size("40X4"), Some((40, 4)));
        assert_eq!(parse_size("0x4"), None);
        assert_eq!(parse_size("20x300"), None);
        assert_eq!(parse_size("20"), None);
    }

    #[test]
    fn unknown_driver_is_refused() {
        let err = load("hd44780", &ConfigFile::new()).err();
        assert!(matches!(err, Some(DriverError::Unknown(name)) if name == "hd44780"));
    }

    #[test]
    fn drivers_load_in_order() {
        let config = ConfigFile::parse("[text]\nSize=16x2\n");
        let drivers = load_all(&["text".to_owned(), "text".to_owned()], &config).unwrap();
        assert_eq!(drivers.len(), 2);
        assert_eq!(drivers.props().map(|p| (p.width, p.height)), Some((16, 2)));

        let err = load_all(&[], &config).err();
        assert!(matches!(err, Some(DriverError::NoOutput)));
    }

    #[test]
    fn text_driver_loads() {
        let config = ConfigFile::parse("[text]\nSize=16x2\n");
        let driver = load("text", &config).unwrap();
        assert_eq!(driver.name(), "text");
        assert_eq!(driver.size(), Some((16, 2)));
    }
}
