//! `LCDd.conf` reader.
//!
//! The file is INI-like: `[section]` headers, `key = value` lines, `#` and
//! `;` comments. Section and key names are case-insensitive. A key may be
//! repeated to form a multi-valued setting (`Driver`, `Hello`), addressed by
//! position. Values may be double-quoted to keep spaces, with `\n`, `\r`,
//! `\t` escapes and any other escaped character taken literally.
//!
//! Malformed lines are skipped with a warning; only an unreadable file is
//! an error.

use std::{fs, path::Path};

use lcdproc_core::menu::options::parse_c_integer;
use thiserror::Error;

/// Longest section or key name kept.
const MAX_NAME: usize = 40;

/// Longest value kept.
const MAX_VALUE: usize = 200;

/// Configuration failures that stop the server from starting.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read
    #[error("could not read config file {path}: {source}")]
    Read {
        /// File that failed
        path: String,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// A setting has a value the server cannot work with
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        /// Setting name
        key: &'static str,
        /// Offending value
        value: String,
        /// What is wrong with it
        reason: &'static str,
    },
}

/// Which value of a multi-valued key to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occurrence {
    /// Zero-based position among the key's values
    Nth(usize),
    /// The last value
    Last,
}

impl Occurrence {
    /// The first value.
    pub const FIRST: Self = Self::Nth(0);
}

/// Three-valued setting: `off`, `on`, or a named third state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tristate {
    /// `0 false n no off`
    Off,
    /// `1 true y yes on`
    On,
    /// `2` or the setting's own name for the third state
    Third,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Section {
    name: String,
    entries: Vec<(String, String)>,
}

/// Parsed configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    sections: Vec<Section>,
}

impl ConfigFile {
    /// Empty configuration; every lookup falls back to its default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read and parse a file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.display().to_string(), source })?;
        Ok(Self::parse(&text))
    }

    /// Parse configuration text.
    pub fn parse(text: &str) -> Self {
        let mut config = Self::new();
        let mut current: Option<usize> = None;

        for (number, line) in (1..).zip(text.lines()) {
            let line = line.trim();
            if line.is_empty() || line.starts_with(['#', ';']) {
                continue;
            }

            if let Some(rest) = line.strip_prefix('[') {
                match parse_section(rest) {
                    Some(name) => current = Some(config.section_index(name)),
                    None => {
                        tracing::warn!(line = number, "invalid section header in config file");
                        current = None;
                    },
                }
                continue;
            }

            match parse_entry(line) {
                Some((key, value)) => match current.and_then(|i| config.sections.get_mut(i)) {
                    Some(section) => section.entries.push((key.to_owned(), value)),
                    None => tracing::warn!(line = number, key, "config value outside of any section"),
                },
                None => tracing::warn!(line = number, "malformed line in config file"),
            }
        }
        config
    }

    fn section_index(&mut self, name: &str) -> usize {
        if let Some(index) = self.sections.iter().position(|s| s.name.eq_ignore_ascii_case(name)) {
            return index;
        }
        self.sections.push(Section { name: name.to_owned(), entries: Vec::new() });
        self.sections.len() - 1
    }

    fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name.eq_ignore_ascii_case(name))
    }

    /// Set a value programmatically, appending to any existing values.
    pub fn push(&mut self, section: &str, key: &str, value: impl Into<String>) {
        let index = self.section_index(section);
        if let Some(section) = self.sections.get_mut(index) {
            section.entries.push((key.to_owned(), value.into()));
        }
    }

    /// Whether the section exists.
    pub fn has_section(&self, section: &str) -> bool {
        self.section(section).is_some()
    }

    /// Number of values the key has.
    pub fn count(&self, section: &str, key: &str) -> usize {
        self.values(section, key).count()
    }

    /// All values of a key, in file order.
    pub fn values<'a, 'k>(&'a self, section: &str, key: &'k str) -> impl Iterator<Item = &'a str> + use<'a, 'k> {
        self.section(section)
            .into_iter()
            .flat_map(|s| s.entries.iter())
            .filter(move |(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Raw string value.
    pub fn get_str(&self, section: &str, key: &str, at: Occurrence) -> Option<&str> {
        match at {
            Occurrence::Nth(n) => self.values(section, key).nth(n),
            Occurrence::Last => self.values(section, key).last(),
        }
    }

    /// Boolean value; `None` when missing or not a boolean.
    pub fn get_bool(&self, section: &str, key: &str, at: Occurrence) -> Option<bool> {
        self.get_str(section, key, at).and_then(parse_bool)
    }

    /// Tristate value with `third` naming the third state.
    pub fn get_tristate(&self, section: &str, key: &str, at: Occurrence, third: &str) -> Option<Tristate> {
        let value = self.get_str(section, key, at)?;
        match parse_bool(value) {
            Some(true) => Some(Tristate::On),
            Some(false) => Some(Tristate::Off),
            None if value == "2" || value.eq_ignore_ascii_case(third) => Some(Tristate::Third),
            None => None,
        }
    }

    /// Integer value: decimal, `0x` hex or leading-zero octal, fully
    /// consumed.
    pub fn get_int(&self, section: &str, key: &str, at: Occurrence) -> Option<i64> {
        self.get_str(section, key, at).and_then(parse_c_integer)
    }

    /// Floating point value.
    pub fn get_float(&self, section: &str, key: &str, at: Occurrence) -> Option<f64> {
        self.get_str(section, key, at).and_then(|v| v.trim().parse().ok())
    }
}

fn parse_section(rest: &str) -> Option<&str> {
    let (name, tail) = rest.split_once(']')?;
    let tail = tail.trim();
    let valid = !name.is_empty()
        && name.len() <= MAX_NAME
        && !name.contains([' ', '\t', '"', '['])
        && (tail.is_empty() || tail.starts_with(['#', ';']));
    valid.then_some(name)
}

fn parse_entry(line: &str) -> Option<(&str, String)> {
    let (key, rest) = line.split_once('=')?;
    let key = key.trim();
    if key.is_empty() || key.len() > MAX_NAME || key.contains([' ', '\t', '"', '[', ']']) {
        return None;
    }
    let value = parse_value(rest.trim_start())?;
    Some((key, value))
}

/// A bare word up to whitespace or comment, or a quoted string.
fn parse_value(text: &str) -> Option<String> {
    let mut value = String::new();
    let mut chars = text.chars();

    if text.starts_with('"') {
        chars.next();
        loop {
            match chars.next()? {
                '"' => break,
                '\\' => value.push(match chars.next()? {
                    'n' => '\n',
                    'r' => '\r',
                    't' => '\t',
                    other => other,
                }),
                c => value.push(c),
            }
        }
        let tail = chars.as_str().trim();
        if !(tail.is_empty() || tail.starts_with(['#', ';'])) {
            return None;
        }
    } else {
        let end = text.find([' ', '\t', '#', ';']).unwrap_or(text.len());
        let (word, tail) = text.split_at(end);
        let tail = tail.trim();
        if word.contains(['[', ']', '=']) || !(tail.is_empty() || tail.starts_with(['#', ';'])) {
            return None;
        }
        value.push_str(word);
    }

    if value.chars().count() > MAX_VALUE {
        value = value.chars().take(MAX_VALUE).collect();
    }
    Some(value)
}

/// `0 false n no off` or `1 true y yes on`, case-insensitive.
pub fn parse_bool(value: &str) -> Option<bool> {
    const FALSE: [&str; 5] = ["0", "false", "n", "no", "off"];
    const TRUE: [&str; 5] = ["1", "true", "y", "yes", "on"];
    if FALSE.iter().any(|f| value.eq_ignore_ascii_case(f)) {
        Some(false)
    } else if TRUE.iter().any(|t| value.eq_ignore_ascii_case(t)) {
        Some(true)
    } else {
        None
    }
}
