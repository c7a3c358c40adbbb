//! Six-line `key=value` settings file
//!
//! Only two lines matter: the 4th selects the coordinate mode, the 6th
//! turns sleep recording on (`true`) or off (anything else).

use crate::recorder::encoder::CoordinateMode;
use std::path::Path;

const MODE_LINE: usize = 3;
const SLEEP_LINE: usize = 5;

/// Per-session settings read at every recording start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    pub coordinate_mode: CoordinateMode,
    pub record_sleep: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            coordinate_mode: CoordinateMode::Screen,
            record_sleep: true,
        }
    }
}

fn value(line: &str) -> &str {
    line.trim().rsplit('=').next().unwrap_or("").trim()
}

/// `None` when the file has fewer than six lines.
pub fn parse_settings(content: &str) -> Option<SessionSettings> {
    let lines: Vec<&str> = content.lines().collect();
    if lines.len() <= SLEEP_LINE {
        return None;
    }
    Some(SessionSettings {
        coordinate_mode: CoordinateMode::parse(value(lines[MODE_LINE])).unwrap_or_default(),
        record_sleep: value(lines[SLEEP_LINE]) == "true",
    })
}

/// Read the settings file. A missing file keeps `fallback`; an unreadable or
/// malformed one falls back to the defaults.
pub fn load_settings(path: &Path, fallback: SessionSettings) -> SessionSettings {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return fallback,
        Err(e) => {
            tracing::warn!("Could not read settings file {:?}: {}", path, e);
            return SessionSettings::default();
        }
    };
    match parse_settings(&content) {
        Some(settings) => settings,
        None => {
            tracing::warn!("Malformed settings file {:?}, using defaults", path);
            SessionSettings::default()
        }
    }
}
