//! Recorder configuration
//!
//! Loaded once at startup from JSON. The legacy settings file (see
//! [`legacy`]) is re-read at every session start on top of it.

pub mod legacy;

use crate::capture::input::normalizer::MovePolicy;
use crate::recorder::channel::{RecordingError, RecordingResult};
use crate::recorder::clock::SleepThresholds;
use crate::recorder::encoder::CoordinateMode;
use legacy::SessionSettings;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "macro-recorder.json";
pub const CONFIG_ENV: &str = "MACRO_RECORDER_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RecorderConfig {
    /// Where numbered scripts are written
    pub output_dir: PathBuf,
    /// Toggle hotkey, matched case-insensitively
    pub hotkey: String,
    pub coordinate_mode: CoordinateMode,
    pub record_sleep: bool,
    pub move_policy: MovePolicy,
    pub action_sleep_threshold_ms: u64,
    pub move_sleep_threshold_ms: u64,
    pub settings_file: Option<PathBuf>,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            hotkey: "F6".to_string(),
            coordinate_mode: CoordinateMode::Screen,
            record_sleep: true,
            move_policy: MovePolicy::FINE,
            action_sleep_threshold_ms: 50,
            move_sleep_threshold_ms: 15,
            settings_file: None,
        }
    }
}

impl RecorderConfig {
    /// Load from `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> RecordingResult<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No config at {:?}, using defaults", path);
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };
        let config: Self = serde_json::from_str(&content).map_err(|e| {
            RecordingError::ConfigurationError(format!("{}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// `$MACRO_RECORDER_CONFIG`, or `macro-recorder.json` in the working directory.
    pub fn load_default() -> RecordingResult<Self> {
        let path = std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE));
        Self::load(&path)
    }

    pub fn validate(&self) -> RecordingResult<()> {
        if self.hotkey.trim().is_empty() {
            return Err(RecordingError::ConfigurationError(
                "hotkey must not be empty".to_string(),
            ));
        }
        if self.move_policy.threshold_px < 0 {
            return Err(RecordingError::ConfigurationError(
                "movePolicy.thresholdPx must not be negative".to_string(),
            ));
        }
        Ok(())
    }

    pub fn sleep_thresholds(&self) -> SleepThresholds {
        SleepThresholds {
            action_ms: self.action_sleep_threshold_ms,
            move_ms: self.move_sleep_threshold_ms,
        }
    }

    /// Settings for a new session, with the settings file applied if configured.
    pub fn session_settings(&self) -> SessionSettings {
        let base = SessionSettings {
            coordinate_mode: self.coordinate_mode,
            record_sleep: self.record_sleep,
        };
        match &self.settings_file {
            Some(path) => legacy::load_settings(path, base),
            None => base,
        }
    }
}
