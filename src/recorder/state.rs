//! Recording state types

use crate::recorder::persister::SavedScript;
use serde::{Deserialize, Serialize};

/// Session state. There is no pause: the hotkey only toggles between these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RecordingState {
    #[default]
    Idle,
    Recording,
}

/// What happened when a session stopped
#[derive(Debug)]
pub enum StopOutcome {
    /// Not recording; nothing happened
    NotRecording,
    /// The session produced no commands; no file was written
    Empty,
    Saved(SavedScript),
    /// The write failed. The rendered lines are kept so the caller can retry.
    Failed { error: String, lines: Vec<String> },
}
