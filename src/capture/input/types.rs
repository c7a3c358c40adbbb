use serde::{Deserialize, Serialize};
use std::fmt;

/// Pointer buttons the recorder distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

impl fmt::Display for MouseButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MouseButton::Left => write!(f, "Left"),
            MouseButton::Right => write!(f, "Right"),
            MouseButton::Middle => write!(f, "Middle"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WheelDirection {
    Up,
    Down,
}

impl WheelDirection {
    /// Positive scroll deltas scroll up, everything else scrolls down.
    pub fn from_delta(delta: i32) -> Self {
        if delta > 0 {
            WheelDirection::Up
        } else {
            WheelDirection::Down
        }
    }
}

impl fmt::Display for WheelDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WheelDirection::Up => write!(f, "up"),
            WheelDirection::Down => write!(f, "down"),
        }
    }
}

/// Physical key identity.
///
/// Two physical keys can share a logical name (left/right shift, keypad
/// digits), so the scan code is part of the identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyIdentity {
    pub scan_code: u32,
    pub name: String,
}

impl KeyIdentity {
    pub fn new(scan_code: u32, name: impl Into<String>) -> Self {
        Self {
            scan_code,
            name: name.into(),
        }
    }
}

/// Event as delivered by a hook callback, before any filtering.
///
/// `t` is a millisecond timestamp taken when the callback fired.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RawInputEvent {
    PointerMove {
        x: i32,
        y: i32,
        t: u64,
    },
    PointerButton {
        x: i32,
        y: i32,
        button: MouseButton,
        pressed: bool,
        t: u64,
    },
    Wheel {
        delta: i32,
        t: u64,
    },
    #[serde(rename_all = "camelCase")]
    Key {
        scan_code: u32,
        name: String,
        pressed: bool,
        t: u64,
    },
}

impl RawInputEvent {
    pub fn timestamp(&self) -> u64 {
        match self {
            RawInputEvent::PointerMove { t, .. }
            | RawInputEvent::PointerButton { t, .. }
            | RawInputEvent::Wheel { t, .. }
            | RawInputEvent::Key { t, .. } => *t,
        }
    }
}

/// Semantic input event accepted by the recorder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InputEvent {
    PointerMove {
        x: i32,
        y: i32,
        t: u64,
    },
    PointerButton {
        x: i32,
        y: i32,
        button: MouseButton,
        pressed: bool,
        t: u64,
    },
    Wheel {
        direction: WheelDirection,
        t: u64,
    },
    KeyChange {
        key: KeyIdentity,
        /// Name as written to the script (modifiers capitalized)
        name: String,
        pressed: bool,
        t: u64,
    },
}

impl InputEvent {
    pub fn timestamp(&self) -> u64 {
        match self {
            InputEvent::PointerMove { t, .. }
            | InputEvent::PointerButton { t, .. }
            | InputEvent::Wheel { t, .. }
            | InputEvent::KeyChange { t, .. } => *t,
        }
    }

    pub fn is_pointer_move(&self) -> bool {
        matches!(self, InputEvent::PointerMove { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wheel_direction_from_delta() {
        assert_eq!(WheelDirection::from_delta(120), WheelDirection::Up);
        assert_eq!(WheelDirection::from_delta(-120), WheelDirection::Down);
        assert_eq!(WheelDirection::from_delta(0), WheelDirection::Down);
    }

    #[test]
    fn test_raw_event_serializes_with_type_tag() {
        let event = RawInputEvent::Key {
            scan_code: 30,
            name: "a".to_string(),
            pressed: true,
            t: 5,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "key");
        assert_eq!(json["scanCode"], 30);
        assert_eq!(event.timestamp(), 5);
    }
}
