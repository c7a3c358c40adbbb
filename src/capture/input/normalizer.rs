//! Raw hook events to semantic input events
//!
//! Every pixel of pointer travel arrives as its own hook callback; the
//! normalizer thins those down to significant moves and drops the key-repeat
//! noise the OS generates while a key is held.

use crate::capture::input::types::{InputEvent, KeyIdentity, RawInputEvent, WheelDirection};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Pointer-move thinning policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovePolicy {
    /// A move must exceed this many pixels on either axis
    pub threshold_px: i32,
    /// ...and arrive more than this many milliseconds after the last accepted move
    pub min_interval_ms: u64,
}

impl MovePolicy {
    /// Fine-grained policy, keeps pointer paths faithful.
    pub const FINE: MovePolicy = MovePolicy {
        threshold_px: 1,
        min_interval_ms: 7,
    };

    /// Coarse policy, much smaller scripts.
    pub const COARSE: MovePolicy = MovePolicy {
        threshold_px: 15,
        min_interval_ms: 50,
    };
}

impl Default for MovePolicy {
    fn default() -> Self {
        Self::FINE
    }
}

/// Keys currently held down.
#[derive(Debug, Default, Clone)]
pub struct PressedKeySet {
    keys: HashSet<KeyIdentity>,
}

impl PressedKeySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the key was already down (OS key repeat).
    pub fn press(&mut self, key: &KeyIdentity) -> bool {
        if self.keys.contains(key) {
            return false;
        }
        self.keys.insert(key.clone())
    }

    /// Returns false if the key was not down.
    pub fn release(&mut self, key: &KeyIdentity) -> bool {
        self.keys.remove(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }
}

/// Capitalize modifier names (`shift` -> `Shift`); other names pass through.
pub fn display_key_name(name: &str) -> String {
    let lower = name.to_ascii_lowercase();
    if ["shift", "ctrl", "alt"].iter().any(|m| lower.starts_with(m)) {
        let mut chars = lower.chars();
        match chars.next() {
            Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
            None => String::new(),
        }
    } else {
        name.to_string()
    }
}

pub struct EventNormalizer {
    hotkey: String,
    policy: MovePolicy,
    last_x: i32,
    last_y: i32,
    last_move_emit: Option<u64>,
    pressed: PressedKeySet,
}

impl EventNormalizer {
    pub fn new(hotkey: impl Into<String>, policy: MovePolicy) -> Self {
        Self {
            hotkey: hotkey.into(),
            policy,
            last_x: 0,
            last_y: 0,
            last_move_emit: None,
            pressed: PressedKeySet::new(),
        }
    }

    /// Start of a session: forget held keys and seed the pointer position.
    pub fn reset(&mut self, x: i32, y: i32) {
        self.last_x = x;
        self.last_y = y;
        self.last_move_emit = None;
        self.pressed.clear();
    }

    /// End of a session: held keys and move timing are forgotten.
    pub fn clear(&mut self) {
        self.last_move_emit = None;
        self.pressed.clear();
    }

    pub fn is_hotkey(&self, name: &str) -> bool {
        name.eq_ignore_ascii_case(&self.hotkey)
    }

    pub fn pressed_keys(&self) -> &PressedKeySet {
        &self.pressed
    }

    pub fn last_position(&self) -> (i32, i32) {
        (self.last_x, self.last_y)
    }

    /// Turn a raw hook event into an input event, or swallow it.
    pub fn normalize(&mut self, raw: RawInputEvent) -> Option<InputEvent> {
        match raw {
            RawInputEvent::PointerMove { x, y, t } => {
                let moved = (x - self.last_x).abs() > self.policy.threshold_px
                    || (y - self.last_y).abs() > self.policy.threshold_px;
                let waited = match self.last_move_emit {
                    Some(last) => t.saturating_sub(last) > self.policy.min_interval_ms,
                    None => true,
                };
                if !(moved && waited) {
                    return None;
                }
                self.last_x = x;
                self.last_y = y;
                self.last_move_emit = Some(t);
                Some(InputEvent::PointerMove { x, y, t })
            }
            RawInputEvent::PointerButton {
                x,
                y,
                button,
                pressed,
                t,
            } => Some(InputEvent::PointerButton {
                x,
                y,
                button,
                pressed,
                t,
            }),
            RawInputEvent::Wheel { delta, t } => Some(InputEvent::Wheel {
                direction: WheelDirection::from_delta(delta),
                t,
            }),
            RawInputEvent::Key {
                scan_code,
                name,
                pressed,
                t,
            } => {
                if self.is_hotkey(&name) {
                    return None;
                }
                let key = KeyIdentity::new(scan_code, name);
                let changed = if pressed {
                    self.pressed.press(&key)
                } else {
                    self.pressed.release(&key)
                };
                if !changed {
                    tracing::debug!(
                        "Suppressed repeated key {} ({})",
                        key.name,
                        if pressed { "down" } else { "up" }
                    );
                    return None;
                }
                let name = display_key_name(&key.name);
                Some(InputEvent::KeyChange {
                    key,
                    name,
                    pressed,
                    t,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(name: &str, pressed: bool, t: u64) -> RawInputEvent {
        RawInputEvent::Key {
            scan_code: 30,
            name: name.to_string(),
            pressed,
            t,
        }
    }

    fn normalizer() -> EventNormalizer {
        let mut n = EventNormalizer::new("F6", MovePolicy::FINE);
        n.reset(100, 100);
        n
    }

    #[test]
    fn test_small_moves_are_suppressed() {
        let mut n = EventNormalizer::new("F6", MovePolicy::COARSE);
        n.reset(100, 100);
        for (i, offset) in [-15, -3, 0, 7, 15].iter().enumerate() {
            let raw = RawInputEvent::PointerMove {
                x: 100 + offset,
                y: 100 - offset,
                t: 100 * (i as u64 + 1),
            };
            assert_eq!(n.normalize(raw), None);
        }
        assert_eq!(n.last_position(), (100, 100));
    }

    #[test]
    fn test_move_requires_distance_and_interval() {
        let mut n = normalizer();
        assert!(n
            .normalize(RawInputEvent::PointerMove { x: 110, y: 100, t: 10 })
            .is_some());
        // Far enough but too soon after the last accepted move
        assert!(n
            .normalize(RawInputEvent::PointerMove { x: 130, y: 100, t: 15 })
            .is_none());
        assert!(n
            .normalize(RawInputEvent::PointerMove { x: 130, y: 100, t: 18 })
            .is_some());
        assert_eq!(n.last_position(), (130, 100));
    }

    #[test]
    fn test_duplicate_key_down_suppressed() {
        let mut n = normalizer();
        assert!(n.normalize(key("a", true, 0)).is_some());
        assert!(n.normalize(key("a", true, 30)).is_none());
        assert!(n.normalize(key("a", true, 60)).is_none());
        assert!(n.normalize(key("a", false, 90)).is_some());
        assert!(n.normalize(key("a", false, 95)).is_none());
        assert!(n.pressed_keys().is_empty());
    }

    #[test]
    fn test_same_name_different_scan_code_are_distinct() {
        let mut n = normalizer();
        let left = RawInputEvent::Key {
            scan_code: 42,
            name: "shift".to_string(),
            pressed: true,
            t: 0,
        };
        let right = RawInputEvent::Key {
            scan_code: 54,
            name: "shift".to_string(),
            pressed: true,
            t: 1,
        };
        assert!(n.normalize(left).is_some());
        assert!(n.normalize(right).is_some());
        assert_eq!(n.pressed_keys().len(), 2);
    }

    #[test]
    fn test_hotkey_never_passes() {
        let mut n = normalizer();
        assert!(n.normalize(key("f6", true, 0)).is_none());
        assert!(n.normalize(key("F6", false, 5)).is_none());
        assert!(n.pressed_keys().is_empty());
    }

    #[test]
    fn test_modifier_names_capitalized() {
        assert_eq!(display_key_name("shift"), "Shift");
        assert_eq!(display_key_name("ctrl"), "Ctrl");
        assert_eq!(display_key_name("alt"), "Alt");
        assert_eq!(display_key_name("a"), "a");
        assert_eq!(display_key_name("page up"), "page up");

        let mut n = normalizer();
        match n.normalize(key("ctrl", true, 0)) {
            Some(InputEvent::KeyChange { name, .. }) => assert_eq!(name, "Ctrl"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_wheel_and_buttons_always_pass() {
        let mut n = normalizer();
        assert_eq!(
            n.normalize(RawInputEvent::Wheel { delta: -120, t: 3 }),
            Some(InputEvent::Wheel {
                direction: WheelDirection::Down,
                t: 3
            })
        );
        assert!(n
            .normalize(RawInputEvent::PointerButton {
                x: 100,
                y: 100,
                button: crate::capture::input::types::MouseButton::Left,
                pressed: true,
                t: 4,
            })
            .is_some());
    }
}
