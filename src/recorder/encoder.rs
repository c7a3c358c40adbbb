//! Script command encoding
//!
//! Maps accepted input events to the text commands of the action script.

use crate::capture::input::types::{InputEvent, MouseButton, WheelDirection};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How pointer coordinates are written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoordinateMode {
    #[default]
    Screen,
    Window,
    /// Offsets from the session start, then from the last button release
    Relative,
}

impl CoordinateMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "screen" => Some(CoordinateMode::Screen),
            "window" => Some(CoordinateMode::Window),
            "relative" => Some(CoordinateMode::Relative),
            _ => None,
        }
    }
}

impl fmt::Display for CoordinateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordinateMode::Screen => write!(f, "screen"),
            CoordinateMode::Window => write!(f, "window"),
            CoordinateMode::Relative => write!(f, "relative"),
        }
    }
}

/// One line of the action script
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandLine {
    /// Written commented out (`;Sleep, n`) when sleep recording is off
    Sleep { ms: u64, enabled: bool },
    Move { x: i32, y: i32 },
    Button {
        x: i32,
        y: i32,
        button: MouseButton,
        pressed: bool,
    },
    Wheel(WheelDirection),
    Key { name: String, pressed: bool },
}

fn edge(pressed: bool) -> &'static str {
    if pressed {
        "Down"
    } else {
        "Up"
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandLine::Sleep { ms, enabled } => {
                write!(f, "{}Sleep, {}", if *enabled { "" } else { ";" }, ms)
            }
            CommandLine::Move { x, y } => write!(f, "Click, {}, {}, 0", x, y),
            CommandLine::Button {
                x,
                y,
                button,
                pressed,
            } => write!(f, "Click, {}, {} {}, , {}", x, y, button, edge(*pressed)),
            CommandLine::Wheel(direction) => write!(f, "MouseWheel {}", direction),
            CommandLine::Key { name, pressed } => {
                write!(f, "Send, {{{} {}}}", name, edge(*pressed))
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct CommandEncoder {
    mode: CoordinateMode,
    origin: Option<(i32, i32)>,
    record_sleep: bool,
}

impl CommandEncoder {
    pub fn new(mode: CoordinateMode, record_sleep: bool) -> Self {
        Self {
            mode,
            origin: None,
            record_sleep,
        }
    }

    /// Session start. The origin is only kept in relative mode.
    pub fn begin(&mut self, mode: CoordinateMode, record_sleep: bool, position: (i32, i32)) {
        self.mode = mode;
        self.record_sleep = record_sleep;
        self.origin = (mode == CoordinateMode::Relative).then_some(position);
    }

    pub fn clear(&mut self) {
        self.origin = None;
    }

    pub fn mode(&self) -> CoordinateMode {
        self.mode
    }

    pub fn origin(&self) -> Option<(i32, i32)> {
        self.origin
    }

    fn translate(&self, x: i32, y: i32) -> (i32, i32) {
        match (self.mode, self.origin) {
            (CoordinateMode::Relative, Some((ox, oy))) => (x - ox, y - oy),
            _ => (x, y),
        }
    }

    /// Encode one event, preceded by a `Sleep` when `delay` is given.
    pub fn encode(&mut self, event: &InputEvent, delay: Option<u64>) -> Vec<CommandLine> {
        let mut lines = Vec::with_capacity(2);
        if let Some(ms) = delay {
            lines.push(CommandLine::Sleep {
                ms,
                enabled: self.record_sleep,
            });
        }

        let line = match event {
            InputEvent::PointerMove { x, y, .. } => {
                let (x, y) = self.translate(*x, *y);
                CommandLine::Move { x, y }
            }
            InputEvent::PointerButton {
                x,
                y,
                button,
                pressed,
                ..
            } => {
                let (rx, ry) = self.translate(*x, *y);
                if !pressed && self.mode == CoordinateMode::Relative {
                    self.origin = Some((*x, *y));
                }
                CommandLine::Button {
                    x: rx,
                    y: ry,
                    button: *button,
                    pressed: *pressed,
                }
            }
            InputEvent::Wheel { direction, .. } => CommandLine::Wheel(*direction),
            InputEvent::KeyChange { name, pressed, .. } => CommandLine::Key {
                name: name.clone(),
                pressed: *pressed,
            },
        };
        lines.push(line);
        lines
    }
}
