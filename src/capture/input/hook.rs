//! Hook boundary
//!
//! OS hook registration is platform code; the recorder only sees the traits
//! below. Hook callbacks run on their own threads and hand events to the
//! engine through a [`HookSink`], which never blocks.

use crate::capture::input::types::RawInputEvent;
use crate::recorder::channel::{RecordingError, RecordingResult};
use crate::recorder::coordinator::Message;
use std::time::Instant;
use tokio::sync::mpsc::UnboundedSender;

/// Millisecond clock shared by every hook and the control surface.
#[derive(Debug, Clone, Copy)]
pub struct Timebase {
    origin: Instant,
}

impl Timebase {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

impl Default for Timebase {
    fn default() -> Self {
        Self::new()
    }
}

/// What a hook thread can report.
#[derive(Debug, Clone, PartialEq)]
pub enum HookMessage {
    Input(RawInputEvent),
    /// The toggle hotkey went down
    Hotkey { t: u64 },
}

/// Producer handle onto the engine's event channel.
#[derive(Debug, Clone)]
pub struct HookSink {
    tx: UnboundedSender<Message>,
    timebase: Timebase,
}

impl HookSink {
    pub fn new(tx: UnboundedSender<Message>, timebase: Timebase) -> Self {
        Self { tx, timebase }
    }

    pub fn now_ms(&self) -> u64 {
        self.timebase.now_ms()
    }

    /// Returns false once the engine has shut down.
    pub fn input(&self, event: RawInputEvent) -> bool {
        self.tx.send(Message::Hook(HookMessage::Input(event))).is_ok()
    }

    pub fn hotkey(&self, t: u64) -> bool {
        self.tx.send(Message::Hook(HookMessage::Hotkey { t })).is_ok()
    }
}

/// Keyboard and pointer hooks used while a session is recording.
///
/// The toggle hotkey must not be forwarded as a key event; it belongs to the
/// [`HotkeySource`].
pub trait InputSource: Send {
    /// Attach keyboard and pointer hooks. On error nothing stays attached.
    fn attach(&mut self, sink: HookSink) -> RecordingResult<()>;

    /// Detach hooks. Returns once no further events will be sent.
    fn detach(&mut self);

    /// Current pointer position in screen coordinates
    fn cursor_position(&self) -> Option<(i32, i32)>;
}

/// Process-lifetime listener for the toggle hotkey.
pub trait HotkeySource: Send {
    fn listen(&mut self, hotkey: &str, sink: HookSink) -> RecordingResult<()>;

    fn shutdown(&mut self);
}

/// Source for platforms without a hook implementation.
pub struct UnsupportedSource;

impl InputSource for UnsupportedSource {
    fn attach(&mut self, _sink: HookSink) -> RecordingResult<()> {
        Err(RecordingError::HookInstall(format!(
            "input hooks are not implemented on {}",
            std::env::consts::OS
        )))
    }

    fn detach(&mut self) {}

    fn cursor_position(&self) -> Option<(i32, i32)> {
        None
    }
}

impl HotkeySource for UnsupportedSource {
    fn listen(&mut self, _hotkey: &str, _sink: HookSink) -> RecordingResult<()> {
        Err(RecordingError::PlatformError(format!(
            "global hotkeys are not implemented on {}",
            std::env::consts::OS
        )))
    }

    fn shutdown(&mut self) {}
}

#[cfg(target_os = "windows")]
pub fn platform_input_source() -> Box<dyn InputSource> {
    Box::new(crate::capture::windows::input::LowLevelHooks::new())
}

#[cfg(not(target_os = "windows"))]
pub fn platform_input_source() -> Box<dyn InputSource> {
    Box::new(UnsupportedSource)
}

#[cfg(target_os = "windows")]
pub fn platform_hotkey_source() -> Box<dyn HotkeySource> {
    Box::new(crate::capture::windows::input::HotkeyHook::new())
}

#[cfg(not(target_os = "windows"))]
pub fn platform_hotkey_source() -> Box<dyn HotkeySource> {
    Box::new(UnsupportedSource)
}
