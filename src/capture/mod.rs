//! Platform-specific capture implementations
//!
//! This module provides keyboard and pointer hooks for each platform.

pub mod input;

#[cfg(target_os = "windows")]
pub mod windows;

pub use input::hook::{platform_hotkey_source, platform_input_source};
pub use input::{HookSink, HotkeySource, InputSource};
