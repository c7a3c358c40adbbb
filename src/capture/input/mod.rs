//! Input capture (keyboard, pointer)
//!
//! Hook events enter here as [`RawInputEvent`]s and leave the normalizer as
//! the closed set of [`InputEvent`]s the recorder encodes.

pub mod hook;
pub mod normalizer;
pub mod types;

pub use hook::{HookMessage, HookSink, HotkeySource, InputSource, Timebase};
pub use normalizer::{EventNormalizer, MovePolicy, PressedKeySet};
pub use types::{InputEvent, KeyIdentity, MouseButton, RawInputEvent, WheelDirection};
