//! Windows capture implementations
//!
//! Uses low-level keyboard and mouse hooks (`WH_KEYBOARD_LL`, `WH_MOUSE_LL`).

pub mod input;

pub use input::*;
