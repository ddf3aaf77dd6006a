//! Keyboard input read straight from a terminal. The terminal is switched to raw mode only
//! for the duration of a single read or queue probe.

pub mod keyboard;
pub mod raw_mode;

pub use keyboard::{KeyCode, KeyInput, KeyboardPoller, Tty};
pub use raw_mode::RawMode;
