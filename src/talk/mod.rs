//! Push-to-talk handling
//!
//! `TalkController` is a pure state machine over button edges. It never
//! touches the microphone or LEDs itself; it returns `TalkAction`s for the
//! service to apply.

mod controller;
pub mod latch;

pub use controller::{TalkAction, TalkController, TalkStatus, CALL_ALERT, END_CALL_ALERT};
pub use latch::{EdgeHistory, TAP_GAP_MAX, TAP_HOLD_MAX};
