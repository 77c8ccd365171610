//! Button and indicator hardware boundary

mod panel;

pub use panel::VirtualPanel;

use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Button {
    Talk,
    Call,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Edge {
    Down,
    Up,
}

/// One button transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonEvent {
    pub button: Button,
    pub edge: Edge,
}

impl ButtonEvent {
    pub fn new(button: Button, edge: Edge) -> Self {
        Self { button, edge }
    }
}

/// Hardware state visible to the status surface
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HardwareStatus {
    pub setup_done: bool,
    pub talk_led: bool,
    pub call_led: bool,
    pub error_flasher: bool,
}

/// Indicator outputs and setup state of the button/LED hardware
///
/// Button edges are delivered separately as a stream of `ButtonEvent`s.
pub trait Hardware: Send + Sync {
    /// Initialize the device; `status().setup_done` reports the outcome
    fn setup(&self) -> Result<()>;

    fn set_talk_led(&self, on: bool);

    fn set_call_led(&self, on: bool);

    fn set_error_flasher(&self, on: bool);

    fn status(&self) -> HardwareStatus;
}
