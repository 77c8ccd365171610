use super::latch::{is_double_tap, EdgeHistory};
use crate::error::InvalidState;
use crate::hardware::{Button, ButtonEvent, Edge};
use serde::Serialize;
use std::time::Instant;
use tracing::{debug, info};

/// Alert sent to the channel when the call button goes down
pub const CALL_ALERT: &str = "CALLING";

/// Alert sent to the channel when the call button goes up
pub const END_CALL_ALERT: &str = "END CALLING";

/// Side effects requested by the controller, applied by the service in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TalkAction {
    ResumeMic,
    PauseMic,
    TalkLed(bool),
    CallLed(bool),
    /// Best-effort text to the current channel
    SendAlert(&'static str),
}

/// Read-only view of the talk state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TalkStatus {
    pub transmitting: bool,
    pub latched: bool,
    pub calling: bool,
}

#[derive(Debug, Default)]
struct TalkState {
    transmitting: bool,
    mic_latch: bool,
    calling: bool,
    downs: EdgeHistory,
    ups: EdgeHistory,
}

/// Turns talk/call button edges into transmit actions
///
/// Releasing the talk button stops transmission unless the last two
/// press/release cycles were a double tap, which latches the microphone on
/// until the next release or an explicit `unlatch`.
#[derive(Debug, Default)]
pub struct TalkController {
    state: TalkState,
}

impl TalkController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> TalkStatus {
        TalkStatus {
            transmitting: self.state.transmitting,
            latched: self.state.mic_latch,
            calling: self.state.calling,
        }
    }

    pub fn is_transmitting(&self) -> bool {
        self.state.transmitting
    }

    pub fn is_latched(&self) -> bool {
        self.state.mic_latch
    }

    /// Dispatch a hardware edge observed at `at`
    pub fn handle(&mut self, event: ButtonEvent, at: Instant) -> Vec<TalkAction> {
        match (event.button, event.edge) {
            (Button::Talk, Edge::Down) => self.talk_down(at),
            (Button::Talk, Edge::Up) => self.talk_up(at),
            (Button::Call, Edge::Down) => self.call_down(),
            (Button::Call, Edge::Up) => self.call_up(),
        }
    }

    pub fn talk_down(&mut self, at: Instant) -> Vec<TalkAction> {
        self.state.downs.record(at);
        self.state.transmitting = true;
        debug!("Talk down");

        vec![TalkAction::ResumeMic, TalkAction::TalkLed(true)]
    }

    pub fn talk_up(&mut self, at: Instant) -> Vec<TalkAction> {
        self.state.ups.record(at);
        self.state.mic_latch = false;

        if is_double_tap(&self.state.downs, &self.state.ups) {
            self.state.mic_latch = true;
            self.state.downs.clear();
            info!("Microphone latched on");
            return Vec::new();
        }

        self.state.transmitting = false;
        debug!("Talk up");

        vec![TalkAction::PauseMic, TalkAction::TalkLed(false)]
    }

    /// Release a latched microphone as if the talk button went up
    pub fn unlatch(&mut self, at: Instant) -> Result<Vec<TalkAction>, InvalidState> {
        if !self.state.mic_latch {
            return Err(InvalidState("cannot unlatch, not latched".to_string()));
        }

        info!("Unlatching microphone");
        Ok(self.talk_up(at))
    }

    pub fn call_down(&mut self) -> Vec<TalkAction> {
        self.state.calling = true;
        info!("Call started");

        vec![TalkAction::CallLed(true), TalkAction::SendAlert(CALL_ALERT)]
    }

    pub fn call_up(&mut self) -> Vec<TalkAction> {
        self.state.calling = false;
        info!("Call ended");

        vec![
            TalkAction::CallLed(false),
            TalkAction::SendAlert(END_CALL_ALERT),
        ]
    }
}
