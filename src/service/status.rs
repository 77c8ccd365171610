use crate::audio::AudioSetup;
use crate::hardware::HardwareStatus;
use crate::health::{HealthInputs, HealthReport, StatusAggregator};
use crate::session::SessionStatus;
use crate::talk::TalkStatus;
use crate::voice::ChannelRef;
use serde::Serialize;

/// Everything the status surface reports, captured at one instant
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStatus {
    pub talk: TalkStatus,
    pub session: SessionStatus,
    pub hardware: HardwareStatus,
    pub audio: AudioSetup,
    pub health: HealthReport,
}

impl ServiceStatus {
    pub fn new(
        talk: TalkStatus,
        session: SessionStatus,
        hardware: HardwareStatus,
        audio: AudioSetup,
    ) -> Self {
        let health = StatusAggregator::evaluate(&HealthInputs {
            audio,
            hardware_ready: hardware.setup_done,
            connected: session.connected,
            connection_attempted: session.connection_attempted,
        });

        Self {
            talk,
            session,
            hardware,
            audio,
            health,
        }
    }
}

/// Result of a connect (and default-channel join) driven by the service
#[derive(Debug, Clone, Serialize)]
pub struct ConnectOutcome {
    pub connected: bool,
    /// Channel joined, when a default channel was configured and joined
    pub channel: Option<ChannelRef>,
    /// Why the connect or the join did not succeed
    pub error: Option<String>,
}
