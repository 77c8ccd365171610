//! Health aggregation
//!
//! Reduces audio, hardware and session state into one severity. Nothing is
//! stored; every report is computed from the inputs it is given.

use crate::audio::AudioSetup;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Normal,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthMessage {
    pub message: String,
    pub severity: Severity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub status: Severity,
    pub messages: Vec<HealthMessage>,
}

impl HealthReport {
    /// Whether the error indicator should be driven
    pub fn error_indicator(&self) -> bool {
        self.status == Severity::Error
    }
}

/// Sub-component states the aggregator looks at
#[derive(Debug, Clone, Copy)]
pub struct HealthInputs {
    pub audio: AudioSetup,
    pub hardware_ready: bool,
    pub connected: bool,
    pub connection_attempted: bool,
}

pub struct StatusAggregator;

impl StatusAggregator {
    pub fn evaluate(inputs: &HealthInputs) -> HealthReport {
        let mut messages = Vec::new();
        let mut push = |message: &str, severity: Severity| {
            messages.push(HealthMessage {
                message: message.to_string(),
                severity,
            })
        };

        match inputs.audio {
            AudioSetup::NotConfigured => push("Audio Not Setup", Severity::Warning),
            AudioSetup::SetupError => push("Audio Error", Severity::Error),
            AudioSetup::Configured => {}
        }

        if !inputs.hardware_ready {
            push("Hardware Not Setup", Severity::Warning);
        }

        if !inputs.connected {
            if inputs.connection_attempted {
                push("Not Connected", Severity::Error);
            } else {
                push("Connection Not Attempted", Severity::Warning);
            }
        }

        let status = messages
            .iter()
            .map(|m| m.severity)
            .max()
            .unwrap_or(Severity::Normal);

        HealthReport { status, messages }
    }
}
