use picom::audio::AudioSetup;
use picom::health::{HealthInputs, Severity, StatusAggregator};

fn inputs(audio: AudioSetup, hardware: bool, connected: bool, attempted: bool) -> HealthInputs {
    HealthInputs {
        audio,
        hardware_ready: hardware,
        connected,
        connection_attempted: attempted,
    }
}

#[test]
fn test_all_good_is_normal() {
    let report = StatusAggregator::evaluate(&inputs(AudioSetup::Configured, true, true, true));

    assert_eq!(report.status, Severity::Normal);
    assert!(report.messages.is_empty());
    assert!(!report.error_indicator());
}

#[test]
fn test_fresh_start_warns_twice() {
    let report = StatusAggregator::evaluate(&inputs(AudioSetup::NotConfigured, true, false, false));

    assert_eq!(report.status, Severity::Warning);
    let messages: Vec<_> = report.messages.iter().map(|m| m.message.as_str()).collect();
    assert_eq!(messages, vec!["Audio Not Setup", "Connection Not Attempted"]);
    assert!(report.messages.iter().all(|m| m.severity == Severity::Warning));
    assert!(!report.error_indicator());
}

#[test]
fn test_failed_connection_is_error() {
    let report = StatusAggregator::evaluate(&inputs(AudioSetup::Configured, true, false, true));

    assert_eq!(report.status, Severity::Error);
    assert_eq!(report.messages.len(), 1);
    assert_eq!(report.messages[0].message, "Not Connected");
    assert!(report.error_indicator());
}

#[test]
fn test_audio_error_dominates_warnings() {
    let report = StatusAggregator::evaluate(&inputs(AudioSetup::SetupError, false, true, true));

    assert_eq!(report.status, Severity::Error);
    let messages: Vec<_> = report
        .messages
        .iter()
        .map(|m| (m.message.as_str(), m.severity))
        .collect();
    assert_eq!(
        messages,
        vec![
            ("Audio Error", Severity::Error),
            ("Hardware Not Setup", Severity::Warning),
        ]
    );
}

#[test]
fn test_report_serializes_uppercase_severity() {
    let report = StatusAggregator::evaluate(&inputs(AudioSetup::NotConfigured, true, true, true));
    let json = serde_json::to_string(&report).unwrap();

    assert!(json.contains("\"status\":\"WARNING\""));
    assert!(json.contains("Audio Not Setup"));
}

#[test]
fn test_audio_error_and_lost_connection() {
    let report = StatusAggregator::evaluate(&inputs(AudioSetup::SetupError, true, false, true));

    assert_eq!(report.status, Severity::Error);
    assert_eq!(report.messages.len(), 2);
    assert!(report.messages.iter().all(|m| m.severity == Severity::Error));
}
