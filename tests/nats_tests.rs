use base64::Engine;
use picom::audio::AudioFrame;
use picom::nats::messages::{
    direct_subject, text_subject, voice_subject, AuthReply, AuthRequest, JoinReply, TextPacket,
    VoicePacket,
};

#[test]
fn test_subjects() {
    assert_eq!(voice_subject(3), "picom.voice.3");
    assert_eq!(text_subject(3), "picom.text.3");
    assert_eq!(direct_subject("stage-left"), "picom.text.user.stage-left");
}

#[test]
fn test_auth_request_serialization() {
    let msg = AuthRequest {
        session_id: "abc".to_string(),
        username: "stage-left".to_string(),
        client: "picom/0.1.0".to_string(),
    };

    let json = serde_json::to_string(&msg).unwrap();
    assert!(json.contains("\"username\":\"stage-left\""));
    assert!(json.contains("\"session_id\":\"abc\""));
}

#[test]
fn test_auth_reply_with_directory() {
    let json = r#"{
        "accepted": true,
        "root_channel": {"id": 0, "name": "Root"},
        "channels": [{"id": 1, "name": "Stage"}, {"id": 2, "name": "Booth"}]
    }"#;

    let reply: AuthReply = serde_json::from_str(json).unwrap();
    assert!(reply.accepted);
    assert_eq!(reply.reason, None);
    assert_eq!(reply.root_channel.name, "Root");
    assert_eq!(reply.channels.len(), 2);
    assert_eq!(reply.channels[1].id, 2);
}

#[test]
fn test_auth_reply_rejected() {
    let json = r#"{
        "accepted": false,
        "reason": "unknown certificate",
        "root_channel": {"id": 0, "name": "Root"}
    }"#;

    let reply: AuthReply = serde_json::from_str(json).unwrap();
    assert!(!reply.accepted);
    assert_eq!(reply.reason.as_deref(), Some("unknown certificate"));
    assert!(reply.channels.is_empty());
}

#[test]
fn test_join_reply_defaults() {
    let reply: JoinReply = serde_json::from_str(r#"{"channel_id": 4, "accepted": true}"#).unwrap();
    assert_eq!(reply.channel_id, 4);
    assert!(reply.accepted);
    assert!(reply.reason.is_none());
}

#[test]
fn test_text_packet() {
    let json = r#"{
        "session_id": "abc",
        "sender": "booth",
        "text": "CALLING",
        "timestamp": "2025-10-27T14:30:05Z"
    }"#;

    let msg: TextPacket = serde_json::from_str(json).unwrap();
    assert_eq!(msg.sender, "booth");
    assert_eq!(msg.text, "CALLING");
}

#[test]
fn test_voice_packet_carries_frame_pcm() {
    let frame = AudioFrame {
        samples: vec![100, -200, 300, -400],
        sample_rate: 48000,
        channels: 1,
        timestamp_ms: 0,
    };

    let msg = VoicePacket {
        session_id: "abc".to_string(),
        sender: "stage-left".to_string(),
        sequence: 7,
        pcm: base64::engine::general_purpose::STANDARD.encode(frame.to_pcm_bytes()),
        timestamp: "2025-10-27T14:30:00Z".to_string(),
    };

    let json = serde_json::to_string(&msg).unwrap();
    let deserialized: VoicePacket = serde_json::from_str(&json).unwrap();
    assert_eq!(deserialized.sequence, 7);

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(&deserialized.pcm)
        .unwrap();
    let decoded = AudioFrame::from_pcm_bytes(&bytes, 48000, 1, 0);
    assert_eq!(decoded.samples, frame.samples);
}
