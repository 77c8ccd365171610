// Push-to-talk controller behaviour: transmit actions, double-tap latch,
// unlatch and call alerts.

use picom::hardware::{Button, ButtonEvent, Edge};
use picom::talk::{TalkAction, TalkController, CALL_ALERT, END_CALL_ALERT};
use std::time::{Duration, Instant};

fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

/// Press and release talk once, holding for `hold`
fn tap(controller: &mut TalkController, at: Instant, hold: Duration) -> Vec<TalkAction> {
    controller.talk_down(at);
    controller.talk_up(at + hold)
}

#[test]
fn test_talk_down_starts_transmitting() {
    let mut controller = TalkController::new();

    let actions = controller.talk_down(Instant::now());

    assert_eq!(actions, vec![TalkAction::ResumeMic, TalkAction::TalkLed(true)]);
    assert!(controller.is_transmitting());
    assert!(!controller.is_latched());
}

#[test]
fn test_single_press_release_stops_transmitting() {
    let mut controller = TalkController::new();
    let t0 = Instant::now();

    let actions = tap(&mut controller, t0, ms(2000));

    assert_eq!(actions, vec![TalkAction::PauseMic, TalkAction::TalkLed(false)]);
    assert!(!controller.is_transmitting());
    assert!(!controller.is_latched());
}

#[test]
fn test_double_tap_latches() {
    let mut controller = TalkController::new();
    let t0 = Instant::now();

    tap(&mut controller, t0, ms(100));
    controller.talk_down(t0 + ms(300));
    let actions = controller.talk_up(t0 + ms(400));

    assert!(actions.is_empty(), "latched release must not pause the mic");
    assert!(controller.is_latched());
    assert!(controller.is_transmitting());
}

#[test]
fn test_slow_first_tap_does_not_latch() {
    let mut controller = TalkController::new();
    let t0 = Instant::now();

    tap(&mut controller, t0, ms(501));
    controller.talk_down(t0 + ms(600));
    let actions = controller.talk_up(t0 + ms(700));

    assert_eq!(actions, vec![TalkAction::PauseMic, TalkAction::TalkLed(false)]);
    assert!(!controller.is_latched());
    assert!(!controller.is_transmitting());
}

#[test]
fn test_slow_second_tap_does_not_latch() {
    let mut controller = TalkController::new();
    let t0 = Instant::now();

    tap(&mut controller, t0, ms(100));
    controller.talk_down(t0 + ms(200));
    controller.talk_up(t0 + ms(701));

    assert!(!controller.is_latched());
    assert!(!controller.is_transmitting());
}

#[test]
fn test_wide_gap_does_not_latch() {
    let mut controller = TalkController::new();
    let t0 = Instant::now();

    tap(&mut controller, t0, ms(100));
    tap(&mut controller, t0 + ms(751), ms(100));

    assert!(!controller.is_latched());
}

#[test]
fn test_window_edges_latch() {
    let mut controller = TalkController::new();
    let t0 = Instant::now();

    tap(&mut controller, t0, ms(500));
    tap(&mut controller, t0 + ms(750), ms(500));

    assert!(controller.is_latched());
}

#[test]
fn test_release_after_latch_unwinds() {
    let mut controller = TalkController::new();
    let t0 = Instant::now();

    tap(&mut controller, t0, ms(100));
    tap(&mut controller, t0 + ms(300), ms(100));
    assert!(controller.is_latched());

    // Down history was cleared on latch, so this cycle cannot re-latch
    controller.talk_down(t0 + ms(5000));
    let actions = controller.talk_up(t0 + ms(5100));

    assert_eq!(actions, vec![TalkAction::PauseMic, TalkAction::TalkLed(false)]);
    assert!(!controller.is_latched());
    assert!(!controller.is_transmitting());
}

#[test]
fn test_unlatch_when_latched_behaves_like_release() {
    let mut controller = TalkController::new();
    let t0 = Instant::now();

    tap(&mut controller, t0, ms(100));
    tap(&mut controller, t0 + ms(300), ms(100));

    let actions = controller.unlatch(t0 + ms(3000)).unwrap();

    assert_eq!(actions, vec![TalkAction::PauseMic, TalkAction::TalkLed(false)]);
    assert!(!controller.is_latched());
    assert!(!controller.is_transmitting());
}

#[test]
fn test_unlatch_when_not_latched_is_rejected() {
    let mut controller = TalkController::new();
    controller.talk_down(Instant::now());

    let err = controller.unlatch(Instant::now()).unwrap_err();

    assert!(err.to_string().contains("not latched"));
    assert!(controller.is_transmitting(), "rejected unlatch must not touch transmit state");
}

#[test]
fn test_call_button_sends_alerts() {
    let mut controller = TalkController::new();

    let down = controller.handle(ButtonEvent::new(Button::Call, Edge::Down), Instant::now());
    assert_eq!(
        down,
        vec![TalkAction::CallLed(true), TalkAction::SendAlert(CALL_ALERT)]
    );
    assert!(controller.status().calling);

    let up = controller.handle(ButtonEvent::new(Button::Call, Edge::Up), Instant::now());
    assert_eq!(
        up,
        vec![TalkAction::CallLed(false), TalkAction::SendAlert(END_CALL_ALERT)]
    );
    assert!(!controller.status().calling);
}

#[test]
fn test_call_does_not_affect_transmit() {
    let mut controller = TalkController::new();
    let t0 = Instant::now();

    controller.handle(ButtonEvent::new(Button::Talk, Edge::Down), t0);
    controller.handle(ButtonEvent::new(Button::Call, Edge::Down), t0 + ms(10));
    controller.handle(ButtonEvent::new(Button::Call, Edge::Up), t0 + ms(20));

    assert!(controller.is_transmitting());
}
