use super::{Button, ButtonEvent, Edge, Hardware, HardwareStatus};
use anyhow::{Context, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Software stand-in for the button/LED board
///
/// Edges are injected with `press` (the HTTP surface does this) and LED levels
/// are kept in memory and logged.
pub struct VirtualPanel {
    setup_done: AtomicBool,
    talk_led: AtomicBool,
    call_led: AtomicBool,
    error_flasher: AtomicBool,
    events: mpsc::Sender<ButtonEvent>,
}

impl VirtualPanel {
    /// Create the panel and the receiver its button edges arrive on
    pub fn new(buffer: usize) -> (Arc<Self>, mpsc::Receiver<ButtonEvent>) {
        let (events, rx) = mpsc::channel(buffer);
        let panel = Arc::new(Self {
            setup_done: AtomicBool::new(false),
            talk_led: AtomicBool::new(false),
            call_led: AtomicBool::new(false),
            error_flasher: AtomicBool::new(false),
            events,
        });
        (panel, rx)
    }

    /// Inject a button edge
    pub async fn press(&self, button: Button, edge: Edge) -> Result<()> {
        debug!("Virtual panel: {:?} {:?}", button, edge);
        self.events
            .send(ButtonEvent::new(button, edge))
            .await
            .context("Button event receiver closed")
    }
}

impl Hardware for VirtualPanel {
    fn setup(&self) -> Result<()> {
        self.setup_done.store(true, Ordering::SeqCst);
        info!("Virtual panel ready");
        Ok(())
    }

    fn set_talk_led(&self, on: bool) {
        if self.talk_led.swap(on, Ordering::SeqCst) != on {
            info!("Talk LED {}", if on { "on" } else { "off" });
        }
    }

    fn set_call_led(&self, on: bool) {
        if self.call_led.swap(on, Ordering::SeqCst) != on {
            info!("Call LED {}", if on { "on" } else { "off" });
        }
    }

    fn set_error_flasher(&self, on: bool) {
        if self.error_flasher.swap(on, Ordering::SeqCst) != on {
            info!("Error flasher {}", if on { "on" } else { "off" });
        }
    }

    fn status(&self) -> HardwareStatus {
        HardwareStatus {
            setup_done: self.setup_done.load(Ordering::SeqCst),
            talk_led: self.talk_led.load(Ordering::SeqCst),
            call_led: self.call_led.load(Ordering::SeqCst),
            error_flasher: self.error_flasher.load(Ordering::SeqCst),
        }
    }
}
