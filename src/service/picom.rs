use super::command::{ServiceCommand, ServiceHandle};
use super::status::{ConnectOutcome, ServiceStatus};
use crate::audio::{AudioBackendFactory, AudioCapture, AudioFrame, AudioPlayback, AudioSetup};
use crate::config::{AudioConfig, Config};
use crate::error::{AudioSetupError, ConnectionError, JoinError};
use crate::hardware::{ButtonEvent, Hardware};
use crate::session::{SessionClient, SessionConfig, SessionEvent};
use crate::talk::{TalkAction, TalkController};
use crate::voice::VoiceConnector;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, error, info, warn};

const COMMAND_BUFFER: usize = 16;
const MIN_STATUS_POLL: Duration = Duration::from_millis(10);

/// Service-level settings taken from `Config`
#[derive(Debug, Clone)]
pub struct ServiceOptions {
    pub audio: AudioConfig,
    pub status_poll_interval: Duration,
}

impl From<&Config> for ServiceOptions {
    fn from(config: &Config) -> Self {
        Self {
            audio: config.audio.clone(),
            status_poll_interval: config.service.status_poll_interval(),
        }
    }
}

/// Wires hardware, talk control, audio and the voice session together
///
/// All inputs (commands, button edges, captured frames, session events and
/// the health tick) are handled one at a time by `run`. The session is
/// replaced wholesale on reconfiguration, disconnected first.
pub struct PiComService {
    options: ServiceOptions,
    connector: Arc<dyn VoiceConnector>,
    session: SessionClient,
    session_events: broadcast::Receiver<SessionEvent>,
    talk: TalkController,
    hardware: Arc<dyn Hardware>,
    buttons: mpsc::Receiver<ButtonEvent>,
    commands: mpsc::Receiver<ServiceCommand>,
    capture: Option<Box<dyn AudioCapture>>,
    capture_frames: Option<mpsc::Receiver<AudioFrame>>,
    playback: Option<Box<dyn AudioPlayback>>,
    audio: AudioSetup,
    status: watch::Sender<ServiceStatus>,
}

impl PiComService {
    pub fn new(
        options: ServiceOptions,
        session_config: SessionConfig,
        connector: Arc<dyn VoiceConnector>,
        hardware: Arc<dyn Hardware>,
        buttons: mpsc::Receiver<ButtonEvent>,
    ) -> (Self, ServiceHandle) {
        let (commands_tx, commands) = mpsc::channel(COMMAND_BUFFER);
        let session = SessionClient::new(session_config, Arc::clone(&connector));
        let session_events = session.subscribe();
        let talk = TalkController::new();

        let (status, status_rx) = watch::channel(ServiceStatus::new(
            talk.status(),
            session.status(),
            hardware.status(),
            AudioSetup::NotConfigured,
        ));

        let service = Self {
            options,
            connector,
            session,
            session_events,
            talk,
            hardware,
            buttons,
            commands,
            capture: None,
            capture_frames: None,
            playback: None,
            audio: AudioSetup::NotConfigured,
            status,
        };

        (service, ServiceHandle::new(commands_tx, status_rx))
    }

    /// Bring up hardware, the session and audio.
    ///
    /// Connection and join failures leave the service running degraded. Audio
    /// failures are returned unless `audio.ignore_errors` is set.
    pub async fn setup(&mut self) -> Result<(), AudioSetupError> {
        info!("Setting up PiCom service");

        if let Err(e) = self.hardware.setup() {
            error!("Hardware setup failed: {:#}", e);
        }

        self.connect_and_join().await;
        let audio = self.setup_audio().await;
        self.refresh_health();
        self.publish_status();
        audio
    }

    /// Process inputs until shutdown is requested or every handle is dropped
    pub async fn run(mut self) {
        let period = self.options.status_poll_interval.max(MIN_STATUS_POLL);
        let mut health_tick = tokio::time::interval(period);
        info!("PiCom service running");

        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(ServiceCommand::Shutdown) | None => break,
                    Some(command) => self.handle_command(command).await,
                },
                Some(event) = self.buttons.recv() => {
                    self.handle_button(event, Instant::now()).await;
                }
                Some(frame) = next_frame(&mut self.capture_frames) => {
                    self.forward_frame(frame).await;
                }
                event = self.session_events.recv() => self.handle_session_event(event).await,
                _ = health_tick.tick() => self.refresh_health(),
            }
            self.publish_status();
        }

        self.shutdown().await;
    }

    async fn handle_command(&mut self, command: ServiceCommand) {
        match command {
            ServiceCommand::Reconfigure { config, reply } => {
                let outcome = self.reconfigure(config).await;
                self.publish_status();
                let _ = reply.send(outcome);
            }
            ServiceCommand::Reconnect { reply } => {
                let config = self.session.config().clone();
                let outcome = self.reconfigure(config).await;
                self.publish_status();
                let _ = reply.send(outcome);
            }
            ServiceCommand::Unlatch { reply } => {
                let result = match self.talk.unlatch(Instant::now()) {
                    Ok(actions) => {
                        self.apply(actions).await;
                        Ok(())
                    }
                    Err(e) => Err(e),
                };
                self.publish_status();
                let _ = reply.send(result);
            }
            ServiceCommand::Shutdown => {}
        }
    }

    async fn handle_button(&mut self, event: ButtonEvent, at: Instant) {
        let actions = self.talk.handle(event, at);
        self.apply(actions).await;
    }

    async fn apply(&mut self, actions: Vec<TalkAction>) {
        for action in actions {
            match action {
                TalkAction::ResumeMic => {
                    if let Some(capture) = &self.capture {
                        capture.resume();
                    }
                }
                TalkAction::PauseMic => {
                    if let Some(capture) = &self.capture {
                        capture.pause();
                    }
                }
                TalkAction::TalkLed(on) => self.hardware.set_talk_led(on),
                TalkAction::CallLed(on) => self.hardware.set_call_led(on),
                TalkAction::SendAlert(text) => {
                    if let Err(e) = self.session.send_message_to_current_channel(text).await {
                        warn!("Could not send {:?} alert: {}", text, e);
                    }
                }
            }
        }
    }

    async fn forward_frame(&mut self, frame: AudioFrame) {
        if !self.talk.is_transmitting() {
            return;
        }
        match self.session.send_voice(&frame.to_pcm_bytes()).await {
            Ok(()) => {}
            Err(ConnectionError::NotConnected) => debug!("Dropping captured frame; not connected"),
            Err(e) => warn!("Failed to send voice: {}", e),
        }
    }

    async fn handle_session_event(&mut self, event: Result<SessionEvent, RecvError>) {
        match event {
            Ok(SessionEvent::Voice(voice)) => {
                if let Some(playback) = &mut self.playback {
                    let frame = AudioFrame::from_pcm_bytes(
                        &voice.pcm,
                        self.options.audio.sample_rate,
                        self.options.audio.channels,
                        0,
                    );
                    if let Err(e) = playback.play(&frame).await {
                        warn!("Playback failed: {:#}", e);
                    }
                }
            }
            Ok(SessionEvent::Message(message)) => {
                info!(
                    "[{:?}] {}: {}",
                    message.scope, message.sender, message.text
                );
            }
            Ok(SessionEvent::Error(reason)) => {
                error!("Voice session lost: {}", reason);
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!("Session events lagging; skipped {}", skipped);
            }
            Err(RecvError::Closed) => {
                self.session_events = self.session.subscribe();
            }
        }
    }

    async fn reconfigure(&mut self, config: SessionConfig) -> ConnectOutcome {
        info!(
            "Reconfiguring session: {} as {}",
            config.address(),
            config.username
        );

        self.session.disconnect().await;
        self.session = SessionClient::new(config, Arc::clone(&self.connector));
        self.session_events = self.session.subscribe();

        self.connect_and_join().await
    }

    async fn connect_and_join(&mut self) -> ConnectOutcome {
        if let Err(e) = self.session.connect().await {
            error!("Could not connect to voice server: {}", e);
            return ConnectOutcome {
                connected: false,
                channel: None,
                error: Some(e.to_string()),
            };
        }

        let Some(name) = self.session.config().default_channel.clone() else {
            return ConnectOutcome {
                connected: true,
                channel: None,
                error: None,
            };
        };

        match self.session.join_channel_by_name(&name).await {
            Ok(channel) => ConnectOutcome {
                connected: true,
                channel: Some(channel),
                error: None,
            },
            Err(e @ JoinError::NotFound(_)) => {
                warn!("Default channel unavailable, staying in root channel: {}", e);
                ConnectOutcome {
                    connected: true,
                    channel: None,
                    error: Some(e.to_string()),
                }
            }
            Err(e) => {
                error!("Failed to join default channel {}: {}", name, e);
                ConnectOutcome {
                    connected: true,
                    channel: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    async fn setup_audio(&mut self) -> Result<(), AudioSetupError> {
        if self.options.audio.disabled {
            warn!("Audio disabled by configuration");
            self.audio = AudioSetup::NotConfigured;
            return Ok(());
        }

        match self.open_audio().await {
            Ok(()) => {
                self.audio = AudioSetup::Configured;
                info!("Audio configured");
                Ok(())
            }
            Err(e) => {
                self.audio = AudioSetup::SetupError;
                if self.options.audio.ignore_errors {
                    warn!("Audio setup failed, continuing without audio: {:#}", e);
                    Ok(())
                } else {
                    Err(AudioSetupError(format!("{:#}", e)))
                }
            }
        }
    }

    async fn open_audio(&mut self) -> anyhow::Result<()> {
        let backend = self.options.audio.backend();
        let mut capture = AudioBackendFactory::capture(self.options.audio.source(), backend.clone())?;
        let playback = AudioBackendFactory::playback(self.options.audio.sink(), backend)?;

        let frames = capture.start().await?;
        if self.talk.is_transmitting() {
            capture.resume();
        } else {
            capture.pause();
        }

        info!(
            "Audio capture: {}, playback: {}",
            capture.name(),
            playback.name()
        );

        self.capture = Some(capture);
        self.capture_frames = Some(frames);
        self.playback = Some(playback);
        Ok(())
    }

    /// Evaluate health and drive the error indicator
    fn refresh_health(&self) {
        let report = self.snapshot().health;
        self.hardware.set_error_flasher(report.error_indicator());
    }

    fn snapshot(&self) -> ServiceStatus {
        ServiceStatus::new(
            self.talk.status(),
            self.session.status(),
            self.hardware.status(),
            self.audio,
        )
    }

    fn publish_status(&self) {
        self.status.send_replace(self.snapshot());
    }

    async fn shutdown(&mut self) {
        info!("Shutting down PiCom service");

        self.session.disconnect().await;

        if let Some(mut capture) = self.capture.take() {
            if let Err(e) = capture.stop().await {
                warn!("Failed to stop capture: {:#}", e);
            }
        }
        if let Some(mut playback) = self.playback.take() {
            if let Err(e) = playback.finish().await {
                warn!("Failed to finish playback: {:#}", e);
            }
        }

        self.hardware.set_talk_led(false);
        self.hardware.set_call_led(false);
        self.hardware.set_error_flasher(false);
        self.publish_status();
    }
}

async fn next_frame(frames: &mut Option<mpsc::Receiver<AudioFrame>>) -> Option<AudioFrame> {
    match frames {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
