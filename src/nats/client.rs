use super::messages::{
    direct_subject, text_subject, voice_subject, AuthReply, AuthRequest, JoinReply, JoinRequest,
    LeaveNotice, TextPacket, VoicePacket, SUBJECT_AUTH, SUBJECT_JOIN, SUBJECT_LEAVE,
};
use crate::session::SessionConfig;
use crate::voice::{
    ChannelRef, MessageScope, TextMessage, VoiceConnection, VoiceConnector, VoiceEvent, VoiceFrame,
};
use anyhow::{bail, Context, Result};
use async_nats::Client;
use base64::Engine;
use futures::stream::StreamExt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

const EVENT_BUFFER: usize = 256;

/// Voice transport over NATS subjects
pub struct NatsConnector;

#[async_trait::async_trait]
impl VoiceConnector for NatsConnector {
    async fn connect(&self, config: &SessionConfig) -> Result<Box<dyn VoiceConnection>> {
        let url = format!("nats://{}", config.address());
        info!("Connecting to NATS at {}", url);

        let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);
        let callback_tx = events_tx.clone();

        let mut options = async_nats::ConnectOptions::new()
            .name("picom")
            .event_callback(move |event| {
                let tx = callback_tx.clone();
                async move {
                    match event {
                        async_nats::Event::Disconnected => {
                            let _ = tx
                                .send(VoiceEvent::Error("server connection lost".to_string()))
                                .await;
                        }
                        async_nats::Event::ClientError(e) => {
                            let _ = tx.send(VoiceEvent::Error(e.to_string())).await;
                        }
                        other => debug!("NATS event: {:?}", other),
                    }
                }
            });

        if let (Some(cert), Some(key)) = (&config.cert, &config.key) {
            options = options
                .add_client_certificate(cert.clone(), key.clone())
                .require_tls(true);
        }

        let client = options
            .connect(url.as_str())
            .await
            .context("Failed to connect to NATS")?;

        info!("Connected to NATS successfully");

        Ok(Box::new(NatsConnection {
            shared: Arc::new(NatsShared {
                client,
                session_id: uuid::Uuid::new_v4().to_string(),
                username: RwLock::new(String::new()),
                events: events_tx,
                directory: RwLock::new(Vec::new()),
                current: RwLock::new(None),
                channel_tasks: Mutex::new(Vec::new()),
                background: Mutex::new(Vec::new()),
                sequence: AtomicU32::new(0),
            }),
            events_rx: Some(events_rx),
        }))
    }

    fn name(&self) -> &str {
        "nats"
    }
}

struct NatsShared {
    client: Client,
    session_id: String,
    username: RwLock<String>,
    events: mpsc::Sender<VoiceEvent>,
    directory: RwLock<Vec<ChannelRef>>,
    current: RwLock<Option<ChannelRef>>,
    /// Subscriptions for the current channel
    channel_tasks: Mutex<Vec<JoinHandle<()>>>,
    /// Handshake, join and direct-message tasks
    background: Mutex<Vec<JoinHandle<()>>>,
    sequence: AtomicU32,
}

impl NatsShared {
    async fn emit(&self, event: VoiceEvent) {
        if self.events.send(event).await.is_err() {
            debug!("Voice event dropped; nobody is listening");
        }
    }

    async fn handshake(self: Arc<Self>, username: String) {
        let request = AuthRequest {
            session_id: self.session_id.clone(),
            username: username.clone(),
            client: format!("picom/{}", env!("CARGO_PKG_VERSION")),
        };

        let reply = match self.request::<_, AuthReply>(SUBJECT_AUTH, &request).await {
            Ok(reply) => reply,
            Err(e) => {
                self.emit(VoiceEvent::Error(format!("{:#}", e))).await;
                return;
            }
        };

        if !reply.accepted {
            let reason = reply
                .reason
                .unwrap_or_else(|| "authentication rejected".to_string());
            self.emit(VoiceEvent::Error(reason)).await;
            return;
        }

        {
            let mut directory = self.directory.write().await;
            *directory = reply.channels;
            if !directory.iter().any(|c| c.id == reply.root_channel.id) {
                directory.push(reply.root_channel.clone());
            }
        }

        if let Err(e) = Arc::clone(&self).listen_direct(&username).await {
            self.emit(VoiceEvent::Error(format!("{:#}", e))).await;
            return;
        }
        if let Err(e) = Arc::clone(&self).enter_channel(reply.root_channel).await {
            self.emit(VoiceEvent::Error(format!("{:#}", e))).await;
            return;
        }

        self.emit(VoiceEvent::Ready).await;
    }

    async fn confirm_join(self: Arc<Self>, channel: ChannelRef) {
        let request = JoinRequest {
            session_id: self.session_id.clone(),
            channel_id: channel.id,
        };

        match self.request::<_, JoinReply>(SUBJECT_JOIN, &request).await {
            Ok(reply) if reply.accepted && reply.channel_id == channel.id => {
                if let Err(e) = Arc::clone(&self).enter_channel(channel).await {
                    error!("Failed to subscribe to joined channel: {:#}", e);
                }
            }
            Ok(reply) => warn!(
                "Join of channel {} refused: {}",
                channel.name,
                reply.reason.unwrap_or_else(|| "no reason given".to_string())
            ),
            Err(e) => warn!("Join request for channel {} failed: {:#}", channel.name, e),
        }
    }

    async fn enter_channel(self: Arc<Self>, channel: ChannelRef) -> Result<()> {
        let mut voice = self
            .client
            .subscribe(voice_subject(channel.id))
            .await
            .context("Failed to subscribe to channel voice")?;
        let mut text = self
            .client
            .subscribe(text_subject(channel.id))
            .await
            .context("Failed to subscribe to channel text")?;

        let voice_shared = Arc::clone(&self);
        let voice_task = tokio::spawn(async move {
            while let Some(msg) = voice.next().await {
                match serde_json::from_slice::<VoicePacket>(&msg.payload) {
                    Ok(packet) if packet.session_id == voice_shared.session_id => {}
                    Ok(packet) => {
                        match base64::engine::general_purpose::STANDARD.decode(&packet.pcm) {
                            Ok(pcm) => {
                                voice_shared
                                    .emit(VoiceEvent::Voice(VoiceFrame {
                                        sender: packet.sender,
                                        sequence: packet.sequence,
                                        pcm,
                                    }))
                                    .await
                            }
                            Err(e) => warn!("Dropping voice packet with bad PCM: {}", e),
                        }
                    }
                    Err(e) => warn!("Failed to parse voice packet: {}", e),
                }
            }
        });

        let text_shared = Arc::clone(&self);
        let text_task = tokio::spawn(async move {
            while let Some(msg) = text.next().await {
                match serde_json::from_slice::<TextPacket>(&msg.payload) {
                    Ok(packet) if packet.session_id == text_shared.session_id => {}
                    Ok(packet) => {
                        text_shared
                            .emit(VoiceEvent::Message(TextMessage {
                                text: packet.text,
                                sender: packet.sender,
                                scope: MessageScope::Channel,
                            }))
                            .await
                    }
                    Err(e) => warn!("Failed to parse text packet: {}", e),
                }
            }
        });

        {
            let mut tasks = self.channel_tasks.lock().await;
            for task in tasks.drain(..) {
                task.abort();
            }
            tasks.push(voice_task);
            tasks.push(text_task);
        }

        *self.current.write().await = Some(channel.clone());
        self.emit(VoiceEvent::ChannelChanged(channel)).await;

        Ok(())
    }

    async fn listen_direct(self: Arc<Self>, username: &str) -> Result<()> {
        let mut direct = self
            .client
            .subscribe(direct_subject(username))
            .await
            .context("Failed to subscribe to direct messages")?;

        let shared = Arc::clone(&self);
        let task = tokio::spawn(async move {
            while let Some(msg) = direct.next().await {
                match serde_json::from_slice::<TextPacket>(&msg.payload) {
                    Ok(packet) => {
                        shared
                            .emit(VoiceEvent::Message(TextMessage {
                                text: packet.text,
                                sender: packet.sender,
                                scope: MessageScope::Direct,
                            }))
                            .await
                    }
                    Err(e) => warn!("Failed to parse direct message: {}", e),
                }
            }
        });
        self.background.lock().await.push(task);

        Ok(())
    }

    async fn request<Req, Rep>(&self, subject: &str, request: &Req) -> Result<Rep>
    where
        Req: serde::Serialize,
        Rep: serde::de::DeserializeOwned,
    {
        let payload = serde_json::to_vec(request)?;
        let message = self
            .client
            .request(subject.to_string(), payload.into())
            .await
            .with_context(|| format!("Request on {} failed", subject))?;
        serde_json::from_slice(&message.payload)
            .with_context(|| format!("Malformed reply on {}", subject))
    }

    async fn publish<T: serde::Serialize>(&self, subject: String, message: &T) -> Result<()> {
        let payload = serde_json::to_vec(message)?;
        self.client
            .publish(subject.clone(), payload.into())
            .await
            .with_context(|| format!("Failed to publish to {}", subject))
    }
}

struct NatsConnection {
    shared: Arc<NatsShared>,
    events_rx: Option<mpsc::Receiver<VoiceEvent>>,
}

#[async_trait::async_trait]
impl VoiceConnection for NatsConnection {
    fn take_events(&mut self) -> Option<mpsc::Receiver<VoiceEvent>> {
        self.events_rx.take()
    }

    async fn authenticate(&self, username: &str) -> Result<()> {
        *self.shared.username.write().await = username.to_string();
        let task = tokio::spawn(Arc::clone(&self.shared).handshake(username.to_string()));
        self.shared.background.lock().await.push(task);
        Ok(())
    }

    async fn channel_by_name(&self, name: &str) -> Option<ChannelRef> {
        let directory = self.shared.directory.read().await;
        directory.iter().find(|c| c.name == name).cloned()
    }

    async fn channel_by_id(&self, id: u32) -> Option<ChannelRef> {
        let directory = self.shared.directory.read().await;
        directory.iter().find(|c| c.id == id).cloned()
    }

    async fn current_channel(&self) -> Option<ChannelRef> {
        self.shared.current.read().await.clone()
    }

    async fn join(&self, channel: &ChannelRef) -> Result<()> {
        let task = tokio::spawn(Arc::clone(&self.shared).confirm_join(channel.clone()));
        self.shared.background.lock().await.push(task);
        Ok(())
    }

    async fn send_message(&self, channel: &ChannelRef, text: &str) -> Result<()> {
        let packet = TextPacket {
            session_id: self.shared.session_id.clone(),
            sender: self.shared.username.read().await.clone(),
            text: text.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };
        self.shared.publish(text_subject(channel.id), &packet).await
    }

    async fn send_voice(&self, pcm: &[u8]) -> Result<()> {
        let Some(channel) = self.current_channel().await else {
            bail!("Not in a channel");
        };

        let packet = VoicePacket {
            session_id: self.shared.session_id.clone(),
            sender: self.shared.username.read().await.clone(),
            sequence: self.shared.sequence.fetch_add(1, Ordering::SeqCst),
            pcm: base64::engine::general_purpose::STANDARD.encode(pcm),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };
        self.shared.publish(voice_subject(channel.id), &packet).await
    }

    async fn disconnect(&self) -> Result<()> {
        info!("Closing NATS connection");

        for task in self.shared.channel_tasks.lock().await.drain(..) {
            task.abort();
        }
        for task in self.shared.background.lock().await.drain(..) {
            task.abort();
        }

        let notice = LeaveNotice {
            session_id: self.shared.session_id.clone(),
        };
        self.shared
            .publish(SUBJECT_LEAVE.to_string(), &notice)
            .await?;
        self.shared
            .client
            .flush()
            .await
            .context("Failed to flush NATS connection")?;

        // async-nats closes the socket once the last client handle is dropped
        Ok(())
    }
}
