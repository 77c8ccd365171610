use crate::error::JoinError;
use crate::voice::{ChannelRef, VoiceConnection};
use std::time::Duration;
use tracing::{debug, warn};

/// Polls of the current channel before a join is abandoned
pub const DEFAULT_JOIN_ATTEMPTS: u32 = 1000;

/// What the joiner needs from a session: issue a join, observe membership
#[async_trait::async_trait]
pub trait ChannelMembership: Send + Sync {
    async fn request_join(&self, channel: &ChannelRef) -> anyhow::Result<()>;

    async fn current_channel_id(&self) -> Option<u32>;
}

/// Membership view of a live voice connection
pub struct ConnectionMembership<'a>(pub &'a dyn VoiceConnection);

#[async_trait::async_trait]
impl ChannelMembership for ConnectionMembership<'_> {
    async fn request_join(&self, channel: &ChannelRef) -> anyhow::Result<()> {
        self.0.join(channel).await
    }

    async fn current_channel_id(&self) -> Option<u32> {
        self.0.current_channel().await.map(|channel| channel.id)
    }
}

/// Joins a channel and waits for the server to confirm the move
///
/// Confirmation arrives asynchronously, so after issuing the join the current
/// channel is polled until it matches. The budget counts polls, not wall-clock
/// time.
#[derive(Debug, Clone)]
pub struct ChannelJoiner {
    max_attempts: u32,
    poll_interval: Duration,
}

impl ChannelJoiner {
    pub fn new(max_attempts: u32, poll_interval: Duration) -> Self {
        Self {
            max_attempts,
            poll_interval,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Join `target`, the result of looking up `key`.
    ///
    /// `key` is only used in errors and logs.
    pub async fn join(
        &self,
        membership: &dyn ChannelMembership,
        target: Option<ChannelRef>,
        key: &str,
    ) -> Result<ChannelRef, JoinError> {
        let Some(channel) = target else {
            return Err(JoinError::NotFound(key.to_string()));
        };

        membership
            .request_join(&channel)
            .await
            .map_err(|e| JoinError::Request {
                channel: key.to_string(),
                reason: e.to_string(),
            })?;

        for attempt in 1..=self.max_attempts {
            if membership.current_channel_id().await == Some(channel.id) {
                debug!(
                    "Joined channel {} ({}) after {} polls",
                    channel.name, channel.id, attempt
                );
                return Ok(channel);
            }
            self.pause().await;
        }

        warn!(
            "Join of channel {} not confirmed after {} polls",
            key, self.max_attempts
        );

        Err(JoinError::Timeout {
            channel: key.to_string(),
            attempts: self.max_attempts,
        })
    }

    async fn pause(&self) {
        if self.poll_interval.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

impl Default for ChannelJoiner {
    fn default() -> Self {
        Self::new(DEFAULT_JOIN_ATTEMPTS, Duration::ZERO)
    }
}
