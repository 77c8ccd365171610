use super::status::{ConnectOutcome, ServiceStatus};
use crate::error::InvalidState;
use crate::session::SessionConfig;
use anyhow::{anyhow, Context, Result};
use tokio::sync::{mpsc, oneshot, watch};

/// Requests serialized through the service event loop
#[derive(Debug)]
pub enum ServiceCommand {
    /// Replace the session with one built from `config`
    Reconfigure {
        config: SessionConfig,
        reply: oneshot::Sender<ConnectOutcome>,
    },
    /// Replace the session with a fresh one using the current configuration
    Reconnect {
        reply: oneshot::Sender<ConnectOutcome>,
    },
    Unlatch {
        reply: oneshot::Sender<Result<(), InvalidState>>,
    },
    Shutdown,
}

/// Cloneable access to a running `PiComService`
#[derive(Clone)]
pub struct ServiceHandle {
    commands: mpsc::Sender<ServiceCommand>,
    status: watch::Receiver<ServiceStatus>,
}

impl ServiceHandle {
    pub(crate) fn new(
        commands: mpsc::Sender<ServiceCommand>,
        status: watch::Receiver<ServiceStatus>,
    ) -> Self {
        Self { commands, status }
    }

    /// Latest published status snapshot
    pub fn status(&self) -> ServiceStatus {
        self.status.borrow().clone()
    }

    pub fn watch_status(&self) -> watch::Receiver<ServiceStatus> {
        self.status.clone()
    }

    pub async fn reconfigure(&self, config: SessionConfig) -> Result<ConnectOutcome> {
        let (reply, rx) = oneshot::channel();
        self.send(ServiceCommand::Reconfigure { config, reply })
            .await?;
        rx.await.context("Service dropped the reconfigure reply")
    }

    pub async fn reconnect(&self) -> Result<ConnectOutcome> {
        let (reply, rx) = oneshot::channel();
        self.send(ServiceCommand::Reconnect { reply }).await?;
        rx.await.context("Service dropped the reconnect reply")
    }

    /// Release a latched microphone. Fails with `InvalidState` (inside the
    /// `anyhow::Error`) when nothing is latched.
    pub async fn unlatch(&self) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(ServiceCommand::Unlatch { reply }).await?;
        rx.await.context("Service dropped the unlatch reply")??;
        Ok(())
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.send(ServiceCommand::Shutdown).await
    }

    async fn send(&self, command: ServiceCommand) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| anyhow!("Service is not running"))
    }
}
