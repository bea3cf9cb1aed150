//! Robot-side command channel.
//!
//! Same connection lifecycle as the ingest channels with send and receive
//! inverted: connect, announce with a hello handshake, then serve commands
//! until the transport fails, and reconnect forever. The loop has no terminal
//! state other than shutdown via its cancellation token.

use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use super::backoff::Backoff;
use crate::config::RobotConfig;
use crate::protocol::{Ack, Action, Command, Hello};
use crate::transport::{Conduit, Connector, WireMessage};

/// External actuation hook invoked once per received command.
///
/// The channel fires and forgets: it does not interpret the handler's effect,
/// and it acknowledges the command regardless of what the handler did.
#[async_trait::async_trait]
pub trait CommandHandler: Send + Sync + 'static {
    /// Act on one command. `action` is `None` for unknown or missing actions.
    async fn handle(&self, action: Option<Action>, speed: Option<u8>);
}

/// Running command channel, cancelled on drop of the final handle.
pub struct RobotHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl RobotHandle {
    /// Signal shutdown and wait for the loop to finish.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        let _ = self.task.await;
    }

    /// Token observed by the command loop.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

/// Receive/acknowledge loop for one controlled device.
pub struct CommandChannel {
    robot_id: String,
    url: Url,
    connector: Arc<dyn Connector>,
    handler: Arc<dyn CommandHandler>,
    backoff: Backoff,
    cancel: CancellationToken,
}

impl CommandChannel {
    /// Spawn the command loop for the given configuration.
    pub fn spawn(
        config: RobotConfig,
        connector: Arc<dyn Connector>,
        handler: Arc<dyn CommandHandler>,
    ) -> RobotHandle {
        let cancel = CancellationToken::new();
        let channel = CommandChannel {
            robot_id: config.robot_id.clone(),
            url: config.robot_url(),
            connector,
            handler,
            backoff: Backoff::new(config.reconnect),
            cancel: cancel.clone(),
        };
        let task = tokio::spawn(channel.run());
        RobotHandle { cancel, task }
    }

    /// Connect-serve-reconnect loop. Returns only on cancellation.
    async fn run(mut self) {
        info!("Command channel started for robot '{}'", self.robot_id);

        loop {
            if self.cancel.is_cancelled() {
                break;
            }

            let opened = tokio::select! {
                _ = self.cancel.cancelled() => break,
                result = self.connector.open(&self.url) => result,
            };

            match opened {
                Ok(conduit) => {
                    self.backoff.reset();
                    info!("Robot '{}' online", self.robot_id);
                    self.serve(conduit).await;
                    if self.cancel.is_cancelled() {
                        break;
                    }
                    warn!("Robot '{}' connection lost", self.robot_id);
                }
                Err(e) => {
                    debug!("Robot '{}' connect failed: {}", self.robot_id, e);
                }
            }

            let delay = self.backoff.next_delay();
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = sleep(delay) => {}
            }
        }

        info!("Command channel ended for robot '{}'", self.robot_id);
    }

    /// Serve one connection until it fails, the peer closes, or shutdown.
    async fn serve(&mut self, mut conduit: Box<dyn Conduit>) {
        let hello = Hello::new(&self.robot_id);
        if conduit.send(WireMessage::Text(hello.to_json())).await.is_err() {
            conduit.close().await;
            return;
        }

        loop {
            let received = tokio::select! {
                _ = self.cancel.cancelled() => break,
                msg = conduit.recv() => msg,
            };

            let raw = match received {
                Ok(Some(WireMessage::Text(raw))) => raw,
                // Binary input is not a command; treat it like malformed
                // text so the loop keeps going and the sender still gets
                // an acknowledgment.
                Ok(Some(WireMessage::Binary(_))) => String::new(),
                Ok(None) => {
                    debug!("Robot '{}' peer closed", self.robot_id);
                    break;
                }
                Err(e) => {
                    debug!("Robot '{}' receive failed: {}", self.robot_id, e);
                    break;
                }
            };

            let command = Command::parse(&raw);
            debug!(
                "Robot '{}' command: action={:?} speed={:?}",
                self.robot_id,
                command.action,
                command.speed()
            );

            self.handler.handle(command.action(), command.speed()).await;

            let ack = Ack::for_action(command.action.clone());
            if conduit.send(WireMessage::Text(ack.to_json())).await.is_err() {
                debug!("Robot '{}' ack send failed", self.robot_id);
                break;
            }
        }

        conduit.close().await;
    }
}
