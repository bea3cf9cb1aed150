//! Per-stream delivery channel.
//!
//! Each logical stream owns one `StreamChannel`: one optional live
//! connection, one reconnect schedule, one send in flight at a time. The
//! channel is driven from a single task, so none of its state is ever
//! touched from two places at once.

use std::sync::Arc;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use url::Url;

use super::backoff::{Backoff, ReconnectPolicy};
use crate::transport::{Conduit, Connector, WireMessage};
use crate::types::Payload;

/// Result of one delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Payload transmitted on a live connection.
    Delivered,
    /// Payload discarded. The caller must not retry it.
    Dropped(DropReason),
}

/// Why a payload was discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// No connection and the open attempt failed.
    ConnectFailed,
    /// Transmit failed on an established connection, which is now closed.
    SendFailed,
}

/// Connection lifecycle for one logical stream.
pub struct StreamChannel {
    stream: String,
    url: Url,
    connector: Arc<dyn Connector>,
    conduit: Option<Box<dyn Conduit>>,
    backoff: Backoff,
    cancel: CancellationToken,
}

impl StreamChannel {
    /// Create a disconnected channel. The first send connects lazily.
    pub fn new(
        stream: impl Into<String>,
        url: Url,
        connector: Arc<dyn Connector>,
        policy: ReconnectPolicy,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            stream: stream.into(),
            url,
            connector,
            conduit: None,
            backoff: Backoff::new(policy),
            cancel,
        }
    }

    /// Stream identifier this channel serves.
    pub fn stream(&self) -> &str {
        &self.stream
    }

    /// Whether a connection is currently established.
    pub fn is_connected(&self) -> bool {
        self.conduit.is_some()
    }

    /// Deliver one payload, at most once.
    ///
    /// While disconnected this opens a fresh connection first; a successful
    /// open resets the reconnect schedule before the send is attempted. Any
    /// failure closes the connection (if open), waits out the current backoff
    /// delay, advances the schedule, and reports the payload as dropped.
    /// A successful send on an already open connection leaves the schedule
    /// untouched.
    ///
    /// The backoff wait is cut short by cancellation, so shutdown latency is
    /// bounded by the caller observing the token, not by the full delay.
    pub async fn send(&mut self, payload: Payload) -> SendOutcome {
        let conduit = match self.conduit.as_mut() {
            Some(conduit) => conduit,
            None => match self.connector.open(&self.url).await {
                Ok(conduit) => {
                    self.backoff.reset();
                    info!("Stream '{}' connected", self.stream);
                    self.conduit.insert(conduit)
                }
                Err(e) => {
                    debug!("Stream '{}' connect failed: {}", self.stream, e);
                    self.pause_for_backoff().await;
                    return SendOutcome::Dropped(DropReason::ConnectFailed);
                }
            },
        };

        match conduit.send(WireMessage::Binary(payload.data)).await {
            Ok(()) => SendOutcome::Delivered,
            Err(e) => {
                debug!("Stream '{}' send failed: {}", self.stream, e);
                if let Some(mut dead) = self.conduit.take() {
                    dead.close().await;
                }
                self.pause_for_backoff().await;
                SendOutcome::Dropped(DropReason::SendFailed)
            }
        }
    }

    /// Close the connection if open. No payloads are drained.
    pub async fn shutdown(&mut self) {
        if let Some(mut conduit) = self.conduit.take() {
            conduit.close().await;
            debug!("Stream '{}' closed", self.stream);
        }
    }

    async fn pause_for_backoff(&mut self) {
        let delay = self.backoff.next_delay();
        debug!("Stream '{}' backing off for {:?}", self.stream, delay);
        tokio::select! {
            _ = self.cancel.cancelled() => {}
            _ = sleep(delay) => {}
        }
    }

    #[cfg(test)]
    pub(crate) fn current_backoff(&self) -> std::time::Duration {
        self.backoff.current()
    }
}
