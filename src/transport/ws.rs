//! WebSocket transport backed by `tokio-tungstenite`.

use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{WebSocketStream, connect_async};
use tracing::debug;
use url::Url;

use super::{Conduit, Connector, WireMessage};
use crate::{LinkError, Result};

/// Connector that opens WebSocket conduits.
#[derive(Debug, Clone)]
pub struct WsConnector {
    /// Deadline for the open handshake.
    connect_timeout: Duration,

    /// Inbound silence tolerated before the conduit pings the peer. `None`
    /// disables the idle watchdog (ingest channels never receive, so they
    /// leave it off).
    idle_timeout: Option<Duration>,
}

impl WsConnector {
    /// Connector for send-only ingest channels.
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout, idle_timeout: None }
    }

    /// Connector for receive loops: after `idle_timeout` of inbound silence
    /// the conduit pings the peer, and only a further silent interval is
    /// reported as a transport failure so the channel can reconnect. A quiet
    /// but healthy connection stays up indefinitely.
    pub fn with_idle_timeout(connect_timeout: Duration, idle_timeout: Duration) -> Self {
        Self { connect_timeout, idle_timeout: Some(idle_timeout) }
    }
}

#[async_trait::async_trait]
impl Connector for WsConnector {
    async fn open(&self, url: &Url) -> Result<Box<dyn Conduit>> {
        let attempt = connect_async(url.as_str());
        let (stream, response) = timeout(self.connect_timeout, attempt)
            .await
            .map_err(|_| LinkError::Timeout { duration: self.connect_timeout })?
            .map_err(|e| LinkError::connect_failed_with_source(url.as_str(), Box::new(e)))?;

        debug!("WebSocket open: {} ({})", url.host_str().unwrap_or("?"), response.status());
        Ok(Box::new(WsConduit { inner: stream, idle_timeout: self.idle_timeout }))
    }
}

struct WsConduit<S> {
    inner: WebSocketStream<S>,
    idle_timeout: Option<Duration>,
}

#[async_trait::async_trait]
impl<S> Conduit for WsConduit<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn send(&mut self, msg: WireMessage) -> Result<()> {
        let message = match msg {
            WireMessage::Binary(data) => Message::Binary(data),
            WireMessage::Text(text) => Message::Text(text),
        };
        self.inner
            .send(message)
            .await
            .map_err(|e| LinkError::transport_with_source("send failed", Box::new(e)))
    }

    async fn recv(&mut self) -> Result<Option<WireMessage>> {
        let mut pinged = false;
        loop {
            let next = match self.idle_timeout {
                Some(idle) => match timeout(idle, self.inner.next()).await {
                    Ok(next) => next,
                    Err(_) if pinged => return Err(LinkError::Timeout { duration: idle }),
                    Err(_) => {
                        // Quiet link: ping the peer and allow one more
                        // interval for any traffic before declaring it dead.
                        self.inner.send(Message::Ping(Vec::new())).await.map_err(|e| {
                            LinkError::transport_with_source("ping failed", Box::new(e))
                        })?;
                        pinged = true;
                        continue;
                    }
                },
                None => self.inner.next().await,
            };

            match next {
                None => return Ok(None),
                Some(Ok(Message::Binary(data))) => return Ok(Some(WireMessage::Binary(data))),
                Some(Ok(Message::Text(text))) => return Ok(Some(WireMessage::Text(text))),
                // Control frames carry no application data but prove the
                // link is alive.
                Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => {
                    pinged = false;
                    continue;
                }
                Some(Ok(Message::Close(_))) => return Ok(None),
                Some(Err(e)) => {
                    return Err(LinkError::transport_with_source("receive failed", Box::new(e)));
                }
            }
        }
    }

    async fn close(&mut self) {
        let _ = self.inner.close(None).await;
    }
}
