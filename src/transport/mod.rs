//! Transport seam for persistent duplex connections.
//!
//! The channels in this crate only ever open, send, receive, and close a
//! connection, and observe failures. Those five verbs are the whole surface
//! of the [`Connector`]/[`Conduit`] pair; the WebSocket mechanics live behind
//! it in [`ws`], and tests substitute scripted fakes.

pub mod ws;

use url::Url;

use crate::Result;

pub use ws::WsConnector;

/// One message exchanged over a conduit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireMessage {
    /// Binary payload: one encoded frame per message.
    Binary(Vec<u8>),
    /// Structured text payload: commands, acknowledgments, handshakes.
    Text(String),
}

/// One open duplex connection.
#[async_trait::async_trait]
pub trait Conduit: Send {
    /// Transmit one message. Fails fast on transport error.
    async fn send(&mut self, msg: WireMessage) -> Result<()>;

    /// Receive the next inbound message.
    ///
    /// Returns `Ok(None)` when the peer closed the connection cleanly.
    async fn recv(&mut self) -> Result<Option<WireMessage>>;

    /// Close the connection. Best effort; errors are discarded.
    async fn close(&mut self);
}

/// Opens conduits to a remote endpoint.
#[async_trait::async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Open a connection to `url`, observing a bounded timeout.
    async fn open(&self, url: &Url) -> Result<Box<dyn Conduit>>;
}
