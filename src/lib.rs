//! Resilient camera-to-collector streaming with a robot command channel.
//!
//! Camlink captures raw frames from a local video source, encodes each frame
//! into independent representations (for example a color stream and a
//! grayscale stream), and delivers every representation to a remote collector
//! over its own persistent WebSocket connection. Each connection runs its own
//! lifecycle - lazy connect, send, fail, back off, reconnect - so one
//! struggling stream never slows down another. A companion command channel
//! lets a controlled device receive structured commands over the same kind of
//! connection and acknowledge each one.
//!
//! # Quick start
//!
//! ## Ingest (camera side)
//!
//! ```rust,no_run
//! use camlink::{Camlink, CaptureConfig, IngestConfig, PatternSource};
//! use url::Url;
//!
//! #[tokio::main]
//! async fn main() -> camlink::Result<()> {
//!     let endpoint = Url::parse("ws://collector.local:8080/ws").expect("endpoint");
//!     let config = IngestConfig::new(endpoint, "super_secret");
//!     let source = PatternSource::new(CaptureConfig::default(), 30.0)?;
//!
//!     let handle = Camlink::ingest(config, source)?;
//!     tokio::time::sleep(std::time::Duration::from_secs(60)).await;
//!     handle.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Robot (command side)
//!
//! ```rust,no_run
//! use camlink::{Action, Camlink, CommandHandler, RobotConfig};
//! use url::Url;
//!
//! struct Motors;
//!
//! #[async_trait::async_trait]
//! impl CommandHandler for Motors {
//!     async fn handle(&self, action: Option<Action>, speed: Option<u8>) {
//!         println!("CMD: {:?} at {:?}", action, speed);
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let endpoint = Url::parse("ws://collector.local:8080/ws").expect("endpoint");
//!     let config = RobotConfig::new(endpoint, "access_token", "r1");
//!
//!     let handle = Camlink::robot(config, Motors);
//!     tokio::time::sleep(std::time::Duration::from_secs(60)).await;
//!     handle.shutdown().await;
//! }
//! ```

// Core types and error handling
mod error;
pub mod types;
#[cfg(test)]
mod test_utils;

// Pipeline stages
pub mod channel;
pub mod config;
pub mod driver;
pub mod encode;
pub mod limiter;
pub mod protocol;
pub mod source;
pub mod sources;
pub mod transport;

// Core exports
pub use error::{LinkError, Result};
pub use types::{Frame, Payload, PixelFormat};

// Configuration exports
pub use config::{CaptureConfig, ColorMode, IngestConfig, RobotConfig, StreamProfile};

// Channel exports
pub use channel::{
    Backoff, CommandChannel, CommandHandler, DropReason, ReconnectPolicy, RobotHandle,
    SendOutcome, StreamChannel,
};

// Pipeline exports
pub use driver::{IngestDriver, IngestHandle};
pub use limiter::RateLimiter;
pub use protocol::{Ack, Action, Command, Hello};
pub use source::FrameSource;
pub use sources::PatternSource;
pub use transport::{Conduit, Connector, WireMessage, WsConnector};

use std::sync::Arc;

/// Unified entry point for the two pipeline roles.
///
/// Wires the default WebSocket transport into the ingestion driver or the
/// command channel. Callers that need a custom transport (tests do) use
/// [`IngestDriver::spawn`] and [`CommandChannel::spawn`] directly.
pub struct Camlink;

impl Camlink {
    /// Start the ingestion pipeline.
    ///
    /// Spawns one producer task plus one delivery task per configured stream
    /// profile. The returned handle shuts the whole pipeline down.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the config names no streams or
    /// carries an out-of-range JPEG quality. Source open failures surface
    /// from the source's constructor before this call.
    pub fn ingest<S>(config: IngestConfig, source: S) -> Result<IngestHandle>
    where
        S: FrameSource,
    {
        let connector = Arc::new(WsConnector::new(config.connect_timeout));
        IngestDriver::spawn(config, source, connector)
    }

    /// Start the robot command loop.
    ///
    /// The loop reconnects forever; the returned handle is the only way to
    /// stop it.
    pub fn robot<H>(config: RobotConfig, handler: H) -> RobotHandle
    where
        H: CommandHandler,
    {
        let connector =
            Arc::new(WsConnector::with_idle_timeout(config.connect_timeout, config.keepalive));
        CommandChannel::spawn(config, connector, Arc::new(handler))
    }
}
