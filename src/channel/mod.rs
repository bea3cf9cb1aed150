//! Connection lifecycle channels.
//!
//! One module per channel kind: [`stream`] carries encoded payloads toward
//! the collector, [`command`] carries commands back from it. Both share the
//! reconnect pacing in [`backoff`].

pub mod backoff;
pub mod command;
pub mod stream;

pub use backoff::{Backoff, ReconnectPolicy};
pub use command::{CommandChannel, CommandHandler, RobotHandle};
pub use stream::{DropReason, SendOutcome, StreamChannel};
