//! Shared fakes for exercising the pipeline without sockets or hardware.

#![cfg(test)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::time::Duration;
use url::Url;

use crate::source::FrameSource;
use crate::transport::{Conduit, Connector, WireMessage};
use crate::types::{Frame, PixelFormat};
use crate::{LinkError, Result};

/// Poll `cond` while letting paused-clock timers fire, panicking if it never
/// becomes true.
pub async fn wait_until(mut cond: impl FnMut() -> bool) {
    for _ in 0..100_000 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached within the test window");
}

/// Deterministic 16x16 RGB frame for encoder and pipeline tests.
pub fn test_frame() -> Frame {
    let mut data = Vec::with_capacity(16 * 16 * 3);
    for y in 0..16u32 {
        for x in 0..16u32 {
            data.push((x * 16) as u8);
            data.push((y * 16) as u8);
            data.push(((x ^ y) * 16) as u8);
        }
    }
    Frame::new(data, 16, 16, PixelFormat::Rgb8)
}

/// One scripted acquire outcome for [`StubSource`].
#[derive(Debug, Clone, Copy)]
pub enum SourceStep {
    /// Yield the deterministic test frame.
    Frame,
    /// Report no frame ready.
    Unavailable,
    /// Report a device fault.
    Fault,
}

/// Frame source that replays a fixed script, then parks forever.
pub struct StubSource {
    steps: VecDeque<SourceStep>,
    released: Arc<AtomicBool>,
}

impl StubSource {
    pub fn new(steps: Vec<SourceStep>) -> Self {
        Self { steps: steps.into(), released: Arc::new(AtomicBool::new(false)) }
    }

    /// Flag set once `release` has been called.
    pub fn released(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.released)
    }
}

#[async_trait::async_trait]
impl FrameSource for StubSource {
    async fn acquire(&mut self) -> Result<Option<Frame>> {
        match self.steps.pop_front() {
            Some(SourceStep::Frame) => Ok(Some(test_frame())),
            Some(SourceStep::Unavailable) => Ok(None),
            Some(SourceStep::Fault) => Err(LinkError::source_fault("scripted fault")),
            // Script exhausted: park until the producer is cancelled.
            None => std::future::pending().await,
        }
    }

    fn release(&mut self) {
        self.released.store(true, Ordering::SeqCst);
    }
}

/// What one `open` attempt does for a given peer.
#[derive(Debug, Clone)]
pub enum OpenStep {
    /// Open fails.
    Refuse,
    /// Open succeeds with the given conduit behavior.
    Accept {
        /// Sends accepted before the conduit starts erroring.
        /// `usize::MAX` means it never errors.
        sends_before_error: usize,
        /// Messages handed out by `recv`, in order.
        inbound: Vec<WireMessage>,
        /// After `inbound` is exhausted: pend forever (`true`) or report a
        /// clean peer close (`false`).
        hold_open: bool,
    },
}

impl OpenStep {
    /// Conduit that accepts everything and stays up.
    pub fn accept() -> Self {
        OpenStep::Accept { sends_before_error: usize::MAX, inbound: vec![], hold_open: true }
    }

    /// Conduit that delivers `n` sends, then fails the next one.
    pub fn accept_then_fail_after(n: usize) -> Self {
        OpenStep::Accept { sends_before_error: n, inbound: vec![], hold_open: true }
    }

    /// Conduit that yields the given inbound messages, then pends.
    pub fn accept_with_inbound(inbound: Vec<WireMessage>) -> Self {
        OpenStep::Accept { sends_before_error: usize::MAX, inbound, hold_open: true }
    }

    /// Conduit whose peer closes immediately after the handshake.
    pub fn accept_then_close() -> Self {
        OpenStep::Accept { sends_before_error: usize::MAX, inbound: vec![], hold_open: false }
    }
}

/// Record of everything that crossed a [`ScriptedConnector`].
#[derive(Default)]
pub struct TransportLog {
    opens: Mutex<Vec<(String, bool)>>,
    sent: Mutex<Vec<(String, WireMessage)>>,
}

impl TransportLog {
    /// Open attempts (successful or not) for one peer.
    pub fn open_attempts(&self, peer: &str) -> usize {
        self.opens.lock().expect("log lock").iter().filter(|(p, _)| p == peer).count()
    }

    /// Messages sent on conduits belonging to one peer, in send order.
    pub fn sent_for(&self, peer: &str) -> Vec<WireMessage> {
        self.sent
            .lock()
            .expect("log lock")
            .iter()
            .filter(|(p, _)| p == peer)
            .map(|(_, msg)| msg.clone())
            .collect()
    }
}

/// Connector whose per-peer behavior follows a fixed script.
///
/// Peers are keyed by the `stream` or `robot_id` query parameter of the URL
/// being opened. A peer with no script (or an exhausted one) refuses every
/// open, which models a collector that is simply down.
pub struct ScriptedConnector {
    scripts: Mutex<HashMap<String, VecDeque<OpenStep>>>,
    log: Arc<TransportLog>,
}

impl ScriptedConnector {
    pub fn new() -> Self {
        Self { scripts: Mutex::new(HashMap::new()), log: Arc::new(TransportLog::default()) }
    }

    /// Install the open script for one peer.
    pub fn script(&self, peer: &str, steps: Vec<OpenStep>) {
        self.scripts.lock().expect("script lock").insert(peer.to_string(), steps.into());
    }

    /// Shared view of the transport log.
    pub fn log(&self) -> Arc<TransportLog> {
        Arc::clone(&self.log)
    }

    fn peer_of(url: &Url) -> String {
        url.query_pairs()
            .find(|(key, _)| key == "stream" || key == "robot_id")
            .map(|(_, value)| value.into_owned())
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl Connector for ScriptedConnector {
    async fn open(&self, url: &Url) -> Result<Box<dyn Conduit>> {
        let peer = Self::peer_of(url);
        let step = self
            .scripts
            .lock()
            .expect("script lock")
            .get_mut(&peer)
            .and_then(|steps| steps.pop_front())
            .unwrap_or(OpenStep::Refuse);

        match step {
            OpenStep::Refuse => {
                self.log.opens.lock().expect("log lock").push((peer.clone(), false));
                Err(LinkError::connect_failed(url.as_str(), "scripted refusal"))
            }
            OpenStep::Accept { sends_before_error, inbound, hold_open } => {
                self.log.opens.lock().expect("log lock").push((peer.clone(), true));
                Ok(Box::new(ScriptedConduit {
                    peer,
                    remaining_sends: sends_before_error,
                    inbound: inbound.into(),
                    hold_open,
                    log: Arc::clone(&self.log),
                }))
            }
        }
    }
}

struct ScriptedConduit {
    peer: String,
    remaining_sends: usize,
    inbound: VecDeque<WireMessage>,
    hold_open: bool,
    log: Arc<TransportLog>,
}

#[async_trait::async_trait]
impl Conduit for ScriptedConduit {
    async fn send(&mut self, msg: WireMessage) -> Result<()> {
        if self.remaining_sends == 0 {
            return Err(LinkError::transport("scripted send failure"));
        }
        if self.remaining_sends != usize::MAX {
            self.remaining_sends -= 1;
        }
        self.log.sent.lock().expect("log lock").push((self.peer.clone(), msg));
        Ok(())
    }

    async fn recv(&mut self) -> Result<Option<WireMessage>> {
        if let Some(msg) = self.inbound.pop_front() {
            return Ok(Some(msg));
        }
        if self.hold_open {
            std::future::pending().await
        } else {
            Ok(None)
        }
    }

    async fn close(&mut self) {}
}
