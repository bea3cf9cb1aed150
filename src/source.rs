//! Frame source trait for capture devices.

use crate::Result;
use crate::types::Frame;

/// Trait for raw frame producers.
///
/// Sources abstract over capture devices (physical camera, synthetic test
/// pattern) and handle their own device state and pacing internally. The
/// trait is deliberately small: the ingestion loop only needs to poll for
/// frames and release the device on shutdown.
///
/// Opening the device happens in the source's constructor; a device that
/// cannot be opened is fatal and the pipeline never starts.
#[async_trait::async_trait]
pub trait FrameSource: Send + 'static {
    /// Get the next raw frame.
    ///
    /// Returns:
    /// - `Ok(Some(frame))` - new frame captured
    /// - `Ok(None)` - no frame ready right now; the caller paces the retry
    ///   and this poll does not count as a production tick
    /// - `Err(e)` - device fault
    ///
    /// Must not block indefinitely waiting for a frame.
    async fn acquire(&mut self) -> Result<Option<Frame>>;

    /// Native capture rate in Hz, if the device knows it.
    fn native_hz(&self) -> Option<f64> {
        None
    }

    /// Release the device. Called exactly once when the ingestion loop ends.
    fn release(&mut self) {}
}
