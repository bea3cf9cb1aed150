//! Synthetic test-pattern source.

use tokio::time::{Duration, Interval, MissedTickBehavior, interval};
use tracing::info;

use crate::config::CaptureConfig;
use crate::source::FrameSource;
use crate::types::{Frame, PixelFormat};
use crate::{LinkError, Result};

/// Frame source that renders a moving RGB gradient.
///
/// Paces itself at a configurable rate the way a camera driver would, which
/// makes it a drop-in stand-in for real hardware in development and tests.
/// The pattern is a pure function of the frame counter, so two sources with
/// the same configuration produce identical frame sequences.
pub struct PatternSource {
    width: u32,
    height: u32,
    tick: u64,
    hz: f64,
    interval: Interval,
}

impl PatternSource {
    /// Create a pattern source at the given capture rate.
    pub fn new(capture: CaptureConfig, hz: f64) -> Result<Self> {
        if capture.width == 0 || capture.height == 0 {
            return Err(LinkError::source_open("pattern source requires non-zero dimensions"));
        }
        if !(hz > 0.0) {
            return Err(LinkError::source_open("pattern source requires a positive rate"));
        }

        let mut interval = interval(Duration::from_secs_f64(1.0 / hz));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!("Pattern source opened: {}x{} at {}Hz", capture.width, capture.height, hz);

        Ok(Self { width: capture.width, height: capture.height, tick: 0, hz, interval })
    }

    fn render(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(self.width as usize * self.height as usize * 3);
        let shift = self.tick as u32;
        for y in 0..self.height {
            for x in 0..self.width {
                data.push((x.wrapping_add(shift) & 0xff) as u8);
                data.push((y & 0xff) as u8);
                data.push(((x ^ y) & 0xff) as u8);
            }
        }
        data
    }
}

#[async_trait::async_trait]
impl FrameSource for PatternSource {
    async fn acquire(&mut self) -> Result<Option<Frame>> {
        self.interval.tick().await;

        let frame = Frame::new(self.render(), self.width, self.height, PixelFormat::Rgb8);
        self.tick += 1;
        Ok(Some(frame))
    }

    fn native_hz(&self) -> Option<f64> {
        Some(self.hz)
    }

    fn release(&mut self) {
        info!("Pattern source released after {} frames", self.tick);
    }
}
