//! Core data types that flow through the pipeline.

use std::sync::Arc;
use std::time::Instant;

/// Pixel layout of a raw frame buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// Interleaved 8-bit RGB, 3 bytes per pixel.
    Rgb8,
    /// Single-channel 8-bit luminance.
    Luma8,
}

impl PixelFormat {
    /// Bytes occupied by one pixel in this format.
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgb8 => 3,
            PixelFormat::Luma8 => 1,
        }
    }
}

/// Raw captured frame.
///
/// This is the fundamental data unit produced by a [`FrameSource`] and
/// consumed immediately by the encoder. Frames are never retained after
/// encoding; there is no frame history anywhere in the pipeline.
///
/// [`FrameSource`]: crate::source::FrameSource
#[derive(Debug, Clone)]
pub struct Frame {
    /// Raw pixel buffer (zero-copy via Arc).
    pub data: Arc<[u8]>,

    /// Width in pixels.
    pub width: u32,

    /// Height in pixels.
    pub height: u32,

    /// Pixel layout of `data`.
    pub format: PixelFormat,

    /// Capture timestamp on the monotonic clock.
    pub captured_at: Instant,
}

impl Frame {
    /// Create a new frame captured now.
    pub fn new(data: Vec<u8>, width: u32, height: u32, format: PixelFormat) -> Self {
        Self { data: data.into(), width, height, format, captured_at: Instant::now() }
    }

    /// Buffer length implied by the frame dimensions and pixel format.
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * self.format.bytes_per_pixel()
    }
}

/// One encoded unit bound for a single stream channel.
///
/// Ownership transfers to the channel for the duration of one send attempt.
/// A payload is discarded after that attempt, delivered or not; it is never
/// queued for retry.
#[derive(Debug, Clone)]
pub struct Payload {
    /// Identifier of the logical stream this payload targets.
    pub stream: String,

    /// Encoded bytes, sent as a single binary message.
    pub data: Vec<u8>,
}

impl Payload {
    /// Create a payload for the given stream.
    pub fn new(stream: impl Into<String>, data: Vec<u8>) -> Self {
        Self { stream: stream.into(), data }
    }
}
