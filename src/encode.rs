//! JPEG encoder adapter.
//!
//! A pure transform from a raw [`Frame`] plus a [`StreamProfile`] to one
//! encoded [`Payload`]. No state is shared across calls; the same frame and
//! profile always produce identical bytes.

use image::ExtendedColorType;
use image::codecs::jpeg::JpegEncoder;

use crate::config::{ColorMode, StreamProfile};
use crate::types::{Frame, Payload, PixelFormat};
use crate::{LinkError, Result};

/// Encode one frame for one stream profile.
///
/// On failure the caller skips this payload for this frame and continues;
/// encoding errors never abort the ingestion loop.
pub fn encode(frame: &Frame, profile: &StreamProfile) -> Result<Payload> {
    if frame.data.len() != frame.expected_len() {
        return Err(LinkError::encode_failed(
            &profile.stream,
            format!(
                "buffer size mismatch: {} bytes for {}x{} {:?}",
                frame.data.len(),
                frame.width,
                frame.height,
                frame.format
            ),
        ));
    }

    let mut out = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut out, profile.jpeg_quality);

    let result = match (frame.format, profile.color_mode) {
        (PixelFormat::Rgb8, ColorMode::Color) => {
            encoder.encode(&frame.data, frame.width, frame.height, ExtendedColorType::Rgb8)
        }
        (PixelFormat::Rgb8, ColorMode::Grayscale) => {
            let luma = rgb_to_luma(&frame.data);
            encoder.encode(&luma, frame.width, frame.height, ExtendedColorType::L8)
        }
        // Already single-channel; a color profile cannot invent chroma.
        (PixelFormat::Luma8, _) => {
            encoder.encode(&frame.data, frame.width, frame.height, ExtendedColorType::L8)
        }
    };

    result.map_err(|e| LinkError::encode_failed(&profile.stream, e))?;
    Ok(Payload::new(profile.stream.clone(), out))
}

/// ITU-R BT.601 integer luma approximation.
fn rgb_to_luma(rgb: &[u8]) -> Vec<u8> {
    rgb.chunks_exact(3)
        .map(|px| {
            let weighted =
                299 * u32::from(px[0]) + 587 * u32::from(px[1]) + 114 * u32::from(px[2]);
            (weighted / 1000) as u8
        })
        .collect()
}
