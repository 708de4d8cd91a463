//! Internal pixel and timing conversions.
//!
//! Helpers for copying decoded FFmpeg planes, computing luminance, and
//! scoring frame differences.

use std::time::Duration;

use ffmpeg_next::frame::Video as VideoFrame;
use image::{GrayImage, RgbImage};

use crate::error::FramesiftError;

// ITU-R BT.601 luma weights in 14-bit fixed point. They sum to 1 << 14, so a
// neutral grey pixel keeps its exact value.
const LUMA_RED: u32 = 4899;
const LUMA_GREEN: u32 = 9617;
const LUMA_BLUE: u32 = 1868;
const LUMA_SHIFT: u32 = 14;
const LUMA_ROUNDING: u32 = 1 << (LUMA_SHIFT - 1);

/// Copy pixel data from a packed FFmpeg video frame into a tightly-packed
/// buffer, dropping any per-row padding.
pub(crate) fn frame_to_buffer(
    video_frame: &VideoFrame,
    width: u32,
    height: u32,
    bytes_per_pixel: usize,
) -> Vec<u8> {
    let stride = video_frame.stride(0);
    let row_length = (width as usize) * bytes_per_pixel;
    let data = video_frame.data(0);

    if stride == row_length {
        data[..row_length * (height as usize)].to_vec()
    } else {
        let mut buffer = Vec::with_capacity(row_length * (height as usize));
        for row in 0..(height as usize) {
            let row_start = row * stride;
            buffer.extend_from_slice(&data[row_start..row_start + row_length]);
        }
        buffer
    }
}

/// Convert an RGB frame to single-channel luminance.
pub(crate) fn luminance(image: &RgbImage) -> GrayImage {
    let (width, height) = image.dimensions();
    let luma = image
        .pixels()
        .map(|pixel| {
            let [red, green, blue] = pixel.0;
            let weighted = red as u32 * LUMA_RED
                + green as u32 * LUMA_GREEN
                + blue as u32 * LUMA_BLUE
                + LUMA_ROUNDING;
            (weighted >> LUMA_SHIFT) as u8
        })
        .collect();

    // Same pixel count as the source, so this cannot fail.
    GrayImage::from_raw(width, height, luma).unwrap_or_else(|| GrayImage::new(width, height))
}

/// Mean absolute per-pixel difference between two luminance frames.
///
/// The result lies in `[0, 255]`. An empty (zero-area) frame scores 0.
pub(crate) fn mean_absolute_difference(
    baseline: &GrayImage,
    current: &GrayImage,
) -> Result<f64, FramesiftError> {
    if baseline.dimensions() != current.dimensions() {
        let (expected_width, expected_height) = baseline.dimensions();
        let (actual_width, actual_height) = current.dimensions();
        return Err(FramesiftError::FrameSizeMismatch {
            expected_width,
            expected_height,
            actual_width,
            actual_height,
        });
    }

    let pixel_count = baseline.as_raw().len();
    if pixel_count == 0 {
        return Ok(0.0);
    }

    let total: u64 = baseline
        .as_raw()
        .iter()
        .zip(current.as_raw())
        .map(|(&a, &b)| a.abs_diff(b) as u64)
        .sum();

    Ok(total as f64 / pixel_count as f64)
}

/// Presentation time of a frame ordinal at a constant frame rate.
pub(crate) fn frame_number_to_timestamp(
    frame_number: u64,
    frames_per_second: Option<f64>,
) -> Option<Duration> {
    frames_per_second
        .filter(|fps| fps.is_finite() && *fps > 0.0)
        .map(|fps| Duration::from_secs_f64(frame_number as f64 / fps))
}
