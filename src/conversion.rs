//! Internal conversion helpers for the FFmpeg backend.
//!
//! Pixel-plane copying and timestamp rescaling shared by audio decoding and
//! frame capture.

use ffmpeg_next::{Rational, frame::Video as VideoFrame};

/// Microseconds per second, FFmpeg's `AV_TIME_BASE`.
const AV_TIME_BASE: f64 = 1_000_000.0;

/// Copy pixel data from an FFmpeg video frame into a tightly-packed buffer.
///
/// FFmpeg frames frequently carry per-row padding (stride > width × bpp),
/// which is stripped so the result can go straight into
/// [`image::RgbImage::from_raw`].
pub(crate) fn frame_to_buffer(
    video_frame: &VideoFrame,
    width: u32,
    height: u32,
    bytes_per_pixel: usize,
) -> Vec<u8> {
    let stride = video_frame.stride(0);
    let expected_stride = (width as usize) * bytes_per_pixel;
    let data = video_frame.data(0);

    if stride == expected_stride {
        data[..expected_stride * (height as usize)].to_vec()
    } else {
        let mut buffer = Vec::with_capacity(expected_stride * (height as usize));
        for row in 0..(height as usize) {
            let row_start = row * stride;
            buffer.extend_from_slice(&data[row_start..row_start + expected_stride]);
        }
        buffer
    }
}

/// Rescale a PTS value from stream time base to seconds.
pub(crate) fn pts_to_seconds(pts: i64, time_base: Rational) -> f64 {
    pts as f64 * f64::from(time_base.numerator()) / f64::from(time_base.denominator())
}

/// Convert seconds to a container-level seek timestamp.
///
/// `Input::seek` (via `avformat_seek_file` with `stream_index = -1`)
/// expects `AV_TIME_BASE` units, not the stream time base.
pub(crate) fn seconds_to_seek_timestamp(seconds: f64) -> i64 {
    (seconds * AV_TIME_BASE) as i64
}
