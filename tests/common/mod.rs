//! Shared fixtures for integration tests.
//!
//! [`SyntheticSource`] is an in-memory [`MediaSource`]: a stereo tone plus
//! solid grey frames whose brightness encodes the capture time, so tests
//! can check which frame ended up in which cover without FFmpeg.

#![allow(dead_code)]

use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

use image::{DynamicImage, Rgb, RgbImage};
use video_slicer::{AudioBuffer, MediaSource, SlicerError};

pub const SAMPLE_RATE: u32 = 8_000;
pub const FRAME_WIDTH: u32 = 32;
pub const FRAME_HEIGHT: u32 = 18;

pub struct SyntheticSource {
    pub duration: f64,
    pub fail_decode: bool,
    pub fail_capture_after: Option<usize>,
    pub captures: Arc<AtomicUsize>,
    pub dropped: Arc<AtomicBool>,
}

impl SyntheticSource {
    pub fn new(duration: f64) -> Self {
        Self {
            duration,
            fail_decode: false,
            fail_capture_after: None,
            captures: Arc::new(AtomicUsize::new(0)),
            dropped: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn failing_decode(duration: f64) -> Self {
        let mut source = Self::new(duration);
        source.fail_decode = true;
        source
    }

    pub fn failing_capture_after(duration: f64, captures: usize) -> Self {
        let mut source = Self::new(duration);
        source.fail_capture_after = Some(captures);
        source
    }
}

impl Drop for SyntheticSource {
    fn drop(&mut self) {
        self.dropped.store(true, Ordering::SeqCst);
    }
}

/// Left channel: 440 Hz tone at half scale. Right channel: a ramp from
/// -1.0 to 1.0 across the whole source.
pub fn expected_sample(channel: usize, frame: usize, duration: f64) -> f32 {
    let time = frame as f64 / f64::from(SAMPLE_RATE);
    match channel {
        0 => (0.5 * (2.0 * std::f64::consts::PI * 440.0 * time).sin()) as f32,
        _ => (2.0 * time / duration - 1.0) as f32,
    }
}

/// Grey level of the frame captured at `time`.
pub fn expected_brightness(time: f64, duration: f64) -> u8 {
    ((time / duration) * 255.0).round().clamp(0.0, 255.0) as u8
}

impl MediaSource for SyntheticSource {
    fn duration(&self) -> f64 {
        self.duration
    }

    fn decode_audio(&mut self) -> Result<AudioBuffer, SlicerError> {
        if self.fail_decode {
            return Err(SlicerError::DecodeError(
                "synthetic source is corrupt".to_string(),
            ));
        }
        let frames = (self.duration * f64::from(SAMPLE_RATE)).round() as usize;
        let channels = (0..2)
            .map(|channel| {
                (0..frames)
                    .map(|frame| expected_sample(channel, frame, self.duration))
                    .collect()
            })
            .collect();
        AudioBuffer::new(SAMPLE_RATE, channels)
    }

    fn capture_frame_at(&mut self, time: f64) -> Result<DynamicImage, SlicerError> {
        if !(0.0..self.duration).contains(&time) {
            return Err(SlicerError::InvalidTimestamp(
                std::time::Duration::from_secs_f64(time.max(0.0)),
            ));
        }
        let captured = self.captures.fetch_add(1, Ordering::SeqCst);
        if self.fail_capture_after.is_some_and(|limit| captured >= limit) {
            return Err(SlicerError::DecodeError(format!(
                "no frame decodable at {time:.3}s"
            )));
        }
        let level = expected_brightness(time, self.duration);
        Ok(DynamicImage::ImageRgb8(RgbImage::from_pixel(
            FRAME_WIDTH,
            FRAME_HEIGHT,
            Rgb([level, level, level]),
        )))
    }
}

/// Average grey level of a decoded cover.
pub fn cover_brightness(cover: &[u8]) -> u8 {
    let image = image::load_from_memory(cover)
        .expect("cover should decode")
        .to_luma8();
    let sum: u64 = image.pixels().map(|pixel| u64::from(pixel.0[0])).sum();
    (sum / u64::from(image.width() * image.height())) as u8
}

/// Decode a WAV entry into per-channel 16-bit samples.
pub fn wav_samples(bytes: &[u8]) -> (hound::WavSpec, Vec<Vec<i16>>) {
    let mut reader = hound::WavReader::new(std::io::Cursor::new(bytes)).expect("valid WAV");
    let spec = reader.spec();
    let interleaved: Vec<i16> = reader
        .samples::<i16>()
        .collect::<Result<_, _>>()
        .expect("readable samples");
    let channels = (0..spec.channels as usize)
        .map(|channel| {
            interleaved
                .iter()
                .skip(channel)
                .step_by(spec.channels as usize)
                .copied()
                .collect()
        })
        .collect();
    (spec, channels)
}
