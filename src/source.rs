//! The decode/seek boundary between the pipelines and a media backend.
//!
//! The slicing pipeline never talks to a codec library directly. It drives
//! any type implementing [`MediaSource`]: the FFmpeg-backed
//! [`MediaFile`](crate::MediaFile) in production, or an in-memory source in
//! tests.
//!
//! A source is a single decode handle. Seeks are not reentrant, which is
//! why every method takes `&mut self`: the borrow checker serialises
//! captures per handle. The pipeline owns the handle for the duration of a
//! run and dropping it releases the backend resources on both the success
//! and the failure path.

use image::DynamicImage;

use crate::{audio::AudioBuffer, error::SlicerError};

/// An opened, decodable video with a readable audio track.
pub trait MediaSource {
    /// Total duration of the source in seconds.
    fn duration(&self) -> f64;

    /// Decode the entire audio track into memory.
    ///
    /// # Errors
    ///
    /// Implementations return [`SlicerError::NoAudioStream`] or
    /// [`SlicerError::DecodeError`] when the track cannot be decoded.
    fn decode_audio(&mut self) -> Result<AudioBuffer, SlicerError>;

    /// Capture the frame nearest `time` seconds at native resolution.
    ///
    /// # Errors
    ///
    /// Implementations return [`SlicerError::InvalidTimestamp`] when `time`
    /// lies outside `[0, duration)` and [`SlicerError::DecodeError`] when
    /// no frame can be decoded.
    fn capture_frame_at(&mut self, time: f64) -> Result<DynamicImage, SlicerError>;
}

impl<S: MediaSource + ?Sized> MediaSource for &mut S {
    fn duration(&self) -> f64 {
        (**self).duration()
    }

    fn decode_audio(&mut self) -> Result<AudioBuffer, SlicerError> {
        (**self).decode_audio()
    }

    fn capture_frame_at(&mut self, time: f64) -> Result<DynamicImage, SlicerError> {
        (**self).capture_frame_at(time)
    }
}

impl<S: MediaSource + ?Sized> MediaSource for Box<S> {
    fn duration(&self) -> f64 {
        (**self).duration()
    }

    fn decode_audio(&mut self) -> Result<AudioBuffer, SlicerError> {
        (**self).decode_audio()
    }

    fn capture_frame_at(&mut self, time: f64) -> Result<DynamicImage, SlicerError> {
        (**self).capture_frame_at(time)
    }
}
