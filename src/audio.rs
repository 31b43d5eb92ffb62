//! Decoded audio buffers.
//!
//! [`AudioBuffer`] holds a whole decoded audio track as planar `f32`
//! samples. The slicing pipeline cuts it into [`AudioChunk`] windows, one
//! per planned chunk, which are then handed to the WAV encoder.

use crate::error::SlicerError;

/// Guard against floating-point error when converting seconds to sample
/// frames, so `0.2 * 44100` lands on 8820 and not 8819.
const FRAME_EPSILON: f64 = 1e-6;

/// Convert a time in seconds to a whole number of sample frames.
pub(crate) fn seconds_to_frames(seconds: f64, sample_rate: u32) -> usize {
    let frames = seconds * f64::from(sample_rate) + FRAME_EPSILON;
    if frames.is_finite() && frames > 0.0 {
        frames.floor() as usize
    } else {
        0
    }
}

/// A fully decoded, multi-channel audio track.
///
/// Samples are stored per channel (planar), nominally in `[-1.0, 1.0]`.
/// The buffer is read-only while the pipeline samples windows from it.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    sample_rate: u32,
    channels: Vec<Vec<f32>>,
}

impl AudioBuffer {
    /// Build a buffer from planar channel data.
    ///
    /// # Errors
    ///
    /// Returns [`SlicerError::DecodeError`] if `sample_rate` is zero, no
    /// channels are given, or channels differ in length.
    pub fn new(sample_rate: u32, channels: Vec<Vec<f32>>) -> Result<Self, SlicerError> {
        if sample_rate == 0 {
            return Err(SlicerError::DecodeError(
                "decoded audio reports a sample rate of 0".to_string(),
            ));
        }
        let Some(first) = channels.first() else {
            return Err(SlicerError::DecodeError(
                "decoded audio has no channels".to_string(),
            ));
        };
        let frames = first.len();
        if channels.iter().any(|channel| channel.len() != frames) {
            return Err(SlicerError::DecodeError(
                "decoded audio channels differ in length".to_string(),
            ));
        }
        Ok(Self {
            sample_rate,
            channels,
        })
    }

    /// Build a buffer from interleaved samples (`L R L R ...`).
    ///
    /// A trailing partial frame is discarded.
    pub fn from_interleaved(
        sample_rate: u32,
        channel_count: usize,
        interleaved: &[f32],
    ) -> Result<Self, SlicerError> {
        if channel_count == 0 {
            return Err(SlicerError::DecodeError(
                "decoded audio has no channels".to_string(),
            ));
        }
        let frames = interleaved.len() / channel_count;
        let mut channels = vec![Vec::with_capacity(frames); channel_count];
        for frame in interleaved.chunks_exact(channel_count) {
            for (channel, &sample) in channels.iter_mut().zip(frame) {
                channel.push(sample);
            }
        }
        Self::new(sample_rate, channels)
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of channels.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Number of sample frames per channel.
    pub fn frames(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    /// Length of the track in seconds.
    pub fn duration_seconds(&self) -> f64 {
        self.frames() as f64 / f64::from(self.sample_rate)
    }

    /// Planar channel data.
    pub fn channels(&self) -> &[Vec<f32>] {
        &self.channels
    }

    /// Cut the window `[start_time, start_time + duration)` out of the
    /// buffer.
    ///
    /// The result always holds exactly `floor(duration * sample_rate)`
    /// frames: any part of the window running past the end of the buffer
    /// is filled with silence rather than shortening the chunk.
    pub fn window(&self, start_time: f64, duration: f64) -> AudioChunk {
        let start = seconds_to_frames(start_time, self.sample_rate);
        let length = seconds_to_frames(duration, self.sample_rate);

        let channels = self
            .channels
            .iter()
            .map(|channel| {
                let mut samples = vec![0.0_f32; length];
                if start < channel.len() {
                    let available = (channel.len() - start).min(length);
                    samples[..available].copy_from_slice(&channel[start..start + available]);
                }
                samples
            })
            .collect();

        AudioChunk {
            sample_rate: self.sample_rate,
            channels,
        }
    }
}

/// A window of audio cut from an [`AudioBuffer`].
///
/// Only ever persisted through [`encode_wav`](crate::encode_wav).
#[derive(Debug, Clone, PartialEq)]
pub struct AudioChunk {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Planar samples, one vector per channel.
    pub channels: Vec<Vec<f32>>,
}

impl AudioChunk {
    /// A silent chunk of `frames` frames.
    pub fn silence(sample_rate: u32, channel_count: usize, frames: usize) -> Self {
        Self {
            sample_rate,
            channels: vec![vec![0.0; frames]; channel_count],
        }
    }

    /// Number of channels.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Number of sample frames per channel.
    pub fn frames(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(frames: usize) -> Vec<f32> {
        (0..frames).map(|i| i as f32 / frames as f32).collect()
    }

    #[test]
    fn rejects_bad_geometry() {
        assert!(AudioBuffer::new(0, vec![vec![0.0]]).is_err());
        assert!(AudioBuffer::new(8000, Vec::new()).is_err());
        assert!(AudioBuffer::new(8000, vec![vec![0.0; 3], vec![0.0; 2]]).is_err());
    }

    #[test]
    fn deinterleaves_frames() {
        let buffer =
            AudioBuffer::from_interleaved(4, 2, &[0.1, -0.1, 0.2, -0.2, 0.3, -0.3, 0.9]).unwrap();
        assert_eq!(buffer.frames(), 3);
        assert_eq!(buffer.channels()[0], vec![0.1, 0.2, 0.3]);
        assert_eq!(buffer.channels()[1], vec![-0.1, -0.2, -0.3]);
    }

    #[test]
    fn window_copies_in_range_samples() {
        let buffer = AudioBuffer::new(8, vec![ramp(16)]).unwrap();
        let chunk = buffer.window(0.5, 0.25);
        assert_eq!(chunk.frames(), 2);
        assert_eq!(chunk.channels[0], buffer.channels()[0][4..6].to_vec());
    }

    #[test]
    fn window_past_end_is_zero_filled() {
        let buffer = AudioBuffer::new(10, vec![vec![0.5; 10], vec![-0.5; 10]]).unwrap();
        let chunk = buffer.window(0.8, 0.5);
        assert_eq!(chunk.frames(), 5);
        assert_eq!(chunk.channels[0], vec![0.5, 0.5, 0.0, 0.0, 0.0]);
        assert_eq!(chunk.channels[1], vec![-0.5, -0.5, 0.0, 0.0, 0.0]);

        let beyond = buffer.window(3.0, 0.5);
        assert_eq!(beyond.channels[0], vec![0.0; 5]);
    }

    #[test]
    fn frame_conversion_tolerates_float_error() {
        assert_eq!(seconds_to_frames(0.2, 44_100), 8_820);
        assert_eq!(seconds_to_frames(1.0 / 3.0, 48_000), 16_000);
        assert_eq!(seconds_to_frames(-1.0, 48_000), 0);
    }
}
