//! Source media metadata.
//!
//! [`MediaMetadata`] is read once when a [`MediaFile`](crate::MediaFile) is
//! opened and cached for the lifetime of the handle.

use std::time::Duration;

/// Container-level and best-stream metadata for a source video.
#[derive(Debug, Clone)]
#[must_use]
pub struct MediaMetadata {
    /// Video stream metadata, if a video stream is present.
    pub video: Option<VideoMetadata>,
    /// Audio stream metadata, if an audio stream is present.
    pub audio: Option<AudioMetadata>,
    /// Total duration of the source.
    pub duration: Duration,
    /// Container format name (e.g. `"mov,mp4,m4a,3gp,3g2,mj2"`, `"matroska,webm"`).
    pub format: String,
}

/// Metadata for the best video stream.
#[derive(Debug, Clone)]
#[must_use]
pub struct VideoMetadata {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Frames per second (approximate for variable-frame-rate content).
    pub frames_per_second: f64,
    /// Codec name (e.g. `"h264"`, `"vp9"`).
    pub codec: String,
    /// Index of the stream inside the container.
    pub stream_index: usize,
}

/// Metadata for the best audio stream.
#[derive(Debug, Clone)]
#[must_use]
pub struct AudioMetadata {
    /// Sample rate in hertz.
    pub sample_rate: u32,
    /// Number of channels.
    pub channels: u16,
    /// Codec name (e.g. `"aac"`, `"opus"`).
    pub codec: String,
    /// Index of the stream inside the container.
    pub stream_index: usize,
}
