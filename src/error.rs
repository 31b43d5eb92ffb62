//! Error types for the `video-slicer` crate.
//!
//! This module defines [`SlicerError`], the unified error type returned by all
//! fallible operations in the crate. Every pipeline failure is terminal: the
//! caller receives exactly one error carrying its [`ErrorKind`] and a
//! human-readable cause, and no partial archive is ever returned.

use std::{io::Error as IoError, path::PathBuf, time::Duration};

use image::ImageError;
use thiserror::Error;
use zip::result::ZipError;

/// The unified error type for all `video-slicer` operations.
///
/// Every public method that can fail returns `Result<T, SlicerError>`.
/// Variants carry enough context to diagnose the problem without needing
/// additional logging at the call site.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SlicerError {
    /// The source media file could not be opened.
    #[error("Failed to open media file at {path}: {reason}")]
    FileOpen {
        /// Path that was passed to the media opener.
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The source does not contain an audio stream.
    #[error("No audio stream found in file")]
    NoAudioStream,

    /// The source does not contain a video stream.
    #[error("No video stream found in file")]
    NoVideoStream,

    /// Source media is unreadable or corrupt.
    #[error("Failed to decode source media: {0}")]
    DecodeError(String),

    /// The merge pipeline found no index present as both audio and cover.
    #[error("No matching audio/cover pairs found in archive")]
    NoMatchingPairs,

    /// Container construction failed, e.g. invalid sample geometry.
    #[error("Failed to encode audio container: {0}")]
    EncodingError(String),

    /// The audio buffer handed to the tag injector is malformed.
    #[error("Failed to inject tags: {0}")]
    TagInjectionError(String),

    /// Packing or unpacking the archive failed.
    #[error("Archive error: {0}")]
    ArchiveError(String),

    /// The requested capture time lies outside the source duration.
    #[error("Invalid timestamp: {0:?}")]
    InvalidTimestamp(Duration),

    /// The rate parameter must be at least one chunk per second.
    #[error("Invalid rate {0}: must be at least 1 chunk per second")]
    InvalidRate(u32),

    /// The operation was cancelled via a [`CancellationToken`](crate::CancellationToken).
    #[error("Operation cancelled")]
    Cancelled,

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate while compressing a cover.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),
}

/// Coarse failure category of a [`SlicerError`].
///
/// Lets callers surface a single notification per failed run without
/// matching on every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Source media unreadable or corrupt.
    Decode,
    /// No paired indices in the merge input.
    NoMatch,
    /// Audio container or cover construction failed.
    Encoding,
    /// Malformed audio input for tagging.
    TagInjection,
    /// Archive pack or unpack failure.
    Archive,
    /// The run was cancelled by the caller.
    Cancelled,
    /// Filesystem failure outside the archive codec.
    Io,
    /// The caller passed an invalid argument.
    Input,
}

impl SlicerError {
    /// Classify this error into its [`ErrorKind`].
    pub fn kind(&self) -> ErrorKind {
        match self {
            SlicerError::FileOpen { .. }
            | SlicerError::NoAudioStream
            | SlicerError::NoVideoStream
            | SlicerError::DecodeError(_)
            | SlicerError::FfmpegError(_) => ErrorKind::Decode,
            SlicerError::NoMatchingPairs => ErrorKind::NoMatch,
            SlicerError::EncodingError(_) | SlicerError::ImageError(_) => ErrorKind::Encoding,
            SlicerError::TagInjectionError(_) => ErrorKind::TagInjection,
            SlicerError::ArchiveError(_) => ErrorKind::Archive,
            SlicerError::Cancelled => ErrorKind::Cancelled,
            SlicerError::IoError(_) => ErrorKind::Io,
            SlicerError::InvalidTimestamp(_) | SlicerError::InvalidRate(_) => ErrorKind::Input,
        }
    }
}

#[cfg(feature = "ffmpeg")]
impl From<ffmpeg_next::Error> for SlicerError {
    fn from(error: ffmpeg_next::Error) -> Self {
        SlicerError::FfmpegError(error.to_string())
    }
}

impl From<ZipError> for SlicerError {
    fn from(error: ZipError) -> Self {
        SlicerError::ArchiveError(error.to_string())
    }
}
