//! The slicing pipeline.
//!
//! [`Slicer`] turns a [`MediaSource`] into an archive holding, for every
//! planned chunk, one `audio_NNN.wav` and one `cover_NNN.jpg` under the same
//! one-based, three-digit label.
//!
//! A run walks `Idle → Decoding → Sampling(0..N) → Packaging → Done`, with
//! `Failed` reachable from every step. The whole audio track is decoded
//! once up front; chunks are then processed strictly in plan order. Any
//! failure aborts the run and no archive is returned.
//!
//! # Example
//!
//! ```no_run
//! use video_slicer::{MediaFile, SliceOptions, Slicer};
//!
//! let source = MediaFile::open("input.mp4")?;
//! let zip = Slicer::new(8)?.run(source, &SliceOptions::new())?;
//! std::fs::write("slices.zip", zip)?;
//! # Ok::<(), video_slicer::SlicerError>(())
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::{
    archive::Archive,
    audio::AudioBuffer,
    configuration::SliceOptions,
    cover::{COVER_EXTENSION, encode_cover},
    error::SlicerError,
    plan::{ChunkDescriptor, ChunkPlan},
    progress::{Phase, ProgressTracker},
    source::MediaSource,
    wav::encode_wav,
};

#[cfg(feature = "ffmpeg")]
use std::path::Path;

#[cfg(feature = "ffmpeg")]
use crate::media::MediaFile;

/// Where a [`Slicer`] currently is in its run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlicePhase {
    /// Not started.
    Idle,
    /// Decoding the audio track.
    Decoding,
    /// Capturing and encoding the chunk with this zero-based index.
    Sampling {
        /// Index of the chunk being processed.
        index: u64,
    },
    /// Writing the output archive.
    Packaging,
    /// Finished successfully.
    Done,
    /// Aborted by an error or cancellation.
    Failed,
}

impl Display for SlicePhase {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            SlicePhase::Idle => write!(f, "idle"),
            SlicePhase::Decoding => write!(f, "decoding"),
            SlicePhase::Sampling { index } => write!(f, "sampling chunk {index}"),
            SlicePhase::Packaging => write!(f, "packaging"),
            SlicePhase::Done => write!(f, "done"),
            SlicePhase::Failed => write!(f, "failed"),
        }
    }
}

/// Archive name of a chunk's audio entry, e.g. `audio_001.wav`.
pub fn audio_entry_name(chunk: &ChunkDescriptor) -> String {
    format!("audio_{}.wav", chunk.label())
}

/// Archive name of a chunk's cover entry, e.g. `cover_001.jpg`.
pub fn cover_entry_name(chunk: &ChunkDescriptor) -> String {
    format!("cover_{}.{COVER_EXTENSION}", chunk.label())
}

/// Drives one slicing run at a fixed rate.
#[derive(Debug, Clone)]
pub struct Slicer {
    pub(crate) rate: u32,
    pub(crate) phase: SlicePhase,
}

impl Slicer {
    /// Create a slicer producing `rate` chunks per second.
    ///
    /// Upper bounds on the rate are left to the caller.
    ///
    /// # Errors
    ///
    /// Returns [`SlicerError::InvalidRate`] if `rate` is zero.
    pub fn new(rate: u32) -> Result<Self, SlicerError> {
        if rate == 0 {
            return Err(SlicerError::InvalidRate(rate));
        }
        Ok(Self {
            rate,
            phase: SlicePhase::Idle,
        })
    }

    /// Chunks per second.
    pub fn rate(&self) -> u32 {
        self.rate
    }

    /// The phase reached by the most recent run.
    pub fn phase(&self) -> SlicePhase {
        self.phase
    }

    /// Slice `source` and return the packaged zip archive.
    ///
    /// The source is dropped before this returns, on success and on
    /// failure alike.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by decoding, capture, encoding or
    /// packaging, or [`SlicerError::Cancelled`] if the options' token was
    /// cancelled before a chunk.
    pub fn run<S: MediaSource>(
        &mut self,
        mut source: S,
        options: &SliceOptions,
    ) -> Result<Vec<u8>, SlicerError> {
        self.guard(|slicer| {
            let archive = slicer.sample(&mut source, options)?;
            drop(source);
            slicer.package(&archive, options)
        })
    }

    /// Slice `source` into an in-memory [`Archive`] without packaging it.
    ///
    /// # Errors
    ///
    /// Same as [`run`](Slicer::run), minus packaging failures.
    pub fn run_archive<S: MediaSource>(
        &mut self,
        mut source: S,
        options: &SliceOptions,
    ) -> Result<Archive, SlicerError> {
        self.guard(|slicer| slicer.sample(&mut source, options))
    }

    /// Run `step`, recording `Done` or `Failed` once it returns.
    pub(crate) fn guard<T>(
        &mut self,
        step: impl FnOnce(&mut Self) -> Result<T, SlicerError>,
    ) -> Result<T, SlicerError> {
        self.phase = SlicePhase::Idle;
        match step(self) {
            Ok(value) => {
                self.phase = SlicePhase::Done;
                Ok(value)
            }
            Err(error) => {
                log::warn!("Slicing failed while {}: {error}", self.phase);
                self.phase = SlicePhase::Failed;
                Err(error)
            }
        }
    }

    /// Decode the audio track and build the chunk plan.
    pub(crate) fn decode<S: MediaSource>(
        &mut self,
        source: &mut S,
        options: &SliceOptions,
    ) -> Result<(ChunkPlan, AudioBuffer), SlicerError> {
        if options.is_cancelled() {
            return Err(SlicerError::Cancelled);
        }

        self.phase = SlicePhase::Decoding;
        let mut tracker = ProgressTracker::new(
            options.progress.clone(),
            Phase::Decoding,
            0.0..10.0,
            Some(1),
            1,
        );
        tracker.start();

        let duration = source.duration();
        let plan = ChunkPlan::new(duration, self.rate)?;
        let buffer = source.decode_audio()?;
        tracker.finish();

        log::info!(
            "Decoded {:.3}s of audio ({} Hz, {} channels); slicing {:.3}s source into {} chunks",
            buffer.duration_seconds(),
            buffer.sample_rate(),
            buffer.channel_count(),
            duration,
            plan.len(),
        );
        Ok((plan, buffer))
    }

    fn sample<S: MediaSource>(
        &mut self,
        source: &mut S,
        options: &SliceOptions,
    ) -> Result<Archive, SlicerError> {
        let (plan, buffer) = self.decode(source, options)?;

        let mut tracker = ProgressTracker::new(
            options.progress.clone(),
            Phase::Sampling,
            10.0..90.0,
            Some(plan.len() as u64),
            options.batch_size,
        );
        tracker.start();

        let mut archive = Archive::new();
        for chunk in &plan {
            if options.is_cancelled() {
                log::info!("Slicing cancelled before chunk {}", chunk.index);
                return Err(SlicerError::Cancelled);
            }
            self.phase = SlicePhase::Sampling { index: chunk.index };

            let frame = source.capture_frame_at(chunk.start_time)?;
            let cover = encode_cover(&frame)?;
            let audio = encode_wav(&buffer.window(chunk.start_time, chunk.duration))?;

            let audio_name = audio_entry_name(chunk);
            archive.insert(cover_entry_name(chunk), cover)?;
            archive.insert(audio_name.clone(), audio)?;
            log::trace!(
                "Chunk {} [{:.3}s, {:.3}s) sliced",
                chunk.index,
                chunk.start_time,
                chunk.end_time()
            );
            tracker.advance(Some(audio_name));
        }
        tracker.finish();

        Ok(archive)
    }

    pub(crate) fn package(
        &mut self,
        archive: &Archive,
        options: &SliceOptions,
    ) -> Result<Vec<u8>, SlicerError> {
        self.phase = SlicePhase::Packaging;
        let mut tracker = ProgressTracker::new(
            options.progress.clone(),
            Phase::Packaging,
            90.0..100.0,
            Some(1),
            1,
        );
        tracker.start();
        let bytes = archive.to_zip_bytes()?;
        tracker.finish();
        log::info!(
            "Packaged {} entries into a {} byte archive",
            archive.len(),
            bytes.len()
        );
        Ok(bytes)
    }
}

/// Open the video at `path` and slice it at `rate` chunks per second.
///
/// # Errors
///
/// Returns [`SlicerError::InvalidRate`] for a zero rate, any error from
/// [`MediaFile::open`], or any error from [`Slicer::run`].
#[cfg(feature = "ffmpeg")]
pub fn slice_file<P: AsRef<Path>>(
    path: P,
    rate: u32,
    options: &SliceOptions,
) -> Result<Vec<u8>, SlicerError> {
    let mut slicer = Slicer::new(rate)?;
    let source = MediaFile::open(path)?;
    slicer.run(source, options)
}

/// Slice a video held in memory. `extension` is an optional container
/// hint such as `"mp4"`.
///
/// # Errors
///
/// As [`slice_file`], plus spool-file I/O errors.
#[cfg(feature = "ffmpeg")]
pub fn slice_bytes(
    bytes: &[u8],
    extension: Option<&str>,
    rate: u32,
    options: &SliceOptions,
) -> Result<Vec<u8>, SlicerError> {
    let mut slicer = Slicer::new(rate)?;
    let source = MediaFile::open_bytes(bytes, extension)?;
    slicer.run(source, options)
}

#[cfg(test)]
mod tests {
    use image::{DynamicImage, RgbImage};

    use super::*;

    struct Flat {
        duration: f64,
        fail_capture_at: Option<f64>,
    }

    impl MediaSource for Flat {
        fn duration(&self) -> f64 {
            self.duration
        }

        fn decode_audio(&mut self) -> Result<AudioBuffer, SlicerError> {
            let frames = (self.duration * 1_000.0) as usize;
            AudioBuffer::new(1_000, vec![vec![0.25; frames]])
        }

        fn capture_frame_at(&mut self, time: f64) -> Result<DynamicImage, SlicerError> {
            if self.fail_capture_at.is_some_and(|at| time >= at) {
                return Err(SlicerError::DecodeError("seek failed".to_string()));
            }
            Ok(DynamicImage::ImageRgb8(RgbImage::new(8, 8)))
        }
    }

    #[test]
    fn zero_rate_is_rejected() {
        assert!(matches!(Slicer::new(0), Err(SlicerError::InvalidRate(0))));
    }

    #[test]
    fn entry_names_share_the_label() {
        let chunk = ChunkDescriptor {
            index: 41,
            start_time: 5.0,
            duration: 0.125,
        };
        assert_eq!(audio_entry_name(&chunk), "audio_042.wav");
        assert_eq!(cover_entry_name(&chunk), "cover_042.jpg");
    }

    #[test]
    fn archive_holds_a_pair_per_chunk() {
        let mut slicer = Slicer::new(4).unwrap();
        let source = Flat {
            duration: 1.5,
            fail_capture_at: None,
        };
        let archive = slicer.run_archive(source, &SliceOptions::new()).unwrap();

        assert_eq!(slicer.phase(), SlicePhase::Done);
        assert_eq!(archive.len(), 8);
        assert_eq!(archive.get("audio_004.wav").map(<[u8]>::len), Some(44 + 250 * 2));
        assert!(archive.contains("cover_004.jpg"));
        assert!(!archive.contains("audio_005.wav"));
    }

    #[test]
    fn failure_records_the_phase_and_returns_nothing() {
        let mut slicer = Slicer::new(2).unwrap();
        let source = Flat {
            duration: 3.0,
            fail_capture_at: Some(1.0),
        };
        let result = slicer.run(source, &SliceOptions::new());
        assert!(matches!(result, Err(SlicerError::DecodeError(_))));
        assert_eq!(slicer.phase(), SlicePhase::Failed);
    }
}
