//! The tag embedding pipeline.
//!
//! [`TagEmbedder`] is the reverse of slicing: it reads an archive of
//! separate `audio_NNN.*` and `cover_NNN.*` entries, pairs them by index,
//! and writes each audio entry back out with its cover and text tags
//! embedded, as `audio_NNN_with_cover.<ext>`.
//!
//! A run walks `Idle → Unpacking → Matching → Tagging(0..M) → Packaging →
//! Done`, with `Failed` reachable from every step. An archive with no
//! complete pair fails with [`SlicerError::NoMatchingPairs`].
//!
//! # Example
//!
//! ```no_run
//! use video_slicer::{EmbedOptions, TagEmbedder};
//!
//! let input = std::fs::read("slices.zip")?;
//! let tagged = TagEmbedder::new().run(&input, &EmbedOptions::new())?;
//! std::fs::write("tagged.zip", tagged)?;
//! # Ok::<(), video_slicer::SlicerError>(())
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::{
    archive::Archive,
    configuration::EmbedOptions,
    error::SlicerError,
    matcher::{PairMatch, match_pairs},
    progress::{Phase, ProgressTracker},
    tag::inject_tags,
};

/// Where a [`TagEmbedder`] currently is in its run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedPhase {
    /// Not started.
    Idle,
    /// Reading the input archive.
    Unpacking,
    /// Pairing audio and cover entries.
    Matching,
    /// Tagging the pair at this position in discovery order.
    Tagging {
        /// Zero-based position of the pair.
        position: usize,
    },
    /// Writing the output archive.
    Packaging,
    /// Finished successfully.
    Done,
    /// Aborted by an error or cancellation.
    Failed,
}

impl Display for EmbedPhase {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            EmbedPhase::Idle => write!(f, "idle"),
            EmbedPhase::Unpacking => write!(f, "unpacking"),
            EmbedPhase::Matching => write!(f, "matching"),
            EmbedPhase::Tagging { position } => write!(f, "tagging pair {position}"),
            EmbedPhase::Packaging => write!(f, "packaging"),
            EmbedPhase::Done => write!(f, "done"),
            EmbedPhase::Failed => write!(f, "failed"),
        }
    }
}

/// Output name for a tagged pair: `audio_{index}_with_cover.{ext}`.
///
/// The index and extension are carried over exactly as they appeared in
/// the input entry name.
pub fn tagged_entry_name(pair: &PairMatch) -> String {
    format!("audio_{}_with_cover.{}", pair.index, pair.audio_extension)
}

/// Drives one tag embedding run.
#[derive(Debug, Clone)]
pub struct TagEmbedder {
    phase: EmbedPhase,
}

impl Default for TagEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

impl TagEmbedder {
    /// Create an idle embedder.
    pub fn new() -> Self {
        Self {
            phase: EmbedPhase::Idle,
        }
    }

    /// The phase reached by the most recent run.
    pub fn phase(&self) -> EmbedPhase {
        self.phase
    }

    /// Tag every pair in the zip archive `input` and return the packaged
    /// output archive.
    ///
    /// # Errors
    ///
    /// Returns [`SlicerError::ArchiveError`] if `input` cannot be unpacked,
    /// [`SlicerError::NoMatchingPairs`] if no index has both an audio and a
    /// cover entry, [`SlicerError::TagInjectionError`] for the first
    /// malformed audio entry, or [`SlicerError::Cancelled`].
    pub fn run(&mut self, input: &[u8], options: &EmbedOptions) -> Result<Vec<u8>, SlicerError> {
        self.guard(|embedder| {
            let archive = embedder.unpack(input, options)?;
            let tagged = embedder.tag(&archive, options)?;
            embedder.package(&tagged, options)
        })
    }

    /// Tag every pair of an in-memory archive without zip round trips.
    ///
    /// # Errors
    ///
    /// As [`run`](TagEmbedder::run), minus archive codec failures.
    pub fn run_archive(
        &mut self,
        archive: &Archive,
        options: &EmbedOptions,
    ) -> Result<Archive, SlicerError> {
        self.guard(|embedder| embedder.tag(archive, options))
    }

    fn guard<T>(
        &mut self,
        step: impl FnOnce(&mut Self) -> Result<T, SlicerError>,
    ) -> Result<T, SlicerError> {
        self.phase = EmbedPhase::Idle;
        match step(self) {
            Ok(value) => {
                self.phase = EmbedPhase::Done;
                Ok(value)
            }
            Err(error) => {
                log::warn!("Tag embedding failed while {}: {error}", self.phase);
                self.phase = EmbedPhase::Failed;
                Err(error)
            }
        }
    }

    fn unpack(&mut self, input: &[u8], options: &EmbedOptions) -> Result<Archive, SlicerError> {
        if options.is_cancelled() {
            return Err(SlicerError::Cancelled);
        }
        self.phase = EmbedPhase::Unpacking;
        let mut tracker = ProgressTracker::new(
            options.progress.clone(),
            Phase::Unpacking,
            0.0..10.0,
            Some(1),
            1,
        );
        tracker.start();
        let archive = Archive::from_zip_bytes(input)?;
        tracker.finish();
        Ok(archive)
    }

    fn tag(&mut self, archive: &Archive, options: &EmbedOptions) -> Result<Archive, SlicerError> {
        self.phase = EmbedPhase::Matching;
        let mut matching = ProgressTracker::new(
            options.progress.clone(),
            Phase::Matching,
            10.0..15.0,
            Some(1),
            1,
        );
        matching.start();
        let pairs = match_pairs(archive.names());
        matching.finish();

        if pairs.is_empty() {
            return Err(SlicerError::NoMatchingPairs);
        }
        log::info!(
            "Tagging {} pairs out of {} archive entries",
            pairs.len(),
            archive.len()
        );

        let mut tracker = ProgressTracker::new(
            options.progress.clone(),
            Phase::Tagging,
            15.0..90.0,
            Some(pairs.len() as u64),
            options.batch_size,
        );
        tracker.start();

        let mut output = Archive::new();
        for (position, pair) in pairs.iter().enumerate() {
            if options.is_cancelled() {
                log::info!("Tag embedding cancelled before pair {}", pair.index);
                return Err(SlicerError::Cancelled);
            }
            self.phase = EmbedPhase::Tagging { position };

            let audio = entry(archive, &pair.audio)?;
            let cover = entry(archive, &pair.cover)?;
            let fields = options.template.fields_for(&pair.index);
            let tagged = inject_tags(audio, cover, &fields).map_err(|error| match error {
                SlicerError::TagInjectionError(reason) => {
                    SlicerError::TagInjectionError(format!("{}: {reason}", pair.audio))
                }
                other => other,
            })?;

            let name = tagged_entry_name(pair);
            log::debug!("Tagged {} with {} as {name}", pair.audio, pair.cover);
            output.insert(name.clone(), tagged)?;
            tracker.advance(Some(name));
        }
        tracker.finish();

        Ok(output)
    }

    fn package(&mut self, archive: &Archive, options: &EmbedOptions) -> Result<Vec<u8>, SlicerError> {
        self.phase = EmbedPhase::Packaging;
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
            "Packaged {} tagged entries into a {} byte archive",
            archive.len(),
            bytes.len()
        );
        Ok(bytes)
    }
}

fn entry<'a>(archive: &'a Archive, name: &str) -> Result<&'a [u8], SlicerError> {
    archive
        .get(name)
        .ok_or_else(|| SlicerError::ArchiveError(format!("missing archive entry {name}")))
}

/// Tag every pair in the zip archive `input` with default settings.
///
/// # Errors
///
/// As [`TagEmbedder::run`].
pub fn embed_archive(input: &[u8], options: &EmbedOptions) -> Result<Vec<u8>, SlicerError> {
    TagEmbedder::new().run(input, options)
}
