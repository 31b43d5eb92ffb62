//! Parallel chunk encoding.
//!
//! Frame capture is bound to the single decode handle, so covers are still
//! captured one chunk at a time. What [`Slicer::run_parallel`] spreads
//! across [`rayon`] threads is the CPU-bound part: JPEG compression of the
//! captured frames and WAV encoding of the audio windows. Results are
//! collected in plan order, so the archive is identical to a sequential
//! run.

use std::sync::{Mutex, PoisonError};

use ::rayon::iter::{IntoParallelIterator, ParallelIterator};
use image::DynamicImage;

use crate::{
    archive::Archive,
    configuration::SliceOptions,
    cover::encode_cover,
    error::SlicerError,
    plan::ChunkDescriptor,
    progress::{Phase, ProgressTracker},
    slice::{SlicePhase, Slicer, audio_entry_name, cover_entry_name},
    source::MediaSource,
    wav::encode_wav,
};

impl Slicer {
    /// Like [`run`](Slicer::run), but encodes chunks on the rayon pool.
    ///
    /// All captured frames are held in memory until encoding finishes.
    ///
    /// # Errors
    ///
    /// As [`run`](Slicer::run). When several chunks fail, the error of the
    /// earliest failing chunk is not guaranteed to be the one returned.
    pub fn run_parallel<S: MediaSource>(
        &mut self,
        mut source: S,
        options: &SliceOptions,
    ) -> Result<Vec<u8>, SlicerError> {
        self.guard(|slicer| {
            let (plan, buffer) = slicer.decode(&mut source, options)?;

            // Capture: 10-50%, encode: 50-90%.
            let mut capture = ProgressTracker::new(
                options.progress.clone(),
                Phase::Sampling,
                10.0..50.0,
                Some(plan.len() as u64),
                options.batch_size,
            );
            capture.start();

            let mut frames: Vec<(ChunkDescriptor, DynamicImage)> = Vec::with_capacity(plan.len());
            for chunk in &plan {
                if options.is_cancelled() {
                    return Err(SlicerError::Cancelled);
                }
                slicer.phase = SlicePhase::Sampling { index: chunk.index };
                frames.push((*chunk, source.capture_frame_at(chunk.start_time)?));
                capture.advance(None);
            }
            capture.finish();
            drop(source);

            let encode = Mutex::new(ProgressTracker::new(
                options.progress.clone(),
                Phase::Sampling,
                50.0..90.0,
                Some(plan.len() as u64),
                options.batch_size,
            ));

            let encoded: Vec<(ChunkDescriptor, Vec<u8>, Vec<u8>)> = frames
                .into_par_iter()
                .map(|(chunk, frame)| {
                    if options.is_cancelled() {
                        return Err(SlicerError::Cancelled);
                    }
                    let cover = encode_cover(&frame)?;
                    let audio = encode_wav(&buffer.window(chunk.start_time, chunk.duration))?;
                    encode
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .advance(Some(audio_entry_name(&chunk)));
                    Ok((chunk, cover, audio))
                })
                .collect::<Result<_, SlicerError>>()?;

            encode
                .into_inner()
                .unwrap_or_else(PoisonError::into_inner)
                .finish();
            log::debug!("Encoded {} chunks in parallel", encoded.len());

            let mut archive = Archive::new();
            for (chunk, cover, audio) in encoded {
                archive.insert(cover_entry_name(&chunk), cover)?;
                archive.insert(audio_entry_name(&chunk), audio)?;
            }
            slicer.package(&archive, options)
        })
    }
}
