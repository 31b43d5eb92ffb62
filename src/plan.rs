//! Chunk planning.
//!
//! [`ChunkPlan`] turns a source duration and a rate parameter into the
//! ordered list of [`ChunkDescriptor`] slices the slicing pipeline walks.
//!
//! The chunk count is `floor(duration) * rate`: the fractional remainder of
//! the source duration is dropped entirely rather than sliced into a shorter
//! final chunk. Every chunk lasts exactly `1 / rate` seconds.
//!
//! # Example
//!
//! ```
//! use video_slicer::ChunkPlan;
//!
//! let plan = ChunkPlan::new(2.7, 4)?;
//! assert_eq!(plan.len(), 8);
//! assert_eq!(plan.chunks()[5].start_time, 1.25);
//! # Ok::<(), video_slicer::SlicerError>(())
//! ```

use std::time::Duration;

use crate::error::SlicerError;

/// One time slice of the source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChunkDescriptor {
    /// Zero-based position in the plan.
    pub index: u64,
    /// Offset of the slice from the start of the source, in seconds.
    pub start_time: f64,
    /// Length of the slice in seconds (`1 / rate`).
    pub duration: f64,
}

impl ChunkDescriptor {
    /// End of the slice in seconds (exclusive).
    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }

    /// One-based, three-digit zero-padded label shared by the chunk's
    /// audio and cover entries (`001`, `002`, ...).
    pub fn label(&self) -> String {
        format!("{:03}", self.index + 1)
    }

    /// Start offset as a [`Duration`].
    pub fn start(&self) -> Duration {
        Duration::from_secs_f64(self.start_time)
    }
}

/// The ordered set of chunks for one slicing run.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkPlan {
    rate: u32,
    whole_seconds: u64,
    chunks: Vec<ChunkDescriptor>,
}

impl ChunkPlan {
    /// Plan the chunks for a source of `total_duration` seconds at `rate`
    /// chunks per second.
    ///
    /// Negative or non-finite durations plan nothing.
    ///
    /// # Errors
    ///
    /// Returns [`SlicerError::InvalidRate`] if `rate` is zero.
    pub fn new(total_duration: f64, rate: u32) -> Result<Self, SlicerError> {
        if rate == 0 {
            return Err(SlicerError::InvalidRate(rate));
        }

        let whole_seconds = if total_duration.is_finite() && total_duration > 0.0 {
            total_duration.floor() as u64
        } else {
            0
        };

        let step = 1.0 / f64::from(rate);
        let mut chunks = Vec::with_capacity((whole_seconds * u64::from(rate)) as usize);

        // Seconds outer, sub-divisions inner: each whole second is split
        // independently so start times never accumulate rounding drift.
        for second in 0..whole_seconds {
            for sub_chunk in 0..u64::from(rate) {
                chunks.push(ChunkDescriptor {
                    index: second * u64::from(rate) + sub_chunk,
                    start_time: second as f64 + sub_chunk as f64 * step,
                    duration: step,
                });
            }
        }

        log::debug!(
            "Planned {} chunks ({}s x {} per second, remainder {:.3}s dropped)",
            chunks.len(),
            whole_seconds,
            rate,
            (total_duration - whole_seconds as f64).max(0.0),
        );

        Ok(Self {
            rate,
            whole_seconds,
            chunks,
        })
    }

    /// Chunks per second this plan was built with.
    pub fn rate(&self) -> u32 {
        self.rate
    }

    /// Whole seconds of source covered by the plan.
    pub fn whole_seconds(&self) -> u64 {
        self.whole_seconds
    }

    /// Length of every chunk in seconds.
    pub fn chunk_duration(&self) -> f64 {
        1.0 / f64::from(self.rate)
    }

    /// All chunks in index order.
    pub fn chunks(&self) -> &[ChunkDescriptor] {
        &self.chunks
    }

    /// Number of chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Returns `true` if the source is shorter than one second.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Iterate over chunks in index order.
    pub fn iter(&self) -> std::slice::Iter<'_, ChunkDescriptor> {
        self.chunks.iter()
    }
}

impl<'a> IntoIterator for &'a ChunkPlan {
    type Item = &'a ChunkDescriptor;
    type IntoIter = std::slice::Iter<'a, ChunkDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.chunks.iter()
    }
}

/// Number of chunks a source of `total_duration` seconds yields at `rate`.
///
/// Equivalent to `ChunkPlan::new(total_duration, rate)?.len()` without
/// materialising the descriptors.
pub fn chunk_count(total_duration: f64, rate: u32) -> u64 {
    if !total_duration.is_finite() || total_duration <= 0.0 {
        return 0;
    }
    total_duration.floor() as u64 * u64::from(rate)
}
