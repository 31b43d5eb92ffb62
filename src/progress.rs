//! Progress reporting and cancellation support.
//!
//! Pipelines never touch UI state. They emit [`ProgressInfo`] snapshots to a
//! [`ProgressCallback`] and check a [`CancellationToken`] between work
//! items. Each phase of a run owns a fixed slice of the overall percentage,
//! so a progress bar advances monotonically from 0 to 100 across phases.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use video_slicer::{MediaFile, ProgressCallback, ProgressInfo, SliceOptions, Slicer};
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         println!("[{}] {:.1}% overall", info.phase, info.overall_percentage);
//!     }
//! }
//!
//! let source = MediaFile::open("input.mp4")?;
//! let options = SliceOptions::new().with_progress(Arc::new(PrintProgress));
//! let archive = Slicer::new(8)?.run(source, &options)?;
//! # Ok::<(), video_slicer::SlicerError>(())
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::ops::Range;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::{Duration, Instant};

/// The pipeline phase a progress report belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Phase {
    /// Decoding the source audio track.
    Decoding,
    /// Capturing covers and encoding audio chunks.
    Sampling,
    /// Reading the input archive.
    Unpacking,
    /// Pairing audio and cover entries.
    Matching,
    /// Writing tags into paired audio entries.
    Tagging,
    /// Writing the output archive.
    Packaging,
}

impl Display for Phase {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Phase::Decoding => write!(f, "decoding"),
            Phase::Sampling => write!(f, "sampling"),
            Phase::Unpacking => write!(f, "unpacking"),
            Phase::Matching => write!(f, "matching"),
            Phase::Tagging => write!(f, "tagging"),
            Phase::Packaging => write!(f, "packaging"),
        }
    }
}

/// A snapshot of pipeline progress.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// What kind of work is being performed.
    pub phase: Phase,
    /// Items completed in this phase so far.
    pub current: u64,
    /// Total items in this phase, if known ahead of time.
    pub total: Option<u64>,
    /// Completion of this phase (0.0 – 100.0), if `total` is known.
    pub percentage: Option<f32>,
    /// Completion of the whole run (0.0 – 100.0), scaled into the
    /// phase's reserved sub-range.
    pub overall_percentage: f32,
    /// Wall-clock time elapsed since the phase started.
    pub elapsed: Duration,
    /// Estimated time remaining in this phase, based on current throughput.
    pub estimated_remaining: Option<Duration>,
    /// Optional human-readable detail, such as the entry just written.
    pub message: Option<String>,
}

/// Trait for receiving progress updates.
///
/// Implementations must be [`Send`] and [`Sync`] because callbacks may be
/// invoked from worker threads in parallel or async contexts.
///
/// Progress callbacks are **infallible**: they observe but cannot halt the
/// run. Use [`CancellationToken`] for cooperative cancellation.
pub trait ProgressCallback: Send + Sync {
    /// Called at regular intervals during a pipeline run.
    fn on_progress(&self, info: &ProgressInfo);
}

/// A no-op implementation that discards all progress notifications.
///
/// This is the default when no callback is configured.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Cooperative cancellation token backed by an [`AtomicBool`].
///
/// Clone this token and share it between threads; call
/// [`cancel`](CancellationToken::cancel) from any thread to stop the
/// associated run at the next chunk or pair boundary.
///
/// # Example
///
/// ```
/// use video_slicer::CancellationToken;
///
/// let token = CancellationToken::new();
/// assert!(!token.is_cancelled());
///
/// token.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a new, non-cancelled token.
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request cancellation.
    ///
    /// All clones of this token will observe the cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Check whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Internal helper that tracks progress timing for one phase and emits
/// callbacks.
pub(crate) struct ProgressTracker {
    callback: Arc<dyn ProgressCallback>,
    phase: Phase,
    band: Range<f32>,
    total: Option<u64>,
    current: u64,
    batch_size: u64,
    start_time: Instant,
    items_since_last_report: u64,
}

impl ProgressTracker {
    /// Create a tracker for `phase`, mapping its completion onto `band` of
    /// the overall percentage.
    pub(crate) fn new(
        callback: Arc<dyn ProgressCallback>,
        phase: Phase,
        band: Range<f32>,
        total: Option<u64>,
        batch_size: u64,
    ) -> Self {
        Self {
            callback,
            phase,
            band,
            total,
            current: 0,
            batch_size: batch_size.max(1),
            start_time: Instant::now(),
            items_since_last_report: 0,
        }
    }

    /// Emit a report for the start of the phase.
    pub(crate) fn start(&self) {
        self.report(None);
    }

    /// Record one completed item and fire the callback if the batch
    /// threshold is reached.
    pub(crate) fn advance(&mut self, message: Option<String>) {
        self.current += 1;
        self.items_since_last_report += 1;

        if self.items_since_last_report >= self.batch_size {
            self.report(message);
            self.items_since_last_report = 0;
        }
    }

    /// Unconditionally emit a final report at the top of the band.
    pub(crate) fn finish(&mut self) {
        if let Some(total) = self.total {
            self.current = self.current.max(total);
        } else {
            self.total = Some(self.current);
        }
        self.report(None);
    }

    fn fraction(&self) -> Option<f32> {
        match self.total {
            Some(0) => Some(1.0),
            Some(total) => Some((self.current as f32 / total as f32).min(1.0)),
            None => None,
        }
    }

    fn report(&self, message: Option<String>) {
        let elapsed = self.start_time.elapsed();
        let fraction = self.fraction();

        let estimated_remaining = if self.current > 0 {
            self.total.map(|total| {
                let remaining = total.saturating_sub(self.current);
                elapsed.div_f64(self.current as f64).mul_f64(remaining as f64)
            })
        } else {
            None
        };

        let band_width = self.band.end - self.band.start;
        let info = ProgressInfo {
            phase: self.phase,
            current: self.current,
            total: self.total,
            percentage: fraction.map(|fraction| fraction * 100.0),
            overall_percentage: self.band.start + band_width * fraction.unwrap_or(0.0),
            elapsed,
            estimated_remaining,
            message,
        };

        self.callback.on_progress(&info);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<ProgressInfo>>);

    impl ProgressCallback for Recorder {
        fn on_progress(&self, info: &ProgressInfo) {
            self.0.lock().unwrap().push(info.clone());
        }
    }

    #[test]
    fn overall_percentage_stays_inside_band() {
        let recorder = Arc::new(Recorder::default());
        let mut tracker =
            ProgressTracker::new(recorder.clone(), Phase::Sampling, 10.0..90.0, Some(4), 1);
        tracker.start();
        for _ in 0..4 {
            tracker.advance(None);
        }
        tracker.finish();

        let infos = recorder.0.lock().unwrap();
        assert_eq!(infos.len(), 6);
        assert_eq!(infos[0].overall_percentage, 10.0);
        assert_eq!(infos[2].overall_percentage, 50.0);
        assert_eq!(infos[5].overall_percentage, 90.0);
        assert_eq!(infos[5].percentage, Some(100.0));
    }

    #[test]
    fn batch_size_throttles_reports() {
        let recorder = Arc::new(Recorder::default());
        let mut tracker =
            ProgressTracker::new(recorder.clone(), Phase::Tagging, 15.0..90.0, Some(10), 5);
        for _ in 0..10 {
            tracker.advance(None);
        }
        assert_eq!(recorder.0.lock().unwrap().len(), 2);
    }

    #[test]
    fn empty_phase_finishes_at_band_end() {
        let recorder = Arc::new(Recorder::default());
        let mut tracker =
            ProgressTracker::new(recorder.clone(), Phase::Packaging, 90.0..100.0, None, 1);
        tracker.finish();
        let infos = recorder.0.lock().unwrap();
        assert_eq!(infos[0].overall_percentage, 100.0);
    }

    #[test]
    fn phases_display_lowercase() {
        assert_eq!(Phase::Sampling.to_string(), "sampling");
        assert_eq!(Phase::Packaging.to_string(), "packaging");
    }
}
