//! Progress and cancellation integration tests.

mod common;

use std::sync::{Arc, Mutex};

use common::SyntheticSource;
use video_slicer::{
    Archive, CancellationToken, EmbedOptions, Phase, ProgressCallback, ProgressInfo, SliceOptions,
    SlicePhase, Slicer, SlicerError, TagEmbedder,
};

// ── CancellationToken ──────────────────────────────────────────────

#[test]
fn cancellation_token_clone_shares_state() {
    let token = CancellationToken::new();
    let clone = token.clone();
    assert!(!clone.is_cancelled());

    token.cancel();
    assert!(clone.is_cancelled());
}

#[test]
fn cancellation_token_default_trait() {
    assert!(!CancellationToken::default().is_cancelled());
}

// ── Recording ──────────────────────────────────────────────────────

#[derive(Default)]
struct RecordingProgress {
    infos: Mutex<Vec<ProgressInfo>>,
}

impl RecordingProgress {
    fn infos(&self) -> Vec<ProgressInfo> {
        self.infos.lock().unwrap().clone()
    }
}

impl ProgressCallback for RecordingProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        self.infos.lock().unwrap().push(info.clone());
    }
}

/// Cancels its token once `limit` sampling reports have been seen.
struct CancelAfter {
    token: CancellationToken,
    limit: u64,
}

impl ProgressCallback for CancelAfter {
    fn on_progress(&self, info: &ProgressInfo) {
        if info.phase == Phase::Sampling && info.current >= self.limit {
            self.token.cancel();
        }
    }
}

fn assert_monotonic(infos: &[ProgressInfo]) {
    for window in infos.windows(2) {
        assert!(
            window[1].overall_percentage >= window[0].overall_percentage,
            "progress went backwards: {} -> {}",
            window[0].overall_percentage,
            window[1].overall_percentage
        );
    }
}

// ── Slicing ────────────────────────────────────────────────────────

#[test]
fn slicing_reports_every_phase_in_order() {
    let recorder = Arc::new(RecordingProgress::default());
    let options = SliceOptions::new().with_progress(recorder.clone());
    Slicer::new(2)
        .unwrap()
        .run(SyntheticSource::new(2.0), &options)
        .unwrap();

    let infos = recorder.infos();
    assert_monotonic(&infos);

    let mut phases: Vec<Phase> = infos.iter().map(|info| info.phase).collect();
    phases.dedup();
    assert_eq!(
        phases,
        vec![Phase::Decoding, Phase::Sampling, Phase::Packaging]
    );

    let sampling: Vec<&ProgressInfo> = infos
        .iter()
        .filter(|info| info.phase == Phase::Sampling)
        .collect();
    assert!(sampling.iter().all(|info| info.total == Some(4)));
    assert!(
        sampling
            .iter()
            .any(|info| info.message.as_deref() == Some("audio_003.wav"))
    );

    let last = infos.last().unwrap();
    assert_eq!(last.overall_percentage, 100.0);
}

#[test]
fn batch_size_limits_sampling_reports() {
    let recorder = Arc::new(RecordingProgress::default());
    let options = SliceOptions::new()
        .with_progress(recorder.clone())
        .with_batch_size(4);
    Slicer::new(4)
        .unwrap()
        .run(SyntheticSource::new(2.0), &options)
        .unwrap();

    // start + two batches of four + finish
    let sampling = recorder
        .infos()
        .into_iter()
        .filter(|info| info.phase == Phase::Sampling)
        .count();
    assert_eq!(sampling, 4);
}

#[test]
fn cancelled_before_start_returns_error() {
    let token = CancellationToken::new();
    token.cancel();

    let options = SliceOptions::new().with_cancellation(token);
    let mut slicer = Slicer::new(8).unwrap();
    let result = slicer.run(SyntheticSource::new(3.0), &options);

    assert!(matches!(result, Err(SlicerError::Cancelled)));
    assert_eq!(slicer.phase(), SlicePhase::Failed);
}

#[test]
fn cancelled_between_chunks_stops_capturing() {
    let token = CancellationToken::new();
    let options = SliceOptions::new()
        .with_cancellation(token.clone())
        .with_progress(Arc::new(CancelAfter { token, limit: 3 }));

    let source = SyntheticSource::new(5.0);
    let captures = source.captures.clone();
    let result = Slicer::new(4).unwrap().run(source, &options);

    assert!(matches!(result, Err(SlicerError::Cancelled)));
    assert_eq!(captures.load(std::sync::atomic::Ordering::SeqCst), 3);
}

// ── Embedding ──────────────────────────────────────────────────────

#[test]
fn embedding_reports_every_phase_in_order() {
    let sliced = Slicer::new(1)
        .unwrap()
        .run(SyntheticSource::new(3.0), &SliceOptions::new())
        .unwrap();

    let recorder = Arc::new(RecordingProgress::default());
    let options = EmbedOptions::new().with_progress(recorder.clone());
    TagEmbedder::new().run(&sliced, &options).unwrap();

    let infos = recorder.infos();
    assert_monotonic(&infos);

    let mut phases: Vec<Phase> = infos.iter().map(|info| info.phase).collect();
    phases.dedup();
    assert_eq!(
        phases,
        vec![
            Phase::Unpacking,
            Phase::Matching,
            Phase::Tagging,
            Phase::Packaging
        ]
    );
    assert_eq!(infos.last().unwrap().overall_percentage, 100.0);
}

#[test]
fn cancelled_embedding_returns_error() {
    let mut archive = Archive::new();
    archive
        .insert("audio_001.mp3", vec![0xFF, 0xFB, 0x90, 0x64])
        .unwrap();
    archive
        .insert("cover_001.jpg", vec![0xFF, 0xD8, 0xFF])
        .unwrap();

    let token = CancellationToken::new();
    token.cancel();
    let options = EmbedOptions::new().with_cancellation(token);

    let result = TagEmbedder::new().run(&archive.to_zip_bytes().unwrap(), &options);
    assert!(matches!(result, Err(SlicerError::Cancelled)));
}
