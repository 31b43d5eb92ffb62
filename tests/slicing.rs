//! Slicing pipeline integration tests.
//!
//! Driven by the in-memory source in `common`, so no media fixtures are
//! needed.

mod common;

use std::sync::atomic::Ordering;

use common::{
    FRAME_HEIGHT, FRAME_WIDTH, SAMPLE_RATE, SyntheticSource, cover_brightness,
    expected_brightness, expected_sample, wav_samples,
};
use video_slicer::{
    Archive, ErrorKind, SliceOptions, SlicePhase, Slicer, SlicerError, sample_to_i16,
};

fn slice(duration: f64, rate: u32) -> Archive {
    let zip = Slicer::new(rate)
        .unwrap()
        .run(SyntheticSource::new(duration), &SliceOptions::new())
        .expect("slicing should succeed");
    Archive::from_zip_bytes(&zip).expect("output should be a valid zip")
}

#[test]
fn two_seconds_at_rate_two_names() {
    let archive = slice(2.0, 2);
    let mut names: Vec<&str> = archive.names().collect();
    names.sort_unstable();
    assert_eq!(
        names,
        vec![
            "audio_001.wav",
            "audio_002.wav",
            "audio_003.wav",
            "audio_004.wav",
            "cover_001.jpg",
            "cover_002.jpg",
            "cover_003.jpg",
            "cover_004.jpg",
        ]
    );
}

#[test]
fn ten_seconds_at_rate_eight() {
    let archive = slice(10.0, 8);
    assert_eq!(archive.len(), 160);

    for label in 1..=80 {
        assert!(archive.contains(&format!("audio_{label:03}.wav")));
        assert!(archive.contains(&format!("cover_{label:03}.jpg")));
    }
    assert!(!archive.contains("audio_081.wav"));
}

#[test]
fn first_chunk_covers_the_first_eighth_second() {
    let archive = slice(10.0, 8);
    let (spec, channels) = wav_samples(archive.get("audio_001.wav").unwrap());

    assert_eq!(spec.channels, 2);
    assert_eq!(spec.sample_rate, SAMPLE_RATE);
    assert_eq!(spec.bits_per_sample, 16);
    assert_eq!(channels[0].len(), (SAMPLE_RATE / 8) as usize);

    for (frame, &sample) in channels[0].iter().enumerate() {
        assert_eq!(sample, sample_to_i16(expected_sample(0, frame, 10.0)));
    }
}

#[test]
fn last_chunk_covers_the_final_eighth_second() {
    let archive = slice(10.0, 8);
    let (_, channels) = wav_samples(archive.get("audio_080.wav").unwrap());

    let start = (9.875 * f64::from(SAMPLE_RATE)) as usize;
    assert_eq!(channels[1].len(), 1_000);
    for (offset, &sample) in channels[1].iter().enumerate() {
        assert_eq!(sample, sample_to_i16(expected_sample(1, start + offset, 10.0)));
    }
}

#[test]
fn fractional_remainder_is_dropped() {
    let archive = slice(2.9, 4);
    assert_eq!(archive.len(), 16);
    assert!(!archive.contains("audio_009.wav"));
}

#[test]
fn zero_duration_produces_an_empty_archive() {
    assert!(slice(0.0, 8).is_empty());
    assert!(slice(0.75, 8).is_empty());
}

#[test]
fn covers_are_captured_at_chunk_start() {
    let duration = 3.0;
    let archive = slice(duration, 2);

    for (label, start) in [(1, 0.0), (2, 0.5), (4, 1.5), (6, 2.5)] {
        let cover = archive.get(&format!("cover_{label:03}.jpg")).unwrap();
        let image = image::load_from_memory(cover).unwrap();
        assert_eq!((image.width(), image.height()), (FRAME_WIDTH, FRAME_HEIGHT));

        let expected = i16::from(expected_brightness(start, duration));
        let actual = i16::from(cover_brightness(cover));
        assert!(
            (expected - actual).abs() <= 3,
            "cover {label}: expected grey {expected}, got {actual}"
        );
    }
}

#[test]
fn every_chunk_has_equal_length() {
    let archive = slice(3.0, 3);
    let lengths: Vec<usize> = archive
        .entries()
        .iter()
        .filter(|entry| entry.name.starts_with("audio_"))
        .map(|entry| entry.bytes.len())
        .collect();
    assert_eq!(lengths.len(), 9);
    assert!(lengths.iter().all(|&length| length == lengths[0]));
}

#[test]
fn decode_failure_produces_no_archive() {
    let source = SyntheticSource::failing_decode(5.0);
    let dropped = source.dropped.clone();

    let mut slicer = Slicer::new(8).unwrap();
    let error = slicer.run(source, &SliceOptions::new()).unwrap_err();

    assert_eq!(error.kind(), ErrorKind::Decode);
    assert_eq!(slicer.phase(), SlicePhase::Failed);
    assert!(dropped.load(Ordering::SeqCst), "source should be released");
}

#[test]
fn capture_failure_aborts_remaining_chunks() {
    let source = SyntheticSource::failing_capture_after(4.0, 3);
    let captures = source.captures.clone();

    let result = Slicer::new(2).unwrap().run(source, &SliceOptions::new());
    assert!(matches!(result, Err(SlicerError::DecodeError(_))));
    assert_eq!(captures.load(Ordering::SeqCst), 4);
}

#[test]
fn source_is_released_after_success() {
    let source = SyntheticSource::new(1.0);
    let dropped = source.dropped.clone();
    let mut slicer = Slicer::new(1).unwrap();
    slicer.run(source, &SliceOptions::new()).unwrap();
    assert!(dropped.load(Ordering::SeqCst));
    assert_eq!(slicer.phase(), SlicePhase::Done);
}

#[test]
fn borrowed_source_can_be_sliced_twice() {
    let mut source = SyntheticSource::new(1.0);
    let first = Slicer::new(2)
        .unwrap()
        .run_archive(&mut source, &SliceOptions::new())
        .unwrap();
    let second = Slicer::new(2)
        .unwrap()
        .run_archive(&mut source, &SliceOptions::new())
        .unwrap();
    assert_eq!(first, second);
    assert_eq!(source.captures.load(Ordering::SeqCst), 4);
}

#[test]
fn zero_rate_is_rejected() {
    let error = Slicer::new(0).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Input);
    assert!(error.to_string().contains("Invalid rate"));
}
