//! # video-slicer
//!
//! Slice a video's audio track into equal-length WAV clips, each paired with
//! a JPEG cover captured from the video at the clip's start, and merge
//! such pairs back into tagged audio files.
//!
//! Two pipelines make up the crate:
//!
//! - **Slicing** ([`Slicer`]): video + rate → zip archive holding
//!   `audio_NNN.wav` / `cover_NNN.jpg` pairs.
//! - **Tag embedding** ([`TagEmbedder`]): zip archive of `audio_NNN.*` /
//!   `cover_NNN.*` entries → zip archive of `audio_NNN_with_cover.*` files
//!   with title, artist, album and front cover written into an ID3v2.3 tag.
//!
//! Both are synchronous, single-pass and work entirely in memory.
//!
//! ## Quick Start
//!
//! ### Slice a Video
//!
//! ```no_run
//! use video_slicer::{SliceOptions, slice_file};
//!
//! let zip = slice_file("input.mp4", 8, &SliceOptions::new())?;
//! std::fs::write("slices.zip", zip)?;
//! # Ok::<(), video_slicer::SlicerError>(())
//! ```
//!
//! ### Embed Covers
//!
//! ```no_run
//! use video_slicer::{EmbedOptions, embed_archive};
//!
//! let input = std::fs::read("slices.zip")?;
//! let tagged = embed_archive(&input, &EmbedOptions::new())?;
//! std::fs::write("tagged.zip", tagged)?;
//! # Ok::<(), video_slicer::SlicerError>(())
//! ```
//!
//! ### Plan Without Decoding
//!
//! ```
//! use video_slicer::ChunkPlan;
//!
//! // The fractional remainder of the duration is dropped.
//! let plan = ChunkPlan::new(10.6, 8)?;
//! assert_eq!(plan.len(), 80);
//! # Ok::<(), video_slicer::SlicerError>(())
//! ```
//!
//! ### Optional Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `ffmpeg` (default) | [`MediaFile`], the FFmpeg-backed [`MediaSource`] |
//! | `async` | `slice_file_async` and `embed_archive_async` via Tokio |
//! | `rayon` | `Slicer::run_parallel` encodes chunks across rayon threads |
//! | `full` | Enables all of the above |
//!
//! ## Requirements
//!
//! The `ffmpeg` feature needs the FFmpeg development libraries installed on
//! your system. Everything else, including both pipelines when driven by a
//! custom [`MediaSource`], builds without them.

pub mod archive;
pub mod audio;
pub mod configuration;
#[cfg(feature = "ffmpeg")]
mod conversion;
pub mod cover;
pub mod embed;
pub mod error;
#[cfg(feature = "ffmpeg")]
pub mod ffmpeg;
pub mod matcher;
#[cfg(feature = "ffmpeg")]
pub mod media;
pub mod metadata;
#[cfg(feature = "rayon")]
mod parallel;
pub mod plan;
pub mod progress;
pub mod slice;
pub mod source;
#[cfg(feature = "async")]
pub mod stream;
pub mod tag;
pub mod wav;

pub use archive::{Archive, ArchiveEntry};
pub use audio::{AudioBuffer, AudioChunk};
pub use configuration::{EmbedOptions, SliceOptions, TagTemplate};
pub use cover::{COVER_EXTENSION, COVER_JPEG_QUALITY, encode_cover, sniff_image_mime};
pub use embed::{EmbedPhase, TagEmbedder, embed_archive, tagged_entry_name};
pub use error::{ErrorKind, SlicerError};
#[cfg(feature = "ffmpeg")]
pub use ffmpeg::{FfmpegLogLevel, set_ffmpeg_log_level};
pub use matcher::{EntryRole, PairMatch, classify, match_pairs};
#[cfg(feature = "ffmpeg")]
pub use media::MediaFile;
pub use metadata::{AudioMetadata, MediaMetadata, VideoMetadata};
pub use plan::{ChunkDescriptor, ChunkPlan, chunk_count};
pub use progress::{CancellationToken, Phase, ProgressCallback, ProgressInfo};
pub use slice::{SlicePhase, Slicer, audio_entry_name, cover_entry_name};
#[cfg(feature = "ffmpeg")]
pub use slice::{slice_bytes, slice_file};
pub use source::MediaSource;
#[cfg(feature = "async")]
pub use stream::{EmbedFuture, SliceFuture, embed_archive_async};
#[cfg(all(feature = "async", feature = "ffmpeg"))]
pub use stream::slice_file_async;
pub use tag::{EmbeddedPicture, TagContents, TagFields, inject_tags, read_tag_fields, strip_tags};
pub use wav::{WAV_HEADER_SIZE, encode_wav, sample_to_i16};
