//! Async entry points.
//!
//! Both pipelines are synchronous and CPU heavy. The functions here move a
//! whole run onto `tokio::task::spawn_blocking` and hand back a future, so
//! an async caller stays responsive while decoding, sampling and packaging
//! happen on a blocking thread.
//!
//! # Example
//!
//! ```no_run
//! use video_slicer::{SliceOptions, SlicerError, slice_file_async};
//!
//! # async fn example() -> Result<(), SlicerError> {
//! let zip = slice_file_async("input.mp4", 8, SliceOptions::new()).await?;
//! println!("Got {} bytes of archive", zip.len());
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

#[cfg(feature = "ffmpeg")]
use std::path::PathBuf;

use tokio::task::JoinHandle;

use crate::configuration::EmbedOptions;
use crate::embed::TagEmbedder;
use crate::error::SlicerError;

#[cfg(feature = "ffmpeg")]
use crate::{configuration::SliceOptions, slice::slice_file};

fn poll_blocking(
    handle: &mut JoinHandle<Result<Vec<u8>, SlicerError>>,
    cx: &mut Context<'_>,
) -> Poll<Result<Vec<u8>, SlicerError>> {
    Pin::new(handle).poll(cx).map(|result| {
        result.unwrap_or_else(|error| {
            log::error!("Blocking pipeline task did not complete: {error}");
            Err(SlicerError::Cancelled)
        })
    })
}

/// A future resolving to the zip bytes of a slicing run.
///
/// A task that panics or is aborted resolves to
/// [`SlicerError::Cancelled`].
pub struct SliceFuture {
    handle: JoinHandle<Result<Vec<u8>, SlicerError>>,
}

impl Future for SliceFuture {
    type Output = Result<Vec<u8>, SlicerError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        poll_blocking(&mut self.handle, cx)
    }
}

/// A future resolving to the zip bytes of a tag embedding run.
pub struct EmbedFuture {
    handle: JoinHandle<Result<Vec<u8>, SlicerError>>,
}

impl Future for EmbedFuture {
    type Output = Result<Vec<u8>, SlicerError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        poll_blocking(&mut self.handle, cx)
    }
}

/// Slice the video at `path` on a blocking thread.
///
/// Must be called from within a Tokio runtime.
#[cfg(feature = "ffmpeg")]
pub fn slice_file_async(path: impl Into<PathBuf>, rate: u32, options: SliceOptions) -> SliceFuture {
    let path = path.into();
    let handle = tokio::task::spawn_blocking(move || slice_file(&path, rate, &options));
    SliceFuture { handle }
}

/// Tag every pair of the zip archive `input` on a blocking thread.
///
/// Must be called from within a Tokio runtime.
pub fn embed_archive_async(input: Vec<u8>, options: EmbedOptions) -> EmbedFuture {
    let handle = tokio::task::spawn_blocking(move || TagEmbedder::new().run(&input, &options));
    EmbedFuture { handle }
}
