//! Pipeline options.
//!
//! [`SliceOptions`] and [`EmbedOptions`] are builders that thread progress
//! callbacks, cancellation tokens, and other operational settings through
//! the pipelines without polluting every function signature.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use video_slicer::{CancellationToken, ProgressCallback, ProgressInfo, SliceOptions};
//!
//! struct LogProgress;
//! impl ProgressCallback for LogProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         println!("{}: {} done", info.phase, info.current);
//!     }
//! }
//!
//! let token = CancellationToken::new();
//! let options = SliceOptions::new()
//!     .with_progress(Arc::new(LogProgress))
//!     .with_cancellation(token.clone())
//!     .with_batch_size(10);
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use crate::progress::{CancellationToken, NoOpProgress, ProgressCallback};
use crate::tag::TagFields;

/// Settings for a slicing run.
///
/// All fields have sensible defaults. Cover compression quality is fixed
/// and deliberately not exposed here.
#[derive(Clone)]
pub struct SliceOptions {
    pub(crate) progress: Arc<dyn ProgressCallback>,
    pub(crate) cancellation: Option<CancellationToken>,
    pub(crate) batch_size: u64,
}

impl Debug for SliceOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("SliceOptions")
            .field("has_cancellation", &self.cancellation.is_some())
            .field("batch_size", &self.batch_size)
            .finish_non_exhaustive()
    }
}

impl Default for SliceOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl SliceOptions {
    /// Defaults: no progress callback, no cancellation, batch size 1.
    pub fn new() -> Self {
        Self {
            progress: Arc::new(NoOpProgress),
            cancellation: None,
            batch_size: 1,
        }
    }

    /// Attach a progress callback.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Attach a cancellation token, checked before every chunk.
    ///
    /// A cancelled run returns [`SlicerError::Cancelled`](crate::SlicerError::Cancelled)
    /// and produces no archive.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Report progress every `size` chunks. Clamped to a minimum of 1.
    #[must_use]
    pub fn with_batch_size(mut self, size: u64) -> Self {
        self.batch_size = size.max(1);
        self
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }
}

/// Text written into every tagged track.
///
/// The title is `"{title_prefix}{index}"` where `index` is the pair index
/// exactly as it appeared in the input entry names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagTemplate {
    /// Prefix of the per-track title. Defaults to `"Track "`.
    pub title_prefix: String,
    /// Artist field. Defaults to `"Video Slicer"`.
    pub artist: String,
    /// Album field. Defaults to `"Sliced Audio"`.
    pub album: String,
}

impl Default for TagTemplate {
    fn default() -> Self {
        Self {
            title_prefix: "Track ".to_string(),
            artist: "Video Slicer".to_string(),
            album: "Sliced Audio".to_string(),
        }
    }
}

impl TagTemplate {
    /// Tag fields for the pair with the given index.
    pub fn fields_for(&self, index: &str) -> TagFields {
        TagFields {
            title: format!("{}{index}", self.title_prefix),
            artist: self.artist.clone(),
            album: self.album.clone(),
        }
    }
}

/// Settings for a tag-embedding run.
#[derive(Clone)]
pub struct EmbedOptions {
    pub(crate) progress: Arc<dyn ProgressCallback>,
    pub(crate) cancellation: Option<CancellationToken>,
    pub(crate) batch_size: u64,
    pub(crate) template: TagTemplate,
}

impl Debug for EmbedOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("EmbedOptions")
            .field("has_cancellation", &self.cancellation.is_some())
            .field("batch_size", &self.batch_size)
            .field("template", &self.template)
            .finish_non_exhaustive()
    }
}

impl Default for EmbedOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl EmbedOptions {
    /// Defaults: no progress callback, no cancellation, batch size 1, and
    /// the default [`TagTemplate`].
    pub fn new() -> Self {
        Self {
            progress: Arc::new(NoOpProgress),
            cancellation: None,
            batch_size: 1,
            template: TagTemplate::default(),
        }
    }

    /// Attach a progress callback.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Attach a cancellation token, checked before every pair.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Report progress every `size` pairs. Clamped to a minimum of 1.
    #[must_use]
    pub fn with_batch_size(mut self, size: u64) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Replace the tag text template.
    #[must_use]
    pub fn with_template(mut self, template: TagTemplate) -> Self {
        self.template = template;
        self
    }

    /// The tag text template in use.
    pub fn template(&self) -> &TagTemplate {
        &self.template
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }
}
