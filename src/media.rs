//! FFmpeg-backed [`MediaSource`].
//!
//! [`MediaFile`] opens a video with `ffmpeg-next`, caches its metadata, and
//! implements the decode/seek contract the slicing pipeline drives: full
//! audio-track decoding to planar `f32` and seek-then-decode frame capture
//! at native resolution.

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    io::Write,
    path::{Path, PathBuf},
    time::Duration,
};

use ffmpeg_next::{
    Error as FfmpegError, Packet,
    codec::context::Context as CodecContext,
    decoder::Audio as AudioDecoder,
    format::{Pixel, Sample, context::Input, sample::Type as SampleType},
    frame::{Audio as AudioFrame, Video as VideoFrame},
    media::Type,
    software::{
        resampling::Context as ResamplingContext,
        scaling::{Context as ScalingContext, Flags as ScalingFlags},
    },
};
use image::{DynamicImage, RgbImage};
use tempfile::NamedTempFile;

use crate::{
    audio::AudioBuffer,
    conversion::{frame_to_buffer, pts_to_seconds, seconds_to_seek_timestamp},
    error::SlicerError,
    metadata::{AudioMetadata, MediaMetadata, VideoMetadata},
    source::MediaSource,
};

/// Consecutive demuxer read failures tolerated before giving up.
const MAX_CONSECUTIVE_READ_ERRORS: usize = 64;

const F32_BYTES: usize = std::mem::size_of::<f32>();

/// An opened source video.
///
/// Created via [`MediaFile::open`] or [`MediaFile::open_bytes`]. The handle
/// is not reentrant: captures seek the shared demuxer, so all methods take
/// `&mut self`. Dropping the handle closes the demuxer and removes any
/// spooled temporary file.
///
/// # Example
///
/// ```no_run
/// use video_slicer::{MediaFile, MediaSource};
///
/// let mut source = MediaFile::open("input.mp4")?;
/// println!("{:.2}s", source.duration());
/// let cover = source.capture_frame_at(1.5)?;
/// cover.save("cover.png")?;
/// # Ok::<(), video_slicer::SlicerError>(())
/// ```
pub struct MediaFile {
    /// The opened FFmpeg input (demuxer) context.
    input_context: Input,
    /// Cached metadata extracted at open time.
    metadata: MediaMetadata,
    /// Path to the opened media file (kept for error messages).
    file_path: PathBuf,
    /// Backing file for sources opened from memory. Declared after the
    /// demuxer so it is removed only once the demuxer has closed it.
    _spool: Option<NamedTempFile>,
}

impl Debug for MediaFile {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("MediaFile")
            .field("metadata", &self.metadata)
            .field("file_path", &self.file_path)
            .field("spooled", &self._spool.is_some())
            .finish_non_exhaustive()
    }
}

impl MediaFile {
    /// Open a media file for slicing.
    ///
    /// Initializes FFmpeg (idempotent), opens the file, locates the best
    /// video and audio streams, and caches their metadata.
    ///
    /// # Errors
    ///
    /// Returns [`SlicerError::FileOpen`] if the file cannot be opened or its
    /// streams cannot be probed.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SlicerError> {
        Self::open_inner(path.as_ref(), None)
    }

    /// Open a source held in memory.
    ///
    /// The bytes are spooled to a temporary file so FFmpeg can seek them.
    /// `extension` is an optional container hint such as `"mp4"`.
    ///
    /// # Errors
    ///
    /// Returns [`SlicerError::IoError`] if the spool file cannot be written,
    /// or any error from [`open`](MediaFile::open).
    pub fn open_bytes(bytes: &[u8], extension: Option<&str>) -> Result<Self, SlicerError> {
        let suffix = extension.map(|ext| format!(".{ext}")).unwrap_or_default();
        let mut spool = tempfile::Builder::new()
            .prefix("video-slicer-")
            .suffix(&suffix)
            .tempfile()?;
        spool.write_all(bytes)?;
        spool.flush()?;
        log::debug!(
            "Spooled {} bytes of source media to {}",
            bytes.len(),
            spool.path().display()
        );

        let path = spool.path().to_path_buf();
        Self::open_inner(&path, Some(spool))
    }

    fn open_inner(path: &Path, spool: Option<NamedTempFile>) -> Result<Self, SlicerError> {
        let file_path = path.to_path_buf();
        log::debug!("Opening media file: {}", file_path.display());

        ffmpeg_next::init().map_err(|error| SlicerError::FileOpen {
            path: file_path.clone(),
            reason: format!("FFmpeg initialisation failed: {error}"),
        })?;

        let input_context =
            ffmpeg_next::format::input(&path).map_err(|error| SlicerError::FileOpen {
                path: file_path.clone(),
                reason: error.to_string(),
            })?;

        let duration_microseconds = input_context.duration();
        let duration = if duration_microseconds > 0 {
            Duration::from_micros(duration_microseconds as u64)
        } else {
            Duration::ZERO
        };

        let format = input_context.format().name().to_string();

        let video = match input_context.streams().best(Type::Video) {
            Some(stream) => {
                let index = stream.index();
                let decoder = CodecContext::from_parameters(stream.parameters())
                    .and_then(|context| context.decoder().video())
                    .map_err(|error| SlicerError::FileOpen {
                        path: file_path.clone(),
                        reason: format!(
                            "Failed to create video decoder for stream {index}: {error}"
                        ),
                    })?;

                let frame_rate = stream.avg_frame_rate();
                let frames_per_second = if frame_rate.denominator() != 0 {
                    f64::from(frame_rate.numerator()) / f64::from(frame_rate.denominator())
                } else {
                    0.0
                };

                Some(VideoMetadata {
                    width: decoder.width(),
                    height: decoder.height(),
                    frames_per_second,
                    codec: decoder
                        .codec()
                        .map(|codec| codec.name().to_string())
                        .unwrap_or_else(|| "unknown".to_string()),
                    stream_index: index,
                })
            }
            None => None,
        };

        let audio = match input_context.streams().best(Type::Audio) {
            Some(stream) => {
                let index = stream.index();
                let decoder = CodecContext::from_parameters(stream.parameters())
                    .and_then(|context| context.decoder().audio())
                    .map_err(|error| SlicerError::FileOpen {
                        path: file_path.clone(),
                        reason: format!(
                            "Failed to create audio decoder for stream {index}: {error}"
                        ),
                    })?;

                Some(AudioMetadata {
                    sample_rate: decoder.rate(),
                    channels: decoder.channels(),
                    codec: decoder
                        .codec()
                        .map(|codec| codec.name().to_string())
                        .unwrap_or_else(|| "unknown".to_string()),
                    stream_index: index,
                })
            }
            None => None,
        };

        let metadata = MediaMetadata {
            video,
            audio,
            duration,
            format,
        };

        log::info!(
            "Opened media file: {} (format={}, duration={:.2}s, video={}, audio={})",
            file_path.display(),
            metadata.format,
            metadata.duration.as_secs_f64(),
            metadata.video.is_some(),
            metadata.audio.is_some(),
        );

        if let Some(video) = &metadata.video {
            log::debug!(
                "Best video stream: index={}, {}x{}, {:.2} fps, codec={}",
                video.stream_index,
                video.width,
                video.height,
                video.frames_per_second,
                video.codec,
            );
        }
        if let Some(audio) = &metadata.audio {
            log::debug!(
                "Best audio stream: index={}, {} Hz, {} ch, codec={}",
                audio.stream_index,
                audio.sample_rate,
                audio.channels,
                audio.codec,
            );
        }

        Ok(Self {
            input_context,
            metadata,
            file_path,
            _spool: spool,
        })
    }

    /// Cached metadata read at open time.
    pub fn metadata(&self) -> &MediaMetadata {
        &self.metadata
    }

    /// Release the handle explicitly.
    ///
    /// Equivalent to dropping it.
    pub fn close(self) {}

    fn decode_audio_track(&mut self) -> Result<AudioBuffer, SlicerError> {
        let audio_stream_index = self
            .metadata
            .audio
            .as_ref()
            .map(|audio| audio.stream_index)
            .ok_or(SlicerError::NoAudioStream)?;

        let stream = self
            .input_context
            .stream(audio_stream_index)
            .ok_or(SlicerError::NoAudioStream)?;
        let decoder_context = CodecContext::from_parameters(stream.parameters())?;
        let mut decoder = decoder_context.decoder().audio().map_err(|error| {
            SlicerError::DecodeError(format!("Failed to create audio decoder: {error}"))
        })?;

        let sample_rate = decoder.rate();
        let channel_count = usize::from(decoder.channels());
        let channel_layout = decoder.channel_layout();

        let mut resampler = ResamplingContext::get(
            decoder.format(),
            channel_layout,
            sample_rate,
            Sample::F32(SampleType::Planar),
            channel_layout,
            sample_rate,
        )
        .map_err(|error| {
            SlicerError::DecodeError(format!("Failed to create resampler: {error}"))
        })?;

        if let Err(error) = self.input_context.seek(0, ..0) {
            log::debug!("Rewind before audio decode failed ({error}); decoding from current position");
        }

        let mut channels: Vec<Vec<f32>> = vec![Vec::new(); channel_count];
        let mut decoded_frame = AudioFrame::empty();
        let mut resampled_frame = AudioFrame::empty();
        let mut consecutive_errors = 0;

        loop {
            let mut packet = Packet::empty();
            match packet.read(&mut self.input_context) {
                Ok(()) => {
                    consecutive_errors = 0;
                    if packet.stream() != audio_stream_index {
                        continue;
                    }
                    decoder.send_packet(&packet).map_err(|error| {
                        SlicerError::DecodeError(format!("Audio packet rejected: {error}"))
                    })?;
                    drain_audio_frames(
                        &mut decoder,
                        &mut resampler,
                        &mut decoded_frame,
                        &mut resampled_frame,
                        &mut channels,
                    )?;
                }
                Err(FfmpegError::Eof) => break,
                Err(error) => {
                    consecutive_errors += 1;
                    log::warn!("Demuxer read error while decoding audio: {error}");
                    if consecutive_errors >= MAX_CONSECUTIVE_READ_ERRORS {
                        return Err(SlicerError::DecodeError(format!(
                            "Demuxer failed repeatedly: {error}"
                        )));
                    }
                }
            }
        }

        decoder.send_eof()?;
        drain_audio_frames(
            &mut decoder,
            &mut resampler,
            &mut decoded_frame,
            &mut resampled_frame,
            &mut channels,
        )?;

        let buffer = AudioBuffer::new(sample_rate, channels)?;
        if buffer.frames() == 0 {
            return Err(SlicerError::DecodeError(
                "Audio stream produced no samples".to_string(),
            ));
        }

        log::info!(
            "Decoded audio track: {} frames, {} Hz, {} ch ({:.2}s)",
            buffer.frames(),
            buffer.sample_rate(),
            buffer.channel_count(),
            buffer.duration_seconds(),
        );
        Ok(buffer)
    }

    fn capture_frame(&mut self, time: f64) -> Result<DynamicImage, SlicerError> {
        let duration = self.metadata.duration.as_secs_f64();
        if !(time >= 0.0) || (duration > 0.0 && time >= duration) {
            return Err(SlicerError::InvalidTimestamp(
                Duration::try_from_secs_f64(time).unwrap_or_default(),
            ));
        }

        let video = self
            .metadata
            .video
            .as_ref()
            .ok_or(SlicerError::NoVideoStream)?;
        let video_stream_index = video.stream_index;
        let half_frame = if video.frames_per_second > 0.0 {
            0.5 / video.frames_per_second
        } else {
            0.0
        };

        let stream = self
            .input_context
            .stream(video_stream_index)
            .ok_or(SlicerError::NoVideoStream)?;
        let time_base = stream.time_base();
        let decoder_context = CodecContext::from_parameters(stream.parameters())?;
        let mut decoder = decoder_context.decoder().video()?;

        let width = decoder.width();
        let height = decoder.height();
        let mut scaler = ScalingContext::get(
            decoder.format(),
            width,
            height,
            Pixel::RGB24,
            width,
            height,
            ScalingFlags::BILINEAR,
        )?;

        // Seek to the nearest keyframe before the target, then decode forward.
        let seek_timestamp = seconds_to_seek_timestamp(time);
        self.input_context
            .seek(seek_timestamp, ..seek_timestamp)?;

        let mut decoded_frame = VideoFrame::empty();
        let mut previous_frame = VideoFrame::empty();
        let mut has_previous = false;
        let mut rgb_frame = VideoFrame::empty();
        let mut eof_sent = false;

        loop {
            while decoder.receive_frame(&mut decoded_frame).is_ok() {
                let pts = decoded_frame
                    .timestamp()
                    .or_else(|| decoded_frame.pts())
                    .unwrap_or(0);
                if pts_to_seconds(pts, time_base) + half_frame >= time {
                    scaler.run(&decoded_frame, &mut rgb_frame)?;
                    return convert_frame_to_image(&rgb_frame, width, height);
                }
                std::mem::swap(&mut decoded_frame, &mut previous_frame);
                has_previous = true;
            }

            if eof_sent {
                break;
            }

            let mut packet = Packet::empty();
            match packet.read(&mut self.input_context) {
                Ok(()) => {
                    if packet.stream() == video_stream_index {
                        decoder.send_packet(&packet)?;
                    }
                }
                Err(FfmpegError::Eof) => {
                    decoder.send_eof()?;
                    eof_sent = true;
                }
                Err(error) => {
                    log::debug!("Skipping unreadable packet during capture: {error}");
                }
            }
        }

        // The target lies past the last decodable frame: use the last one.
        if has_previous {
            scaler.run(&previous_frame, &mut rgb_frame)?;
            return convert_frame_to_image(&rgb_frame, width, height);
        }

        Err(SlicerError::DecodeError(format!(
            "Could not decode a video frame near {time:.3}s"
        )))
    }
}

impl MediaSource for MediaFile {
    fn duration(&self) -> f64 {
        self.metadata.duration.as_secs_f64()
    }

    fn decode_audio(&mut self) -> Result<AudioBuffer, SlicerError> {
        self.decode_audio_track()
    }

    fn capture_frame_at(&mut self, time: f64) -> Result<DynamicImage, SlicerError> {
        self.capture_frame(time)
    }
}

impl Drop for MediaFile {
    fn drop(&mut self) {
        log::debug!("Closing media file: {}", self.file_path.display());
    }
}

/// Pull every pending frame out of the decoder and append it, resampled to
/// planar `f32`, to the per-channel sample vectors.
fn drain_audio_frames(
    decoder: &mut AudioDecoder,
    resampler: &mut ResamplingContext,
    decoded_frame: &mut AudioFrame,
    resampled_frame: &mut AudioFrame,
    channels: &mut [Vec<f32>],
) -> Result<(), SlicerError> {
    while decoder.receive_frame(decoded_frame).is_ok() {
        resampler
            .run(decoded_frame, resampled_frame)
            .map_err(|error| SlicerError::DecodeError(format!("Resample error: {error}")))?;

        let frames = resampled_frame.samples();
        let planes = resampled_frame.planes().min(channels.len());
        for (plane, samples) in channels.iter_mut().enumerate().take(planes) {
            let data = resampled_frame.data(plane);
            let byte_count = (frames * F32_BYTES).min(data.len());
            samples.extend(
                data[..byte_count]
                    .chunks_exact(F32_BYTES)
                    .map(|bytes| f32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])),
            );
        }
    }
    Ok(())
}

fn convert_frame_to_image(
    rgb_frame: &VideoFrame,
    width: u32,
    height: u32,
) -> Result<DynamicImage, SlicerError> {
    let buffer = frame_to_buffer(rgb_frame, width, height, 3);
    let rgb_image = RgbImage::from_raw(width, height, buffer).ok_or_else(|| {
        SlicerError::DecodeError(
            "Failed to construct RGB image from decoded frame data".to_string(),
        )
    })?;
    Ok(DynamicImage::ImageRgb8(rgb_image))
}
