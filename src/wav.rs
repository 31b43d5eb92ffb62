//! WAV container encoding.
//!
//! [`encode_wav`] turns an [`AudioChunk`] into a canonical 44-byte-header
//! RIFF/WAVE file holding interleaved 16-bit signed PCM.
//!
//! Samples are clamped to `[-1.0, 1.0]` before scaling, so out-of-range
//! input saturates at `i16::MIN` / `i16::MAX` instead of wrapping.
//!
//! # Example
//!
//! ```
//! use video_slicer::{AudioChunk, encode_wav};
//!
//! let chunk = AudioChunk::silence(8_000, 1, 100);
//! let wav = encode_wav(&chunk)?;
//! assert_eq!(wav.len(), 44 + 100 * 2);
//! # Ok::<(), video_slicer::SlicerError>(())
//! ```

use byteorder::{LittleEndian, WriteBytesExt};

use crate::{audio::AudioChunk, error::SlicerError};

const RIFF_CHUNK_ID: &[u8; 4] = b"RIFF";
const WAVE_FORMAT_ID: &[u8; 4] = b"WAVE";
const FMT_CHUNK_ID: &[u8; 4] = b"fmt ";
const DATA_CHUNK_ID: &[u8; 4] = b"data";

const FORMAT_PCM: u16 = 1;
const STANDARD_FMT_CHUNK_SIZE: u32 = 16;
const BITS_PER_SAMPLE: u16 = 16;
const BYTES_PER_SAMPLE: usize = (BITS_PER_SAMPLE / 8) as usize;

/// Size of the fixed RIFF + fmt + data header written by [`encode_wav`].
pub const WAV_HEADER_SIZE: usize = 44;

/// Convert one float sample to signed 16-bit PCM.
///
/// The clamped sample is scaled by 32768 when negative and 32767 otherwise,
/// then truncated toward zero, so `-1.0` and `1.0` reach `i16::MIN` and
/// `i16::MAX`. NaN encodes as silence.
pub fn sample_to_i16(sample: f32) -> i16 {
    let clamped = sample.clamp(-1.0, 1.0);
    if clamped < 0.0 {
        (clamped * 32_768.0) as i16
    } else {
        (clamped * 32_767.0) as i16
    }
}

/// Encode a chunk as a 16-bit PCM WAV file.
///
/// The output is exactly `44 + frames * channels * 2` bytes long.
///
/// # Errors
///
/// Returns [`SlicerError::EncodingError`] if the chunk has no channels,
/// more than 65535 channels, a zero sample rate, ragged channels, or more
/// sample data than a RIFF size field can describe.
pub fn encode_wav(chunk: &AudioChunk) -> Result<Vec<u8>, SlicerError> {
    let channel_count = chunk.channel_count();
    if channel_count == 0 {
        return Err(SlicerError::EncodingError(
            "audio chunk has no channels".to_string(),
        ));
    }
    let channels = u16::try_from(channel_count).map_err(|_| {
        SlicerError::EncodingError(format!("{channel_count} channels exceed the WAV limit"))
    })?;
    if chunk.sample_rate == 0 {
        return Err(SlicerError::EncodingError(
            "audio chunk has a sample rate of 0".to_string(),
        ));
    }

    let frames = chunk.frames();
    if chunk.channels.iter().any(|channel| channel.len() != frames) {
        return Err(SlicerError::EncodingError(
            "audio chunk channels differ in length".to_string(),
        ));
    }

    let data_size = frames
        .checked_mul(channel_count * BYTES_PER_SAMPLE)
        .and_then(|size| u32::try_from(size).ok())
        .filter(|size| size.checked_add(36).is_some())
        .ok_or_else(|| {
            SlicerError::EncodingError(format!(
                "{frames} frames of {channel_count} channels do not fit in a WAV file"
            ))
        })?;

    let block_align = channels * BITS_PER_SAMPLE / 8;
    let byte_rate = chunk
        .sample_rate
        .checked_mul(u32::from(block_align))
        .ok_or_else(|| {
            SlicerError::EncodingError(format!(
                "byte rate overflows for {} Hz x {channel_count} channels",
                chunk.sample_rate
            ))
        })?;

    let mut output = Vec::with_capacity(WAV_HEADER_SIZE + data_size as usize);

    output.extend_from_slice(RIFF_CHUNK_ID);
    output.write_u32::<LittleEndian>(36 + data_size)?;
    output.extend_from_slice(WAVE_FORMAT_ID);

    output.extend_from_slice(FMT_CHUNK_ID);
    output.write_u32::<LittleEndian>(STANDARD_FMT_CHUNK_SIZE)?;
    output.write_u16::<LittleEndian>(FORMAT_PCM)?;
    output.write_u16::<LittleEndian>(channels)?;
    output.write_u32::<LittleEndian>(chunk.sample_rate)?;
    output.write_u32::<LittleEndian>(byte_rate)?;
    output.write_u16::<LittleEndian>(block_align)?;
    output.write_u16::<LittleEndian>(BITS_PER_SAMPLE)?;

    output.extend_from_slice(DATA_CHUNK_ID);
    output.write_u32::<LittleEndian>(data_size)?;

    for frame in 0..frames {
        for channel in &chunk.channels {
            output.write_i16::<LittleEndian>(sample_to_i16(channel[frame]))?;
        }
    }

    debug_assert_eq!(output.len(), WAV_HEADER_SIZE + data_size as usize);
    Ok(output)
}

#[cfg(test)]
mod tests {
    use byteorder::{ByteOrder, LittleEndian};

    use super::*;

    #[test]
    fn silent_mono_header_fields() {
        let wav = encode_wav(&AudioChunk::silence(22_050, 1, 441)).unwrap();
        assert_eq!(wav.len(), 44 + 441 * 2);
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(LittleEndian::read_u32(&wav[4..8]), (wav.len() - 8) as u32);
        assert_eq!(&wav[8..16], b"WAVEfmt ");
        assert_eq!(LittleEndian::read_u16(&wav[20..22]), 1);
        assert_eq!(LittleEndian::read_u16(&wav[22..24]), 1);
        assert_eq!(LittleEndian::read_u32(&wav[24..28]), 22_050);
        assert_eq!(LittleEndian::read_u32(&wav[28..32]), 44_100);
        assert_eq!(LittleEndian::read_u16(&wav[32..34]), 2);
        assert_eq!(LittleEndian::read_u16(&wav[34..36]), 16);
        assert_eq!(&wav[36..40], b"data");
        assert_eq!(LittleEndian::read_u32(&wav[40..44]), 882);
        assert!(wav[44..].iter().all(|&byte| byte == 0));
    }

    #[test]
    fn channels_interleave_fastest() {
        let chunk = AudioChunk {
            sample_rate: 8_000,
            channels: vec![vec![1.0, 0.0], vec![-1.0, 0.5]],
        };
        let wav = encode_wav(&chunk).unwrap();
        let samples: Vec<i16> = wav[44..]
            .chunks_exact(2)
            .map(LittleEndian::read_i16)
            .collect();
        assert_eq!(samples, vec![32_767, -32_768, 0, 16_383]);
    }

    #[test]
    fn out_of_range_samples_saturate() {
        assert_eq!(sample_to_i16(1.5), i16::MAX);
        assert_eq!(sample_to_i16(-7.0), i16::MIN);
        assert_eq!(sample_to_i16(f32::INFINITY), i16::MAX);
        assert_eq!(sample_to_i16(f32::NEG_INFINITY), i16::MIN);
        assert_eq!(sample_to_i16(-1.0), i16::MIN);
        assert_eq!(sample_to_i16(f32::NAN), 0);
        assert_eq!(sample_to_i16(0.0), 0);
    }

    #[test]
    fn below_full_scale_encodes_to_i16_min() {
        let chunk = AudioChunk {
            sample_rate: 8_000,
            channels: vec![vec![-2.0, 2.0]],
        };
        let wav = encode_wav(&chunk).unwrap();
        assert_eq!(LittleEndian::read_i16(&wav[44..46]), -32_768);
        assert_eq!(LittleEndian::read_i16(&wav[46..48]), 32_767);
    }

    #[test]
    fn scaling_truncates_toward_zero() {
        assert_eq!(sample_to_i16(0.5), 16_383);
        assert_eq!(sample_to_i16(-0.5), -16_384);
        assert_eq!(sample_to_i16(0.00001), 0);
    }

    #[test]
    fn invalid_geometry_is_an_encoding_error() {
        let no_channels = AudioChunk {
            sample_rate: 8_000,
            channels: Vec::new(),
        };
        assert!(matches!(
            encode_wav(&no_channels),
            Err(SlicerError::EncodingError(_))
        ));

        let ragged = AudioChunk {
            sample_rate: 8_000,
            channels: vec![vec![0.0; 4], vec![0.0; 3]],
        };
        assert!(matches!(
            encode_wav(&ragged),
            Err(SlicerError::EncodingError(_))
        ));

        let zero_rate = AudioChunk::silence(0, 1, 4);
        assert!(matches!(
            encode_wav(&zero_rate),
            Err(SlicerError::EncodingError(_))
        ));
    }
}
