//! Cover image compression.
//!
//! Captured frames are stored as JPEG at a fixed quality that favours
//! small archives over fidelity. Resolution is left untouched: a cover has
//! the source video's native pixel dimensions.

use std::io::Cursor;

use image::{DynamicImage, codecs::jpeg::JpegEncoder};

use crate::error::SlicerError;

/// JPEG quality used for every cover.
pub const COVER_JPEG_QUALITY: u8 = 70;

/// File extension of covers written by the slicing pipeline.
pub const COVER_EXTENSION: &str = "jpg";

/// Compress a captured frame into cover bytes.
///
/// Frames with an alpha channel or a 16-bit depth are flattened to 8-bit
/// RGB first, since baseline JPEG carries neither.
///
/// # Errors
///
/// Returns [`SlicerError::EncodingError`] for a zero-sized frame, or
/// [`SlicerError::ImageError`] if the JPEG encoder fails.
pub fn encode_cover(frame: &DynamicImage) -> Result<Vec<u8>, SlicerError> {
    if frame.width() == 0 || frame.height() == 0 {
        return Err(SlicerError::EncodingError(
            "captured frame has zero dimensions".to_string(),
        ));
    }

    let mut output = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut output, COVER_JPEG_QUALITY);
    match frame {
        DynamicImage::ImageRgb8(_) | DynamicImage::ImageLuma8(_) => frame.write_with_encoder(encoder)?,
        other => DynamicImage::ImageRgb8(other.to_rgb8()).write_with_encoder(encoder)?,
    }
    Ok(output.into_inner())
}

/// Sniff the MIME type of an image buffer from its magic bytes.
///
/// Returns `None` for anything other than JPEG or PNG.
pub fn sniff_image_mime(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some("image/png")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use image::{Rgb, RgbImage, RgbaImage};

    use super::*;

    #[test]
    fn encodes_jpeg_at_native_size() {
        let frame = DynamicImage::ImageRgb8(RgbImage::from_pixel(64, 36, Rgb([200, 30, 90])));
        let bytes = encode_cover(&frame).unwrap();
        assert_eq!(sniff_image_mime(&bytes), Some("image/jpeg"));

        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (64, 36));
    }

    #[test]
    fn flattens_alpha_frames() {
        let frame = DynamicImage::ImageRgba8(RgbaImage::new(8, 8));
        assert!(encode_cover(&frame).is_ok());
    }

    #[test]
    fn rejects_empty_frames() {
        let frame = DynamicImage::ImageRgb8(RgbImage::new(0, 0));
        assert!(matches!(
            encode_cover(&frame),
            Err(SlicerError::EncodingError(_))
        ));
    }

    #[test]
    fn sniffs_png_and_unknown() {
        assert_eq!(
            sniff_image_mime(b"\x89PNG\r\n\x1a\nrest"),
            Some("image/png")
        );
        assert_eq!(sniff_image_mime(b"GIF89a"), None);
    }
}
