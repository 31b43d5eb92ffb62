//! ID3v2.3 tag injection.
//!
//! [`inject_tags`] writes title, artist, album and a front-cover picture
//! into an audio file without touching its payload. Two layouts are
//! handled:
//!
//! - RIFF/WAVE files carry the tag in an `id3 ` chunk. Any existing
//!   `id3 `/`ID3 ` chunk is replaced and every other chunk is copied as-is.
//! - Everything else (MPEG audio in practice) gets the tag prepended. A
//!   leading ID3v2 tag, if present, is removed first.
//!
//! [`read_tag_fields`] parses the tag back out again and [`strip_tags`]
//! returns the file with its tag container removed.
//!
//! # Example
//!
//! ```
//! use video_slicer::{TagFields, inject_tags, read_tag_fields, strip_tags};
//!
//! let audio = vec![0xFF, 0xFB, 0x90, 0x00, 1, 2, 3, 4];
//! let cover = vec![0xFF, 0xD8, 0xFF, 0xE0];
//! let fields = TagFields::new("Track 001", "Video Slicer", "Sliced Audio");
//!
//! let tagged = inject_tags(&audio, &cover, &fields)?;
//! assert_eq!(strip_tags(&tagged)?, audio);
//!
//! let contents = read_tag_fields(&tagged)?;
//! assert_eq!(contents.title.as_deref(), Some("Track 001"));
//! # Ok::<(), video_slicer::SlicerError>(())
//! ```

use byteorder::{BigEndian, ByteOrder, LittleEndian, WriteBytesExt};

use crate::{cover::sniff_image_mime, error::SlicerError};

const ID3_MAGIC: &[u8; 3] = b"ID3";
const ID3_HEADER_SIZE: usize = 10;
const ID3_FOOTER_SIZE: usize = 10;
const ID3_FLAG_EXTENDED_HEADER: u8 = 0x40;
const ID3_FLAG_FOOTER: u8 = 0x10;
const ID3_WRITE_VERSION: u8 = 3;
const MAX_SYNCHSAFE: usize = (1 << 28) - 1;

const FRAME_HEADER_SIZE: usize = 10;
const ENCODING_LATIN1: u8 = 0;
const ENCODING_UTF16_BOM: u8 = 1;
const ENCODING_UTF16_BE: u8 = 2;
const ENCODING_UTF8: u8 = 3;
const PICTURE_TYPE_FRONT_COVER: u8 = 3;
const FALLBACK_PICTURE_MIME: &str = "image/jpeg";

const RIFF_MAGIC: &[u8; 4] = b"RIFF";
const WAVE_MAGIC: &[u8; 4] = b"WAVE";
const RIFF_HEADER_SIZE: usize = 12;
const RIFF_CHUNK_HEADER_SIZE: usize = 8;
const ID3_CHUNK_ID: &[u8; 4] = b"id3 ";

/// Text written into a tag.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TagFields {
    /// `TIT2` frame.
    pub title: String,
    /// `TPE1` frame.
    pub artist: String,
    /// `TALB` frame.
    pub album: String,
}

impl TagFields {
    /// Build a field set from its three parts.
    pub fn new(title: impl Into<String>, artist: impl Into<String>, album: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
            album: album.into(),
        }
    }
}

/// An `APIC` frame read back from a tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedPicture {
    /// Declared MIME type.
    pub mime: String,
    /// ID3 picture type; 3 is the front cover.
    pub picture_type: u8,
    /// Image bytes.
    pub data: Vec<u8>,
}

/// Fields parsed out of an existing tag. Absent frames are `None`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TagContents {
    /// ID3 major version of the tag, if one was found.
    pub version: Option<u8>,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub picture: Option<EmbeddedPicture>,
}

/// Write `fields` and `cover` into the tag container of `audio`.
///
/// Bytes outside the tag region are copied verbatim, so tagging the same
/// file twice leaves the same payload behind as tagging it once.
///
/// # Errors
///
/// Returns [`SlicerError::TagInjectionError`] if `audio` or `cover` is
/// empty, an existing ID3 header is truncated or declares a size beyond
/// the end of the buffer, or a RIFF chunk table is corrupt.
pub fn inject_tags(audio: &[u8], cover: &[u8], fields: &TagFields) -> Result<Vec<u8>, SlicerError> {
    if audio.is_empty() {
        return Err(tag_error("audio buffer is empty"));
    }
    if cover.is_empty() {
        return Err(tag_error("cover image is empty"));
    }

    let tag = build_tag(cover, fields)?;

    if is_riff_wave(audio)? {
        let chunks = riff_chunks(audio)?;
        write_riff(&chunks, Some(&tag))
    } else {
        let payload = &audio[leading_tag_len(audio)?..];
        let mut output = Vec::with_capacity(tag.len() + payload.len());
        output.extend_from_slice(&tag);
        output.extend_from_slice(payload);
        Ok(output)
    }
}

/// Return `audio` with its tag container removed.
///
/// # Errors
///
/// Returns [`SlicerError::TagInjectionError`] on the same malformed input
/// [`inject_tags`] rejects.
pub fn strip_tags(audio: &[u8]) -> Result<Vec<u8>, SlicerError> {
    if is_riff_wave(audio)? {
        let chunks = riff_chunks(audio)?;
        write_riff(&chunks, None)
    } else {
        Ok(audio[leading_tag_len(audio)?..].to_vec())
    }
}

/// Parse title, artist, album and the first picture from `audio`.
///
/// Files without a tag yield an empty [`TagContents`]. ID3v2.3 and v2.4
/// frames are understood; other versions are reported with no fields.
///
/// # Errors
///
/// Returns [`SlicerError::TagInjectionError`] if the tag container or a
/// frame inside it is malformed.
pub fn read_tag_fields(audio: &[u8]) -> Result<TagContents, SlicerError> {
    let tag = if is_riff_wave(audio)? {
        riff_chunks(audio)?
            .into_iter()
            .find(|chunk| is_id3_chunk(chunk.id))
            .map(|chunk| chunk.data)
    } else {
        let length = leading_tag_len(audio)?;
        (length > 0).then(|| &audio[..length])
    };

    match tag {
        Some(tag) => parse_tag(tag),
        None => Ok(TagContents::default()),
    }
}

fn tag_error(message: impl Into<String>) -> SlicerError {
    SlicerError::TagInjectionError(message.into())
}

fn build_tag(cover: &[u8], fields: &TagFields) -> Result<Vec<u8>, SlicerError> {
    let mut frames = Vec::with_capacity(cover.len() + 256);
    write_text_frame(&mut frames, b"TIT2", &fields.title)?;
    write_text_frame(&mut frames, b"TPE1", &fields.artist)?;
    write_text_frame(&mut frames, b"TALB", &fields.album)?;
    write_picture_frame(&mut frames, cover)?;

    if frames.len() > MAX_SYNCHSAFE {
        return Err(tag_error(format!(
            "tag of {} bytes exceeds the ID3v2 size limit",
            frames.len()
        )));
    }

    let mut tag = Vec::with_capacity(ID3_HEADER_SIZE + frames.len());
    tag.extend_from_slice(ID3_MAGIC);
    tag.push(ID3_WRITE_VERSION);
    tag.push(0);
    tag.push(0);
    tag.extend_from_slice(&encode_synchsafe(frames.len() as u32));
    tag.extend_from_slice(&frames);
    Ok(tag)
}

fn write_frame(output: &mut Vec<u8>, id: &[u8; 4], content: &[u8]) -> Result<(), SlicerError> {
    let size = u32::try_from(content.len())
        .map_err(|_| tag_error(format!("{} frame is too large", String::from_utf8_lossy(id))))?;
    output.extend_from_slice(id);
    output.write_u32::<BigEndian>(size)?;
    output.write_u16::<BigEndian>(0)?;
    output.extend_from_slice(content);
    Ok(())
}

fn write_text_frame(output: &mut Vec<u8>, id: &[u8; 4], text: &str) -> Result<(), SlicerError> {
    let mut content = Vec::with_capacity(text.len() * 2 + 3);
    match encode_latin1(text) {
        Some(latin1) => {
            content.push(ENCODING_LATIN1);
            content.extend_from_slice(&latin1);
        }
        None => {
            content.push(ENCODING_UTF16_BOM);
            content.extend_from_slice(&[0xFF, 0xFE]);
            for unit in text.encode_utf16() {
                content.write_u16::<LittleEndian>(unit)?;
            }
        }
    }
    write_frame(output, id, &content)
}

fn write_picture_frame(output: &mut Vec<u8>, cover: &[u8]) -> Result<(), SlicerError> {
    let mime = sniff_image_mime(cover).unwrap_or(FALLBACK_PICTURE_MIME);
    let mut content = Vec::with_capacity(cover.len() + mime.len() + 4);
    content.push(ENCODING_LATIN1);
    content.extend_from_slice(mime.as_bytes());
    content.push(0);
    content.push(PICTURE_TYPE_FRONT_COVER);
    // Empty description.
    content.push(0);
    content.extend_from_slice(cover);
    write_frame(output, b"APIC", &content)
}

fn encode_latin1(text: &str) -> Option<Vec<u8>> {
    text.chars()
        .map(|character| u8::try_from(u32::from(character)).ok())
        .collect()
}

fn encode_synchsafe(value: u32) -> [u8; 4] {
    [
        ((value >> 21) & 0x7F) as u8,
        ((value >> 14) & 0x7F) as u8,
        ((value >> 7) & 0x7F) as u8,
        (value & 0x7F) as u8,
    ]
}

fn decode_synchsafe(bytes: &[u8]) -> Option<u32> {
    if bytes.iter().any(|&byte| byte & 0x80 != 0) {
        return None;
    }
    Some(
        bytes
            .iter()
            .fold(0u32, |value, &byte| (value << 7) | u32::from(byte)),
    )
}

/// Total length of a leading ID3v2 tag including header and footer, or 0.
fn leading_tag_len(audio: &[u8]) -> Result<usize, SlicerError> {
    if audio.is_empty() {
        return Err(tag_error("audio buffer is empty"));
    }
    if !audio.starts_with(ID3_MAGIC) {
        return Ok(0);
    }
    if audio.len() < ID3_HEADER_SIZE {
        return Err(tag_error("truncated ID3 header"));
    }

    let size = decode_synchsafe(&audio[6..10])
        .ok_or_else(|| tag_error("ID3 header has an invalid size field"))?;
    let footer = if audio[5] & ID3_FLAG_FOOTER != 0 {
        ID3_FOOTER_SIZE
    } else {
        0
    };
    let total = ID3_HEADER_SIZE + size as usize + footer;
    if total > audio.len() {
        return Err(tag_error(format!(
            "ID3 tag declares {total} bytes but the buffer holds {}",
            audio.len()
        )));
    }
    Ok(total)
}

fn parse_tag(tag: &[u8]) -> Result<TagContents, SlicerError> {
    if tag.len() < ID3_HEADER_SIZE || !tag.starts_with(ID3_MAGIC) {
        return Err(tag_error("tag chunk does not hold an ID3 tag"));
    }
    let version = tag[3];
    let flags = tag[5];
    let size = decode_synchsafe(&tag[6..10])
        .ok_or_else(|| tag_error("ID3 header has an invalid size field"))? as usize;
    let end = ID3_HEADER_SIZE + size;
    if end > tag.len() {
        return Err(tag_error("ID3 tag is truncated"));
    }

    let mut contents = TagContents {
        version: Some(version),
        ..TagContents::default()
    };
    if version != 3 && version != 4 {
        log::debug!("Skipping frames of unsupported ID3v2.{version} tag");
        return Ok(contents);
    }

    let mut position = ID3_HEADER_SIZE;
    if flags & ID3_FLAG_EXTENDED_HEADER != 0 {
        if position + 4 > end {
            return Err(tag_error("truncated ID3 extended header"));
        }
        let extended = &tag[position..position + 4];
        position += if version == 3 {
            4 + BigEndian::read_u32(extended) as usize
        } else {
            decode_synchsafe(extended)
                .ok_or_else(|| tag_error("invalid ID3 extended header size"))?
                as usize
        };
    }

    while position + FRAME_HEADER_SIZE <= end {
        let header = &tag[position..position + FRAME_HEADER_SIZE];
        if header[0] == 0 {
            // Padding.
            break;
        }
        let frame_size = if version == 3 {
            BigEndian::read_u32(&header[4..8]) as usize
        } else {
            decode_synchsafe(&header[4..8]).ok_or_else(|| tag_error("invalid frame size"))? as usize
        };

        let start = position + FRAME_HEADER_SIZE;
        let frame_end = start
            .checked_add(frame_size)
            .filter(|&frame_end| frame_end <= end)
            .ok_or_else(|| {
                tag_error(format!(
                    "{} frame overruns the tag",
                    String::from_utf8_lossy(&header[0..4])
                ))
            })?;
        let content = &tag[start..frame_end];

        match &header[0..4] {
            b"TIT2" => contents.title = Some(decode_text(content)?),
            b"TPE1" => contents.artist = Some(decode_text(content)?),
            b"TALB" => contents.album = Some(decode_text(content)?),
            b"APIC" if contents.picture.is_none() => {
                contents.picture = Some(decode_picture(content)?)
            }
            _ => {}
        }
        position = frame_end;
    }

    Ok(contents)
}

fn decode_text(content: &[u8]) -> Result<String, SlicerError> {
    let (&encoding, text) = content
        .split_first()
        .ok_or_else(|| tag_error("empty text frame"))?;
    let decoded = match encoding {
        ENCODING_LATIN1 => text.iter().map(|&byte| char::from(byte)).collect(),
        ENCODING_UTF16_BOM => {
            let (big_endian, body) = match text {
                [0xFE, 0xFF, body @ ..] => (true, body),
                [0xFF, 0xFE, body @ ..] => (false, body),
                body => (false, body),
            };
            decode_utf16(body, big_endian)?
        }
        ENCODING_UTF16_BE => decode_utf16(text, true)?,
        ENCODING_UTF8 => String::from_utf8(text.to_vec())
            .map_err(|error| tag_error(format!("invalid UTF-8 text frame: {error}")))?,
        other => return Err(tag_error(format!("unknown text encoding {other}"))),
    };
    Ok(decoded.trim_end_matches('\0').to_string())
}

fn decode_utf16(bytes: &[u8], big_endian: bool) -> Result<String, SlicerError> {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| {
            if big_endian {
                BigEndian::read_u16(pair)
            } else {
                LittleEndian::read_u16(pair)
            }
        })
        .collect();
    String::from_utf16(&units).map_err(|error| tag_error(format!("invalid UTF-16 text: {error}")))
}

fn decode_picture(content: &[u8]) -> Result<EmbeddedPicture, SlicerError> {
    let malformed = || tag_error("malformed APIC frame");
    let (&encoding, rest) = content.split_first().ok_or_else(malformed)?;

    let mime_end = rest.iter().position(|&byte| byte == 0).ok_or_else(malformed)?;
    let mime = String::from_utf8_lossy(&rest[..mime_end]).into_owned();
    let rest = &rest[mime_end + 1..];
    let (&picture_type, rest) = rest.split_first().ok_or_else(malformed)?;

    let description_end = if encoding == ENCODING_UTF16_BOM || encoding == ENCODING_UTF16_BE {
        rest.chunks_exact(2)
            .position(|pair| pair == [0, 0])
            .map(|pair| pair * 2 + 2)
    } else {
        rest.iter().position(|&byte| byte == 0).map(|end| end + 1)
    }
    .ok_or_else(malformed)?;

    Ok(EmbeddedPicture {
        mime,
        picture_type,
        data: rest[description_end..].to_vec(),
    })
}

fn is_riff_wave(audio: &[u8]) -> Result<bool, SlicerError> {
    if !audio.starts_with(RIFF_MAGIC) {
        return Ok(false);
    }
    if audio.len() < RIFF_HEADER_SIZE {
        return Err(tag_error("truncated RIFF header"));
    }
    Ok(&audio[8..12] == WAVE_MAGIC)
}

fn is_id3_chunk(id: &[u8]) -> bool {
    id.eq_ignore_ascii_case(ID3_CHUNK_ID)
}

struct RiffChunk<'a> {
    id: &'a [u8],
    data: &'a [u8],
}

fn riff_chunks(audio: &[u8]) -> Result<Vec<RiffChunk<'_>>, SlicerError> {
    let mut chunks = Vec::new();
    let mut position = RIFF_HEADER_SIZE;

    while position < audio.len() {
        if position + RIFF_CHUNK_HEADER_SIZE > audio.len() {
            return Err(tag_error(format!(
                "truncated RIFF chunk header at offset {position}"
            )));
        }
        let id = &audio[position..position + 4];
        let size = LittleEndian::read_u32(&audio[position + 4..position + 8]) as usize;
        let start = position + RIFF_CHUNK_HEADER_SIZE;
        let end = start
            .checked_add(size)
            .filter(|&end| end <= audio.len())
            .ok_or_else(|| {
                tag_error(format!(
                    "RIFF chunk {} declares {size} bytes past the end of the file",
                    String::from_utf8_lossy(id)
                ))
            })?;

        chunks.push(RiffChunk {
            id,
            data: &audio[start..end],
        });
        // Chunks are word aligned; a missing final pad byte is tolerated.
        position = end + (size & 1);
    }

    Ok(chunks)
}

fn write_riff(chunks: &[RiffChunk<'_>], tag: Option<&[u8]>) -> Result<Vec<u8>, SlicerError> {
    let mut body = Vec::new();
    body.extend_from_slice(WAVE_MAGIC);

    for chunk in chunks.iter().filter(|chunk| !is_id3_chunk(chunk.id)) {
        write_riff_chunk(&mut body, chunk.id, chunk.data)?;
    }
    if let Some(tag) = tag {
        write_riff_chunk(&mut body, ID3_CHUNK_ID, tag)?;
    }

    let riff_size = u32::try_from(body.len())
        .map_err(|_| tag_error("tagged file exceeds the RIFF size limit"))?;
    let mut output = Vec::with_capacity(body.len() + 8);
    output.extend_from_slice(RIFF_MAGIC);
    output.write_u32::<LittleEndian>(riff_size)?;
    output.extend_from_slice(&body);
    Ok(output)
}

fn write_riff_chunk(output: &mut Vec<u8>, id: &[u8], data: &[u8]) -> Result<(), SlicerError> {
    let size = u32::try_from(data.len())
        .map_err(|_| tag_error("RIFF chunk exceeds the size limit"))?;
    output.extend_from_slice(id);
    output.write_u32::<LittleEndian>(size)?;
    output.extend_from_slice(data);
    if data.len() % 2 == 1 {
        output.push(0);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{audio::AudioChunk, wav::encode_wav};

    const PNG_COVER: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 1, 2, 3];
    const JPEG_COVER: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 9, 9];

    fn mpeg_payload() -> Vec<u8> {
        let mut payload = vec![0xFF, 0xFB, 0x90, 0x64];
        payload.extend((0..400u16).map(|value| (value % 251) as u8));
        payload
    }

    fn fields() -> TagFields {
        TagFields::new("Track 001", "Video Slicer", "Sliced Audio")
    }

    #[test]
    fn prepends_v23_tag_to_mpeg_audio() {
        let payload = mpeg_payload();
        let tagged = inject_tags(&payload, JPEG_COVER, &fields()).unwrap();

        assert_eq!(&tagged[0..5], b"ID3\x03\x00");
        let tag_len = leading_tag_len(&tagged).unwrap();
        assert_eq!(&tagged[tag_len..], payload.as_slice());

        let contents = read_tag_fields(&tagged).unwrap();
        assert_eq!(contents.version, Some(3));
        assert_eq!(contents.title.as_deref(), Some("Track 001"));
        assert_eq!(contents.artist.as_deref(), Some("Video Slicer"));
        assert_eq!(contents.album.as_deref(), Some("Sliced Audio"));
        let picture = contents.picture.unwrap();
        assert_eq!(picture.mime, "image/jpeg");
        assert_eq!(picture.picture_type, 3);
        assert_eq!(picture.data, JPEG_COVER);
    }

    #[test]
    fn retagging_replaces_the_tag_and_keeps_the_payload() {
        let payload = mpeg_payload();
        let once = inject_tags(&payload, JPEG_COVER, &fields()).unwrap();
        let twice = inject_tags(&once, JPEG_COVER, &fields()).unwrap();
        assert_eq!(once, twice);

        let retitled = inject_tags(&once, PNG_COVER, &TagFields::new("Other", "A", "B")).unwrap();
        assert_eq!(strip_tags(&retitled).unwrap(), payload);
        let contents = read_tag_fields(&retitled).unwrap();
        assert_eq!(contents.title.as_deref(), Some("Other"));
        assert_eq!(contents.picture.unwrap().mime, "image/png");
    }

    #[test]
    fn non_latin_text_uses_utf16() {
        let payload = mpeg_payload();
        let tagged =
            inject_tags(&payload, JPEG_COVER, &TagFields::new("トラック 001", "Ünïcode", "")).unwrap();
        let contents = read_tag_fields(&tagged).unwrap();
        assert_eq!(contents.title.as_deref(), Some("トラック 001"));
        assert_eq!(contents.artist.as_deref(), Some("Ünïcode"));
        assert_eq!(contents.album.as_deref(), Some(""));

        // TIT2 content starts right after the 10-byte tag and frame headers.
        assert_eq!(tagged[20], ENCODING_UTF16_BOM);
        assert_eq!(&tagged[21..23], &[0xFF, 0xFE]);
    }

    #[test]
    fn existing_tag_with_footer_is_removed() {
        let payload = mpeg_payload();
        let mut tagged = b"ID3\x04\x00\x10\x00\x00\x00\x02ab".to_vec();
        tagged.extend_from_slice(b"3DI\x04\x00\x10\x00\x00\x00\x02");
        tagged.extend_from_slice(&payload);

        assert_eq!(strip_tags(&tagged).unwrap(), payload);
        let retagged = inject_tags(&tagged, JPEG_COVER, &fields()).unwrap();
        assert_eq!(strip_tags(&retagged).unwrap(), payload);
    }

    #[test]
    fn wav_gets_an_id3_chunk() {
        let wav = encode_wav(&AudioChunk::silence(8_000, 1, 101)).unwrap();
        let tagged = inject_tags(&wav, PNG_COVER, &fields()).unwrap();

        assert_eq!(&tagged[0..4], b"RIFF");
        assert_eq!(LittleEndian::read_u32(&tagged[4..8]) as usize, tagged.len() - 8);
        assert_eq!(&tagged[..wav.len()][8..], &wav[8..]);
        assert_eq!(&tagged[wav.len()..wav.len() + 4], b"id3 ");
        assert_eq!(tagged.len() % 2, 0);

        let twice = inject_tags(&tagged, PNG_COVER, &fields()).unwrap();
        assert_eq!(twice, tagged);
        assert_eq!(strip_tags(&twice).unwrap(), wav);

        let contents = read_tag_fields(&tagged).unwrap();
        assert_eq!(contents.title.as_deref(), Some("Track 001"));
        assert_eq!(contents.picture.unwrap().mime, "image/png");
    }

    #[test]
    fn untagged_audio_reads_empty() {
        assert_eq!(read_tag_fields(&mpeg_payload()).unwrap(), TagContents::default());
    }

    #[test]
    fn malformed_input_is_rejected() {
        fn reject(audio: &[u8], cover: &[u8]) -> bool {
            matches!(
                inject_tags(audio, cover, &fields()),
                Err(SlicerError::TagInjectionError(_))
            )
        }

        assert!(reject(&[], JPEG_COVER));
        assert!(reject(&mpeg_payload(), &[]));
        assert!(reject(b"ID3\x03\x00", JPEG_COVER));
        assert!(reject(b"ID3\x03\x00\x00\x00\x00\x7F\x7Fshort", JPEG_COVER));
        assert!(reject(b"ID3\x03\x00\x00\x80\x00\x00\x00", JPEG_COVER));
        assert!(reject(b"RIFF\x04", JPEG_COVER));
        assert!(reject(b"RIFF\x20\x00\x00\x00WAVEdata\xFF\x00\x00\x00ab", JPEG_COVER));
        assert!(reject(b"RIFF\x20\x00\x00\x00WAVEfm", JPEG_COVER));
    }

    #[test]
    fn synchsafe_round_trip() {
        for value in [0, 1, 127, 128, 16_383, 1 << 20, MAX_SYNCHSAFE as u32] {
            assert_eq!(decode_synchsafe(&encode_synchsafe(value)), Some(value));
        }
        assert_eq!(encode_synchsafe(257), [0, 0, 2, 1]);
    }
}
