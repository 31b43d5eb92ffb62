//! In-memory archive of named binary entries.
//!
//! [`Archive`] is the unit both pipelines consume and produce: a set of
//! uniquely named blobs, kept in insertion order, serialised as a zip file.

use std::{
    collections::HashMap,
    io::{Cursor, Read, Write},
};

use zip::{CompressionMethod, ZipArchive, ZipWriter, write::SimpleFileOptions};

use crate::error::SlicerError;

/// Upper bound on deflate's expansion, used to cap the declared entry size
/// before pre-allocating.
const MAX_DEFLATE_RATIO: u64 = 1_032;

/// One named blob inside an [`Archive`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Entry name, unique within its archive.
    pub name: String,
    /// Entry contents.
    pub bytes: Vec<u8>,
}

/// An insertion-ordered collection of uniquely named entries.
///
/// # Example
///
/// ```
/// use video_slicer::Archive;
///
/// let mut archive = Archive::new();
/// archive.insert("audio_001.wav", vec![0; 4])?;
/// let bytes = archive.to_zip_bytes()?;
///
/// let restored = Archive::from_zip_bytes(&bytes)?;
/// assert_eq!(restored.get("audio_001.wav"), Some(&[0u8; 4][..]));
/// # Ok::<(), video_slicer::SlicerError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Archive {
    entries: Vec<ArchiveEntry>,
    positions: HashMap<String, usize>,
}

impl Archive {
    /// Create an empty archive.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry.
    ///
    /// # Errors
    ///
    /// Returns [`SlicerError::ArchiveError`] if the name is empty or
    /// already present.
    pub fn insert(&mut self, name: impl Into<String>, bytes: Vec<u8>) -> Result<(), SlicerError> {
        let name = name.into();
        if name.is_empty() {
            return Err(SlicerError::ArchiveError(
                "archive entry names must not be empty".to_string(),
            ));
        }
        if self.positions.contains_key(&name) {
            return Err(SlicerError::ArchiveError(format!(
                "duplicate archive entry: {name}"
            )));
        }
        self.positions.insert(name.clone(), self.entries.len());
        self.entries.push(ArchiveEntry { name, bytes });
        Ok(())
    }

    /// Look up an entry's bytes by name.
    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.positions
            .get(name)
            .map(|&position| self.entries[position].bytes.as_slice())
    }

    /// Returns `true` if an entry with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }

    /// Entry names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.name.as_str())
    }

    /// Entries in insertion order.
    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the archive holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Read a zip file into memory.
    ///
    /// Directory entries are skipped; nested paths are kept verbatim as
    /// entry names.
    ///
    /// # Errors
    ///
    /// Returns [`SlicerError::ArchiveError`] if the bytes are not a valid
    /// zip file, an entry cannot be inflated, or two entries share a name.
    pub fn from_zip_bytes(bytes: &[u8]) -> Result<Self, SlicerError> {
        let mut reader = ZipArchive::new(Cursor::new(bytes))?;
        let mut archive = Archive::new();

        for position in 0..reader.len() {
            let mut file = reader.by_index(position)?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().to_string();
            let capacity = file.size().min(bytes.len() as u64 * MAX_DEFLATE_RATIO);
            let mut contents = Vec::with_capacity(capacity as usize);
            file.read_to_end(&mut contents).map_err(|error| {
                SlicerError::ArchiveError(format!("failed to read entry {name}: {error}"))
            })?;
            archive.insert(name, contents)?;
        }

        log::debug!(
            "Unpacked archive: {} entries from {} bytes",
            archive.len(),
            bytes.len()
        );
        Ok(archive)
    }

    /// Serialise the archive as a deflate-compressed zip file.
    ///
    /// # Errors
    ///
    /// Returns [`SlicerError::ArchiveError`] if the zip writer fails.
    pub fn to_zip_bytes(&self) -> Result<Vec<u8>, SlicerError> {
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .large_file(self.entries.iter().any(|entry| entry.bytes.len() >= u32::MAX as usize));
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

        for entry in &self.entries {
            writer.start_file(entry.name.as_str(), options)?;
            writer.write_all(&entry.bytes).map_err(|error| {
                SlicerError::ArchiveError(format!("failed to write entry {}: {error}", entry.name))
            })?;
        }

        let bytes = writer.finish()?.into_inner();
        log::debug!(
            "Packed archive: {} entries into {} bytes",
            self.entries.len(),
            bytes.len()
        );
        Ok(bytes)
    }
}

impl IntoIterator for Archive {
    type Item = ArchiveEntry;
    type IntoIter = std::vec::IntoIter<ArchiveEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
