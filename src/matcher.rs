//! Audio/cover pairing by shared index.
//!
//! Entries are paired purely by name: `audio_NNN.(mp3|wav)` and
//! `cover_NNN.(png|jpg|jpeg)`, case-insensitive, where `NNN` is exactly
//! three digits. Only the final path component is inspected, so entries
//! inside a folder of the archive still pair. Indices present in only one
//! role are dropped silently.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;

static AUDIO_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^audio_([0-9]{3})\.(mp3|wav)$").expect("audio pattern is valid")
});

static COVER_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^cover_([0-9]{3})\.(png|jpg|jpeg)$").expect("cover pattern is valid")
});

/// The role an entry name plays in pairing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryRole {
    /// An audio entry with its index and extension (as written).
    Audio {
        /// Three-digit index.
        index: String,
        /// File extension without the dot.
        extension: String,
    },
    /// A cover entry with its index.
    Cover {
        /// Three-digit index.
        index: String,
    },
}

/// Classify an entry name, or `None` if it plays no role.
pub fn classify(name: &str) -> Option<EntryRole> {
    let file_name = name.rsplit('/').next().unwrap_or(name);

    if let Some(captures) = AUDIO_NAME.captures(file_name) {
        return Some(EntryRole::Audio {
            index: captures[1].to_string(),
            extension: captures[2].to_string(),
        });
    }
    COVER_NAME.captures(file_name).map(|captures| EntryRole::Cover {
        index: captures[1].to_string(),
    })
}

/// One matched audio/cover pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairMatch {
    /// The shared index exactly as it appears in both names.
    pub index: String,
    /// Name of the audio entry.
    pub audio: String,
    /// Extension of the audio entry, case preserved.
    pub audio_extension: String,
    /// Name of the cover entry.
    pub cover: String,
}

/// Pair audio and cover entry names by index.
///
/// Pairs come back in discovery order: the order their audio entries
/// appear in `names`. If an index occurs more than once in the same role,
/// the first occurrence wins.
///
/// # Example
///
/// ```
/// use video_slicer::match_pairs;
///
/// let pairs = match_pairs(["audio_001.mp3", "cover_001.png", "audio_002.mp3"]);
/// assert_eq!(pairs.len(), 1);
/// assert_eq!(pairs[0].index, "001");
/// ```
pub fn match_pairs<'a, I>(names: I) -> Vec<PairMatch>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut audio: Vec<(String, String, String)> = Vec::new();
    let mut seen_audio: HashSet<String> = HashSet::new();
    let mut covers: HashMap<String, String> = HashMap::new();

    for name in names {
        match classify(name) {
            Some(EntryRole::Audio { index, extension }) => {
                if seen_audio.insert(index.clone()) {
                    audio.push((index, name.to_string(), extension));
                } else {
                    log::warn!("Ignoring duplicate audio entry for index {index}: {name}");
                }
            }
            Some(EntryRole::Cover { index }) => {
                if covers.contains_key(&index) {
                    log::warn!("Ignoring duplicate cover entry for index {index}: {name}");
                } else {
                    covers.insert(index, name.to_string());
                }
            }
            None => log::debug!("Entry plays no pairing role: {name}"),
        }
    }

    let pairs: Vec<PairMatch> = audio
        .into_iter()
        .filter_map(|(index, audio_name, extension)| {
            let cover = covers.get(&index)?.clone();
            Some(PairMatch {
                index,
                audio: audio_name,
                audio_extension: extension,
                cover,
            })
        })
        .collect();

    log::debug!(
        "Matched {} pairs from {} audio and {} cover entries",
        pairs.len(),
        seen_audio.len(),
        covers.len(),
    );
    pairs
}
