use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Placeholder used when a file carries no artist tag.
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";
/// Placeholder used when a file carries no album tag.
pub const UNKNOWN_ALBUM: &str = "Unknown Album";
/// Placeholder used when neither a title tag nor a usable file stem exists.
pub const UNKNOWN_TITLE: &str = "Unknown Title";

/// Identifier of a track, unique within one catalog scan.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrackId(pub u64);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An immutable playable track.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub id: TrackId,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub duration_ms: u64,
    /// Path the audio engine opens.
    pub locator: PathBuf,
    pub cover_image: Option<Arc<[u8]>>,
    /// Label shown in the track list.
    pub display: String,
}
