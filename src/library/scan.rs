use std::fs;
use std::path::Path;
use std::sync::Arc;

use lofty::prelude::*;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::LibrarySettings;
use crate::error::CatalogError;

use super::display::display_from_fields;
use super::model::{Track, TrackId, UNKNOWN_ALBUM, UNKNOWN_ARTIST, UNKNOWN_TITLE};

fn is_audio_file(path: &Path, settings: &LibrarySettings) -> bool {
    let Some(ext) = path.extension().and_then(|s| s.to_str()) else {
        return false;
    };
    let ext = ext.to_ascii_lowercase();
    settings
        .extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .any(|e| !e.is_empty() && e == ext)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

/// Tag values read from a file; every field is optional.
#[derive(Default)]
struct Tags {
    title: Option<String>,
    artist: Option<String>,
    album: Option<String>,
    duration_ms: u64,
    cover: Option<Arc<[u8]>>,
}

fn trimmed(v: Option<std::borrow::Cow<'_, str>>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn read_tags(path: &Path, load_cover_art: bool) -> Tags {
    let tagged = match lofty::read_from_path(path) {
        Ok(t) => t,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "no readable tags, using defaults");
            return Tags::default();
        }
    };

    let mut tags = Tags {
        duration_ms: tagged.properties().duration().as_millis() as u64,
        ..Tags::default()
    };

    if let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
        tags.title = trimmed(tag.title());
        tags.artist = trimmed(tag.artist());
        tags.album = trimmed(tag.album());
        if load_cover_art {
            tags.cover = tag.pictures().first().map(|p| Arc::from(p.data()));
        }
    }
    tags
}

/// Enumerate playable files under `dir` and build the catalog.
///
/// Only a missing or non-directory root fails the scan. Unreadable entries are
/// skipped and missing metadata is replaced with placeholders. Tracks are
/// sorted case-insensitively by their display label, then numbered.
pub fn scan(dir: &Path, settings: &LibrarySettings) -> Result<Vec<Track>, CatalogError> {
    let meta = fs::metadata(dir).map_err(|source| CatalogError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    if !meta.is_dir() {
        return Err(CatalogError::NotADirectory(dir.to_path_buf()));
    }

    let mut walker = WalkDir::new(dir).follow_links(settings.follow_links);

    // Non-recursive = only the root directory.
    let depth_cap = if settings.recursive {
        settings.max_depth
    } else {
        Some(1)
    };
    if let Some(d) = depth_cap {
        walker = walker.max_depth(d);
    }

    let mut tracks: Vec<Track> = Vec::new();
    for entry in walker
        .into_iter()
        .filter_entry(|e| settings.include_hidden || e.depth() == 0 || !is_hidden(e.path()))
    {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!(error = %e, "skipping unreadable library entry");
                continue;
            }
        };
        let path = entry.path();
        if !entry.file_type().is_file() && !path.is_file() {
            continue;
        }
        if !is_audio_file(path, settings) {
            continue;
        }

        let tags = read_tags(path, settings.load_cover_art);
        let title = tags
            .title
            .or_else(|| {
                path.file_stem()
                    .and_then(|s| s.to_str())
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
            })
            .unwrap_or_else(|| UNKNOWN_TITLE.to_string());

        let display = display_from_fields(
            path,
            &title,
            tags.artist.as_deref(),
            tags.album.as_deref(),
            &settings.display_fields,
            &settings.display_separator,
        );

        tracks.push(Track {
            id: TrackId(0),
            title,
            artist: tags.artist.unwrap_or_else(|| UNKNOWN_ARTIST.to_string()),
            album: tags.album.unwrap_or_else(|| UNKNOWN_ALBUM.to_string()),
            duration_ms: tags.duration_ms,
            locator: path.to_path_buf(),
            cover_image: tags.cover,
            display,
        });
    }

    tracks.sort_by_cached_key(|t| t.display.to_lowercase());
    for (i, track) in tracks.iter_mut().enumerate() {
        track.id = TrackId(i as u64);
    }
    debug!(dir = %dir.display(), count = tracks.len(), "library scan finished");
    Ok(tracks)
}
