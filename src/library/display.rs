use std::path::Path;

use crate::config::TrackDisplayField;

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

/// Compose the list label for a track from the configured `fields`, joined by `sep`.
///
/// Missing tags are skipped rather than replaced with placeholders, so a file
/// without an artist tag shows as just its title. Falls back to `title` when
/// nothing could be produced.
pub(super) fn display_from_fields(
    path: &Path,
    title: &str,
    artist: Option<&str>,
    album: Option<&str>,
    fields: &[TrackDisplayField],
    sep: &str,
) -> String {
    let parts: Vec<String> = fields
        .iter()
        .filter_map(|field| match field {
            TrackDisplayField::Title => non_empty(Some(title)).map(str::to_string),
            TrackDisplayField::Artist => non_empty(artist).map(str::to_string),
            TrackDisplayField::Album => non_empty(album).map(str::to_string),
            TrackDisplayField::Filename => {
                non_empty(path.file_stem().and_then(|s| s.to_str())).map(str::to_string)
            }
            TrackDisplayField::Path => Some(path.display().to_string()),
        })
        .collect();

    if parts.is_empty() {
        title.to_string()
    } else {
        parts.join(sep)
    }
}
