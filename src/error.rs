//! Error types shared across the catalog scanner and the audio engine.

use std::path::PathBuf;

use thiserror::Error;

/// Failures reported by an audio engine while opening, decoding or
/// outputting a track.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The locator could not be opened.
    #[error("cannot open {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file opened but its contents could not be decoded.
    #[error("cannot decode {path:?}: {message}")]
    Decode { path: PathBuf, message: String },

    /// `prepare_async` was called before `set_source`.
    #[error("no source set")]
    NoSource,

    /// A load was reported ready but its decoded source is gone.
    #[error("decoded source lost before playback started")]
    SourceLost,

    /// The output device is unavailable.
    #[error("audio output unavailable: {0}")]
    Output(String),
}

impl EngineError {
    /// Short stable diagnostic code, suitable for user-facing messages.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::Open { .. } => "E_OPEN",
            EngineError::Decode { .. } => "E_DECODE",
            EngineError::NoSource => "E_NO_SOURCE",
            EngineError::SourceLost => "E_SOURCE_LOST",
            EngineError::Output(_) => "E_OUTPUT",
        }
    }
}

/// Failure of a whole catalog scan. Per-file problems never surface here.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{0:?} is not a directory")]
    NotADirectory(PathBuf),

    #[error("cannot read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_error_codes_are_stable() {
        let open = EngineError::Open {
            path: PathBuf::from("/music/a.mp3"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert_eq!(open.code(), "E_OPEN");
        assert_eq!(EngineError::NoSource.code(), "E_NO_SOURCE");
        assert_eq!(EngineError::SourceLost.code(), "E_SOURCE_LOST");
        assert_eq!(EngineError::Output("gone".into()).code(), "E_OUTPUT");
        assert!(open.to_string().contains("a.mp3"));
    }
}
