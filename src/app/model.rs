//! The `App` view model.
//!
//! `App` never drives playback itself. It holds a snapshot of the queue's
//! working order, the list cursor, and whatever the controller last announced.

use crate::library::{Track, TrackId};
use crate::player::PlayerEvent;
use crate::queue::PlayMode;

/// The main application model.
pub struct App {
    /// Snapshot of the controller's working order.
    pub tracks: Vec<Track>,
    pub selected: usize,

    pub follow_playback: bool,

    pub now_playing: Option<Track>,
    pub playing: bool,
    pub position_ms: u64,
    pub duration_ms: u64,
    pub mode: PlayMode,

    /// Last error or edge hint, cleared when a new track loads.
    pub status_message: Option<String>,
    pub current_dir: Option<String>,
    pub metadata_window: bool,
}

impl App {
    /// Create a new `App` showing `tracks`.
    pub fn new(tracks: Vec<Track>) -> Self {
        Self {
            tracks,
            selected: 0,
            follow_playback: true,
            now_playing: None,
            playing: false,
            position_ms: 0,
            duration_ms: 0,
            mode: PlayMode::default(),
            status_message: None,
            current_dir: None,
            metadata_window: false,
        }
    }

    pub fn toggle_metadata_window(&mut self) {
        self.metadata_window = !self.metadata_window;
    }

    pub fn follow_playback_on(&mut self) {
        self.follow_playback = true;
    }

    pub fn follow_playback_off(&mut self) {
        self.follow_playback = false;
    }

    /// Record the current directory in the app state.
    pub fn set_current_dir(&mut self, dir: String) {
        self.current_dir = Some(dir);
    }

    pub fn has_tracks(&self) -> bool {
        !self.tracks.is_empty()
    }

    fn position_of(&self, id: TrackId) -> Option<usize> {
        self.tracks.iter().position(|t| t.id == id)
    }

    /// Position of the loaded track in the shown order.
    pub fn now_playing_position(&self) -> Option<usize> {
        self.now_playing.as_ref().and_then(|t| self.position_of(t.id))
    }

    /// Replace the shown order, keeping the same track selected.
    pub fn set_tracks(&mut self, tracks: Vec<Track>) {
        let selected_id = self.tracks.get(self.selected).map(|t| t.id);
        self.tracks = tracks;
        self.selected = selected_id
            .and_then(|id| self.position_of(id))
            .unwrap_or(0);
    }

    /// Fold one controller notification into the model.
    pub fn apply(&mut self, event: PlayerEvent) {
        match event {
            PlayerEvent::StateChanged { is_playing } => self.playing = is_playing,
            PlayerEvent::Progress {
                position_ms,
                duration_ms,
            } => {
                self.position_ms = position_ms;
                if duration_ms > 0 {
                    self.duration_ms = duration_ms;
                }
            }
            PlayerEvent::TrackChanged(track) => {
                self.position_ms = 0;
                self.duration_ms = track.as_ref().map_or(0, |t| t.duration_ms);
                if track.is_some() {
                    self.status_message = None;
                }
                self.now_playing = track;
                if self.follow_playback {
                    self.select_now_playing();
                }
            }
            PlayerEvent::ModeChanged(mode) => self.mode = mode,
            PlayerEvent::Error(message) => self.status_message = Some(message),
            PlayerEvent::Edge(edge) => self.status_message = Some(edge.message().to_string()),
        }
    }

    /// Move the cursor onto the loaded track, if it is shown.
    pub fn select_now_playing(&mut self) {
        if let Some(pos) = self.now_playing_position() {
            self.selected = pos;
        }
    }

    pub fn select_first(&mut self) {
        self.selected = 0;
    }

    pub fn select_last(&mut self) {
        self.selected = self.tracks.len().saturating_sub(1);
    }

    /// Move selection down, wrapping to the top.
    pub fn next(&mut self) {
        if self.tracks.is_empty() {
            return;
        }
        self.selected = (self.selected + 1) % self.tracks.len();
    }

    /// Move selection up, wrapping to the bottom.
    pub fn prev(&mut self) {
        if self.tracks.is_empty() {
            return;
        }
        self.selected = match self.selected {
            0 => self.tracks.len() - 1,
            s => s - 1,
        };
    }
}
