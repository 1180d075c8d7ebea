use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::library::{Track, TrackId};

use super::shuffle::{pick_unvisited, shuffled};

/// How the queue is traversed.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum PlayMode {
    /// Play in catalog order; stop after the last track.
    #[default]
    Ordered,
    /// Play in catalog order, wrapping around at both ends.
    Looping,
    /// Play a random permutation, visiting every track before repeating one.
    Shuffled,
}

impl PlayMode {
    /// `Ordered -> Looping -> Shuffled -> Ordered`.
    pub fn cycle(self) -> Self {
        match self {
            PlayMode::Ordered => PlayMode::Looping,
            PlayMode::Looping => PlayMode::Shuffled,
            PlayMode::Shuffled => PlayMode::Ordered,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PlayMode::Ordered => "Ordered",
            PlayMode::Looping => "Looping",
            PlayMode::Shuffled => "Shuffled",
        }
    }
}

/// Cursor bookkeeping over a list of tracks.
///
/// `working` is `original` unless the mode is `Shuffled`, in which case it is
/// a full permutation of it. `cursor` is `None` until a track is selected and
/// whenever the queue is empty. `history` holds previously visited positions
/// (most recent last) and only matters in `Shuffled` mode.
pub struct QueueManager {
    original: Vec<Track>,
    working: Vec<Track>,
    cursor: Option<usize>,
    mode: PlayMode,
    history: Vec<usize>,
    rng: StdRng,
}

impl Default for QueueManager {
    fn default() -> Self {
        Self::new()
    }
}

impl QueueManager {
    /// An empty queue in `Ordered` mode, seeded from OS entropy.
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// An empty queue with a deterministic random source.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            original: Vec::new(),
            working: Vec::new(),
            cursor: None,
            mode: PlayMode::Ordered,
            history: Vec::new(),
            rng,
        }
    }

    fn build_working_order(&mut self) -> Vec<Track> {
        match self.mode {
            PlayMode::Shuffled => shuffled(&self.original, &mut self.rng),
            PlayMode::Ordered | PlayMode::Looping => self.original.clone(),
        }
    }

    fn position_of(&self, id: TrackId) -> Option<usize> {
        self.working.iter().position(|t| t.id == id)
    }

    /// Replace the queue contents and select `start_id` if it is present.
    ///
    /// Does not start playback; the caller looks at the cursor afterwards.
    pub fn set_queue(&mut self, tracks: Vec<Track>, start_id: Option<TrackId>) {
        self.original = tracks;
        self.working = self.build_working_order();
        self.cursor = start_id.and_then(|id| self.position_of(id));
        self.history.clear();
    }

    /// Switch traversal mode, keeping the current track current.
    pub fn set_mode(&mut self, mode: PlayMode) {
        if mode == self.mode {
            return;
        }
        let current = self.current_track().map(|t| t.id);

        self.mode = mode;
        self.working = self.build_working_order();
        self.history.clear();

        self.cursor = match current {
            _ if self.working.is_empty() => None,
            None => None,
            Some(id) => Some(self.position_of(id).unwrap_or(0)),
        };
    }

    fn next_position(&mut self) -> Option<usize> {
        let len = self.working.len();
        if len == 0 {
            return None;
        }
        match self.mode {
            PlayMode::Ordered => {
                let next = self.cursor.map_or(0, |c| c + 1);
                (next < len).then_some(next)
            }
            PlayMode::Looping => Some(self.cursor.map_or(0, |c| (c + 1) % len)),
            PlayMode::Shuffled => pick_unvisited(len, self.cursor, &mut self.history, &mut self.rng),
        }
    }

    fn previous_position(&mut self) -> Option<usize> {
        let len = self.working.len();
        if len == 0 {
            return None;
        }
        match self.mode {
            PlayMode::Ordered => Some(self.cursor.map_or(0, |c| c.saturating_sub(1))),
            PlayMode::Looping => Some(match self.cursor {
                None | Some(0) => len - 1,
                Some(c) => c - 1,
            }),
            PlayMode::Shuffled => {
                let popped = std::iter::from_fn(|| self.history.pop()).find(|&p| p < len);
                Some(popped.unwrap_or(len - 1))
            }
        }
    }

    /// Move to the next track for the current mode. Returns `false` when
    /// there is none (end of an `Ordered` queue, or an empty queue).
    pub fn advance(&mut self) -> bool {
        let Some(next) = self.next_position() else {
            return false;
        };
        if self.mode == PlayMode::Shuffled {
            if let Some(current) = self.cursor {
                self.history.push(current);
            }
        }
        self.cursor = Some(next);
        true
    }

    /// Move to the previous track for the current mode. Only fails on an
    /// empty queue: `Ordered` clamps at the first track.
    pub fn retreat(&mut self) -> bool {
        match self.previous_position() {
            Some(prev) => {
                self.cursor = Some(prev);
                true
            }
            None => false,
        }
    }

    /// Select `position` in the working order. Out-of-range positions leave
    /// the queue untouched.
    pub fn jump_to(&mut self, position: usize) -> Option<&Track> {
        if position >= self.working.len() {
            return None;
        }
        self.cursor = Some(position);
        self.working.get(position)
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.cursor.and_then(|c| self.working.get(c))
    }

    pub fn current_position(&self) -> Option<usize> {
        self.cursor
    }

    pub fn mode(&self) -> PlayMode {
        self.mode
    }

    /// The order tracks are actually traversed in.
    pub fn working_order(&self) -> &[Track] {
        &self.working
    }

    /// Tracks in the order they were handed to `set_queue`.
    #[cfg(test)]
    pub fn original_order(&self) -> &[Track] {
        &self.original
    }

    /// Positions visited in `Shuffled` mode, most recent last.
    #[cfg(test)]
    pub fn shuffle_history(&self) -> &[usize] {
        &self.history
    }

    pub fn len(&self) -> usize {
        self.working.len()
    }

    pub fn is_empty(&self) -> bool {
        self.working.is_empty()
    }
}
