//! Observer protocol.
//!
//! Observers receive push notifications from the playback controller on the
//! control thread. They must not call back into the controller; anything that
//! needs to react should queue work (see [`ChannelObserver`]).

use std::collections::HashMap;
use std::rc::Rc;
use std::sync::mpsc::Sender;

use crate::library::Track;
use crate::queue::PlayMode;

/// Which end of the queue playback ran into.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum QueueEdge {
    /// No next track.
    End,
    /// No previous track.
    Start,
}

impl QueueEdge {
    pub fn message(self) -> &'static str {
        match self {
            QueueEdge::End => "no more tracks",
            QueueEdge::Start => "already at first track",
        }
    }
}

/// Receiver of playback notifications. Every method defaults to doing nothing.
pub trait PlaybackObserver {
    fn on_playback_state_changed(&self, _is_playing: bool) {}

    /// The engine was stopped: explicitly, at a queue edge or after an error.
    /// Follows the `on_playback_state_changed(false)` for the same stop.
    fn on_stopped(&self) {}

    fn on_progress(&self, _position_ms: u64, _duration_ms: u64) {}

    fn on_track_changed(&self, _track: Option<&Track>) {}

    fn on_mode_changed(&self, _mode: PlayMode) {}

    fn on_error(&self, _message: &str) {}

    /// Playback stopped at a queue boundary. Not an error.
    fn on_edge(&self, _edge: QueueEdge) {}
}

/// A notification as a value.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    StateChanged { is_playing: bool },
    Progress { position_ms: u64, duration_ms: u64 },
    TrackChanged(Option<Track>),
    ModeChanged(PlayMode),
    Error(String),
    Edge(QueueEdge),
}

/// Forwards every notification into a channel.
pub struct ChannelObserver {
    tx: Sender<PlayerEvent>,
}

impl ChannelObserver {
    pub fn new(tx: Sender<PlayerEvent>) -> Self {
        Self { tx }
    }

    fn send(&self, event: PlayerEvent) {
        // A closed receiver just means nobody is listening any more.
        let _ = self.tx.send(event);
    }
}

impl PlaybackObserver for ChannelObserver {
    fn on_playback_state_changed(&self, is_playing: bool) {
        self.send(PlayerEvent::StateChanged { is_playing });
    }

    fn on_progress(&self, position_ms: u64, duration_ms: u64) {
        self.send(PlayerEvent::Progress {
            position_ms,
            duration_ms,
        });
    }

    fn on_track_changed(&self, track: Option<&Track>) {
        self.send(PlayerEvent::TrackChanged(track.cloned()));
    }

    fn on_mode_changed(&self, mode: PlayMode) {
        self.send(PlayerEvent::ModeChanged(mode));
    }

    fn on_error(&self, message: &str) {
        self.send(PlayerEvent::Error(message.to_string()));
    }

    fn on_edge(&self, edge: QueueEdge) {
        self.send(PlayerEvent::Edge(edge));
    }
}

/// Registered observers, at most one entry per observer allocation.
/// Delivery order is unspecified.
#[derive(Default)]
pub struct ObserverSet {
    observers: HashMap<usize, Rc<dyn PlaybackObserver>>,
}

fn identity(observer: &Rc<dyn PlaybackObserver>) -> usize {
    Rc::as_ptr(observer) as *const () as usize
}

impl ObserverSet {
    /// Returns `false` if `observer` was already registered.
    pub fn add(&mut self, observer: Rc<dyn PlaybackObserver>) -> bool {
        self.observers.insert(identity(&observer), observer).is_none()
    }

    /// Returns `false` if `observer` was not registered.
    pub fn remove(&mut self, observer: &Rc<dyn PlaybackObserver>) -> bool {
        self.observers.remove(&identity(observer)).is_some()
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn notify(&self, f: impl Fn(&dyn PlaybackObserver)) {
        for observer in self.observers.values() {
            f(observer.as_ref());
        }
    }
}
