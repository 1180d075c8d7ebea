use std::rc::Rc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::audio::{AudioEngine, EngineEvent, Ticket};
use crate::error::EngineError;
use crate::library::{Track, TrackId};
use crate::queue::{PlayMode, QueueManager};

use super::observer::{ObserverSet, PlaybackObserver, QueueEdge};
use super::ticker::ProgressTicker;

/// Where the engine is in the life of the current track.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum EngineState {
    /// Nothing has been loaded yet.
    #[default]
    Idle,
    /// Waiting for the engine to confirm the source is ready.
    Preparing,
    /// Prepared but not started.
    Ready,
    Playing,
    Paused,
    Stopped,
    /// Like `Stopped`, after an engine failure was reported.
    Errored,
}

/// Drives one [`AudioEngine`] through the tracks of a [`QueueManager`].
///
/// Not thread-safe: every call, including [`handle_engine_event`] and
/// [`tick`], must come from the same control thread.
///
/// [`handle_engine_event`]: PlaybackController::handle_engine_event
/// [`tick`]: PlaybackController::tick
pub struct PlaybackController<E: AudioEngine> {
    engine: E,
    queue: QueueManager,
    observers: ObserverSet,
    state: EngineState,
    prepared: bool,
    /// Start playback as soon as the pending prepare lands.
    autostart: bool,
    ticket: Ticket,
    loaded: bool,
    ticker: ProgressTicker,
}

impl<E: AudioEngine> PlaybackController<E> {
    pub fn new(engine: E, progress_interval: Duration) -> Self {
        Self::with_queue(engine, QueueManager::new(), progress_interval)
    }

    pub fn with_queue(engine: E, queue: QueueManager, progress_interval: Duration) -> Self {
        Self {
            engine,
            queue,
            observers: ObserverSet::default(),
            state: EngineState::Idle,
            prepared: false,
            autostart: false,
            ticket: Ticket::default(),
            loaded: false,
            ticker: ProgressTicker::new(progress_interval),
        }
    }

    /// Register `observer`. Registering the same observer twice is a no-op.
    pub fn add_observer(&mut self, observer: Rc<dyn PlaybackObserver>) -> bool {
        let added = self.observers.add(observer);
        debug!(added, observers = self.observers.len(), "observer registration");
        added
    }

    pub fn remove_observer(&mut self, observer: &Rc<dyn PlaybackObserver>) -> bool {
        self.observers.remove(observer)
    }

    /// Replace the queue and load `start_id` when it is part of it.
    pub fn init_queue(&mut self, tracks: Vec<Track>, start_id: Option<TrackId>) {
        self.queue.set_queue(tracks, start_id);
        info!(tracks = self.queue.len(), ?start_id, "queue replaced");

        match self.queue.current_position() {
            Some(position) => {
                self.load_at(position);
            }
            None => {
                if self.loaded {
                    self.stop();
                }
                self.loaded = false;
                self.state = EngineState::Idle;
                self.observers.notify(|o| o.on_track_changed(None));
            }
        }
    }

    /// Select `position` in the working order and start preparing it.
    ///
    /// Returns `false` when `position` is out of range. Playback starts once
    /// the engine reports the track prepared.
    pub fn load_at(&mut self, position: usize) -> bool {
        let Some(track) = self.queue.jump_to(position).cloned() else {
            debug!(position, "load ignored: position out of range");
            return false;
        };

        let was_playing = self.is_playing();
        self.ticker.stop();
        self.engine.reset();
        self.prepared = false;
        self.autostart = true;
        self.loaded = true;
        self.ticket = self.ticket.next();
        self.state = EngineState::Preparing;

        info!(position, id = %track.id, locator = ?track.locator, "loading track");
        self.observers.notify(|o| o.on_track_changed(Some(&track)));
        if was_playing {
            self.observers.notify(|o| o.on_playback_state_changed(false));
        }

        let requested = self
            .engine
            .set_source(&track.locator)
            .and_then(|()| self.engine.prepare_async(self.ticket));
        if let Err(error) = requested {
            self.fail(error);
        }
        true
    }

    /// Apply an engine signal. Signals from superseded loads are dropped.
    pub fn handle_engine_event(&mut self, event: EngineEvent) {
        if event.ticket() != self.ticket {
            debug!(?event, current = ?self.ticket, "dropping stale engine event");
            return;
        }

        match event {
            EngineEvent::Prepared { .. } => {
                if self.state != EngineState::Preparing {
                    debug!(state = ?self.state, "prepared signal outside of a load");
                    return;
                }
                self.prepared = true;
                self.state = EngineState::Ready;
                if self.autostart {
                    self.play();
                }
            }
            EngineEvent::Completed { .. } => {
                debug!("track completed");
                self.next();
            }
            EngineEvent::Failed { error, .. } => self.fail(error),
        }
    }

    pub fn play(&mut self) {
        if !self.prepared {
            debug!(state = ?self.state, "play ignored: nothing prepared");
            return;
        }
        self.engine.start();
        self.state = EngineState::Playing;
        self.ticker.restart(Instant::now());
        self.observers.notify(|o| o.on_playback_state_changed(true));
    }

    pub fn pause(&mut self) {
        self.engine.pause();
        self.ticker.stop();
        self.autostart = false;
        if self.state == EngineState::Playing {
            self.state = EngineState::Paused;
        }
        self.observers.notify(|o| o.on_playback_state_changed(false));
    }

    pub fn toggle(&mut self) {
        match self.state {
            EngineState::Playing => self.pause(),
            EngineState::Preparing => self.autostart = !self.autostart,
            EngineState::Ready | EngineState::Paused => self.play(),
            _ if !self.loaded => {
                if self.queue.is_empty() {
                    debug!("toggle ignored: queue is empty");
                    return;
                }
                let position = self.queue.current_position().unwrap_or(0);
                self.load_at(position);
            }
            EngineState::Idle | EngineState::Stopped | EngineState::Errored => {
                if let Some(position) = self.queue.current_position() {
                    self.load_at(position);
                }
            }
        }
    }

    pub fn next(&mut self) {
        if self.queue.advance() {
            if let Some(position) = self.queue.current_position() {
                self.load_at(position);
            }
        } else {
            self.hit_edge(QueueEdge::End);
        }
    }

    pub fn previous(&mut self) {
        if self.queue.retreat() {
            if let Some(position) = self.queue.current_position() {
                self.load_at(position);
            }
        } else {
            self.hit_edge(QueueEdge::Start);
        }
    }

    /// Jump to `position_ms` in the current track. Ignored until prepared.
    pub fn seek(&mut self, position_ms: u64) {
        if !self.prepared {
            debug!(position_ms, "seek ignored: nothing prepared");
            return;
        }
        self.engine.seek_to(position_ms);
        self.publish_progress();
    }

    /// Change traversal mode and re-announce track, mode and state.
    pub fn set_mode(&mut self, mode: PlayMode) {
        self.queue.set_mode(mode);
        info!(mode = mode.label(), "play mode set");

        let track = self.queue.current_track().cloned();
        let playing = self.is_playing();
        self.observers.notify(|o| {
            o.on_mode_changed(mode);
            o.on_track_changed(track.as_ref());
            o.on_playback_state_changed(playing);
        });
    }

    pub fn stop(&mut self) {
        self.halt();
        if self.state != EngineState::Idle {
            self.state = EngineState::Stopped;
        }
        self.observers.notify(|o| {
            o.on_playback_state_changed(false);
            o.on_stopped();
        });
    }

    /// Publish progress if a tick is due at `now`.
    pub fn tick(&mut self, now: Instant) {
        if self.state != EngineState::Playing {
            self.ticker.stop();
            return;
        }
        if self.ticker.poll(now) {
            self.publish_progress();
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == EngineState::Playing
    }

    pub fn is_prepared(&self) -> bool {
        self.prepared
    }

    pub fn mode(&self) -> PlayMode {
        self.queue.mode()
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.queue.current_track()
    }

    pub fn current_position(&self) -> Option<usize> {
        self.queue.current_position()
    }

    /// Snapshot of the order tracks are traversed in.
    pub fn working_order(&self) -> &[Track] {
        self.queue.working_order()
    }

    /// Current load generation. Advances on every load and every stop.
    pub fn ticket(&self) -> Ticket {
        self.ticket
    }

    pub fn position_ms(&self) -> u64 {
        if self.prepared { self.engine.position_ms() } else { 0 }
    }

    pub fn duration_ms(&self) -> u64 {
        if self.prepared { self.engine.duration_ms() } else { 0 }
    }

    /// Stop the engine and invalidate everything in flight for the current load.
    fn halt(&mut self) {
        self.engine.stop();
        self.ticker.stop();
        self.prepared = false;
        self.autostart = false;
        self.ticket = self.ticket.next();
    }

    fn fail(&mut self, error: EngineError) {
        let message = format!("{}: {}", error.code(), error);
        warn!(%message, "playback failed");
        self.halt();
        self.state = EngineState::Errored;
        self.observers.notify(|o| {
            o.on_error(&message);
            o.on_playback_state_changed(false);
            o.on_stopped();
        });
    }

    fn hit_edge(&mut self, edge: QueueEdge) {
        info!(message = edge.message(), "queue edge reached");
        self.halt();
        if self.state != EngineState::Idle {
            self.state = EngineState::Stopped;
        }
        self.observers.notify(|o| {
            o.on_playback_state_changed(false);
            o.on_stopped();
            o.on_edge(edge);
        });
    }

    fn publish_progress(&self) {
        let position = self.engine.position_ms();
        let duration = self.engine.duration_ms();
        self.observers.notify(|o| o.on_progress(position, duration));
    }
}
