use std::cell::RefCell;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, Instant};

use super::*;
use crate::audio::{AudioEngine, EngineEvent, Ticket};
use crate::error::EngineError;
use crate::library::{Track, TrackId};
use crate::queue::{PlayMode, QueueManager};

const INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Reset,
    SetSource(PathBuf),
    Prepare(Ticket),
    Start,
    Pause,
    Stop,
    SeekTo(u64),
}

#[derive(Default)]
struct EngineLog {
    calls: Vec<Call>,
    reject_sources: bool,
    position_ms: u64,
    duration_ms: u64,
    playing: bool,
}

/// Records every call; never emits events on its own.
struct MockEngine {
    log: Rc<RefCell<EngineLog>>,
}

impl MockEngine {
    fn new() -> (Self, Rc<RefCell<EngineLog>>) {
        let log = Rc::new(RefCell::new(EngineLog {
            duration_ms: 180_000,
            ..EngineLog::default()
        }));
        (Self { log: Rc::clone(&log) }, log)
    }

    fn record(&self, call: Call) {
        self.log.borrow_mut().calls.push(call);
    }
}

impl AudioEngine for MockEngine {
    fn reset(&mut self) {
        self.record(Call::Reset);
        self.log.borrow_mut().playing = false;
    }

    fn set_source(&mut self, locator: &Path) -> Result<(), EngineError> {
        self.record(Call::SetSource(locator.to_path_buf()));
        if self.log.borrow().reject_sources {
            return Err(EngineError::Open {
                path: locator.to_path_buf(),
                source: io::Error::from(io::ErrorKind::NotFound),
            });
        }
        Ok(())
    }

    fn prepare_async(&mut self, ticket: Ticket) -> Result<(), EngineError> {
        self.record(Call::Prepare(ticket));
        Ok(())
    }

    fn start(&mut self) {
        self.record(Call::Start);
        self.log.borrow_mut().playing = true;
    }

    fn pause(&mut self) {
        self.record(Call::Pause);
        self.log.borrow_mut().playing = false;
    }

    fn stop(&mut self) {
        self.record(Call::Stop);
        self.log.borrow_mut().playing = false;
    }

    fn seek_to(&mut self, position_ms: u64) {
        self.record(Call::SeekTo(position_ms));
        let mut log = self.log.borrow_mut();
        log.position_ms = position_ms.min(log.duration_ms);
    }

    fn position_ms(&self) -> u64 {
        self.log.borrow().position_ms
    }

    fn duration_ms(&self) -> u64 {
        self.log.borrow().duration_ms
    }

    fn is_playing(&self) -> bool {
        self.log.borrow().playing
    }
}

fn t(id: u64) -> Track {
    Track {
        id: TrackId(id),
        title: format!("Track {id}"),
        artist: "Artist".into(),
        album: "Album".into(),
        duration_ms: 180_000,
        locator: PathBuf::from(format!("/music/{id}.flac")),
        cover_image: None,
        display: format!("Artist - Track {id}"),
    }
}

fn tracks(n: u64) -> Vec<Track> {
    (1..=n).map(t).collect()
}

struct Harness {
    player: PlaybackController<MockEngine>,
    log: Rc<RefCell<EngineLog>>,
    events: Receiver<PlayerEvent>,
}

impl Harness {
    fn new(mode: PlayMode) -> Self {
        let (engine, log) = MockEngine::new();
        let mut queue = QueueManager::seeded(7);
        queue.set_mode(mode);
        let mut player = PlaybackController::with_queue(engine, queue, INTERVAL);

        let (tx, events) = mpsc::channel();
        let observer: Rc<dyn PlaybackObserver> = Rc::new(ChannelObserver::new(tx));
        assert!(player.add_observer(observer));
        Self { player, log, events }
    }

    /// Queue `n` tracks starting at `start` and let the engine finish preparing.
    fn playing(mode: PlayMode, n: u64, start: u64) -> Self {
        let mut h = Self::new(mode);
        h.player.init_queue(tracks(n), Some(TrackId(start)));
        h.prepare();
        assert_eq!(h.player.state(), EngineState::Playing);
        h.drain();
        h.log.borrow_mut().calls.clear();
        h
    }

    fn prepare(&mut self) {
        let ticket = self.player.ticket();
        self.player
            .handle_engine_event(EngineEvent::Prepared { ticket });
    }

    fn drain(&self) -> Vec<PlayerEvent> {
        self.events.try_iter().collect()
    }

    fn calls(&self) -> Vec<Call> {
        self.log.borrow().calls.clone()
    }

    fn current_id(&self) -> Option<u64> {
        self.player.current_track().map(|t| t.id.0)
    }
}

fn errors(events: &[PlayerEvent]) -> Vec<&str> {
    events
        .iter()
        .filter_map(|e| match e {
            PlayerEvent::Error(message) => Some(message.as_str()),
            _ => None,
        })
        .collect()
}

#[test]
fn init_queue_loads_start_track_and_waits_for_engine() {
    let mut h = Harness::new(PlayMode::Ordered);
    h.player.init_queue(tracks(3), Some(TrackId(2)));

    assert_eq!(h.player.state(), EngineState::Preparing);
    assert!(!h.player.is_prepared());
    assert_eq!(
        h.calls(),
        vec![
            Call::Reset,
            Call::SetSource(PathBuf::from("/music/2.flac")),
            Call::Prepare(h.player.ticket()),
        ]
    );
    assert_eq!(h.drain(), vec![PlayerEvent::TrackChanged(Some(t(2)))]);
}

#[test]
fn play_before_prepared_is_a_no_op() {
    let mut h = Harness::new(PlayMode::Ordered);
    h.player.init_queue(tracks(3), Some(TrackId(1)));
    h.drain();

    h.player.play();
    h.player.seek(10_000);
    assert!(!h.calls().contains(&Call::Start));
    assert!(!h.calls().iter().any(|c| matches!(c, Call::SeekTo(_))));
    assert!(h.drain().is_empty());

    h.prepare();
    assert_eq!(h.calls().last(), Some(&Call::Start));
    assert!(h.player.is_playing());
    assert_eq!(h.drain(), vec![PlayerEvent::StateChanged { is_playing: true }]);
}

#[test]
fn init_queue_without_start_track_loads_nothing() {
    let mut h = Harness::new(PlayMode::Ordered);
    h.player.init_queue(tracks(3), Some(TrackId(42)));

    assert_eq!(h.player.state(), EngineState::Idle);
    assert!(h.calls().is_empty());
    assert_eq!(h.drain(), vec![PlayerEvent::TrackChanged(None)]);
}

#[test]
fn engine_error_mid_playback_stops_and_reports_once() {
    let mut h = Harness::playing(PlayMode::Ordered, 3, 1);
    let ticket = h.player.ticket();

    h.player.handle_engine_event(EngineEvent::Failed {
        ticket,
        error: EngineError::Decode {
            path: PathBuf::from("/music/1.flac"),
            message: "bad frame".into(),
        },
    });

    assert_eq!(h.player.state(), EngineState::Errored);
    assert!(!h.player.is_prepared());
    assert!(!h.player.is_playing());
    let events = h.drain();
    let errors = errors(&events);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("E_DECODE: "));

    h.player.seek(5_000);
    assert!(!h.calls().iter().any(|c| matches!(c, Call::SeekTo(_))));
    assert!(h.drain().is_empty());
}

#[test]
fn rejected_source_becomes_an_error_notification() {
    let mut h = Harness::new(PlayMode::Ordered);
    h.log.borrow_mut().reject_sources = true;
    h.player.init_queue(tracks(2), Some(TrackId(1)));

    assert_eq!(h.player.state(), EngineState::Errored);
    assert!(!h.calls().iter().any(|c| matches!(c, Call::Prepare(_))));
    let events = h.drain();
    let errors = errors(&events);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("E_OPEN: "));
    assert!(errors[0].contains("1.flac"));
}

#[test]
fn stale_prepared_signal_is_ignored() {
    let mut h = Harness::new(PlayMode::Ordered);
    h.player.init_queue(tracks(3), Some(TrackId(1)));
    let first = h.player.ticket();

    h.player.next();
    let second = h.player.ticket();
    assert_ne!(first, second);

    h.player
        .handle_engine_event(EngineEvent::Prepared { ticket: first });
    assert_eq!(h.player.state(), EngineState::Preparing);
    assert!(!h.calls().contains(&Call::Start));

    h.player
        .handle_engine_event(EngineEvent::Prepared { ticket: second });
    assert!(h.player.is_playing());
    assert_eq!(h.current_id(), Some(2));
}

#[test]
fn stale_completion_after_stop_does_not_advance() {
    let mut h = Harness::playing(PlayMode::Ordered, 3, 1);
    let ticket = h.player.ticket();

    h.player.stop();
    assert_eq!(h.player.state(), EngineState::Stopped);
    h.player
        .handle_engine_event(EngineEvent::Completed { ticket });

    assert_eq!(h.current_id(), Some(1));
    assert_eq!(h.player.state(), EngineState::Stopped);
}

#[test]
fn completion_advances_to_next_track() {
    let mut h = Harness::playing(PlayMode::Ordered, 3, 1);
    let ticket = h.player.ticket();

    h.player
        .handle_engine_event(EngineEvent::Completed { ticket });

    assert_eq!(h.current_id(), Some(2));
    assert_eq!(h.player.state(), EngineState::Preparing);
    let events = h.drain();
    assert!(events.contains(&PlayerEvent::TrackChanged(Some(t(2)))));
    assert!(errors(&events).is_empty());

    h.prepare();
    assert!(h.player.is_playing());
}

#[test]
fn completion_of_last_track_stops_with_edge_hint() {
    let mut h = Harness::playing(PlayMode::Ordered, 2, 2);
    let ticket = h.player.ticket();

    h.player
        .handle_engine_event(EngineEvent::Completed { ticket });

    assert_eq!(h.player.state(), EngineState::Stopped);
    assert_eq!(h.current_id(), Some(2));
    assert!(h.calls().contains(&Call::Stop));
    let events = h.drain();
    assert!(events.contains(&PlayerEvent::Edge(QueueEdge::End)));
    assert!(events.contains(&PlayerEvent::StateChanged { is_playing: false }));
    assert!(errors(&events).is_empty());
}

#[test]
fn looping_previous_from_first_track_wraps_to_last() {
    let mut h = Harness::playing(PlayMode::Looping, 4, 1);
    h.player.previous();

    assert_eq!(h.current_id(), Some(4));
    assert_eq!(h.player.state(), EngineState::Preparing);
    assert!(h.calls().contains(&Call::SetSource(PathBuf::from("/music/4.flac"))));
}

#[test]
fn ordered_previous_from_first_track_restarts_it() {
    let mut h = Harness::playing(PlayMode::Ordered, 3, 1);
    h.player.previous();

    assert_eq!(h.current_id(), Some(1));
    assert_eq!(h.player.state(), EngineState::Preparing);
    assert!(!h.drain().iter().any(|e| matches!(e, PlayerEvent::Edge(_))));
}

#[test]
fn next_and_previous_on_empty_queue_report_edges() {
    let mut h = Harness::new(PlayMode::Shuffled);
    h.player.init_queue(Vec::new(), None);
    h.drain();

    h.player.next();
    h.player.previous();
    let events = h.drain();
    assert!(events.contains(&PlayerEvent::Edge(QueueEdge::End)));
    assert!(events.contains(&PlayerEvent::Edge(QueueEdge::Start)));
    assert_eq!(h.player.state(), EngineState::Idle);
}

#[test]
fn toggle_with_nothing_loaded_starts_first_track() {
    let mut h = Harness::new(PlayMode::Ordered);
    h.player.init_queue(tracks(3), None);
    h.player.toggle();

    assert_eq!(h.current_id(), Some(1));
    assert_eq!(h.player.state(), EngineState::Preparing);
    h.prepare();
    assert!(h.player.is_playing());
}

#[test]
fn toggle_on_empty_queue_does_nothing() {
    let mut h = Harness::new(PlayMode::Ordered);
    h.player.init_queue(Vec::new(), None);
    h.drain();

    h.player.toggle();
    assert!(h.calls().is_empty());
    assert!(h.drain().is_empty());
    assert_eq!(h.player.state(), EngineState::Idle);
}

#[test]
fn toggle_pauses_and_resumes() {
    let mut h = Harness::playing(PlayMode::Ordered, 2, 1);

    h.player.toggle();
    assert_eq!(h.player.state(), EngineState::Paused);
    h.player.toggle();
    assert_eq!(h.player.state(), EngineState::Playing);
    assert_eq!(h.calls(), vec![Call::Pause, Call::Start]);
    assert_eq!(
        h.drain(),
        vec![
            PlayerEvent::StateChanged { is_playing: false },
            PlayerEvent::StateChanged { is_playing: true },
        ]
    );
}

#[test]
fn toggle_after_error_reloads_current_track() {
    let mut h = Harness::playing(PlayMode::Ordered, 3, 2);
    let ticket = h.player.ticket();
    h.player.handle_engine_event(EngineEvent::Failed {
        ticket,
        error: EngineError::Output("device lost".into()),
    });
    assert_eq!(h.player.state(), EngineState::Errored);

    h.player.toggle();
    assert_eq!(h.player.state(), EngineState::Preparing);
    assert!(h.calls().contains(&Call::SetSource(PathBuf::from("/music/2.flac"))));
}

#[test]
fn pause_while_preparing_holds_the_track_ready() {
    let mut h = Harness::new(PlayMode::Ordered);
    h.player.init_queue(tracks(2), Some(TrackId(1)));
    h.player.pause();
    h.prepare();

    assert_eq!(h.player.state(), EngineState::Ready);
    assert!(h.player.is_prepared());
    assert!(!h.calls().contains(&Call::Start));

    h.player.toggle();
    assert!(h.player.is_playing());
}

#[test]
fn progress_ticks_only_while_playing() {
    let mut h = Harness::playing(PlayMode::Ordered, 2, 1);
    h.log.borrow_mut().position_ms = 1_234;

    let later = Instant::now() + INTERVAL * 2;
    h.player.tick(later);
    assert_eq!(
        h.drain(),
        vec![PlayerEvent::Progress {
            position_ms: 1_234,
            duration_ms: 180_000,
        }]
    );

    h.player.pause();
    h.drain();
    h.player.tick(later + INTERVAL * 4);
    assert!(h.drain().is_empty());
}

#[test]
fn seek_forwards_to_engine_and_reports_position() {
    let mut h = Harness::playing(PlayMode::Ordered, 2, 1);
    h.player.seek(999_999);

    assert_eq!(h.calls(), vec![Call::SeekTo(999_999)]);
    assert_eq!(
        h.drain(),
        vec![PlayerEvent::Progress {
            position_ms: 180_000,
            duration_ms: 180_000,
        }]
    );
}

#[test]
fn set_mode_reannounces_track_mode_and_state() {
    let mut h = Harness::playing(PlayMode::Ordered, 5, 3);
    h.player.set_mode(PlayMode::Shuffled);

    assert_eq!(h.player.mode(), PlayMode::Shuffled);
    assert_eq!(h.current_id(), Some(3));
    assert!(h.player.is_playing());
    assert!(h.calls().is_empty());

    let events = h.drain();
    assert!(events.contains(&PlayerEvent::ModeChanged(PlayMode::Shuffled)));
    assert!(events.contains(&PlayerEvent::TrackChanged(Some(t(3)))));
    assert!(events.contains(&PlayerEvent::StateChanged { is_playing: true }));

    // Unchanged mode still re-announces.
    h.player.set_mode(PlayMode::Shuffled);
    assert_eq!(h.drain().len(), 3);
}

#[test]
fn observer_registration_is_idempotent() {
    let (engine, _log) = MockEngine::new();
    let mut player = PlaybackController::new(engine, INTERVAL);
    let (tx, rx) = mpsc::channel();
    let observer: Rc<dyn PlaybackObserver> = Rc::new(ChannelObserver::new(tx));

    assert!(player.add_observer(Rc::clone(&observer)));
    assert!(!player.add_observer(Rc::clone(&observer)));

    player.set_mode(PlayMode::Looping);
    assert_eq!(rx.try_iter().count(), 3);

    assert!(player.remove_observer(&observer));
    assert!(!player.remove_observer(&observer));
    player.set_mode(PlayMode::Ordered);
    assert_eq!(rx.try_iter().count(), 0);
}

#[test]
fn distinct_observers_all_receive_notifications() {
    let mut h = Harness::new(PlayMode::Ordered);
    let (tx, second) = mpsc::channel();
    h.player
        .add_observer(Rc::new(ChannelObserver::new(tx)));

    h.player.stop();
    assert_eq!(h.drain(), vec![PlayerEvent::StateChanged { is_playing: false }]);
    assert_eq!(
        second.try_iter().collect::<Vec<_>>(),
        vec![PlayerEvent::StateChanged { is_playing: false }]
    );
}

#[test]
fn edge_messages_are_user_facing() {
    assert_eq!(QueueEdge::End.message(), "no more tracks");
    assert_eq!(QueueEdge::Start.message(), "already at first track");
}

/// Names the state-related notifications in the order they arrive.
#[derive(Default)]
struct StateLog(RefCell<Vec<&'static str>>);

impl StateLog {
    fn take(&self) -> Vec<&'static str> {
        std::mem::take(&mut *self.0.borrow_mut())
    }
}

impl PlaybackObserver for StateLog {
    fn on_playback_state_changed(&self, is_playing: bool) {
        self.0
            .borrow_mut()
            .push(if is_playing { "playing" } else { "not playing" });
    }

    fn on_stopped(&self) {
        self.0.borrow_mut().push("stopped");
    }

    fn on_error(&self, _message: &str) {
        self.0.borrow_mut().push("error");
    }

    fn on_edge(&self, _edge: QueueEdge) {
        self.0.borrow_mut().push("edge");
    }
}

fn with_state_log(h: &mut Harness) -> Rc<StateLog> {
    let log = Rc::new(StateLog::default());
    let observer: Rc<dyn PlaybackObserver> = log.clone();
    h.player.add_observer(observer);
    log
}

#[test]
fn stops_are_announced_separately_from_pauses() {
    let mut h = Harness::playing(PlayMode::Ordered, 2, 1);
    let log = with_state_log(&mut h);

    h.player.pause();
    assert_eq!(log.take(), vec!["not playing"]);

    h.player.stop();
    assert_eq!(log.take(), vec!["not playing", "stopped"]);
}

#[test]
fn edge_and_error_stops_announce_stopped() {
    let mut h = Harness::playing(PlayMode::Ordered, 1, 1);
    let log = with_state_log(&mut h);

    h.player.next();
    assert_eq!(log.take(), vec!["not playing", "stopped", "edge"]);

    h.player.toggle();
    h.prepare();
    log.take();
    let ticket = h.player.ticket();
    h.player.handle_engine_event(EngineEvent::Failed {
        ticket,
        error: EngineError::SourceLost,
    });
    assert_eq!(log.take(), vec!["error", "not playing", "stopped"]);
    assert!(errors(&h.drain()).contains(&"E_SOURCE_LOST: decoded source lost before playback started"));
}
