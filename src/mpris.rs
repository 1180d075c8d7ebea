//! MPRIS bridge: lets desktop media keys and `playerctl` reach the player.
//!
//! Method calls arrive on the bus thread and are forwarded to the control
//! thread as [`ControlCmd`]s. State flows the other way: [`MprisHandle`] is a
//! [`PlaybackObserver`] that mirrors notifications into shared state read by
//! the D-Bus properties.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, mpsc::Sender};

use async_io::{Timer, block_on};
use tracing::{debug, info, warn};
use zbus::object_server::SignalEmitter;
use zbus::{Connection, interface};
use zvariant::{ObjectPath, OwnedObjectPath, OwnedValue, Value};

use crate::library::Track;
use crate::player::{PlaybackObserver, QueueEdge};
use crate::queue::PlayMode;

const OBJECT_PATH: &str = "/org/mpris/MediaPlayer2";
const BUS_NAME: &str = "org.mpris.MediaPlayer2.lyre";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ControlCmd {
    Quit,
    Play,
    Pause,
    PlayPause,
    Stop,
    Next,
    Prev,
    /// Relative seek in milliseconds.
    SeekBy(i64),
    /// Absolute seek in milliseconds.
    SeekTo(u64),
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
enum Status {
    #[default]
    Stopped,
    Playing,
    Paused,
}

#[derive(Debug, Default)]
struct SharedState {
    status: Status,
    mode: PlayMode,
    position_micros: i64,
    track_id: Option<String>,
    title: Option<String>,
    artist: Vec<String>,
    album: Option<String>,
    url: Option<String>,
    length_micros: Option<i64>,
}

impl SharedState {
    fn set_track(&mut self, track: Option<&Track>) {
        self.position_micros = 0;
        match track {
            Some(t) => {
                self.track_id = Some(format!("{OBJECT_PATH}/track/{}", t.id));
                self.title = Some(t.title.clone());
                self.artist = vec![t.artist.clone()];
                self.album = Some(t.album.clone());
                self.url = Some(format!("file://{}", t.locator.display()));
                self.length_micros = (t.duration_ms > 0).then(|| t.duration_ms as i64 * 1000);
            }
            None => {
                self.track_id = None;
                self.title = None;
                self.artist.clear();
                self.album = None;
                self.url = None;
                self.length_micros = None;
                self.status = Status::Stopped;
            }
        }
    }
}

/// Control-thread side of the bridge.
pub struct MprisHandle {
    state: Arc<Mutex<SharedState>>,
}

impl MprisHandle {
    fn update(&self, f: impl FnOnce(&mut SharedState)) {
        if let Ok(mut s) = self.state.lock() {
            f(&mut s);
        }
    }
}

impl PlaybackObserver for MprisHandle {
    fn on_playback_state_changed(&self, is_playing: bool) {
        self.update(|s| {
            s.status = match (is_playing, s.track_id.is_some(), s.status) {
                (true, _, _) => Status::Playing,
                // Re-announcements of a stopped player must not turn it into a paused one.
                (false, true, Status::Stopped) => Status::Stopped,
                (false, true, _) => Status::Paused,
                (false, false, _) => Status::Stopped,
            };
        });
    }

    fn on_stopped(&self) {
        self.update(|s| s.status = Status::Stopped);
    }

    fn on_error(&self, _message: &str) {
        self.update(|s| s.status = Status::Stopped);
    }

    fn on_edge(&self, _edge: QueueEdge) {
        self.update(|s| s.status = Status::Stopped);
    }

    fn on_progress(&self, position_ms: u64, _duration_ms: u64) {
        self.update(|s| s.position_micros = position_ms as i64 * 1000);
    }

    fn on_track_changed(&self, track: Option<&Track>) {
        self.update(|s| s.set_track(track));
    }

    fn on_mode_changed(&self, mode: PlayMode) {
        self.update(|s| s.mode = mode);
    }
}

fn owned(value: Value<'_>) -> Option<OwnedValue> {
    OwnedValue::try_from(value).ok()
}

struct RootIface {
    tx: Sender<ControlCmd>,
}

#[interface(name = "org.mpris.MediaPlayer2")]
impl RootIface {
    fn raise(&self) {
        // No-op for TUI.
    }

    fn quit(&self) {
        let _ = self.tx.send(ControlCmd::Quit);
    }

    #[zbus(property)]
    fn can_quit(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_raise(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn has_track_list(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn identity(&self) -> &str {
        "lyre"
    }

    #[zbus(property)]
    fn supported_uri_schemes(&self) -> Vec<String> {
        vec!["file".to_string()]
    }

    #[zbus(property)]
    fn supported_mime_types(&self) -> Vec<String> {
        vec![]
    }
}

struct PlayerIface {
    tx: Sender<ControlCmd>,
    state: Arc<Mutex<SharedState>>,
}

impl PlayerIface {
    /// Move the mirrored position to `target(current)`, clamped to the track.
    /// `None` when no track is loaded.
    fn move_position(&self, target: impl FnOnce(i64) -> i64) -> Option<i64> {
        let mut s = self.state.lock().ok()?;
        if s.track_id.is_none() {
            return None;
        }
        let mut position = target(s.position_micros).max(0);
        if let Some(len) = s.length_micros {
            position = position.min(len);
        }
        s.position_micros = position;
        Some(position)
    }

    /// Forward a relative seek; returns where it should land, in microseconds.
    fn request_seek(&self, offset: i64) -> Option<i64> {
        let _ = self.tx.send(ControlCmd::SeekBy(offset / 1000));
        self.move_position(|current| current.saturating_add(offset))
    }

    /// Forward an absolute seek unless `track_id` is not the current track
    /// or `position` is outside it.
    fn request_position(&self, track_id: &str, position: i64) -> Option<i64> {
        {
            let s = self.state.lock().ok()?;
            if s.track_id.as_deref() != Some(track_id) {
                debug!(track_id, "SetPosition ignored: stale track id");
                return None;
            }
            if position < 0 || s.length_micros.is_some_and(|len| position > len) {
                return None;
            }
        }
        let _ = self.tx.send(ControlCmd::SeekTo((position / 1000) as u64));
        self.move_position(|_| position)
    }

    async fn announce_seek(emitter: &SignalEmitter<'_>, position: Option<i64>) {
        if let Some(position) = position {
            if let Err(e) = Self::seeked(emitter, position).await {
                warn!(error = %e, "MPRIS: failed to emit Seeked");
            }
        }
    }
}

#[interface(name = "org.mpris.MediaPlayer2.Player")]
impl PlayerIface {
    fn next(&self) {
        let _ = self.tx.send(ControlCmd::Next);
    }

    fn previous(&self) {
        let _ = self.tx.send(ControlCmd::Prev);
    }

    fn play(&self) {
        let _ = self.tx.send(ControlCmd::Play);
    }

    fn pause(&self) {
        let _ = self.tx.send(ControlCmd::Pause);
    }

    fn play_pause(&self) {
        let _ = self.tx.send(ControlCmd::PlayPause);
    }

    fn stop(&self) {
        let _ = self.tx.send(ControlCmd::Stop);
    }

    /// `offset` is in microseconds.
    async fn seek(&self, offset: i64, #[zbus(signal_emitter)] emitter: SignalEmitter<'_>) {
        let landed = self.request_seek(offset);
        Self::announce_seek(&emitter, landed).await;
    }

    async fn set_position(
        &self,
        track_id: OwnedObjectPath,
        position: i64,
        #[zbus(signal_emitter)] emitter: SignalEmitter<'_>,
    ) {
        let landed = self.request_position(track_id.as_str(), position);
        Self::announce_seek(&emitter, landed).await;
    }

    #[zbus(signal)]
    async fn seeked(emitter: &SignalEmitter<'_>, position: i64) -> zbus::Result<()>;

    #[zbus(property)]
    fn playback_status(&self) -> &str {
        let Ok(s) = self.state.lock() else {
            return "Stopped";
        };
        match s.status {
            Status::Stopped => "Stopped",
            Status::Playing => "Playing",
            Status::Paused => "Paused",
        }
    }

    #[zbus(property)]
    fn loop_status(&self) -> &str {
        match self.state.lock().map(|s| s.mode) {
            Ok(PlayMode::Looping) => "Playlist",
            _ => "None",
        }
    }

    #[zbus(property)]
    fn shuffle(&self) -> bool {
        self.state
            .lock()
            .is_ok_and(|s| s.mode == PlayMode::Shuffled)
    }

    #[zbus(property)]
    fn position(&self) -> i64 {
        self.state.lock().map_or(0, |s| s.position_micros)
    }

    #[zbus(property)]
    fn can_control(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_play(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_pause(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_seek(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_go_next(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_go_previous(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn metadata(&self) -> HashMap<String, OwnedValue> {
        let mut map = HashMap::new();
        let Ok(s) = self.state.lock() else {
            return map;
        };

        let mut put = |key: &str, value: Option<OwnedValue>| {
            if let Some(v) = value {
                map.insert(key.to_string(), v);
            }
        };

        put(
            "mpris:trackid",
            s.track_id
                .as_deref()
                .and_then(|p| ObjectPath::try_from(p).ok())
                .and_then(|p| owned(Value::from(p))),
        );
        put(
            "xesam:title",
            owned(Value::from(s.title.clone().unwrap_or_default())),
        );
        if !s.artist.is_empty() {
            put("xesam:artist", owned(Value::from(s.artist.clone())));
        }
        if let Some(album) = &s.album {
            put("xesam:album", owned(Value::from(album.clone())));
        }
        if let Some(url) = &s.url {
            put("xesam:url", owned(Value::from(url.clone())));
        }
        if let Some(len) = s.length_micros {
            put("mpris:length", owned(Value::from(len)));
        }
        map
    }
}

/// Serve MPRIS on the session bus from a background thread.
///
/// Bus failures are logged and leave the player running without MPRIS.
pub fn spawn_mpris(tx: Sender<ControlCmd>) -> MprisHandle {
    let state = Arc::new(Mutex::new(SharedState::default()));

    let state_for_thread = state.clone();
    std::thread::spawn(move || {
        block_on(async move {
            let connection = match Connection::session().await {
                Ok(c) => c,
                Err(e) => {
                    warn!(error = %e, "MPRIS: failed to connect to session bus");
                    return;
                }
            };

            if let Err(e) = connection.request_name(BUS_NAME).await {
                warn!(error = %e, "MPRIS: failed to acquire name");
                return;
            }

            let object_server = connection.object_server();

            if let Err(e) = object_server
                .at(OBJECT_PATH, RootIface { tx: tx.clone() })
                .await
            {
                warn!(error = %e, "MPRIS: failed to register root iface");
                return;
            }

            if let Err(e) = object_server
                .at(
                    OBJECT_PATH,
                    PlayerIface {
                        tx,
                        state: state_for_thread,
                    },
                )
                .await
            {
                warn!(error = %e, "MPRIS: failed to register player iface");
                return;
            }
            info!(name = BUS_NAME, "MPRIS service registered");

            // Keep the service alive.
            loop {
                Timer::after(std::time::Duration::from_secs(3600)).await;
            }
        });
    });

    MprisHandle { state }
}
