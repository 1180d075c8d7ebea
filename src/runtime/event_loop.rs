use std::sync::mpsc;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::app::App;
use crate::audio::{AudioEngine, EngineEvent};
use crate::config;
use crate::mpris::ControlCmd;
use crate::player::{EngineState, PlaybackController, PlayerEvent};
use crate::queue::PlayMode;
use crate::ui;

/// Receiving ends of everything that feeds the control thread.
pub struct Channels {
    pub engine_rx: mpsc::Receiver<EngineEvent>,
    pub player_rx: mpsc::Receiver<PlayerEvent>,
    pub control_tx: mpsc::Sender<ControlCmd>,
    pub control_rx: mpsc::Receiver<ControlCmd>,
}

/// Two-key prefix state (`gg`, `zz`).
#[derive(Default)]
pub struct EventLoopState {
    pending_gg: bool,
    pending_zz: bool,
}

/// Main terminal event loop. All controller calls happen here, on one thread.
/// Returns `Ok(())` when shutdown is requested.
pub fn run<E: AudioEngine>(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    settings: &config::Settings,
    app: &mut App,
    player: &mut PlaybackController<E>,
    channels: &Channels,
    state: &mut EventLoopState,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        while let Ok(ev) = channels.engine_rx.try_recv() {
            player.handle_engine_event(ev);
        }
        player.tick(Instant::now());
        sync_app(app, player, &channels.player_rx);

        terminal.draw(|f| ui::draw(f, app, &settings.ui, &settings.controls))?;

        while let Ok(cmd) = channels.control_rx.try_recv() {
            if handle_control_cmd(cmd, player) {
                return Ok(());
            }
        }

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if handle_key_event(key, settings, app, player, &channels.control_tx, state) {
                    return Ok(());
                }
            }
        }
    }
}

/// Fold queued notifications into the view model.
fn sync_app<E: AudioEngine>(
    app: &mut App,
    player: &PlaybackController<E>,
    rx: &mpsc::Receiver<PlayerEvent>,
) {
    for ev in rx.try_iter() {
        let reorder = matches!(ev, PlayerEvent::ModeChanged(_));
        app.apply(ev);
        if reorder {
            app.set_tracks(player.working_order().to_vec());
        }
    }
}

fn handle_control_cmd<E: AudioEngine>(cmd: ControlCmd, player: &mut PlaybackController<E>) -> bool {
    match cmd {
        ControlCmd::Quit => return true,
        ControlCmd::Play => match player.state() {
            EngineState::Playing | EngineState::Preparing => {}
            _ => player.toggle(),
        },
        ControlCmd::Pause => player.pause(),
        ControlCmd::PlayPause => player.toggle(),
        ControlCmd::Stop => player.stop(),
        ControlCmd::Next => player.next(),
        ControlCmd::Prev => player.previous(),
        ControlCmd::SeekBy(delta_ms) => {
            let target = (player.position_ms() as i64).saturating_add(delta_ms).max(0);
            player.seek(target as u64);
        }
        ControlCmd::SeekTo(ms) => player.seek(ms),
    }
    false
}

fn handle_key_event<E: AudioEngine>(
    key: KeyEvent,
    settings: &config::Settings,
    app: &mut App,
    player: &mut PlaybackController<E>,
    control_tx: &mpsc::Sender<ControlCmd>,
    state: &mut EventLoopState,
) -> bool {
    let scrub_ms = settings.controls.scrub_seconds.saturating_mul(1000).min(i64::MAX as u64) as i64;

    // Any key other than the second half of a prefix cancels it.
    let (was_gg, was_zz) = (state.pending_gg, state.pending_zz);
    state.pending_gg = false;
    state.pending_zz = false;

    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Char('s') => {
            let mode = if player.mode() == PlayMode::Shuffled {
                PlayMode::Ordered
            } else {
                PlayMode::Shuffled
            };
            player.set_mode(mode);
        }
        KeyCode::Char('r') => player.set_mode(player.mode().cycle()),
        KeyCode::Char('x') => player.stop(),
        KeyCode::Char('z') => {
            if was_zz {
                app.follow_playback_on();
                app.select_now_playing();
            } else {
                state.pending_zz = true;
            }
        }
        KeyCode::Char('g') => {
            if was_gg {
                app.follow_playback_off();
                app.select_first();
            } else {
                state.pending_gg = true;
            }
        }
        KeyCode::Char('G') => {
            app.follow_playback_off();
            app.select_last();
        }
        KeyCode::Char('j') => {
            app.follow_playback_off();
            app.next();
        }
        KeyCode::Char('k') => {
            app.follow_playback_off();
            app.prev();
        }
        KeyCode::Enter => {
            let already_playing =
                app.playing && app.now_playing_position() == Some(app.selected);
            if app.has_tracks() && !already_playing {
                app.follow_playback_on();
                player.load_at(app.selected);
            }
        }
        KeyCode::Char('p') | KeyCode::Char(' ') => {
            let _ = control_tx.send(ControlCmd::PlayPause);
        }
        KeyCode::Char('l') => {
            let _ = control_tx.send(ControlCmd::Next);
        }
        KeyCode::Char('h') => {
            let _ = control_tx.send(ControlCmd::Prev);
        }
        KeyCode::Char('L') => {
            let _ = control_tx.send(ControlCmd::SeekBy(scrub_ms));
        }
        KeyCode::Char('H') => {
            let _ = control_tx.send(ControlCmd::SeekBy(-scrub_ms));
        }
        KeyCode::Char('K') => app.toggle_metadata_window(),
        _ => {}
    }

    false
}
