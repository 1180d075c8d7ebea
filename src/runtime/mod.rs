use std::env;
use std::path::Path;
use std::rc::Rc;
use std::sync::mpsc;
use std::time::Duration;

use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{error, info, warn};

use crate::app::App;
use crate::audio::RodioEngine;
use crate::library::scan;
use crate::mpris::{ControlCmd, spawn_mpris};
use crate::player::{ChannelObserver, PlaybackController, PlaybackObserver};

mod event_loop;
mod logging;
mod settings;
mod startup;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let (settings, settings_warning) = settings::load_settings();
    if let Err(e) = logging::init(&settings.logging) {
        eprintln!("lyre: logging disabled: {e}");
    }
    if let Some(msg) = settings_warning {
        warn!("{msg}");
    }

    let dir = env::args().nth(1).unwrap_or_else(|| {
        std::env::current_dir()
            .ok()
            .and_then(|p| p.to_str().map(|s| s.to_string()))
            .unwrap_or_else(|| "Music".to_string())
    });

    let mut app = App::new(Vec::new());
    app.follow_playback = settings.ui.follow_playback;
    app.set_current_dir(dir.clone());

    let tracks = match scan(Path::new(&dir), &settings.library) {
        Ok(tracks) => {
            info!(count = tracks.len(), dir = %dir, "library loaded");
            tracks
        }
        Err(e) => {
            error!(error = %e, "library scan failed");
            app.status_message = Some(e.to_string());
            Vec::new()
        }
    };

    let (engine_tx, engine_rx) = mpsc::channel();
    let engine = RodioEngine::new(engine_tx)?;
    let mut player = PlaybackController::new(
        engine,
        Duration::from_millis(settings.audio.progress_interval_ms),
    );

    let (player_tx, player_rx) = mpsc::channel();
    player.add_observer(Rc::new(ChannelObserver::new(player_tx)));

    let (control_tx, control_rx) = mpsc::channel::<ControlCmd>();
    let mpris: Rc<dyn PlaybackObserver> = Rc::new(spawn_mpris(control_tx.clone()));
    player.add_observer(mpris);

    startup::start_playback(&mut player, &mut app, tracks, &settings.playback);

    let channels = event_loop::Channels {
        engine_rx,
        player_rx,
        control_tx,
        control_rx,
    };

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut state = event_loop::EventLoopState::default();
    let run_result = event_loop::run(
        &mut terminal,
        &settings,
        &mut app,
        &mut player,
        &channels,
        &mut state,
    );

    player.stop();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    run_result
}
