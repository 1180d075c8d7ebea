use crate::app::App;
use crate::audio::AudioEngine;
use crate::config::PlaybackSettings;
use crate::library::Track;
use crate::player::PlaybackController;

/// Apply the configured mode, hand the catalog to the controller and, with
/// `autoplay`, start from the top of the working order.
pub fn start_playback<E: AudioEngine>(
    player: &mut PlaybackController<E>,
    app: &mut App,
    tracks: Vec<Track>,
    settings: &PlaybackSettings,
) {
    player.set_mode(settings.mode.into());
    player.init_queue(tracks, None);
    app.set_tracks(player.working_order().to_vec());

    if settings.autoplay {
        player.load_at(0);
    }
}
