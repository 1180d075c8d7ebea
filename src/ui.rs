//! UI rendering helpers for the terminal user interface.
//!
//! This module contains functions to render the TUI using `ratatui`.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, Padding, Paragraph, Wrap},
};
use std::{collections::BTreeMap, sync::LazyLock};

use crate::app::App;
use crate::config::{ControlsSettings, TrackDisplayField, UiSettings};
use crate::library::Track;

static CONTROLS_MAP: LazyLock<BTreeMap<&'static str, &'static str>> = LazyLock::new(|| {
    BTreeMap::from([
        ("j/k", "up/down"),
        ("gg/G", "top/bottom"),
        ("enter", "play selected song"),
        ("space/p", "play/pause"),
        ("h/l", "prev/next song"),
        ("x", "stop"),
        ("zz", "jump to playing"),
        ("s", "shuffle"),
        ("r", "cycle mode"),
        ("K", "metadata"),
        ("q", "quit"),
    ])
});

/// Render the controls help text, incorporating scrub seconds.
fn controls_text(scrub_seconds: u64) -> String {
    let order = [
        "j/k", "h/l", "H/L", "enter", "space/p", "x", "gg/G", "zz", "K", "s", "r", "q",
    ];
    order
        .iter()
        .filter_map(|k| {
            if *k == "H/L" {
                Some(format!("[H/L] scrub -/+{}s", scrub_seconds))
            } else {
                CONTROLS_MAP.get(*k).map(|v| format!("[{}] {}", k, v))
            }
        })
        .collect::<Vec<String>>()
        .join(" | ")
}

/// Format milliseconds as `MM:SS`.
fn format_mmss(ms: u64) -> String {
    let secs = ms / 1000;
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Build the "now playing" text according to `ui` settings.
fn now_playing_text(track: &Track, ui: &UiSettings) -> String {
    let parts: Vec<String> = ui
        .now_playing_fields
        .iter()
        .filter_map(|f| match f {
            TrackDisplayField::Title => Some(track.title.clone()),
            TrackDisplayField::Artist => Some(track.artist.clone()),
            TrackDisplayField::Album => Some(track.album.clone()),
            TrackDisplayField::Filename => track
                .locator
                .file_stem()
                .and_then(|s| s.to_str())
                .map(str::to_string),
            TrackDisplayField::Path => Some(track.locator.display().to_string()),
        })
        .filter(|s| !s.trim().is_empty())
        .collect();

    if parts.is_empty() {
        track.display.clone()
    } else {
        parts.join(&ui.now_playing_separator)
    }
}

/// Compute a centered rectangle with given size constrained to `r`.
fn centered_rect_sized(mut width: u16, mut height: u16, r: Rect) -> Rect {
    width = width.min(r.width.saturating_sub(2)).max(10);
    height = height.min(r.height.saturating_sub(2)).max(5);

    let x = r.x + (r.width.saturating_sub(width) / 2);
    let y = r.y + (r.height.saturating_sub(height) / 2);
    Rect {
        x,
        y,
        width,
        height,
    }
}

fn status_text(app: &App, ui: &UiSettings) -> String {
    let mut parts: Vec<String> = Vec::new();

    if app.follow_playback {
        parts.push("CURSOR: Follow".to_string());
    } else {
        parts.push("CURSOR: Free-roam".to_string());
    }
    parts.push(format!("MODE: {}", app.mode.label()));

    match &app.now_playing {
        Some(track) => {
            parts.push(format!("Song: {}", now_playing_text(track, ui)));
            parts.push(if app.playing { "Playing" } else { "Paused" }.to_string());
        }
        None => parts.push("Stopped".to_string()),
    }

    if let Some(msg) = &app.status_message {
        parts.push(format!("! {}", msg));
    }
    if let Some(dir) = &app.current_dir {
        parts.push(format!("Dir: {}", dir));
    }

    parts.join(" • ")
}

/// Render the entire UI into the provided `frame` using `app` state and settings.
pub fn draw(
    frame: &mut Frame,
    app: &App,
    ui_settings: &UiSettings,
    controls_settings: &ControlsSettings,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(4),
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(4),
        ])
        .split(frame.area());

    let header = Paragraph::new(ui_settings.header_text.as_str())
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" lyre ")
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(header, chunks[0]);

    let status_par = Paragraph::new(status_text(app, ui_settings))
        .block(
            Block::bordered()
                .padding(Padding {
                    left: 1,
                    right: 0,
                    top: 0,
                    bottom: 0,
                })
                .title(" status "),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(status_par, chunks[1]);

    let ratio = if app.duration_ms == 0 {
        0.0
    } else {
        (app.position_ms as f64 / app.duration_ms as f64).clamp(0.0, 1.0)
    };
    let gauge = Gauge::default()
        .ratio(ratio)
        .label(format!(
            "{} / {}",
            format_mmss(app.position_ms),
            format_mmss(app.duration_ms)
        ))
        .gauge_style(Style::default().add_modifier(Modifier::BOLD));
    frame.render_widget(gauge, chunks[2]);

    // Main list
    {
        // Center the selected item when possible; only build items for the visible window.
        let total = app.tracks.len();
        let list_height = chunks[3].height.saturating_sub(2) as usize;
        let sel_pos = app.selected.min(total.saturating_sub(1));
        let (start, end, selected_pos_in_visible) = if total <= list_height || list_height == 0 {
            (0, total, sel_pos)
        } else {
            let half = list_height / 2;
            let mut start = sel_pos.saturating_sub(half);
            if start + list_height > total {
                start = total - list_height;
            }
            (start, start + list_height, sel_pos - start)
        };

        let playing_pos = app.now_playing_position();
        let visible_items: Vec<ListItem> = app.tracks[start..end]
            .iter()
            .enumerate()
            .map(|(i, track)| {
                if playing_pos == Some(start + i) {
                    ListItem::new(format!("♪ {}", track.display))
                        .style(Style::default().add_modifier(Modifier::BOLD))
                } else {
                    ListItem::new(track.display.as_str())
                }
            })
            .collect();

        let list = List::new(visible_items)
            .block(Block::default().borders(Borders::ALL).title(" tracks "))
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");
        let mut state = ratatui::widgets::ListState::default();
        if total > 0 {
            state.select(Some(selected_pos_in_visible));
        }
        frame.render_stateful_widget(list, chunks[3], &mut state);
    }

    // Metadata popup, kept inside the list area.
    if app.metadata_window {
        let popup_area = centered_rect_sized(72, 9, chunks[3]);
        frame.render_widget(Clear, popup_area);

        let meta = match app.tracks.get(app.selected) {
            Some(track) => format!(
                "Title: {}\nArtist: {}\nAlbum: {}\nDuration: {}\nPath: {}{}",
                track.title,
                track.artist,
                track.album,
                format_mmss(track.duration_ms),
                track.locator.display(),
                if track.cover_image.is_some() { "\nCover art: embedded" } else { "" },
            ),
            None => "No track selected".to_string(),
        };
        let meta_paragraph = Paragraph::new(meta)
            .block(
                Block::default()
                    .padding(Padding {
                        left: 1,
                        right: 0,
                        top: 0,
                        bottom: 0,
                    })
                    .borders(Borders::ALL)
                    .title(" metadata (K closes) "),
            )
            .wrap(Wrap { trim: true });
        frame.render_widget(meta_paragraph, popup_area);
    }

    let footer = Paragraph::new(controls_text(controls_settings.scrub_seconds))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" controls ")
                .padding(Padding {
                    left: 1,
                    right: 0,
                    top: 0,
                    bottom: 0,
                }),
        )
        .wrap(Wrap { trim: true });

    frame.render_widget(footer, chunks[4]);
}
