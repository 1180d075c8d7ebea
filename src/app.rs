//! Application module: exposes the view model used by the TUI and runtime.
//!
//! The `App` model lives in `app::model`. It mirrors the playback controller
//! through `PlayerEvent`s and keeps the list selection.

mod model;

pub use model::*;
