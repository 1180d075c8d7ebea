//! Audio engine boundary.
//!
//! The playback controller drives a single-track engine through the
//! [`AudioEngine`] trait. Engines report readiness, completion and failure as
//! [`EngineEvent`] values over a channel so the controller can handle them on
//! its own thread.

mod engine;
mod pending;
mod sink;
mod types;

pub use engine::AudioEngine;
pub use sink::RodioEngine;
pub use types::*;
