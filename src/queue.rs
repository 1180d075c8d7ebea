//! The play queue: original and working track order, the cursor, and the
//! traversal rules for each `PlayMode`.
//!
//! Nothing in here touches the audio engine. The playback controller asks the
//! queue where to go and then drives the engine itself.

mod model;
mod shuffle;

pub use model::*;
