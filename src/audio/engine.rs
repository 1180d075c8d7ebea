use std::path::Path;

use crate::error::EngineError;

use super::types::Ticket;

/// A single-track audio engine.
///
/// Calls arrive on the controller's thread. `prepare_async` must not block:
/// it reports back with `EngineEvent::Prepared` or `EngineEvent::Failed`
/// tagged with `ticket`, and later `EngineEvent::Completed` when the track
/// runs out. After `reset` or `stop` the engine should stop delivering events
/// for the old ticket.
pub trait AudioEngine {
    /// Drop the current source and any in-flight preparation.
    fn reset(&mut self);

    /// Select the file to play next. Rejects locators that cannot be opened.
    fn set_source(&mut self, locator: &Path) -> Result<(), EngineError>;

    /// Start decoding the selected source in the background.
    fn prepare_async(&mut self, ticket: Ticket) -> Result<(), EngineError>;

    fn start(&mut self);

    fn pause(&mut self);

    fn stop(&mut self);

    /// Out-of-range positions are clamped by the engine.
    fn seek_to(&mut self, position_ms: u64);

    fn position_ms(&self) -> u64;

    /// Zero when unknown.
    fn duration_ms(&self) -> u64;

    fn is_playing(&self) -> bool;
}
