//! Small types exchanged between an engine and the playback controller.

use std::sync::mpsc::Sender;

use crate::error::EngineError;

/// Generation number of a load request.
///
/// Every load takes a fresh ticket; engine events carry the ticket of the load
/// they belong to, so events from a superseded load can be recognised and dropped.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct Ticket(u64);

impl Ticket {
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

/// Asynchronous signals from the engine.
#[derive(Debug)]
pub enum EngineEvent {
    /// The source handed to `prepare_async` is ready to start or seek.
    Prepared { ticket: Ticket },
    /// Playback reached the end of the track.
    Completed { ticket: Ticket },
    /// Opening, decoding or output failed.
    Failed { ticket: Ticket, error: EngineError },
}

impl EngineEvent {
    pub fn ticket(&self) -> Ticket {
        match self {
            EngineEvent::Prepared { ticket }
            | EngineEvent::Completed { ticket }
            | EngineEvent::Failed { ticket, .. } => *ticket,
        }
    }
}

pub type EngineEvents = Sender<EngineEvent>;
