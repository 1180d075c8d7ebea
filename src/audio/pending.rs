use std::sync::Mutex;

use super::types::Ticket;

#[derive(Debug)]
struct SlotState<T> {
    /// The only load whose result may be parked.
    armed: Option<Ticket>,
    entry: Option<(Ticket, T)>,
}

/// Hands a decoded source from a worker thread to the control thread.
///
/// Holds at most one entry. Acceptance is decided under the slot's lock, so a
/// worker from a superseded load can never overwrite the current one.
#[derive(Debug)]
pub(super) struct PendingSlot<T> {
    state: Mutex<SlotState<T>>,
}

impl<T> Default for PendingSlot<T> {
    fn default() -> Self {
        Self {
            state: Mutex::new(SlotState {
                armed: None,
                entry: None,
            }),
        }
    }
}

impl<T> PendingSlot<T> {
    /// Accept results for `ticket` only. Anything already parked is dropped.
    pub(super) fn arm(&self, ticket: Ticket) {
        if let Ok(mut s) = self.state.lock() {
            s.armed = Some(ticket);
            s.entry = None;
        }
    }

    /// Refuse all results and drop anything parked.
    pub(super) fn disarm(&self) {
        if let Ok(mut s) = self.state.lock() {
            s.armed = None;
            s.entry = None;
        }
    }

    pub(super) fn is_armed_for(&self, ticket: Ticket) -> bool {
        self.state.lock().is_ok_and(|s| s.armed == Some(ticket))
    }

    /// Park `value` if `ticket` is still armed. Returns `false` when superseded.
    pub(super) fn fill(&self, ticket: Ticket, value: T) -> bool {
        let Ok(mut s) = self.state.lock() else {
            return false;
        };
        if s.armed != Some(ticket) {
            return false;
        }
        s.entry = Some((ticket, value));
        true
    }

    /// Take the parked value if it belongs to `ticket`.
    pub(super) fn take(&self, ticket: Ticket) -> Option<T> {
        let mut s = self.state.lock().ok()?;
        match s.entry.take() {
            Some((parked, value)) if parked == ticket => Some(value),
            other => {
                s.entry = other;
                None
            }
        }
    }
}
