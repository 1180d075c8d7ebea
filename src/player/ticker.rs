use std::time::{Duration, Instant};

/// Fixed-interval progress timer polled from the control loop.
#[derive(Debug)]
pub(super) struct ProgressTicker {
    interval: Duration,
    next_due: Option<Instant>,
}

impl ProgressTicker {
    pub(super) fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
            next_due: None,
        }
    }

    /// Start over from `now`, discarding any pending deadline.
    pub(super) fn restart(&mut self, now: Instant) {
        self.next_due = Some(now + self.interval);
    }

    pub(super) fn stop(&mut self) {
        self.next_due = None;
    }

    #[cfg(test)]
    pub(super) fn is_running(&self) -> bool {
        self.next_due.is_some()
    }

    /// True when a tick is due at `now`; schedules the following one.
    pub(super) fn poll(&mut self, now: Instant) -> bool {
        match self.next_due {
            Some(due) if now >= due => {
                self.next_due = Some(now + self.interval);
                true
            }
            _ => false,
        }
    }
}
