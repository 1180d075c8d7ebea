//! `rodio`-backed implementation of [`AudioEngine`].
//!
//! Decoding happens on a short-lived worker thread; the decoded source is
//! parked in a [`PendingSlot`] keyed by ticket until the controller's thread
//! installs it into a paused `Sink`.
//! A watcher thread blocks on `Sink::sleep_until_end` to report completion.

use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink, Source};
use tracing::{debug, warn};

use crate::error::EngineError;

use super::engine::AudioEngine;
use super::pending::PendingSlot;
use super::types::{EngineEvent, EngineEvents, Ticket};

type FileDecoder = Decoder<BufReader<File>>;

struct Prepared {
    decoder: FileDecoder,
    duration: Option<Duration>,
}

pub struct RodioEngine {
    stream: OutputStream,
    events: EngineEvents,
    source: Option<PathBuf>,
    ticket: Option<Ticket>,
    pending: Arc<PendingSlot<Prepared>>,
    /// Shared with the watcher thread of the current sink.
    cancelled: Arc<AtomicBool>,
    sink: Option<Arc<Sink>>,
    duration: Option<Duration>,
}

fn decode(path: &Path) -> Result<FileDecoder, EngineError> {
    let file = File::open(path).map_err(|source| EngineError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    Decoder::new(BufReader::new(file)).map_err(|e| EngineError::Decode {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

impl RodioEngine {
    /// Open the default output device. Engine signals are sent on `events`.
    pub fn new(events: EngineEvents) -> Result<Self, EngineError> {
        let mut stream = OutputStreamBuilder::open_default_stream()
            .map_err(|e| EngineError::Output(e.to_string()))?;
        // rodio logs to stderr when the stream is dropped, which garbles the TUI.
        stream.log_on_drop(false);

        Ok(Self {
            stream,
            events,
            source: None,
            ticket: None,
            pending: Arc::new(PendingSlot::default()),
            cancelled: Arc::new(AtomicBool::new(false)),
            sink: None,
            duration: None,
        })
    }

    /// Silence every thread spawned for the current load.
    fn cancel_current(&mut self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.cancelled = Arc::new(AtomicBool::new(false));
        self.pending.disarm();
    }

    /// Install the decoded source for the current ticket into a paused sink.
    ///
    /// A prepared load whose source has gone missing is reported as failed.
    fn ensure_sink(&mut self) -> Option<Arc<Sink>> {
        if let Some(sink) = &self.sink {
            return Some(Arc::clone(sink));
        }
        let ticket = self.ticket?;
        let Some(prepared) = self.pending.take(ticket) else {
            warn!(?ticket, "no decoded source for the current load");
            let _ = self.events.send(EngineEvent::Failed {
                ticket,
                error: EngineError::SourceLost,
            });
            return None;
        };

        let sink = Arc::new(Sink::connect_new(self.stream.mixer()));
        sink.pause();
        sink.append(prepared.decoder);
        self.duration = prepared.duration;
        self.watch_completion(Arc::clone(&sink), ticket);
        self.sink = Some(Arc::clone(&sink));
        Some(sink)
    }

    fn watch_completion(&self, sink: Arc<Sink>, ticket: Ticket) {
        let cancelled = Arc::clone(&self.cancelled);
        let events = self.events.clone();
        thread::spawn(move || {
            sink.sleep_until_end();
            if !cancelled.load(Ordering::SeqCst) {
                let _ = events.send(EngineEvent::Completed { ticket });
            }
        });
    }
}

impl AudioEngine for RodioEngine {
    fn reset(&mut self) {
        self.cancel_current();
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
        self.source = None;
        self.ticket = None;
        self.duration = None;
    }

    fn set_source(&mut self, locator: &Path) -> Result<(), EngineError> {
        let meta = fs::metadata(locator).map_err(|source| EngineError::Open {
            path: locator.to_path_buf(),
            source,
        })?;
        if !meta.is_file() {
            return Err(EngineError::Open {
                path: locator.to_path_buf(),
                source: io::Error::new(io::ErrorKind::InvalidInput, "not a regular file"),
            });
        }
        self.source = Some(locator.to_path_buf());
        Ok(())
    }

    fn prepare_async(&mut self, ticket: Ticket) -> Result<(), EngineError> {
        let path = self.source.clone().ok_or(EngineError::NoSource)?;
        self.ticket = Some(ticket);
        self.pending.arm(ticket);

        let pending = Arc::clone(&self.pending);
        let events = self.events.clone();
        thread::spawn(move || {
            let event = match decode(&path) {
                Ok(decoder) => {
                    let duration = decoder.total_duration();
                    if !pending.fill(ticket, Prepared { decoder, duration }) {
                        debug!(?ticket, "decoded source superseded");
                        return;
                    }
                    EngineEvent::Prepared { ticket }
                }
                Err(_) if !pending.is_armed_for(ticket) => return,
                Err(error) => EngineEvent::Failed { ticket, error },
            };
            let _ = events.send(event);
        });
        Ok(())
    }

    fn start(&mut self) {
        if let Some(sink) = self.ensure_sink() {
            sink.play();
        }
    }

    fn pause(&mut self) {
        if let Some(sink) = &self.sink {
            sink.pause();
        }
    }

    fn stop(&mut self) {
        self.cancel_current();
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
        self.ticket = None;
    }

    fn seek_to(&mut self, position_ms: u64) {
        let mut target = Duration::from_millis(position_ms);
        if let Some(total) = self.duration {
            target = target.min(total);
        }
        if let Some(sink) = self.ensure_sink() {
            if let Err(e) = sink.try_seek(target) {
                warn!(error = %e, ?target, "seek failed");
            }
        }
    }

    fn position_ms(&self) -> u64 {
        self.sink
            .as_ref()
            .map_or(0, |s| s.get_pos().as_millis() as u64)
    }

    fn duration_ms(&self) -> u64 {
        self.duration.map_or(0, |d| d.as_millis() as u64)
    }

    fn is_playing(&self) -> bool {
        self.sink
            .as_ref()
            .is_some_and(|s| !s.is_paused() && !s.empty())
    }
}

impl Drop for RodioEngine {
    fn drop(&mut self) {
        self.stop();
    }
}
