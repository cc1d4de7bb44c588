use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent};

use crate::session::LoadToken;
use crate::sets::{self, LoadError, QuestionSet, SetSource};

/// Unified event type consumed by the app runner
#[derive(Debug)]
pub enum QuizEvent {
    Key(KeyEvent),
    Resize,
    Tick,
    /// A set load finished on its worker thread. The token decides whether
    /// the outcome is still current or a superseded request resolving late.
    SetLoaded {
        token: LoadToken,
        name: String,
        outcome: Result<QuestionSet, LoadError>,
    },
}

/// Source of events (keyboard, resize, load completions)
pub trait EventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    fn recv_timeout(&self, timeout: Duration) -> Result<QuizEvent, RecvTimeoutError>;
}

/// Production event source: a crossterm reader thread feeding a channel that
/// load worker threads also send into.
pub struct CrosstermEventSource {
    tx: Sender<QuizEvent>,
    rx: Receiver<QuizEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        let input_tx = tx.clone();
        std::thread::spawn(move || loop {
            match event::read() {
                Ok(CtEvent::Key(key)) => {
                    if input_tx.send(QuizEvent::Key(key)).is_err() {
                        break;
                    }
                }
                Ok(CtEvent::Resize(_, _)) => {
                    if input_tx.send(QuizEvent::Resize).is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(_) => break,
            }
        });

        Self { tx, rx }
    }

    /// Handle for feeding load completions back into the loop.
    pub fn sender(&self) -> Sender<QuizEvent> {
        self.tx.clone()
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<QuizEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Test event source for headless tests
pub struct TestEventSource {
    rx: Receiver<QuizEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<QuizEvent>) -> Self {
        Self { rx }
    }
}

impl EventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<QuizEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Fetches a set on a worker thread and reports back as a [`QuizEvent`].
/// The receiver may be gone by completion time; that send failure is fine.
pub fn spawn_load(
    tx: Sender<QuizEvent>,
    source: Arc<dyn SetSource>,
    name: String,
    token: LoadToken,
) {
    std::thread::spawn(move || {
        let outcome = sets::load_set(source.as_ref(), &name);
        let _ = tx.send(QuizEvent::SetLoaded {
            token,
            name,
            outcome,
        });
    });
}

/// Runner that advances the application one event at a time
pub struct Runner<E: EventSource> {
    event_source: E,
    tick: Duration,
}

impl<E: EventSource> Runner<E> {
    pub fn new(event_source: E, tick: Duration) -> Self {
        Self { event_source, tick }
    }

    /// Blocks up to the tick interval and returns the next event, or Tick on
    /// timeout
    pub fn step(&self) -> QuizEvent {
        match self.event_source.recv_timeout(self.tick) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => QuizEvent::Tick,
        }
    }
}
