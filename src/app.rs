use std::sync::mpsc::Sender;
use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::catalog;
use crate::runtime::{self, QuizEvent};
use crate::session::{LoadToken, Session, WrongAnswer};
use crate::sets::{Choice, LoadError, QuestionSet, SetSource};
use crate::store::KvStore;

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
pub enum Screen {
    Quiz,
    Review,
}

/// UI-facing application state: the session plus everything the renderer
/// needs that is not the session's business (active screen, review cursor,
/// in-flight load, pending notice).
pub struct App<S, W>
where
    S: KvStore<Choice>,
    W: KvStore<WrongAnswer>,
{
    pub session: Session<S, W>,
    pub screen: Screen,
    pub review_index: usize,
    /// Name of the set a worker thread is currently fetching.
    pub pending_set: Option<String>,
    /// Blocking notification from a failed load; dismissed by any key.
    pub notice: Option<String>,
    source: Arc<dyn SetSource>,
    tx: Sender<QuizEvent>,
}

impl<S, W> App<S, W>
where
    S: KvStore<Choice>,
    W: KvStore<WrongAnswer>,
{
    pub fn new(session: Session<S, W>, source: Arc<dyn SetSource>, tx: Sender<QuizEvent>) -> Self {
        Self {
            session,
            screen: Screen::Quiz,
            review_index: 0,
            pending_set: None,
            notice: None,
            source,
            tx,
        }
    }

    /// Kicks off a load on a worker thread. A newer request supersedes any
    /// still in flight; the session's token bookkeeping discards the loser.
    pub fn request_set(&mut self, name: &str) {
        self.notice = None;
        self.pending_set = Some(name.to_string());
        let token = self.session.begin_load();
        runtime::spawn_load(
            self.tx.clone(),
            Arc::clone(&self.source),
            name.to_string(),
            token,
        );
    }

    /// Applies a load completion delivered through the event loop.
    pub fn on_set_loaded(&mut self, token: LoadToken, outcome: Result<QuestionSet, LoadError>) {
        match self.session.finish_load(token, outcome) {
            Ok(true) => {
                self.pending_set = None;
                self.notice = None;
            }
            // Stale completion; the newer request is still pending.
            Ok(false) => {}
            Err(e) => {
                tracing::warn!(error = %e, "set load failed");
                self.pending_set = None;
                self.notice = Some(e.to_string());
            }
        }
    }

    /// Handles one key event. Returns true when the app should quit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return true;
        }

        // A load-failure notice blocks until acknowledged; the dismissing
        // key does nothing else.
        if self.notice.take().is_some() {
            return false;
        }

        match self.screen {
            Screen::Quiz => self.handle_quiz_key(key),
            Screen::Review => {
                self.handle_review_key(key);
                false
            }
        }
    }

    fn handle_quiz_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Esc => return true,
            KeyCode::Enter => {
                self.session.check_answer();
            }
            KeyCode::Left => self.session.go_to_previous(),
            KeyCode::Right => self.session.go_to_next(),
            KeyCode::Tab => self.cycle_set(1),
            KeyCode::BackTab => self.cycle_set(-1),
            KeyCode::Char('r') => self.session.reset_current_set(),
            KeyCode::Char('w') => {
                self.screen = Screen::Review;
                self.review_index = 0;
            }
            KeyCode::Char(c) => {
                if let Some(choice) = Choice::from_key(c) {
                    self.session.select_option(choice);
                }
            }
            _ => {}
        }
        false
    }

    fn handle_review_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Char('b') | KeyCode::Char('w') => {
                self.screen = Screen::Quiz;
            }
            KeyCode::Up => {
                self.review_index = self.review_index.saturating_sub(1);
            }
            KeyCode::Down => {
                let len = self.session.wrong_answers_for_current_set().len();
                if self.review_index + 1 < len {
                    self.review_index += 1;
                }
            }
            KeyCode::Char('d') => {
                let entries = self.session.wrong_answers_for_current_set();
                if let Some((entry_key, _)) = entries.get(self.review_index) {
                    self.session.delete_wrong_answer(entry_key);
                    let remaining = entries.len() - 1;
                    self.review_index = self.review_index.min(remaining.saturating_sub(1));
                }
            }
            _ => {}
        }
    }

    /// Moves to the next/previous catalog entry relative to the set the UI
    /// currently shows as active or loading.
    fn cycle_set(&mut self, step: isize) {
        let names = catalog::names();
        let current = self
            .pending_set
            .as_deref()
            .or_else(|| self.session.active_set_name());

        let target = match current.and_then(catalog::index_of) {
            Some(i) => {
                let len = names.len() as isize;
                let next = (i as isize + step).rem_euclid(len) as usize;
                names[next]
            }
            None => catalog::first(),
        };

        self.request_set(target);
    }
}
