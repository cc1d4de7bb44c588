use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::sets::{self, Choice, LoadError, Question, QuestionSet, SetSource};
use crate::store::KvStore;

/// Composite key addressing one question within one set's saved state.
pub fn selection_key(set_name: &str, seq: usize) -> String {
    format!("{set_name}-{seq}")
}

/// Key prefix covering every question of a set.
pub fn set_prefix(set_name: &str) -> String {
    format!("{set_name}-")
}

/// Ledger record of a missed question, persisted with the original wire field
/// names.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WrongAnswer {
    pub seq: usize,
    pub question: String,
    pub user_answer: Choice,
    pub correct_answer: Choice,
    pub explanation: String,
}

/// Outcome of checking the current selection, shown until the next selection
/// or navigation.
#[derive(Clone, Debug, PartialEq)]
pub struct CheckResult {
    pub correct: bool,
    pub explanation: String,
}

/// Token tying a load request to its completion. Tokens are issued in
/// monotonically increasing order; a completion carrying anything but the
/// latest issued token is stale and gets discarded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct LoadToken(u64);

/// The quiz session: active set, cursor, transient selection/result, and the
/// two persistent stores. All state transitions go through the methods here;
/// the UI only reads.
pub struct Session<S, W>
where
    S: KvStore<Choice>,
    W: KvStore<WrongAnswer>,
{
    selections: S,
    wrong_answers: W,
    set: Option<QuestionSet>,
    index: usize,
    selected: Option<Choice>,
    result: Option<CheckResult>,
    latest_load: u64,
}

impl<S, W> Session<S, W>
where
    S: KvStore<Choice>,
    W: KvStore<WrongAnswer>,
{
    pub fn new(selections: S, wrong_answers: W) -> Self {
        Self {
            selections,
            wrong_answers,
            set: None,
            index: 0,
            selected: None,
            result: None,
            latest_load: 0,
        }
    }

    /// Issues the token for a new load request, superseding any in flight.
    pub fn begin_load(&mut self) -> LoadToken {
        self.latest_load += 1;
        LoadToken(self.latest_load)
    }

    /// Applies a completed load. Returns `Ok(true)` when the set was applied,
    /// `Ok(false)` when the completion was stale and silently discarded, and
    /// the error untouched-state case otherwise.
    pub fn finish_load(
        &mut self,
        token: LoadToken,
        outcome: Result<QuestionSet, LoadError>,
    ) -> Result<bool, LoadError> {
        if token.0 != self.latest_load {
            tracing::debug!(token = token.0, latest = self.latest_load, "discarding stale load");
            return Ok(false);
        }

        let set = outcome?;
        tracing::info!(set = %set.name, questions = set.len(), "question set loaded");

        self.set = Some(set);
        self.index = 0;
        self.result = None;
        self.restore_selection();
        Ok(true)
    }

    /// Blocking load for callers without an event loop: issue a token, fetch,
    /// apply.
    pub fn load(&mut self, source: &dyn SetSource, name: &str) -> Result<(), LoadError> {
        let token = self.begin_load();
        let outcome = sets::load_set(source, name);
        self.finish_load(token, outcome).map(|_| ())
    }

    /// Records the learner's pick for the current question: transient
    /// selection plus immediate write-through to the selection store. No-op
    /// when no set is loaded.
    pub fn select_option(&mut self, choice: Choice) {
        let Some(key) = self.current_key() else {
            return;
        };

        self.selected = Some(choice);
        self.result = None;
        self.selections.set(&key, choice);
    }

    /// Validates the current selection. Returns the result (also kept visible
    /// on the session) or `None` when there is nothing to check. An incorrect
    /// check upserts the ledger entry for this question; a correct one leaves
    /// the ledger alone, so an earlier miss stays on record.
    pub fn check_answer(&mut self) -> Option<CheckResult> {
        let choice = self.selected?;
        let set = self.set.as_ref()?;
        let question = set.answers.get(self.index)?;

        let key = selection_key(&set.name, question.seq);
        let correct = choice == question.answer;
        let result = CheckResult {
            correct,
            explanation: question.explanation.clone(),
        };

        if !correct {
            let entry = WrongAnswer {
                seq: question.seq,
                question: question.question.clone(),
                user_answer: choice,
                correct_answer: question.answer,
                explanation: question.explanation.clone(),
            };
            self.wrong_answers.set(&key, entry);
        }

        self.result = Some(result.clone());
        Some(result)
    }

    pub fn go_to_previous(&mut self) {
        if self.can_go_previous() {
            self.index -= 1;
            self.result = None;
            self.restore_selection();
        }
    }

    pub fn go_to_next(&mut self) {
        if self.can_go_next() {
            self.index += 1;
            self.result = None;
            self.restore_selection();
        }
    }

    pub fn can_go_previous(&self) -> bool {
        self.set.is_some() && self.index > 0
    }

    pub fn can_go_next(&self) -> bool {
        match &self.set {
            Some(set) => self.index + 1 < set.len(),
            None => false,
        }
    }

    /// Clears every saved selection belonging to the active set. The wrong
    /// answer ledger is untouched.
    pub fn reset_current_set(&mut self) {
        let Some(set) = &self.set else {
            return;
        };

        let prefix = set_prefix(&set.name);
        let removed = self.selections.delete_where(&|key| key.starts_with(&prefix));
        tracing::info!(set = %set.name, removed, "selections reset");

        self.selected = None;
        self.result = None;
    }

    pub fn delete_wrong_answer(&mut self, key: &str) -> bool {
        self.wrong_answers.delete(key)
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.set.as_ref()?.answers.get(self.index)
    }

    /// `(current seq, total questions)` for the progress display.
    pub fn progress(&self) -> Option<(usize, usize)> {
        let set = self.set.as_ref()?;
        let question = set.answers.get(self.index)?;
        Some((question.seq, set.len()))
    }

    pub fn active_set_name(&self) -> Option<&str> {
        self.set.as_ref().map(|s| s.name.as_str())
    }

    pub fn selected(&self) -> Option<Choice> {
        self.selected
    }

    pub fn result(&self) -> Option<&CheckResult> {
        self.result.as_ref()
    }

    /// Ledger entries for the active set, ordered by question seq.
    pub fn wrong_answers_for_current_set(&self) -> Vec<(String, WrongAnswer)> {
        let Some(set) = &self.set else {
            return Vec::new();
        };

        let prefix = set_prefix(&set.name);
        self.wrong_answers
            .entries()
            .iter()
            .filter(|(key, _)| key.starts_with(&prefix))
            .map(|(key, entry)| (key.clone(), entry.clone()))
            .sorted_by_key(|(_, entry)| entry.seq)
            .collect()
    }

    /// Pulls the saved selection for the current question into the transient
    /// slot, or clears it when none was saved.
    fn restore_selection(&mut self) {
        self.selected = self
            .current_key()
            .and_then(|key| self.selections.get(&key).copied());
    }

    fn current_key(&self) -> Option<String> {
        let set = self.set.as_ref()?;
        let question = set.answers.get(self.index)?;
        Some(selection_key(&set.name, question.seq))
    }
}
