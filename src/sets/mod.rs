use include_dir::{include_dir, Dir};
use serde::{Deserialize, Serialize};
use thiserror::Error;

static SET_DIR: Dir = include_dir!("src/sets");

/// One of the three answer options every question carries.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display,
)]
pub enum Choice {
    A,
    B,
    C,
}

impl Choice {
    pub const ALL: [Choice; 3] = [Choice::A, Choice::B, Choice::C];

    /// Maps a pressed key to a choice; both the letter and its 1-based digit
    /// are accepted.
    pub fn from_key(c: char) -> Option<Choice> {
        match c {
            'a' | 'A' | '1' => Some(Choice::A),
            'b' | 'B' | '2' => Some(Choice::B),
            'c' | 'C' | '3' => Some(Choice::C),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub seq: usize,
    pub question: String,
    pub answer: Choice,
    pub explanation: String,
}

/// Wire shape of a set file: `{ "answers": [ ... ] }`.
#[derive(Deserialize)]
struct SetFile {
    answers: Vec<Question>,
}

/// A named, ordered collection of questions. `answers[i].seq == i + 1` is
/// guaranteed by [`load_set`]; nothing else constructs one from raw content.
#[derive(Clone, Debug, PartialEq)]
pub struct QuestionSet {
    pub name: String,
    pub answers: Vec<Question>,
}

impl QuestionSet {
    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("question set '{0}' was not found")]
    NotFound(String),

    #[error("could not reach the content source for '{name}': {reason}")]
    Unreachable { name: String, reason: String },

    #[error("content source returned status {status} for '{name}'")]
    Status { name: String, status: u16 },

    #[error("question set '{name}' is malformed: {reason}")]
    Malformed { name: String, reason: String },
}

/// Where set content comes from. Implementations only fetch bytes; parsing and
/// validation live in [`load_set`] so every source is held to the same shape.
pub trait SetSource: Send + Sync {
    fn fetch(&self, name: &str) -> Result<String, LoadError>;
}

/// Question sets compiled into the binary.
#[derive(Clone, Copy, Debug, Default)]
pub struct BundledSource;

impl SetSource for BundledSource {
    fn fetch(&self, name: &str) -> Result<String, LoadError> {
        let file = SET_DIR
            .get_file(format!("{name}.json"))
            .ok_or_else(|| LoadError::NotFound(name.to_string()))?;

        file.contents_utf8()
            .map(str::to_string)
            .ok_or_else(|| LoadError::Malformed {
                name: name.to_string(),
                reason: "file is not valid UTF-8".to_string(),
            })
    }
}

/// Question sets fetched with a blocking `GET {base}/{name}.json`.
#[derive(Clone, Debug)]
pub struct HttpSource {
    base: String,
    client: reqwest::blocking::Client,
}

impl HttpSource {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            client: reqwest::blocking::Client::new(),
        }
    }
}

impl SetSource for HttpSource {
    fn fetch(&self, name: &str) -> Result<String, LoadError> {
        let url = format!("{}/{}.json", self.base.trim_end_matches('/'), name);

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| LoadError::Unreachable {
                name: name.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::Status {
                name: name.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().map_err(|e| LoadError::Unreachable {
            name: name.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Fetches and validates one question set. Never cached; callers re-fetch on
/// every load.
pub fn load_set(source: &dyn SetSource, name: &str) -> Result<QuestionSet, LoadError> {
    let body = source.fetch(name)?;

    let parsed: SetFile = serde_json::from_str(&body).map_err(|e| LoadError::Malformed {
        name: name.to_string(),
        reason: e.to_string(),
    })?;

    validate_sequence(name, &parsed.answers)?;

    Ok(QuestionSet {
        name: name.to_string(),
        answers: parsed.answers,
    })
}

/// Questions must be ordered by seq, ascending, contiguous, starting at 1.
fn validate_sequence(name: &str, answers: &[Question]) -> Result<(), LoadError> {
    if answers.is_empty() {
        return Err(LoadError::Malformed {
            name: name.to_string(),
            reason: "set contains no questions".to_string(),
        });
    }

    for (i, q) in answers.iter().enumerate() {
        if q.seq != i + 1 {
            return Err(LoadError::Malformed {
                name: name.to_string(),
                reason: format!("expected seq {} at position {}, found {}", i + 1, i, q.seq),
            });
        }
    }

    Ok(())
}
