use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::model::{OptionKey, Question, QuestionId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TestStateError {
    #[error("test state requires at least one question")]
    NoQuestions,

    #[error("current index {index} is out of range for {len} questions")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Snapshot of an unfinished test, persisted so it can be resumed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTestState")]
pub struct TestState {
    questions: Vec<Question>,
    current_index: usize,
    answers: BTreeMap<QuestionId, OptionKey>,
    elapsed_secs: u64,
    started_at: DateTime<Utc>,
    is_paused: bool,
    invalid_questions: Vec<QuestionId>,
    updated_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct RawTestState {
    questions: Vec<Question>,
    #[serde(default)]
    current_index: usize,
    #[serde(default)]
    answers: BTreeMap<QuestionId, OptionKey>,
    #[serde(default)]
    elapsed_secs: u64,
    started_at: DateTime<Utc>,
    #[serde(default)]
    is_paused: bool,
    #[serde(default)]
    invalid_questions: Vec<QuestionId>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<RawTestState> for TestState {
    type Error = TestStateError;

    fn try_from(raw: RawTestState) -> Result<Self, Self::Error> {
        TestState::new(
            raw.questions,
            raw.current_index,
            raw.answers,
            raw.elapsed_secs,
            raw.started_at,
            raw.is_paused,
            raw.invalid_questions,
            raw.updated_at,
        )
    }
}

impl TestState {
    /// Build a snapshot.
    ///
    /// # Errors
    ///
    /// Returns `TestStateError::NoQuestions` for an empty test and
    /// `TestStateError::IndexOutOfRange` if `current_index` is past the end.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        questions: Vec<Question>,
        current_index: usize,
        answers: BTreeMap<QuestionId, OptionKey>,
        elapsed_secs: u64,
        started_at: DateTime<Utc>,
        is_paused: bool,
        invalid_questions: Vec<QuestionId>,
        updated_at: DateTime<Utc>,
    ) -> Result<Self, TestStateError> {
        if questions.is_empty() {
            return Err(TestStateError::NoQuestions);
        }
        if current_index >= questions.len() {
            return Err(TestStateError::IndexOutOfRange {
                index: current_index,
                len: questions.len(),
            });
        }
        Ok(Self {
            questions,
            current_index,
            answers,
            elapsed_secs,
            started_at,
            is_paused,
            invalid_questions,
            updated_at,
        })
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    #[must_use]
    pub fn answers(&self) -> &BTreeMap<QuestionId, OptionKey> {
        &self.answers
    }

    #[must_use]
    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.is_paused
    }

    #[must_use]
    pub fn invalid_questions(&self) -> &[QuestionId] {
        &self.invalid_questions
    }

    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Decompose into owned parts, in constructor order.
    #[must_use]
    #[allow(clippy::type_complexity)]
    pub fn into_parts(
        self,
    ) -> (
        Vec<Question>,
        usize,
        BTreeMap<QuestionId, OptionKey>,
        u64,
        DateTime<Utc>,
        bool,
        Vec<QuestionId>,
        DateTime<Utc>,
    ) {
        (
            self.questions,
            self.current_index,
            self.answers,
            self.elapsed_secs,
            self.started_at,
            self.is_paused,
            self.invalid_questions,
            self.updated_at,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Category;
    use crate::time::fixed_now;

    fn question(id: u64) -> Question {
        Question::new(
            QuestionId::new(id),
            "Q",
            vec![(OptionKey::A, "x".into()), (OptionKey::B, "y".into())],
            OptionKey::A,
            Category::Other,
        )
        .unwrap()
    }

    #[test]
    fn empty_state_is_rejected() {
        let now = fixed_now();
        let err = TestState::new(Vec::new(), 0, BTreeMap::new(), 0, now, false, Vec::new(), now)
            .unwrap_err();
        assert_eq!(err, TestStateError::NoQuestions);
    }

    #[test]
    fn index_must_be_in_range() {
        let now = fixed_now();
        let err = TestState::new(
            vec![question(1)],
            1,
            BTreeMap::new(),
            0,
            now,
            false,
            Vec::new(),
            now,
        )
        .unwrap_err();
        assert_eq!(err, TestStateError::IndexOutOfRange { index: 1, len: 1 });
    }

    #[test]
    fn json_round_trip_keeps_answers() {
        let now = fixed_now();
        let state = TestState::new(
            vec![question(1), question(2)],
            1,
            BTreeMap::from([(QuestionId::new(1), OptionKey::B)]),
            42,
            now,
            true,
            vec![QuestionId::new(9)],
            now,
        )
        .unwrap();
        let json = serde_json::to_string(&state).unwrap();
        let back: TestState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn json_without_questions_fails() {
        let json = r#"{
            "questions": [],
            "started_at": "2023-11-14T22:13:20Z",
            "updated_at": "2023-11-14T22:13:20Z"
        }"#;
        assert!(serde_json::from_str::<TestState>(json).is_err());
    }
}
