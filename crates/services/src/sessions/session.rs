use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::fmt;

use quiz_core::grading::{TestGrade, grade_test};
use quiz_core::model::{OptionKey, Question, QuestionId, TestResult, TestState};

use crate::error::SessionError;

//
// ─── ANSWER FEEDBACK ───────────────────────────────────────────────────────────
//

/// Outcome of answering the current question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AnswerFeedback {
    pub question_id: QuestionId,
    pub choice: OptionKey,
    pub correct: OptionKey,
    pub is_correct: bool,
}

/// Position within the test, for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TestProgress {
    pub current: usize,
    pub total: usize,
    pub answered: usize,
    pub is_paused: bool,
    pub is_complete: bool,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// An exam in progress.
///
/// Holds the drawn questions, the chosen answers and the timer. Answers can
/// be changed freely until the test is finished. While paused, the timer
/// stands still and navigation is blocked.
#[derive(Clone, PartialEq)]
pub struct TestSession {
    questions: Vec<Question>,
    current: usize,
    answers: BTreeMap<QuestionId, OptionKey>,
    elapsed_secs: u64,
    started_at: DateTime<Utc>,
    is_paused: bool,
    invalid_questions: Vec<QuestionId>,
    completed: bool,
}

impl TestSession {
    /// Start a fresh test.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if no questions are provided.
    pub fn new(questions: Vec<Question>, started_at: DateTime<Utc>) -> Result<Self, SessionError> {
        if questions.is_empty() {
            return Err(SessionError::Empty);
        }
        Ok(Self {
            questions,
            current: 0,
            answers: BTreeMap::new(),
            elapsed_secs: 0,
            started_at,
            is_paused: false,
            invalid_questions: Vec::new(),
            completed: false,
        })
    }

    /// Rebuild a session from a saved snapshot.
    #[must_use]
    pub fn from_state(state: TestState) -> Self {
        let (questions, current, answers, elapsed_secs, started_at, is_paused, invalid, _) =
            state.into_parts();
        Self {
            questions,
            current,
            answers,
            elapsed_secs,
            started_at,
            is_paused,
            invalid_questions: invalid,
            completed: false,
        }
    }

    /// Snapshot for persistence.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::State` if the snapshot fails validation.
    pub fn to_state(&self, updated_at: DateTime<Utc>) -> Result<TestState, SessionError> {
        Ok(TestState::new(
            self.questions.clone(),
            self.current,
            self.answers.clone(),
            self.elapsed_secs,
            self.started_at,
            self.is_paused,
            self.invalid_questions.clone(),
            updated_at,
        )?)
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn question_ids(&self) -> HashSet<QuestionId> {
        self.questions.iter().map(Question::id).collect()
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current)
    }

    #[must_use]
    pub fn answers(&self) -> &BTreeMap<QuestionId, OptionKey> {
        &self.answers
    }

    #[must_use]
    pub fn answer_for(&self, id: QuestionId) -> Option<OptionKey> {
        self.answers.get(&id).copied()
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
    pub fn is_complete(&self) -> bool {
        self.completed
    }

    #[must_use]
    pub fn invalid_questions(&self) -> &[QuestionId] {
        &self.invalid_questions
    }

    #[must_use]
    pub fn is_invalid(&self, id: QuestionId) -> bool {
        self.invalid_questions.contains(&id)
    }

    #[must_use]
    pub fn progress(&self) -> TestProgress {
        TestProgress {
            current: self.current,
            total: self.questions.len(),
            answered: self.answers.len(),
            is_paused: self.is_paused,
            is_complete: self.completed,
        }
    }

    /// Seconds left of a `limit_secs` budget, saturating at zero.
    #[must_use]
    pub fn remaining_secs(&self, limit_secs: u64) -> u64 {
        limit_secs.saturating_sub(self.elapsed_secs)
    }

    fn ensure_open(&self) -> Result<(), SessionError> {
        if self.completed {
            return Err(SessionError::Completed);
        }
        Ok(())
    }

    fn ensure_running(&self) -> Result<(), SessionError> {
        self.ensure_open()?;
        if self.is_paused {
            return Err(SessionError::Paused);
        }
        Ok(())
    }

    /// Record `choice` for the current question, replacing any earlier answer.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Paused` while paused and
    /// `SessionError::Completed` once the test is over.
    pub fn answer_current(&mut self, choice: OptionKey) -> Result<AnswerFeedback, SessionError> {
        self.ensure_running()?;
        let question = self
            .questions
            .get(self.current)
            .ok_or(SessionError::Completed)?;
        let feedback = AnswerFeedback {
            question_id: question.id(),
            choice,
            correct: question.correct(),
            is_correct: question.is_correct_choice(choice),
        };
        self.answers.insert(feedback.question_id, choice);
        Ok(feedback)
    }

    /// Move forward. Moving past the last question completes the test.
    ///
    /// Returns whether the test is now complete.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Paused` while paused and
    /// `SessionError::Completed` once the test is over.
    pub fn next(&mut self) -> Result<bool, SessionError> {
        self.ensure_running()?;
        if self.current + 1 < self.questions.len() {
            self.current += 1;
        } else {
            self.completed = true;
        }
        Ok(self.completed)
    }

    /// Move back one question. Stays put on the first question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Paused` while paused and
    /// `SessionError::Completed` once the test is over.
    pub fn previous(&mut self) -> Result<(), SessionError> {
        self.ensure_running()?;
        self.current = self.current.saturating_sub(1);
        Ok(())
    }

    /// Flip the pause flag and return the new value.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` once the test is over.
    pub fn toggle_pause(&mut self) -> Result<bool, SessionError> {
        self.ensure_open()?;
        self.is_paused = !self.is_paused;
        Ok(self.is_paused)
    }

    /// Add elapsed time. Ignored while paused or after completion.
    pub fn tick(&mut self, secs: u64) {
        if !self.is_paused && !self.completed {
            self.elapsed_secs = self.elapsed_secs.saturating_add(secs);
        }
    }

    /// Swap the current question for `replacement`.
    ///
    /// The old question's answer is dropped and its id is recorded as invalid.
    /// Returns the id that was replaced.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` once the test is over.
    pub fn replace_current(&mut self, replacement: Question) -> Result<QuestionId, SessionError> {
        self.ensure_open()?;
        let slot = self
            .questions
            .get_mut(self.current)
            .ok_or(SessionError::Completed)?;
        let old = std::mem::replace(slot, replacement);
        self.answers.remove(&old.id());
        if !self.invalid_questions.contains(&old.id()) {
            self.invalid_questions.push(old.id());
        }
        Ok(old.id())
    }

    /// Grade the test as it stands.
    #[must_use]
    pub fn grade(&self) -> TestGrade {
        grade_test(&self.questions, &self.answers)
    }

    /// Close the test and build its result.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Result` if `ended_at` precedes the start.
    pub fn finish(
        &mut self,
        ended_at: DateTime<Utc>,
    ) -> Result<(TestGrade, TestResult), SessionError> {
        self.completed = true;
        let grade = self.grade();
        let result = TestResult::from_grade(
            &grade,
            self.started_at,
            ended_at,
            self.invalid_questions.clone(),
            self.answers.clone(),
        )?;
        Ok((grade, result))
    }
}

impl fmt::Debug for TestSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestSession")
            .field("questions_len", &self.questions.len())
            .field("current", &self.current)
            .field("answers_len", &self.answers.len())
            .field("elapsed_secs", &self.elapsed_secs)
            .field("is_paused", &self.is_paused)
            .field("invalid", &self.invalid_questions)
            .field("completed", &self.completed)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
