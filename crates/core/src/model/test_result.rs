use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::grading::TestGrade;
use crate::model::{OptionKey, QuestionId, TestResultId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TestResultError {
    #[error("ended_at is before started_at")]
    InvalidTimeRange,

    #[error("correct answers ({correct}) exceed total questions ({total})")]
    CorrectExceedsTotal { correct: u32, total: u32 },

    #[error("score must be between 0 and 100, got {0}")]
    InvalidScore(u8),
}

/// A finished test as stored in the history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestResult {
    started_at: DateTime<Utc>,
    ended_at: DateTime<Utc>,
    score: u8,
    correct: u32,
    total: u32,
    duration_minutes: u32,
    replaced_question_ids: Vec<QuestionId>,
    answers: BTreeMap<QuestionId, OptionKey>,
}

impl TestResult {
    /// Rehydrate a result from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `TestResultError` if the timestamps, counts or score are inconsistent.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
        score: u8,
        correct: u32,
        total: u32,
        duration_minutes: u32,
        replaced_question_ids: Vec<QuestionId>,
        answers: BTreeMap<QuestionId, OptionKey>,
    ) -> Result<Self, TestResultError> {
        if ended_at < started_at {
            return Err(TestResultError::InvalidTimeRange);
        }
        if correct > total {
            return Err(TestResultError::CorrectExceedsTotal { correct, total });
        }
        if score > 100 {
            return Err(TestResultError::InvalidScore(score));
        }
        Ok(Self {
            started_at,
            ended_at,
            score,
            correct,
            total,
            duration_minutes,
            replaced_question_ids,
            answers,
        })
    }

    /// Build a result from a graded test.
    ///
    /// Duration is the wall-clock span rounded to whole minutes.
    ///
    /// # Errors
    ///
    /// Returns `TestResultError::InvalidTimeRange` if `ended_at` is before `started_at`.
    pub fn from_grade(
        grade: &TestGrade,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
        replaced_question_ids: Vec<QuestionId>,
        answers: BTreeMap<QuestionId, OptionKey>,
    ) -> Result<Self, TestResultError> {
        let seconds = ended_at.signed_duration_since(started_at).num_seconds();
        let minutes = (seconds.max(0) + 30) / 60;
        let duration_minutes = u32::try_from(minutes).unwrap_or(u32::MAX);
        Self::from_persisted(
            started_at,
            ended_at,
            grade.score,
            grade.correct,
            grade.total,
            duration_minutes,
            replaced_question_ids,
            answers,
        )
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn ended_at(&self) -> DateTime<Utc> {
        self.ended_at
    }

    #[must_use]
    pub fn score(&self) -> u8 {
        self.score
    }

    #[must_use]
    pub fn correct(&self) -> u32 {
        self.correct
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    #[must_use]
    pub fn duration_minutes(&self) -> u32 {
        self.duration_minutes
    }

    #[must_use]
    pub fn replaced_question_ids(&self) -> &[QuestionId] {
        &self.replaced_question_ids
    }

    #[must_use]
    pub fn answers(&self) -> &BTreeMap<QuestionId, OptionKey> {
        &self.answers
    }
}

/// A persisted result with its storage id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestResultRow {
    pub id: TestResultId,
    #[serde(flatten)]
    pub result: TestResult,
}

impl TestResultRow {
    #[must_use]
    pub fn new(id: TestResultId, result: TestResult) -> Self {
        Self { id, result }
    }
}

/// Lifetime counters across all finished tests.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct UserStats {
    total_tests: u32,
    average_score: f64,
    last_test: Option<DateTime<Utc>>,
    total_questions_seen: u32,
}

impl UserStats {
    #[must_use]
    pub fn from_persisted(
        total_tests: u32,
        average_score: f64,
        last_test: Option<DateTime<Utc>>,
        total_questions_seen: u32,
    ) -> Self {
        Self {
            total_tests,
            average_score: if average_score.is_finite() {
                average_score.clamp(0.0, 100.0)
            } else {
                0.0
            },
            last_test,
            total_questions_seen,
        }
    }

    /// Fold one more finished test into the running average.
    ///
    /// The average is kept to two decimals.
    #[must_use]
    pub fn with_result(self, score: u8, at: DateTime<Utc>) -> Self {
        let total_tests = self.total_tests.saturating_add(1);
        let previous = f64::from(total_tests - 1);
        let average = (self.average_score * previous + f64::from(score)) / f64::from(total_tests);
        Self {
            total_tests,
            average_score: (average * 100.0).round() / 100.0,
            last_test: Some(at),
            total_questions_seen: self.total_questions_seen,
        }
    }

    #[must_use]
    pub fn with_questions_seen(mut self, seen: u32) -> Self {
        self.total_questions_seen = seen;
        self
    }

    #[must_use]
    pub fn total_tests(&self) -> u32 {
        self.total_tests
    }

    #[must_use]
    pub fn average_score(&self) -> f64 {
        self.average_score
    }

    #[must_use]
    pub fn last_test(&self) -> Option<DateTime<Utc>> {
        self.last_test
    }

    #[must_use]
    pub fn total_questions_seen(&self) -> u32 {
        self.total_questions_seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;
    use chrono::Duration;

    fn grade(correct: u32, total: u32, score: u8) -> TestGrade {
        TestGrade {
            correct,
            total,
            score,
            details: Vec::new(),
        }
    }

    #[test]
    fn result_rejects_reversed_times() {
        let now = fixed_now();
        let err = TestResult::from_grade(
            &grade(1, 2, 50),
            now,
            now - Duration::minutes(1),
            Vec::new(),
            BTreeMap::new(),
        )
        .unwrap_err();
        assert_eq!(err, TestResultError::InvalidTimeRange);
    }

    #[test]
    fn result_rejects_too_many_correct() {
        let now = fixed_now();
        let err = TestResult::from_persisted(now, now, 10, 3, 2, 0, Vec::new(), BTreeMap::new())
            .unwrap_err();
        assert_eq!(err, TestResultError::CorrectExceedsTotal { correct: 3, total: 2 });
    }

    #[test]
    fn duration_rounds_to_minutes() {
        let now = fixed_now();
        let result = TestResult::from_grade(
            &grade(1, 2, 50),
            now,
            now + Duration::seconds(150),
            Vec::new(),
            BTreeMap::new(),
        )
        .unwrap();
        assert_eq!(result.duration_minutes(), 3);
    }

    #[test]
    fn running_average_tracks_scores() {
        let now = fixed_now();
        let stats = UserStats::default()
            .with_result(80, now)
            .with_result(60, now)
            .with_result(75, now);
        assert_eq!(stats.total_tests(), 3);
        assert!((stats.average_score() - 71.67).abs() < 1e-9);
        assert_eq!(stats.last_test(), Some(now));
    }
}
