use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;

use crate::model::ids::QuestionId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("correct count ({correct}) exceeds appearances ({appearances})")]
    CorrectExceedsAppearances { appearances: u32, correct: u32 },
}

/// How often a question has been shown and answered correctly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ProgressRecord {
    appearances: u32,
    correct_count: u32,
    last_seen: Option<DateTime<Utc>>,
}

impl ProgressRecord {
    /// Rehydrate a record from storage.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::CorrectExceedsAppearances` if the counters are
    /// inconsistent.
    pub fn from_persisted(
        appearances: u32,
        correct_count: u32,
        last_seen: Option<DateTime<Utc>>,
    ) -> Result<Self, ProgressError> {
        if correct_count > appearances {
            return Err(ProgressError::CorrectExceedsAppearances {
                appearances,
                correct: correct_count,
            });
        }
        Ok(Self {
            appearances,
            correct_count,
            last_seen,
        })
    }

    #[must_use]
    pub fn appearances(&self) -> u32 {
        self.appearances
    }

    #[must_use]
    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    #[must_use]
    pub fn last_seen(&self) -> Option<DateTime<Utc>> {
        self.last_seen
    }

    /// Share of correct answers, `None` when never shown.
    #[must_use]
    pub fn accuracy(&self) -> Option<f64> {
        if self.appearances == 0 {
            None
        } else {
            Some(f64::from(self.correct_count) / f64::from(self.appearances))
        }
    }

    /// Returns the record after one more answer.
    ///
    /// Only progress stores call this; selection never mutates progress.
    #[must_use]
    pub fn record_answer(self, was_correct: bool, at: DateTime<Utc>) -> Self {
        let appearances = self.appearances.saturating_add(1);
        let correct_count = if was_correct {
            self.correct_count.saturating_add(1).min(appearances)
        } else {
            self.correct_count
        };
        Self {
            appearances,
            correct_count,
            last_seen: Some(at),
        }
    }
}

/// Point-in-time copy of all progress records, keyed by question.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct ProgressSnapshot {
    records: HashMap<QuestionId, ProgressRecord>,
}

impl ProgressSnapshot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, id: QuestionId) -> Option<&ProgressRecord> {
        self.records.get(&id)
    }

    pub fn insert(&mut self, id: QuestionId, record: ProgressRecord) {
        self.records.insert(id, record);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&QuestionId, &ProgressRecord)> {
        self.records.iter()
    }

    /// Number of questions that were shown at least once.
    #[must_use]
    pub fn questions_seen(&self) -> usize {
        self.records.values().filter(|r| r.appearances > 0).count()
    }
}

impl FromIterator<(QuestionId, ProgressRecord)> for ProgressSnapshot {
    fn from_iter<T: IntoIterator<Item = (QuestionId, ProgressRecord)>>(iter: T) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn rejects_more_correct_than_appearances() {
        let err = ProgressRecord::from_persisted(2, 3, None).unwrap_err();
        assert_eq!(
            err,
            ProgressError::CorrectExceedsAppearances {
                appearances: 2,
                correct: 3
            }
        );
    }

    #[test]
    fn record_answer_increments_counters() {
        let now = fixed_now();
        let record = ProgressRecord::default()
            .record_answer(true, now)
            .record_answer(false, now);
        assert_eq!(record.appearances(), 2);
        assert_eq!(record.correct_count(), 1);
        assert_eq!(record.last_seen(), Some(now));
        assert_eq!(record.accuracy(), Some(0.5));
    }

    #[test]
    fn unseen_record_has_no_accuracy() {
        assert_eq!(ProgressRecord::default().accuracy(), None);
    }

    #[test]
    fn snapshot_counts_seen_questions() {
        let now = fixed_now();
        let snapshot: ProgressSnapshot = [
            (QuestionId::new(1), ProgressRecord::default().record_answer(true, now)),
            (QuestionId::new(2), ProgressRecord::default()),
        ]
        .into_iter()
        .collect();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.questions_seen(), 1);
    }
}
