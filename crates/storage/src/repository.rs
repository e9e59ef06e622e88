use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quiz_core::model::{
    InvalidMark, ProgressRecord, ProgressSnapshot, Question, QuestionCorrection, QuestionId,
    QuizSettings, ReturnedMark, TestResult, TestResultId, TestResultRow, TestState, UserStats,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

//
// ─── CONTRACTS ─────────────────────────────────────────────────────────────────
//

/// Read access to the question bank, plus bulk import.
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// Insert or replace questions by id. Returns how many were written.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the questions cannot be stored.
    async fn upsert_questions(&self, questions: &[Question]) -> Result<usize, StorageError>;

    /// All questions, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn load_all(&self) -> Result<Vec<Question>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the id is not in the bank.
    async fn get_question(&self, id: QuestionId) -> Result<Question, StorageError>;
}

/// Per-question answer counters.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures or corrupt records.
    async fn get_all(&self) -> Result<ProgressSnapshot, StorageError>;

    /// Count one answer for `id` and stamp `last_seen`.
    ///
    /// The read-modify-write happens atomically, so concurrent answers for
    /// the same question are never lost.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the update cannot be persisted.
    async fn record_answer(
        &self,
        id: QuestionId,
        was_correct: bool,
        at: DateTime<Utc>,
    ) -> Result<ProgressRecord, StorageError>;
}

/// The single in-progress test.
#[async_trait]
pub trait TestStateRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the state cannot be stored.
    async fn save_state(&self, state: &TestState) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if the stored state is unreadable.
    async fn get_state(&self) -> Result<Option<TestState>, StorageError>;

    /// Remove the saved state. Clearing an empty slot is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn clear_state(&self) -> Result<(), StorageError>;
}

/// Finished tests and the lifetime counters derived from them.
#[async_trait]
pub trait TestHistoryRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the result cannot be stored.
    async fn append_result(&self, result: &TestResult) -> Result<TestResultId, StorageError>;

    /// Most recent results first, at most `limit` rows.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures or corrupt rows.
    async fn list_results(&self, limit: u32) -> Result<Vec<TestResultRow>, StorageError>;

    /// Stored counters, or the zeroed default if nothing was recorded yet.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_stats(&self) -> Result<UserStats, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the counters cannot be stored.
    async fn save_stats(&self, stats: &UserStats) -> Result<(), StorageError>;
}

#[async_trait]
pub trait SettingsRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_settings(&self) -> Result<Option<QuizSettings>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the settings cannot be stored.
    async fn save_settings(&self, settings: &QuizSettings) -> Result<(), StorageError>;
}

/// Invalid marks, returned marks and content corrections.
#[async_trait]
pub trait CurationRepository: Send + Sync {
    /// Flag a question. Re-flagging refreshes the timestamp.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn mark_invalid(&self, mark: InvalidMark) -> Result<(), StorageError>;

    /// Drop the flag. Returns whether the question was flagged.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn unmark_invalid(&self, id: QuestionId) -> Result<bool, StorageError>;

    /// Flags ordered by question id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_invalid(&self) -> Result<Vec<InvalidMark>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn record_returned(&self, mark: ReturnedMark) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_returned(&self) -> Result<Vec<ReturnedMark>, StorageError>;

    /// Store or replace the correction for a question.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn save_correction(&self, correction: &QuestionCorrection) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures or corrupt rows.
    async fn list_corrections(&self) -> Result<Vec<QuestionCorrection>, StorageError>;
}

//
// ─── IN-MEMORY BACKEND ─────────────────────────────────────────────────────────
//

/// In-memory repository for tests and throwaway runs.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    questions: Arc<Mutex<BTreeMap<QuestionId, Question>>>,
    progress: Arc<Mutex<HashMap<QuestionId, ProgressRecord>>>,
    state: Arc<Mutex<Option<TestState>>>,
    results: Arc<Mutex<Vec<TestResultRow>>>,
    stats: Arc<Mutex<Option<UserStats>>>,
    settings: Arc<Mutex<Option<QuizSettings>>>,
    invalid: Arc<Mutex<BTreeMap<QuestionId, InvalidMark>>>,
    returned: Arc<Mutex<BTreeMap<QuestionId, ReturnedMark>>>,
    corrections: Arc<Mutex<BTreeMap<QuestionId, QuestionCorrection>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock<T>(m: &Mutex<T>) -> Result<std::sync::MutexGuard<'_, T>, StorageError> {
    m.lock().map_err(|e| StorageError::Connection(e.to_string()))
}

#[async_trait]
impl QuestionRepository for InMemoryRepository {
    async fn upsert_questions(&self, questions: &[Question]) -> Result<usize, StorageError> {
        let mut guard = lock(&self.questions)?;
        for q in questions {
            guard.insert(q.id(), q.clone());
        }
        Ok(questions.len())
    }

    async fn load_all(&self) -> Result<Vec<Question>, StorageError> {
        Ok(lock(&self.questions)?.values().cloned().collect())
    }

    async fn get_question(&self, id: QuestionId) -> Result<Question, StorageError> {
        lock(&self.questions)?
            .get(&id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }
}

#[async_trait]
impl ProgressStore for InMemoryRepository {
    async fn get_all(&self) -> Result<ProgressSnapshot, StorageError> {
        Ok(lock(&self.progress)?
            .iter()
            .map(|(id, record)| (*id, *record))
            .collect())
    }

    async fn record_answer(
        &self,
        id: QuestionId,
        was_correct: bool,
        at: DateTime<Utc>,
    ) -> Result<ProgressRecord, StorageError> {
        let mut guard = lock(&self.progress)?;
        let updated = guard
            .get(&id)
            .copied()
            .unwrap_or_default()
            .record_answer(was_correct, at);
        guard.insert(id, updated);
        Ok(updated)
    }
}

#[async_trait]
impl TestStateRepository for InMemoryRepository {
    async fn save_state(&self, state: &TestState) -> Result<(), StorageError> {
        *lock(&self.state)? = Some(state.clone());
        Ok(())
    }

    async fn get_state(&self) -> Result<Option<TestState>, StorageError> {
        Ok(lock(&self.state)?.clone())
    }

    async fn clear_state(&self) -> Result<(), StorageError> {
        *lock(&self.state)? = None;
        Ok(())
    }
}

#[async_trait]
impl TestHistoryRepository for InMemoryRepository {
    async fn append_result(&self, result: &TestResult) -> Result<TestResultId, StorageError> {
        let mut guard = lock(&self.results)?;
        let next = i64::try_from(guard.len())
            .map_err(|_| StorageError::Serialization("result id overflow".into()))?
            + 1;
        let id = TestResultId::new(next);
        guard.push(TestResultRow::new(id, result.clone()));
        Ok(id)
    }

    async fn list_results(&self, limit: u32) -> Result<Vec<TestResultRow>, StorageError> {
        let guard = lock(&self.results)?;
        let mut rows: Vec<TestResultRow> = guard.clone();
        rows.sort_by(|a, b| {
            b.result
                .ended_at()
                .cmp(&a.result.ended_at())
                .then(b.id.cmp(&a.id))
        });
        rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(rows)
    }

    async fn get_stats(&self) -> Result<UserStats, StorageError> {
        Ok(lock(&self.stats)?.unwrap_or_default())
    }

    async fn save_stats(&self, stats: &UserStats) -> Result<(), StorageError> {
        *lock(&self.stats)? = Some(*stats);
        Ok(())
    }
}

#[async_trait]
impl SettingsRepository for InMemoryRepository {
    async fn get_settings(&self) -> Result<Option<QuizSettings>, StorageError> {
        Ok(*lock(&self.settings)?)
    }

    async fn save_settings(&self, settings: &QuizSettings) -> Result<(), StorageError> {
        *lock(&self.settings)? = Some(*settings);
        Ok(())
    }
}

#[async_trait]
impl CurationRepository for InMemoryRepository {
    async fn mark_invalid(&self, mark: InvalidMark) -> Result<(), StorageError> {
        lock(&self.invalid)?.insert(mark.question_id, mark);
        Ok(())
    }

    async fn unmark_invalid(&self, id: QuestionId) -> Result<bool, StorageError> {
        Ok(lock(&self.invalid)?.remove(&id).is_some())
    }

    async fn list_invalid(&self) -> Result<Vec<InvalidMark>, StorageError> {
        Ok(lock(&self.invalid)?.values().copied().collect())
    }

    async fn record_returned(&self, mark: ReturnedMark) -> Result<(), StorageError> {
        lock(&self.returned)?.insert(mark.question_id, mark);
        Ok(())
    }

    async fn list_returned(&self) -> Result<Vec<ReturnedMark>, StorageError> {
        Ok(lock(&self.returned)?.values().copied().collect())
    }

    async fn save_correction(&self, correction: &QuestionCorrection) -> Result<(), StorageError> {
        lock(&self.corrections)?.insert(correction.question_id(), correction.clone());
        Ok(())
    }

    async fn list_corrections(&self) -> Result<Vec<QuestionCorrection>, StorageError> {
        Ok(lock(&self.corrections)?.values().cloned().collect())
    }
}

//
// ─── AGGREGATE ─────────────────────────────────────────────────────────────────
//

/// All repositories behind trait objects so backends can be swapped.
#[derive(Clone)]
pub struct Storage {
    pub questions: Arc<dyn QuestionRepository>,
    pub progress: Arc<dyn ProgressStore>,
    pub test_state: Arc<dyn TestStateRepository>,
    pub history: Arc<dyn TestHistoryRepository>,
    pub settings: Arc<dyn SettingsRepository>,
    pub curation: Arc<dyn CurationRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_repository(InMemoryRepository::new())
    }

    /// Share one backend across every repository slot.
    pub fn from_repository<R>(repo: R) -> Self
    where
        R: QuestionRepository
            + ProgressStore
            + TestStateRepository
            + TestHistoryRepository
            + SettingsRepository
            + CurationRepository
            + Clone
            + 'static,
    {
        Self {
            questions: Arc::new(repo.clone()),
            progress: Arc::new(repo.clone()),
            test_state: Arc::new(repo.clone()),
            history: Arc::new(repo.clone()),
            settings: Arc::new(repo.clone()),
            curation: Arc::new(repo),
        }
    }
}
