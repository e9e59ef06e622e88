//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::{
    QuestionError, QuestionId, SettingsError, TestResultError, TestStateError,
};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `QuizService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizServiceError {
    #[error("no questions available to draw from")]
    NoQuestions,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by the test session and its service.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no questions available for a test")]
    Empty,
    #[error("test already completed")]
    Completed,
    #[error("test is paused")]
    Paused,
    #[error("no replacement available for question {0}")]
    NoReplacement(QuestionId),
    #[error("no saved test to resume")]
    NoSavedTest,
    #[error(transparent)]
    State(#[from] TestStateError),
    #[error(transparent)]
    Result(#[from] TestResultError),
    #[error(transparent)]
    Quiz(#[from] QuizServiceError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `CurationService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CurationError {
    #[error("question {0} is not in the bank")]
    UnknownQuestion(QuestionId),
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Quiz(#[from] QuizServiceError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `SettingsService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SettingsServiceError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `StatsService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StatsServiceError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
