use thiserror::Error;

use crate::model::{
    ProgressError, QuestionError, QuotaError, SettingsError, TestResultError, TestStateError,
};

/// Any domain validation failure.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Progress(#[from] ProgressError),
    #[error(transparent)]
    Quota(#[from] QuotaError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    TestState(#[from] TestStateError),
    #[error(transparent)]
    TestResult(#[from] TestResultError),
}
