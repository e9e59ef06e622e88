mod category;
mod curation;
mod ids;
mod progress;
mod question;
mod settings;
mod test_result;
mod test_state;

pub use ids::{ParseIdError, QuestionId, TestResultId};

pub use category::{Category, QuotaError, QuotaTable};
pub use curation::{InvalidMark, QuestionCorrection, ReturnedMark};
pub use progress::{ProgressError, ProgressRecord, ProgressSnapshot};
pub use question::{OptionKey, Question, QuestionDraft, QuestionError};
pub use settings::{
    DEFAULT_QUESTIONS_PER_TEST, DEFAULT_TIMER_MINUTES, MAX_QUESTIONS_PER_TEST, MAX_TIMER_MINUTES,
    MIN_QUESTIONS_PER_TEST, MIN_TIMER_MINUTES, QuizSettings, QuizSettingsUpdate, SettingsError,
    clamp_questions_per_test, clamp_timer_minutes,
};
pub use test_result::{TestResult, TestResultError, TestResultRow, UserStats};
pub use test_state::{TestState, TestStateError};
