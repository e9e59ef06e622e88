use std::sync::Arc;

use quiz_core::grading::TestGrade;
use quiz_core::model::{
    InvalidMark, OptionKey, Question, TestResult, TestResultId, UserStats,
};
use serde::Serialize;
use storage::repository::{
    CurationRepository, ProgressStore, SettingsRepository, TestHistoryRepository,
    TestStateRepository,
};
use tracing::{info, warn};

use super::session::{AnswerFeedback, TestSession};
use crate::Clock;
use crate::error::SessionError;
use crate::quiz_service::QuizService;

/// A finished and persisted test.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinishedTest {
    pub id: TestResultId,
    pub result: TestResult,
    pub grade: TestGrade,
    pub stats: UserStats,
}

/// Orchestrates a test against storage: drawing, saving progress after
/// every step, replacing invalid questions and recording the result.
#[derive(Clone)]
pub struct TestSessionService {
    clock: Clock,
    quiz: Arc<QuizService>,
    progress: Arc<dyn ProgressStore>,
    state: Arc<dyn TestStateRepository>,
    history: Arc<dyn TestHistoryRepository>,
    curation: Arc<dyn CurationRepository>,
    settings: Arc<dyn SettingsRepository>,
}

impl TestSessionService {
    #[must_use]
    pub fn new(
        clock: Clock,
        quiz: Arc<QuizService>,
        progress: Arc<dyn ProgressStore>,
        state: Arc<dyn TestStateRepository>,
        history: Arc<dyn TestHistoryRepository>,
        curation: Arc<dyn CurationRepository>,
        settings: Arc<dyn SettingsRepository>,
    ) -> Self {
        Self {
            clock,
            quiz,
            progress,
            state,
            history,
            curation,
            settings,
        }
    }

    /// Draw a new test sized by the user's settings and save it.
    ///
    /// Any previously saved test is overwritten.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Quiz` if nothing can be drawn, or storage errors.
    pub async fn start(&self) -> Result<TestSession, SessionError> {
        let settings = self.settings.get_settings().await?.unwrap_or_default();
        let target = usize::try_from(settings.questions_per_test()).unwrap_or(usize::MAX);
        let questions = self.quiz.draw_test(target).await?;
        let session = TestSession::new(questions, self.clock.now())?;
        self.save(&session).await?;
        info!(questions = session.questions().len(), "started test");
        Ok(session)
    }

    /// Load the saved test, if any.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the saved state cannot be read.
    pub async fn resume(&self) -> Result<Option<TestSession>, SessionError> {
        Ok(self.state.get_state().await?.map(TestSession::from_state))
    }

    /// Like [`resume`](Self::resume), but a missing test is an error.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoSavedTest` if nothing is saved.
    pub async fn require_saved(&self) -> Result<TestSession, SessionError> {
        self.resume().await?.ok_or(SessionError::NoSavedTest)
    }

    /// Persist the session snapshot.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the snapshot is invalid or cannot be stored.
    pub async fn save(&self, session: &TestSession) -> Result<(), SessionError> {
        let state = session.to_state(self.clock.now())?;
        self.state.save_state(&state).await?;
        Ok(())
    }

    /// Drop the saved test without recording a result.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` on backend failures.
    pub async fn discard(&self) -> Result<(), SessionError> {
        self.state.clear_state().await?;
        info!("discarded saved test");
        Ok(())
    }

    /// Answer the current question and count it in the question's progress.
    ///
    /// Only the first answer to a question within a test is counted; changing
    /// it later updates the test but not the progress. Questions flagged
    /// invalid during this test are not counted.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Paused` while paused, `SessionError::Completed`
    /// once the test is over, or storage errors.
    pub async fn answer(
        &self,
        session: &mut TestSession,
        choice: OptionKey,
    ) -> Result<AnswerFeedback, SessionError> {
        let first_answer = session
            .current_question()
            .is_some_and(|q| session.answer_for(q.id()).is_none());
        let feedback = session.answer_current(choice)?;
        if first_answer && !session.is_invalid(feedback.question_id) {
            self.progress
                .record_answer(feedback.question_id, feedback.is_correct, self.clock.now())
                .await?;
        }
        self.save(session).await?;
        Ok(feedback)
    }

    /// Advance and save. Returns whether the test is now complete.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Paused` while paused, or storage errors.
    pub async fn next(&self, session: &mut TestSession) -> Result<bool, SessionError> {
        let done = session.next()?;
        self.save(session).await?;
        Ok(done)
    }

    /// Step back and save.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Paused` while paused, or storage errors.
    pub async fn previous(&self, session: &mut TestSession) -> Result<(), SessionError> {
        session.previous()?;
        self.save(session).await
    }

    /// Toggle pause and save. Returns the new pause flag.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` once the test is over, or storage errors.
    pub async fn toggle_pause(&self, session: &mut TestSession) -> Result<bool, SessionError> {
        let paused = session.toggle_pause()?;
        self.save(session).await?;
        Ok(paused)
    }

    /// Add elapsed seconds and save.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the snapshot cannot be stored.
    pub async fn tick(&self, session: &mut TestSession, secs: u64) -> Result<(), SessionError> {
        session.tick(secs);
        self.save(session).await
    }

    /// Flag the current question as invalid and swap in a replacement.
    ///
    /// The replacement is a weighted pick from the pool, excluding every
    /// question already in the test. If none is left, the flag is rolled back.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoReplacement` when the pool is exhausted.
    pub async fn mark_invalid(&self, session: &mut TestSession) -> Result<Question, SessionError> {
        let Some(current) = session.current_question().map(Question::id) else {
            return Err(SessionError::Completed);
        };
        if session.is_complete() {
            return Err(SessionError::Completed);
        }

        self.curation
            .mark_invalid(InvalidMark {
                question_id: current,
                marked_at: self.clock.now(),
            })
            .await?;

        let mut exclude = session.question_ids();
        exclude.extend(session.invalid_questions().iter().copied());

        let replacement = match self.quiz.replacement_for(&exclude).await {
            Ok(Some(q)) => q,
            Ok(None) => {
                warn!(%current, "no replacement available, reverting invalid mark");
                self.curation.unmark_invalid(current).await?;
                return Err(SessionError::NoReplacement(current));
            }
            Err(err) => {
                self.curation.unmark_invalid(current).await?;
                return Err(err.into());
            }
        };

        session.replace_current(replacement.clone())?;
        self.save(session).await?;
        info!(replaced = %current, with = %replacement.id(), "replaced invalid question");
        Ok(replacement)
    }

    /// Grade, store the result, update lifetime stats and clear the saved test.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the result cannot be built or stored.
    pub async fn finish(&self, mut session: TestSession) -> Result<FinishedTest, SessionError> {
        let now = self.clock.now();
        let (grade, result) = session.finish(now)?;
        let id = self.history.append_result(&result).await?;

        let seen = self.progress.get_all().await?.questions_seen();
        let stats = self
            .history
            .get_stats()
            .await?
            .with_result(result.score(), now)
            .with_questions_seen(u32::try_from(seen).unwrap_or(u32::MAX));
        self.history.save_stats(&stats).await?;
        self.state.clear_state().await?;

        info!(
            %id,
            score = result.score(),
            correct = result.correct(),
            total = result.total(),
            "finished test"
        );
        Ok(FinishedTest {
            id,
            result,
            grade,
            stats,
        })
    }
}
