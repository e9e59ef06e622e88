use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use quiz_core::model::{InvalidMark, Question, QuestionCorrection, QuestionId, ReturnedMark};
use serde::Serialize;
use storage::repository::{CurationRepository, QuestionRepository, StorageError};
use tracing::{debug, info};

use crate::Clock;
use crate::error::CurationError;
use crate::quiz_service::QuizService;

/// A flagged question with its current (corrected) content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvalidQuestion {
    pub question: Question,
    pub marked_at: DateTime<Utc>,
}

/// Review queue for questions flagged during tests.
#[derive(Clone)]
pub struct CurationService {
    clock: Clock,
    quiz: Arc<QuizService>,
    questions: Arc<dyn QuestionRepository>,
    curation: Arc<dyn CurationRepository>,
}

impl CurationService {
    #[must_use]
    pub fn new(
        clock: Clock,
        quiz: Arc<QuizService>,
        questions: Arc<dyn QuestionRepository>,
        curation: Arc<dyn CurationRepository>,
    ) -> Self {
        Self {
            clock,
            quiz,
            questions,
            curation,
        }
    }

    async fn ensure_known(&self, id: QuestionId) -> Result<(), CurationError> {
        match self.questions.get_question(id).await {
            Ok(_) => Ok(()),
            Err(StorageError::NotFound) => Err(CurationError::UnknownQuestion(id)),
            Err(err) => Err(err.into()),
        }
    }

    /// Set or clear the invalid flag. Returns the new flag.
    ///
    /// # Errors
    ///
    /// Returns `CurationError::UnknownQuestion` for ids outside the bank.
    pub async fn set_invalid(&self, id: QuestionId, invalid: bool) -> Result<bool, CurationError> {
        self.ensure_known(id).await?;
        if invalid {
            self.curation
                .mark_invalid(InvalidMark {
                    question_id: id,
                    marked_at: self.clock.now(),
                })
                .await?;
        } else {
            self.curation.unmark_invalid(id).await?;
        }
        info!(%id, invalid, "updated invalid flag");
        Ok(invalid)
    }

    /// Flagged questions joined with the corrected bank.
    ///
    /// Flags pointing at ids no longer in the bank are skipped.
    ///
    /// # Errors
    ///
    /// Returns `CurationError::Storage` on read failures.
    pub async fn list_invalid(&self) -> Result<Vec<InvalidQuestion>, CurationError> {
        let marks = self.curation.list_invalid().await?;
        if marks.is_empty() {
            return Ok(Vec::new());
        }
        let bank: HashMap<QuestionId, Question> = self
            .quiz
            .corrected_bank()
            .await?
            .into_iter()
            .map(|q| (q.id(), q))
            .collect();

        let mut out = Vec::with_capacity(marks.len());
        for mark in marks {
            match bank.get(&mark.question_id) {
                Some(question) => out.push(InvalidQuestion {
                    question: question.clone(),
                    marked_at: mark.marked_at,
                }),
                None => debug!(id = %mark.question_id, "flagged question missing from bank"),
            }
        }
        Ok(out)
    }

    /// Clear the flag and record that the question is back in rotation.
    ///
    /// # Errors
    ///
    /// Returns `CurationError::UnknownQuestion` for ids outside the bank.
    pub async fn return_to_pool(&self, id: QuestionId) -> Result<ReturnedMark, CurationError> {
        self.ensure_known(id).await?;
        let was_invalid = self.curation.unmark_invalid(id).await?;
        let mark = ReturnedMark {
            question_id: id,
            returned_at: self.clock.now(),
        };
        self.curation.record_returned(mark).await?;
        info!(%id, was_invalid, "returned question to pool");
        Ok(mark)
    }

    /// Replace a question's prompt, options and correct key.
    ///
    /// Returns the question as it will be drawn from now on.
    ///
    /// # Errors
    ///
    /// Returns `CurationError::Question` if the edit is invalid and
    /// `CurationError::UnknownQuestion` for ids outside the bank.
    pub async fn correct_question(
        &self,
        id: QuestionId,
        prompt: &str,
        options: BTreeMap<String, Option<String>>,
        correct: &str,
    ) -> Result<Question, CurationError> {
        let original = match self.questions.get_question(id).await {
            Ok(q) => q,
            Err(StorageError::NotFound) => return Err(CurationError::UnknownQuestion(id)),
            Err(err) => return Err(err.into()),
        };
        let correction = QuestionCorrection::new(id, prompt, options, correct, self.clock.now())?;
        self.curation.save_correction(&correction).await?;
        info!(%id, "saved question correction");
        Ok(correction.apply_to(&original))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{Category, OptionKey, QuestionError};
    use quiz_core::time::fixed_clock;
    use storage::repository::InMemoryRepository;

    async fn service() -> (CurationService, InMemoryRepository) {
        let repo = InMemoryRepository::new();
        let bank: Vec<Question> = (1..=3)
            .map(|i| {
                Question::new(
                    QuestionId::new(i),
                    format!("Q{i}"),
                    vec![(OptionKey::A, "x".into()), (OptionKey::B, "y".into())],
                    OptionKey::A,
                    Category::Other,
                )
                .unwrap()
            })
            .collect();
        repo.upsert_questions(&bank).await.unwrap();
        let quiz = Arc::new(QuizService::new(
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
        ));
        let svc = CurationService::new(
            fixed_clock(),
            quiz,
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
        );
        (svc, repo)
    }

    #[tokio::test]
    async fn flag_list_and_return() {
        let (svc, repo) = service().await;
        svc.set_invalid(QuestionId::new(2), true).await.unwrap();
        let listed = svc.list_invalid().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].question.id(), QuestionId::new(2));

        svc.return_to_pool(QuestionId::new(2)).await.unwrap();
        assert!(svc.list_invalid().await.unwrap().is_empty());
        assert_eq!(repo.list_returned().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unknown_ids_are_rejected() {
        let (svc, _) = service().await;
        assert!(matches!(
            svc.set_invalid(QuestionId::new(42), true).await,
            Err(CurationError::UnknownQuestion(_))
        ));
    }

    #[tokio::test]
    async fn invalid_list_shows_corrected_content() {
        let (svc, _) = service().await;
        svc.set_invalid(QuestionId::new(1), true).await.unwrap();
        svc.correct_question(
            QuestionId::new(1),
            " Nueva ",
            BTreeMap::from([
                ("a".to_string(), Some("x".to_string())),
                ("b".to_string(), Some("y".to_string())),
            ]),
            "B",
        )
        .await
        .unwrap();
        let listed = svc.list_invalid().await.unwrap();
        assert_eq!(listed[0].question.prompt(), "Nueva");
        assert_eq!(listed[0].question.correct(), OptionKey::B);
    }

    #[tokio::test]
    async fn correction_must_name_an_option() {
        let (svc, _) = service().await;
        let err = svc
            .correct_question(
                QuestionId::new(1),
                "Q",
                BTreeMap::from([
                    ("a".to_string(), Some("x".to_string())),
                    ("b".to_string(), Some("y".to_string())),
                ]),
                "d",
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CurationError::Question(QuestionError::CorrectOptionMissing(OptionKey::D))
        ));
    }
}
