use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};

use quiz_core::model::{Question, QuestionCorrection, QuestionId};
use quiz_core::selection::QuestionSelector;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use storage::repository::{CurationRepository, ProgressStore, QuestionRepository};
use tracing::{debug, info};

use crate::error::QuizServiceError;

/// Draws tests, extra questions and replacements from the question bank.
///
/// The bank is read with corrections applied. Questions flagged as invalid
/// never enter a draw.
#[derive(Clone)]
pub struct QuizService {
    questions: Arc<dyn QuestionRepository>,
    progress: Arc<dyn ProgressStore>,
    curation: Arc<dyn CurationRepository>,
    selector: QuestionSelector,
    rng: Arc<Mutex<StdRng>>,
}

impl QuizService {
    #[must_use]
    pub fn new(
        questions: Arc<dyn QuestionRepository>,
        progress: Arc<dyn ProgressStore>,
        curation: Arc<dyn CurationRepository>,
    ) -> Self {
        Self {
            questions,
            progress,
            curation,
            selector: QuestionSelector::default(),
            rng: Arc::new(Mutex::new(StdRng::from_rng(&mut rand::rng()))),
        }
    }

    /// Use a seeded generator so draws are reproducible.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Arc::new(Mutex::new(StdRng::seed_from_u64(seed)));
        self
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut guard = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    /// Store bank questions, replacing any with the same id.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Storage` if the write fails.
    pub async fn import_questions(
        &self,
        questions: &[Question],
    ) -> Result<usize, QuizServiceError> {
        let written = self.questions.upsert_questions(questions).await?;
        info!(written, "imported questions");
        Ok(written)
    }

    /// Every bank question with stored corrections applied.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Storage` on read failures.
    pub async fn corrected_bank(&self) -> Result<Vec<Question>, QuizServiceError> {
        let bank = self.questions.load_all().await?;
        let corrections: HashMap<QuestionId, QuestionCorrection> = self
            .curation
            .list_corrections()
            .await?
            .into_iter()
            .map(|c| (c.question_id(), c))
            .collect();

        Ok(bank
            .iter()
            .map(|q| match corrections.get(&q.id()) {
                Some(c) => c.apply_to(q),
                None => q.clone(),
            })
            .collect())
    }

    /// The corrected bank minus questions flagged as invalid.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Storage` on read failures.
    pub async fn draw_pool(&self) -> Result<Vec<Question>, QuizServiceError> {
        let invalid: HashSet<QuestionId> = self
            .curation
            .list_invalid()
            .await?
            .into_iter()
            .map(|m| m.question_id)
            .collect();
        let mut pool = self.corrected_bank().await?;
        pool.retain(|q| !invalid.contains(&q.id()));
        debug!(pool = pool.len(), excluded = invalid.len(), "draw pool ready");
        Ok(pool)
    }

    /// Draw a weighted test of up to `target` questions.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::NoQuestions` if the draw pool is empty.
    pub async fn draw_test(&self, target: usize) -> Result<Vec<Question>, QuizServiceError> {
        let pool = self.draw_pool().await?;
        if pool.is_empty() {
            return Err(QuizServiceError::NoQuestions);
        }
        let progress = self.progress.get_all().await?;
        let selected = self.with_rng(|rng| self.selector.select(&pool, &progress, target, rng));
        info!(
            selected = selected.len(),
            target,
            pool = pool.len(),
            "drew test"
        );
        Ok(selected)
    }

    /// Up to `count` uniformly shuffled questions not listed in `exclude`.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Storage` on read failures.
    pub async fn extra_questions(
        &self,
        count: usize,
        exclude: &HashSet<QuestionId>,
    ) -> Result<Vec<Question>, QuizServiceError> {
        let mut pool = self.draw_pool().await?;
        pool.retain(|q| !exclude.contains(&q.id()));
        self.with_rng(|rng| pool.shuffle(rng));
        pool.truncate(count);
        debug!(requested = count, sent = pool.len(), "extra questions");
        Ok(pool)
    }

    /// One weighted pick outside `exclude`, or `None` if nothing is left.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Storage` on read failures.
    pub async fn replacement_for(
        &self,
        exclude: &HashSet<QuestionId>,
    ) -> Result<Option<Question>, QuizServiceError> {
        let pool = self.draw_pool().await?;
        let progress = self.progress.get_all().await?;
        Ok(self.with_rng(|rng| {
            self.selector
                .select_replacement(&pool, &progress, exclude, rng)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{Category, InvalidMark, OptionKey};
    use quiz_core::time::fixed_now;
    use std::collections::BTreeMap;
    use storage::repository::InMemoryRepository;

    fn question(id: u64, category: Category) -> Question {
        Question::new(
            QuestionId::new(id),
            format!("Q{id}"),
            vec![(OptionKey::A, "x".into()), (OptionKey::B, "y".into())],
            OptionKey::A,
            category,
        )
        .unwrap()
    }

    async fn service_with(n: u64) -> (QuizService, InMemoryRepository) {
        let repo = InMemoryRepository::new();
        let bank: Vec<Question> = (1..=n)
            .map(|i| {
                let category = if i % 2 == 0 {
                    Category::RegionalExams
                } else {
                    Category::Legislation
                };
                question(i, category)
            })
            .collect();
        repo.upsert_questions(&bank).await.unwrap();
        let svc = QuizService::new(
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
        )
        .with_seed(7);
        (svc, repo)
    }

    #[tokio::test]
    async fn draw_excludes_invalid_questions() {
        let (svc, repo) = service_with(20).await;
        repo.mark_invalid(InvalidMark {
            question_id: QuestionId::new(4),
            marked_at: fixed_now(),
        })
        .await
        .unwrap();

        let drawn = svc.draw_test(100).await.unwrap();
        assert_eq!(drawn.len(), 19);
        assert!(drawn.iter().all(|q| q.id() != QuestionId::new(4)));
    }

    #[tokio::test]
    async fn draw_applies_corrections() {
        let (svc, repo) = service_with(3).await;
        let correction = QuestionCorrection::new(
            QuestionId::new(2),
            "Corregida",
            BTreeMap::from([
                ("a".to_string(), Some("x".to_string())),
                ("b".to_string(), Some("y".to_string())),
            ]),
            "b",
            fixed_now(),
        )
        .unwrap();
        repo.save_correction(&correction).await.unwrap();

        let drawn = svc.draw_test(3).await.unwrap();
        let patched = drawn.iter().find(|q| q.id() == QuestionId::new(2)).unwrap();
        assert_eq!(patched.prompt(), "Corregida");
        assert_eq!(patched.correct(), OptionKey::B);
        assert_eq!(patched.category(), Category::RegionalExams);
    }

    #[tokio::test]
    async fn empty_bank_cannot_draw() {
        let (svc, _repo) = service_with(0).await;
        assert!(matches!(
            svc.draw_test(10).await,
            Err(QuizServiceError::NoQuestions)
        ));
    }

    #[tokio::test]
    async fn extra_questions_skip_excluded() {
        let (svc, _repo) = service_with(10).await;
        let exclude: HashSet<QuestionId> = (1..=7).map(QuestionId::new).collect();
        let extra = svc.extra_questions(5, &exclude).await.unwrap();
        assert_eq!(extra.len(), 3);
        assert!(extra.iter().all(|q| !exclude.contains(&q.id())));
    }

    #[tokio::test]
    async fn replacement_is_none_when_everything_is_excluded() {
        let (svc, _repo) = service_with(2).await;
        let exclude: HashSet<QuestionId> = [QuestionId::new(1)].into();
        let pick = svc.replacement_for(&exclude).await.unwrap();
        assert_eq!(pick.map(|q| q.id()), Some(QuestionId::new(2)));

        let all: HashSet<QuestionId> = [QuestionId::new(1), QuestionId::new(2)].into();
        assert!(svc.replacement_for(&all).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn seeded_draws_repeat() {
        let (a, _) = service_with(30).await;
        let (b, _) = service_with(30).await;
        let ids = |qs: Vec<Question>| qs.iter().map(Question::id).collect::<Vec<_>>();
        assert_eq!(
            ids(a.draw_test(10).await.unwrap()),
            ids(b.draw_test(10).await.unwrap())
        );
    }
}
