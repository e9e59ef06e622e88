use std::collections::HashMap;
use std::sync::Arc;

use quiz_core::model::{
    Category, ProgressSnapshot, Question, QuizSettings, TestResultRow, UserStats,
};
use serde::Serialize;
use storage::repository::{
    ProgressStore, QuestionRepository, SettingsRepository, TestHistoryRepository,
    TestStateRepository,
};

use crate::error::StatsServiceError;

pub const DEFAULT_HISTORY_LIMIT: u32 = 20;
pub const MAX_HISTORY_LIMIT: u32 = 100;
/// Results included in the stats overview.
pub const OVERVIEW_HISTORY_LIMIT: u32 = 30;

/// Aggregated answers for one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CategoryBreakdown {
    pub category: Category,
    pub appearances: u32,
    pub correct: u32,
    pub questions_seen: u32,
    /// `round(correct / appearances * 100)`, absent when never answered.
    pub accuracy_percent: Option<u8>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsOverview {
    pub stats: UserStats,
    pub progress: ProgressSnapshot,
    pub recent_results: Vec<TestResultRow>,
    pub categories: Vec<CategoryBreakdown>,
}

/// Everything the home screen needs on launch.
#[derive(Debug, Clone, Serialize)]
pub struct InitOverview {
    pub progress: ProgressSnapshot,
    pub stats: UserStats,
    pub settings: QuizSettings,
    pub has_saved_test: bool,
    pub total_questions: usize,
}

/// Read-only views over results and progress.
#[derive(Clone)]
pub struct StatsService {
    questions: Arc<dyn QuestionRepository>,
    progress: Arc<dyn ProgressStore>,
    history: Arc<dyn TestHistoryRepository>,
    settings: Arc<dyn SettingsRepository>,
    state: Arc<dyn TestStateRepository>,
}

impl StatsService {
    #[must_use]
    pub fn new(
        questions: Arc<dyn QuestionRepository>,
        progress: Arc<dyn ProgressStore>,
        history: Arc<dyn TestHistoryRepository>,
        settings: Arc<dyn SettingsRepository>,
        state: Arc<dyn TestStateRepository>,
    ) -> Self {
        Self {
            questions,
            progress,
            history,
            settings,
            state,
        }
    }

    /// Most recent results, newest first.
    ///
    /// `limit` defaults to 20 and is clamped to `[1, 100]`.
    ///
    /// # Errors
    ///
    /// Returns `StatsServiceError::Storage` on read failures.
    pub async fn history(
        &self,
        limit: Option<u32>,
    ) -> Result<Vec<TestResultRow>, StatsServiceError> {
        let limit = limit
            .unwrap_or(DEFAULT_HISTORY_LIMIT)
            .clamp(1, MAX_HISTORY_LIMIT);
        Ok(self.history.list_results(limit).await?)
    }

    /// # Errors
    ///
    /// Returns `StatsServiceError::Storage` on read failures.
    pub async fn overview(&self) -> Result<StatsOverview, StatsServiceError> {
        let progress = self.progress.get_all().await?;
        let questions = self.questions.load_all().await?;
        let stats = self.stats_with_seen(&progress).await?;
        let recent_results = self.history.list_results(OVERVIEW_HISTORY_LIMIT).await?;
        let categories = category_breakdown(&questions, &progress);
        Ok(StatsOverview {
            stats,
            progress,
            recent_results,
            categories,
        })
    }

    /// # Errors
    ///
    /// Returns `StatsServiceError::Storage` on read failures.
    pub async fn init(&self) -> Result<InitOverview, StatsServiceError> {
        let progress = self.progress.get_all().await?;
        let stats = self.stats_with_seen(&progress).await?;
        let settings = self.settings.get_settings().await?.unwrap_or_default();
        let has_saved_test = self.state.get_state().await?.is_some();
        let total_questions = self.questions.load_all().await?.len();
        Ok(InitOverview {
            progress,
            stats,
            settings,
            has_saved_test,
            total_questions,
        })
    }

    async fn stats_with_seen(
        &self,
        progress: &ProgressSnapshot,
    ) -> Result<UserStats, StatsServiceError> {
        let seen = u32::try_from(progress.questions_seen()).unwrap_or(u32::MAX);
        Ok(self.history.get_stats().await?.with_questions_seen(seen))
    }
}

/// Per-category totals over the bank, in [`Category::ALL`] order.
///
/// Progress for ids missing from the bank is ignored.
#[must_use]
pub fn category_breakdown(
    questions: &[Question],
    progress: &ProgressSnapshot,
) -> Vec<CategoryBreakdown> {
    let category_of: HashMap<_, _> = questions.iter().map(|q| (q.id(), q.category())).collect();
    let mut totals: HashMap<Category, (u32, u32, u32)> = HashMap::new();

    for (id, record) in progress.iter() {
        let Some(category) = category_of.get(id) else {
            continue;
        };
        let entry = totals.entry(*category).or_default();
        entry.0 = entry.0.saturating_add(record.appearances());
        entry.1 = entry.1.saturating_add(record.correct_count());
        entry.2 += 1;
    }

    Category::ALL
        .iter()
        .map(|category| {
            let (appearances, correct, seen) = totals.get(category).copied().unwrap_or_default();
            CategoryBreakdown {
                category: *category,
                appearances,
                correct,
                questions_seen: seen,
                accuracy_percent: (appearances > 0)
                    .then(|| quiz_core::grading::score_percent(correct, appearances)),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{OptionKey, ProgressRecord, QuestionId};
    use quiz_core::time::fixed_now;

    fn question(id: u64, category: Category) -> Question {
        Question::new(
            QuestionId::new(id),
            "Q",
            vec![(OptionKey::A, "x".into()), (OptionKey::B, "y".into())],
            OptionKey::A,
            category,
        )
        .unwrap()
    }

    #[test]
    fn breakdown_sums_per_category() {
        let questions = vec![
            question(1, Category::Legislation),
            question(2, Category::Legislation),
            question(3, Category::DiseaseReporting),
        ];
        let progress: ProgressSnapshot = [
            (
                QuestionId::new(1),
                ProgressRecord::from_persisted(4, 3, Some(fixed_now())).unwrap(),
            ),
            (
                QuestionId::new(2),
                ProgressRecord::from_persisted(2, 0, Some(fixed_now())).unwrap(),
            ),
            (
                QuestionId::new(99),
                ProgressRecord::from_persisted(5, 5, None).unwrap(),
            ),
        ]
        .into_iter()
        .collect();

        let rows = category_breakdown(&questions, &progress);
        assert_eq!(rows.len(), Category::ALL.len());

        let legislation = rows
            .iter()
            .find(|r| r.category == Category::Legislation)
            .unwrap();
        assert_eq!(legislation.appearances, 6);
        assert_eq!(legislation.correct, 3);
        assert_eq!(legislation.questions_seen, 2);
        assert_eq!(legislation.accuracy_percent, Some(50));

        let reporting = rows
            .iter()
            .find(|r| r.category == Category::DiseaseReporting)
            .unwrap();
        assert_eq!(reporting.accuracy_percent, None);
    }
}
