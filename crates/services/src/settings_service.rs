use std::sync::Arc;

use quiz_core::model::{QuizSettings, QuizSettingsUpdate};
use storage::repository::SettingsRepository;
use tracing::info;

use crate::error::SettingsServiceError;

#[derive(Clone)]
pub struct SettingsService {
    repo: Arc<dyn SettingsRepository>,
}

impl SettingsService {
    #[must_use]
    pub fn new(repo: Arc<dyn SettingsRepository>) -> Self {
        Self { repo }
    }

    /// Load persisted settings (or defaults if missing).
    ///
    /// # Errors
    ///
    /// Returns `SettingsServiceError` on storage failures.
    pub async fn load(&self) -> Result<QuizSettings, SettingsServiceError> {
        let settings = self.repo.get_settings().await?;
        Ok(settings.unwrap_or_default())
    }

    /// Apply a partial update on top of the stored settings and persist it.
    ///
    /// Out-of-range numbers are clamped rather than rejected.
    ///
    /// # Errors
    ///
    /// Returns `SettingsServiceError::Settings` if the update sets nothing,
    /// or a storage error if persistence fails.
    pub async fn update(
        &self,
        update: QuizSettingsUpdate,
    ) -> Result<QuizSettings, SettingsServiceError> {
        let settings = self.load().await?.apply(update)?;
        self.repo.save_settings(&settings).await?;
        info!(
            questions_per_test = settings.questions_per_test(),
            timer_minutes = settings.timer_minutes(),
            "settings updated"
        );
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::SettingsError;
    use storage::repository::InMemoryRepository;

    #[tokio::test]
    async fn update_persists_and_clamps() {
        let svc = SettingsService::new(Arc::new(InMemoryRepository::new()));
        assert_eq!(svc.load().await.unwrap(), QuizSettings::default());

        let saved = svc
            .update(QuizSettingsUpdate {
                timer_minutes: Some(1_000),
                show_feedback: Some(false),
                ..QuizSettingsUpdate::new()
            })
            .await
            .unwrap();
        assert_eq!(saved.timer_minutes(), 300);
        assert_eq!(svc.load().await.unwrap(), saved);

        let err = svc.update(QuizSettingsUpdate::new()).await.unwrap_err();
        assert!(matches!(
            err,
            SettingsServiceError::Settings(SettingsError::NoFields)
        ));
    }
}
