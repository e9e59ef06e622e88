use async_trait::async_trait;
use quiz_core::model::QuizSettings;
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, ser, u32_from_i64};
use crate::repository::{SettingsRepository, StorageError};

#[async_trait]
impl SettingsRepository for SqliteRepository {
    async fn get_settings(&self) -> Result<Option<QuizSettings>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT
                timer_enabled,
                timer_minutes,
                show_feedback,
                show_statistics,
                questions_per_test
            FROM quiz_settings
            WHERE id = 1
            ",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(QuizSettings::from_persisted(
            row.try_get("timer_enabled").map_err(ser)?,
            u32_from_i64("timer_minutes", row.try_get("timer_minutes").map_err(ser)?)?,
            row.try_get("show_feedback").map_err(ser)?,
            row.try_get("show_statistics").map_err(ser)?,
            u32_from_i64(
                "questions_per_test",
                row.try_get("questions_per_test").map_err(ser)?,
            )?,
        )))
    }

    async fn save_settings(&self, settings: &QuizSettings) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO quiz_settings (
                id,
                timer_enabled,
                timer_minutes,
                show_feedback,
                show_statistics,
                questions_per_test
            )
            VALUES (1, ?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(id) DO UPDATE SET
                timer_enabled = excluded.timer_enabled,
                timer_minutes = excluded.timer_minutes,
                show_feedback = excluded.show_feedback,
                show_statistics = excluded.show_statistics,
                questions_per_test = excluded.questions_per_test
            ",
        )
        .bind(settings.timer_enabled())
        .bind(i64::from(settings.timer_minutes()))
        .bind(settings.show_feedback())
        .bind(settings.show_statistics())
        .bind(i64::from(settings.questions_per_test()))
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }
}
