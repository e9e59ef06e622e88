use chrono::{DateTime, Utc};
use quiz_core::model::{ProgressRecord, ProgressSnapshot, QuestionId};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, question_id_from_i64, question_id_to_i64, ser, u32_from_i64};
use crate::repository::{ProgressStore, StorageError};

fn map_progress_row(row: &sqlx::sqlite::SqliteRow) -> Result<ProgressRecord, StorageError> {
    let appearances = u32_from_i64(
        "appearances",
        row.try_get::<i64, _>("appearances").map_err(ser)?,
    )?;
    let correct_count = u32_from_i64(
        "correct_count",
        row.try_get::<i64, _>("correct_count").map_err(ser)?,
    )?;
    let last_seen: Option<DateTime<Utc>> = row.try_get("last_seen").map_err(ser)?;
    ProgressRecord::from_persisted(appearances, correct_count, last_seen).map_err(ser)
}

#[async_trait::async_trait]
impl ProgressStore for SqliteRepository {
    async fn get_all(&self) -> Result<ProgressSnapshot, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT question_id, appearances, correct_count, last_seen
            FROM question_progress
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut snapshot = ProgressSnapshot::new();
        for row in rows {
            let id = question_id_from_i64(row.try_get::<i64, _>("question_id").map_err(ser)?)?;
            snapshot.insert(id, map_progress_row(&row)?);
        }
        Ok(snapshot)
    }

    async fn record_answer(
        &self,
        id: QuestionId,
        was_correct: bool,
        at: DateTime<Utc>,
    ) -> Result<ProgressRecord, StorageError> {
        // single upsert statement, so the increment is atomic
        let row = sqlx::query(
            r"
            INSERT INTO question_progress (question_id, appearances, correct_count, last_seen)
            VALUES (?1, 1, ?2, ?3)
            ON CONFLICT(question_id) DO UPDATE SET
                appearances = appearances + 1,
                correct_count = correct_count + excluded.correct_count,
                last_seen = excluded.last_seen
            RETURNING appearances, correct_count, last_seen
            ",
        )
        .bind(question_id_to_i64(id)?)
        .bind(i64::from(was_correct))
        .bind(at)
        .fetch_one(&self.pool)
        .await
        .map_err(conn)?;

        map_progress_row(&row)
    }
}
