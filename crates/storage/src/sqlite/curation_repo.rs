use async_trait::async_trait;
use quiz_core::model::{InvalidMark, QuestionCorrection, QuestionId, ReturnedMark};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{
    conn, options_from_json, options_to_json, question_id_from_i64, question_id_to_i64, ser,
};
use crate::repository::{CurationRepository, StorageError};

fn map_correction_row(row: &sqlx::sqlite::SqliteRow) -> Result<QuestionCorrection, StorageError> {
    let prompt: String = row.try_get("prompt").map_err(ser)?;
    let options: String = row.try_get("options").map_err(ser)?;
    let correct: String = row.try_get("correct").map_err(ser)?;
    QuestionCorrection::new(
        question_id_from_i64(row.try_get::<i64, _>("question_id").map_err(ser)?)?,
        &prompt,
        options_from_json(&options)?,
        &correct,
        row.try_get("corrected_at").map_err(ser)?,
    )
    .map_err(ser)
}

#[async_trait]
impl CurationRepository for SqliteRepository {
    async fn mark_invalid(&self, mark: InvalidMark) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO invalid_questions (question_id, marked_at)
            VALUES (?1, ?2)
            ON CONFLICT(question_id) DO UPDATE SET marked_at = excluded.marked_at
            ",
        )
        .bind(question_id_to_i64(mark.question_id)?)
        .bind(mark.marked_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;
        Ok(())
    }

    async fn unmark_invalid(&self, id: QuestionId) -> Result<bool, StorageError> {
        let res = sqlx::query("DELETE FROM invalid_questions WHERE question_id = ?1")
            .bind(question_id_to_i64(id)?)
            .execute(&self.pool)
            .await
            .map_err(conn)?;
        Ok(res.rows_affected() > 0)
    }

    async fn list_invalid(&self) -> Result<Vec<InvalidMark>, StorageError> {
        let rows = sqlx::query(
            "SELECT question_id, marked_at FROM invalid_questions ORDER BY question_id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter()
            .map(|row| -> Result<InvalidMark, StorageError> {
                Ok(InvalidMark {
                    question_id: question_id_from_i64(
                        row.try_get::<i64, _>("question_id").map_err(ser)?,
                    )?,
                    marked_at: row.try_get("marked_at").map_err(ser)?,
                })
            })
            .collect()
    }

    async fn record_returned(&self, mark: ReturnedMark) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO returned_questions (question_id, returned_at)
            VALUES (?1, ?2)
            ON CONFLICT(question_id) DO UPDATE SET returned_at = excluded.returned_at
            ",
        )
        .bind(question_id_to_i64(mark.question_id)?)
        .bind(mark.returned_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;
        Ok(())
    }

    async fn list_returned(&self) -> Result<Vec<ReturnedMark>, StorageError> {
        let rows = sqlx::query(
            "SELECT question_id, returned_at FROM returned_questions ORDER BY question_id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter()
            .map(|row| -> Result<ReturnedMark, StorageError> {
                Ok(ReturnedMark {
                    question_id: question_id_from_i64(
                        row.try_get::<i64, _>("question_id").map_err(ser)?,
                    )?,
                    returned_at: row.try_get("returned_at").map_err(ser)?,
                })
            })
            .collect()
    }

    async fn save_correction(&self, correction: &QuestionCorrection) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO question_corrections (question_id, prompt, options, correct, corrected_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(question_id) DO UPDATE SET
                prompt = excluded.prompt,
                options = excluded.options,
                correct = excluded.correct,
                corrected_at = excluded.corrected_at
            ",
        )
        .bind(question_id_to_i64(correction.question_id())?)
        .bind(correction.prompt())
        .bind(options_to_json(correction.options())?)
        .bind(correction.correct().as_str())
        .bind(correction.corrected_at())
        .execute(&self.pool)
        .await
        .map_err(conn)?;
        Ok(())
    }

    async fn list_corrections(&self) -> Result<Vec<QuestionCorrection>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT question_id, prompt, options, correct, corrected_at
            FROM question_corrections
            ORDER BY question_id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_correction_row).collect()
    }
}
