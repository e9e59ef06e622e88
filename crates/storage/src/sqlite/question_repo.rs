use quiz_core::model::{Question, QuestionId};

use super::SqliteRepository;
use super::mapping::{conn, map_question_row, options_to_json, question_id_to_i64};
use crate::repository::{QuestionRepository, StorageError};

#[async_trait::async_trait]
impl QuestionRepository for SqliteRepository {
    async fn upsert_questions(&self, questions: &[Question]) -> Result<usize, StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;

        for question in questions {
            sqlx::query(
                r"
                INSERT INTO questions (id, prompt, options, correct, category)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ON CONFLICT(id) DO UPDATE SET
                    prompt = excluded.prompt,
                    options = excluded.options,
                    correct = excluded.correct,
                    category = excluded.category
                ",
            )
            .bind(question_id_to_i64(question.id())?)
            .bind(question.prompt())
            .bind(options_to_json(question.options())?)
            .bind(question.correct().as_str())
            .bind(question.category().as_str())
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        }

        tx.commit().await.map_err(conn)?;
        Ok(questions.len())
    }

    async fn load_all(&self) -> Result<Vec<Question>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, prompt, options, correct, category
            FROM questions
            ORDER BY id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_question_row).collect()
    }

    async fn get_question(&self, id: QuestionId) -> Result<Question, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, prompt, options, correct, category
            FROM questions
            WHERE id = ?1
            ",
        )
        .bind(question_id_to_i64(id)?)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?
        .ok_or(StorageError::NotFound)?;

        map_question_row(&row)
    }
}
