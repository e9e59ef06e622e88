use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use quiz_core::model::{
    OptionKey, QuestionId, TestResult, TestResultId, TestResultRow, UserStats,
};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, ser, u32_from_i64};
use crate::repository::{StorageError, TestHistoryRepository};

fn map_result_row(row: &sqlx::sqlite::SqliteRow) -> Result<TestResultRow, StorageError> {
    let id: i64 = row.try_get("id").map_err(ser)?;
    let score = u8::try_from(row.try_get::<i64, _>("score").map_err(ser)?)
        .map_err(|_| StorageError::Serialization("invalid score".into()))?;
    let replaced: String = row.try_get("replaced_question_ids").map_err(ser)?;
    let answers: String = row.try_get("answers").map_err(ser)?;
    let replaced: Vec<QuestionId> = serde_json::from_str(&replaced).map_err(ser)?;
    let answers: BTreeMap<QuestionId, OptionKey> = serde_json::from_str(&answers).map_err(ser)?;

    let result = TestResult::from_persisted(
        row.try_get("started_at").map_err(ser)?,
        row.try_get("ended_at").map_err(ser)?,
        score,
        u32_from_i64("correct", row.try_get::<i64, _>("correct").map_err(ser)?)?,
        u32_from_i64("total", row.try_get::<i64, _>("total").map_err(ser)?)?,
        u32_from_i64(
            "duration_minutes",
            row.try_get::<i64, _>("duration_minutes").map_err(ser)?,
        )?,
        replaced,
        answers,
    )
    .map_err(ser)?;

    Ok(TestResultRow::new(TestResultId::new(id), result))
}

#[async_trait::async_trait]
impl TestHistoryRepository for SqliteRepository {
    async fn append_result(&self, result: &TestResult) -> Result<TestResultId, StorageError> {
        let replaced = serde_json::to_string(result.replaced_question_ids()).map_err(ser)?;
        let answers = serde_json::to_string(result.answers()).map_err(ser)?;

        let res = sqlx::query(
            r"
            INSERT INTO test_results (
                started_at, ended_at, score, correct, total,
                duration_minutes, replaced_question_ids, answers
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ",
        )
        .bind(result.started_at())
        .bind(result.ended_at())
        .bind(i64::from(result.score()))
        .bind(i64::from(result.correct()))
        .bind(i64::from(result.total()))
        .bind(i64::from(result.duration_minutes()))
        .bind(replaced)
        .bind(answers)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(TestResultId::new(res.last_insert_rowid()))
    }

    async fn list_results(&self, limit: u32) -> Result<Vec<TestResultRow>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT
                id, started_at, ended_at, score, correct, total,
                duration_minutes, replaced_question_ids, answers
            FROM test_results
            ORDER BY ended_at DESC, id DESC
            LIMIT ?1
            ",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_result_row).collect()
    }

    async fn get_stats(&self) -> Result<UserStats, StorageError> {
        let row = sqlx::query(
            r"
            SELECT total_tests, average_score, last_test, total_questions_seen
            FROM user_stats
            WHERE id = 1
            ",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        let Some(row) = row else {
            return Ok(UserStats::default());
        };

        let last_test: Option<DateTime<Utc>> = row.try_get("last_test").map_err(ser)?;
        Ok(UserStats::from_persisted(
            u32_from_i64("total_tests", row.try_get::<i64, _>("total_tests").map_err(ser)?)?,
            row.try_get("average_score").map_err(ser)?,
            last_test,
            u32_from_i64(
                "total_questions_seen",
                row.try_get::<i64, _>("total_questions_seen").map_err(ser)?,
            )?,
        ))
    }

    async fn save_stats(&self, stats: &UserStats) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO user_stats (id, total_tests, average_score, last_test, total_questions_seen)
            VALUES (1, ?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET
                total_tests = excluded.total_tests,
                average_score = excluded.average_score,
                last_test = excluded.last_test,
                total_questions_seen = excluded.total_questions_seen
            ",
        )
        .bind(i64::from(stats.total_tests()))
        .bind(stats.average_score())
        .bind(stats.last_test())
        .bind(i64::from(stats.total_questions_seen()))
        .execute(&self.pool)
        .await
        .map_err(conn)?;
        Ok(())
    }
}
