use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

const SCHEMA_V1: &[&str] = &[
    r"
        CREATE TABLE IF NOT EXISTS questions (
            id INTEGER PRIMARY KEY,
            prompt TEXT NOT NULL,
            options TEXT NOT NULL,
            correct TEXT NOT NULL,
            category TEXT NOT NULL
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS question_progress (
            question_id INTEGER PRIMARY KEY,
            appearances INTEGER NOT NULL CHECK (appearances >= 0),
            correct_count INTEGER NOT NULL
                CHECK (correct_count >= 0 AND correct_count <= appearances),
            last_seen TEXT
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS test_state (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            payload TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS test_results (
            id INTEGER PRIMARY KEY,
            started_at TEXT NOT NULL,
            ended_at TEXT NOT NULL,
            score INTEGER NOT NULL CHECK (score BETWEEN 0 AND 100),
            correct INTEGER NOT NULL CHECK (correct >= 0),
            total INTEGER NOT NULL CHECK (total >= correct),
            duration_minutes INTEGER NOT NULL CHECK (duration_minutes >= 0),
            replaced_question_ids TEXT NOT NULL,
            answers TEXT NOT NULL
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS user_stats (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            total_tests INTEGER NOT NULL CHECK (total_tests >= 0),
            average_score REAL NOT NULL,
            last_test TEXT,
            total_questions_seen INTEGER NOT NULL CHECK (total_questions_seen >= 0)
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS quiz_settings (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            timer_enabled INTEGER NOT NULL,
            timer_minutes INTEGER NOT NULL,
            show_feedback INTEGER NOT NULL,
            show_statistics INTEGER NOT NULL,
            questions_per_test INTEGER NOT NULL
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS invalid_questions (
            question_id INTEGER PRIMARY KEY,
            marked_at TEXT NOT NULL
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS returned_questions (
            question_id INTEGER PRIMARY KEY,
            returned_at TEXT NOT NULL
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS question_corrections (
            question_id INTEGER PRIMARY KEY,
            prompt TEXT NOT NULL,
            options TEXT NOT NULL,
            correct TEXT NOT NULL,
            corrected_at TEXT NOT NULL
        );
    ",
    r"
        CREATE INDEX IF NOT EXISTS idx_test_results_ended
            ON test_results (ended_at, id);
    ",
];

/// Runs a single, consolidated migration for the current schema.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        for statement in SCHEMA_V1 {
            sqlx::query(statement).execute(&mut *tx).await?;
        }

        sqlx::query(
            r"
                INSERT INTO schema_migrations (version, applied_at)
                VALUES (?1, ?2)
                ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(1_i64)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
    }

    Ok(())
}
