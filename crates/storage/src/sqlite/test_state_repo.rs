use quiz_core::model::TestState;
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, ser};
use crate::repository::{StorageError, TestStateRepository};

#[async_trait::async_trait]
impl TestStateRepository for SqliteRepository {
    async fn save_state(&self, state: &TestState) -> Result<(), StorageError> {
        let payload = serde_json::to_string(state).map_err(ser)?;
        sqlx::query(
            r"
            INSERT INTO test_state (id, payload, updated_at)
            VALUES (1, ?1, ?2)
            ON CONFLICT(id) DO UPDATE SET
                payload = excluded.payload,
                updated_at = excluded.updated_at
            ",
        )
        .bind(payload)
        .bind(state.updated_at())
        .execute(&self.pool)
        .await
        .map_err(conn)?;
        Ok(())
    }

    async fn get_state(&self) -> Result<Option<TestState>, StorageError> {
        let row = sqlx::query("SELECT payload FROM test_state WHERE id = 1")
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let payload: String = row.try_get("payload").map_err(ser)?;
        serde_json::from_str(&payload).map(Some).map_err(ser)
    }

    async fn clear_state(&self) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM test_state WHERE id = 1")
            .execute(&self.pool)
            .await
            .map_err(conn)?;
        Ok(())
    }
}
