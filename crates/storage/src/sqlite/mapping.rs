use std::collections::BTreeMap;

use quiz_core::model::{Category, OptionKey, Question, QuestionDraft, QuestionId};
use sqlx::Row;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

pub(crate) fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn question_id_from_i64(v: i64) -> Result<QuestionId, StorageError> {
    u64::try_from(v)
        .map(QuestionId::new)
        .map_err(|_| StorageError::Serialization("question_id sign overflow".into()))
}

pub(crate) fn question_id_to_i64(id: QuestionId) -> Result<i64, StorageError> {
    i64::try_from(id.value())
        .map_err(|_| StorageError::Serialization("question_id overflow".into()))
}

pub(crate) fn options_to_json(
    options: &BTreeMap<OptionKey, String>,
) -> Result<String, StorageError> {
    serde_json::to_string(options).map_err(ser)
}

/// Options are read back loosely and re-validated with the question.
pub(crate) fn options_from_json(
    raw: &str,
) -> Result<BTreeMap<String, Option<String>>, StorageError> {
    serde_json::from_str(raw).map_err(ser)
}

pub(crate) fn map_question_row(row: &sqlx::sqlite::SqliteRow) -> Result<Question, StorageError> {
    let options: String = row.try_get("options").map_err(ser)?;
    let category: String = row.try_get("category").map_err(ser)?;
    QuestionDraft {
        id: question_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        prompt: row.try_get("prompt").map_err(ser)?,
        options: options_from_json(&options)?,
        correct: row.try_get("correct").map_err(ser)?,
        category: Category::from_label(&category),
    }
    .validate()
    .map_err(ser)
}
