//! Loader for question bank files.
//!
//! A bank is a JSON array of question objects. Field names may be either the
//! current ones (`prompt`, `options`, `correct`, `category`) or the legacy
//! Spanish ones (`pregunta`, `opciones`, `correcta`, `categoria`). Entries
//! that fail validation are skipped with a warning instead of failing the
//! whole import.

use std::collections::HashSet;
use std::path::Path;

use quiz_core::model::{Question, QuestionDraft};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuestionBankError {
    #[error("cannot read question bank: {0}")]
    Io(#[from] std::io::Error),

    #[error("question bank is not a JSON array of questions: {0}")]
    Format(#[from] serde_json::Error),
}

/// Result of parsing a bank file.
#[derive(Debug, Clone, Default)]
pub struct QuestionBank {
    pub questions: Vec<Question>,
    /// Entries dropped because they were malformed or repeated an id.
    pub skipped: usize,
}

/// Parse a bank from a JSON string.
///
/// # Errors
///
/// Returns `QuestionBankError::Format` if the top level is not a JSON array.
pub fn parse_question_bank(json: &str) -> Result<QuestionBank, QuestionBankError> {
    let entries: Vec<Value> = serde_json::from_str(json)?;
    let mut bank = QuestionBank {
        questions: Vec::with_capacity(entries.len()),
        skipped: 0,
    };
    let mut seen = HashSet::with_capacity(entries.len());

    for (index, entry) in entries.into_iter().enumerate() {
        let draft: QuestionDraft = match serde_json::from_value(entry) {
            Ok(d) => d,
            Err(err) => {
                warn!(index, error = %err, "skipping malformed question");
                bank.skipped += 1;
                continue;
            }
        };
        let id = draft.id;
        match draft.validate() {
            Ok(question) if seen.insert(id) => bank.questions.push(question),
            Ok(_) => {
                warn!(%id, "skipping duplicate question id");
                bank.skipped += 1;
            }
            Err(err) => {
                warn!(%id, error = %err, "skipping invalid question");
                bank.skipped += 1;
            }
        }
    }

    Ok(bank)
}

/// Read and parse a bank file.
///
/// # Errors
///
/// Returns `QuestionBankError` if the file cannot be read or is not a JSON array.
pub fn load_question_bank(path: &Path) -> Result<QuestionBank, QuestionBankError> {
    let raw = std::fs::read_to_string(path)?;
    parse_question_bank(&raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{Category, QuestionId};

    const BANK: &str = r#"[
        {"id": 1, "pregunta": "Uno", "opciones": {"a": "x", "b": "y"}, "correcta": "a",
         "categoria": "leyes"},
        {"id": 2, "prompt": "Dos", "options": {"a": "x", "b": "y", "c": "z"}, "correct": "C"},
        {"id": 3, "pregunta": "", "opciones": {"a": "x", "b": "y"}, "correcta": "a"},
        {"id": 4, "pregunta": "Cuatro", "opciones": {"a": "x", "b": "y"}, "correcta": "d"},
        {"pregunta": "Sin id"},
        {"id": 1, "pregunta": "Repetida", "opciones": {"a": "x", "b": "y"}, "correcta": "b"}
    ]"#;

    #[test]
    fn invalid_entries_are_skipped() {
        let bank = parse_question_bank(BANK).unwrap();
        let ids: Vec<u64> = bank.questions.iter().map(|q| q.id().value()).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(bank.skipped, 4);
        assert_eq!(bank.questions[0].category(), Category::Legislation);
        assert_eq!(bank.questions[0].prompt(), "Uno");
        assert_eq!(bank.questions[1].id(), QuestionId::new(2));
    }

    #[test]
    fn non_array_is_rejected() {
        assert!(matches!(
            parse_question_bank(r#"{"id": 1}"#),
            Err(QuestionBankError::Format(_))
        ));
    }

    #[test]
    fn bank_loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("questions.json");
        std::fs::write(&path, BANK).unwrap();
        let bank = load_question_bank(&path).unwrap();
        assert_eq!(bank.questions.len(), 2);
        assert!(matches!(
            load_question_bank(&dir.path().join("missing.json")),
            Err(QuestionBankError::Io(_))
        ));
    }
}
