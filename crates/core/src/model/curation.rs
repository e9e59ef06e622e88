use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::model::{Category, OptionKey, Question, QuestionDraft, QuestionError, QuestionId};

/// A question flagged as broken during a test. Flagged questions are kept
/// out of future draws until returned to the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InvalidMark {
    pub question_id: QuestionId,
    pub marked_at: DateTime<Utc>,
}

/// Records that a previously flagged question was put back into rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReturnedMark {
    pub question_id: QuestionId,
    pub returned_at: DateTime<Utc>,
}

/// Edited content for a bank question, overlaid on the bank at load time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionCorrection {
    question_id: QuestionId,
    prompt: String,
    options: BTreeMap<OptionKey, String>,
    correct: OptionKey,
    corrected_at: DateTime<Utc>,
}

impl QuestionCorrection {
    /// Validate an edit using the same rules as bank questions.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` when the prompt is blank, an option key is
    /// unknown, fewer than two options are given, or `correct` is not one of them.
    pub fn new(
        question_id: QuestionId,
        prompt: &str,
        options: BTreeMap<String, Option<String>>,
        correct: &str,
        corrected_at: DateTime<Utc>,
    ) -> Result<Self, QuestionError> {
        let checked = QuestionDraft {
            id: question_id,
            prompt: prompt.to_string(),
            options,
            correct: correct.to_string(),
            category: Category::Other,
        }
        .validate()?;

        Ok(Self {
            question_id,
            prompt: checked.prompt().to_string(),
            options: checked.options().clone(),
            correct: checked.correct(),
            corrected_at,
        })
    }

    #[must_use]
    pub fn question_id(&self) -> QuestionId {
        self.question_id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn options(&self) -> &BTreeMap<OptionKey, String> {
        &self.options
    }

    #[must_use]
    pub fn correct(&self) -> OptionKey {
        self.correct
    }

    #[must_use]
    pub fn corrected_at(&self) -> DateTime<Utc> {
        self.corrected_at
    }

    /// Overlay this correction on `question`. Other questions are returned unchanged.
    #[must_use]
    pub fn apply_to(&self, question: &Question) -> Question {
        if question.id() != self.question_id {
            return question.clone();
        }
        question.with_content(self.prompt.clone(), self.options.clone(), self.correct)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn opts(pairs: &[(&str, &str)]) -> BTreeMap<String, Option<String>> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), Some((*v).to_string())))
            .collect()
    }

    #[test]
    fn correction_normalizes_input() {
        let c = QuestionCorrection::new(
            QuestionId::new(3),
            "  Nuevo enunciado ",
            opts(&[("a", " uno "), ("b", "dos")]),
            " B ",
            fixed_now(),
        )
        .unwrap();
        assert_eq!(c.prompt(), "Nuevo enunciado");
        assert_eq!(c.options().get(&OptionKey::A).map(String::as_str), Some("uno"));
        assert_eq!(c.correct(), OptionKey::B);
    }

    #[test]
    fn correction_requires_correct_among_options() {
        let err = QuestionCorrection::new(
            QuestionId::new(3),
            "Q",
            opts(&[("a", "uno"), ("b", "dos")]),
            "c",
            fixed_now(),
        )
        .unwrap_err();
        assert_eq!(err, QuestionError::CorrectOptionMissing(OptionKey::C));
    }

    #[test]
    fn apply_keeps_category() {
        let original = Question::new(
            QuestionId::new(3),
            "Old",
            vec![(OptionKey::A, "x".into()), (OptionKey::B, "y".into())],
            OptionKey::A,
            Category::Legislation,
        )
        .unwrap();
        let c = QuestionCorrection::new(
            QuestionId::new(3),
            "New",
            opts(&[("a", "x"), ("b", "y"), ("c", "z")]),
            "c",
            fixed_now(),
        )
        .unwrap();
        let patched = c.apply_to(&original);
        assert_eq!(patched.prompt(), "New");
        assert_eq!(patched.correct(), OptionKey::C);
        assert_eq!(patched.category(), Category::Legislation);

        let other = Question::new(
            QuestionId::new(4),
            "Other",
            vec![(OptionKey::A, "x".into()), (OptionKey::B, "y".into())],
            OptionKey::A,
            Category::Other,
        )
        .unwrap();
        assert_eq!(c.apply_to(&other), other);
    }
}
