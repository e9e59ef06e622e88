use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::category::Category;
use crate::model::ids::QuestionId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question prompt cannot be empty")]
    EmptyPrompt,

    #[error("invalid option key: {0:?}")]
    InvalidOptionKey(String),

    #[error("question needs at least two options, got {0}")]
    TooFewOptions(usize),

    #[error("correct option {0} is not among the options")]
    CorrectOptionMissing(OptionKey),
}

//
// ─── OPTION KEY ────────────────────────────────────────────────────────────────
//

/// Letter identifying one of the answer choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OptionKey {
    A,
    B,
    C,
    D,
}

impl OptionKey {
    pub const ALL: [OptionKey; 4] = [OptionKey::A, OptionKey::B, OptionKey::C, OptionKey::D];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::A => "a",
            Self::B => "b",
            Self::C => "c",
            Self::D => "d",
        }
    }
}

impl fmt::Display for OptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OptionKey {
    type Err = QuestionError;

    /// Case-insensitive, surrounding whitespace ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a" => Ok(Self::A),
            "b" => Ok(Self::B),
            "c" => Ok(Self::C),
            "d" => Ok(Self::D),
            _ => Err(QuestionError::InvalidOptionKey(s.to_string())),
        }
    }
}

impl Serialize for OptionKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for OptionKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

//
// ─── DRAFT ─────────────────────────────────────────────────────────────────────
//

/// Unvalidated question as it appears in a question bank file.
///
/// Also accepts the Spanish field names used by older bank exports.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QuestionDraft {
    pub id: QuestionId,
    #[serde(alias = "pregunta")]
    pub prompt: String,
    #[serde(alias = "opciones")]
    pub options: BTreeMap<String, Option<String>>,
    #[serde(alias = "correcta")]
    pub correct: String,
    #[serde(default, alias = "categoria")]
    pub category: Category,
}

impl QuestionDraft {
    /// Validate and normalize into a [`Question`].
    ///
    /// Text is trimmed and options with blank text are dropped.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the prompt is empty, an option key is
    /// unknown, fewer than two options remain, or the correct key is missing.
    pub fn validate(self) -> Result<Question, QuestionError> {
        let prompt = self.prompt.trim().to_string();
        if prompt.is_empty() {
            return Err(QuestionError::EmptyPrompt);
        }

        let mut options = BTreeMap::new();
        for (key, text) in self.options {
            let key: OptionKey = key.parse()?;
            let Some(text) = text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()) else {
                continue;
            };
            options.insert(key, text);
        }
        if options.len() < 2 {
            return Err(QuestionError::TooFewOptions(options.len()));
        }

        let correct: OptionKey = self.correct.parse()?;
        if !options.contains_key(&correct) {
            return Err(QuestionError::CorrectOptionMissing(correct));
        }

        Ok(Question {
            id: self.id,
            prompt,
            options,
            correct,
            category: self.category,
        })
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A multiple-choice question from the bank. Static reference data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "QuestionDraft")]
pub struct Question {
    id: QuestionId,
    prompt: String,
    options: BTreeMap<OptionKey, String>,
    correct: OptionKey,
    category: Category,
}

impl TryFrom<QuestionDraft> for Question {
    type Error = QuestionError;

    fn try_from(draft: QuestionDraft) -> Result<Self, Self::Error> {
        draft.validate()
    }
}

impl Question {
    /// Build a question from parts.
    ///
    /// # Errors
    ///
    /// Same rules as [`QuestionDraft::validate`].
    pub fn new(
        id: QuestionId,
        prompt: impl Into<String>,
        options: impl IntoIterator<Item = (OptionKey, String)>,
        correct: OptionKey,
        category: Category,
    ) -> Result<Self, QuestionError> {
        QuestionDraft {
            id,
            prompt: prompt.into(),
            options: options
                .into_iter()
                .map(|(k, v)| (k.as_str().to_string(), Some(v)))
                .collect(),
            correct: correct.as_str().to_string(),
            category,
        }
        .validate()
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
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
    pub fn option_text(&self, key: OptionKey) -> Option<&str> {
        self.options.get(&key).map(String::as_str)
    }

    #[must_use]
    pub fn correct(&self) -> OptionKey {
        self.correct
    }

    #[must_use]
    pub fn category(&self) -> Category {
        self.category
    }

    #[must_use]
    pub fn is_correct_choice(&self, choice: OptionKey) -> bool {
        self.correct == choice
    }

    /// Returns a copy with prompt, options and correct key replaced.
    ///
    /// The id and category are kept.
    #[must_use]
    pub fn with_content(
        &self,
        prompt: String,
        options: BTreeMap<OptionKey, String>,
        correct: OptionKey,
    ) -> Self {
        Self {
            id: self.id,
            prompt,
            options,
            correct,
            category: self.category,
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> Vec<(OptionKey, String)> {
        vec![
            (OptionKey::A, "uno".to_string()),
            (OptionKey::B, "dos".to_string()),
            (OptionKey::C, "tres".to_string()),
        ]
    }

    #[test]
    fn option_key_parses_case_insensitive() {
        assert_eq!(" B ".parse::<OptionKey>().unwrap(), OptionKey::B);
        assert!("e".parse::<OptionKey>().is_err());
    }

    #[test]
    fn question_requires_prompt() {
        let err = Question::new(QuestionId::new(1), "  ", options(), OptionKey::A, Category::Other)
            .unwrap_err();
        assert_eq!(err, QuestionError::EmptyPrompt);
    }

    #[test]
    fn question_requires_correct_option_present() {
        let err = Question::new(QuestionId::new(1), "Q", options(), OptionKey::D, Category::Other)
            .unwrap_err();
        assert_eq!(err, QuestionError::CorrectOptionMissing(OptionKey::D));
    }

    #[test]
    fn blank_options_are_dropped() {
        let json = r#"{
            "id": 4,
            "prompt": "  ¿Cuál? ",
            "options": {"a": "x", "b": "  ", "c": "z", "d": null},
            "correct": "C"
        }"#;
        let q: Question = serde_json::from_str(json).unwrap();
        assert_eq!(q.prompt(), "¿Cuál?");
        assert_eq!(q.options().len(), 2);
        assert_eq!(q.correct(), OptionKey::C);
        assert_eq!(q.category(), Category::Other);
    }

    #[test]
    fn legacy_field_names_are_accepted() {
        let json = r#"{
            "id": 11,
            "pregunta": "Enfermedad de declaración obligatoria",
            "opciones": {"a": "Gripe", "b": "Catarro"},
            "correcta": "a",
            "categoria": "renave_declaracion"
        }"#;
        let q: Question = serde_json::from_str(json).unwrap();
        assert_eq!(q.id(), QuestionId::new(11));
        assert_eq!(q.category(), Category::DiseaseReporting);
        assert!(q.is_correct_choice(OptionKey::A));
    }

    #[test]
    fn serialized_question_reads_back() {
        let q = Question::new(
            QuestionId::new(2),
            "Q",
            options(),
            OptionKey::B,
            Category::Legislation,
        )
        .unwrap();
        let json = serde_json::to_string(&q).unwrap();
        assert!(json.contains("\"category\":\"leyes\""));
        let back: Question = serde_json::from_str(&json).unwrap();
        assert_eq!(back, q);
    }
}
