use serde::Serialize;
use thiserror::Error;

pub const DEFAULT_TIMER_MINUTES: u32 = 120;
pub const MIN_TIMER_MINUTES: u32 = 30;
pub const MAX_TIMER_MINUTES: u32 = 300;

pub const DEFAULT_QUESTIONS_PER_TEST: u32 = 100;
pub const MIN_QUESTIONS_PER_TEST: u32 = 10;
pub const MAX_QUESTIONS_PER_TEST: u32 = 200;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("no valid settings fields provided")]
    NoFields,
}

/// User preferences for taking tests.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct QuizSettings {
    timer_enabled: bool,
    timer_minutes: u32,
    show_feedback: bool,
    show_statistics: bool,
    questions_per_test: u32,
}

/// Partial settings update; `None` fields are left untouched.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QuizSettingsUpdate {
    pub timer_enabled: Option<bool>,
    pub timer_minutes: Option<u32>,
    pub show_feedback: Option<bool>,
    pub show_statistics: Option<bool>,
    pub questions_per_test: Option<u32>,
}

impl QuizSettingsUpdate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.timer_enabled.is_none()
            && self.timer_minutes.is_none()
            && self.show_feedback.is_none()
            && self.show_statistics.is_none()
            && self.questions_per_test.is_none()
    }
}

impl QuizSettings {
    /// Rehydrate settings from storage, clamping out-of-range numbers.
    #[must_use]
    pub fn from_persisted(
        timer_enabled: bool,
        timer_minutes: u32,
        show_feedback: bool,
        show_statistics: bool,
        questions_per_test: u32,
    ) -> Self {
        Self {
            timer_enabled,
            timer_minutes: clamp_timer_minutes(timer_minutes),
            show_feedback,
            show_statistics,
            questions_per_test: clamp_questions_per_test(questions_per_test),
        }
    }

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::NoFields` if the update does not set anything.
    pub fn apply(self, update: QuizSettingsUpdate) -> Result<Self, SettingsError> {
        if update.is_empty() {
            return Err(SettingsError::NoFields);
        }
        Ok(Self::from_persisted(
            update.timer_enabled.unwrap_or(self.timer_enabled),
            update.timer_minutes.unwrap_or(self.timer_minutes),
            update.show_feedback.unwrap_or(self.show_feedback),
            update.show_statistics.unwrap_or(self.show_statistics),
            update.questions_per_test.unwrap_or(self.questions_per_test),
        ))
    }

    #[must_use]
    pub fn timer_enabled(&self) -> bool {
        self.timer_enabled
    }

    #[must_use]
    pub fn timer_minutes(&self) -> u32 {
        self.timer_minutes
    }

    #[must_use]
    pub fn show_feedback(&self) -> bool {
        self.show_feedback
    }

    #[must_use]
    pub fn show_statistics(&self) -> bool {
        self.show_statistics
    }

    #[must_use]
    pub fn questions_per_test(&self) -> u32 {
        self.questions_per_test
    }
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            timer_enabled: true,
            timer_minutes: DEFAULT_TIMER_MINUTES,
            show_feedback: true,
            show_statistics: true,
            questions_per_test: DEFAULT_QUESTIONS_PER_TEST,
        }
    }
}

#[must_use]
pub fn clamp_timer_minutes(value: u32) -> u32 {
    value.clamp(MIN_TIMER_MINUTES, MAX_TIMER_MINUTES)
}

#[must_use]
pub fn clamp_questions_per_test(value: u32) -> u32 {
    value.clamp(MIN_QUESTIONS_PER_TEST, MAX_QUESTIONS_PER_TEST)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_exam_format() {
        let s = QuizSettings::default();
        assert!(s.timer_enabled());
        assert_eq!(s.timer_minutes(), 120);
        assert_eq!(s.questions_per_test(), 100);
    }

    #[test]
    fn update_clamps_values() {
        let s = QuizSettings::default()
            .apply(QuizSettingsUpdate {
                timer_minutes: Some(5),
                questions_per_test: Some(1_000),
                ..QuizSettingsUpdate::new()
            })
            .unwrap();
        assert_eq!(s.timer_minutes(), MIN_TIMER_MINUTES);
        assert_eq!(s.questions_per_test(), MAX_QUESTIONS_PER_TEST);
        assert!(s.show_feedback());
    }

    #[test]
    fn empty_update_is_rejected() {
        let err = QuizSettings::default()
            .apply(QuizSettingsUpdate::new())
            .unwrap_err();
        assert_eq!(err, SettingsError::NoFields);
    }
}
