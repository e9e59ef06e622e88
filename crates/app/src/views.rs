//! JSON shapes printed by the CLI.

use std::collections::BTreeMap;

use quiz_core::model::{Category, OptionKey, Question, QuestionId, QuizSettings};
use serde::Serialize;
use services::{TestProgress, TestSession};

/// A question as shown while the test is running, without its answer.
#[derive(Debug, Serialize)]
pub struct QuestionView<'a> {
    pub id: QuestionId,
    pub prompt: &'a str,
    pub options: &'a BTreeMap<OptionKey, String>,
    pub category: Category,
}

impl<'a> From<&'a Question> for QuestionView<'a> {
    fn from(q: &'a Question) -> Self {
        Self {
            id: q.id(),
            prompt: q.prompt(),
            options: q.options(),
            category: q.category(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SessionView<'a> {
    pub progress: TestProgress,
    pub question: Option<QuestionView<'a>>,
    pub selected: Option<OptionKey>,
    pub elapsed_secs: u64,
    /// Present only when the timer is enabled.
    pub remaining_secs: Option<u64>,
    pub invalid_questions: &'a [QuestionId],
}

impl<'a> SessionView<'a> {
    pub fn new(session: &'a TestSession, settings: &QuizSettings) -> Self {
        let question = session.current_question();
        Self {
            progress: session.progress(),
            selected: question.and_then(|q| session.answer_for(q.id())),
            question: question.map(QuestionView::from),
            elapsed_secs: session.elapsed_secs(),
            remaining_secs: settings
                .timer_enabled()
                .then(|| session.remaining_secs(u64::from(settings.timer_minutes()) * 60)),
            invalid_questions: session.invalid_questions(),
        }
    }
}

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
