//! Commands that drive the saved test.

use anyhow::{Result, anyhow};
use quiz_core::grading::{AnswerFilter, filter_questions};
use quiz_core::model::{OptionKey, QuizSettings};
use serde::Serialize;
use services::{AnswerFeedback, AppServices, FinishedTest, TestSession};

use crate::views::{QuestionView, SessionView, print_json};

#[derive(Serialize)]
struct AnswerOutput<'a> {
    question_id: quiz_core::model::QuestionId,
    choice: OptionKey,
    /// Hidden unless feedback is enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    is_correct: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    correct: Option<OptionKey>,
    session: SessionView<'a>,
}

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum StepOutput<'a> {
    InProgress(SessionView<'a>),
    Finished(Box<FinishedTest>),
}

async fn load_settings(app: &AppServices) -> Result<QuizSettings> {
    Ok(app.settings().load().await?)
}

pub async fn start(app: &AppServices) -> Result<()> {
    let session = app.sessions().start().await?;
    print_json(&SessionView::new(&session, &load_settings(app).await?))
}

pub async fn state(app: &AppServices) -> Result<()> {
    let session = app.sessions().require_saved().await?;
    print_json(&SessionView::new(&session, &load_settings(app).await?))
}

pub async fn answer(app: &AppServices, choice: OptionKey) -> Result<()> {
    let sessions = app.sessions();
    let mut session = sessions.require_saved().await?;
    let settings = load_settings(app).await?;
    let AnswerFeedback {
        question_id,
        choice,
        correct,
        is_correct,
    } = sessions.answer(&mut session, choice).await?;

    let show = settings.show_feedback();
    print_json(&AnswerOutput {
        question_id,
        choice,
        is_correct: show.then_some(is_correct),
        correct: show.then_some(correct),
        session: SessionView::new(&session, &settings),
    })
}

/// Moving past the last question finishes and records the test.
pub async fn next(app: &AppServices) -> Result<()> {
    let sessions = app.sessions();
    let mut session = sessions.require_saved().await?;
    if sessions.next(&mut session).await? {
        let finished = sessions.finish(session).await?;
        return print_json(&StepOutput::Finished(Box::new(finished)));
    }
    print_json(&StepOutput::InProgress(SessionView::new(
        &session,
        &load_settings(app).await?,
    )))
}

pub async fn previous(app: &AppServices) -> Result<()> {
    let sessions = app.sessions();
    let mut session = sessions.require_saved().await?;
    sessions.previous(&mut session).await?;
    print_json(&SessionView::new(&session, &load_settings(app).await?))
}

pub async fn pause(app: &AppServices) -> Result<()> {
    let sessions = app.sessions();
    let mut session = sessions.require_saved().await?;
    sessions.toggle_pause(&mut session).await?;
    print_json(&SessionView::new(&session, &load_settings(app).await?))
}

/// Running out of time finishes and records the test.
pub async fn tick(app: &AppServices, secs: u64) -> Result<()> {
    let sessions = app.sessions();
    let settings = load_settings(app).await?;
    let mut session = sessions.require_saved().await?;
    sessions.tick(&mut session, secs).await?;

    let limit = u64::from(settings.timer_minutes()) * 60;
    if settings.timer_enabled() && session.remaining_secs(limit) == 0 {
        let finished = sessions.finish(session).await?;
        return print_json(&StepOutput::Finished(Box::new(finished)));
    }
    print_json(&StepOutput::InProgress(SessionView::new(&session, &settings)))
}

pub async fn mark_invalid(app: &AppServices) -> Result<()> {
    let sessions = app.sessions();
    let mut session = sessions.require_saved().await?;
    sessions.mark_invalid(&mut session).await?;
    print_json(&SessionView::new(&session, &load_settings(app).await?))
}

#[derive(Serialize)]
struct ReviewItem<'a> {
    #[serde(flatten)]
    question: QuestionView<'a>,
    selected: Option<OptionKey>,
    correct: OptionKey,
}

pub async fn review(app: &AppServices, filter: &str) -> Result<()> {
    let filter = AnswerFilter::from_label(filter).ok_or_else(|| {
        anyhow!("unknown filter {filter:?}, expected all, correct, incorrect or unanswered")
    })?;
    let session = app.sessions().require_saved().await?;
    print_json(&review_items(&session, filter))
}

fn review_items(session: &TestSession, filter: AnswerFilter) -> Vec<ReviewItem<'_>> {
    filter_questions(session.questions(), session.answers(), filter)
        .into_iter()
        .map(|q| ReviewItem {
            question: QuestionView::from(q),
            selected: session.answer_for(q.id()),
            correct: q.correct(),
        })
        .collect()
}

pub async fn finish(app: &AppServices) -> Result<()> {
    let sessions = app.sessions();
    let session = sessions.require_saved().await?;
    print_json(&sessions.finish(session).await?)
}

pub async fn discard(app: &AppServices) -> Result<()> {
    app.sessions().discard().await?;
    print_json(&serde_json::json!({ "discarded": true }))
}
