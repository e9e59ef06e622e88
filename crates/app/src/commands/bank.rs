use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use serde_json::json;
use services::AppServices;
use storage::question_bank::load_question_bank;

use crate::views::{QuestionView, print_json};

pub async fn import(app: &AppServices, path: Option<PathBuf>) -> Result<()> {
    let Some(path) = path else {
        bail!("no question bank given; pass a path or set --questions / QUIZ_QUESTIONS");
    };
    let bank = load_question_bank(&path)
        .with_context(|| format!("cannot import {}", path.display()))?;
    let imported = app.quiz().import_questions(&bank.questions).await?;
    print_json(&json!({ "imported": imported, "skipped": bank.skipped }))
}

/// Questions not in the saved test, for practice beyond it.
pub async fn extra(app: &AppServices, count: usize) -> Result<()> {
    let exclude: HashSet<_> = app
        .sessions()
        .resume()
        .await?
        .map(|s| s.question_ids())
        .unwrap_or_default();
    let questions = app.quiz().extra_questions(count, &exclude).await?;
    let views: Vec<QuestionView<'_>> = questions.iter().map(QuestionView::from).collect();
    print_json(&views)
}
