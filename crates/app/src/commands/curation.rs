use std::collections::BTreeMap;

use anyhow::Result;
use clap::Subcommand;
use quiz_core::model::QuestionId;
use serde_json::json;
use services::AppServices;

use crate::views::print_json;

#[derive(Subcommand)]
pub enum InvalidAction {
    /// Flagged questions with their content
    List,

    /// Flag a question so it is left out of draws
    Mark { id: u64 },

    /// Clear a flag
    Unmark { id: u64 },

    /// Clear a flag and record the question as returned
    Return { id: u64 },
}

pub async fn execute(app: &AppServices, action: InvalidAction) -> Result<()> {
    let curation = app.curation();
    match action {
        InvalidAction::List => print_json(&curation.list_invalid().await?),
        InvalidAction::Mark { id } => {
            let invalid = curation.set_invalid(QuestionId::new(id), true).await?;
            print_json(&json!({ "id": id, "invalid": invalid }))
        }
        InvalidAction::Unmark { id } => {
            let invalid = curation.set_invalid(QuestionId::new(id), false).await?;
            print_json(&json!({ "id": id, "invalid": invalid }))
        }
        InvalidAction::Return { id } => {
            print_json(&curation.return_to_pool(QuestionId::new(id)).await?)
        }
    }
}

pub async fn correct(
    app: &AppServices,
    id: u64,
    prompt: &str,
    options: Vec<(String, String)>,
    answer: &str,
) -> Result<()> {
    let options: BTreeMap<String, Option<String>> =
        options.into_iter().map(|(k, v)| (k, Some(v))).collect();
    let question = app
        .curation()
        .correct_question(QuestionId::new(id), prompt, options, answer)
        .await?;
    print_json(&question)
}

/// Parse `key=text` from `--option`.
pub fn parse_option(raw: &str) -> Result<(String, String), String> {
    let (key, text) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=text, got {raw:?}"))?;
    Ok((key.trim().to_string(), text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_pairs_split_on_first_equals() {
        assert_eq!(
            parse_option("b=x = y").unwrap(),
            ("b".to_string(), "x = y".to_string())
        );
        assert!(parse_option("b").is_err());
    }
}
