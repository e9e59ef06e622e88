use anyhow::Result;
use clap::Subcommand;
use quiz_core::model::QuizSettingsUpdate;
use services::AppServices;

use crate::views::print_json;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the current settings
    Show,

    /// Change one or more settings; numbers are clamped to their range
    Set {
        #[arg(long)]
        timer_enabled: Option<bool>,

        #[arg(long)]
        timer_minutes: Option<u32>,

        #[arg(long)]
        show_feedback: Option<bool>,

        #[arg(long)]
        show_statistics: Option<bool>,

        #[arg(long)]
        questions_per_test: Option<u32>,
    },
}

pub async fn execute(app: &AppServices, action: ConfigAction) -> Result<()> {
    let settings = app.settings();
    match action {
        ConfigAction::Show => print_json(&settings.load().await?),
        ConfigAction::Set {
            timer_enabled,
            timer_minutes,
            show_feedback,
            show_statistics,
            questions_per_test,
        } => {
            let update = QuizSettingsUpdate {
                timer_enabled,
                timer_minutes,
                show_feedback,
                show_statistics,
                questions_per_test,
            };
            print_json(&settings.update(update).await?)
        }
    }
}
