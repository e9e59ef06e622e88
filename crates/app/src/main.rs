//! `quiz`: take weighted practice exams from the terminal.
//!
//! Every command opens the database, performs one operation and prints JSON
//! to stdout. The test in progress lives in the database between calls.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod db;
mod views;

#[derive(Parser)]
#[command(name = "quiz", version, about = "Weighted exam-prep quiz")]
struct Cli {
    /// SQLite database URL or path
    #[arg(long, env = "QUIZ_DB_URL", default_value = "sqlite://quiz.sqlite3", global = true)]
    db: String,

    /// JSON question bank used by `import`
    #[arg(long, env = "QUIZ_QUESTIONS", global = true)]
    questions: Option<PathBuf>,

    /// Seed for reproducible draws
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a JSON question bank
    Import {
        /// Bank file (defaults to --questions)
        path: Option<PathBuf>,
    },

    /// Summary for the home screen
    Init,

    /// Draw a new test, replacing any saved one
    Start,

    /// Show the saved test
    State,

    /// Answer the current question
    Answer {
        /// Option letter (a-d)
        choice: quiz_core::model::OptionKey,
    },

    /// Go to the next question; past the last one completes the test
    Next,

    /// Go back one question
    Prev,

    /// Pause or resume the timer
    Pause,

    /// Add elapsed seconds to the timer
    Tick {
        secs: u64,
    },

    /// Flag the current question and swap in a replacement
    MarkInvalid,

    /// List questions of the saved test by answer status
    Review {
        /// all, correct, incorrect or unanswered
        #[arg(long, default_value = "all")]
        filter: String,
    },

    /// Grade and record the saved test
    Finish,

    /// Drop the saved test without recording it
    Discard,

    /// Statistics overview
    Stats,

    /// Recent results, newest first
    History {
        #[arg(long)]
        limit: Option<u32>,
    },

    /// Show or change settings
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },

    /// Review flagged questions
    Invalid {
        #[command(subcommand)]
        action: commands::curation::InvalidAction,
    },

    /// Edit a question's prompt, options or answer
    Correct {
        id: u64,

        #[arg(long)]
        prompt: String,

        /// Option as `key=text`, repeatable
        #[arg(long = "option", value_parser = commands::curation::parse_option)]
        options: Vec<(String, String)>,

        /// Correct option letter
        #[arg(long)]
        answer: String,
    },

    /// Extra questions outside the saved test
    Extra {
        count: usize,
    },
}

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,quiz=info,services=info"));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let app = db::open(&cli.db, cli.seed).await?;

    match cli.command {
        Commands::Import { path } => commands::bank::import(&app, path.or(cli.questions)).await,
        Commands::Init => commands::stats::init(&app).await,
        Commands::Start => commands::test::start(&app).await,
        Commands::State => commands::test::state(&app).await,
        Commands::Answer { choice } => commands::test::answer(&app, choice).await,
        Commands::Next => commands::test::next(&app).await,
        Commands::Prev => commands::test::previous(&app).await,
        Commands::Pause => commands::test::pause(&app).await,
        Commands::Tick { secs } => commands::test::tick(&app, secs).await,
        Commands::MarkInvalid => commands::test::mark_invalid(&app).await,
        Commands::Review { filter } => commands::test::review(&app, &filter).await,
        Commands::Finish => commands::test::finish(&app).await,
        Commands::Discard => commands::test::discard(&app).await,
        Commands::Stats => commands::stats::overview(&app).await,
        Commands::History { limit } => commands::stats::history(&app, limit).await,
        Commands::Config { action } => commands::config::execute(&app, action).await,
        Commands::Invalid { action } => commands::curation::execute(&app, action).await,
        Commands::Correct {
            id,
            prompt,
            options,
            answer,
        } => commands::curation::correct(&app, id, &prompt, options, &answer).await,
        Commands::Extra { count } => commands::bank::extra(&app, count).await,
    }
}
