#![forbid(unsafe_code)]

pub mod app_services;
pub mod curation_service;
pub mod error;
pub mod quiz_service;
pub mod sessions;
pub mod settings_service;
pub mod stats_service;

pub use quiz_core::Clock;

pub use app_services::AppServices;
pub use curation_service::{CurationService, InvalidQuestion};
pub use error::{
    AppServicesError, CurationError, QuizServiceError, SessionError, SettingsServiceError,
    StatsServiceError,
};
pub use quiz_service::QuizService;
pub use sessions::{AnswerFeedback, FinishedTest, TestProgress, TestSession, TestSessionService};
pub use settings_service::SettingsService;
pub use stats_service::{CategoryBreakdown, InitOverview, StatsOverview, StatsService};
