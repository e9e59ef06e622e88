mod service;
mod session;

// Public API of the test session subsystem.
pub use crate::error::SessionError;
pub use service::{FinishedTest, TestSessionService};
pub use session::{AnswerFeedback, TestProgress, TestSession};
