//! Domain model and pure algorithms for the exam-prep quiz.
//!
//! Nothing in this crate touches storage. Callers pass in the current time
//! and a random source.

pub mod error;
pub mod grading;
pub mod model;
pub mod selection;
pub mod time;

pub use error::Error;
pub use time::Clock;
