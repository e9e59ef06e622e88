//! One module per command group.

pub mod bank;
pub mod config;
pub mod curation;
pub mod stats;
pub mod test;
