//! Command handlers.

pub mod analyze;
pub mod history;
pub mod task;
pub mod worker;
