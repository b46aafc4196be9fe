use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DemoError {
    #[error("at least one writer is required")]
    NoWriters,
    /// Every writer was done, yet the reader didn't see the stop flag raised
    /// within `waited` after that.
    #[error("reader still spinning {waited:?} after the writers finished, last seen value {last_seen:?}")]
    ReaderTimedOut {
        waited: Duration,
        last_seen: Option<usize>,
    },
    #[error("{task} thread panicked")]
    TaskPanicked { task: &'static str },
}
