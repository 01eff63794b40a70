use quorum_db::DbError;
use thiserror::Error;

use crate::validation::ValidationError;

/// Every way a poll action can fail. The `Display` text is the message shown
/// to the caller.
#[derive(Debug, Error)]
pub enum PollError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{0}")]
    Unauthenticated(&'static str),
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("Poll not found.")]
    NotFound,
    #[error("Invalid option selected.")]
    InvalidOption,
    #[error("You have already voted on this poll.")]
    AlreadyVoted,
    /// Failure reported by the data backend, forwarded verbatim.
    #[error("{0}")]
    Backend(String),
}

impl From<DbError> for PollError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound => PollError::NotFound,
            DbError::Sqlx(err) => PollError::Backend(err.to_string()),
            DbError::Conflict(msg) => PollError::Backend(msg),
        }
    }
}
