use std::fmt;

use oracle::OracleError;

/// Domain failures surfaced to callers. Transient oracle trouble keeps its
/// own variant so request handlers can map it to a retryable status instead
/// of a user mistake.
#[derive(Debug)]
pub enum AppError {
    TournamentNotFound,
    MatchNotFound,
    TournamentFull,
    InvalidHandle(String),
    MatchNotStartable(i32),
    Oracle(OracleError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::TournamentNotFound => write!(f, "Tournament not found"),
            AppError::MatchNotFound => write!(f, "Match not found"),
            AppError::TournamentFull => write!(f, "Tournament is full"),
            AppError::InvalidHandle(handle) => {
                write!(f, "Invalid Codeforces handle: {handle}")
            }
            AppError::MatchNotStartable(match_id) => {
                write!(f, "Match {match_id} does not have both participants yet")
            }
            AppError::Oracle(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Oracle(err) => Some(err),
            _ => None,
        }
    }
}

impl From<OracleError> for AppError {
    fn from(err: OracleError) -> Self {
        match err {
            OracleError::UnknownHandle(handle) => AppError::InvalidHandle(handle),
            other => AppError::Oracle(other),
        }
    }
}
