//! Read-only client for the external judge (Codeforces). The judge is
//! authoritative but eventually consistent and rate-limited; every call here
//! is side-effect-free and safe to retry on the next poll tick.

mod client;
mod wire;

pub use client::{CodeforcesApi, Difficulty, OracleError, OracleResult};

use chrono::{DateTime, Utc};

/// One judged attempt from a participant's recent history.
#[derive(Clone, Debug, PartialEq)]
pub struct SubmissionRecord {
    pub id: u64,
    pub contest_id: Option<u32>,
    pub index: String,
    /// Absent while the submission is still in the judge's queue.
    pub verdict: Option<Verdict>,
    pub submitted_at: DateTime<Utc>,
    pub language: String,
    pub passed_tests: i32,
}

impl SubmissionRecord {
    pub fn is_for(&self, contest_id: u32, index: &str) -> bool {
        self.contest_id == Some(contest_id) && self.index == index
    }
}

/// The judge's classification of a single submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    WrongAnswer,
    TimeLimitExceeded,
    MemoryLimitExceeded,
    RuntimeError,
    CompilationError,
    Testing,
    /// Anything the judge emits that we do not model individually.
    Other(String),
}

impl Verdict {
    pub fn parse(s: &str) -> Verdict {
        match s {
            "OK" => Verdict::Accepted,
            "WRONG_ANSWER" => Verdict::WrongAnswer,
            "TIME_LIMIT_EXCEEDED" => Verdict::TimeLimitExceeded,
            "MEMORY_LIMIT_EXCEEDED" => Verdict::MemoryLimitExceeded,
            "RUNTIME_ERROR" => Verdict::RuntimeError,
            "COMPILATION_ERROR" => Verdict::CompilationError,
            "TESTING" => Verdict::Testing,
            other => Verdict::Other(other.to_owned()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Verdict::Accepted => "OK",
            Verdict::WrongAnswer => "WRONG_ANSWER",
            Verdict::TimeLimitExceeded => "TIME_LIMIT_EXCEEDED",
            Verdict::MemoryLimitExceeded => "MEMORY_LIMIT_EXCEEDED",
            Verdict::RuntimeError => "RUNTIME_ERROR",
            Verdict::CompilationError => "COMPILATION_ERROR",
            Verdict::Testing => "TESTING",
            Verdict::Other(s) => s,
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted)
    }
}

/// Public profile statistics, snapshotted at join time.
#[derive(Clone, Debug, PartialEq)]
pub struct UserSnapshot {
    pub handle: String,
    pub rating: i32,
    pub max_rating: i32,
    pub rank: String,
}

/// A problem drawn from the judge's public problemset.
#[derive(Clone, Debug, PartialEq)]
pub struct CandidateProblem {
    pub contest_id: u32,
    pub index: String,
    pub name: String,
    pub rating: u32,
}
