use std::fmt;
use std::time::Duration;

use rand::seq::IndexedRandom;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::wire::{CfEnvelope, CfProblemset, CfSubmission, CfUser};
use crate::{CandidateProblem, SubmissionRecord, UserSnapshot, Verdict};

pub type OracleResult<T> = Result<T, OracleError>;

const DEFAULT_BASE_URL: &str = "https://codeforces.com/api";
const RECENT_WINDOW: usize = 20;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug)]
pub enum OracleError {
    /// Network failure or an unparseable response. Retry next tick.
    Unreachable(String),
    /// The judge signalled call-quota exhaustion. Retry next tick.
    RateLimited,
    /// Conclusive: the judge does not know this handle.
    UnknownHandle(String),
    /// The judge answered `FAILED` for a reason we do not model.
    Api(String),
}

impl fmt::Display for OracleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OracleError::Unreachable(msg) => write!(f, "judge unreachable: {msg}"),
            OracleError::RateLimited => write!(f, "judge rate limit exceeded"),
            OracleError::UnknownHandle(handle) => write!(f, "unknown handle: {handle}"),
            OracleError::Api(msg) => write!(f, "judge error: {msg}"),
        }
    }
}

impl std::error::Error for OracleError {}

impl OracleError {
    /// Everything except a conclusive unknown-handle answer is transient.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, OracleError::UnknownHandle(_))
    }
}

/// Difficulty bands for drawing a problem from the judge's public set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Expert,
}

impl Difficulty {
    fn rating_band(self) -> (u32, u32) {
        match self {
            Difficulty::Easy => (800, 1200),
            Difficulty::Medium => (1200, 1600),
            Difficulty::Hard => (1600, 2000),
            Difficulty::Expert => (2000, 2400),
        }
    }
}

/// Judge API client. Cheap to clone; all methods are read-only.
#[derive(Debug, Clone)]
pub struct CodeforcesApi {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl Default for CodeforcesApi {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl CodeforcesApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .user_agent("gauntlet/0.1 (bracket coordinator)")
                .build()
                .unwrap_or_default(),
            base_url: base_url.into(),
            timeout: REQUEST_TIMEOUT,
        }
    }

    /// A participant's most recent judged attempts, newest first.
    pub async fn fetch_recent_submissions(
        &self,
        handle: &str,
    ) -> OracleResult<Vec<SubmissionRecord>> {
        let url = format!(
            "{}/user.status?handle={handle}&from=1&count={RECENT_WINDOW}",
            self.base_url
        );
        let raw: Vec<CfSubmission> = self.get_envelope(&url).await?;
        Ok(raw.into_iter().map(map_submission).collect())
    }

    /// Resolve a handle to its public profile snapshot. Only the judge's own
    /// handle-not-found answer is conclusive; transient failures must never
    /// be read as nonexistence.
    pub async fn verify_handle(&self, handle: &str) -> OracleResult<UserSnapshot> {
        let url = format!("{}/user.info?handles={handle}", self.base_url);
        let users: Vec<CfUser> = match self.get_envelope(&url).await {
            Err(OracleError::Api(comment)) if comment.contains("not found") => {
                return Err(OracleError::UnknownHandle(handle.to_owned()));
            }
            other => other?,
        };
        users
            .into_iter()
            .next()
            .map(map_user)
            .ok_or_else(|| OracleError::UnknownHandle(handle.to_owned()))
    }

    /// Draw a uniformly random problem from the judge's public problemset
    /// within the given difficulty band, skipping `*special` problems.
    pub async fn random_problem(&self, difficulty: Difficulty) -> OracleResult<CandidateProblem> {
        let url = format!("{}/problemset.problems", self.base_url);
        let set: CfProblemset = self.get_envelope(&url).await?;

        let (min_rating, max_rating) = difficulty.rating_band();
        let eligible: Vec<_> = set
            .problems
            .into_iter()
            .filter(|p| {
                p.contest_id.is_some()
                    && p.rating
                        .is_some_and(|r| r >= min_rating && r <= max_rating)
                    && !p.tags.iter().any(|t| t == "*special")
            })
            .collect();

        let mut rng = rand::rng();
        let picked = eligible
            .choose(&mut rng)
            .ok_or_else(|| OracleError::Api("no problems in the requested band".to_owned()))?;

        Ok(CandidateProblem {
            contest_id: picked.contest_id.unwrap_or_default(),
            index: picked.index.clone(),
            name: picked.name.clone(),
            rating: picked.rating.unwrap_or_default(),
        })
    }

    async fn get_envelope<T: DeserializeOwned + Default>(&self, url: &str) -> OracleResult<T> {
        debug!(%url, "querying judge");
        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| OracleError::Unreachable(e.to_string()))?;

        let status = response.status();
        if status.as_u16() == 429 || status.as_u16() == 503 {
            return Err(OracleError::RateLimited);
        }

        // The judge answers client errors with a JSON envelope carrying the
        // reason in `comment`, so parse the body before judging the status.
        let envelope: CfEnvelope<T> = response
            .json()
            .await
            .map_err(|e| OracleError::Unreachable(format!("bad response: {e}")))?;

        if envelope.status != "OK" {
            let comment = envelope.comment.unwrap_or_else(|| status.to_string());
            if comment.contains("limit exceeded") {
                return Err(OracleError::RateLimited);
            }
            return Err(OracleError::Api(comment));
        }

        envelope
            .result
            .ok_or_else(|| OracleError::Unreachable("empty result".to_owned()))
    }
}

fn map_submission(raw: CfSubmission) -> SubmissionRecord {
    SubmissionRecord {
        id: raw.id,
        contest_id: raw.problem.contest_id,
        index: raw.problem.index,
        verdict: raw.verdict.as_deref().map(Verdict::parse),
        submitted_at: chrono::DateTime::from_timestamp(raw.creation_time_seconds, 0)
            .unwrap_or(chrono::DateTime::UNIX_EPOCH),
        language: raw.programming_language,
        passed_tests: raw.passed_test_count.unwrap_or(0),
    }
}

fn map_user(raw: CfUser) -> UserSnapshot {
    UserSnapshot {
        handle: raw.handle,
        rating: raw.rating.unwrap_or(0),
        max_rating: raw.max_rating.unwrap_or(0),
        rank: raw.rank.unwrap_or_else(|| "unrated".to_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn submissions_body() -> &'static str {
        r#"{
            "status": "OK",
            "result": [
                {
                    "id": 42001,
                    "creationTimeSeconds": 1690000000,
                    "problem": { "contestId": 1850, "index": "A", "name": "To My Critics", "rating": 800 },
                    "verdict": "OK",
                    "programmingLanguage": "GNU C++20",
                    "passedTestCount": 14
                },
                {
                    "id": 42000,
                    "creationTimeSeconds": 1689990000,
                    "problem": { "contestId": 1850, "index": "A", "name": "To My Critics", "rating": 800 },
                    "verdict": "WRONG_ANSWER",
                    "programmingLanguage": "PyPy 3",
                    "passedTestCount": 3
                },
                {
                    "id": 41999,
                    "creationTimeSeconds": 1689980000,
                    "problem": { "contestId": 1600, "index": "B" },
                    "programmingLanguage": "Rust"
                }
            ]
        }"#
    }

    #[tokio::test]
    async fn submissions_map_to_domain_records() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/user.status")
            .match_query(Matcher::UrlEncoded("handle".into(), "tourist".into()))
            .with_body(submissions_body())
            .create_async()
            .await;

        let api = CodeforcesApi::new(server.url());
        let subs = api.fetch_recent_submissions("tourist").await.unwrap();

        assert_eq!(subs.len(), 3);
        assert_eq!(subs[0].id, 42001);
        assert_eq!(subs[0].verdict, Some(Verdict::Accepted));
        assert_eq!(subs[0].passed_tests, 14);
        assert!(subs[0].is_for(1850, "A"));
        assert_eq!(subs[1].verdict, Some(Verdict::WrongAnswer));
        assert_eq!(subs[2].verdict, None, "queued submission has no verdict");
        assert_eq!(subs[2].passed_tests, 0);
    }

    #[tokio::test]
    async fn verify_handle_maps_profile_with_defaults() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/user.info")
            .match_query(Matcher::Any)
            .with_body(r#"{ "status": "OK", "result": [ { "handle": "newcomer" } ] }"#)
            .create_async()
            .await;

        let api = CodeforcesApi::new(server.url());
        let user = api.verify_handle("newcomer").await.unwrap();
        assert_eq!(user.handle, "newcomer");
        assert_eq!(user.rating, 0);
        assert_eq!(user.max_rating, 0);
        assert_eq!(user.rank, "unrated");
    }

    #[tokio::test]
    async fn unknown_handle_is_conclusive() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/user.info")
            .match_query(Matcher::Any)
            .with_status(400)
            .with_body(
                r#"{ "status": "FAILED", "comment": "handles: User with handle ghost not found" }"#,
            )
            .create_async()
            .await;

        let api = CodeforcesApi::new(server.url());
        let err = api.verify_handle("ghost").await.unwrap_err();
        assert!(matches!(err, OracleError::UnknownHandle(ref h) if h == "ghost"));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn quota_exhaustion_is_rate_limited() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/user.status")
            .match_query(Matcher::Any)
            .with_body(r#"{ "status": "FAILED", "comment": "Call limit exceeded" }"#)
            .create_async()
            .await;

        let api = CodeforcesApi::new(server.url());
        let err = api.fetch_recent_submissions("anyone").await.unwrap_err();
        assert!(matches!(err, OracleError::RateLimited));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn overloaded_judge_is_rate_limited() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/user.status")
            .match_query(Matcher::Any)
            .with_status(503)
            .create_async()
            .await;

        let api = CodeforcesApi::new(server.url());
        let err = api.fetch_recent_submissions("anyone").await.unwrap_err();
        assert!(matches!(err, OracleError::RateLimited));
    }

    #[tokio::test]
    async fn random_problem_respects_band_and_special_tag() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/problemset.problems")
            .with_body(
                r#"{
                    "status": "OK",
                    "result": {
                        "problems": [
                            { "contestId": 1, "index": "A", "name": "in band", "rating": 1000, "tags": [] },
                            { "contestId": 2, "index": "B", "name": "special", "rating": 1000, "tags": ["*special"] },
                            { "contestId": 3, "index": "C", "name": "too hard", "rating": 2600, "tags": [] },
                            { "index": "D", "name": "no contest", "rating": 1000, "tags": [] }
                        ]
                    }
                }"#,
            )
            .create_async()
            .await;

        let api = CodeforcesApi::new(server.url());
        let problem = api.random_problem(Difficulty::Easy).await.unwrap();
        assert_eq!(problem.contest_id, 1);
        assert_eq!(problem.name, "in band");
    }

    #[test]
    fn verdict_parse_round_trips_known_strings() {
        assert_eq!(Verdict::parse("OK"), Verdict::Accepted);
        assert_eq!(Verdict::parse("TESTING"), Verdict::Testing);
        assert_eq!(Verdict::parse("WRONG_ANSWER"), Verdict::WrongAnswer);
        assert_eq!(
            Verdict::parse("CHALLENGED"),
            Verdict::Other("CHALLENGED".to_owned())
        );
        assert_eq!(Verdict::parse("OK").as_str(), "OK");
    }
}
