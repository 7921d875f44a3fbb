use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::bracket::MatchSchema;

/// A participant's standing on the current match problem, as derived from
/// their most recent qualifying submission.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    /// No qualifying submission yet.
    Waiting,
    /// Submitted, verdict not yet known.
    Submitted,
    /// The judge is running tests.
    Testing,
    Accepted,
    /// Any terminal verdict other than accepted.
    Wrong,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResultSchema {
    /// Raw judge verdict string; absent while the submission is in queue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verdict: Option<String>,
    /// Submission time, epoch milliseconds.
    pub time: i64,
    pub language: String,
    pub submission_id: u64,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CheckSubmissionsSchema {
    pub results: BTreeMap<i32, SubmissionResultSchema>,
    #[serde(rename = "match")]
    pub match_state: MatchSchema,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct StartMatchSchema {
    #[serde(rename = "match")]
    pub match_state: MatchSchema,
    pub start_time_epoch_ms: i64,
}
