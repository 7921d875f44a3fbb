//! Judge wire types, deserialized as-is and mapped into the clean domain
//! types in `lib.rs`. Every field the judge may omit defaults.

use serde::Deserialize;

/// Every judge endpoint wraps its payload in this envelope. `status` is
/// `"OK"` or `"FAILED"`; on failure `comment` explains why.
#[derive(Deserialize, Debug)]
pub(crate) struct CfEnvelope<T> {
    pub status: String,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub result: Option<T>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CfSubmission {
    pub id: u64,
    #[serde(default)]
    pub creation_time_seconds: i64,
    #[serde(default)]
    pub problem: CfProblem,
    #[serde(default)]
    pub verdict: Option<String>,
    #[serde(default)]
    pub programming_language: String,
    #[serde(default)]
    pub passed_test_count: Option<i32>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CfProblem {
    #[serde(default)]
    pub contest_id: Option<u32>,
    #[serde(default)]
    pub index: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub rating: Option<u32>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CfUser {
    pub handle: String,
    #[serde(default)]
    pub rating: Option<i32>,
    #[serde(default)]
    pub max_rating: Option<i32>,
    #[serde(default)]
    pub rank: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub(crate) struct CfProblemset {
    #[serde(default)]
    pub problems: Vec<CfProblem>,
}
