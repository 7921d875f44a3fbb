use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct JoinTournamentParams {
    pub code: String,
    pub display_name: String,
    pub handle: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CheckSubmissionsParams {
    pub code: String,
    pub match_id: i32,
    /// Match start as held by the caller, epoch milliseconds. Submissions
    /// older than this never count.
    pub match_start_time_epoch_ms: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct StartMatchParams {
    pub code: String,
    pub match_id: i32,
}
