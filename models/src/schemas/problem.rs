use serde::{Deserialize, Serialize};

/// A judge problem reference: enough to build a problem URL and to match
/// submissions against it.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProblemSchema {
    pub contest: u32,
    pub index: String,
    pub name: String,
    pub rating: u32,
}

impl ProblemSchema {
    pub fn matches(&self, contest: u32, index: &str) -> bool {
        self.contest == contest && self.index == index
    }
}
