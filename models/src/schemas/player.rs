use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSchema {
    /// Seat number, 1-based, assigned in join order. Stable for the
    /// tournament's lifetime.
    pub id: i32,
    pub name: String,
    /// Identity on the judge, as typed at join time.
    pub handle: String,
    pub avatar: String,
    pub rating: i32,
    pub max_rating: i32,
    pub rank: String,
}
