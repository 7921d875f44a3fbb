use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{bracket::BracketSchema, player::PlayerSchema};

pub const BRACKET_SIZE: usize = 4;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum TournamentStatus {
    Waiting,
    Ready,
    InProgress,
    Complete,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct TournamentSchema {
    /// Short public code, generated at creation, immutable.
    pub code: String,
    pub status: TournamentStatus,
    /// Join order is seed order. Never exceeds [`BRACKET_SIZE`].
    pub players: Vec<PlayerSchema>,
    pub bracket: Option<BracketSchema>,
    pub created_at: DateTime<Utc>,
}

impl TournamentSchema {
    pub fn new(code: String, created_at: DateTime<Utc>) -> Self {
        Self {
            code,
            status: TournamentStatus::Waiting,
            players: Vec::new(),
            bracket: None,
            created_at,
        }
    }

    pub fn player(&self, player_id: i32) -> Option<&PlayerSchema> {
        self.players.iter().find(|p| p.id == player_id)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CreatedTournamentSchema {
    pub code: String,
    pub tournament: TournamentSchema,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct TournamentEnvelope {
    pub tournament: TournamentSchema,
}
