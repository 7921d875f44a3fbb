use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{player::PlayerSchema, problem::ProblemSchema};

pub const SEMIFINAL_1: i32 = 1;
pub const SEMIFINAL_2: i32 = 2;
pub const CONSOLATION_1: i32 = 3;
pub const CONSOLATION_2: i32 = 4;
pub const FINAL: i32 = 5;

/// Where a match sits in its lifecycle. Derived from the populated fields,
/// never stored.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MatchPhase {
    Pending,
    Ready,
    Active,
    Decided,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MatchSchema {
    pub id: i32,
    pub player1: Option<PlayerSchema>,
    pub player2: Option<PlayerSchema>,
    /// Set at most once; always one of the two participants.
    pub winner: Option<PlayerSchema>,
    pub problem: Option<ProblemSchema>,
    pub started_at: Option<DateTime<Utc>>,
}

impl MatchSchema {
    pub fn open(id: i32) -> Self {
        Self {
            id,
            player1: None,
            player2: None,
            winner: None,
            problem: None,
            started_at: None,
        }
    }

    pub fn phase(&self) -> MatchPhase {
        if self.winner.is_some() {
            MatchPhase::Decided
        } else if self.player1.is_none() || self.player2.is_none() {
            MatchPhase::Pending
        } else if self.problem.is_some() {
            MatchPhase::Active
        } else {
            MatchPhase::Ready
        }
    }

    pub fn has_player(&self, player_id: i32) -> bool {
        self.player1.as_ref().is_some_and(|p| p.id == player_id)
            || self.player2.as_ref().is_some_and(|p| p.id == player_id)
    }
}

/// The fixed 5-match tree for 4 players: two semifinals, two consolation
/// feeders (3rd-place path) and the final.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BracketSchema {
    pub semifinals: Vec<MatchSchema>,
    pub consolation: Vec<MatchSchema>,
    pub finals: MatchSchema,
}

impl BracketSchema {
    pub fn find_match(&self, match_id: i32) -> Option<&MatchSchema> {
        self.matches().find(|m| m.id == match_id)
    }

    pub fn find_match_mut(&mut self, match_id: i32) -> Option<&mut MatchSchema> {
        self.semifinals
            .iter_mut()
            .chain(self.consolation.iter_mut())
            .chain(std::iter::once(&mut self.finals))
            .find(|m| m.id == match_id)
    }

    pub fn matches(&self) -> impl Iterator<Item = &MatchSchema> {
        self.semifinals
            .iter()
            .chain(self.consolation.iter())
            .chain(std::iter::once(&self.finals))
    }
}
