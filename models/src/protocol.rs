use serde::{Deserialize, Serialize};

use crate::schemas::{
    player::PlayerSchema, submission::SubmissionStatus, tournament::TournamentSchema,
};

/// Messages a spectator/participant sends over the realtime channel.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientMessage {
    #[serde(rename_all = "camelCase")]
    JoinTournament {
        tournament_code: String,
        participant_id: i32,
    },
}

/// Pushes the gateway sends. Every mutation broadcasts a full
/// `TournamentUpdate` snapshot; a decided match additionally gets a one-shot
/// `MatchWinner` so the UI does not have to diff.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerMessage {
    #[serde(rename_all = "camelCase")]
    TournamentUpdate { tournament: TournamentSchema },
    #[serde(rename_all = "camelCase")]
    MatchWinner {
        match_id: i32,
        winner: PlayerSchema,
        tournament: TournamentSchema,
    },
    #[serde(rename_all = "camelCase")]
    MatchStatus {
        match_id: i32,
        player_id: i32,
        status: SubmissionStatus,
    },
}
