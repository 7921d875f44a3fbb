use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{info, warn};

use models::params::tournament::{CheckSubmissionsParams, JoinTournamentParams, StartMatchParams};
use models::protocol::ServerMessage;
use models::schemas::player::PlayerSchema;
use models::schemas::submission::{
    CheckSubmissionsSchema, StartMatchSchema, SubmissionResultSchema,
};
use models::schemas::tournament::{
    BRACKET_SIZE, CreatedTournamentSchema, TournamentSchema, TournamentStatus,
};
use oracle::{CodeforcesApi, UserSnapshot};

use crate::bracket::{self, ApplyOutcome};
use crate::error::AppError;
use crate::events::{DomainEvent, EventBus};
use crate::monitor::{
    BRACKET_POLL_INTERVAL, MatchMonitor, MonitorEvent, MonitorParams, MonitoredPlayer,
    latest_qualifying,
};
use crate::store::{SharedMap, TournamentStore};

const CODE_LENGTH: usize = 6;
const CODE_ALPHABET: [char; 36] = [
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I',
    'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z',
];

/// Cosmetic glyphs handed out by join order.
const AVATAR_GLYPHS: [&str; BRACKET_SIZE] = ["🥷", "🧙‍♂️", "⚔️", "🐉"];

fn monitor_key(code: &str, match_id: i32) -> String {
    format!("{code}:{match_id}")
}

/// Process-wide owner of tournaments. All bracket and player-list mutations
/// go through here; each one happens under the tournament's own lock and is
/// announced on the event bus afterwards.
#[derive(Clone)]
pub struct TournamentRegistry {
    store: TournamentStore,
    /// Read-through cache of judge profile lookups.
    handles: SharedMap<UserSnapshot>,
    /// Running monitors, keyed `code:match_id`.
    monitors: SharedMap<MatchMonitor>,
    oracle: CodeforcesApi,
    events: EventBus,
}

impl TournamentRegistry {
    pub fn new(oracle: CodeforcesApi, events: EventBus) -> Self {
        Self {
            store: TournamentStore::new(),
            handles: SharedMap::new(),
            monitors: SharedMap::new(),
            oracle,
            events,
        }
    }

    pub fn create(&self) -> CreatedTournamentSchema {
        let code = loop {
            let candidate = nanoid::nanoid!(CODE_LENGTH, &CODE_ALPHABET);
            if !self.store.contains(&candidate) {
                break candidate;
            }
        };

        let tournament = TournamentSchema::new(code.clone(), Utc::now());
        self.store.insert(&code, tournament.clone());
        info!(%code, "tournament created");

        CreatedTournamentSchema { code, tournament }
    }

    pub fn get(&self, code: &str) -> Result<TournamentSchema, AppError> {
        self.store
            .snapshot(code)
            .ok_or(AppError::TournamentNotFound)
    }

    /// Register a player. The 4th join seeds the bracket and flips the
    /// tournament to `ready`. The judge lookup happens before the tournament
    /// lock is taken, so a slow judge never stalls other mutations.
    pub async fn join(&self, params: JoinTournamentParams) -> Result<TournamentSchema, AppError> {
        {
            let current = self.get(&params.code)?;
            if current.players.len() >= BRACKET_SIZE {
                return Err(AppError::TournamentFull);
            }
        }

        let snapshot = self.lookup_handle(&params.handle).await?;

        let updated = self
            .store
            .with(&params.code, |tournament| {
                // revalidated under the lock: the early check raced
                if tournament.players.len() >= BRACKET_SIZE {
                    return Err(AppError::TournamentFull);
                }

                let seat = tournament.players.len();
                tournament.players.push(PlayerSchema {
                    id: seat as i32 + 1,
                    name: params.display_name.clone(),
                    handle: params.handle.clone(),
                    avatar: AVATAR_GLYPHS[seat].to_owned(),
                    rating: snapshot.rating,
                    max_rating: snapshot.max_rating,
                    rank: snapshot.rank.clone(),
                });

                if tournament.players.len() == BRACKET_SIZE {
                    tournament.bracket = Some(bracket::seed_bracket(&tournament.players));
                    tournament.status = TournamentStatus::Ready;
                }

                Ok(tournament.clone())
            })
            .ok_or(AppError::TournamentNotFound)??;

        info!(code = %params.code, player = %params.display_name, seat = updated.players.len(), "player joined");
        self.events.publish(DomainEvent::TournamentUpdated {
            code: params.code,
            tournament: updated.clone(),
        });

        Ok(updated)
    }

    async fn lookup_handle(&self, handle: &str) -> Result<UserSnapshot, AppError> {
        if let Some(hit) = self.handles.get(handle) {
            return Ok(hit);
        }
        let snapshot = self.oracle.verify_handle(handle).await?;
        self.handles.insert(handle, snapshot.clone());
        Ok(snapshot)
    }

    /// Record the match start server-side and spawn its polling monitor.
    /// Calling this again for a running or decided match is harmless.
    pub fn start_match(&self, params: StartMatchParams) -> Result<StartMatchSchema, AppError> {
        let now = Utc::now();

        let (match_state, freshly_started, monitor_params, snapshot) = self
            .store
            .with(&params.code, |tournament| {
                let bracket = tournament.bracket.as_mut().ok_or(AppError::MatchNotFound)?;
                let m = bracket
                    .find_match_mut(params.match_id)
                    .ok_or(AppError::MatchNotFound)?;

                if m.winner.is_some() {
                    return Ok((m.clone(), false, None, None));
                }
                let problem = m
                    .problem
                    .clone()
                    .ok_or(AppError::MatchNotStartable(params.match_id))?;
                let (Some(p1), Some(p2)) = (m.player1.clone(), m.player2.clone()) else {
                    return Err(AppError::MatchNotStartable(params.match_id));
                };

                let freshly_started = m.started_at.is_none();
                let started_at = *m.started_at.get_or_insert(now);
                let match_state = m.clone();

                if tournament.status == TournamentStatus::Ready {
                    tournament.status = TournamentStatus::InProgress;
                }

                let monitor_params = MonitorParams {
                    match_id: params.match_id,
                    problem,
                    started_at,
                    player1: MonitoredPlayer {
                        id: p1.id,
                        handle: p1.handle,
                    },
                    player2: MonitoredPlayer {
                        id: p2.id,
                        handle: p2.handle,
                    },
                    interval: BRACKET_POLL_INTERVAL,
                };
                Ok((
                    match_state,
                    freshly_started,
                    Some(monitor_params),
                    Some(tournament.clone()),
                ))
            })
            .ok_or(AppError::TournamentNotFound)??;

        if let Some(monitor_params) = monitor_params {
            let key = monitor_key(&params.code, params.match_id);
            if !self.monitors.contains_key(&key) {
                let (monitor, rx) = MatchMonitor::start(self.oracle.clone(), monitor_params);
                self.monitors.insert(&key, monitor);
                self.spawn_monitor_consumer(params.code.clone(), rx);
            }
        }

        if freshly_started
            && let Some(tournament) = snapshot
        {
            self.events.publish(DomainEvent::TournamentUpdated {
                code: params.code,
                tournament,
            });
        }

        let start_time_epoch_ms = match_state
            .started_at
            .map(|at| at.timestamp_millis())
            .unwrap_or_else(|| now.timestamp_millis());
        Ok(StartMatchSchema {
            match_state,
            start_time_epoch_ms,
        })
    }

    fn spawn_monitor_consumer(&self, code: String, mut rx: mpsc::UnboundedReceiver<MonitorEvent>) {
        let registry = self.clone();
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                match event {
                    MonitorEvent::Status {
                        match_id,
                        player_id,
                        status,
                        ..
                    } => {
                        registry.events.publish(DomainEvent::MatchStatus {
                            code: code.clone(),
                            match_id,
                            player_id,
                            status,
                        });
                    }
                    MonitorEvent::Accepted {
                        match_id,
                        player_id,
                    } => {
                        if let Err(err) = registry.decide_match(&code, match_id, player_id) {
                            warn!(%code, match_id, %err, "failed to record detected winner");
                        }
                    }
                }
            }
        });
    }

    /// Apply a winner through the bracket engine. A duplicate report returns
    /// `AlreadyDecided` and publishes nothing.
    pub fn decide_match(
        &self,
        code: &str,
        match_id: i32,
        winner_id: i32,
    ) -> Result<ApplyOutcome, AppError> {
        let (outcome, decided) = self
            .store
            .with(code, |tournament| {
                let Some(bracket) = tournament.bracket.as_mut() else {
                    return (ApplyOutcome::UnknownMatch, None);
                };
                let outcome = bracket::apply_winner(bracket, match_id, winner_id);
                if outcome != ApplyOutcome::Applied {
                    return (outcome, None);
                }
                if bracket::is_complete(bracket) {
                    tournament.status = TournamentStatus::Complete;
                }
                let winner = bracket
                    .find_match(match_id)
                    .and_then(|m| m.winner.clone());
                (outcome, winner.map(|w| (w, tournament.clone())))
            })
            .ok_or(AppError::TournamentNotFound)?;

        if let Some((winner, tournament)) = decided {
            info!(%code, match_id, winner = %winner.name, "match decided");
            // one-shot winner event plus the usual snapshot push
            self.events.publish(DomainEvent::MatchDecided {
                code: code.to_owned(),
                match_id,
                winner,
                tournament: tournament.clone(),
            });
            self.events.publish(DomainEvent::TournamentUpdated {
                code: code.to_owned(),
                tournament,
            });

            if let Some(monitor) = self.monitors.remove(&monitor_key(code, match_id)) {
                monitor.stop();
            }
        }

        Ok(outcome)
    }

    /// Pull-based submission check for a match, the bracket UI's alternative
    /// to the push monitor. Judge calls happen with no lock held; a failed
    /// fetch for one player never blocks the other's.
    pub async fn check_submissions(
        &self,
        params: CheckSubmissionsParams,
    ) -> Result<CheckSubmissionsSchema, AppError> {
        let started_at = DateTime::from_timestamp_millis(params.match_start_time_epoch_ms)
            .unwrap_or(DateTime::UNIX_EPOCH);

        let (problem, players) = {
            let tournament = self.get(&params.code)?;
            let bracket = tournament.bracket.as_ref().ok_or(AppError::MatchNotFound)?;
            let m = bracket
                .find_match(params.match_id)
                .ok_or(AppError::MatchNotFound)?;
            let problem = m
                .problem
                .clone()
                .ok_or(AppError::MatchNotStartable(params.match_id))?;
            let (Some(p1), Some(p2)) = (m.player1.clone(), m.player2.clone()) else {
                return Err(AppError::MatchNotStartable(params.match_id));
            };
            (problem, [p1, p2])
        };

        let (first, second) = tokio::join!(
            self.oracle.fetch_recent_submissions(&players[0].handle),
            self.oracle.fetch_recent_submissions(&players[1].handle),
        );

        let mut results = BTreeMap::new();
        for (player, fetched) in players.iter().zip([first, second]) {
            let submissions = match fetched {
                Ok(submissions) => submissions,
                Err(err) => {
                    warn!(handle = %player.handle, %err, "submission check failed");
                    continue;
                }
            };
            let Some(latest) = latest_qualifying(&submissions, &problem, started_at) else {
                continue;
            };

            results.insert(
                player.id,
                SubmissionResultSchema {
                    verdict: latest.verdict.as_ref().map(|v| v.as_str().to_owned()),
                    time: latest.submitted_at.timestamp_millis(),
                    language: latest.language.clone(),
                    submission_id: latest.id,
                },
            );

            if latest.verdict.as_ref().is_some_and(|v| v.is_accepted()) {
                // idempotency-guarded: a second accepted player in the same
                // sweep becomes a no-op
                self.decide_match(&params.code, params.match_id, player.id)?;
            }
        }

        let match_state = self
            .get(&params.code)?
            .bracket
            .as_ref()
            .and_then(|b| b.find_match(params.match_id))
            .cloned()
            .ok_or(AppError::MatchNotFound)?;

        Ok(CheckSubmissionsSchema {
            results,
            match_state,
        })
    }
}

/// Live realtime connections: tournament code → participant id → outbound
/// channel. Entries exist only while the socket is up; delivery is
/// best-effort, at-most-once.
#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    connections: SharedMap<HashMap<i32, mpsc::UnboundedSender<ServerMessage>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: SharedMap::new(),
        }
    }

    pub fn register(
        &self,
        code: &str,
        participant_id: i32,
        tx: mpsc::UnboundedSender<ServerMessage>,
    ) {
        self.connections
            .update_or_default(code, |peers| peers.insert(participant_id, tx));
    }

    pub fn remove(&self, code: &str, participant_id: i32) {
        self.connections.update(code, |peers| {
            peers.remove(&participant_id);
        });
    }

    pub fn count(&self, code: &str) -> usize {
        self.connections
            .get(code)
            .map(|peers| peers.len())
            .unwrap_or(0)
    }

    /// Push to everyone subscribed to this tournament. Closed channels are
    /// pruned on the way through.
    pub fn broadcast(&self, code: &str, message: &ServerMessage) {
        let Some(peers) = self.connections.get(code) else {
            return;
        };
        for (participant_id, tx) in peers {
            if tx.send(message.clone()).is_err() {
                self.remove(code, participant_id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::schemas::submission::SubmissionStatus;

    fn registry() -> TournamentRegistry {
        TournamentRegistry::new(CodeforcesApi::default(), EventBus::new())
    }

    #[test]
    fn create_issues_unique_six_char_codes() {
        let registry = registry();
        let a = registry.create();
        let b = registry.create();

        assert_eq!(a.code.len(), CODE_LENGTH);
        assert!(a.code.chars().all(|c| CODE_ALPHABET.contains(&c)));
        assert_ne!(a.code, b.code);
        assert_eq!(a.tournament.status, TournamentStatus::Waiting);
        assert!(a.tournament.players.is_empty());
        assert!(a.tournament.bracket.is_none());
    }

    #[test]
    fn get_unknown_code_is_not_found() {
        let registry = registry();
        assert!(matches!(
            registry.get("NOPE42"),
            Err(AppError::TournamentNotFound)
        ));
    }

    #[test]
    fn connection_registry_prunes_closed_channels() {
        let connections = ConnectionRegistry::new();
        let (tx, rx) = mpsc::unbounded_channel();
        connections.register("AB12CD", 1, tx);
        assert_eq!(connections.count("AB12CD"), 1);

        drop(rx);
        connections.broadcast(
            "AB12CD",
            &ServerMessage::MatchStatus {
                match_id: 1,
                player_id: 1,
                status: SubmissionStatus::Waiting,
            },
        );
        assert_eq!(connections.count("AB12CD"), 0);
    }
}
