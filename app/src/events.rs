use tokio::sync::broadcast;

use models::schemas::{
    player::PlayerSchema, submission::SubmissionStatus, tournament::TournamentSchema,
};

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// What the registry and bracket engine announce. The gateway subscribes and
/// translates these into transport pushes; nothing in here knows about
/// websockets.
#[derive(Clone, Debug)]
pub enum DomainEvent {
    TournamentUpdated {
        code: String,
        tournament: TournamentSchema,
    },
    MatchDecided {
        code: String,
        match_id: i32,
        winner: PlayerSchema,
        tournament: TournamentSchema,
    },
    MatchStatus {
        code: String,
        match_id: i32,
        player_id: i32,
        status: SubmissionStatus,
    },
}

impl DomainEvent {
    pub fn code(&self) -> &str {
        match self {
            DomainEvent::TournamentUpdated { code, .. }
            | DomainEvent::MatchDecided { code, .. }
            | DomainEvent::MatchStatus { code, .. } => code,
        }
    }
}

#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<DomainEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Fire-and-forget: an event with no live subscriber is simply dropped.
    pub fn publish(&self, event: DomainEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
