use oracle::CodeforcesApi;

use crate::config::Config;
use crate::events::EventBus;
use crate::registry::{ConnectionRegistry, TournamentRegistry};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub registry: TournamentRegistry,
    pub connections: ConnectionRegistry,
    pub events: EventBus,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let events = EventBus::new();
        let oracle = CodeforcesApi::new(config.oracle_base_url.clone());
        Self {
            config,
            registry: TournamentRegistry::new(oracle, events.clone()),
            connections: ConnectionRegistry::new(),
            events,
        }
    }
}
