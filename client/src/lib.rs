//! Synchronization shim for presentation layers: typed request/response
//! calls against the coordinator plus a reconnecting subscription to gateway
//! pushes. Consumers see decoded schemas and a stream of [`GatewayEvent`]s;
//! the wire stays in here.

use std::fmt;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::debug;

use models::params::tournament::{CheckSubmissionsParams, JoinTournamentParams, StartMatchParams};
use models::protocol::{ClientMessage, ServerMessage};
use models::schemas::submission::{CheckSubmissionsSchema, StartMatchSchema};
use models::schemas::tournament::{CreatedTournamentSchema, TournamentEnvelope, TournamentSchema};

const RECONNECT_DELAY: Duration = Duration::from_secs(2);
const EVENT_BUFFER: usize = 64;

#[derive(Debug)]
pub enum ClientError {
    /// Could not reach the coordinator or read its response.
    Transport(String),
    /// The coordinator answered with a semantic `{"error": ...}` body.
    Rejected { status: u16, message: String },
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Transport(msg) => write!(f, "transport error: {msg}"),
            ClientError::Rejected { status, message } => {
                write!(f, "rejected ({status}): {message}")
            }
        }
    }
}

impl std::error::Error for ClientError {}

#[derive(Debug, Clone)]
pub enum GatewayEvent {
    Connected,
    Disconnected,
    Message(ServerMessage),
    Error(String),
}

#[derive(Debug, Clone)]
pub struct TournamentClient {
    http: reqwest::Client,
    api_base: String,
    ws_url: String,
}

impl TournamentClient {
    /// `api_base` like `http://localhost:3001`, `ws_url` like
    /// `ws://localhost:3001/ws`.
    pub fn new(api_base: impl Into<String>, ws_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: api_base.into(),
            ws_url: ws_url.into(),
        }
    }

    /// Addresses from `GATEWAY_BASE_URL` (default `http://localhost:3001`);
    /// the push endpoint is derived from the same base.
    pub fn from_env() -> Self {
        let api_base = std::env::var("GATEWAY_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:3001".to_owned());
        let ws_url = format!("{}/ws", api_base.replacen("http", "ws", 1));
        Self::new(api_base, ws_url)
    }

    pub async fn create_tournament(&self) -> Result<CreatedTournamentSchema, ClientError> {
        let response = self
            .http
            .post(format!("{}/api/tournament/create", self.api_base))
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        Self::decode(response).await
    }

    pub async fn join_tournament(
        &self,
        params: &JoinTournamentParams,
    ) -> Result<TournamentSchema, ClientError> {
        let envelope: TournamentEnvelope = self.post_json("/api/tournament/join", params).await?;
        Ok(envelope.tournament)
    }

    pub async fn get_tournament(&self, code: &str) -> Result<TournamentSchema, ClientError> {
        let response = self
            .http
            .get(format!("{}/api/tournament/{code}", self.api_base))
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        let envelope: TournamentEnvelope = Self::decode(response).await?;
        Ok(envelope.tournament)
    }

    pub async fn check_submissions(
        &self,
        params: &CheckSubmissionsParams,
    ) -> Result<CheckSubmissionsSchema, ClientError> {
        self.post_json("/api/tournament/check-submissions", params)
            .await
    }

    pub async fn start_match(
        &self,
        params: &StartMatchParams,
    ) -> Result<StartMatchSchema, ClientError> {
        self.post_json("/api/tournament/start-match", params).await
    }

    /// Subscribe to pushes for a tournament. The worker reconnects with a
    /// fixed backoff and re-announces itself after every connect, since the
    /// gateway keeps no state for connections it has lost. Dropping the
    /// returned subscription stops the worker.
    pub fn subscribe(&self, tournament_code: &str, participant_id: i32) -> Subscription {
        let (events, receiver) = mpsc::channel(EVENT_BUFFER);
        let worker = SubscriptionWorker {
            url: self.ws_url.clone(),
            tournament_code: tournament_code.to_owned(),
            participant_id,
            events,
        };
        let handle = tokio::spawn(worker.run());
        Subscription {
            events: receiver,
            handle,
        }
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let response = self
            .http
            .post(format!("{}{path}", self.api_base))
            .json(body)
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
        #[derive(serde::Deserialize)]
        struct ErrorBody {
            error: String,
        }

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .map(|body| body.error)
                .unwrap_or_else(|_| status.to_string());
            return Err(ClientError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::Transport(format!("bad response body: {e}")))
    }
}

pub struct Subscription {
    events: mpsc::Receiver<GatewayEvent>,
    handle: tokio::task::JoinHandle<()>,
}

impl Subscription {
    pub async fn next_event(&mut self) -> Option<GatewayEvent> {
        self.events.recv().await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

struct SubscriptionWorker {
    url: String,
    tournament_code: String,
    participant_id: i32,
    events: mpsc::Sender<GatewayEvent>,
}

impl SubscriptionWorker {
    async fn run(self) {
        loop {
            match connect_async(self.url.as_str()).await {
                Ok((stream, _)) => {
                    if self.events.send(GatewayEvent::Connected).await.is_err() {
                        return;
                    }
                    let (mut write, mut read) = stream.split();

                    let join = ClientMessage::JoinTournament {
                        tournament_code: self.tournament_code.clone(),
                        participant_id: self.participant_id,
                    };
                    let announce = match serde_json::to_string(&join) {
                        Ok(payload) => write.send(Message::Text(payload.into())).await,
                        Err(err) => {
                            let _ = self
                                .events
                                .send(GatewayEvent::Error(format!("join encode failed: {err}")))
                                .await;
                            return;
                        }
                    };
                    if announce.is_err() {
                        let _ = self.events.send(GatewayEvent::Disconnected).await;
                        sleep(RECONNECT_DELAY).await;
                        continue;
                    }

                    while let Some(inbound) = read.next().await {
                        match inbound {
                            Ok(Message::Text(text)) => {
                                match serde_json::from_str::<ServerMessage>(&text) {
                                    Ok(message) => {
                                        if self
                                            .events
                                            .send(GatewayEvent::Message(message))
                                            .await
                                            .is_err()
                                        {
                                            return;
                                        }
                                    }
                                    Err(err) => {
                                        debug!(%err, "undecodable push");
                                        let _ = self
                                            .events
                                            .send(GatewayEvent::Error(format!(
                                                "push parse error: {err}"
                                            )))
                                            .await;
                                    }
                                }
                            }
                            Ok(Message::Close(_)) => break,
                            Ok(_) => {}
                            Err(err) => {
                                let _ = self
                                    .events
                                    .send(GatewayEvent::Error(format!("read failed: {err}")))
                                    .await;
                                break;
                            }
                        }
                    }

                    if self.events.send(GatewayEvent::Disconnected).await.is_err() {
                        return;
                    }
                }
                Err(err) => {
                    let _ = self
                        .events
                        .send(GatewayEvent::Error(format!("connect failed: {err}")))
                        .await;
                    let _ = self.events.send(GatewayEvent::Disconnected).await;
                }
            }

            sleep(RECONNECT_DELAY).await;
        }
    }
}
