//! Per-match polling loop against the judge. Each active match gets its own
//! task holding immutable start parameters and a private classification
//! cache; ticks only touch shared state indirectly, through the events the
//! loop emits.

use std::collections::HashSet;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use models::schemas::{problem::ProblemSchema, submission::SubmissionStatus};
use oracle::{CodeforcesApi, SubmissionRecord, Verdict};

/// The two cadences observed in practice: a live duel wants near-immediate
/// feedback, a bracket match can afford a relaxed poll.
pub const DUEL_POLL_INTERVAL: Duration = Duration::from_secs(1);
pub const BRACKET_POLL_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Clone, Debug)]
pub struct MonitoredPlayer {
    pub id: i32,
    pub handle: String,
}

/// Immutable inputs for one match's polling loop.
#[derive(Clone, Debug)]
pub struct MonitorParams {
    pub match_id: i32,
    pub problem: ProblemSchema,
    pub started_at: DateTime<Utc>,
    pub player1: MonitoredPlayer,
    pub player2: MonitoredPlayer,
    pub interval: Duration,
}

#[derive(Clone, Debug)]
pub enum MonitorEvent {
    /// A player's classification changed since the last emission.
    Status {
        match_id: i32,
        player_id: i32,
        status: SubmissionStatus,
        submission: Option<SubmissionRecord>,
    },
    /// First acceptance seen. The loop stops itself after sending this; the
    /// receiver is expected to run the winner through the bracket engine,
    /// whose idempotency guard absorbs any straggler.
    Accepted { match_id: i32, player_id: i32 },
}

/// Handle to a running monitor. Dropping it does not stop the loop; call
/// [`MatchMonitor::stop`], which is safe to call any number of times and
/// after the monitor has already stopped itself.
pub struct MatchMonitor {
    token: CancellationToken,
}

impl MatchMonitor {
    pub fn start(
        oracle: CodeforcesApi,
        params: MonitorParams,
    ) -> (MatchMonitor, mpsc::UnboundedReceiver<MonitorEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let token = CancellationToken::new();
        let loop_token = token.clone();
        info!(
            match_id = params.match_id,
            interval_ms = params.interval.as_millis() as u64,
            "starting match monitor"
        );
        tokio::spawn(async move {
            poll_loop(oracle, params, tx, loop_token).await;
        });
        (MatchMonitor { token }, rx)
    }

    pub fn stop(&self) {
        self.token.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }
}

async fn poll_loop(
    oracle: CodeforcesApi,
    params: MonitorParams,
    tx: mpsc::UnboundedSender<MonitorEvent>,
    token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(params.interval);
    // a tick still waiting on a slow judge coalesces instead of piling up
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut cache = ClassificationCache::default();

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = ticker.tick() => {}
        }

        // Both fetches run concurrently and fail independently; no lock is
        // held anywhere near this await.
        let (first, second) = tokio::join!(
            oracle.fetch_recent_submissions(&params.player1.handle),
            oracle.fetch_recent_submissions(&params.player2.handle),
        );

        // Player 1 is evaluated first, so a same-tick double accept resolves
        // to player 1.
        for (slot, (player, fetched)) in [(&params.player1, first), (&params.player2, second)]
            .into_iter()
            .enumerate()
        {
            let submissions = match fetched {
                Ok(submissions) => submissions,
                Err(err) => {
                    // one bad tick never kills the loop
                    warn!(handle = %player.handle, %err, "submission poll failed");
                    continue;
                }
            };

            let latest = latest_qualifying(&submissions, &params.problem, params.started_at);
            let Some(status) = cache.observe(slot, latest) else {
                continue;
            };

            debug!(player_id = player.id, ?status, "classification changed");
            let _ = tx.send(MonitorEvent::Status {
                match_id: params.match_id,
                player_id: player.id,
                status,
                submission: latest.cloned(),
            });

            if status == SubmissionStatus::Accepted {
                info!(match_id = params.match_id, player_id = player.id, "winner detected");
                let _ = tx.send(MonitorEvent::Accepted {
                    match_id: params.match_id,
                    player_id: player.id,
                });
                token.cancel();
                return;
            }
        }
    }
}

/// The most recent submission for the match problem made at or after the
/// match start. Older submissions never qualify, accepted or not.
pub fn latest_qualifying<'a>(
    submissions: &'a [SubmissionRecord],
    problem: &ProblemSchema,
    started_at: DateTime<Utc>,
) -> Option<&'a SubmissionRecord> {
    submissions
        .iter()
        .filter(|s| {
            s.contest_id == Some(problem.contest)
                && s.index == problem.index
                && s.submitted_at >= started_at
        })
        .max_by_key(|s| (s.submitted_at, s.id))
}

pub fn classify(submission: Option<&SubmissionRecord>) -> SubmissionStatus {
    let Some(submission) = submission else {
        return SubmissionStatus::Waiting;
    };
    match &submission.verdict {
        None => SubmissionStatus::Submitted,
        Some(Verdict::Accepted) => SubmissionStatus::Accepted,
        Some(Verdict::Testing) => SubmissionStatus::Testing,
        Some(_) => SubmissionStatus::Wrong,
    }
}

/// Tracks which submissions this monitor has seen and the last status it
/// emitted per player, so idempotent re-polling stays silent.
#[derive(Default)]
struct ClassificationCache {
    seen: HashSet<u64>,
    last: [Option<SubmissionStatus>; 2],
}

impl ClassificationCache {
    /// Returns the classification only when it differs from the last one
    /// emitted for this player.
    fn observe(&mut self, slot: usize, latest: Option<&SubmissionRecord>) -> Option<SubmissionStatus> {
        if let Some(submission) = latest {
            self.seen.insert(submission.id);
        }
        let status = classify(latest);
        if self.last[slot] == Some(status) {
            return None;
        }
        self.last[slot] = Some(status);
        Some(status)
    }
}
