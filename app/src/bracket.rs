//! The authoritative bracket state machine: seeding, winner application and
//! the cross-match cascade. Everything here is pure and synchronous; the
//! caller is responsible for holding the tournament's lock.

use rand::Rng;
use rand::seq::SliceRandom;

use models::schemas::bracket::{
    BracketSchema, CONSOLATION_1, CONSOLATION_2, FINAL, MatchSchema, SEMIFINAL_1, SEMIFINAL_2,
};
use models::schemas::player::PlayerSchema;
use models::schemas::problem::ProblemSchema;
use models::schemas::tournament::BRACKET_SIZE;

/// Candidate problems for match assignment. Sampling is with replacement:
/// the same problem may be handed to more than one match.
const PROBLEM_POOL: [(u32, &str, &str, u32); 8] = [
    (1850, "A", "To My Critics", 800),
    (1849, "B", "Comparison String", 900),
    (1847, "C", "Vampiric Powers", 1000),
    (1846, "D", "Rudolph and Christmas Tree", 1200),
    (1845, "A", "Forbidden Integer", 800),
    (1844, "B", "Permutations & Primes", 1000),
    (1843, "A", "Sasha and Array Coloring", 800),
    (1842, "B", "Tenzin and Books", 900),
];

pub fn draw_problem() -> ProblemSchema {
    let mut rng = rand::rng();
    let (contest, index, name, rating) = PROBLEM_POOL[rng.random_range(0..PROBLEM_POOL.len())];
    ProblemSchema {
        contest,
        index: index.to_owned(),
        name: name.to_owned(),
        rating,
    }
}

/// Shuffle the four players uniformly and pair them into the two semifinals,
/// each with its own problem. Consolation matches and the final stay open
/// until bracket progression populates them.
pub fn seed_bracket(players: &[PlayerSchema]) -> BracketSchema {
    debug_assert_eq!(players.len(), BRACKET_SIZE);

    let mut seeded = players.to_vec();
    let mut rng = rand::rng();
    seeded.shuffle(&mut rng);

    let semifinal = |id: i32, a: &PlayerSchema, b: &PlayerSchema| MatchSchema {
        id,
        player1: Some(a.clone()),
        player2: Some(b.clone()),
        winner: None,
        problem: Some(draw_problem()),
        started_at: None,
    };

    BracketSchema {
        semifinals: vec![
            semifinal(SEMIFINAL_1, &seeded[0], &seeded[1]),
            semifinal(SEMIFINAL_2, &seeded[2], &seeded[3]),
        ],
        consolation: vec![
            MatchSchema::open(CONSOLATION_1),
            MatchSchema::open(CONSOLATION_2),
        ],
        finals: MatchSchema::open(FINAL),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Winner recorded; progression ran as far as it could.
    Applied,
    /// The match was already decided. Nothing was touched.
    AlreadyDecided,
    UnknownMatch,
    /// The named winner is not one of the match's participants.
    NotAParticipant,
}

/// Record a winner exactly once and advance the bracket.
///
/// Deciding a semifinal parks the loser in its consolation feeder. Whichever
/// semifinal concludes second also runs the cascade: the final receives both
/// semifinal winners and a fresh problem, and the consolation matches are
/// finalized by cross-assigning each one's second slot from the other's
/// first, each with a fresh problem. Calling this again for a decided match
/// is a no-op, which is what makes duplicate winner detections harmless.
pub fn apply_winner(bracket: &mut BracketSchema, match_id: i32, winner_id: i32) -> ApplyOutcome {
    let Some(m) = bracket.find_match_mut(match_id) else {
        return ApplyOutcome::UnknownMatch;
    };
    if m.winner.is_some() {
        return ApplyOutcome::AlreadyDecided;
    }
    let (Some(p1), Some(p2)) = (m.player1.clone(), m.player2.clone()) else {
        return ApplyOutcome::NotAParticipant;
    };
    if p1.id != winner_id && p2.id != winner_id {
        return ApplyOutcome::NotAParticipant;
    }

    let (winner, loser) = if p1.id == winner_id { (p1, p2) } else { (p2, p1) };
    m.winner = Some(winner);

    if match_id == SEMIFINAL_1 || match_id == SEMIFINAL_2 {
        let feeder = if match_id == SEMIFINAL_1 { 0 } else { 1 };
        bracket.consolation[feeder].player1 = Some(loser);

        let concluded = (
            bracket.semifinals[0].winner.clone(),
            bracket.semifinals[1].winner.clone(),
        );
        if let (Some(first_winner), Some(second_winner)) = concluded {
            bracket.finals.player1 = Some(first_winner);
            bracket.finals.player2 = Some(second_winner);
            bracket.finals.problem = Some(draw_problem());

            bracket.consolation[0].player2 = bracket.consolation[1].player1.clone();
            bracket.consolation[1].player2 = bracket.consolation[0].player1.clone();
            bracket.consolation[0].problem = Some(draw_problem());
            bracket.consolation[1].problem = Some(draw_problem());
        }
    }

    ApplyOutcome::Applied
}

pub fn is_complete(bracket: &BracketSchema) -> bool {
    bracket.finals.winner.is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::schemas::bracket::MatchPhase;

    fn player(id: i32, name: &str) -> PlayerSchema {
        PlayerSchema {
            id,
            name: name.to_owned(),
            handle: name.to_lowercase(),
            avatar: "🥷".to_owned(),
            rating: 1500,
            max_rating: 1600,
            rank: "specialist".to_owned(),
        }
    }

    fn four_players() -> Vec<PlayerSchema> {
        vec![
            player(1, "Ana"),
            player(2, "Bo"),
            player(3, "Cy"),
            player(4, "Dee"),
        ]
    }

    fn winner_id(bracket: &BracketSchema, match_id: i32) -> i32 {
        bracket
            .find_match(match_id)
            .and_then(|m| m.winner.as_ref())
            .map(|p| p.id)
            .expect("match should be decided")
    }

    #[test]
    fn seeding_pairs_all_four_players_into_semifinals() {
        let bracket = seed_bracket(&four_players());

        assert_eq!(bracket.semifinals.len(), 2);
        let mut seen: Vec<i32> = bracket
            .semifinals
            .iter()
            .flat_map(|m| [m.player1.as_ref().unwrap().id, m.player2.as_ref().unwrap().id])
            .collect();
        seen.sort_unstable();
        assert_eq!(seen, vec![1, 2, 3, 4]);

        for m in &bracket.semifinals {
            assert_eq!(m.phase(), MatchPhase::Active);
            let problem = m.problem.as_ref().unwrap();
            assert!(
                PROBLEM_POOL
                    .iter()
                    .any(|(c, i, _, _)| *c == problem.contest && *i == problem.index)
            );
        }
        assert_eq!(bracket.finals.phase(), MatchPhase::Pending);
        assert!(bracket.consolation.iter().all(|m| m.problem.is_none()));
    }

    #[test]
    fn semifinal_winner_parks_loser_in_consolation_feeder() {
        let mut bracket = seed_bracket(&four_players());
        let p1 = bracket.semifinals[0].player1.as_ref().unwrap().id;
        let p2 = bracket.semifinals[0].player2.as_ref().unwrap().id;

        assert_eq!(apply_winner(&mut bracket, SEMIFINAL_1, p1), ApplyOutcome::Applied);

        assert_eq!(winner_id(&bracket, SEMIFINAL_1), p1);
        assert_eq!(bracket.consolation[0].player1.as_ref().unwrap().id, p2);
        // only the loser-placement half ran: no cascade yet
        assert!(bracket.finals.player1.is_none());
        assert!(bracket.consolation[0].player2.is_none());
        assert!(bracket.consolation[0].problem.is_none());
    }

    #[test]
    fn second_semifinal_runs_cascade_in_either_order() {
        for order in [[SEMIFINAL_1, SEMIFINAL_2], [SEMIFINAL_2, SEMIFINAL_1]] {
            let mut bracket = seed_bracket(&four_players());
            let mut winners = Vec::new();
            let mut losers = Vec::new();
            for match_id in order {
                let m = bracket.find_match(match_id).unwrap();
                let w = m.player1.as_ref().unwrap().id;
                let l = m.player2.as_ref().unwrap().id;
                winners.push((match_id, w));
                losers.push((match_id, l));
                assert_eq!(apply_winner(&mut bracket, match_id, w), ApplyOutcome::Applied);
            }

            // final slots follow semifinal numbering, not decision order
            let sf1_winner = winners.iter().find(|(m, _)| *m == SEMIFINAL_1).unwrap().1;
            let sf2_winner = winners.iter().find(|(m, _)| *m == SEMIFINAL_2).unwrap().1;
            assert_eq!(bracket.finals.player1.as_ref().unwrap().id, sf1_winner);
            assert_eq!(bracket.finals.player2.as_ref().unwrap().id, sf2_winner);
            assert!(bracket.finals.problem.is_some());

            // consolation matches are cross-wired from each other's feeders
            let sf1_loser = losers.iter().find(|(m, _)| *m == SEMIFINAL_1).unwrap().1;
            let sf2_loser = losers.iter().find(|(m, _)| *m == SEMIFINAL_2).unwrap().1;
            assert_eq!(bracket.consolation[0].player1.as_ref().unwrap().id, sf1_loser);
            assert_eq!(bracket.consolation[0].player2.as_ref().unwrap().id, sf2_loser);
            assert_eq!(bracket.consolation[1].player1.as_ref().unwrap().id, sf2_loser);
            assert_eq!(bracket.consolation[1].player2.as_ref().unwrap().id, sf1_loser);
            assert!(bracket.consolation.iter().all(|m| m.problem.is_some()));
        }
    }

    #[test]
    fn apply_winner_is_idempotent() {
        let mut bracket = seed_bracket(&four_players());
        let w = bracket.semifinals[0].player1.as_ref().unwrap().id;
        let l = bracket.semifinals[0].player2.as_ref().unwrap().id;

        assert_eq!(apply_winner(&mut bracket, SEMIFINAL_1, w), ApplyOutcome::Applied);
        let frozen = bracket.clone();

        // duplicate detection for the same winner, and a late report for the
        // loser, must both leave the bracket untouched
        assert_eq!(
            apply_winner(&mut bracket, SEMIFINAL_1, w),
            ApplyOutcome::AlreadyDecided
        );
        assert_eq!(
            apply_winner(&mut bracket, SEMIFINAL_1, l),
            ApplyOutcome::AlreadyDecided
        );
        assert_eq!(bracket, frozen);
    }

    #[test]
    fn apply_winner_rejects_strangers_and_unknown_matches() {
        let mut bracket = seed_bracket(&four_players());
        assert_eq!(apply_winner(&mut bracket, 99, 1), ApplyOutcome::UnknownMatch);

        let outsider = bracket.semifinals[1].player1.as_ref().unwrap().id;
        assert_eq!(
            apply_winner(&mut bracket, SEMIFINAL_1, outsider),
            ApplyOutcome::NotAParticipant
        );
        // an open match has no participants to win it
        assert_eq!(
            apply_winner(&mut bracket, FINAL, 1),
            ApplyOutcome::NotAParticipant
        );
    }

    #[test]
    fn final_winner_completes_the_bracket() {
        let mut bracket = seed_bracket(&four_players());
        for match_id in [SEMIFINAL_1, SEMIFINAL_2] {
            let w = bracket.find_match(match_id).unwrap().player1.as_ref().unwrap().id;
            apply_winner(&mut bracket, match_id, w);
        }
        assert!(!is_complete(&bracket));

        let finalist = bracket.finals.player1.as_ref().unwrap().id;
        assert_eq!(apply_winner(&mut bracket, FINAL, finalist), ApplyOutcome::Applied);
        assert!(is_complete(&bracket));
        assert_eq!(winner_id(&bracket, FINAL), finalist);
    }
}
