use hearts_core::{Card, PlayerPosition, RoundState, Suit};
use rand::seq::SliceRandom;
use rand::{Rng, RngCore};

/// Leaf policy used by the tree search. Implementations are pure with respect
/// to the state; all randomness flows through the caller's RNG, so workers
/// can share one policy behind an `Arc`.
pub trait PlayoutPolicy: Send + Sync {
    fn pick(&self, round: &RoundState, seat: PlayerPosition, rng: &mut dyn RngCore) -> Option<Card>;
}

/// Picks uniformly from the legal moves.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformPlayout;

impl PlayoutPolicy for UniformPlayout {
    fn pick(&self, round: &RoundState, seat: PlayerPosition, rng: &mut dyn RngCore) -> Option<Card> {
        round.legal_moves(seat).choose(rng).copied()
    }
}

/// With probability epsilon picks uniformly, otherwise applies the standard
/// Hearts rollout heuristics: duck under the current winner, dump penalties
/// when discarding, lead low and away from hearts.
#[derive(Debug, Clone, Copy)]
pub struct EpsilonGreedyPlayout {
    pub epsilon: f64,
}

impl EpsilonGreedyPlayout {
    pub fn new(epsilon: f64) -> Self {
        Self {
            epsilon: epsilon.clamp(0.0, 1.0),
        }
    }
}

impl PlayoutPolicy for EpsilonGreedyPlayout {
    fn pick(&self, round: &RoundState, seat: PlayerPosition, rng: &mut dyn RngCore) -> Option<Card> {
        let legal = round.legal_moves(seat);
        if legal.is_empty() {
            return None;
        }
        if legal.len() == 1 {
            return Some(legal[0]);
        }
        if self.epsilon > 0.0 && rng.gen_bool(self.epsilon) {
            return legal.choose(rng).copied();
        }
        Some(greedy_choice(round, seat, &legal))
    }
}

fn greedy_choice(round: &RoundState, seat: PlayerPosition, legal: &[Card]) -> Card {
    let trick = round.current_trick();
    let Some(lead) = trick.lead_suit() else {
        // Leading: lowest non-heart, unless the hand is forced.
        return legal
            .iter()
            .copied()
            .filter(|c| !c.is_heart())
            .min_by_key(|c| (c.rank, c.suit))
            .unwrap_or_else(|| lowest_card(legal));
    };

    if round.hand(seat).has_suit(lead) {
        // Following. Duck with the highest card that stays under the winner;
        // if every card wins, take the trick expensively.
        let winning_rank = trick
            .plays()
            .iter()
            .filter(|play| play.card.suit == lead)
            .map(|play| play.card.rank)
            .max()
            .expect("lead suit has at least one play");
        return legal
            .iter()
            .copied()
            .filter(|c| c.rank < winning_rank)
            .max_by_key(|c| c.rank)
            .unwrap_or_else(|| highest_card(legal));
    }

    // Discarding: unload the most dangerous card.
    if let Some(queen) = legal.iter().copied().find(|c| c.is_queen_of_spades()) {
        return queen;
    }
    if let Some(heart) = legal
        .iter()
        .copied()
        .filter(|c| c.is_heart())
        .max_by_key(|c| c.rank)
    {
        return heart;
    }
    highest_card(legal)
}

fn lowest_card(cards: &[Card]) -> Card {
    cards
        .iter()
        .copied()
        .min_by_key(|c| (c.rank, c.suit))
        .expect("card list is non-empty")
}

fn highest_card(cards: &[Card]) -> Card {
    cards
        .iter()
        .copied()
        .max_by_key(|c| (c.rank, std::cmp::Reverse(c.suit)))
        .expect("card list is non-empty")
}

/// Plays the round to terminal with `policy` and returns the per-seat scores.
pub fn rollout<R: Rng>(
    round: &mut RoundState,
    policy: &dyn PlayoutPolicy,
    rng: &mut R,
) -> [i32; 4] {
    while let Some(seat) = round.next_to_act() {
        let card = policy
            .pick(round, seat, rng)
            .expect("play phase always has a legal move");
        round
            .play_card(seat, card)
            .expect("playout policy returned an illegal move");
    }
    round.round_scores()
}
