//! Draws concrete worlds (full hidden-hand assignments) consistent with a
//! belief. Sampling goes suit by suit, most constrained first; within a suit
//! the per-seat counts are drawn by binomial weight and the concrete cards by
//! prior weight, without replacement.

use super::hard::Belief;
use crate::model::card::Card;
use crate::model::hand::Hand;
use crate::model::player::PlayerPosition;
use crate::model::suit::Suit;
use once_cell::sync::Lazy;
use rand::Rng;
use std::array;
use thiserror::Error;

/// Draw attempts per weighting mode before giving up on it.
pub const SAMPLE_ATTEMPTS: usize = 8;

/// Binomial coefficients up to n = 13, the most cards a suit or hand can
/// hold. Initialized once, read-only afterwards.
static BINOMIAL: Lazy<[[u64; 14]; 14]> = Lazy::new(|| {
    let mut table = [[0u64; 14]; 14];
    for n in 0..14 {
        table[n][0] = 1;
        for k in 1..=n {
            table[n][k] = table[n - 1][k - 1] + table[n - 1][k];
        }
    }
    table
});

fn binomial(n: usize, k: usize) -> u64 {
    if k > n {
        0
    } else {
        BINOMIAL[n][k]
    }
}

/// A concrete hidden-hand assignment plus its prior likelihood.
#[derive(Debug, Clone)]
pub struct SampledWorld {
    hands: [Hand; 4],
    log_weight: f64,
}

impl SampledWorld {
    pub fn hand(&self, seat: PlayerPosition) -> &Hand {
        &self.hands[seat.index()]
    }

    pub fn hands(&self) -> &[Hand; 4] {
        &self.hands
    }

    pub fn into_hands(self) -> [Hand; 4] {
        self.hands
    }

    /// Log of the relative likelihood of this assignment under the belief's
    /// prior. Zero for the uniform levels.
    pub fn log_weight(&self) -> f64 {
        self.log_weight
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SamplingError {
    #[error("opponent capacities do not cover the hidden cards")]
    CapacityMismatch,
    #[error("belief constraints admit no consistent world")]
    InconsistentBelief,
}

/// How card and split weights are computed during a draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WeightMode {
    /// The belief's prior probabilities.
    Prior,
    /// Uniform over non-void placements; used as the retry fallback.
    UniformVoids,
}

/// Samples one world from the belief. Retries a bounded number of times with
/// the prior weights, then falls back to uniform non-void weights; a failure
/// after both passes means the belief itself is inconsistent and the caller
/// should downgrade it.
pub fn sample_world<R: Rng + ?Sized>(
    belief: &Belief,
    rng: &mut R,
) -> Result<SampledWorld, SamplingError> {
    let layout = SuitLayout::from_belief(belief)?;

    for mode in [WeightMode::Prior, WeightMode::UniformVoids] {
        for _ in 0..SAMPLE_ATTEMPTS {
            if let Some(world) = try_sample(belief, &layout, mode, rng) {
                return Ok(world);
            }
        }
        if matches!(mode, WeightMode::Prior) {
            tracing::debug!(
                target: "hearts_core::sampler",
                "prior-weighted draws exhausted, retrying with uniform weights"
            );
        }
    }

    Err(SamplingError::InconsistentBelief)
}

/// Unknown cards grouped by suit, ordered most constrained first, plus the
/// opponents and their capacities.
struct SuitLayout {
    suits: Vec<(Suit, Vec<Card>)>,
    opponents: Vec<PlayerPosition>,
    capacities: Vec<usize>,
}

impl SuitLayout {
    fn from_belief(belief: &Belief) -> Result<Self, SamplingError> {
        let unknown = belief.unknown_cards();
        let opponents: Vec<PlayerPosition> = PlayerPosition::LOOP
            .iter()
            .copied()
            .filter(|&seat| seat != belief.perspective())
            .collect();
        let capacities: Vec<usize> = opponents
            .iter()
            .map(|&seat| belief.expected_hand_size(seat) as usize)
            .collect();

        if capacities.iter().sum::<usize>() != unknown.len() {
            return Err(SamplingError::CapacityMismatch);
        }

        let mut suits: Vec<(Suit, Vec<Card>)> = Suit::ALL
            .iter()
            .map(|&suit| {
                let cards: Vec<Card> = unknown.iter().copied().filter(|c| c.suit == suit).collect();
                (suit, cards)
            })
            .filter(|(_, cards)| !cards.is_empty())
            .collect();

        // Most constrained first: fewest eligible takers, then longest suit.
        suits.sort_by_key(|(suit, cards)| {
            let takers = opponents
                .iter()
                .filter(|&&seat| !belief.void_mask(seat).contains(*suit))
                .count();
            (takers, std::cmp::Reverse(cards.len()))
        });

        Ok(Self {
            suits,
            opponents,
            capacities,
        })
    }
}

fn card_weight(belief: &Belief, mode: WeightMode, seat: PlayerPosition, card: Card) -> f64 {
    match mode {
        WeightMode::Prior => belief.prob(seat, card) as f64,
        WeightMode::UniformVoids => {
            if belief.void_mask(seat).contains(card.suit) {
                0.0
            } else {
                1.0
            }
        }
    }
}

fn try_sample<R: Rng + ?Sized>(
    belief: &Belief,
    layout: &SuitLayout,
    mode: WeightMode,
    rng: &mut R,
) -> Option<SampledWorld> {
    let mut capacities = layout.capacities.clone();
    let mut hands: [Hand; 4] = array::from_fn(|_| Hand::new());
    let mut log_weight = 0.0f64;

    for &c in belief_perspective_hand(belief).iter() {
        hands[belief.perspective().index()].add(c);
    }

    for (index, (suit, cards)) in layout.suits.iter().enumerate() {
        let eligible: Vec<bool> = layout
            .opponents
            .iter()
            .map(|&seat| {
                takeable(belief, mode, seat, *suit)
                    && cards
                        .iter()
                        .any(|&card| card_weight(belief, mode, seat, card) > 0.0)
            })
            .collect();

        let future: Vec<usize> = layout
            .opponents
            .iter()
            .map(|&seat| {
                layout.suits[index + 1..]
                    .iter()
                    .filter(|(later, _)| takeable(belief, mode, seat, *later))
                    .map(|(_, later_cards)| later_cards.len())
                    .sum()
            })
            .collect();

        let split = draw_split(cards.len(), &capacities, &eligible, &future, rng)?;

        let mut pool = cards.clone();
        for (opp_index, &count) in split.iter().enumerate() {
            let seat = layout.opponents[opp_index];
            for _ in 0..count {
                let picked = draw_card(belief, mode, seat, &mut pool, rng)?;
                hands[seat.index()].add(picked.0);
                log_weight += picked.1;
            }
            capacities[opp_index] -= count;
        }
        debug_assert!(pool.is_empty(), "split must consume the whole suit");
    }

    if matches!(mode, WeightMode::UniformVoids) || !matches!(belief.level(), super::BeliefLevel::Behavioral) {
        log_weight = 0.0;
    }

    Some(SampledWorld { hands, log_weight })
}

fn belief_perspective_hand(belief: &Belief) -> Vec<Card> {
    (0..52u8)
        .filter_map(Card::from_id)
        .filter(|&card| (belief.prob(belief.perspective(), card) - 1.0).abs() < f32::EPSILON)
        .collect()
}

fn takeable(belief: &Belief, mode: WeightMode, seat: PlayerPosition, suit: Suit) -> bool {
    match mode {
        WeightMode::Prior | WeightMode::UniformVoids => !belief.void_mask(seat).contains(suit),
    }
}

/// Chooses per-opponent counts for one suit, weighted by the number of ways
/// each count split could be dealt. Returns `None` when no split is feasible.
fn draw_split<R: Rng + ?Sized>(
    suit_len: usize,
    capacities: &[usize],
    eligible: &[bool],
    future: &[usize],
    rng: &mut R,
) -> Option<Vec<usize>> {
    let mut splits: Vec<(Vec<usize>, u64)> = Vec::new();

    let max0 = if eligible[0] { capacities[0].min(suit_len) } else { 0 };
    for c0 in 0..=max0 {
        let rem0 = suit_len - c0;
        let max1 = if eligible[1] { capacities[1].min(rem0) } else { 0 };
        for c1 in 0..=max1 {
            let c2 = rem0 - c1;
            if c2 > capacities[2] || (c2 > 0 && !eligible[2]) {
                continue;
            }
            let counts = [c0, c1, c2];
            // Each seat must still be fillable from the suits yet to come.
            let feasible = (0..3).all(|i| capacities[i] - counts[i] <= future[i]);
            if !feasible {
                continue;
            }
            let weight = binomial(capacities[0], c0)
                * binomial(capacities[1], c1)
                * binomial(capacities[2], c2);
            if weight > 0 {
                splits.push((counts.to_vec(), weight));
            }
        }
    }

    let total: u64 = splits.iter().map(|(_, w)| w).sum();
    if total == 0 {
        return None;
    }
    let mut choice = rng.gen_range(0..total);
    for (counts, weight) in splits {
        if choice < weight {
            return Some(counts);
        }
        choice -= weight;
    }
    None
}

/// Weighted draw without replacement; returns the card and its log-normalized
/// draw probability.
fn draw_card<R: Rng + ?Sized>(
    belief: &Belief,
    mode: WeightMode,
    seat: PlayerPosition,
    pool: &mut Vec<Card>,
    rng: &mut R,
) -> Option<(Card, f64)> {
    let weights: Vec<f64> = pool
        .iter()
        .map(|&card| card_weight(belief, mode, seat, card))
        .collect();
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return None;
    }

    let mut choice = rng.gen_range(0.0..total);
    for (index, weight) in weights.iter().enumerate() {
        if *weight > 0.0 && choice < *weight {
            let card = pool.swap_remove(index);
            return Some((card, (weight / total).ln()));
        }
        choice -= weight;
    }
    // Floating-point edge: take the last positively weighted card.
    let index = weights.iter().rposition(|w| *w > 0.0)?;
    let weight = weights[index];
    let card = pool.swap_remove(index);
    Some((card, (weight / total).ln()))
}

#[cfg(test)]
mod tests {
    use super::{sample_world, SamplingError};
    use crate::belief::{Belief, BeliefLevel};
    use crate::game::observation::ObservedRound;
    use crate::model::card::Card;
    use crate::model::hand::Hand;
    use crate::model::passing::PassDirection;
    use crate::model::player::PlayerPosition;
    use crate::model::rank::Rank;
    use crate::model::suit::Suit;
    use crate::model::trick::Trick;
    use crate::rules::flags::RulesMask;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn striped_observation(seat: PlayerPosition) -> ObservedRound {
        let my_hand: Vec<Card> = (0..52)
            .filter(|id| (id % 4) as usize == seat.index())
            .map(|id| Card::from_id(id).unwrap())
            .collect();
        ObservedRound {
            rules: RulesMask::standard(),
            my_seat: seat,
            my_hand: Hand::with_cards(my_hand),
            completed_tricks: Vec::new(),
            current_trick: Trick::new(seat),
            scores: [0; 4],
            pass_direction: PassDirection::Hold,
            passed_cards: None,
            received_cards: None,
            hearts_broken: false,
        }
    }

    #[test]
    fn sampled_world_covers_the_deck_exactly_once() {
        let obs = striped_observation(PlayerPosition::South);
        let belief = Belief::from_observation(&obs, BeliefLevel::VoidAware);
        let mut rng = SmallRng::seed_from_u64(11);
        let world = sample_world(&belief, &mut rng).expect("sampling succeeds");

        let mut seen = std::collections::HashSet::new();
        for seat in PlayerPosition::LOOP {
            assert_eq!(world.hand(seat).len(), 13);
            for &card in world.hand(seat).iter() {
                assert!(seen.insert(card), "card {card} assigned twice");
            }
        }
        assert_eq!(seen.len(), 52);
        assert_eq!(world.hand(PlayerPosition::South), &obs.my_hand);
        assert_eq!(world.log_weight(), 0.0);
    }

    #[test]
    fn deterministic_with_fixed_seed() {
        let obs = striped_observation(PlayerPosition::North);
        let belief = Belief::from_observation(&obs, BeliefLevel::VoidAware);
        let mut rng_a = SmallRng::seed_from_u64(123);
        let mut rng_b = SmallRng::seed_from_u64(123);
        let world_a = sample_world(&belief, &mut rng_a).unwrap();
        let world_b = sample_world(&belief, &mut rng_b).unwrap();
        for seat in PlayerPosition::LOOP {
            assert_eq!(world_a.hand(seat).cards(), world_b.hand(seat).cards());
        }
    }

    #[test]
    fn voids_are_respected() {
        let mut obs = striped_observation(PlayerPosition::South);
        // East discarded a diamond on a club lead: void in clubs.
        let mut trick = Trick::new(PlayerPosition::North);
        let north_club = obs
            .unseen_cards()
            .into_iter()
            .find(|c| c.suit == Suit::Clubs)
            .unwrap();
        let east_diamond = obs
            .unseen_cards()
            .into_iter()
            .find(|c| c.suit == Suit::Diamonds)
            .unwrap();
        trick.play(PlayerPosition::North, north_club).unwrap();
        trick.play(PlayerPosition::East, east_diamond).unwrap();
        obs.current_trick = trick;

        let belief = Belief::from_observation(&obs, BeliefLevel::VoidAware);
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..32 {
            let world = sample_world(&belief, &mut rng).expect("sampling succeeds");
            assert!(
                !world.hand(PlayerPosition::East).has_suit(Suit::Clubs),
                "void seat received a club"
            );
            for seat in [PlayerPosition::North, PlayerPosition::East, PlayerPosition::West] {
                assert_eq!(
                    world.hand(seat).len(),
                    belief.expected_hand_size(seat) as usize
                );
            }
        }
    }

    #[test]
    fn behavioral_worlds_carry_log_weights() {
        let mut obs = striped_observation(PlayerPosition::South);
        let mut trick = Trick::new(PlayerPosition::North);
        let spade = obs
            .unseen_cards()
            .into_iter()
            .find(|c| c.suit == Suit::Spades && c.rank < Rank::Queen)
            .unwrap();
        trick.play(PlayerPosition::North, spade).unwrap();
        obs.current_trick = trick;

        let belief = Belief::from_observation(&obs, BeliefLevel::Behavioral);
        let mut rng = SmallRng::seed_from_u64(5);
        let world = sample_world(&belief, &mut rng).unwrap();
        assert!(world.log_weight() <= 0.0);
        assert!(world.log_weight().is_finite());
    }

    #[test]
    fn capacity_mismatch_is_reported() {
        let mut obs = striped_observation(PlayerPosition::South);
        // Drop a card from the hand without any matching history: the belief
        // then expects more hidden cards than opponents can hold.
        let dropped = obs.my_hand.cards()[0];
        obs.my_hand.remove(dropped);
        let belief = Belief::from_observation(&obs, BeliefLevel::Basic);
        let mut rng = SmallRng::seed_from_u64(3);
        assert!(matches!(
            sample_world(&belief, &mut rng),
            Err(SamplingError::CapacityMismatch)
        ));
    }
}
