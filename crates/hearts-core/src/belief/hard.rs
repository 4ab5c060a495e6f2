//! Deterministic (hard) belief constraints and the ownership probability
//! matrix.

use super::soft;
use crate::game::observation::ObservedRound;
use crate::model::card::Card;
use crate::model::player::PlayerPosition;
use crate::model::rank::Rank;
use crate::model::suit::Suit;
use crate::model::trick::Trick;
use serde::{Deserialize, Serialize};

/// Opponent-model refinement level, selectable per decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BeliefLevel {
    /// Uniform prior over cards not visible to the perspective seat.
    Basic,
    /// Basic plus hard void tracking from off-suit discards.
    VoidAware,
    /// VoidAware plus pass memory and the play-pattern prior.
    Behavioral,
}

/// Bit-mask of suits a seat has provably shown void in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SuitMask(u8);

impl SuitMask {
    pub const EMPTY: Self = Self(0);

    pub fn contains(self, suit: Suit) -> bool {
        self.0 & (1 << suit.index()) != 0
    }

    pub fn with(self, suit: Suit) -> Self {
        Self(self.0 | (1 << suit.index()))
    }

    pub fn count(self) -> u32 {
        self.0.count_ones()
    }
}

/// Probability model over card ownership for each seat. Built once per
/// decision from an observation; read-only afterwards.
#[derive(Debug, Clone)]
pub struct Belief {
    perspective: PlayerPosition,
    level: BeliefLevel,
    probs: [[f32; 52]; 4],
    voids: [SuitMask; 4],
    hand_counts: [u8; 4],
}

impl Belief {
    /// Builds the belief for the observing seat at the requested level.
    pub fn from_observation(obs: &ObservedRound, level: BeliefLevel) -> Self {
        let perspective = obs.my_seat;
        let hand_counts: [u8; 4] = std::array::from_fn(|index| {
            let seat = PlayerPosition::from_index(index).expect("seat index in range");
            obs.expected_hand_size(seat) as u8
        });

        let voids = if matches!(level, BeliefLevel::Basic) {
            [SuitMask::EMPTY; 4]
        } else {
            observed_voids(obs)
        };

        let mut belief = Self {
            perspective,
            level,
            probs: [[0.0; 52]; 4],
            voids,
            hand_counts,
        };
        belief.seed_columns(obs);

        if matches!(level, BeliefLevel::Behavioral) {
            belief.apply_pass_memory(obs);
            soft::BehaviorModel::default().apply_history(&mut belief, obs);
        }

        belief
    }

    pub fn perspective(&self) -> PlayerPosition {
        self.perspective
    }

    pub fn level(&self) -> BeliefLevel {
        self.level
    }

    /// Probability that `card` is held by `seat`.
    pub fn prob(&self, seat: PlayerPosition, card: Card) -> f32 {
        self.probs[seat.index()][card.to_id() as usize]
    }

    pub fn possible(&self, seat: PlayerPosition, card: Card) -> bool {
        self.prob(seat, card) > 0.0
    }

    pub fn void_mask(&self, seat: PlayerPosition) -> SuitMask {
        self.voids[seat.index()]
    }

    pub fn expected_hand_size(&self, seat: PlayerPosition) -> u8 {
        self.hand_counts[seat.index()]
    }

    /// Cards whose ownership is unknown to the perspective seat.
    pub fn unknown_cards(&self) -> Vec<Card> {
        (0..52u8)
            .filter_map(Card::from_id)
            .filter(|&card| {
                let mass: f32 = PlayerPosition::LOOP
                    .iter()
                    .map(|seat| self.prob(*seat, card))
                    .sum();
                mass > 0.0 && (self.prob(self.perspective, card) - 1.0).abs() > f32::EPSILON
            })
            .collect()
    }

    fn seed_columns(&mut self, obs: &ObservedRound) {
        let played: std::collections::HashSet<Card> = obs.played_cards().collect();

        for card_id in 0..52u8 {
            let card = Card::from_id(card_id).expect("valid card id");
            if played.contains(&card) {
                continue;
            }
            if obs.my_hand.contains(card) {
                self.probs[self.perspective.index()][card_id as usize] = 1.0;
                continue;
            }

            let mut candidates: Vec<PlayerPosition> = PlayerPosition::LOOP
                .iter()
                .copied()
                .filter(|&seat| {
                    seat != self.perspective
                        && self.hand_counts[seat.index()] > 0
                        && !self.voids[seat.index()].contains(card.suit)
                })
                .collect();

            // Every unaccounted card must remain possible somewhere; relax
            // voids for this card if they rule everyone out.
            if candidates.is_empty() {
                candidates = PlayerPosition::LOOP
                    .iter()
                    .copied()
                    .filter(|&seat| {
                        seat != self.perspective && self.hand_counts[seat.index()] > 0
                    })
                    .collect();
            }
            if candidates.is_empty() {
                continue;
            }

            let share = 1.0 / candidates.len() as f32;
            for seat in candidates {
                self.probs[seat.index()][card_id as usize] = share;
            }
        }
    }

    /// Cards the perspective passed are certainties for the recipient until
    /// they show up on the table.
    fn apply_pass_memory(&mut self, obs: &ObservedRound) {
        if !obs.pass_direction.requires_selection() {
            return;
        }
        let Some(passed) = obs.passed_cards else {
            return;
        };
        let recipient = obs.pass_direction.target(self.perspective);
        for card in passed {
            let card_id = card.to_id() as usize;
            let column_mass: f32 = PlayerPosition::LOOP
                .iter()
                .map(|seat| self.probs[seat.index()][card_id])
                .sum();
            if column_mass == 0.0 {
                continue; // already played
            }
            for seat in PlayerPosition::LOOP {
                self.probs[seat.index()][card_id] = 0.0;
            }
            self.probs[recipient.index()][card_id] = 1.0;
        }
    }

    pub(crate) fn scale_card(&mut self, seat: PlayerPosition, card: Card, weight: f32) {
        if seat == self.perspective || weight <= 0.0 {
            return;
        }
        let card_id = card.to_id() as usize;
        let current = self.probs[seat.index()][card_id];
        if current == 0.0 || (current - 1.0).abs() < f32::EPSILON {
            return; // impossible or certain; priors do not move either
        }
        // Priors never extinguish a possibility.
        self.probs[seat.index()][card_id] = (current * weight).max(1e-6);
        self.renormalize_column(card_id);
    }

    pub(crate) fn scale_suit(&mut self, seat: PlayerPosition, suit: Suit, weight: f32) {
        for rank in Rank::ORDERED {
            self.scale_card(seat, Card::new(rank, suit), weight);
        }
    }

    fn renormalize_column(&mut self, card_id: usize) {
        let total: f32 = PlayerPosition::LOOP
            .iter()
            .map(|seat| self.probs[seat.index()][card_id])
            .sum();
        if total == 0.0 {
            return;
        }
        for seat in PlayerPosition::LOOP {
            self.probs[seat.index()][card_id] /= total;
        }
    }
}

/// Voids proven by the trick history: discarding off-suit on a led suit, plus
/// the perspective's own missing suits.
fn observed_voids(obs: &ObservedRound) -> [SuitMask; 4] {
    let mut voids = [SuitMask::EMPTY; 4];

    for suit in Suit::ALL {
        if !obs.my_hand.has_suit(suit) {
            let index = obs.my_seat.index();
            voids[index] = voids[index].with(suit);
        }
    }

    for trick in obs
        .completed_tricks
        .iter()
        .chain(std::iter::once(&obs.current_trick))
    {
        mark_voids_from_trick(&mut voids, trick);
    }

    voids
}

fn mark_voids_from_trick(voids: &mut [SuitMask; 4], trick: &Trick) {
    if let Some(lead) = trick.lead_suit() {
        for play in trick.plays() {
            if play.card.suit != lead {
                let index = play.position.index();
                voids[index] = voids[index].with(lead);
            }
        }
    }
}
