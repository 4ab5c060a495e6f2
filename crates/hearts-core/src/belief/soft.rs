//! Behavior-driven likelihood adjustments layered on top of hard belief
//! constraints. These are priors only: a multiplier here never drives a
//! possibility to zero.

use super::hard::Belief;
use crate::game::observation::ObservedRound;
use crate::model::card::Card;
use crate::model::player::PlayerPosition;
use crate::model::rank::Rank;
use crate::model::suit::Suit;

#[derive(Debug, Clone, Copy)]
pub struct BehaviorConfig {
    /// Multiplier on the queen of spades for a seat that follows a spade lead
    /// below the queen (they would usually dump her if they could).
    pub queen_avoidance_weight: f32,
    /// Multiplier on the sloughed suit for a seat discarding a penalty card
    /// off-suit (penalty dumps tend to come from long suits).
    pub penalty_slough_weight: f32,
    /// Multiplier on ranks below an opponent's off-lead play (players tend to
    /// lead their lowest card of a suit).
    pub low_lead_weight: f32,
    /// Floor applied to every multiplier.
    pub minimum_weight: f32,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            queen_avoidance_weight: 0.6,
            penalty_slough_weight: 1.2,
            low_lead_weight: 0.8,
            minimum_weight: 0.05,
        }
    }
}

/// Replays the observed history and nudges card likelihoods by how the seats
/// behaved.
#[derive(Debug, Clone, Default)]
pub struct BehaviorModel {
    config: BehaviorConfig,
}

impl BehaviorModel {
    pub fn new(config: BehaviorConfig) -> Self {
        Self { config }
    }

    pub fn apply_history(&self, belief: &mut Belief, obs: &ObservedRound) {
        for trick in obs
            .completed_tricks
            .iter()
            .chain(std::iter::once(&obs.current_trick))
        {
            let lead = trick.lead_suit();
            for (index, play) in trick.plays().iter().enumerate() {
                if play.position == belief.perspective() {
                    continue;
                }
                let lead_for_play = if index == 0 { None } else { lead };
                self.observe_play(belief, play.position, play.card, lead_for_play);
            }
        }
    }

    fn observe_play(
        &self,
        belief: &mut Belief,
        seat: PlayerPosition,
        card: Card,
        lead: Option<Suit>,
    ) {
        match lead {
            None => self.observe_lead(belief, seat, card),
            Some(lead) => {
                self.observe_queen_avoidance(belief, seat, card, lead);
                self.observe_penalty_slough(belief, seat, card, lead);
            }
        }
    }

    /// A seat leading a suit usually leads its lowest card: damp the ranks
    /// underneath the one they chose.
    fn observe_lead(&self, belief: &mut Belief, seat: PlayerPosition, card: Card) {
        if card.suit == Suit::Hearts {
            return; // heart leads are usually forced, not informative
        }
        let weight = self.config.low_lead_weight.max(self.config.minimum_weight);
        for rank in Rank::ORDERED {
            if rank >= card.rank {
                break;
            }
            belief.scale_card(seat, Card::new(rank, card.suit), weight);
        }
    }

    fn observe_queen_avoidance(
        &self,
        belief: &mut Belief,
        seat: PlayerPosition,
        card: Card,
        lead: Suit,
    ) {
        if lead != Suit::Spades || card.suit != Suit::Spades || card.rank >= Rank::Queen {
            return;
        }
        let weight = self
            .config
            .queen_avoidance_weight
            .max(self.config.minimum_weight);
        belief.scale_card(seat, Card::QUEEN_OF_SPADES, weight);
    }

    fn observe_penalty_slough(
        &self,
        belief: &mut Belief,
        seat: PlayerPosition,
        card: Card,
        lead: Suit,
    ) {
        if card.suit == lead {
            return;
        }
        if !card.is_heart() && !card.is_queen_of_spades() {
            return;
        }
        let weight = self
            .config
            .penalty_slough_weight
            .max(self.config.minimum_weight);
        belief.scale_suit(seat, card.suit, weight);
    }
}
