use crate::config::SearchConfig;
use crate::driver::{self, AggregatedMove};
use crate::pool::WorkerPool;
use hearts_core::{Belief, Card, ObservationError, ObservedRound, RulesMask};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// The decision-engine facade. Owns the worker pool, which is reused across
/// decisions; everything else is per-decision state.
pub struct DecisionEngine {
    pool: WorkerPool,
}

/// Outcome of one decision. `degraded` marks a rule-based fallback after the
/// search could not produce statistics.
#[derive(Debug, Clone)]
pub struct Decision {
    pub card: Card,
    pub degraded: bool,
    pub stats: DecisionStats,
}

#[derive(Debug, Clone, Default)]
pub struct DecisionStats {
    pub worlds_completed: usize,
    pub worlds_failed: usize,
    pub cancelled: bool,
    /// Root candidates ranked best first; empty for short-circuits and
    /// fallbacks.
    pub candidates: Vec<AggregatedMove>,
}

#[derive(Debug, Clone, Error)]
pub enum DecisionError {
    #[error(transparent)]
    Observation(#[from] ObservationError),
    #[error("it is not the observing seat's turn to act")]
    NotSeatsTurn,
    #[error("observed state has no legal moves")]
    NoLegalMoves,
    #[error("round is not in a passing phase")]
    NotPassing,
}

impl DecisionEngine {
    /// Pool sized to the host's hardware parallelism.
    pub fn new() -> Self {
        Self {
            pool: WorkerPool::with_default_parallelism(),
        }
    }

    pub fn with_threads(threads: usize) -> Self {
        Self {
            pool: WorkerPool::new(threads),
        }
    }

    /// Chooses the card to play for the observing seat.
    pub fn choose_move(
        &self,
        obs: &ObservedRound,
        config: &SearchConfig,
    ) -> Result<Card, DecisionError> {
        self.decide(obs, config).map(|decision| decision.card)
    }

    /// Like [`choose_move`](Self::choose_move), with the full statistics and
    /// the degraded flag.
    pub fn decide(
        &self,
        obs: &ObservedRound,
        config: &SearchConfig,
    ) -> Result<Decision, DecisionError> {
        obs.validate()?;
        if obs.seat_to_act() != obs.my_seat {
            return Err(DecisionError::NotSeatsTurn);
        }
        let legal = obs.legal_moves();
        let Some(&first) = legal.first() else {
            return Err(DecisionError::NoLegalMoves);
        };

        if legal.len() == 1 {
            debug!(target: "hearts_search::engine", card = %first, "single legal move, skipping search");
            return Ok(Decision {
                card: first,
                degraded: false,
                stats: DecisionStats::default(),
            });
        }

        let belief = Belief::from_observation(obs, config.belief_level);
        let cancel = Arc::new(AtomicBool::new(false));
        let pool = config.threaded.then_some(&self.pool);

        match driver::run(obs, &belief, config, pool, cancel) {
            Ok(report) => {
                debug!(
                    target: "hearts_search::engine",
                    card = %report.chosen,
                    worlds = report.worlds_completed,
                    cancelled = report.cancelled,
                    "decision complete"
                );
                Ok(Decision {
                    card: report.chosen,
                    degraded: false,
                    stats: DecisionStats {
                        worlds_completed: report.worlds_completed,
                        worlds_failed: report.worlds_failed,
                        cancelled: report.cancelled,
                        candidates: report.candidates,
                    },
                })
            }
            Err(error) => {
                // Rule-based fallback: the lowest legal card.
                let fallback = legal
                    .iter()
                    .copied()
                    .min_by_key(|card| card.sort_key())
                    .expect("legal moves are non-empty");
                warn!(
                    target: "hearts_search::engine",
                    %error,
                    card = %fallback,
                    "search degraded, returning fallback move"
                );
                Ok(Decision {
                    card: fallback,
                    degraded: true,
                    stats: DecisionStats::default(),
                })
            }
        }
    }

    /// Picks the three cards to pass: the ranking unloads the queen of
    /// spades, high spades and high hearts, and works toward short suits.
    pub fn choose_pass(&self, obs: &ObservedRound) -> Result<[Card; 3], DecisionError> {
        obs.validate()?;
        if !obs.rules.contains(RulesMask::DO_PASS_CARDS)
            || !obs.pass_direction.requires_selection()
        {
            return Err(DecisionError::NotPassing);
        }
        if obs.my_hand.len() < 3 || !obs.completed_tricks.is_empty() {
            return Err(DecisionError::NotPassing);
        }

        let mut scored: Vec<(Card, i32)> = obs
            .my_hand
            .iter()
            .copied()
            .map(|card| (card, pass_danger(card, obs)))
            .collect();
        scored.sort_by(|(card_a, score_a), (card_b, score_b)| {
            score_b
                .cmp(score_a)
                .then(card_a.sort_key().cmp(&card_b.sort_key()))
        });

        Ok([scored[0].0, scored[1].0, scored[2].0])
    }
}

impl Default for DecisionEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn pass_danger(card: Card, obs: &ObservedRound) -> i32 {
    let mut score = card.rank.value() as i32;
    if card.is_queen_of_spades() {
        score += 200;
    } else if card.suit == hearts_core::Suit::Spades && card.rank > hearts_core::Rank::Queen {
        score += 150;
    }
    if card.is_heart() {
        score += 40 + card.rank.value() as i32;
    }
    let suit_len = obs.my_hand.count_suit(card.suit) as i32;
    if !card.is_heart() && suit_len <= 3 {
        score += (4 - suit_len) * 15;
    }
    score
}
