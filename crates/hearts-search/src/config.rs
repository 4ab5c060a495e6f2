use hearts_core::BeliefLevel;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How per-world statistics are combined into one decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecisionRule {
    /// Weight each world by its likelihood times per-move visits.
    MaxWeighted,
    /// Simple mean reward across the worlds where the move was explored.
    MaxAverage,
    /// Mean minus a variance penalty; prefers consistent moves.
    MaxAvgMinusVar,
    /// Pessimistic: maximise the worst per-world mean.
    MaxMin,
}

/// Two-phase UCB exploration constant: `initial` until a node has seen
/// `crossover_visits`, then `late`. Set both equal for a single phase.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExplorationSchedule {
    pub initial: f64,
    pub late: f64,
    pub crossover_visits: u32,
}

impl ExplorationSchedule {
    pub fn constant(c: f64) -> Self {
        Self {
            initial: c,
            late: c,
            crossover_visits: 0,
        }
    }

    pub fn at(&self, visits: u32) -> f64 {
        if visits < self.crossover_visits {
            self.initial
        } else {
            self.late
        }
    }
}

/// Per-decision configuration for the IS-MCTS engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Number of sampled worlds per decision.
    pub worlds: usize,
    /// Total simulation budget, divided across worlds.
    pub simulations: usize,
    pub belief_level: BeliefLevel,
    pub decision_rule: DecisionRule,
    pub exploration: ExplorationSchedule,
    /// Probability of a uniform move inside the greedy playout.
    pub playout_epsilon: f64,
    /// Lambda applied by `DecisionRule::MaxAvgMinusVar`.
    pub variance_penalty: f64,
    /// Run worlds on the worker pool; disable for reproducibility.
    pub threaded: bool,
    /// Optional wall-clock budget; expiry cancels outstanding searches.
    pub deadline: Option<Duration>,
    /// Master seed; each world derives its own RNG from it.
    pub seed: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            worlds: 30,
            simulations: 3000,
            belief_level: BeliefLevel::VoidAware,
            decision_rule: DecisionRule::MaxWeighted,
            exploration: ExplorationSchedule::constant(0.4),
            playout_epsilon: 0.1,
            variance_penalty: 1.0,
            threaded: true,
            deadline: None,
            seed: 0,
        }
    }
}

impl SearchConfig {
    pub fn simulations_per_world(&self) -> usize {
        (self.simulations / self.worlds.max(1)).max(1)
    }
}
