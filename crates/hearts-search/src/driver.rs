//! The IS-MCTS driver: draws worlds from the belief, runs an independent UCT
//! search per world, and folds the per-world root statistics into a single
//! decision under the configured rule.

use crate::config::{DecisionRule, SearchConfig};
use crate::playout::{EpsilonGreedyPlayout, PlayoutPolicy};
use crate::pool::WorkerPool;
use crate::uct::{SearchOutcome, UctConfig, UctSearch};
use hearts_core::{sample_world, Belief, BeliefLevel, Card, ObservedRound, SamplingError};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, warn};

/// One legal move with its cross-world aggregate.
#[derive(Debug, Clone, Copy)]
pub struct AggregatedMove {
    pub card: Card,
    /// Aggregate reward under the decision rule; higher is better.
    pub score: f64,
    /// Total visits across all worlds.
    pub visits: u64,
    /// Worlds in which the move collected at least one visit.
    pub worlds: usize,
}

#[derive(Debug, Clone)]
pub struct DriverReport {
    pub chosen: Card,
    pub candidates: Vec<AggregatedMove>,
    pub worlds_completed: usize,
    pub worlds_failed: usize,
    pub cancelled: bool,
}

#[derive(Debug, Clone, Error)]
pub enum DriverError {
    #[error("{failed} of {total} worlds failed; not enough statistics to decide")]
    InsufficientWorlds { failed: usize, total: usize },
    #[error("no root move collected any statistics")]
    NoStatistics,
}

struct WorldMessage {
    result: Result<(SearchOutcome, f64), SamplingError>,
}

/// Runs one decision: `worlds` sampled determinizations, each searched with
/// `simulations / worlds` UCT iterations, aggregated per the decision rule.
pub fn run(
    obs: &ObservedRound,
    belief: &Belief,
    config: &SearchConfig,
    pool: Option<&WorkerPool>,
    cancel: Arc<AtomicBool>,
) -> Result<DriverReport, DriverError> {
    let legal = obs.legal_moves();
    let total_worlds = config.worlds.max(1);
    let policy: Arc<dyn PlayoutPolicy> =
        Arc::new(EpsilonGreedyPlayout::new(config.playout_epsilon));
    let uct_config = UctConfig {
        simulations: config.simulations_per_world(),
        exploration: config.exploration,
    };
    let deadline_at = config.deadline.map(|budget| Instant::now() + budget);

    let outcomes = match pool {
        Some(pool) => run_pooled(
            obs,
            belief,
            config,
            uct_config,
            &policy,
            pool,
            &cancel,
            deadline_at,
            total_worlds,
        ),
        None => run_inline(
            obs,
            belief,
            config,
            uct_config,
            &policy,
            &cancel,
            deadline_at,
            total_worlds,
        ),
    };

    let worlds_failed = total_worlds - outcomes.len();
    if worlds_failed * 2 > total_worlds {
        return Err(DriverError::InsufficientWorlds {
            failed: worlds_failed,
            total: total_worlds,
        });
    }

    let report = aggregate(
        obs,
        &legal,
        config,
        outcomes,
        total_worlds,
        worlds_failed,
        cancel.load(Ordering::Relaxed),
    )?;
    Ok(report)
}

#[allow(clippy::too_many_arguments)]
fn run_pooled(
    obs: &ObservedRound,
    belief: &Belief,
    config: &SearchConfig,
    uct_config: UctConfig,
    policy: &Arc<dyn PlayoutPolicy>,
    pool: &WorkerPool,
    cancel: &Arc<AtomicBool>,
    deadline_at: Option<Instant>,
    total_worlds: usize,
) -> Vec<(SearchOutcome, f64)> {
    let obs = Arc::new(obs.clone());
    let belief = Arc::new(belief.clone());
    let (tx, rx) = mpsc::channel::<WorldMessage>();

    for world_index in 0..total_worlds {
        let obs = Arc::clone(&obs);
        let belief = Arc::clone(&belief);
        let policy = Arc::clone(policy);
        let cancel = Arc::clone(cancel);
        let tx = tx.clone();
        let seed = config.seed;
        pool.submit(move || {
            let result = world_task(&obs, &belief, uct_config, policy, &cancel, seed, world_index);
            let _ = tx.send(WorldMessage { result });
        });
    }
    drop(tx);

    let mut outcomes = Vec::with_capacity(total_worlds);
    let mut received = 0;
    while received < total_worlds {
        let message = match deadline_at {
            Some(at) if !cancel.load(Ordering::Relaxed) => {
                let budget = at.saturating_duration_since(Instant::now());
                match rx.recv_timeout(budget) {
                    Ok(message) => message,
                    Err(mpsc::RecvTimeoutError::Timeout) => {
                        debug!(target: "hearts_search::driver", "deadline expired, cancelling outstanding worlds");
                        cancel.store(true, Ordering::Relaxed);
                        continue;
                    }
                    Err(mpsc::RecvTimeoutError::Disconnected) => break,
                }
            }
            _ => match rx.recv() {
                Ok(message) => message,
                Err(_) => break,
            },
        };
        received += 1;
        match message.result {
            Ok(outcome) => outcomes.push(outcome),
            Err(error) => {
                warn!(target: "hearts_search::driver", %error, "world failed");
            }
        }
    }
    outcomes
}

#[allow(clippy::too_many_arguments)]
fn run_inline(
    obs: &ObservedRound,
    belief: &Belief,
    config: &SearchConfig,
    uct_config: UctConfig,
    policy: &Arc<dyn PlayoutPolicy>,
    cancel: &Arc<AtomicBool>,
    deadline_at: Option<Instant>,
    total_worlds: usize,
) -> Vec<(SearchOutcome, f64)> {
    let mut outcomes = Vec::with_capacity(total_worlds);
    for world_index in 0..total_worlds {
        if let Some(at) = deadline_at {
            if Instant::now() >= at {
                cancel.store(true, Ordering::Relaxed);
            }
        }
        match world_task(
            obs,
            belief,
            uct_config,
            Arc::clone(policy),
            cancel,
            config.seed,
            world_index,
        ) {
            Ok(outcome) => outcomes.push(outcome),
            Err(error) => {
                warn!(target: "hearts_search::driver", %error, "world failed");
            }
        }
    }
    outcomes
}

/// Samples one world and searches it. On an inconsistent belief the worker
/// downgrades to the basic level before giving up.
fn world_task(
    obs: &ObservedRound,
    belief: &Belief,
    uct_config: UctConfig,
    policy: Arc<dyn PlayoutPolicy>,
    cancel: &AtomicBool,
    master_seed: u64,
    world_index: usize,
) -> Result<(SearchOutcome, f64), SamplingError> {
    let mut rng = SmallRng::seed_from_u64(master_seed.wrapping_add(world_index as u64));

    let world = match sample_world(belief, &mut rng) {
        Ok(world) => world,
        Err(error) => {
            debug!(
                target: "hearts_search::driver",
                %error,
                world_index,
                "sampling failed, downgrading belief to basic"
            );
            let basic = Belief::from_observation(obs, BeliefLevel::Basic);
            sample_world(&basic, &mut rng)?
        }
    };

    let log_weight = world.log_weight();
    let root = obs.determinize(world.into_hands());
    let search = UctSearch::new(uct_config, policy);
    let outcome = search.run(&root, cancel, &mut rng);
    Ok((outcome, log_weight))
}

fn aggregate(
    obs: &ObservedRound,
    legal: &[Card],
    config: &SearchConfig,
    outcomes: Vec<(SearchOutcome, f64)>,
    total_worlds: usize,
    worlds_failed: usize,
    cancelled: bool,
) -> Result<DriverReport, DriverError> {
    let worlds_completed = outcomes.len();

    // Normalize world weights through the max log-weight to avoid underflow.
    let max_log = outcomes
        .iter()
        .map(|(_, log_weight)| *log_weight)
        .fold(f64::NEG_INFINITY, f64::max);
    let weighted: Vec<(&SearchOutcome, f64)> = outcomes
        .iter()
        .map(|(outcome, log_weight)| (outcome, (log_weight - max_log).exp()))
        .collect();

    let mut candidates = Vec::new();
    for &card in legal {
        let mut per_world: Vec<(f64, u32, f64)> = Vec::new(); // (q, visits, world weight)
        for (outcome, world_weight) in &weighted {
            if let Some(root_move) = outcome.moves.iter().find(|m| m.card == card) {
                if root_move.visits > 0 {
                    per_world.push((
                        root_move.mean_reward(obs.my_seat),
                        root_move.visits,
                        *world_weight,
                    ));
                }
            }
        }
        if per_world.is_empty() {
            continue;
        }

        let visits: u64 = per_world.iter().map(|(_, n, _)| *n as u64).sum();
        let score = match config.decision_rule {
            DecisionRule::MaxWeighted => {
                let den: f64 = per_world.iter().map(|(_, n, w)| w * *n as f64).sum();
                let num: f64 = per_world.iter().map(|(q, n, w)| q * w * *n as f64).sum();
                num / den
            }
            DecisionRule::MaxAverage => mean(per_world.iter().map(|(q, _, _)| *q)),
            DecisionRule::MaxAvgMinusVar => {
                let qs: Vec<f64> = per_world.iter().map(|(q, _, _)| *q).collect();
                let avg = mean(qs.iter().copied());
                let var = mean(qs.iter().map(|q| (q - avg) * (q - avg)));
                avg - config.variance_penalty * var
            }
            DecisionRule::MaxMin => per_world
                .iter()
                .map(|(q, _, _)| *q)
                .fold(f64::INFINITY, f64::min),
        };

        candidates.push(AggregatedMove {
            card,
            score,
            visits,
            worlds: per_world.len(),
        });
    }

    if candidates.is_empty() {
        return Err(DriverError::NoStatistics);
    }

    // Best score; ties go to the better-explored move, then the lowest card.
    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(b.visits.cmp(&a.visits))
            .then(a.card.sort_key().cmp(&b.card.sort_key()))
    });
    let chosen = candidates[0].card;

    Ok(DriverReport {
        chosen,
        candidates,
        worlds_completed,
        worlds_failed: worlds_failed.min(total_worlds),
        cancelled,
    })
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for value in values {
        sum += value;
        count += 1;
    }
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}
