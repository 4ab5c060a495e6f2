use crate::config::ExplorationSchedule;
use crate::playout::{rollout, PlayoutPolicy};
use hearts_core::{Card, PlayerPosition, RoundState};
use rand::rngs::SmallRng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Copy)]
pub struct UctConfig {
    pub simulations: usize,
    pub exploration: ExplorationSchedule,
}

/// UCT search over one determinized world. The tree owns its arena; the
/// playout policy is a shared read-only reference so parallel searches reuse
/// one instance without duplicating ownership.
pub struct UctSearch {
    config: UctConfig,
    policy: Arc<dyn PlayoutPolicy>,
}

/// Nodes live in a flat arena; edges address children by index.
struct Node {
    visits: u32,
    edges: Vec<Edge>,
}

struct Edge {
    card: Card,
    child: Option<usize>,
    visits: u32,
    rewards: [f64; 4],
}

impl Node {
    fn fresh() -> Self {
        Self {
            visits: 0,
            edges: Vec::new(),
        }
    }
}

impl Edge {
    fn new(card: Card) -> Self {
        Self {
            card,
            child: None,
            visits: 0,
            rewards: [0.0; 4],
        }
    }
}

/// Statistics for one root move after a search.
#[derive(Debug, Clone, Copy)]
pub struct RootMove {
    pub card: Card,
    pub visits: u32,
    /// Per-seat reward sums accumulated through this edge.
    pub rewards: [f64; 4],
}

impl RootMove {
    /// Mean reward for `seat`; rewards are negated scores, so higher is
    /// better.
    pub fn mean_reward(&self, seat: PlayerPosition) -> f64 {
        if self.visits == 0 {
            0.0
        } else {
            self.rewards[seat.index()] / self.visits as f64
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub moves: Vec<RootMove>,
    pub simulations_run: usize,
}

impl UctSearch {
    pub fn new(config: UctConfig, policy: Arc<dyn PlayoutPolicy>) -> Self {
        Self { config, policy }
    }

    /// Runs up to the configured number of simulations, polling `cancel`
    /// between iterations. Partial statistics are a valid result.
    pub fn run(&self, root: &RoundState, cancel: &AtomicBool, rng: &mut SmallRng) -> SearchOutcome {
        let mut arena: Vec<Node> = vec![Node::fresh()];
        let mut simulations_run = 0;

        for _ in 0..self.config.simulations {
            if cancel.load(Ordering::Relaxed) {
                break;
            }
            self.simulate_once(&mut arena, root, rng);
            simulations_run += 1;
        }

        let moves = arena[0]
            .edges
            .iter()
            .map(|edge| RootMove {
                card: edge.card,
                visits: edge.visits,
                rewards: edge.rewards,
            })
            .collect();

        SearchOutcome {
            moves,
            simulations_run,
        }
    }

    /// One Select -> Expand -> Simulate -> Backprop pass.
    fn simulate_once(&self, arena: &mut Vec<Node>, root: &RoundState, rng: &mut SmallRng) {
        let mut state = root.clone();
        let mut path: Vec<(usize, usize)> = Vec::new();
        let mut node_index = 0usize;

        let rewards = loop {
            let Some(seat) = state.next_to_act() else {
                break rewards_from(&state);
            };

            if arena[node_index].edges.is_empty() {
                let legal = state.legal_moves(seat);
                if legal.is_empty() {
                    break rewards_from(&state);
                }
                arena[node_index].edges = legal.into_iter().map(Edge::new).collect();
            }

            let edge_index = select_edge(&arena[node_index], seat, &self.config.exploration);
            let card = arena[node_index].edges[edge_index].card;
            state
                .play_card(seat, card)
                .expect("selection only offers legal moves");
            path.push((node_index, edge_index));

            match arena[node_index].edges[edge_index].child {
                Some(next) => node_index = next,
                None => {
                    let child = arena.len();
                    arena.push(Node::fresh());
                    arena[node_index].edges[edge_index].child = Some(child);
                    break if state.is_terminal() {
                        rewards_from(&state)
                    } else {
                        rollout(&mut state, &*self.policy, rng).map(|s| -(s as f64))
                    };
                }
            }
        };

        for (node, edge) in path {
            arena[node].visits += 1;
            let edge = &mut arena[node].edges[edge];
            edge.visits += 1;
            for seat in 0..4 {
                edge.rewards[seat] += rewards[seat];
            }
        }
    }
}

/// UCB1 with unvisited edges first, in legal-move order.
fn select_edge(node: &Node, seat: PlayerPosition, schedule: &ExplorationSchedule) -> usize {
    if let Some(index) = node.edges.iter().position(|edge| edge.visits == 0) {
        return index;
    }

    let c = schedule.at(node.visits);
    let ln_n = f64::ln(node.visits.max(1) as f64);

    let mut best = 0;
    let mut best_value = f64::NEG_INFINITY;
    for (index, edge) in node.edges.iter().enumerate() {
        let n = edge.visits as f64;
        let q = edge.rewards[seat.index()] / n;
        let value = q + c * (ln_n / n).sqrt();
        if value > best_value {
            best_value = value;
            best = index;
        }
    }
    best
}

fn rewards_from(state: &RoundState) -> [f64; 4] {
    state.round_scores().map(|score| -(score as f64))
}
