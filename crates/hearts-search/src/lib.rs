//! Information-Set Monte Carlo Tree Search for Hearts.
//!
//! One decision flows facade-down: [`DecisionEngine`] validates the observed
//! state and builds a [`hearts_core::Belief`]; the [`driver`] samples worlds
//! and runs one [`uct::UctSearch`] per world (on the [`pool::WorkerPool`]
//! when threading is enabled); per-world root statistics are folded together
//! under a [`DecisionRule`].

pub mod config;
pub mod driver;
pub mod engine;
pub mod playout;
pub mod pool;
pub mod uct;

pub use config::{DecisionRule, ExplorationSchedule, SearchConfig};
pub use driver::{AggregatedMove, DriverError, DriverReport};
pub use engine::{Decision, DecisionEngine, DecisionError, DecisionStats};
pub use playout::{EpsilonGreedyPlayout, PlayoutPolicy, UniformPlayout};
pub use pool::WorkerPool;
pub use uct::{RootMove, SearchOutcome, UctConfig, UctSearch};
