pub mod belief;
pub mod game;
pub mod model;
pub mod rules;

pub use belief::{sample_world, Belief, BeliefLevel, SampledWorld, SamplingError};
pub use game::observation::{ObservationError, ObservedRound};
pub use model::card::Card;
pub use model::hand::Hand;
pub use model::passing::PassDirection;
pub use model::player::PlayerPosition;
pub use model::rank::Rank;
pub use model::suit::Suit;
pub use model::trick::Trick;
pub use rules::flags::RulesMask;
pub use rules::round::{PlayError, PlayOutcome, RoundPhase, RoundState};
