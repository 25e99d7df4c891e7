//! Flapsim generation evaluator
//!
//! Pits a population of black-box policies against one shared, seeded
//! obstacle course and returns a fitness value per policy.
//!
//! ## Modules
//! - `agent`: vertical physics and lifecycle of one agent
//! - `obstacle`: scrolling obstacle pairs with seeded gap placement
//! - `ground`: cosmetic scrolling ground strip
//! - `collision`: pixel-exact obstacle hits plus floor/ceiling bounds
//! - `policy`: observation building and the policy contract
//! - `ledger`: per-agent, per-obstacle pass flags
//! - `evaluator`: the tick loop and fitness bookkeeping
//! - `observer`: optional per-tick hook for renderers and tracing
//! - `population`: interface to whatever owns and evolves the policies

pub mod agent;
pub mod collision;
pub mod evaluator;
pub mod ground;
pub mod ledger;
pub mod observer;
pub mod obstacle;
pub mod policy;
pub mod population;

pub use agent::{Agent, AgentStatus, DeathCause};
pub use collision::CollisionOracle;
pub use evaluator::{
    AgentOutcome, CompletionReason, GenerationEvaluator, GenerationPhase, GenerationReport,
    GenerationState,
};
pub use ground::Ground;
pub use ledger::PassLedger;
pub use observer::{NoObserver, TickObserver, TickSnapshot};
pub use obstacle::{ObstacleField, ObstaclePair};
pub use policy::{
    Action, ConstantPolicy, FnPolicy, JUMP_THRESHOLD, OBSERVATION_LEN, Observation, Policy,
    PolicyAdapter, PolicyError,
};
pub use population::{PolicyPopulation, PopulationError};

pub use flapsim_simulation::{ConfigError, SimConfig};
