//! Headless training driver
//!
//! Wires the generation evaluator to a policy population:
//! - Feed-forward policy networks
//! - A sampling population that draws fresh networks every generation
//! - Checkpoints of the best policy seen so far
//! - The training loop with progress output and stats

mod checkpoint;
mod neural;
mod population;
mod trainer;

pub use checkpoint::{BestTracker, CheckpointRecord, CheckpointStore, CheckpointSummary};
pub use neural::FeedForwardPolicy;
pub use population::SampledPopulation;
pub use trainer::{TrainingConfig, TrainingEnv, TrainingStats};
