//! Interface to the external policy population
//!
//! The population owns every piece of evolutionary state. Per generation it
//! hands out decision functions and gets one fitness value back per policy,
//! in the same order.

use thiserror::Error;

use crate::policy::Policy;

#[derive(Debug, Error)]
pub enum PopulationError {
    #[error("no policy at index {index} (population holds {len})")]
    UnknownPolicy { index: usize, len: usize },
    #[error("failed to serialize policy: {0}")]
    Serialize(String),
}

pub trait PolicyPopulation {
    type Policy: Policy;

    /// Decision functions for this generation, one per agent
    fn policies(&mut self, generation_index: u64) -> Vec<Self::Policy>;

    /// Fitness per policy, index-aligned with the last `policies` call
    fn report_fitness(&mut self, generation_index: u64, fitnesses: &[f64]);

    /// Opaque serialized form of one policy of the last generation
    fn export_policy(&self, index: usize) -> Result<Vec<u8>, PopulationError>;
}
