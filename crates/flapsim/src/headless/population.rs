//! Sampling population
//!
//! Stand-in for an evolutionary service: every generation is a fresh batch
//! of random networks from one seeded generator. No selection, crossover or
//! mutation happens here.

use rand::SeedableRng;
use rand_xoshiro::Xoshiro256StarStar;

use flapsim_core::{PolicyPopulation, PopulationError};

use super::neural::FeedForwardPolicy;

pub struct SampledPopulation {
    size: usize,
    hidden_dim: usize,
    rng: Xoshiro256StarStar,
    last: Vec<FeedForwardPolicy>,
    last_fitness: Vec<f64>,
}

impl SampledPopulation {
    pub fn new(size: usize, hidden_dim: usize, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => Xoshiro256StarStar::seed_from_u64(seed),
            None => Xoshiro256StarStar::from_entropy(),
        };
        Self {
            size,
            hidden_dim,
            rng,
            last: Vec::new(),
            last_fitness: Vec::new(),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Networks handed out by the last `policies` call
    pub fn last_generation(&self) -> &[FeedForwardPolicy] {
        &self.last
    }

    pub fn last_fitness(&self) -> &[f64] {
        &self.last_fitness
    }
}

impl PolicyPopulation for SampledPopulation {
    type Policy = FeedForwardPolicy;

    fn policies(&mut self, generation_index: u64) -> Vec<FeedForwardPolicy> {
        self.last = (0..self.size)
            .map(|_| FeedForwardPolicy::random(self.hidden_dim, &mut self.rng))
            .collect();
        self.last_fitness.clear();
        log::debug!(
            "Sampled {} policies for generation {}",
            self.size,
            generation_index
        );
        self.last.clone()
    }

    fn report_fitness(&mut self, generation_index: u64, fitnesses: &[f64]) {
        debug_assert_eq!(fitnesses.len(), self.last.len());
        self.last_fitness = fitnesses.to_vec();
        log::trace!(
            "Received {} fitness values for generation {}",
            fitnesses.len(),
            generation_index
        );
    }

    fn export_policy(&self, index: usize) -> Result<Vec<u8>, PopulationError> {
        let policy = self.last.get(index).ok_or(PopulationError::UnknownPolicy {
            index,
            len: self.last.len(),
        })?;
        policy
            .to_blob()
            .map_err(|e| PopulationError::Serialize(format!("{e:#}")))
    }
}
