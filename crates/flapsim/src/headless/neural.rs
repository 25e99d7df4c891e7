//! Feed-forward policy network
//!
//! Simple 2-layer network: observation -> hidden (tanh) -> jump output (sigmoid).
//! Weights live in one flat vector so they can be stored and mutated as a
//! single genome-like blob.

use anyhow::{Context, Result, ensure};
use rand::Rng;
use serde::{Deserialize, Serialize};

use flapsim_core::{OBSERVATION_LEN, Observation, Policy, PolicyError};

/// Observations are in pixels; scale them into tanh's useful range
const INPUT_SCALE: f32 = 1.0 / 400.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedForwardPolicy {
    hidden_dim: usize,
    /// `hidden_dim * (inputs + 1)` input weights with biases, then
    /// `hidden_dim + 1` output weights with bias
    weights: Vec<f32>,
}

impl FeedForwardPolicy {
    pub fn weight_count(hidden_dim: usize) -> usize {
        hidden_dim * (OBSERVATION_LEN + 1) + hidden_dim + 1
    }

    pub fn from_weights(hidden_dim: usize, weights: Vec<f32>) -> Result<Self> {
        ensure!(hidden_dim > 0, "network needs at least one hidden neuron");
        ensure!(
            weights.len() == Self::weight_count(hidden_dim),
            "expected {} weights for {} hidden neurons, got {}",
            Self::weight_count(hidden_dim),
            hidden_dim,
            weights.len()
        );
        Ok(Self {
            hidden_dim,
            weights,
        })
    }

    /// Uniform weights in [-1, 1)
    pub fn random<R: Rng + ?Sized>(hidden_dim: usize, rng: &mut R) -> Self {
        let weights = (0..Self::weight_count(hidden_dim))
            .map(|_| rng.gen_range(-1.0..1.0))
            .collect();
        Self {
            hidden_dim,
            weights,
        }
    }

    pub fn hidden_dim(&self) -> usize {
        self.hidden_dim
    }

    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    /// Jump probability-like output in (0, 1)
    pub fn forward(&self, input: &[f32; OBSERVATION_LEN]) -> f32 {
        let stride = OBSERVATION_LEN + 1;
        let (input_weights, output_weights) = self.weights.split_at(self.hidden_dim * stride);

        let mut sum = output_weights[self.hidden_dim];
        for (h, row) in input_weights.chunks_exact(stride).enumerate() {
            let mut activation = row[OBSERVATION_LEN];
            for (x, w) in input.iter().zip(row) {
                activation += x * INPUT_SCALE * w;
            }
            sum += activation.tanh() * output_weights[h];
        }
        sigmoid(sum)
    }

    pub fn to_blob(&self) -> Result<Vec<u8>> {
        bincode_next::serde::encode_to_vec(self, bincode_next::config::standard())
            .context("Failed to serialize policy")
    }

    pub fn from_blob(blob: &[u8]) -> Result<Self> {
        let (policy, _): (Self, usize) =
            bincode_next::serde::decode_from_slice(blob, bincode_next::config::standard())
                .map_err(|e| anyhow::anyhow!("Failed to deserialize policy: {:?}", e))?;
        Self::from_weights(policy.hidden_dim, policy.weights)
    }
}

impl Policy for FeedForwardPolicy {
    fn decide(&mut self, observation: &Observation) -> Result<f32, PolicyError> {
        Ok(self.forward(&observation.0))
    }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}
