//! Policy adapter
//!
//! Turns an agent and its nearest obstacle pair into a fixed observation,
//! asks the policy for one scalar and thresholds it into an action. The
//! evaluator never looks inside a policy.

use std::panic::{AssertUnwindSafe, catch_unwind};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::agent::Agent;
use crate::obstacle::ObstaclePair;

/// Outputs above this value jump
pub const JUMP_THRESHOLD: f32 = 0.5;

/// Number of observation inputs
pub const OBSERVATION_LEN: usize = 3;

/// `[agent y, gap top - agent y, gap bottom - agent y]`
///
/// The two distances are signed: positive means the edge is below the
/// agent's top.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation(pub [f32; OBSERVATION_LEN]);

impl Observation {
    pub fn new(agent: &Agent, pair: &ObstaclePair, gap_height: f32) -> Self {
        Self::from_gap(
            agent,
            pair.gap_top(gap_height),
            pair.gap_bottom(gap_height),
        )
    }

    /// Observation against an explicit gap
    pub fn from_gap(agent: &Agent, gap_top: f32, gap_bottom: f32) -> Self {
        let y = agent.position.y;
        Self([y, gap_top - y, gap_bottom - y])
    }

    pub fn agent_y(&self) -> f32 {
        self.0[0]
    }

    pub fn to_gap_top(&self) -> f32 {
        self.0[1]
    }

    pub fn to_gap_bottom(&self) -> f32 {
        self.0[2]
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Jump,
    Idle,
}

impl Action {
    pub fn from_output(output: f32) -> Self {
        if output > JUMP_THRESHOLD {
            Action::Jump
        } else {
            Action::Idle
        }
    }
}

/// A policy failing to produce a decision
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PolicyError {
    #[error("policy failed: {0}")]
    Failed(String),
    #[error("policy returned non-finite output {0}")]
    NonFinite(f32),
    #[error("policy panicked: {0}")]
    Panicked(String),
}

/// Decision function driving one agent
///
/// Implementations may be neural networks, lookup tables or constants;
/// they may keep internal state but must not touch the simulation.
pub trait Policy: Send {
    fn decide(&mut self, observation: &Observation) -> Result<f32, PolicyError>;
}

impl<P: Policy + ?Sized> Policy for Box<P> {
    fn decide(&mut self, observation: &Observation) -> Result<f32, PolicyError> {
        (**self).decide(observation)
    }
}

impl<P: Policy + ?Sized> Policy for &mut P {
    fn decide(&mut self, observation: &Observation) -> Result<f32, PolicyError> {
        (**self).decide(observation)
    }
}

/// Closure as a policy
pub struct FnPolicy<F>(pub F);

impl<F> Policy for FnPolicy<F>
where
    F: FnMut(&Observation) -> f32 + Send,
{
    fn decide(&mut self, observation: &Observation) -> Result<f32, PolicyError> {
        Ok((self.0)(observation))
    }
}

/// Policy that always returns the same output
#[derive(Debug, Clone, Copy)]
pub struct ConstantPolicy(pub f32);

impl Policy for ConstantPolicy {
    fn decide(&mut self, _observation: &Observation) -> Result<f32, PolicyError> {
        Ok(self.0)
    }
}

/// Stateless bridge between observations and policies
pub struct PolicyAdapter;

impl PolicyAdapter {
    /// Query `policy` exactly once and threshold the result
    ///
    /// Errors, panics and non-finite outputs are all reported as a
    /// [`PolicyError`] so the caller can retire just this agent.
    pub fn act<P: Policy + ?Sized>(
        policy: &mut P,
        observation: &Observation,
    ) -> Result<Action, PolicyError> {
        let output = catch_unwind(AssertUnwindSafe(|| policy.decide(observation)))
            .map_err(|payload| PolicyError::Panicked(panic_message(payload.as_ref())))??;
        if !output.is_finite() {
            return Err(PolicyError::NonFinite(output));
        }
        Ok(Action::from_output(output))
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
