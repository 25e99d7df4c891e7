//! Agent physics
//!
//! Agents only move vertically. Velocity is integrated once per tick and
//! the tilt is a cosmetic function of velocity that nothing reads back.

use glam::{IVec2, Vec2};
use serde::{Deserialize, Serialize};

use flapsim_simulation::SimConfig;

/// Maximum upward tilt in degrees
pub const MAX_TILT: f32 = 25.0;
/// Maximum nose-down tilt in degrees
pub const MIN_TILT: f32 = -90.0;
/// Degrees of tilt per pixel/tick of vertical velocity
pub const TILT_PER_VELOCITY: f32 = 9.0;

/// Why an agent stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeathCause {
    Floor,
    Ceiling,
    Obstacle,
    /// The policy errored, panicked or returned a non-finite value
    PolicyFault,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentStatus {
    Alive,
    Dead(DeathCause),
}

/// One policy's body for the duration of a generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    /// Index of the policy driving this agent
    pub index: usize,
    /// Top-left of the sprite
    pub position: Vec2,
    /// Vertical velocity (positive = down)
    pub velocity: f32,
    /// Presentation tilt in degrees
    pub tilt: f32,
    pub status: AgentStatus,
    pub fitness: f64,
    pub frames_survived: u64,
    pub pipes_passed: u32,
    /// Tick on which the agent died
    pub death_tick: Option<u64>,
}

impl Agent {
    pub fn new(index: usize, config: &SimConfig) -> Self {
        Self {
            index,
            position: Vec2::new(config.agent_x, config.agent_start_y),
            velocity: 0.0,
            tilt: 0.0,
            status: AgentStatus::Alive,
            fitness: 0.0,
            frames_survived: 0,
            pipes_passed: 0,
            death_tick: None,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.status == AgentStatus::Alive
    }

    pub fn death_cause(&self) -> Option<DeathCause> {
        match self.status {
            AgentStatus::Alive => None,
            AgentStatus::Dead(cause) => Some(cause),
        }
    }

    /// Accelerate downward, capped at terminal velocity
    pub fn apply_gravity(&mut self, gravity: f32, max_fall_speed: f32) {
        self.velocity = (self.velocity + gravity).min(max_fall_speed);
    }

    /// Replace the current velocity with an upward jump
    pub fn apply_impulse(&mut self, jump_velocity: f32) {
        self.velocity = jump_velocity;
    }

    /// Integrate velocity into position and refresh the tilt
    pub fn advance(&mut self) {
        self.position.y += self.velocity;
        self.tilt = (-self.velocity * TILT_PER_VELOCITY).clamp(MIN_TILT, MAX_TILT);
    }

    /// Sprite position snapped to the pixel grid
    pub fn pixel_position(&self) -> IVec2 {
        IVec2::new(
            self.position.x.round() as i32,
            self.position.y.round() as i32,
        )
    }

    /// Pixel bounding box as `(min, max)`, max exclusive
    pub fn bounds(&self, width: u32, height: u32) -> (IVec2, IVec2) {
        let min = self.pixel_position();
        (min, min + IVec2::new(width as i32, height as i32))
    }

    /// Pin the agent to whichever boundary it crossed
    pub fn clamp_to_bounds(&mut self, cause: DeathCause, config: &SimConfig) {
        match cause {
            DeathCause::Floor => {
                self.position.y = config.floor_y - config.agent_height as f32;
            }
            DeathCause::Ceiling => self.position.y = config.ceiling_y,
            _ => {}
        }
    }

    /// Transition to dead; an agent dies exactly once
    pub fn kill(&mut self, cause: DeathCause, tick: u64) {
        assert!(
            self.is_alive(),
            "agent {} killed twice ({:?} after {:?})",
            self.index,
            cause,
            self.status
        );
        self.status = AgentStatus::Dead(cause);
        self.death_tick = Some(tick);
    }
}
