//! Simulation parameters consumed by the evaluator
//!
//! All coordinates are playfield pixels with y growing downward, so the
//! jump velocity is negative and gravity is positive.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Physics, obstacle, geometry and scoring parameters for one training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Downward acceleration added to velocity per tick
    pub gravity: f32,
    /// Velocity set by a jump (negative = upward)
    pub jump_velocity: f32,
    /// Terminal fall speed in pixels/tick
    pub max_fall_speed: f32,

    /// Vertical opening between the top and bottom extent
    pub gap_height: f32,
    /// Minimum distance between the gap and the ceiling/floor
    pub gap_margin: f32,
    /// Horizontal distance between consecutive obstacle pairs
    pub obstacle_spacing: f32,
    /// Obstacle width in pixels (lip included)
    pub obstacle_width: u32,
    /// Rows of the full-width lip at the gap edge
    pub obstacle_lip_height: u32,
    /// Columns the shaft is inset from the lip on each side
    pub obstacle_lip_inset: u32,
    /// X of the pair that exists when a generation starts
    pub initial_obstacle_x: f32,
    /// Horizontal scroll per tick
    pub scroll_speed: f32,

    pub playfield_width: f32,
    pub playfield_height: f32,
    /// Touching this line is fatal
    pub floor_y: f32,
    /// Rising above this line is fatal
    pub ceiling_y: f32,
    /// Width of one ground tile (scroll offset wraps at this length)
    pub ground_tile_width: u32,

    /// Fixed horizontal position of every agent
    pub agent_x: f32,
    /// Starting vertical position of every agent
    pub agent_start_y: f32,
    pub agent_width: u32,
    pub agent_height: u32,

    /// Fitness added for every tick survived
    pub survival_reward: f64,
    /// Fitness added once per obstacle pair cleared
    pub pass_bonus: f64,
    /// Fitness removed once on death by collision or leaving the playfield
    pub collision_penalty: f64,
    /// Generation ends once this many pairs have been cleared (None = unbounded)
    pub score_ceiling: Option<u32>,
    /// Generation ends after this many ticks (None = unbounded)
    pub tick_limit: Option<u64>,
    /// Fixed seed for obstacle gap randomization (None = entropy)
    pub seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            gravity: 0.5,
            jump_velocity: -7.0,
            max_fall_speed: 10.0,
            gap_height: 150.0,
            gap_margin: 50.0,
            obstacle_spacing: 300.0,
            obstacle_width: 52,
            obstacle_lip_height: 24,
            obstacle_lip_inset: 2,
            initial_obstacle_x: 700.0,
            scroll_speed: 5.0,
            playfield_width: 600.0,
            playfield_height: 800.0,
            floor_y: 730.0,
            ceiling_y: -50.0,
            ground_tile_width: 336,
            agent_x: 230.0,
            agent_start_y: 350.0,
            agent_width: 34,
            agent_height: 24,
            survival_reward: 0.1,
            pass_bonus: 5.0,
            collision_penalty: 1.0,
            score_ceiling: Some(100),
            tick_limit: None,
            seed: None,
        }
    }
}

impl SimConfig {
    /// Reject configurations that would make a generation meaningless
    pub fn validate(&self) -> Result<(), ConfigError> {
        let reals = [
            ("gravity", self.gravity),
            ("jump_velocity", self.jump_velocity),
            ("max_fall_speed", self.max_fall_speed),
            ("gap_height", self.gap_height),
            ("gap_margin", self.gap_margin),
            ("obstacle_spacing", self.obstacle_spacing),
            ("initial_obstacle_x", self.initial_obstacle_x),
            ("scroll_speed", self.scroll_speed),
            ("playfield_width", self.playfield_width),
            ("playfield_height", self.playfield_height),
            ("floor_y", self.floor_y),
            ("ceiling_y", self.ceiling_y),
            ("agent_x", self.agent_x),
            ("agent_start_y", self.agent_start_y),
        ];
        for (field, value) in reals {
            if !value.is_finite() {
                return Err(ConfigError::NotFinite { field, value });
            }
        }
        let scores = [
            ("survival_reward", self.survival_reward),
            ("pass_bonus", self.pass_bonus),
            ("collision_penalty", self.collision_penalty),
        ];
        for (field, value) in scores {
            if !value.is_finite() {
                return Err(ConfigError::NotFinite {
                    field,
                    value: value as f32,
                });
            }
            if value < 0.0 {
                return Err(ConfigError::Negative {
                    field,
                    value: value as f32,
                });
            }
        }

        let positive = [
            ("gravity", self.gravity),
            ("max_fall_speed", self.max_fall_speed),
            ("gap_height", self.gap_height),
            ("obstacle_spacing", self.obstacle_spacing),
            ("scroll_speed", self.scroll_speed),
            ("playfield_width", self.playfield_width),
            ("playfield_height", self.playfield_height),
            ("obstacle_width", self.obstacle_width as f32),
            ("obstacle_lip_height", self.obstacle_lip_height as f32),
            ("ground_tile_width", self.ground_tile_width as f32),
            ("agent_width", self.agent_width as f32),
            ("agent_height", self.agent_height as f32),
        ];
        for (field, value) in positive {
            if value <= 0.0 {
                return Err(ConfigError::NotPositive { field, value });
            }
        }
        if self.gap_margin < 0.0 {
            return Err(ConfigError::Negative {
                field: "gap_margin",
                value: self.gap_margin,
            });
        }

        if self.jump_velocity >= 0.0 {
            return Err(ConfigError::JumpNotUpward(self.jump_velocity));
        }
        if self.ceiling_y >= self.floor_y {
            return Err(ConfigError::InvertedBounds {
                ceiling_y: self.ceiling_y,
                floor_y: self.floor_y,
            });
        }
        if self.gap_height + 2.0 * self.gap_margin > self.floor_y {
            return Err(ConfigError::GapDoesNotFit {
                gap_height: self.gap_height,
                gap_margin: self.gap_margin,
                floor_y: self.floor_y,
            });
        }

        let min_spacing = (self.obstacle_width + self.agent_width) as f32;
        if self.obstacle_spacing <= min_spacing {
            return Err(ConfigError::SpacingTooSmall {
                spacing: self.obstacle_spacing,
                min: min_spacing,
            });
        }
        // Rounded pixel positions of a pair can only skip the overlap window
        // in one tick at this speed or faster
        let max_scroll = (self.obstacle_width + self.agent_width - 1) as f32;
        if self.scroll_speed >= max_scroll {
            return Err(ConfigError::ScrollTooFast {
                speed: self.scroll_speed,
                max: max_scroll,
            });
        }
        if self.obstacle_lip_inset * 2 >= self.obstacle_width {
            return Err(ConfigError::LipTooWide {
                inset: self.obstacle_lip_inset,
                width: self.obstacle_width,
            });
        }

        let agent_bottom = self.agent_start_y + self.agent_height as f32;
        if self.agent_x < 0.0
            || self.agent_x + self.agent_width as f32 > self.playfield_width
            || self.agent_start_y < self.ceiling_y
            || agent_bottom >= self.floor_y
        {
            return Err(ConfigError::AgentOutsidePlayfield {
                x: self.agent_x,
                y: self.agent_start_y,
            });
        }

        if self.score_ceiling == Some(0) {
            return Err(ConfigError::ZeroScoreCeiling);
        }

        Ok(())
    }

    /// X coordinate where new obstacle pairs appear
    pub fn spawn_x(&self) -> f32 {
        self.playfield_width
    }

    /// Half-open range `[lo, hi)` the gap center is drawn from
    pub fn gap_center_range(&self) -> (f32, f32) {
        let half = self.gap_height / 2.0;
        (
            self.gap_margin + half,
            self.floor_y - self.gap_margin - half,
        )
    }

    /// Upper bound on obstacle pairs alive at once
    pub fn obstacle_capacity(&self) -> usize {
        let span = self.spawn_x().max(self.initial_obstacle_x) + self.obstacle_width as f32;
        (span / self.obstacle_spacing).ceil() as usize + 2
    }
}
