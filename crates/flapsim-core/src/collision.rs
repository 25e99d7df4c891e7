//! Collision oracle
//!
//! Obstacle hits are decided on occupied pixels, not bounding boxes: the
//! agent's rounded corners may graze a lip without dying. Floor and
//! ceiling are plain comparisons.

use glam::IVec2;

use flapsim_simulation::SimConfig;
use flapsim_simulation::shapes::SpriteSet;

use crate::agent::{Agent, DeathCause};
use crate::obstacle::ObstaclePair;

/// Read-only collision queries shared by every agent of a generation
pub struct CollisionOracle {
    sprites: SpriteSet,
    gap_height: f32,
    floor_y: f32,
    ceiling_y: f32,
    agent_height: f32,
}

impl CollisionOracle {
    pub fn new(config: &SimConfig) -> Self {
        Self {
            sprites: SpriteSet::from_config(config),
            gap_height: config.gap_height,
            floor_y: config.floor_y,
            ceiling_y: config.ceiling_y,
            agent_height: config.agent_height as f32,
        }
    }

    pub fn sprites(&self) -> &SpriteSet {
        &self.sprites
    }

    /// Exact-shape overlap between the agent and either extent of `pair`
    pub fn collides(&self, agent: &Agent, pair: &ObstaclePair) -> bool {
        let agent_px = agent.pixel_position();
        let pair_x = pair.x.round() as i32;
        let top_y = pair.gap_top(self.gap_height).round() as i32 - self.sprites.top.height() as i32;
        let bottom_y = pair.gap_bottom(self.gap_height).round() as i32;

        let top_offset = IVec2::new(pair_x, top_y) - agent_px;
        let bottom_offset = IVec2::new(pair_x, bottom_y) - agent_px;

        let hit = self.sprites.agent.overlaps(&self.sprites.top, top_offset)
            || self.sprites.agent.overlaps(&self.sprites.bottom, bottom_offset);
        if hit {
            log::trace!("Agent {} hit obstacle {}", agent.index, pair.id);
        }
        hit
    }

    /// Floor or ceiling crossing, if any
    pub fn out_of_bounds(&self, agent: &Agent) -> Option<DeathCause> {
        if agent.position.y + self.agent_height >= self.floor_y {
            Some(DeathCause::Floor)
        } else if agent.position.y < self.ceiling_y {
            Some(DeathCause::Ceiling)
        } else {
            None
        }
    }

    /// Axis-aligned box test, kept for comparison with [`Self::collides`]
    pub fn bounding_boxes_overlap(&self, agent: &Agent, pair: &ObstaclePair) -> bool {
        let (agent_px, agent_max) =
            agent.bounds(self.sprites.agent.width(), self.sprites.agent.height());
        let pair_x = pair.x.round() as i32;
        let pair_right = pair_x + self.sprites.bottom.width() as i32;
        let gap_top = pair.gap_top(self.gap_height).round() as i32;
        let gap_bottom = pair.gap_bottom(self.gap_height).round() as i32;

        let x_overlap = agent_px.x < pair_right && pair_x < agent_max.x;
        let in_top = agent_px.y < gap_top;
        let in_bottom = agent_max.y > gap_bottom;
        x_overlap && (in_top || in_bottom)
    }
}
