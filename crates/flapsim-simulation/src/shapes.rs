//! Procedural sprite shapes
//!
//! Masks are generated from geometry instead of loaded from images, so the
//! collision shape always matches the configured sizes.

use crate::{CollisionMask, SimConfig};

/// Rasterised ellipse filling a `width x height` box
///
/// A pixel is occupied when its center lies inside the ellipse, so the
/// box corners stay empty.
pub fn agent_mask(width: u32, height: u32) -> CollisionMask {
    let rx = width as f32 / 2.0;
    let ry = height as f32 / 2.0;
    CollisionMask::from_fn(width, height, |x, y| {
        let dx = (x as f32 + 0.5 - rx) / rx;
        let dy = (y as f32 + 0.5 - ry) / ry;
        dx * dx + dy * dy <= 1.0
    })
}

/// Bottom obstacle extent: a full-width lip on the first `lip_height` rows,
/// then a shaft inset by `lip_inset` columns on each side
pub fn obstacle_mask(width: u32, length: u32, lip_height: u32, lip_inset: u32) -> CollisionMask {
    CollisionMask::from_fn(width, length, |x, y| {
        y < lip_height || (x >= lip_inset && x + lip_inset < width)
    })
}

/// Agent, top extent and bottom extent masks for a configuration
#[derive(Debug, Clone)]
pub struct SpriteSet {
    pub agent: CollisionMask,
    pub top: CollisionMask,
    pub bottom: CollisionMask,
}

impl SpriteSet {
    pub fn from_config(config: &SimConfig) -> Self {
        let bottom = obstacle_mask(
            config.obstacle_width,
            config.playfield_height.ceil() as u32,
            config.obstacle_lip_height,
            config.obstacle_lip_inset,
        );
        Self {
            agent: agent_mask(config.agent_width, config.agent_height),
            top: bottom.flipped_vertical(),
            bottom,
        }
    }
}
