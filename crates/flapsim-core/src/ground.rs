//! Scrolling floor plane
//!
//! Presentation state only: the floor line used for collisions lives in
//! the config, this just tracks how far the tiles have scrolled.

/// Shared horizontal scroll of the ground tiles
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ground {
    offset: f32,
    tile_width: f32,
    scroll_speed: f32,
}

impl Ground {
    pub fn new(tile_width: u32, scroll_speed: f32) -> Self {
        Self {
            offset: 0.0,
            tile_width: tile_width as f32,
            scroll_speed,
        }
    }

    pub fn advance(&mut self) {
        self.offset = (self.offset + self.scroll_speed) % self.tile_width;
    }

    /// Scroll position in `[0, tile_width)`
    pub fn offset(&self) -> f32 {
        self.offset
    }

    /// X positions of the two tiles covering the playfield
    pub fn tile_positions(&self) -> [f32; 2] {
        [-self.offset, self.tile_width - self.offset]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ground_wraps() {
        let mut ground = Ground::new(336, 5.0);
        for _ in 0..67 {
            ground.advance();
        }
        assert_eq!(ground.offset(), 335.0);
        ground.advance();
        assert_eq!(ground.offset(), 4.0);
        assert_eq!(ground.tile_positions(), [-4.0, 332.0]);
    }
}
