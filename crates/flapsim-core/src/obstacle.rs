//! Obstacle field
//!
//! Shared, procedurally spaced gap obstacles. The field owns the random
//! source of its generation, so every gap center of a run comes from the
//! same stream.

use rand_xoshiro::Xoshiro256StarStar;
use serde::{Deserialize, Serialize};

use flapsim_simulation::{SimConfig, SimRng, generation_rng};

/// One top/bottom obstacle sharing a single gap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObstaclePair {
    /// Spawn serial within the generation
    pub id: u32,
    /// Pass-ledger slot held while the pair is alive
    pub slot: usize,
    /// Left edge
    pub x: f32,
    pub gap_center: f32,
    /// Set once the live flock has cleared this pair
    pub scored: bool,
    pub spawn_tick: u64,
}

impl ObstaclePair {
    /// Lower edge of the top extent
    pub fn gap_top(&self, gap_height: f32) -> f32 {
        self.gap_center - gap_height / 2.0
    }

    /// Upper edge of the bottom extent
    pub fn gap_bottom(&self, gap_height: f32) -> f32 {
        self.gap_center + gap_height / 2.0
    }

    pub fn right_edge(&self, width: u32) -> f32 {
        self.x + width as f32
    }
}

/// Active obstacle pairs, ordered left to right
pub struct ObstacleField {
    pairs: Vec<ObstaclePair>,
    rng: Xoshiro256StarStar,
    slot_in_use: Vec<bool>,
    next_id: u32,
    /// Where the newest pair was spawned, scrolled along with the field
    last_spawn_x: f32,
    spawn_x: f32,
    spacing: f32,
    scroll_speed: f32,
    width: u32,
    gap_range: (f32, f32),
}

impl ObstacleField {
    /// Field for one generation, with its first pair already placed
    pub fn new(config: &SimConfig, generation_index: u64) -> Self {
        let mut field = Self {
            pairs: Vec::with_capacity(config.obstacle_capacity()),
            rng: generation_rng(config.seed, generation_index),
            slot_in_use: vec![false; config.obstacle_capacity()],
            next_id: 0,
            last_spawn_x: config.initial_obstacle_x,
            spawn_x: config.spawn_x(),
            spacing: config.obstacle_spacing,
            scroll_speed: config.scroll_speed,
            width: config.obstacle_width,
            gap_range: config.gap_center_range(),
        };
        field.spawn_at(config.initial_obstacle_x, 0);
        field
    }

    pub fn pairs(&self) -> &[ObstaclePair] {
        &self.pairs
    }

    /// Number of ledger slots
    pub fn capacity(&self) -> usize {
        self.slot_in_use.len()
    }

    /// Total pairs spawned so far this generation
    pub fn spawned(&self) -> u32 {
        self.next_id
    }

    /// Spawn a pair at the spawn line once the newest pair has scrolled a
    /// full spacing away from it
    ///
    /// The distance is tracked even after that pair is pruned, so a spacing
    /// wider than the playfield still holds. Returns the slot of the new
    /// pair so the caller can reset its ledger column.
    pub fn spawn_if_needed(&mut self, current_tick: u64) -> Option<usize> {
        if self.spawn_x - self.last_spawn_x >= self.spacing {
            Some(self.spawn_at(self.spawn_x, current_tick))
        } else {
            None
        }
    }

    /// Scroll every pair left by one tick
    pub fn advance(&mut self) {
        for pair in &mut self.pairs {
            pair.x -= self.scroll_speed;
        }
        self.last_spawn_x -= self.scroll_speed;
    }

    /// Drop pairs whose right edge has left the playfield
    pub fn prune(&mut self) -> usize {
        let width = self.width;
        let before = self.pairs.len();
        let slot_in_use = &mut self.slot_in_use;
        self.pairs.retain(|pair| {
            let keep = pair.right_edge(width) >= 0.0;
            if !keep {
                slot_in_use[pair.slot] = false;
                log::debug!("Obstacle {} left the field", pair.id);
            }
            keep
        });
        before - self.pairs.len()
    }

    /// Nearest pair not yet fully behind `agent_x`
    pub fn nearest_ahead(&self, agent_x: f32) -> Option<&ObstaclePair> {
        self.pairs
            .iter()
            .find(|pair| pair.right_edge(self.width) >= agent_x)
    }

    /// Mark unscored pairs left of `agent_x` as scored, returning how many
    pub fn mark_cleared(&mut self, agent_x: f32) -> u32 {
        let mut cleared = 0;
        for pair in &mut self.pairs {
            if !pair.scored && pair.x < agent_x {
                pair.scored = true;
                cleared += 1;
            }
        }
        cleared
    }

    fn spawn_at(&mut self, x: f32, tick: u64) -> usize {
        let Some(slot) = self.slot_in_use.iter().position(|used| !used) else {
            panic!(
                "obstacle field exceeded its {} ledger slots",
                self.slot_in_use.len()
            );
        };
        self.slot_in_use[slot] = true;

        let (lo, hi) = self.gap_range;
        let gap_center = self.rng.gen_span(lo, hi);
        let id = self.next_id;
        self.next_id += 1;
        self.last_spawn_x = x;
        log::debug!(
            "Spawned obstacle {} at x={:.0}, gap center {:.1} (slot {})",
            id,
            x,
            gap_center,
            slot
        );
        self.pairs.push(ObstaclePair {
            id,
            slot,
            x,
            gap_center,
            scored: false,
            spawn_tick: tick,
        });
        slot
    }
}
