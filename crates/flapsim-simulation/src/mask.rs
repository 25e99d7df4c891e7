//! Pixel-exact collision bitmasks
//!
//! A mask stores one bit per pixel, row-major, packed into `u64` words.
//! Bits past the mask width are always zero so whole words can be ANDed.

use glam::IVec2;

/// Occupied-pixel bitmap used for exact-shape overlap tests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollisionMask {
    width: u32,
    height: u32,
    words_per_row: usize,
    bits: Vec<u64>,
}

impl CollisionMask {
    /// Create an empty mask
    pub fn new(width: u32, height: u32) -> Self {
        let words_per_row = (width as usize).div_ceil(64);
        Self {
            width,
            height,
            words_per_row,
            bits: vec![0; words_per_row * height as usize],
        }
    }

    /// Create a mask with pixels set where `occupied(x, y)` is true
    pub fn from_fn(width: u32, height: u32, mut occupied: impl FnMut(u32, u32) -> bool) -> Self {
        let mut mask = Self::new(width, height);
        for y in 0..height {
            for x in 0..width {
                if occupied(x, y) {
                    mask.set(x, y, true);
                }
            }
        }
        mask
    }

    /// Build a mask from text rows, `#` marks an occupied pixel
    ///
    /// Rows shorter than the longest row are padded with empty pixels.
    pub fn from_ascii(rows: &[&str]) -> Self {
        let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0) as u32;
        let mut mask = Self::new(width, rows.len() as u32);
        for (y, row) in rows.iter().enumerate() {
            for (x, c) in row.chars().enumerate() {
                if c == '#' {
                    mask.set(x as u32, y as u32, true);
                }
            }
        }
        mask
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Whether the pixel is occupied (out-of-range pixels are empty)
    pub fn get(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let word = self.bits[self.word_index(x, y)];
        word & (1 << (x % 64)) != 0
    }

    /// Set or clear a pixel, ignoring out-of-range coordinates
    pub fn set(&mut self, x: u32, y: u32, occupied: bool) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = self.word_index(x, y);
        let bit = 1 << (x % 64);
        if occupied {
            self.bits[idx] |= bit;
        } else {
            self.bits[idx] &= !bit;
        }
    }

    /// Number of occupied pixels
    pub fn count(&self) -> usize {
        self.bits.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Mirror top-to-bottom (turns a bottom obstacle into a top one)
    pub fn flipped_vertical(&self) -> Self {
        let mut flipped = Self::new(self.width, self.height);
        for y in 0..self.height as usize {
            let src = (self.height as usize - 1 - y) * self.words_per_row;
            let dst = y * self.words_per_row;
            flipped.bits[dst..dst + self.words_per_row]
                .copy_from_slice(&self.bits[src..src + self.words_per_row]);
        }
        flipped
    }

    /// First overlapping pixel when `other`'s top-left sits at `offset`
    /// relative to this mask's top-left, in this mask's coordinates
    pub fn overlap(&self, other: &CollisionMask, offset: IVec2) -> Option<IVec2> {
        let x_start = offset.x.max(0);
        let x_end = (offset.x + other.width as i32).min(self.width as i32);
        let y_start = offset.y.max(0);
        let y_end = (offset.y + other.height as i32).min(self.height as i32);
        if x_start >= x_end || y_start >= y_end {
            return None;
        }

        for y in y_start..y_end {
            let other_y = (y - offset.y) as u32;
            let mut x = x_start;
            while x < x_end {
                let len = (x_end - x).min(64) as u32;
                let keep = if len == 64 { u64::MAX } else { (1u64 << len) - 1 };
                let mine = self.bits_from(x as u32, y as u32) & keep;
                let theirs = other.bits_from((x - offset.x) as u32, other_y) & keep;
                let hit = mine & theirs;
                if hit != 0 {
                    return Some(IVec2::new(x + hit.trailing_zeros() as i32, y));
                }
                x += len as i32;
            }
        }
        None
    }

    /// Whether any occupied pixels coincide (see [`Self::overlap`])
    pub fn overlaps(&self, other: &CollisionMask, offset: IVec2) -> bool {
        self.overlap(other, offset).is_some()
    }

    fn word_index(&self, x: u32, y: u32) -> usize {
        y as usize * self.words_per_row + (x / 64) as usize
    }

    /// Up to 64 pixels of row `y` starting at column `x`, bit 0 = column `x`
    fn bits_from(&self, x: u32, y: u32) -> u64 {
        let row = y as usize * self.words_per_row;
        let word = (x / 64) as usize;
        let shift = x % 64;
        let mut bits = self.bits[row + word] >> shift;
        if shift > 0 && word + 1 < self.words_per_row {
            bits |= self.bits[row + word + 1] << (64 - shift);
        }
        bits
    }
}
