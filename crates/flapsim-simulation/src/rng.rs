//! Random sources for obstacle generation
//!
//! One generator per generation run. With a fixed seed the obstacle course
//! is reproducible; without one it is drawn from OS entropy.

use rand::SeedableRng;
use rand_xoshiro::Xoshiro256StarStar;

/// Random number generator trait used by the obstacle field
pub trait SimRng {
    /// Generate random f32 in [0.0, 1.0)
    fn gen_f32(&mut self) -> f32;

    /// Uniform value in `[lo, hi)`, or `lo` when the span is empty
    fn gen_span(&mut self, lo: f32, hi: f32) -> f32 {
        if hi <= lo {
            return lo;
        }
        lo + self.gen_f32() * (hi - lo)
    }
}

impl<T: ?Sized + rand::Rng> SimRng for T {
    fn gen_f32(&mut self) -> f32 {
        rand::Rng::r#gen(self)
    }
}

/// Generator for one generation
///
/// A configured seed is mixed with the generation index so consecutive
/// generations see different courses while a rerun of the same generation
/// sees the same one.
pub fn generation_rng(seed: Option<u64>, generation_index: u64) -> Xoshiro256StarStar {
    match seed {
        Some(seed) => {
            let mixed = seed ^ generation_index.wrapping_mul(0x9E37_79B9_7F4A_7C15);
            Xoshiro256StarStar::seed_from_u64(mixed)
        }
        None => Xoshiro256StarStar::from_entropy(),
    }
}
