/// Random source seam.
///
/// The rules only ever need two kinds of draw: an encounter roll in
/// `[0, upper)` and a damage roll in `[min, max]`. Any `rand::Rng`
/// works; tests can substitute a fixed source for exact assertions.

use rand::rngs::{OsRng, StdRng};
use rand::{Rng, SeedableRng};

pub trait RandomSource {
    /// Uniform draw in `[0, upper)`. `upper` must be positive.
    fn roll_below(&mut self, upper: u32) -> u32;

    /// Uniform draw in `[min, max]` inclusive.
    fn roll_inclusive(&mut self, min: i32, max: i32) -> i32;
}

impl<R: Rng + ?Sized> RandomSource for R {
    fn roll_below(&mut self, upper: u32) -> u32 {
        self.gen_range(0..upper.max(1))
    }

    fn roll_inclusive(&mut self, min: i32, max: i32) -> i32 {
        self.gen_range(min..=max.max(min))
    }
}

/// Build the game RNG: fixed seed if configured, otherwise seeded from the OS.
/// OS seeding is the only fallible step; callers treat failure as fatal.
pub fn game_rng(seed: Option<u64>) -> Result<StdRng, rand::Error> {
    match seed {
        Some(s) => Ok(StdRng::seed_from_u64(s)),
        None => StdRng::from_rng(OsRng),
    }
}

/// Test source returning the same value for every draw (clamped into range).
#[cfg(test)]
pub struct FixedRoll(pub i32);

#[cfg(test)]
impl RandomSource for FixedRoll {
    fn roll_below(&mut self, upper: u32) -> u32 {
        (self.0.max(0) as u32).min(upper.saturating_sub(1))
    }

    fn roll_inclusive(&mut self, min: i32, max: i32) -> i32 {
        self.0.clamp(min, max)
    }
}
