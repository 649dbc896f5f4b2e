//! Minimal PCG32 random number generator.
//!
//! A small, statistically good PRNG (PCG-XSH-RR with 64-bit state) kept
//! in-crate instead of depending on the `rand` crate. It drives piece
//! placement shuffles and room-code generation. NOT cryptographically
//! secure — room codes are short-lived and low-entropy by design.
//!
//! Reference: <https://www.pcg-random.org/>

/// Default increment for single-stream PCG32, from the PCG paper.
const PCG_DEFAULT_INCREMENT: u64 = 1442695040888963407;

/// Multiplier constant for the LCG step (standard for 64-bit state PCG).
const PCG_MULTIPLIER: u64 = 6364136223846793005;

/// PCG32 random number generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pcg32 {
    state: u64,
    inc: u64,
}

impl Pcg32 {
    /// Creates a new generator from the given state and stream. The
    /// increment must be odd; it is made odd by OR-ing with 1.
    #[must_use]
    pub const fn new(state: u64, stream: u64) -> Self {
        let inc = (stream << 1) | 1;
        // Standard PCG seeding: advance once, add the seed, advance again.
        let mut pcg = Self { state: 0, inc };
        pcg.state = pcg.state.wrapping_mul(PCG_MULTIPLIER).wrapping_add(pcg.inc);
        pcg.state = pcg.state.wrapping_add(state);
        pcg.state = pcg.state.wrapping_mul(PCG_MULTIPLIER).wrapping_add(pcg.inc);
        pcg
    }

    /// Generates the next 32-bit random value.
    #[inline]
    #[must_use]
    pub fn next_u32(&mut self) -> u32 {
        let old_state = self.state;
        self.state = old_state
            .wrapping_mul(PCG_MULTIPLIER)
            .wrapping_add(self.inc);
        // XSH-RR output permutation (xor-shift, random rotate).
        let xorshifted = (((old_state >> 18) ^ old_state) >> 27) as u32;
        let rot = (old_state >> 59) as u32;
        xorshifted.rotate_right(rot)
    }

    /// Generates a random `usize` in `[range.start, range.end)` using
    /// rejection sampling to avoid modulo bias. An empty range returns
    /// `range.start`.
    #[must_use]
    pub fn gen_range(&mut self, range: std::ops::Range<usize>) -> usize {
        let span = range.end.wrapping_sub(range.start);
        if span == 0 {
            return range.start;
        }
        debug_assert!(span <= u32::MAX as usize, "range too wide for 32-bit sampling");
        let span = span as u32;
        let threshold = span.wrapping_neg() % span;
        loop {
            let value = self.next_u32();
            if value >= threshold {
                return range.start.wrapping_add((value % span) as usize);
            }
        }
    }

    /// Shuffles a slice in place with the Fisher-Yates algorithm.
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        for i in (1..slice.len()).rev() {
            let j = self.gen_range(0..i + 1);
            slice.swap(i, j);
        }
    }
}

/// Trait for seeding random number generators.
pub trait SeedableRng: Sized {
    /// Creates a new RNG seeded from a 64-bit value. Different seeds
    /// produce statistically independent sequences.
    #[must_use]
    fn seed_from_u64(seed: u64) -> Self;

    /// Creates a new RNG with a seed derived from process-level entropy.
    /// Sufficient for game shuffles, NOT cryptographically secure.
    #[must_use]
    fn from_entropy() -> Self;
}

impl SeedableRng for Pcg32 {
    fn seed_from_u64(seed: u64) -> Self {
        Self::new(seed, PCG_DEFAULT_INCREMENT)
    }

    fn from_entropy() -> Self {
        Self::seed_from_u64(entropy_seed())
    }
}

/// Derives a seed from the randomly-keyed std hasher mixed with the
/// current time.
fn entropy_seed() -> u64 {
    use std::collections::hash_map::RandomState;
    use std::hash::{BuildHasher, Hasher};

    let nanos = web_time::SystemTime::now()
        .duration_since(web_time::UNIX_EPOCH)
        .map(|duration| duration.as_nanos())
        .unwrap_or(0);
    let mut hasher = RandomState::new().build_hasher();
    hasher.write_u128(nanos);
    hasher.finish()
}
