//! Per-episode random streams.
//!
//! Every episode gets its own `ChaCha8Rng`, seeded from the run seed and the
//! episode index, so results do not depend on execution order.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// SplitMix64 finaliser over `(seed, episode)`.
#[must_use]
pub fn episode_seed(seed: u64, episode: u64) -> u64 {
    let mut z = seed ^ episode.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[must_use]
pub fn episode_rng(seed: u64, episode: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(episode_seed(seed, episode))
}

/// Draws from a discrete distribution given as `(value, probability)` pairs.
///
/// Rounding slack at the top end falls to the last entry.
pub fn sample<T: Copy, R: Rng + ?Sized>(dist: &[(T, f64)], rng: &mut R) -> Option<T> {
    let u: f64 = rng.gen();
    let mut acc = 0.0;
    for (value, p) in dist {
        acc += p;
        if u < acc {
            return Some(*value);
        }
    }
    dist.last().map(|(value, _)| *value)
}
