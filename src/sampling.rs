//! Random subsampling without replacement.

use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Draws `n` distinct elements of `candidates` using `rng`.
///
/// Returns every candidate, in the original order, when `n >= candidates.len()`.
/// Otherwise the result is in draw order.
pub fn sample<T: Clone, R: Rng + ?Sized>(rng: &mut R, candidates: &[T], n: usize) -> Vec<T> {
    if n >= candidates.len() {
        return candidates.to_vec();
    }
    rand::seq::index::sample(rng, candidates.len(), n)
        .into_iter()
        .map(|i| candidates[i].clone())
        .collect()
}

/// Seeded sampler. The seed is always known so a run can be repeated.
pub struct RandomSubsampler {
    seed: u64,
    rng: StdRng,
}

impl RandomSubsampler {
    /// Uses `seed` if given, otherwise draws one from the thread RNG.
    pub fn new(seed: Option<u64>) -> Self {
        let seed = seed.unwrap_or_else(|| rand::rng().random());
        info!("Sampling with seed {}", seed);
        RandomSubsampler {
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn sample<T: Clone>(&mut self, candidates: &[T], n: usize) -> Vec<T> {
        sample(&mut self.rng, candidates, n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_sample_all_when_n_exceeds_candidates() {
        let mut rng = StdRng::seed_from_u64(7);
        let candidates = vec![3, 1, 2];
        assert_eq!(sample(&mut rng, &candidates, 3), candidates);
        assert_eq!(sample(&mut rng, &candidates, 10), candidates);
        assert!(sample::<u32, _>(&mut rng, &[], 4).is_empty());
    }

    #[test]
    fn test_sample_distinct_members() {
        let mut rng = StdRng::seed_from_u64(42);
        let candidates: Vec<u32> = (100..200).collect();
        for n in [0, 1, 5, 99] {
            let drawn = sample(&mut rng, &candidates, n);
            assert_eq!(drawn.len(), n);
            let unique: HashSet<u32> = drawn.iter().copied().collect();
            assert_eq!(unique.len(), n);
            assert!(drawn.iter().all(|x| candidates.contains(x)));
        }
    }

    #[test]
    fn test_same_seed_same_draw() {
        let candidates: Vec<u32> = (0..1000).collect();
        let mut a = RandomSubsampler::new(Some(2024));
        let mut b = RandomSubsampler::new(Some(2024));
        assert_eq!(a.sample(&candidates, 10), b.sample(&candidates, 10));
        assert_eq!(a.seed(), 2024);
    }

    #[test]
    fn test_unseeded_sampler_records_seed() {
        let candidates: Vec<u32> = (0..50).collect();
        let mut first = RandomSubsampler::new(None);
        let drawn = first.sample(&candidates, 5);
        let mut replay = RandomSubsampler::new(Some(first.seed()));
        assert_eq!(replay.sample(&candidates, 5), drawn);
    }
}
