use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};

/// Returns a permutation of `items` drawn from `rng` (Fisher-Yates)
pub fn shuffle_with<T, R: Rng + ?Sized>(mut items: Vec<T>, rng: &mut R) -> Vec<T> {
    items.shuffle(rng);
    items
}

/// Seeded permutation; the same seed always yields the same order
pub fn shuffle_seeded<T>(items: Vec<T>, seed: u64) -> Vec<T> {
    let mut rng = StdRng::seed_from_u64(seed);
    shuffle_with(items, &mut rng)
}
