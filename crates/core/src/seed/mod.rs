use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::event::Value;

/// Returns `0..size` in uniformly random order (Fisher–Yates).
pub fn random_permutation<R: Rng + ?Sized>(size: usize, rng: &mut R) -> Vec<Value> {
    let mut values: Vec<Value> = (0..size as Value).collect();
    for i in (1..size).rev() {
        let j = rng.random_range(0..=i);
        values.swap(i, j);
    }
    values
}

/// Builds the generator used for seed arrays: deterministic when `seed` is
/// given, seeded from OS entropy otherwise.
pub fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn produces_a_permutation() {
        let mut rng = seeded_rng(Some(7));
        let mut values = random_permutation(50, &mut rng);
        values.sort();
        assert_eq!(values, (0..50).collect::<Vec<Value>>());
    }

    #[test]
    fn same_seed_same_order() {
        let a = random_permutation(20, &mut seeded_rng(Some(99)));
        let b = random_permutation(20, &mut seeded_rng(Some(99)));
        assert_eq!(a, b);
    }

    #[test]
    fn handles_tiny_sizes() {
        let mut rng = seeded_rng(Some(1));
        assert!(random_permutation(0, &mut rng).is_empty());
        assert_eq!(random_permutation(1, &mut rng), vec![0]);
    }

    #[test]
    fn every_position_is_reachable() {
        // first slot of a 3-permutation should take every value over many draws
        let mut rng = seeded_rng(Some(3));
        let mut seen = [false; 3];
        for _ in 0..200 {
            seen[random_permutation(3, &mut rng)[0] as usize] = true;
        }
        assert!(seen.iter().all(|hit| *hit));
    }
}
