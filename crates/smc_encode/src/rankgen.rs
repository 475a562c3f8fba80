// crates/smc_encode/src/rankgen.rs
//
// Synthetic preference orders: repeated-insertion (RIM) sampling, the
// Mallows dispersion model, and a riffle mixture of two reference rankings.
// Everything draws from the seeded core RNG, so a fixed seed reproduces the
// same rankings. These feed test fixtures; nothing in the solve path
// depends on them.

use smc_core::rng::SeededRng;

/// Insertion probability vectors for a reference ranking of length `len`
/// under dispersion `phi` in `[0, 1]`.
///
/// The vector for item `i` (0-based, `i >= 1`) has `i + 1` entries; entry
/// `j` is the probability of inserting the item at position `j` of the
/// partial ranking. `phi = 0` degenerates to the identity (all mass on the
/// last position) and `phi = 1` to the uniform distribution.
pub fn dispersion_probs(len: usize, phi: f64) -> Vec<Vec<f64>> {
    let mut probs = Vec::with_capacity(len.saturating_sub(1));
    for i in 1..len {
        let m = i + 1;
        let mut row = Vec::with_capacity(m);
        if phi >= 1.0 {
            row.resize(m, 1.0 / m as f64);
        } else {
            // One-based positions j in 1..=m, most-displaced first:
            // p(j) = phi^(m-j) * (1 - phi) / (1 - phi^m).
            let denom = 1.0 - phi.powi(m as i32);
            for j in 1..=m {
                row.push(phi.powi((m - j) as i32) * (1.0 - phi) / denom);
            }
        }
        probs.push(row);
    }
    probs
}

/// Repeated-insertion sample: the first reference item seeds the ranking,
/// then each later item is inserted at a position drawn from its
/// probability vector (`probs[i - 1]` for item index `i`).
pub fn rim_sample<T: Copy>(reference: &[T], probs: &[Vec<f64>], rng: &mut SeededRng) -> Vec<T> {
    let mut sample: Vec<T> = Vec::with_capacity(reference.len());
    let Some(&first) = reference.first() else {
        return sample;
    };
    sample.push(first);
    for (i, &item) in reference.iter().enumerate().skip(1) {
        let position = draw_index(&probs[i - 1], rng);
        sample.insert(position, item);
    }
    sample
}

/// One Mallows draw with dispersion `phi` around `reference`.
pub fn mallows_sample<T: Copy>(reference: &[T], phi: f64, rng: &mut SeededRng) -> Vec<T> {
    if phi == 0.0 {
        return reference.to_vec();
    }
    let probs = dispersion_probs(reference.len(), phi);
    rim_sample(reference, &probs, rng)
}

/// Riffle two reference rankings: walk both from the front, taking from the
/// first with a mixing probability drawn once per sample — a Gaussian
/// around 0.25 or 0.75 (coin flip), sigma-wide, clamped to `[0, 1]`.
pub fn riffle_sample<T: Copy>(
    a: &[T],
    b: &[T],
    sigma: f64,
    rng: &mut SeededRng,
) -> Vec<T> {
    let center = if rng.flip() { 0.25 } else { 0.75 };
    let mixing = rng.gaussian(center, sigma).clamp(0.0, 1.0);

    let mut out = Vec::with_capacity(a.len() + b.len());
    let (mut ia, mut ib) = (0usize, 0usize);
    while ia < a.len() || ib < b.len() {
        if ia == a.len() {
            out.push(b[ib]);
            ib += 1;
        } else if ib == b.len() || rng.unit() <= mixing {
            out.push(a[ia]);
            ia += 1;
        } else {
            out.push(b[ib]);
            ib += 1;
        }
    }
    out
}

/// Draw an index from a normalized probability vector by inverse CDF.
fn draw_index(probs: &[f64], rng: &mut SeededRng) -> usize {
    let x = rng.unit();
    let mut acc = 0.0;
    for (i, &p) in probs.iter().enumerate() {
        acc += p;
        if x < acc {
            return i;
        }
    }
    probs.len() - 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use smc_core::rng::rng_from_seed;

    #[test]
    fn zero_dispersion_is_identity() {
        let mut rng = rng_from_seed(1);
        let reference = [4u32, 2, 7, 1];
        assert_eq!(mallows_sample(&reference, 0.0, &mut rng), reference.to_vec());
    }

    #[test]
    fn probability_rows_are_normalized() {
        for &phi in &[0.1, 0.5, 0.9, 1.0] {
            for row in dispersion_probs(6, phi) {
                let total: f64 = row.iter().sum();
                assert!((total - 1.0).abs() < 1e-9, "phi={phi}: {total}");
            }
        }
    }

    #[test]
    fn mallows_sample_is_a_permutation() {
        let mut rng = rng_from_seed(5);
        let reference: Vec<u32> = (0..12).collect();
        for _ in 0..20 {
            let mut sample = mallows_sample(&reference, 0.7, &mut rng);
            sample.sort_unstable();
            assert_eq!(sample, reference);
        }
    }

    #[test]
    fn mallows_is_reproducible_under_seed() {
        let reference: Vec<u32> = (0..8).collect();
        let a = mallows_sample(&reference, 0.4, &mut rng_from_seed(9));
        let b = mallows_sample(&reference, 0.4, &mut rng_from_seed(9));
        assert_eq!(a, b);
    }

    #[test]
    fn riffle_preserves_relative_orders() {
        let mut rng = rng_from_seed(3);
        let a = [1u32, 2, 3, 4];
        let b = [10u32, 20, 30];
        for _ in 0..20 {
            let sample = riffle_sample(&a, &b, 0.1, &mut rng);
            assert_eq!(sample.len(), 7);
            let only_a: Vec<u32> = sample.iter().copied().filter(|x| *x < 10).collect();
            let only_b: Vec<u32> = sample.iter().copied().filter(|x| *x >= 10).collect();
            assert_eq!(only_a, a.to_vec());
            assert_eq!(only_b, b.to_vec());
        }
    }
}
