//! This module is to generate some random models and sequences to assess the algorithms.
//! Usually, it would not be used in the real-applications.
use crate::error::Result;
use crate::hmm::HMM;
use rand::seq::SliceRandom;
use rand::Rng;

/// Sample a hidden path and an observed sequence.
pub trait Generate {
    /// Return (path, sequence) of length `len`.
    fn gen<R: Rng>(&self, len: usize, rng: &mut R) -> (Vec<usize>, Vec<usize>);
}

impl Generate for HMM {
    fn gen<R: Rng>(&self, len: usize, rng: &mut R) -> (Vec<usize>, Vec<usize>) {
        let uniform = vec![1f64; self.states()];
        let mut path = Vec::with_capacity(len);
        let mut seq = Vec::with_capacity(len);
        for i in 0..len {
            let state = match i {
                0 => pick(rng, &uniform),
                _ => pick(rng, self.transitions(path[i - 1])),
            };
            path.push(state);
            seq.push(pick(rng, self.emissions(state)));
        }
        (path, seq)
    }
}

// Pick an index with probability proportional to `weights`.
// The last index is returned when the probe runs over the total because of rounding errors.
fn pick<R: Rng>(rng: &mut R, weights: &[f64]) -> usize {
    let total: f64 = weights.iter().sum();
    let mut probe = rng.gen::<f64>() * total;
    for (i, &w) in weights.iter().enumerate() {
        if probe < w {
            return i;
        }
        probe -= w;
    }
    weights.len().saturating_sub(1)
}

fn label(first: u8, i: usize) -> String {
    match i {
        0..=25 => ((first + i as u8) as char).to_string(),
        _ => format!("{}{}", first as char, i),
    }
}

fn random_row<R: Rng>(rng: &mut R, len: usize) -> Vec<f64> {
    let row: Vec<f64> = (0..len).map(|_| rng.gen_range(0.05..1f64)).collect();
    let sum: f64 = row.iter().sum();
    row.iter().map(|x| x / sum).collect()
}

/// Random model with `states` states labeled as `A`, `B`, ... and `symbols` symbols labeled as `a`, `b`, ....
/// All the probabilities are strictly positive.
pub fn random_model<R: Rng>(rng: &mut R, states: usize, symbols: usize) -> Result<HMM> {
    let state_labels: Vec<_> = (0..states).map(|i| label(b'A', i)).collect();
    let symbol_labels: Vec<_> = (0..symbols).map(|i| label(b'a', i)).collect();
    let transition: Vec<_> = (0..states).flat_map(|_| random_row(rng, states)).collect();
    let emission: Vec<_> = (0..states).flat_map(|_| random_row(rng, symbols)).collect();
    HMM::from_raw_elements(state_labels, symbol_labels, transition, emission)
}

/// Uniformly random sequence on an alphabet of size `symbols`.
pub fn generate_seq<R: Rng>(rng: &mut R, symbols: usize, len: usize) -> Vec<usize> {
    let alphabet: Vec<_> = (0..symbols).collect();
    (0..len).filter_map(|_| alphabet.choose(rng)).copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256StarStar;
    #[test]
    fn random_model_test() {
        let mut rng: Xoshiro256StarStar = SeedableRng::seed_from_u64(4);
        let hmm = random_model(&mut rng, 3, 4).unwrap();
        assert_eq!(hmm.state_labels().concat(), "ABC");
        assert_eq!(hmm.symbol_labels().concat(), "abcd");
        for s in 0..3 {
            let sum: f64 = hmm.transitions(s).iter().sum();
            assert!((sum - 1f64).abs() < 0.0000001, "{}", sum);
            assert!(hmm.transitions(s).iter().all(|&x| 0f64 < x));
            let sum: f64 = hmm.emissions(s).iter().sum();
            assert!((sum - 1f64).abs() < 0.0000001, "{}", sum);
            assert!(hmm.emissions(s).iter().all(|&x| 0f64 < x));
        }
        assert!(random_model(&mut rng, 0, 3).is_err());
        assert_eq!(label(b'A', 27), "A27");
    }
    #[test]
    fn gen_follows_the_model() {
        // A always emits x, B always emits y, and A and B alternate.
        let transition = vec![vec![0.0, 1.0], vec![1.0, 0.0]];
        let emission = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        let hmm = HMM::new(&["A", "B"], &["x", "y"], &transition, &emission).unwrap();
        for i in 0..10u64 {
            let mut rng: Xoshiro256StarStar = SeedableRng::seed_from_u64(i);
            let (path, seq) = hmm.gen(20, &mut rng);
            assert_eq!(path, seq);
            assert!(path.windows(2).all(|w| w[0] != w[1]));
        }
    }
    #[test]
    fn pick_test() {
        let mut rng: Xoshiro256StarStar = SeedableRng::seed_from_u64(1);
        let weights = [0.2, 0.0, 0.8];
        let counts = (0..10000).fold([0; 3], |mut acc, _| {
            acc[pick(&mut rng, &weights)] += 1;
            acc
        });
        assert_eq!(counts[1], 0);
        assert!((1500..2500).contains(&counts[0]), "{:?}", counts);
    }
    #[test]
    fn generate_seq_test() {
        let mut rng: Xoshiro256StarStar = SeedableRng::seed_from_u64(1);
        let seq = generate_seq(&mut rng, 3, 100);
        assert_eq!(seq.len(), 100);
        assert!(seq.iter().all(|&x| x < 3));
        assert!(generate_seq(&mut rng, 0, 10).is_empty());
    }
}
