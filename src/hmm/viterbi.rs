use super::DPTable;
use super::HiddenMarkovModel;
use crate::error::Result;

// Return the index of the maximum, with the first one winning ties.
// The comparison is strict; a later candidate should be strictly greater to replace the current one.
pub(crate) fn first_max<I: Iterator<Item = f64>>(xs: I) -> Option<(usize, f64)> {
    xs.enumerate().fold(None, |best, (i, x)| match best {
        Some((_, max)) if !(max < x) => best,
        _ => Some((i, x)),
    })
}

impl HiddenMarkovModel {
    /// Return the most probable hidden path of `seq` and its probability.
    /// In other words, it is traditional Viterbi algorithm.
    /// When there are several paths with the same probability,
    /// the path choosing earlier states (in the order of `state_labels`) wins.
    pub fn viterbi(&self, seq: &[usize]) -> Result<(f64, Vec<usize>)> {
        self.check_sequence(seq)?;
        let states = self.states();
        let mut dp = DPTable::new(seq.len(), states, 0f64);
        // traceback[i * states + s] = the predecessor of `s` at i.
        let mut traceback = vec![0; seq.len() * states];
        let init = self.initial();
        for s in 0..states {
            dp[(0, s)] = init * self.emission(s, seq[0]);
        }
        for (i, &x) in seq.iter().enumerate().skip(1) {
            for s in 0..states {
                let emit = self.emission(s, x);
                let scores = (0..states).map(|t| dp[(i - 1, t)] * emit * self.transition(t, s));
                if let Some((argmax, max)) = first_max(scores) {
                    dp[(i, s)] = max;
                    traceback[i * states + s] = argmax;
                }
            }
        }
        let last = seq.len() - 1;
        let (mut state, max_lk) = first_max(dp.get_cells(last).iter().copied()).unwrap_or((0, 0f64));
        // Trace back.
        let mut path = vec![state];
        for i in (1..seq.len()).rev() {
            state = traceback[i * states + state];
            path.push(state);
        }
        path.reverse();
        trace!("VITERBI\t{:e}\t{:?}", max_lk, path);
        Ok((max_lk, path))
    }
    /// Return the joint probability of `path` and `seq`, starting from the uniform distribution.
    pub fn path_score(&self, seq: &[usize], path: &[usize]) -> Result<f64> {
        self.check_sequence(seq)?;
        self.check_path(seq, path)?;
        let init = self.initial() * self.emission(path[0], seq[0]);
        let score = path
            .windows(2)
            .zip(seq.iter().skip(1))
            .fold(init, |score, (w, &x)| {
                score * self.emission(w[1], x) * self.transition(w[0], w[1])
            });
        Ok(score)
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::*;
    use super::super::HMM;
    use super::*;
    use crate::gen_seq::{random_model, Generate};
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256StarStar;
    use rayon::prelude::*;
    #[test]
    fn first_max_test() {
        assert_eq!(first_max(vec![0.1, 0.3, 0.3, 0.2].into_iter()), Some((1, 0.3)));
        assert_eq!(first_max(vec![0f64, 0f64].into_iter()), Some((0, 0f64)));
        assert_eq!(first_max(std::iter::empty()), None);
    }
    #[test]
    fn viterbi_example() {
        let hmm = path_example();
        let seq = hmm.encode("xyxzzxyxyy").unwrap();
        let (lk, path) = hmm.viterbi(&seq).unwrap();
        assert_eq!(hmm.decode_labels(&path).concat(), "AAABBAAAAA");
        let score = hmm.path_score(&seq, &path).unwrap();
        assert!(((lk - score) / score).abs() < 0.000000001, "{},{}", lk, score);
    }
    #[test]
    fn ties_keep_earlier_states() {
        let transition = vec![vec![0.5, 0.5], vec![0.5, 0.5]];
        let emission = vec![vec![0.5, 0.5], vec![0.5, 0.5]];
        let hmm = HMM::new(&["A", "B"], &["x", "y"], &transition, &emission).unwrap();
        let seq = hmm.encode("xyyxyx").unwrap();
        let (_, path) = hmm.viterbi(&seq).unwrap();
        assert_eq!(path, vec![0; 6]);
        // The second state is better only at the last position.
        let emission = vec![vec![0.5, 0.5], vec![0.4, 0.6]];
        let hmm = HMM::new(&["A", "B"], &["x", "y"], &transition, &emission).unwrap();
        let seq = hmm.encode("xxy").unwrap();
        let (_, path) = hmm.viterbi(&seq).unwrap();
        assert_eq!(path, vec![0, 0, 1]);
    }
    #[test]
    fn viterbi_brute_force() {
        let failed: Vec<_> = (0..60u64)
            .into_par_iter()
            .filter(|&i| {
                let mut rng: Xoshiro256StarStar = SeedableRng::seed_from_u64(i);
                let states = 1 + i as usize % 3;
                let len = 1 + i as usize % 6;
                let hmm = random_model(&mut rng, states, 4).unwrap();
                let (_, seq) = hmm.gen(len, &mut rng);
                let (lk, path) = hmm.viterbi(&seq).unwrap();
                let max = all_paths(states, len)
                    .iter()
                    .map(|path| hmm.path_score(&seq, path).unwrap())
                    .fold(0f64, f64::max);
                let score = hmm.path_score(&seq, &path).unwrap();
                eprintln!("{}\t{:e}\t{:e}\t{:e}", i, lk, max, score);
                ((lk - max) / max).abs() > 0.000000001 || ((lk - score) / max).abs() > 0.000000001
            })
            .collect();
        assert!(failed.is_empty(), "{:?}", failed);
    }
    #[test]
    fn path_score_errors() {
        let hmm = path_example();
        assert!(hmm.path_score(&[0, 1], &[0]).is_err());
        assert!(hmm.path_score(&[0, 1], &[0, 2]).is_err());
        let score = hmm.path_score(&[0, 1], &[0, 1]).unwrap();
        let expect = 0.5 * 0.117 * 0.359 * 0.42;
        assert!((score - expect).abs() < 0.0000001, "{},{}", score, expect);
    }
}
