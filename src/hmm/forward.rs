use super::DPTable;
use super::HiddenMarkovModel;
use crate::error::Result;

impl HiddenMarkovModel {
    /// Return the probability to observe `seq`, summing up all the hidden paths.
    /// In HMM term, it is "forward" algorithm.
    /// If you want to get the raw DP table, please call `forward` functionality instead.
    pub fn likelihood(&self, seq: &[usize]) -> Result<f64> {
        self.forward(seq).map(|(_, lk)| lk)
    }
    /// Forward algorithm. Return the DP table and the total probability.
    /// dp[(i, s)] is the probability to observe seq[..=i] and being in the state `s` at the i-th position.
    /// There is no re-scaling. Thus, dp would underflow to zero for very long sequences.
    pub fn forward(&self, seq: &[usize]) -> Result<(DPTable, f64)> {
        self.check_sequence(seq)?;
        let states = self.states();
        let mut dp = DPTable::new(seq.len(), states, 0f64);
        let init = self.initial();
        for s in 0..states {
            dp[(0, s)] = init * self.emission(s, seq[0]);
        }
        for (i, &x) in seq.iter().enumerate().skip(1) {
            for s in 0..states {
                let emit = self.emission(s, x);
                dp[(i, s)] = (0..states)
                    .map(|t| dp[(i - 1, t)] * self.transition(t, s) * emit)
                    .sum::<f64>();
            }
        }
        let lk = dp.total(seq.len() - 1);
        trace!("FORWARD\t{}\t{:e}", seq.len(), lk);
        Ok((dp, lk))
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::*;
    use crate::gen_seq::{random_model, Generate};
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256StarStar;
    #[test]
    fn likelihood_example() {
        let hmm = probability_example();
        let seq = hmm.encode("xzyyzzyzyy").unwrap();
        let lk = hmm.likelihood(&seq).unwrap();
        let answer = 1.1005510319694847e-06;
        assert!(((lk - answer) / answer).abs() < 0.000000001, "{},{}", lk, answer);
    }
    #[test]
    fn single_position() {
        let hmm = probability_example();
        let (dp, lk) = hmm.forward(&[1]).unwrap();
        assert_eq!(dp.len(), 1);
        assert!((dp[(0, 0)] - 0.5 * 0.065).abs() < 0.0000001);
        assert!((dp[(0, 1)] - 0.5 * 0.334).abs() < 0.0000001);
        assert!((lk - 0.5 * (0.065 + 0.334)).abs() < 0.0000001);
    }
    #[test]
    fn likelihood_brute_force() {
        for i in 0..20u64 {
            let mut rng: Xoshiro256StarStar = SeedableRng::seed_from_u64(i);
            let states = 1 + i as usize % 3;
            let hmm = random_model(&mut rng, states, 3).unwrap();
            let (_, seq) = hmm.gen(5, &mut rng);
            let lk = hmm.likelihood(&seq).unwrap();
            let sum: f64 = all_paths(states, seq.len())
                .iter()
                .map(|path| hmm.path_score(&seq, path).unwrap())
                .sum();
            assert!(((lk - sum) / sum).abs() < 0.000000001, "{},{},{}", i, lk, sum);
        }
    }
    #[test]
    fn underflow_is_not_an_error() {
        let hmm = probability_example();
        let seq = vec![1; 2000];
        let lk = hmm.likelihood(&seq).unwrap();
        assert!(lk < 1e-300, "{}", lk);
        assert!(lk >= 0f64);
    }
}
