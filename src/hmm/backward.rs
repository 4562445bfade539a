use super::DPTable;
use super::HiddenMarkovModel;
use crate::error::Result;

impl HiddenMarkovModel {
    /// Backward algorithm. Return the DP table and the total probability.
    /// dp[(i, s)] is the probability to observe seq[i+1..] given the state `s` at the i-th position.
    /// The total probability is computed by combining the first column with the initial emissions,
    /// so it should be the same as the one from the forward algorithm.
    pub fn backward(&self, seq: &[usize]) -> Result<(DPTable, f64)> {
        self.check_sequence(seq)?;
        let states = self.states();
        let mut dp = DPTable::new(seq.len(), states, 0f64);
        dp.get_cells_mut(seq.len() - 1).iter_mut().for_each(|x| *x = 1f64);
        for (i, &x) in seq.iter().enumerate().skip(1).rev() {
            // Here `x` is the symbol at i, and we fill i-1.
            for s in 0..states {
                dp[(i - 1, s)] = (0..states)
                    .map(|t| dp[(i, t)] * self.transition(s, t) * self.emission(t, x))
                    .sum::<f64>();
            }
        }
        let init = self.initial();
        let lk: f64 = (0..states)
            .map(|s| init * self.emission(s, seq[0]) * dp[(0, s)])
            .sum();
        trace!("BACKWARD\t{}\t{:e}", seq.len(), lk);
        Ok((dp, lk))
    }
}

/// Sum forward[(i, s)] * backward[(i, s)] over s, for each position i.
/// Each of them should be the same as the total probability of the sequence.
pub fn position_totals(forward: &DPTable, backward: &DPTable) -> Vec<f64> {
    assert_eq!(forward.len(), backward.len());
    assert_eq!(forward.states(), backward.states());
    forward
        .rows()
        .zip(backward.rows())
        .map(|(fs, bs)| fs.iter().zip(bs.iter()).map(|(f, b)| f * b).sum())
        .collect()
}
