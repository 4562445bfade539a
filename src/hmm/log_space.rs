//! Forward and Viterbi algorithms in the log space.
//! These do not underflow, and are used to cross-check the plain algorithms.
//! A zero probability is represented by `f64::NEG_INFINITY`.
use super::viterbi::first_max;
use super::DPTable;
use super::HiddenMarkovModel;
use crate::error::Result;

/// Return log(sum(exp(x))). If `xs` is empty or all of them are -inf, return -inf.
pub fn logsumexp(xs: &[f64]) -> f64 {
    let max = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY {
        return max;
    }
    max + xs.iter().map(|x| (x - max).exp()).sum::<f64>().ln()
}

impl HiddenMarkovModel {
    /// The natural logarithm of the probability of `seq`.
    pub fn log_likelihood(&self, seq: &[usize]) -> Result<f64> {
        self.check_sequence(seq)?;
        let states = self.states();
        let init = self.initial().ln();
        let mut dp = DPTable::new(seq.len(), states, f64::NEG_INFINITY);
        for s in 0..states {
            dp[(0, s)] = init + self.emission(s, seq[0]).ln();
        }
        let mut buffer = vec![0f64; states];
        for (i, &x) in seq.iter().enumerate().skip(1) {
            for s in 0..states {
                for (t, slot) in buffer.iter_mut().enumerate() {
                    *slot = dp[(i - 1, t)] + self.transition(t, s).ln();
                }
                dp[(i, s)] = logsumexp(&buffer) + self.emission(s, x).ln();
            }
        }
        Ok(logsumexp(dp.get_cells(seq.len() - 1)))
    }
    /// Viterbi algorithm in the log space. Return the log probability of the best path and the path.
    /// Ties are broken in the same way as `viterbi`.
    pub fn viterbi_log(&self, seq: &[usize]) -> Result<(f64, Vec<usize>)> {
        self.check_sequence(seq)?;
        let states = self.states();
        let init = self.initial().ln();
        let mut dp = DPTable::new(seq.len(), states, f64::NEG_INFINITY);
        let mut traceback = vec![0; seq.len() * states];
        for s in 0..states {
            dp[(0, s)] = init + self.emission(s, seq[0]).ln();
        }
        for (i, &x) in seq.iter().enumerate().skip(1) {
            for s in 0..states {
                let emit = self.emission(s, x).ln();
                let scores = (0..states).map(|t| dp[(i - 1, t)] + emit + self.transition(t, s).ln());
                if let Some((argmax, max)) = first_max(scores) {
                    dp[(i, s)] = max;
                    traceback[i * states + s] = argmax;
                }
            }
        }
        let last = dp.get_cells(seq.len() - 1).iter().copied();
        let (mut state, max) = first_max(last).unwrap_or((0, f64::NEG_INFINITY));
        let mut path = vec![state];
        for i in (1..seq.len()).rev() {
            state = traceback[i * states + state];
            path.push(state);
        }
        path.reverse();
        Ok((max, path))
    }
}
