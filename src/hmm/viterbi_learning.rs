//! Viterbi learning, or the "hard" EM algorithm.
//! The expectation step is replaced by the most probable path, and
//! the maximization step is counting transitions and emissions along the path.
use super::HiddenMarkovModel;
use crate::error::Result;

impl HiddenMarkovModel {
    /// One iteration of Viterbi learning. Decode `seq` by the current model,
    /// then re-estimate the parameters from the path.
    pub fn viterbi_learning(&self, seq: &[usize]) -> Result<Self> {
        let (lk, path) = self.viterbi(seq)?;
        trace!("VL\t{:e}", lk);
        self.estimate_from_path(seq, &path)
    }
    /// Estimate the transition and emission probabilities from a hidden path.
    /// If a state never appears (as a predecessor, for transitions),
    /// all of its counts are set to one and its denominator to the number of states.
    /// Thus, the fallback emission row is 1/|states| for each symbol,
    /// and it does not sum up to one unless |states| = |symbols|.
    pub fn estimate_from_path(&self, seq: &[usize], path: &[usize]) -> Result<Self> {
        self.check_sequence(seq)?;
        self.check_path(seq, path)?;
        let (states, symbols) = (self.states(), self.symbols());
        let mut transition_count = vec![0f64; states * states];
        let mut from_count = vec![0f64; states];
        for w in path.windows(2) {
            transition_count[w[0] * states + w[1]] += 1f64;
            from_count[w[0]] += 1f64;
        }
        let mut emission_count = vec![0f64; states * symbols];
        let mut state_count = vec![0f64; states];
        for (&s, &x) in path.iter().zip(seq.iter()) {
            emission_count[s * symbols + x] += 1f64;
            state_count[s] += 1f64;
        }
        let transition_matrix = Self::frequencies(transition_count, &from_count, states);
        let emission_matrix = Self::frequencies(emission_count, &state_count, states);
        Ok(self.with_tables(transition_matrix, emission_matrix))
    }
    // Divide each row of `counts` by its denominator, falling back to the pseudo-counts.
    fn frequencies(mut counts: Vec<f64>, denoms: &[f64], states: usize) -> Vec<f64> {
        let width = counts.len() / denoms.len();
        let fallback = (states as f64).recip();
        for (row, &denom) in counts.chunks_exact_mut(width).zip(denoms.iter()) {
            if denom == 0f64 {
                row.iter_mut().for_each(|x| *x = fallback);
            } else {
                row.iter_mut().for_each(|x| *x /= denom);
            }
        }
        counts
    }
}
