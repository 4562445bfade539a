//! Baum-Welch algorithm, or the EM algorithm with forward-backward responsibilities.
//! Each call to `baum_welch` does only one update. To iterate, call `fit` or loop by yourself.
use super::DPTable;
use super::HiddenMarkovModel;
use crate::error::{HmmError, Result};
use rayon::prelude::*;

/// Posterior probabilities of a sequence under a model.
#[derive(Debug, Clone)]
pub struct Responsibilities {
    /// node[(i, s)] = Pr{state at i is s | seq}.
    node: DPTable,
    /// [(i * states + from) * states + to] = Pr{from at i and to at i+1 | seq}, for i in 0..len-1.
    edge: Vec<f64>,
    states: usize,
    /// Total probability of the sequence.
    pub likelihood: f64,
}

impl Responsibilities {
    pub fn node(&self, i: usize, s: usize) -> f64 {
        self.node.get(i, s)
    }
    pub fn nodes(&self) -> &DPTable {
        &self.node
    }
    /// Responsibility of the edge `from` -> `to` between i and i+1.
    pub fn edge(&self, i: usize, from: usize, to: usize) -> f64 {
        self.edge[(i * self.states + from) * self.states + to]
    }
    /// The number of edge positions, which is the length of the sequence minus one.
    pub fn edge_len(&self) -> usize {
        self.node.len() - 1
    }
}

impl HiddenMarkovModel {
    /// Compute node and edge responsibilities of `seq`.
    /// Return `DegenerateModel` if the sequence has zero probability,
    /// including underflows in long sequences.
    pub fn responsibilities(&self, seq: &[usize]) -> Result<Responsibilities> {
        let (forward, lk) = self.forward(seq)?;
        let (backward, _) = self.backward(seq)?;
        if lk == 0f64 {
            let msg = format!("the sequence of length {} has zero probability", seq.len());
            return Err(HmmError::DegenerateModel(msg));
        }
        let states = self.states();
        let mut node = DPTable::new(seq.len(), states, 0f64);
        for i in 0..seq.len() {
            for s in 0..states {
                node[(i, s)] = forward[(i, s)] * backward[(i, s)] / lk;
            }
        }
        let mut edge = vec![0f64; (seq.len() - 1) * states * states];
        for (i, &x) in seq.iter().enumerate().skip(1) {
            // Edges from i-1 to i.
            let slots = &mut edge[(i - 1) * states * states..i * states * states];
            for (from, row) in slots.chunks_exact_mut(states).enumerate() {
                let f = forward[(i - 1, from)];
                for (to, slot) in row.iter_mut().enumerate() {
                    let weight = self.transition(from, to) * self.emission(to, x);
                    *slot = f * weight * backward[(i, to)] / lk;
                }
            }
        }
        Ok(Responsibilities {
            node,
            edge,
            states,
            likelihood: lk,
        })
    }
    /// One iteration of Baum-Welch algorithm. Return the updated model.
    /// The initial distribution is kept uniform. If a state has no responsibility at all,
    /// the normalization would be zero division, and `DegenerateModel` is returned.
    pub fn baum_welch(&self, seq: &[usize]) -> Result<Self> {
        let resp = self.responsibilities(seq)?;
        let transition_matrix = self.estimate_transition_prob(&resp)?;
        let emission_matrix = self.estimate_emission_prob(&resp, seq)?;
        trace!("BW\t{:e}", resp.likelihood);
        Ok(self.with_tables(transition_matrix, emission_matrix))
    }
    // [from * states + to] = Pr(from->to)
    fn estimate_transition_prob(&self, resp: &Responsibilities) -> Result<Vec<f64>> {
        let states = self.states();
        let rows: Vec<Vec<f64>> = (0..states)
            .into_par_iter()
            .map(|from| {
                let mut row = vec![0f64; states];
                for i in 0..resp.edge_len() {
                    row.iter_mut()
                        .enumerate()
                        .for_each(|(to, x)| *x += resp.edge(i, from, to));
                }
                normalize(row, || {
                    let label = &self.state_labels()[from];
                    format!("no transition responsibility from `{}`", label)
                })
            })
            .collect::<Result<_>>()?;
        Ok(rows.concat())
    }
    // [state * symbols + symbol] = Pr(symbol|state)
    fn estimate_emission_prob(&self, resp: &Responsibilities, seq: &[usize]) -> Result<Vec<f64>> {
        let rows: Vec<Vec<f64>> = (0..self.states())
            .into_par_iter()
            .map(|s| {
                let mut row = vec![0f64; self.symbols()];
                for (i, &x) in seq.iter().enumerate() {
                    row[x] += resp.node(i, s);
                }
                normalize(row, || {
                    let label = &self.state_labels()[s];
                    format!("no emission responsibility on `{}`", label)
                })
            })
            .collect::<Result<_>>()?;
        Ok(rows.concat())
    }
}

fn normalize<F: FnOnce() -> String>(mut row: Vec<f64>, msg: F) -> Result<Vec<f64>> {
    let sum: f64 = row.iter().sum();
    if sum == 0f64 {
        return Err(HmmError::DegenerateModel(msg()));
    }
    row.iter_mut().for_each(|x| *x /= sum);
    Ok(row)
}
