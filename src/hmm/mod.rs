//! An implementation of discrete hidden Markov models.
//! A model has a finite set of hidden states and a finite alphabet.
//! The initial state distribution is not a parameter: every run starts from
//! the uniform distribution over the states.
//! The probabilities are kept as they are, without taking logarithm or re-scaling.
//! Thus, a long sequence would underflow to zero probability. This is a known limitation.
//! If you need some robustness for long sequences, consult the log-space
//! functions in [`log_space`], which are cross-checks, not replacements.
//! To run the algorithms, the observed sequence should be converted into
//! symbol indices by [`HiddenMarkovModel::encode`].
use crate::error::{HmmError, Result, Table};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
pub mod backward;
pub mod baum_welch;
pub mod dptable;
pub mod forward;
pub mod log_space;
pub mod viterbi;
pub mod viterbi_learning;
pub use dptable::DPTable;

/// Allowed deviation of a row sum from 1 when constructing a model by `new`.
/// Tables printed with three decimals would be off by a few thousandth.
pub const ROW_SUM_TOLERANCE: f64 = 0.01;

/// A hidden Markov model on a discrete alphabet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HiddenMarkovModel {
    states: Vec<String>,
    symbols: Vec<String>,
    // By accessing [from * states + to], we can get the transition probability from `from` to `to`.
    transition_matrix: Vec<f64>,
    // By accessing [state * symbols + symbol], we can get Pr{symbol|state}.
    emission_matrix: Vec<f64>,
}

/// Shorthand for HiddenMarkovModel.
pub type HMM = HiddenMarkovModel;

/// Parameter re-estimation methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Training {
    /// Soft EM by the forward-backward responsibilities.
    BaumWelch,
    /// Hard EM by the most probable path.
    Viterbi,
}

/// Configurations of `fit`.
#[derive(Debug, Clone)]
pub struct TrainingConfig {
    pub iterations: usize,
    pub method: Training,
}

impl TrainingConfig {
    pub fn new(iterations: usize, method: Training) -> Self {
        Self { iterations, method }
    }
}

fn to_labels<S: AsRef<str>>(labels: &[S], name: &str) -> Result<Vec<String>> {
    let labels: Vec<String> = labels.iter().map(|x| x.as_ref().to_string()).collect();
    if labels.is_empty() {
        return Err(HmmError::Shape(format!("no {} are given", name)));
    }
    let mut seen = HashSet::new();
    if let Some(dup) = labels.iter().find(|x| !seen.insert(x.as_str())) {
        return Err(HmmError::Shape(format!("duplicated {} `{}`", name, dup)));
    }
    Ok(labels)
}

// Flatten `rows` into a |rows| x |columns| matrix, checking the shape.
fn flatten(table: Table, rows: &[String], columns: &[String], data: &[Vec<f64>]) -> Result<Vec<f64>> {
    if data.len() != rows.len() {
        let msg = format!("{} table has {} rows, expected {}", table, data.len(), rows.len());
        return Err(HmmError::Shape(msg));
    }
    for (label, row) in rows.iter().zip(data.iter()) {
        if row.len() != columns.len() {
            let (len, expected) = (row.len(), columns.len());
            let msg = format!("row `{label}` of {table} table has {len} columns, expected {expected}");
            return Err(HmmError::Shape(msg));
        }
    }
    Ok(data.concat())
}

fn check_rows(table: Table, rows: &[String], columns: &[String], data: &[f64]) -> Result<()> {
    for (row, probs) in rows.iter().zip(data.chunks_exact(columns.len())) {
        for (column, &value) in columns.iter().zip(probs.iter()) {
            if !value.is_finite() || value < 0f64 || 1f64 < value {
                let (row, column) = (row.clone(), column.clone());
                return Err(HmmError::Probability {
                    table,
                    row,
                    column,
                    value,
                });
            }
        }
        let sum: f64 = probs.iter().sum();
        if ROW_SUM_TOLERANCE < (sum - 1f64).abs() {
            let row = row.clone();
            return Err(HmmError::Normalization { table, row, sum });
        }
    }
    Ok(())
}

impl HiddenMarkovModel {
    /// Create a new hidden Markov model.
    /// There is a few restriction on the input arguments.
    /// 1. `states` and `symbols` should be non-empty and without duplicates.
    /// 2. transition should be states x states matrix, where transition[i][j] = Pr(i -> j).
    /// 3. emission should be states x symbols matrix, where emission[i][x] = Pr(x | i).
    /// 4. All the rows should sum up to 1 (up to `ROW_SUM_TOLERANCE`).
    /// # Example
    /// ```rust
    /// use emhmm::HMM;
    /// let transition = vec![vec![0.641, 0.359], vec![0.729, 0.271]];
    /// let emission = vec![vec![0.117, 0.691, 0.192], vec![0.097, 0.42, 0.483]];
    /// let hmm = HMM::new(&["A", "B"], &["x", "y", "z"], &transition, &emission).unwrap();
    /// assert_eq!(hmm.states(), 2);
    /// ```
    pub fn new<S, T>(
        states: &[S],
        symbols: &[T],
        transition: &[Vec<f64>],
        emission: &[Vec<f64>],
    ) -> Result<Self>
    where
        S: AsRef<str>,
        T: AsRef<str>,
    {
        let states = to_labels(states, "states")?;
        let symbols = to_labels(symbols, "symbols")?;
        let transition_matrix = flatten(Table::Transition, &states, &states, transition)?;
        let emission_matrix = flatten(Table::Emission, &states, &symbols, emission)?;
        check_rows(Table::Transition, &states, &states, &transition_matrix)?;
        check_rows(Table::Emission, &states, &symbols, &emission_matrix)?;
        Ok(Self {
            states,
            symbols,
            transition_matrix,
            emission_matrix,
        })
    }
    /// transition_matrix: the [from * states + to]-th element should be Pr{from->to}
    /// emission_matrix: the [state * symbols + symbol]-th element should be Pr{symbol|state}.
    /// Only the shape is checked. The rows do not need to sum up to one.
    pub fn from_raw_elements(
        states: Vec<String>,
        symbols: Vec<String>,
        transition_matrix: Vec<f64>,
        emission_matrix: Vec<f64>,
    ) -> Result<Self> {
        let states = to_labels(&states, "states")?;
        let symbols = to_labels(&symbols, "symbols")?;
        if transition_matrix.len() != states.len() * states.len() {
            let msg = format!("{} transition cells for {} states", transition_matrix.len(), states.len());
            return Err(HmmError::Shape(msg));
        }
        if emission_matrix.len() != states.len() * symbols.len() {
            let (len, s, x) = (emission_matrix.len(), states.len(), symbols.len());
            let msg = format!("{len} emission cells for {s} states and {x} symbols");
            return Err(HmmError::Shape(msg));
        }
        Ok(Self {
            states,
            symbols,
            transition_matrix,
            emission_matrix,
        })
    }
    // Same as above, for the estimators. The labels are already checked.
    fn with_tables(&self, transition_matrix: Vec<f64>, emission_matrix: Vec<f64>) -> Self {
        assert_eq!(transition_matrix.len(), self.transition_matrix.len());
        assert_eq!(emission_matrix.len(), self.emission_matrix.len());
        Self {
            states: self.states.clone(),
            symbols: self.symbols.clone(),
            transition_matrix,
            emission_matrix,
        }
    }
    /// Number of states.
    pub fn states(&self) -> usize {
        self.states.len()
    }
    /// Number of symbols.
    pub fn symbols(&self) -> usize {
        self.symbols.len()
    }
    pub fn state_labels(&self) -> &[String] {
        &self.states
    }
    pub fn symbol_labels(&self) -> &[String] {
        &self.symbols
    }
    /// get transition probability from `from` to `to`
    pub fn transition(&self, from: usize, to: usize) -> f64 {
        self.transition_matrix[from * self.states() + to]
    }
    /// Return transition probialities from `from`.
    pub fn transitions(&self, from: usize) -> &[f64] {
        let states = self.states();
        &self.transition_matrix[from * states..(from + 1) * states]
    }
    /// Return Pr{symbol|state}
    pub fn emission(&self, state: usize, symbol: usize) -> f64 {
        self.emission_matrix[state * self.symbols() + symbol]
    }
    /// Return emission probabilities of `state`.
    pub fn emissions(&self, state: usize) -> &[f64] {
        let symbols = self.symbols();
        &self.emission_matrix[state * symbols..(state + 1) * symbols]
    }
    // The probability to start from each state.
    fn initial(&self) -> f64 {
        (self.states() as f64).recip()
    }
    /// Convert a sequence, one character per symbol, into symbol indices.
    pub fn encode(&self, seq: &str) -> Result<Vec<usize>> {
        let symbols: Vec<_> = seq.trim().chars().map(|c| c.to_string()).collect();
        self.encode_symbols(&symbols)
    }
    /// Convert a sequence of symbol labels into symbol indices.
    pub fn encode_symbols<T: AsRef<str>>(&self, seq: &[T]) -> Result<Vec<usize>> {
        let index: HashMap<&str, usize> = self
            .symbols
            .iter()
            .enumerate()
            .map(|(i, x)| (x.as_str(), i))
            .collect();
        let seq = seq
            .iter()
            .enumerate()
            .map(|(pos, x)| match index.get(x.as_ref()) {
                Some(&idx) => Ok(idx),
                None => {
                    let msg = format!("symbol `{}` at {} is not in the alphabet", x.as_ref(), pos);
                    Err(HmmError::Shape(msg))
                }
            })
            .collect::<Result<Vec<_>>>()?;
        self.check_sequence(&seq)?;
        Ok(seq)
    }
    /// Convert state indices into state labels.
    pub fn decode_labels(&self, path: &[usize]) -> Vec<&str> {
        path.iter().map(|&s| self.states[s].as_str()).collect()
    }
    pub(crate) fn check_sequence(&self, seq: &[usize]) -> Result<()> {
        if seq.is_empty() {
            return Err(HmmError::Shape("the sequence is empty".to_string()));
        }
        match seq.iter().enumerate().find(|(_, &x)| self.symbols() <= x) {
            Some((pos, x)) => {
                let size = self.symbols();
                let msg = format!("symbol {x} at {pos} is outside of the alphabet of size {size}");
                Err(HmmError::Shape(msg))
            }
            None => Ok(()),
        }
    }
    pub(crate) fn check_path(&self, seq: &[usize], path: &[usize]) -> Result<()> {
        if seq.len() != path.len() {
            let msg = format!("path of length {} for a sequence of length {}", path.len(), seq.len());
            return Err(HmmError::Shape(msg));
        }
        match path.iter().enumerate().find(|(_, &s)| self.states() <= s) {
            Some((pos, s)) => Err(HmmError::Shape(format!("unknown state {} at {}", s, pos))),
            None => Ok(()),
        }
    }
    /// Element-wise-square-sum of the difference of the tables.
    /// Return None if the two model have different shapes.
    pub fn dist(&self, other: &Self) -> Option<f64> {
        let same_shape = self.states() == other.states() && self.symbols() == other.symbols();
        same_shape.then(|| {
            let trans: f64 = self
                .transition_matrix
                .iter()
                .zip(other.transition_matrix.iter())
                .map(|(x, y)| (x - y).powi(2))
                .sum();
            let emit: f64 = self
                .emission_matrix
                .iter()
                .zip(other.emission_matrix.iter())
                .map(|(x, y)| (x - y).powi(2))
                .sum();
            trans + emit
        })
    }
    /// Run `config.iterations` rounds of parameter re-estimation on `seq`, and return the final model.
    /// There is no convergence test. The loop runs exactly `iterations` times.
    pub fn fit(&self, seq: &[usize], config: &TrainingConfig) -> Result<Self> {
        self.check_sequence(seq)?;
        let mut model = self.clone();
        for t in 0..config.iterations {
            let next = match config.method {
                Training::BaumWelch => model.baum_welch(seq)?,
                Training::Viterbi => model.viterbi_learning(seq)?,
            };
            if log_enabled!(log::Level::Debug) {
                let lk = next.likelihood(seq)?;
                let diff = model.dist(&next).unwrap_or(0f64);
                debug!("FIT\t{:?}\t{}\t{:e}\t{:.3e}", config.method, t, lk, diff);
            }
            model = next;
        }
        Ok(model)
    }
}

impl std::fmt::Display for HiddenMarkovModel {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use crate::io::format_prob;
        writeln!(f, "\t{}", self.states.join("\t"))?;
        for (from, label) in self.states.iter().enumerate() {
            let probs: Vec<_> = self.transitions(from).iter().map(|&x| format_prob(x)).collect();
            writeln!(f, "{}\t{}", label, probs.join("\t"))?;
        }
        writeln!(f, "{}", crate::io::DELIMITER)?;
        writeln!(f, "\t{}", self.symbols.join("\t"))?;
        for (state, label) in self.states.iter().enumerate() {
            let probs: Vec<_> = self.emissions(state).iter().map(|&x| format_prob(x)).collect();
            write!(f, "{}\t{}", label, probs.join("\t"))?;
            if state + 1 < self.states() {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}
