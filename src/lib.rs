//! Discrete hidden Markov models and their classic algorithms:
//! Forward, Backward, Viterbi decoding, Baum-Welch, and Viterbi learning.
//! ```rust
//! use emhmm::{Training, TrainingConfig, HMM};
//! let transition = vec![vec![0.641, 0.359], vec![0.729, 0.271]];
//! let emission = vec![vec![0.117, 0.691, 0.192], vec![0.097, 0.42, 0.483]];
//! let hmm = HMM::new(&["A", "B"], &["x", "y", "z"], &transition, &emission).unwrap();
//! let seq = hmm.encode("xyxzzxyxyy").unwrap();
//! let (_, path) = hmm.viterbi(&seq).unwrap();
//! assert_eq!(hmm.decode_labels(&path).concat(), "AAABBAAAAA");
//! let config = TrainingConfig::new(10, Training::BaumWelch);
//! let fitted = hmm.fit(&seq, &config).unwrap();
//! assert!(hmm.likelihood(&seq).unwrap() <= fitted.likelihood(&seq).unwrap());
//! ```
#[macro_use]
extern crate log;
pub mod error;
pub mod gen_seq;
pub mod hmm;
pub mod io;
pub use error::HmmError;
pub use hmm::{HiddenMarkovModel, Training, TrainingConfig, HMM};
