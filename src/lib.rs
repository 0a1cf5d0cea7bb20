//! Convergence diagnostics for Markov chain Monte Carlo output: the Gelman
//! Rubin potential scale reduction factor (R hat), Geweke z-scores, effective
//! sample size and Monte Carlo standard error.
//!
//! The crate works on plain arrays of draws and is agnostic to the sampler
//! that produced them (e.g. Stan, PyMC, Turing.jl, etc.).  Every diagnostic
//! is a pure function of its input: chains are only read, and results are
//! recomputed on each call.
//!
//! Test reference values are produced by `test/reference/reference.py`; see
//! `test/README.md`.
//!
//! ```no_run
//! use mcmc_convergence::utils::read_csv;
//! use mcmc_convergence::{ChainSet, GewekeConfig, RHAT_CONVERGENCE_THRESHOLD};
//!
//! # fn main() -> anyhow::Result<()> {
//! // one column per chain
//! let set = ChainSet::new("mu", read_csv("mu.csv", 1, 1000)?)?;
//! let rhat = set.rhat()?;
//! if rhat > RHAT_CONVERGENCE_THRESHOLD {
//!     println!("{} has not converged (R hat = {:.3})", set.name(), rhat);
//! }
//! for (chain, scores) in set.geweke(&GewekeConfig::default())?.iter().enumerate() {
//!     let worst = scores.iter().map(|s| s.z.abs()).fold(0.0, f64::max);
//!     println!("chain {}: max |z| = {:.2}", chain, worst);
//! }
//! # Ok(())
//! # }
//! ```
#[cfg(test)]
#[macro_use]
extern crate approx;

/// Validated per-parameter collection of chains
pub mod chain;
/// Error taxonomy shared by all diagnostics
pub mod error;
/// Effective Sample Size (ESS) and Monte Carlo standard error
pub mod ess;
/// Geweke z-scores and spectral density at frequency zero
pub mod geweke;
/// Gelman-Rubin potential scale reduction (Rhat), plain and split
pub mod rhat;
/// Per-parameter summaries and text reports
pub mod summary;
/// Summary statistics, chain validation and splitting, CSV loading
pub mod utils;

pub use chain::ChainSet;
pub use error::{DiagnosticError, Result};
pub use geweke::{GewekeConfig, GewekeScore};
pub use rhat::RHAT_CONVERGENCE_THRESHOLD;
pub use summary::{ConvergenceReport, ParameterSummary};

/// One-dimensional vector of numeric values
pub type Array1 = Vec<f64>;
/// Two dimensional vector of vectors of numeric values
pub type Array2 = Vec<Array1>;
