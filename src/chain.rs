use crate::error::Result;
use crate::ess::{effective_sample_size, monte_carlo_standard_error, split_effective_sample_size};
use crate::geweke::{geweke, GewekeConfig, GewekeScore};
use crate::rhat::{potential_scale_reduction_factor, split_potential_scale_reduction_factor};
use crate::utils::check_chains;
use crate::{Array1, Array2};

/// The chains sampled for one named scalar parameter.
///
/// Construction validates the shape once: at least two chains, a common
/// length of at least two draws, and finite samples only.  The chains are
/// never handed out mutably.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainSet {
    name: String,
    chains: Array2,
    num_draws: usize,
}

impl ChainSet {
    pub fn new<S: Into<String>>(name: S, chains: Array2) -> Result<Self> {
        let num_draws = check_chains(&chains, 2, 2)?;
        Ok(ChainSet {
            name: name.into(),
            chains,
            num_draws,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn chains(&self) -> &[Array1] {
        &self.chains
    }

    pub fn num_chains(&self) -> usize {
        self.chains.len()
    }

    pub fn num_draws(&self) -> usize {
        self.num_draws
    }

    pub fn into_chains(self) -> Array2 {
        self.chains
    }

    /// See [`potential_scale_reduction_factor`].
    pub fn rhat(&self) -> Result<f64> {
        potential_scale_reduction_factor(&self.chains)
    }

    /// See [`split_potential_scale_reduction_factor`].
    pub fn split_rhat(&self) -> Result<f64> {
        split_potential_scale_reduction_factor(&self.chains)
    }

    /// See [`effective_sample_size`].
    pub fn ess(&self) -> Result<f64> {
        effective_sample_size(&self.chains)
    }

    /// See [`split_effective_sample_size`].
    pub fn split_ess(&self) -> Result<f64> {
        split_effective_sample_size(&self.chains)
    }

    /// See [`monte_carlo_standard_error`].
    pub fn mcse(&self) -> Result<f64> {
        monte_carlo_standard_error(&self.chains)
    }

    /// Geweke scores for every chain, in chain order.
    pub fn geweke(&self, config: &GewekeConfig) -> Result<Vec<Vec<GewekeScore>>> {
        self.chains.iter().map(|c| geweke(c, config)).collect()
    }
}
