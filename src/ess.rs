use crate::error::{DiagnosticError, Result};
use crate::utils::{check_chains, flatten, mean, sample_variance, split_chains};
use crate::{Array1, Array2};
use arima::acf;
use tracing::debug;

/// Computes the effective sample size (ESS) for one parameter across all
/// chains.  The value returned is at most `N * log10(N)`, where `N` is the
/// total number of draws: the autocorrelation time is bounded below by
/// `1 / log10(N)`, which also keeps a negative estimate from strongly
/// antithetic chains from turning into a negative ESS.
///
/// Chains must share one length of at least four draws and every sample must
/// be finite.  A set of chains in which every sample is the same value has
/// no defined ESS, nor does one whose autocovariances overflow.
///
/// See more details in Stan reference manual section
/// ["Effective Sample Size"](http://mc-stan.org/users/documentation)
///
/// Based on reference implementation in Stan v2.24.0 at
/// [https://github.com/stan-dev/stan/blob/v2.24.0/src/stan/analyze/mcmc/compute_effective_sample_size.hpp#L32-L138]()
///
/// # Arguments
/// * `chains` - Slice of chains, each of which is a vector of samples for
///              the same parameter
pub fn effective_sample_size(chains: &[Array1]) -> Result<f64> {
    let num_draws = check_chains(chains, 1, 4)?;
    let num_chains = chains.len();

    let first = chains[0][0];
    if chains.iter().flatten().all(|&x| x == first) {
        return Err(DiagnosticError::undefined(format!(
            "no ESS when every sample is constant (value={})",
            first
        )));
    }

    let n = num_draws as f64;
    let mut chain_acov: Array2 = Vec::with_capacity(num_chains);
    let mut chain_mean: Array1 = Vec::with_capacity(num_chains);
    let mut chain_var: Array1 = Vec::with_capacity(num_chains);
    for chain in chains {
        let acov = acf::acf(chain, None, true)
            .map_err(|e| DiagnosticError::invalid(format!("autocovariance failed: {:?}", e)))?;
        chain_mean.push(mean(chain)?);
        chain_var.push(acov[0] * n / (n - 1.0));
        chain_acov.push(acov);
    }

    let mean_var = mean(&chain_var)?;
    let mut var_plus = mean_var * (n - 1.0) / n;
    if num_chains > 1 {
        var_plus += sample_variance(&chain_mean)?;
    }
    if !var_plus.is_finite() {
        return Err(DiagnosticError::undefined(format!(
            "pooled variance is not finite ({}), the samples overflow f64 arithmetic",
            var_plus
        )));
    }
    let rho_at = |lag: usize| -> Result<f64> {
        let acov_s: Array1 = chain_acov.iter().map(|acov| acov[lag]).collect();
        Ok(1.0 - (mean_var - mean(&acov_s)?) / var_plus)
    };

    let mut rho_hat_s: Array1 = vec![0.0; num_draws];
    let mut rho_hat_even = 1.0;
    rho_hat_s[0] = rho_hat_even;
    let mut rho_hat_odd = rho_at(1)?;
    rho_hat_s[1] = rho_hat_odd;

    // Geyer's initial positive sequence.  The last pair of autocorrelations
    // is left out as a bias term for antithetic chains.
    let mut s = 1;
    while s < (num_draws - 4) && (rho_hat_even + rho_hat_odd) > 0.0 {
        rho_hat_even = rho_at(s + 1)?;
        rho_hat_odd = rho_at(s + 2)?;
        if (rho_hat_even + rho_hat_odd) >= 0.0 {
            rho_hat_s[s + 1] = rho_hat_even;
            rho_hat_s[s + 2] = rho_hat_odd;
        }
        s += 2;
    }

    let max_s = s;
    if rho_hat_even > 0.0 {
        rho_hat_s[max_s + 1] = rho_hat_even;
    }

    // Initial monotone sequence
    let mut s = 1;
    while max_s >= 3 && s <= (max_s - 3) {
        if (rho_hat_s[s + 1] + rho_hat_s[s + 2]) > (rho_hat_s[s - 1] + rho_hat_s[s]) {
            rho_hat_s[s + 1] = (rho_hat_s[s - 1] + rho_hat_s[s]) / 2.0;
            rho_hat_s[s + 2] = rho_hat_s[s + 1];
        }
        s += 2;
    }

    let num_total_draws = num_chains as f64 * n;
    // Geyer's truncated estimator for the asymptotic variance
    let tau_hat = -1.0 + 2.0 * rho_hat_s.iter().take(max_s).sum::<f64>() + rho_hat_s[max_s + 1];
    if !tau_hat.is_finite() {
        return Err(DiagnosticError::undefined(format!(
            "autocorrelation time is not finite ({}), the autocovariances overflowed",
            tau_hat
        )));
    }
    // Same lower bound as Stan 2.26+
    let tau_bound = tau_hat.max(1.0 / num_total_draws.log10());
    let ess = num_total_draws / tau_bound;
    debug!(
        chains = num_chains,
        draws = num_draws,
        max_lag = max_s,
        tau_hat,
        ess,
        "computed effective sample size"
    );
    Ok(ess)
}

/// Computes the split effective sample size: every chain is halved (an odd
/// middle draw is dropped) before [`effective_sample_size`] runs, so chains
/// need at least eight draws.
///
/// Based on reference implementation in Stan v2.24.0 at
/// [https://github.com/stan-dev/stan/blob/v2.24.0/src/stan/analyze/mcmc/compute_effective_sample_size.hpp#L185-L199]()
pub fn split_effective_sample_size(chains: &[Array1]) -> Result<f64> {
    check_chains(chains, 1, 8)?;
    let split = split_chains(chains)?;
    effective_sample_size(&split)
}

/// Computes the Monte Carlo Standard Error (MCSE) of the posterior mean, the
/// standard deviation of all draws over the square root of the effective
/// sample size.
///
/// See the Stan reference manual section
/// ["Estimation of MCMC Standard Error"](https://mc-stan.org/docs/2_24/reference-manual/effective-sample-size-section.html#estimation-of-mcmc-standard-error)
pub fn monte_carlo_standard_error(chains: &[Array1]) -> Result<f64> {
    let ess = effective_sample_size(chains)?;
    let var = sample_variance(&flatten(chains))?;
    Ok((var / ess).sqrt())
}
