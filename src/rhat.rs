use crate::error::{DiagnosticError, Result};
use crate::utils::{check_chains, mean, mean_and_variance, split_chains};
use crate::Array1;
use tracing::debug;

/// Conventional upper bound on R-hat below which chains are treated as
/// having converged.
pub const RHAT_CONVERGENCE_THRESHOLD: f64 = 1.1;

/// Computes the potential scale reduction (Rhat) for one scalar parameter
/// given `m >= 2` chains of equal length `n >= 2`:
///
/// ```text
/// W       = mean of the per-chain sample variances
/// B       = n / (m - 1) * sum((chain mean - grand mean)^2)
/// Var-hat = (n - 1) / n * W + B / n
/// Rhat    = sqrt(Var-hat / W)
/// ```
///
/// Identical chains give `B = 0` and `Rhat = sqrt((n - 1) / n)`, which tends
/// to one from below as `n` grows.
///
/// Returns [`DiagnosticError::InvalidInput`] for fewer than two chains,
/// chains shorter than two draws, ragged chains or non-finite samples, and
/// [`DiagnosticError::UndefinedDiagnostic`] when the within-chain variance is
/// exactly zero, or when the variance components overflow `f64`.
///
/// See more details in Stan reference manual section
/// ["Potential Scale Reduction"](https://mc-stan.org/docs/2_24/reference-manual/notation-for-samples-chains-and-draws.html#potential-scale-reduction).
pub fn potential_scale_reduction_factor(chains: &[Array1]) -> Result<f64> {
    let n = check_chains(chains, 2, 2)?;
    let m = chains.len() as f64;

    let mut chain_mean: Array1 = Vec::with_capacity(chains.len());
    let mut chain_var: Array1 = Vec::with_capacity(chains.len());
    for chain in chains {
        let (mu, var) = mean_and_variance(chain)?;
        chain_mean.push(mu);
        chain_var.push(var);
    }

    let n = n as f64;
    let grand_mean = mean(&chain_mean)?;
    let var_between = n / (m - 1.0)
        * chain_mean
            .iter()
            .map(|mu| (mu - grand_mean).powi(2))
            .sum::<f64>();
    let var_within = mean(&chain_var)?;
    if var_within == 0.0 {
        return Err(DiagnosticError::undefined(
            "within-chain variance is zero, every chain is constant",
        ));
    }
    let var_hat = (n - 1.0) / n * var_within + var_between / n;
    if !(var_within.is_finite() && var_between.is_finite() && var_hat.is_finite()) {
        return Err(DiagnosticError::undefined(format!(
            "variance overflow (W={}, B={}, Var-hat={})",
            var_within, var_between, var_hat
        )));
    }
    let rhat = (var_hat / var_within).sqrt();
    debug!(
        chains = chains.len(),
        draws = n,
        var_within,
        var_between,
        var_hat,
        rhat,
        "computed potential scale reduction"
    );
    Ok(rhat)
}

/// Computes the split potential scale reduction (Rhat): every chain is
/// halved and Rhat is computed over the `2m` half chains, which makes the
/// statistic sensitive to drift inside a single chain.  When the number of
/// draws N is odd, the (N+1)/2th draw is ignored.
///
/// Chains must share one length of at least four draws.
///
/// See more details in Stan reference manual section
/// ["Potential Scale Reduction"](https://mc-stan.org/docs/2_24/reference-manual/notation-for-samples-chains-and-draws.html#potential-scale-reduction)
pub fn split_potential_scale_reduction_factor(chains: &[Array1]) -> Result<f64> {
    check_chains(chains, 1, 4)?;
    let split = split_chains(chains)?;
    potential_scale_reduction_factor(&split)
}

/// Caller-side convergence check: `rhat <= threshold`.  Non-finite values
/// never count as converged.
pub fn is_converged(rhat: f64, threshold: f64) -> bool {
    rhat.is_finite() && rhat <= threshold
}
