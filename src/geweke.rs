use crate::error::{DiagnosticError, Result};
use crate::utils::{check_finite, mean};
use arima::acf;
use tracing::{debug, trace};

/// Segment layout for [`geweke`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GewekeConfig {
    /// Fraction of the remaining chain used for the early segment.
    pub first: f64,
    /// Fraction of the remaining chain used for the late segment.
    pub last: f64,
    /// Number of evenly spaced starting points.
    pub intervals: usize,
}

impl Default for GewekeConfig {
    fn default() -> Self {
        GewekeConfig {
            first: 0.1,
            last: 0.5,
            intervals: 20,
        }
    }
}

impl GewekeConfig {
    pub fn new(first: f64, last: f64, intervals: usize) -> Result<Self> {
        let config = GewekeConfig {
            first,
            last,
            intervals,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.first > 0.0 && self.first < 1.0) {
            return Err(DiagnosticError::invalid(format!(
                "first must lie in (0, 1), got {}",
                self.first
            )));
        }
        if !(self.last > 0.0 && self.last < 1.0) {
            return Err(DiagnosticError::invalid(format!(
                "last must lie in (0, 1), got {}",
                self.last
            )));
        }
        if self.first + self.last > 1.0 {
            return Err(DiagnosticError::invalid(format!(
                "first + last must not exceed 1, got {} + {}",
                self.first, self.last
            )));
        }
        if self.intervals == 0 {
            return Err(DiagnosticError::invalid("intervals must be at least 1"));
        }
        Ok(())
    }
}

/// One Geweke z-score and the chain index its early segment starts at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GewekeScore {
    pub start: usize,
    pub z: f64,
}

/// Computes Geweke z-scores for a single chain.
///
/// For each of `config.intervals` starting indices `s`, evenly spaced over
/// `[0, (1 - last) * (n - 1))`, the mean of the early segment
/// `x[s .. s + first * (n - 1 - s)]` is compared with the mean of the late
/// segment `x[(n - 1) - last * (n - 1 - s) ..]`:
///
/// ```text
/// z = (mean_a - mean_b) / sqrt(S_a(0) / n_a + S_b(0) / n_b)
/// ```
///
/// where `S(0)` is the [`spectral_density_at_zero`] of a segment, so each
/// term is the long-run variance of that segment's mean.  Scores far outside
/// `[-2, 2]` suggest the early part of the chain is not yet stationary.
///
/// Every segment must hold at least two draws; shorter layouts are rejected
/// as invalid input before any score is computed.  Segments with zero
/// spectral density on both sides give an undefined score, and so do samples
/// large enough to overflow the autocovariances.
pub fn geweke(chain: &[f64], config: &GewekeConfig) -> Result<Vec<GewekeScore>> {
    config.validate()?;
    check_finite(chain)?;
    if chain.len() < 2 {
        return Err(DiagnosticError::invalid(format!(
            "chain too short for Geweke segments: {} draws",
            chain.len()
        )));
    }

    let windows = segment_windows(chain.len(), config)?;
    let mut scores = Vec::with_capacity(windows.len());
    for w in windows {
        let early = &chain[w.start..w.early_end];
        let late = &chain[w.late_start..];
        let variance_of_diff = spectral_density_at_zero(early)? / early.len() as f64
            + spectral_density_at_zero(late)? / late.len() as f64;
        if !variance_of_diff.is_finite() {
            return Err(DiagnosticError::undefined(format!(
                "variance of the segment mean difference at start {} overflowed",
                w.start
            )));
        }
        if variance_of_diff <= 0.0 {
            return Err(DiagnosticError::undefined(format!(
                "both segments starting at {} have zero spectral density",
                w.start
            )));
        }
        let z = (mean(early)? - mean(late)?) / variance_of_diff.sqrt();
        trace!(
            start = w.start,
            early = early.len(),
            late = late.len(),
            z,
            "geweke interval"
        );
        scores.push(GewekeScore { start: w.start, z });
    }
    debug!(
        draws = chain.len(),
        intervals = scores.len(),
        "computed geweke scores"
    );
    Ok(scores)
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Window {
    start: usize,
    early_end: usize,
    late_start: usize,
}

fn segment_windows(num_draws: usize, config: &GewekeConfig) -> Result<Vec<Window>> {
    let end = num_draws - 1;
    let last_start = ((1.0 - config.last) * end as f64) as usize;
    let mut windows = Vec::with_capacity(config.intervals);
    for i in 0..config.intervals {
        let start = i * last_start / config.intervals;
        let remaining = (end - start) as f64;
        let early_end = start + (config.first * remaining) as usize;
        let late_start = (end as f64 - config.last * remaining) as usize;
        let early_len = early_end - start;
        let late_len = num_draws - late_start;
        if early_len < 2 || late_len < 2 {
            return Err(DiagnosticError::invalid(format!(
                "chain of {} draws leaves a segment with fewer than 2 draws at start {} \
                 (early {}, late {})",
                num_draws, start, early_len, late_len
            )));
        }
        windows.push(Window {
            start,
            early_end,
            late_start,
        });
    }
    Ok(windows)
}

/// Estimates the spectral density at frequency zero of a stationary
/// sequence, i.e. its long-run variance, with a Bartlett-windowed sum of
/// autocovariances (the Newey-West estimator):
///
/// ```text
/// S(0) = g_0 + 2 * sum_{k=1..L} (1 - k / (L + 1)) * g_k
/// ```
///
/// `g_k` is the lag-`k` autocovariance with denominator `len` and the
/// bandwidth `L` is the integer cube root of `len`.  The Bartlett weights
/// keep the estimate non-negative.  Autocovariances that overflow `f64` are
/// [`DiagnosticError::UndefinedDiagnostic`].
pub fn spectral_density_at_zero(segment: &[f64]) -> Result<f64> {
    if segment.len() < 2 {
        return Err(DiagnosticError::invalid(format!(
            "spectral density needs at least 2 values, got {}",
            segment.len()
        )));
    }
    check_finite(segment)?;
    let bandwidth = bartlett_bandwidth(segment.len());
    let max_lag = (bandwidth + 1).min(segment.len() - 1);
    let acov = acf::acf(segment, Some(max_lag), true)
        .map_err(|e| DiagnosticError::invalid(format!("autocovariance failed: {:?}", e)))?;
    let mut density = acov.first().copied().unwrap_or(0.0);
    for (k, gamma) in acov.iter().enumerate().skip(1).take(bandwidth) {
        let weight = 1.0 - k as f64 / (bandwidth as f64 + 1.0);
        density += 2.0 * weight * gamma;
    }
    if !density.is_finite() {
        return Err(DiagnosticError::undefined(format!(
            "spectral density overflow ({}) for a segment of {} values",
            density,
            segment.len()
        )));
    }
    // Bartlett weights keep the estimate non-negative up to rounding.
    Ok(density.max(0.0))
}

fn bartlett_bandwidth(len: usize) -> usize {
    let mut l = 0usize;
    while (l + 1).pow(3) <= len {
        l += 1;
    }
    l.min(len - 1)
}
