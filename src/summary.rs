use crate::chain::ChainSet;
use crate::error::Result;
use crate::geweke::{GewekeConfig, GewekeScore};
use crate::rhat::is_converged;
use crate::utils::{flatten, mean_and_variance};
use std::fmt;
use tracing::debug;

/// Convergence diagnostics for one parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSummary {
    pub name: String,
    pub num_chains: usize,
    pub num_draws: usize,
    /// Mean over all draws of all chains.
    pub mean: f64,
    /// Standard deviation over all draws of all chains.
    pub sd: f64,
    pub rhat: f64,
    pub split_rhat: f64,
    pub ess: f64,
    pub mcse: f64,
    /// One score sequence per chain, in chain order.
    pub geweke: Vec<Vec<GewekeScore>>,
}

impl ParameterSummary {
    /// Largest absolute Geweke z-score over every chain and interval.
    pub fn max_abs_geweke(&self) -> Option<f64> {
        self.geweke
            .iter()
            .flatten()
            .map(|s| s.z.abs())
            .fold(None, |acc, z| match acc {
                Some(m) if m >= z => Some(m),
                _ => Some(z),
            })
    }

    /// Whether both the plain and the split R-hat are at or below
    /// `threshold`.
    pub fn is_converged(&self, threshold: f64) -> bool {
        is_converged(self.rhat, threshold) && is_converged(self.split_rhat, threshold)
    }
}

/// Summarizes one parameter.  The first failing diagnostic is returned as
/// the error; chains need enough draws for every Geweke segment, split
/// R-hat and ESS.
pub fn summarize(chain_set: &ChainSet, config: &GewekeConfig) -> Result<ParameterSummary> {
    let (mean, var) = mean_and_variance(&flatten(chain_set.chains()))?;
    let rhat = chain_set.rhat()?;
    let geweke = chain_set.geweke(config)?;
    let split_rhat = chain_set.split_rhat()?;
    let ess = chain_set.ess()?;
    let mcse = chain_set.mcse()?;
    debug!(parameter = chain_set.name(), rhat, "summarized parameter");
    Ok(ParameterSummary {
        name: chain_set.name().to_string(),
        num_chains: chain_set.num_chains(),
        num_draws: chain_set.num_draws(),
        mean,
        sd: var.sqrt(),
        rhat,
        split_rhat,
        ess,
        mcse,
        geweke,
    })
}

/// Diagnostics for a set of parameters from the same sampling run.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvergenceReport {
    pub parameters: Vec<ParameterSummary>,
}

impl ConvergenceReport {
    pub fn from_chain_sets(chain_sets: &[ChainSet], config: &GewekeConfig) -> Result<Self> {
        let parameters = chain_sets
            .iter()
            .map(|set| summarize(set, config))
            .collect::<Result<Vec<_>>>()?;
        Ok(ConvergenceReport { parameters })
    }

    pub fn all_converged(&self, threshold: f64) -> bool {
        self.parameters.iter().all(|p| p.is_converged(threshold))
    }

    /// Names of the parameters failing [`ParameterSummary::is_converged`].
    pub fn unconverged(&self, threshold: f64) -> Vec<&str> {
        self.parameters
            .iter()
            .filter(|p| !p.is_converged(threshold))
            .map(|p| p.name.as_str())
            .collect()
    }

    /// Render the report as a fixed-width text table.
    pub fn to_table(&self) -> String {
        let mut lines = Vec::with_capacity(self.parameters.len() + 2);
        lines.push(format!(
            "{:<12} {:>6} {:>6} {:>10} {:>10} {:>8} {:>8} {:>10} {:>10} {:>8}",
            "parameter", "chains", "draws", "mean", "sd", "r_hat", "split", "ess", "mcse", "|z|max"
        ));
        lines.push("-".repeat(94));
        for p in &self.parameters {
            lines.push(format!(
                "{:<12} {:>6} {:>6} {:>10.4} {:>10.4} {:>8.4} {:>8} {:>10} {:>10} {:>8}",
                p.name,
                p.num_chains,
                p.num_draws,
                p.mean,
                p.sd,
                p.rhat,
                fmt_num(p.split_rhat, 4),
                fmt_num(p.ess, 0),
                fmt_num(p.mcse, 6),
                p.max_abs_geweke()
                    .map_or_else(|| "-".to_string(), |z| fmt_num(z, 2)),
            ));
        }
        lines.join("\n")
    }
}

impl fmt::Display for ConvergenceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_table())
    }
}

fn fmt_num(value: f64, precision: usize) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        if value > 0.0 { "inf" } else { "-inf" }.to_string()
    } else {
        format!("{:.*}", precision, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rhat::RHAT_CONVERGENCE_THRESHOLD;
    use crate::utils::read_csv;
    use crate::Array1;
    use std::path::PathBuf;

    fn fixture_set(name: &str) -> ChainSet {
        let d = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        let chains = read_csv(d.join("test/fixtures/ar1_chains.csv"), 1, 1000).unwrap();
        ChainSet::new(name, chains).unwrap()
    }

    #[test]
    fn test_summarize_fixture() {
        let set = fixture_set("mu");
        let summary = summarize(&set, &GewekeConfig::default()).unwrap();
        assert_eq!(summary.name, "mu");
        assert_eq!(summary.num_chains, 3);
        assert_eq!(summary.num_draws, 200);
        assert_abs_diff_eq!(summary.rhat, set.rhat().unwrap());
        assert_eq!(summary.split_rhat, set.split_rhat().unwrap());
        assert_eq!(summary.ess, set.ess().unwrap());
        assert_eq!(summary.mcse, set.mcse().unwrap());
        assert_eq!(summary.geweke.len(), 3);
        assert!(summary.geweke.iter().all(|g| g.len() == 20));
        assert!(summary.is_converged(RHAT_CONVERGENCE_THRESHOLD));
        assert!(summary.max_abs_geweke().unwrap() > 0.0);
    }

    #[test]
    fn test_short_chains_are_rejected() {
        let set = ChainSet::new("tau", vec![vec![1.0, 2.0, 3.0], vec![1.5, 2.5, 3.5]]).unwrap();
        let config = GewekeConfig::new(0.5, 0.5, 1).unwrap();
        // Three draws cannot hold two Geweke segments of two draws each.
        assert!(summarize(&set, &config).unwrap_err().is_invalid_input());
    }

    #[test]
    fn test_report_flags_unconverged_parameters() {
        let good = fixture_set("mu");
        let shifted: Vec<Array1> = good
            .chains()
            .iter()
            .enumerate()
            .map(|(i, c)| c.iter().map(|x| x + 5.0 * i as f64).collect())
            .collect();
        let bad = ChainSet::new("beta", shifted).unwrap();
        let report =
            ConvergenceReport::from_chain_sets(&[good, bad], &GewekeConfig::default()).unwrap();
        assert!(!report.all_converged(RHAT_CONVERGENCE_THRESHOLD));
        assert_eq!(report.unconverged(RHAT_CONVERGENCE_THRESHOLD), vec!["beta"]);

        let table = report.to_table();
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("parameter"));
        assert!(lines[2].starts_with("mu"));
        assert!(lines[3].starts_with("beta"));
        assert_eq!(report.to_string(), table);
    }

    #[test]
    fn test_max_abs_geweke() {
        let mut summary = summarize(&fixture_set("mu"), &GewekeConfig::default()).unwrap();
        summary.geweke = vec![
            vec![
                GewekeScore { start: 0, z: 0.5 },
                GewekeScore { start: 5, z: -2.5 },
            ],
            vec![GewekeScore { start: 0, z: 1.0 }],
        ];
        assert_eq!(summary.max_abs_geweke(), Some(2.5));
        summary.geweke.clear();
        assert_eq!(summary.max_abs_geweke(), None);
    }

    #[test]
    fn test_fmt_num() {
        assert_eq!(fmt_num(1.23456, 2), "1.23");
        assert_eq!(fmt_num(412.7, 0), "413");
        assert_eq!(fmt_num(f64::NAN, 2), "NaN");
        assert_eq!(fmt_num(f64::INFINITY, 2), "inf");
        assert_eq!(fmt_num(f64::NEG_INFINITY, 1), "-inf");
    }
}
