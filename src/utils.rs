use crate::error::{DiagnosticError, Result};
use crate::{Array1, Array2};
use anyhow::Context;
use average::Variance;
use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

/// Compute the arithmetic mean of an array.
pub fn mean(arr: &[f64]) -> Result<f64> {
    if arr.is_empty() {
        return Err(DiagnosticError::invalid("can't take mean of empty array"));
    }
    let sum = arr.iter().sum::<f64>();
    Ok(sum / arr.len() as f64)
}

/// Compute the sample variance of an array using Bessel's correction.
pub fn sample_variance(arr: &[f64]) -> Result<f64> {
    if arr.len() < 2 {
        return Err(DiagnosticError::invalid(format!(
            "sample variance needs at least 2 values, got {}",
            arr.len()
        )));
    }
    let var: Variance = arr.iter().copied().collect();
    Ok(var.sample_variance())
}

/// Mean and sample variance in a single pass.
pub(crate) fn mean_and_variance(arr: &[f64]) -> Result<(f64, f64)> {
    if arr.len() < 2 {
        return Err(DiagnosticError::invalid(format!(
            "sample variance needs at least 2 values, got {}",
            arr.len()
        )));
    }
    let var: Variance = arr.iter().copied().collect();
    Ok((var.mean(), var.sample_variance()))
}

/// Errors unless every value is finite.
pub fn check_finite(arr: &[f64]) -> Result<()> {
    match arr.iter().position(|x| !x.is_finite()) {
        Some(idx) => Err(DiagnosticError::invalid(format!(
            "all samples must be finite (value {} at index {})",
            arr[idx], idx
        ))),
        None => Ok(()),
    }
}

/// Validates that there are at least `min_chains` chains, that they all share
/// one length of at least `min_draws`, and that every sample is finite.
/// Returns the common chain length.
pub fn check_chains(chains: &[Array1], min_chains: usize, min_draws: usize) -> Result<usize> {
    if chains.len() < min_chains {
        return Err(DiagnosticError::invalid(format!(
            "need at least {} chains, got {}",
            min_chains,
            chains.len()
        )));
    }
    let num_draws = match chains.first() {
        Some(c) => c.len(),
        None => return Err(DiagnosticError::invalid("no chains supplied")),
    };
    if let Some((idx, c)) = chains
        .iter()
        .enumerate()
        .find(|(_, c)| c.len() != num_draws)
    {
        return Err(DiagnosticError::invalid(format!(
            "chains must have equal length: chain 0 has {} draws, chain {} has {}",
            num_draws,
            idx,
            c.len()
        )));
    }
    if num_draws < min_draws {
        return Err(DiagnosticError::invalid(format!(
            "need at least {} draws per chain, got {}",
            min_draws, num_draws
        )));
    }
    for chain in chains {
        check_finite(chain)?;
    }
    Ok(num_draws)
}

/// Splits each chain into two chains of equal length.  When the
/// number of total draws N is odd, the (N+1)/2th draw is ignored.
///
/// See more details in Stan reference manual section
/// ["Effective Sample Size"](http://mc-stan.org/users/documentation).
///
/// Chains must all be the same length.
pub fn split_chains(chains: &[Array1]) -> Result<Array2> {
    let num_draws = check_chains(chains, 1, 2)?;
    let half = num_draws / 2;
    let offset = num_draws % 2;
    let mut split_draws = Vec::with_capacity(chains.len() * 2);
    for chain in chains {
        split_draws.push(chain[..half].to_vec());
        split_draws.push(chain[(half + offset)..].to_vec());
    }
    Ok(split_draws)
}

/// Concatenates all chains into a single array, chain after chain.
pub fn flatten(chains: &[Array1]) -> Array1 {
    chains.iter().flat_map(|c| c.iter().copied()).collect()
}

/// Reads up to `n_rows` lines of a comma separated file after skipping
/// `skip_rows`, returning one array per column.  This is the layout of Stan
/// output CSV where each column is one parameter, and also of a file holding
/// one chain per column.
pub fn read_csv<P: AsRef<Path>>(path: P, skip_rows: usize, n_rows: usize) -> anyhow::Result<Array2> {
    let path = path.as_ref();
    let f = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut result: Array2 = Vec::new();
    for (line_no, line) in BufReader::new(f)
        .lines()
        .enumerate()
        .skip(skip_rows)
        .take(n_rows)
    {
        let line = line.with_context(|| format!("failed to read line {}", line_no + 1))?;
        if line.trim().is_empty() {
            continue;
        }
        for (idx, value) in line.split(',').enumerate() {
            if idx >= result.len() {
                result.push(Vec::new())
            }
            let parsed = value.trim().parse::<f64>().with_context(|| {
                format!(
                    "{}:{}: column {} is not a number: {:?}",
                    path.display(),
                    line_no + 1,
                    idx,
                    value
                )
            })?;
            result[idx].push(parsed);
        }
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_stats() {
        // Reference values computed with numpy.
        let arr = vec![
            2.13829088,
            -1.06214379,
            -0.79265699,
            -0.21300888,
            -1.07155142,
            -0.50425317,
            0.95708854,
            -1.23854172,
            1.37124938,
            1.17658286,
        ];
        let empty: Array1 = vec![];
        assert_abs_diff_eq!(
            sample_variance(&arr).unwrap(),
            1.492596054209826,
            epsilon = 1e-6
        );
        assert_abs_diff_eq!(mean(&arr).unwrap(), 0.07610557018217139, epsilon = 1e-6);
        let (m, v) = mean_and_variance(&arr).unwrap();
        assert_abs_diff_eq!(m, 0.07610557018217139, epsilon = 1e-6);
        assert_abs_diff_eq!(v, 1.492596054209826, epsilon = 1e-6);

        assert!(sample_variance(&empty).is_err());
        assert!(sample_variance(&[1.0]).is_err());
        assert!(mean(&empty).is_err());
    }

    #[test]
    fn test_check_chains() {
        let ok = vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]];
        assert_eq!(check_chains(&ok, 2, 2).unwrap(), 3);

        let one = vec![vec![1.0, 2.0, 3.0]];
        assert!(check_chains(&one, 2, 2).unwrap_err().is_invalid_input());

        let ragged = vec![vec![1.0, 2.0, 3.0], vec![1.0, 2.0, 3.0, 4.0]];
        assert!(check_chains(&ragged, 2, 2).unwrap_err().is_invalid_input());

        let short = vec![vec![1.0], vec![2.0]];
        assert!(check_chains(&short, 2, 2).unwrap_err().is_invalid_input());

        let nan = vec![vec![1.0, f64::NAN], vec![2.0, 3.0]];
        assert!(check_chains(&nan, 2, 2).unwrap_err().is_invalid_input());

        let inf = vec![vec![1.0, 2.0], vec![f64::NEG_INFINITY, 3.0]];
        assert!(check_chains(&inf, 2, 2).unwrap_err().is_invalid_input());

        assert!(check_chains(&[], 0, 0).is_err());
    }

    #[test]
    fn test_split_empty_chains() {
        let chains = vec![vec![1.0], vec![], vec![]];
        assert!(split_chains(&chains).is_err());

        let chains: Array2 = vec![vec![], vec![]];
        assert!(split_chains(&chains).is_err());
    }

    #[test]
    fn test_split_even_chains() {
        let chains = vec![vec![1.0, 2.0, 3.0, 4.0], vec![5.0, 6.0, 7.0, 8.0]];
        let split = split_chains(&chains).unwrap();
        assert_eq!(split.len(), 4);
        assert_eq!(split[0], vec![1.0, 2.0]);
        assert_eq!(split[1], vec![3.0, 4.0]);
        assert_eq!(split[2], vec![5.0, 6.0]);
        assert_eq!(split[3], vec![7.0, 8.0]);
    }

    #[test]
    fn test_split_odd_chains() {
        // The middle draw is dropped, as Stan does.
        let chains = vec![
            vec![1.0, 2.0, 3.0, 4.0, 4.5],
            vec![5.0, 6.0, 7.0, 8.0, 8.5],
        ];
        let split = split_chains(&chains).unwrap();
        assert_eq!(split[0], vec![1.0, 2.0]);
        assert_eq!(split[1], vec![4.0, 4.5]);
        assert_eq!(split[2], vec![5.0, 6.0]);
        assert_eq!(split[3], vec![8.0, 8.5]);
    }

    #[test]
    fn test_flatten() {
        let chains = vec![vec![1.0, 2.0], vec![3.0, 4.0]];
        assert_eq!(flatten(&chains), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_read_csv_fixture() {
        let d = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        let chains = read_csv(d.join("test/fixtures/ar1_chains.csv"), 1, 1000).unwrap();
        assert_eq!(chains.len(), 3);
        for chain in &chains {
            assert_eq!(chain.len(), 200);
        }
    }

    #[test]
    fn test_read_csv_missing_file() {
        let err = read_csv("does/not/exist.csv", 0, 10).unwrap_err();
        assert!(err.to_string().contains("does/not/exist.csv"));
    }
}
