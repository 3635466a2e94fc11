use std::fs;
use std::path::{Path, PathBuf};

use rand::Rng;
use rand_distr::{Distribution, Exp};
use serde::{Deserialize, Serialize};

use crate::core::errors::SimError;
use crate::core::pool::DurationPool;
use crate::core::types::SimTime;

/// Where a duration pool comes from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DurationSource {
    /// Exponentially distributed samples with the given mean
    Exponential { mean: SimTime },
    /// Every sample has the same value
    Fixed { value: SimTime },
    /// Whitespace-separated samples read from a data file
    Empirical { path: PathBuf },
}

impl DurationSource {
    /// Produce a pool of `size` samples (empirical files keep their own length)
    pub fn materialize<R: Rng + ?Sized>(
        &self,
        owner: &str,
        size: usize,
        rng: &mut R,
    ) -> Result<DurationPool, SimError> {
        match self {
            DurationSource::Exponential { mean } => {
                DurationPool::new(owner, exponential_samples(owner, *mean, size, rng)?)
            }
            DurationSource::Fixed { value } => DurationPool::constant(owner, *value, size),
            DurationSource::Empirical { path } => DurationPool::new(owner, load_samples(path)?),
        }
    }

    /// Multiply the source's mean by `factor`
    pub fn scale(&mut self, factor: f64) -> Result<(), SimError> {
        match self {
            DurationSource::Exponential { mean } => *mean *= factor,
            DurationSource::Fixed { value } => *value *= factor,
            DurationSource::Empirical { path } => {
                return Err(SimError::InvalidConfig(format!(
                    "cannot scale empirical data from {}",
                    path.display()
                )))
            }
        }
        Ok(())
    }
}

/// Draw `size` exponential samples with the given mean
pub fn exponential_samples<R: Rng + ?Sized>(
    owner: &str,
    mean: SimTime,
    size: usize,
    rng: &mut R,
) -> Result<Vec<SimTime>, SimError> {
    if !mean.is_finite() || mean <= 0.0 {
        return Err(SimError::InvalidDuration {
            owner: owner.to_string(),
            value: mean,
        });
    }
    let exp = Exp::new(1.0 / mean).map_err(|e| SimError::InvalidConfig(e.to_string()))?;
    Ok((0..size).map(|_| exp.sample(&mut *rng)).collect())
}

/// Read every whitespace-separated number in `path`
pub fn load_samples(path: &Path) -> Result<Vec<SimTime>, SimError> {
    let text = fs::read_to_string(path)
        .map_err(|e| SimError::Io(format!("{}: {}", path.display(), e)))?;
    parse_samples(&text).map_err(|token| {
        SimError::Parse(format!("{}: '{}' is not a number", path.display(), token))
    })
}

/// Parse whitespace-separated numbers, returning the first bad token on failure
pub fn parse_samples(text: &str) -> Result<Vec<SimTime>, String> {
    text.split_whitespace()
        .map(|token| token.parse::<SimTime>().map_err(|_| token.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_exponential_samples_have_roughly_the_mean() {
        let mut rng = StdRng::seed_from_u64(11);
        let samples = exponential_samples("ws", 4.0, 20_000, &mut rng).unwrap();
        let mean = samples.iter().sum::<f64>() / samples.len() as f64;
        assert!((mean - 4.0).abs() < 0.2, "mean was {}", mean);
        assert!(samples.iter().all(|s| *s >= 0.0));
    }

    #[test]
    fn test_non_positive_mean_is_rejected() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(exponential_samples("ws", 0.0, 10, &mut rng).is_err());
    }

    #[test]
    fn test_parse_samples() {
        assert_eq!(
            parse_samples("1.5 2\n3.25\t\n").unwrap(),
            vec![1.5, 2.0, 3.25]
        );
        assert_eq!(parse_samples("1.0 abc"), Err("abc".to_string()));
    }

    #[test]
    fn test_load_samples_from_file() {
        let path = std::env::temp_dir().join(format!("durations_{}.dat", std::process::id()));
        fs::write(&path, "0.5\n1.25\n").unwrap();
        let samples = load_samples(&path).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(samples, vec![0.5, 1.25]);
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        let result = load_samples(Path::new("/definitely/not/here.dat"));
        assert!(matches!(result, Err(SimError::Io(_))));
    }

    #[test]
    fn test_scale_fixed_source() {
        let mut source = DurationSource::Fixed { value: 2.0 };
        source.scale(1.5).unwrap();
        assert_eq!(source, DurationSource::Fixed { value: 3.0 });
    }

    #[test]
    fn test_source_json_shape() {
        let source: DurationSource =
            serde_json::from_str(r#"{"kind": "exponential", "mean": 4.6}"#).unwrap();
        assert_eq!(source, DurationSource::Exponential { mean: 4.6 });
    }
}
