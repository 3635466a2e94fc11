//! Replication statistics: mean, sample deviation and Student-t intervals.

use serde::{Deserialize, Serialize};

/// Summary of one metric across independent replications
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub samples: usize,
    pub mean: f64,
    /// Sample standard deviation (n - 1 denominator)
    pub std_dev: f64,
    pub confidence: f64,
    pub ci_low: f64,
    pub ci_high: f64,
}

impl Summary {
    /// Summarise `samples` with a two-sided interval at `confidence`
    ///
    /// Returns `None` for an empty sample. A single sample yields a zero
    /// deviation and a degenerate interval.
    pub fn from_samples(samples: &[f64], confidence: f64) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        let n = samples.len();
        let mean = mean(samples);
        let std_dev = sample_std_dev(samples);

        let half_width = if n > 1 {
            let sem = std_dev / (n as f64).sqrt();
            sem * student_t_quantile((1.0 + confidence) / 2.0, (n - 1) as f64)
        } else {
            0.0
        };

        Some(Self {
            samples: n,
            mean,
            std_dev,
            confidence,
            ci_low: mean - half_width,
            ci_high: mean + half_width,
        })
    }

    pub fn half_width(&self) -> f64 {
        (self.ci_high - self.ci_low) / 2.0
    }
}

pub fn mean(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().sum::<f64>() / samples.len() as f64
}

pub fn sample_std_dev(samples: &[f64]) -> f64 {
    if samples.len() < 2 {
        return 0.0;
    }
    let m = mean(samples);
    let ss: f64 = samples.iter().map(|x| (x - m) * (x - m)).sum();
    (ss / (samples.len() - 1) as f64).sqrt()
}

/// Inverse CDF of Student's t distribution with `df` degrees of freedom
pub fn student_t_quantile(p: f64, df: f64) -> f64 {
    if p == 0.5 {
        return 0.0;
    }
    if p < 0.5 {
        return -student_t_quantile(1.0 - p, df);
    }

    let mut lo = 0.0;
    let mut hi = 1.0;
    while student_t_cdf(hi, df) < p && hi < 1e12 {
        hi *= 2.0;
    }
    for _ in 0..200 {
        let mid = 0.5 * (lo + hi);
        if student_t_cdf(mid, df) < p {
            lo = mid;
        } else {
            hi = mid;
        }
        if hi - lo < 1e-12 * hi.max(1.0) {
            break;
        }
    }
    0.5 * (lo + hi)
}

/// CDF of Student's t distribution with `df` degrees of freedom
pub fn student_t_cdf(t: f64, df: f64) -> f64 {
    let x = df / (df + t * t);
    let tail = 0.5 * regularized_incomplete_beta(x, df / 2.0, 0.5);
    if t >= 0.0 {
        1.0 - tail
    } else {
        tail
    }
}

/// Regularized incomplete beta function I_x(a, b)
fn regularized_incomplete_beta(x: f64, a: f64, b: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }
    let ln_front = ln_gamma(a + b) - ln_gamma(a) - ln_gamma(b) + a * x.ln() + b * (1.0 - x).ln();
    let front = ln_front.exp();
    // The continued fraction converges fast on this side of the mean
    if x < (a + 1.0) / (a + b + 2.0) {
        front * beta_continued_fraction(x, a, b) / a
    } else {
        1.0 - front * beta_continued_fraction(1.0 - x, b, a) / b
    }
}

/// Lentz evaluation of the incomplete beta continued fraction
fn beta_continued_fraction(x: f64, a: f64, b: f64) -> f64 {
    const TINY: f64 = 1e-300;
    const EPS: f64 = 1e-15;

    let mut c = 1.0;
    let mut d = 1.0 - (a + b) * x / (a + 1.0);
    if d.abs() < TINY {
        d = TINY;
    }
    d = 1.0 / d;
    let mut h = d;

    for m in 1..500 {
        let m = m as f64;
        let m2 = 2.0 * m;

        let even = m * (b - m) * x / ((a + m2 - 1.0) * (a + m2));
        d = 1.0 + even * d;
        if d.abs() < TINY {
            d = TINY;
        }
        c = 1.0 + even / c;
        if c.abs() < TINY {
            c = TINY;
        }
        d = 1.0 / d;
        h *= d * c;

        let odd = -(a + m) * (a + b + m) * x / ((a + m2) * (a + m2 + 1.0));
        d = 1.0 + odd * d;
        if d.abs() < TINY {
            d = TINY;
        }
        c = 1.0 + odd / c;
        if c.abs() < TINY {
            c = TINY;
        }
        d = 1.0 / d;
        let delta = d * c;
        h *= delta;

        if (delta - 1.0).abs() < EPS {
            break;
        }
    }
    h
}

/// Lanczos approximation of ln Γ(x) for x > 0
fn ln_gamma(x: f64) -> f64 {
    const COEFFS: [f64; 9] = [
        0.999_999_999_999_809_9,
        676.520_368_121_885_1,
        -1_259.139_216_722_402_8,
        771.323_428_777_653_1,
        -176.615_029_162_140_6,
        12.507_343_278_686_905,
        -0.138_571_095_265_720_12,
        9.984_369_578_019_572e-6,
        1.505_632_735_149_311_6e-7,
    ];

    if x < 0.5 {
        // Reflection formula
        let pi = std::f64::consts::PI;
        return (pi / (pi * x).sin()).ln() - ln_gamma(1.0 - x);
    }
    let x = x - 1.0;
    let mut sum = COEFFS[0];
    for (i, coeff) in COEFFS.iter().enumerate().skip(1) {
        sum += coeff / (x + i as f64);
    }
    let t = x + 7.5;
    0.5 * (2.0 * std::f64::consts::PI).ln() + (x + 0.5) * t.ln() - t + sum.ln()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() < tol
    }

    #[test]
    fn test_ln_gamma_known_values() {
        assert!(close(ln_gamma(1.0), 0.0, 1e-12));
        assert!(close(ln_gamma(5.0), 24f64.ln(), 1e-10));
        assert!(close(ln_gamma(0.5), std::f64::consts::PI.sqrt().ln(), 1e-10));
    }

    #[test]
    fn test_t_cdf_is_symmetric() {
        assert!(close(student_t_cdf(0.0, 7.0), 0.5, 1e-12));
        assert!(close(
            student_t_cdf(1.3, 7.0) + student_t_cdf(-1.3, 7.0),
            1.0,
            1e-12
        ));
    }

    #[test]
    fn test_t_quantiles_match_tables() {
        assert!(close(student_t_quantile(0.975, 1.0), 12.7062, 1e-3));
        assert!(close(student_t_quantile(0.975, 10.0), 2.2281, 1e-3));
        assert!(close(student_t_quantile(0.975, 49.0), 2.0096, 1e-3));
        assert!(close(student_t_quantile(0.95, 5.0), 2.0150, 1e-3));
        assert!(close(student_t_quantile(0.025, 10.0), -2.2281, 1e-3));
    }

    #[test]
    fn test_summary_of_samples() {
        let summary = Summary::from_samples(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0], 0.95).unwrap();
        assert_eq!(summary.samples, 8);
        assert!(close(summary.mean, 5.0, 1e-12));
        assert!(close(summary.std_dev, 2.138089935, 1e-8));
        // t(0.975, 7) = 2.364624
        let expected = 2.364624 * 2.138089935 / 8f64.sqrt();
        assert!(close(summary.half_width(), expected, 1e-4));
        assert!(summary.ci_low < summary.mean && summary.mean < summary.ci_high);
    }

    #[test]
    fn test_summary_edge_cases() {
        assert!(Summary::from_samples(&[], 0.95).is_none());
        let single = Summary::from_samples(&[3.0], 0.95).unwrap();
        assert_eq!(single.std_dev, 0.0);
        assert_eq!((single.ci_low, single.ci_high), (3.0, 3.0));
    }
}
