//! Synthetic reprojection-error test data.
//!
//! Nothing here is measured. The sampler draws errors from a normal
//! distribution centred on the single user-entered mean so that the
//! presentation layer has something to plot.
//!
//! ## Model
//!
//! e_i = |X_i|,  X_i ~ N(μ, (r·μ)²),  i = 1..n
//!
//! with μ the mean reprojection error, r the spread ratio and n the sample
//! count. The RNG is seeded, so a given (seed, μ) always yields the same
//! samples.

use crate::error::{CalibError, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

/// Default RNG seed.
pub const DEFAULT_SEED: u64 = 0;
/// Default number of samples.
pub const DEFAULT_SAMPLE_COUNT: usize = 100;
/// Default standard deviation as a fraction of the mean.
pub const DEFAULT_SPREAD_RATIO: f64 = 0.3;
/// Default number of histogram bins.
pub const DEFAULT_HISTOGRAM_BINS: usize = 20;

/// Seeded generator of illustrative reprojection errors.
#[derive(Debug, Clone, PartialEq)]
pub struct ReprojectionErrorSampler {
    /// RNG seed
    pub seed: u64,
    /// Number of samples per draw
    pub sample_count: usize,
    /// Standard deviation as a fraction of the mean
    pub spread_ratio: f64,
}

impl Default for ReprojectionErrorSampler {
    fn default() -> Self {
        Self::new(DEFAULT_SEED, DEFAULT_SAMPLE_COUNT, DEFAULT_SPREAD_RATIO)
    }
}

impl ReprojectionErrorSampler {
    /// Create a sampler.
    pub fn new(seed: u64, sample_count: usize, spread_ratio: f64) -> Self {
        Self {
            seed,
            sample_count,
            spread_ratio,
        }
    }

    /// Draw `sample_count` absolute errors around `mean`.
    ///
    /// # Errors
    /// [`CalibError::Sampling`] if `mean` is negative or non-finite, or the
    /// spread ratio gives an invalid standard deviation.
    pub fn sample(&self, mean: f64) -> Result<Vec<f64>> {
        if !mean.is_finite() || mean < 0.0 {
            return Err(CalibError::sampling(format!(
                "mean reprojection error must be finite and non-negative, got {}",
                mean
            )));
        }

        let std_dev = self.spread_ratio * mean;
        let normal = Normal::new(mean, std_dev).map_err(|e| {
            CalibError::sampling(format!("invalid standard deviation {}: {}", std_dev, e))
        })?;

        let mut rng = StdRng::seed_from_u64(self.seed);
        let samples: Vec<f64> = (0..self.sample_count)
            .map(|_| normal.sample(&mut rng).abs())
            .collect();

        tracing::debug!(
            seed = self.seed,
            mean,
            std_dev,
            count = samples.len(),
            "Generated synthetic reprojection errors"
        );

        Ok(samples)
    }
}

/// Equal-width histogram of a sample set.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    /// Bin edges, `counts.len() + 1` values in ascending order
    pub edges: Vec<f64>,
    /// Samples per bin
    pub counts: Vec<usize>,
}

impl Histogram {
    /// Bin `samples` into `bins` equal-width bins spanning their range.
    ///
    /// Every bin is half-open `[lo, hi)` except the last, which also holds
    /// the maximum. When all samples are equal the range is widened by 0.5
    /// on each side, or by enough ulps to keep the bins distinct at large
    /// magnitudes.
    pub fn from_samples(samples: &[f64], bins: usize) -> Result<Self> {
        if bins == 0 {
            return Err(CalibError::sampling("histogram needs at least one bin"));
        }
        if samples.is_empty() {
            return Err(CalibError::sampling("histogram needs at least one sample"));
        }
        if samples.iter().any(|s| !s.is_finite()) {
            return Err(CalibError::sampling("histogram samples must be finite"));
        }

        let mut lo = samples.iter().copied().fold(f64::INFINITY, f64::min);
        let mut hi = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if lo == hi {
            let pad = 0.5_f64.max(lo.abs() * f64::EPSILON * bins as f64);
            lo -= pad;
            hi += pad;
        }

        let width = (hi - lo) / bins as f64;
        if !(width.is_finite() && width > 0.0) {
            return Err(CalibError::sampling(format!(
                "histogram range [{}, {}] cannot be split into {} bins",
                lo, hi, bins
            )));
        }
        let edges: Vec<f64> = (0..=bins).map(|i| lo + width * i as f64).collect();

        let mut counts = vec![0usize; bins];
        for &s in samples {
            let idx = (((s - lo) / width).floor() as usize).min(bins - 1);
            counts[idx] += 1;
        }

        Ok(Self { edges, counts })
    }

    /// Number of bins.
    pub fn bins(&self) -> usize {
        self.counts.len()
    }

    /// Total number of binned samples.
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Largest bin count.
    pub fn max_count(&self) -> usize {
        self.counts.iter().copied().max().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_sampler() {
        let sampler = ReprojectionErrorSampler::default();
        assert_eq!(sampler.seed, 0);
        assert_eq!(sampler.sample_count, 100);
        assert_relative_eq!(sampler.spread_ratio, 0.3);
    }

    #[test]
    fn test_sample_count_and_sign() {
        let samples = ReprojectionErrorSampler::default().sample(0.6450).unwrap();
        assert_eq!(samples.len(), 100);
        assert!(samples.iter().all(|&s| s >= 0.0));
    }

    #[test]
    fn test_sample_deterministic_for_seed() {
        let sampler = ReprojectionErrorSampler::default();
        assert_eq!(sampler.sample(0.6450).unwrap(), sampler.sample(0.6450).unwrap());

        let other = ReprojectionErrorSampler::new(7, 100, 0.3);
        assert_ne!(sampler.sample(0.6450).unwrap(), other.sample(0.6450).unwrap());
    }

    #[test]
    fn test_sample_statistics() {
        let mean = 0.6450;
        let sampler = ReprojectionErrorSampler::new(42, 10_000, 0.3);
        let samples = sampler.sample(mean).unwrap();

        let n = samples.len() as f64;
        let sample_mean = samples.iter().sum::<f64>() / n;
        let variance = samples
            .iter()
            .map(|s| (s - sample_mean).powi(2))
            .sum::<f64>()
            / (n - 1.0);

        assert_relative_eq!(sample_mean, mean, max_relative = 0.02);
        assert_relative_eq!(variance.sqrt(), 0.3 * mean, max_relative = 0.05);
    }

    #[test]
    fn test_zero_mean_gives_zeros() {
        let samples = ReprojectionErrorSampler::default().sample(0.0).unwrap();
        assert!(samples.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_negative_mean_rejected() {
        let result = ReprojectionErrorSampler::default().sample(-0.5);
        assert!(matches!(result, Err(CalibError::Sampling(_))));

        let result = ReprojectionErrorSampler::default().sample(f64::NAN);
        assert!(matches!(result, Err(CalibError::Sampling(_))));
    }

    #[test]
    fn test_negative_spread_rejected() {
        let result = ReprojectionErrorSampler::new(0, 10, -0.3).sample(1.0);
        assert!(matches!(result, Err(CalibError::Sampling(_))));
    }

    #[test]
    fn test_histogram_counts_sum() {
        let samples = ReprojectionErrorSampler::default().sample(0.6450).unwrap();
        let hist = Histogram::from_samples(&samples, 20).unwrap();

        assert_eq!(hist.bins(), 20);
        assert_eq!(hist.edges.len(), 21);
        assert_eq!(hist.total(), 100);
        assert!(hist.max_count() > 0);
        assert!(hist.edges.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_histogram_max_lands_in_last_bin() {
        let hist = Histogram::from_samples(&[0.0, 1.0, 2.0, 3.0, 4.0], 4).unwrap();
        assert_eq!(hist.counts, vec![1, 1, 1, 2]);
        assert_relative_eq!(hist.edges[0], 0.0);
        assert_relative_eq!(hist.edges[4], 4.0);
    }

    #[test]
    fn test_histogram_degenerate_range() {
        let hist = Histogram::from_samples(&[0.5, 0.5, 0.5], 2).unwrap();
        assert_relative_eq!(hist.edges[0], 0.0);
        assert_relative_eq!(hist.edges[2], 1.0);
        assert_eq!(hist.counts, vec![0, 3]);
    }

    #[test]
    fn test_histogram_degenerate_range_at_large_magnitude() {
        let samples = ReprojectionErrorSampler::new(0, 4, 0.0).sample(1e17).unwrap();
        let hist = Histogram::from_samples(&samples, 20).unwrap();

        assert_eq!(hist.total(), 4);
        assert_eq!(hist.counts[0], 0);
        assert!(hist.edges.windows(2).all(|w| w[0] < w[1]));
        assert!(hist.edges[0] < 1e17 && 1e17 < hist.edges[20]);
    }

    #[test]
    fn test_histogram_rejects_unsplittable_range() {
        let result = Histogram::from_samples(&[-1.7e308, 1.7e308], 10);
        assert!(matches!(result, Err(CalibError::Sampling(_))));
    }

    #[test]
    fn test_histogram_rejects_empty_input() {
        assert!(Histogram::from_samples(&[], 10).is_err());
        assert!(Histogram::from_samples(&[1.0], 0).is_err());
    }
}
