//! Random draws for task durations and costs.
//!
//! A [`Sampler`] owns its random stream, so every trial chunk of a Monte
//! Carlo batch can carry an independent, reproducible generator. Out-of-domain
//! parameters never fail a draw: the sampler falls back to a nominal value,
//! emits a `warn!` event and bumps [`Sampler::fallback_count`].

use crate::task::{CostEstimate, DurationEstimate};
use rand::Rng;
use rand::distr::Open01;
use rand_distr::{Beta, Distribution};
use std::f64::consts::PI;
use tracing::warn;

#[derive(Debug)]
pub struct Sampler<R> {
    rng: R,
    fallbacks: usize,
}

impl<R: Rng> Sampler<R> {
    pub fn new(rng: R) -> Self {
        Self { rng, fallbacks: 0 }
    }

    /// Number of parameter recoveries performed by this sampler so far.
    pub fn fallback_count(&self) -> usize {
        self.fallbacks
    }

    pub fn sample_duration(&mut self, estimate: &DurationEstimate) -> f64 {
        match *estimate {
            DurationEstimate::Triangular { min, likely, max } => self.triangular(min, likely, max),
            DurationEstimate::Pert {
                min,
                likely,
                max,
                gamma,
            } => self.pert(min, likely, max, gamma),
            DurationEstimate::Normal { mean, std_dev } => self.normal(mean, std_dev),
            DurationEstimate::LogNormal { mu, sigma } => self.log_normal(mu, sigma),
        }
    }

    pub fn sample_cost(&mut self, estimate: &CostEstimate) -> f64 {
        self.triangular(estimate.min, estimate.likely, estimate.max)
    }

    pub fn triangular(&mut self, min: f64, mode: f64, max: f64) -> f64 {
        if max == min {
            return min;
        }
        let (min, max) = if max < min {
            self.record_fallback("triangular", "max below min, bounds swapped", &[min, mode, max]);
            (max, min)
        } else {
            (min, max)
        };
        let mode = mode.max(min).min(max);

        let u = self.open_unit();
        let range = max - min;
        let c = (mode - min) / range;
        if u < c {
            min + (u * range * (mode - min)).sqrt()
        } else {
            max - ((1.0 - u) * range * (max - mode)).sqrt()
        }
    }

    pub fn normal(&mut self, mean: f64, std_dev: f64) -> f64 {
        if std_dev < 0.0 {
            self.record_fallback("normal", "negative std_dev, using mean", &[mean, std_dev]);
            return mean;
        }
        if std_dev == 0.0 {
            return mean;
        }
        mean + std_dev * self.standard_normal()
    }

    pub fn log_normal(&mut self, mu: f64, sigma: f64) -> f64 {
        if sigma < 0.0 {
            self.record_fallback("log_normal", "negative sigma, using e^mu", &[mu, sigma]);
            return mu.exp();
        }
        if sigma == 0.0 {
            return mu.exp();
        }
        self.normal(mu, sigma).exp()
    }

    pub fn pert(&mut self, min: f64, likely: f64, max: f64, gamma: f64) -> f64 {
        if max == min {
            return min;
        }
        if max < min || likely < min || likely > max {
            self.record_fallback(
                "pert",
                "estimates out of order, using likely",
                &[min, likely, max],
            );
            return likely;
        }

        let Some((alpha, beta)) = pert_shape(min, likely, max, gamma) else {
            self.record_fallback(
                "pert",
                "degenerate beta shape, using triangular",
                &[min, likely, max, gamma],
            );
            return self.triangular(min, likely, max);
        };

        match Beta::new(alpha, beta) {
            Ok(dist) => min + dist.sample(&mut self.rng) * (max - min),
            Err(err) => {
                warn!(alpha, beta, error = %err, "beta distribution rejected shape");
                self.record_fallback(
                    "pert",
                    "beta rejected shape, using triangular",
                    &[min, likely, max, gamma],
                );
                self.triangular(min, likely, max)
            }
        }
    }

    /// Box-Muller transform over two draws from the open unit interval.
    fn standard_normal(&mut self) -> f64 {
        let u = self.open_unit();
        let v = self.open_unit();
        (-2.0 * u.ln()).sqrt() * (2.0 * PI * v).cos()
    }

    fn open_unit(&mut self) -> f64 {
        self.rng.sample(Open01)
    }

    fn record_fallback(&mut self, family: &'static str, reason: &'static str, params: &[f64]) {
        self.fallbacks += 1;
        warn!(family, ?params, "{reason}");
    }
}

/// Moment-matched beta shape parameters for a PERT estimate.
///
/// Returns `None` when a denominator vanishes (including the symmetric case
/// where the mean coincides with the mode) or when the resulting shapes are
/// not finite and positive.
pub fn pert_shape(min: f64, likely: f64, max: f64, gamma: f64) -> Option<(f64, f64)> {
    let range = max - min;
    let weight = gamma + 2.0;
    if range == 0.0 || weight == 0.0 {
        return None;
    }
    let mean = (min + gamma * likely + max) / weight;

    let alpha_denominator = (likely - mean) * range;
    let beta_denominator = mean - min;
    if alpha_denominator == 0.0 || beta_denominator == 0.0 {
        return None;
    }

    let alpha = ((mean - min) * (2.0 * likely - min - max)) / alpha_denominator;
    let beta = alpha * (max - mean) / beta_denominator;

    if alpha.is_finite() && beta.is_finite() && alpha > 0.0 && beta > 0.0 {
        Some((alpha, beta))
    } else {
        None
    }
}
