//! Descriptive statistics over Monte Carlo samples.

use serde::{Deserialize, Serialize};

pub const DEFAULT_HISTOGRAM_BINS: usize = 20;

pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

/// Population standard deviation (divides by n).
pub fn std_dev(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let m = mean(data);
    let variance = data.iter().map(|v| (v - m).powi(2)).sum::<f64>() / data.len() as f64;
    variance.sqrt()
}

pub fn sorted(data: &[f64]) -> Vec<f64> {
    let mut values = data.to_vec();
    values.sort_by(f64::total_cmp);
    values
}

/// Linear-interpolated percentile, `p` in [0, 100].
pub fn percentile(data: &[f64], p: f64) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    Some(percentile_of_sorted(&sorted(data), p))
}

/// Same as [`percentile`] for data already sorted ascending and non-empty.
pub fn percentile_of_sorted(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if p <= 0.0 {
        return sorted[0];
    }
    if p >= 100.0 {
        return sorted[n - 1];
    }

    let rank = (p / 100.0) * (n - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        return sorted[lower];
    }
    let weight = rank - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * weight
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PercentileValue {
    pub percentile: f64,
    pub value: f64,
}

pub fn percentiles(data: &[f64], requested: &[f64]) -> Vec<PercentileValue> {
    if data.is_empty() {
        return Vec::new();
    }
    let sorted = sorted(data);
    requested
        .iter()
        .map(|&p| PercentileValue {
            percentile: p,
            value: percentile_of_sorted(&sorted, p),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

impl HistogramBin {
    pub fn label(&self) -> String {
        if self.lower == self.upper {
            format!("{:.1}", self.lower)
        } else {
            format!("{:.1}-{:.1}", self.lower, self.upper)
        }
    }
}

/// Equal-width bins over [min, max]. Identical values collapse into a
/// single bin.
pub fn histogram(data: &[f64], bin_count: usize) -> Vec<HistogramBin> {
    if data.is_empty() || bin_count == 0 {
        return Vec::new();
    }
    let min = data.iter().copied().fold(f64::INFINITY, f64::min);
    let max = data.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    if min == max {
        return vec![HistogramBin {
            lower: min,
            upper: max,
            count: data.len(),
        }];
    }

    let width = (max - min) / bin_count as f64;
    let mut bins: Vec<HistogramBin> = (0..bin_count)
        .map(|i| HistogramBin {
            lower: min + width * i as f64,
            upper: if i + 1 == bin_count {
                max
            } else {
                min + width * (i + 1) as f64
            },
            count: 0,
        })
        .collect();

    for &value in data {
        let slot = (((value - min) / width).floor() as usize).min(bin_count - 1);
        bins[slot].count += 1;
    }
    bins
}

/// Sample Pearson correlation clamped to [-1, 1]; 0 when undefined.
pub fn pearson_correlation(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len().min(y.len());
    if n <= 1 {
        return 0.0;
    }
    let x = &x[..n];
    let y = &y[..n];
    let mean_x = mean(x);
    let mean_y = mean(y);

    let mut covariance = 0.0;
    let mut sum_sq_x = 0.0;
    let mut sum_sq_y = 0.0;
    for (xi, yi) in x.iter().zip(y) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        covariance += dx * dy;
        sum_sq_x += dx * dx;
        sum_sq_y += dy * dy;
    }

    let denominator_n = (n - 1) as f64;
    let sd_x = (sum_sq_x / denominator_n).sqrt();
    let sd_y = (sum_sq_y / denominator_n).sqrt();
    if sd_x == 0.0 || sd_y == 0.0 {
        return 0.0;
    }

    (covariance / (denominator_n * sd_x * sd_y)).clamp(-1.0, 1.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub value: f64,
    pub cumulative_probability: f64,
}

/// Cumulative probability curve over the sorted samples.
pub fn s_curve(data: &[f64]) -> Vec<CurvePoint> {
    let n = data.len() as f64;
    sorted(data)
        .into_iter()
        .enumerate()
        .map(|(i, value)| CurvePoint {
            value,
            cumulative_probability: (i + 1) as f64 / n,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentile_boundaries_clamp() {
        let data = [3.0, 1.0, 2.0];
        assert_eq!(percentile(&data, 0.0), Some(1.0));
        assert_eq!(percentile(&data, 100.0), Some(3.0));
        assert_eq!(percentile(&data, -5.0), Some(1.0));
        assert_eq!(percentile(&data, 250.0), Some(3.0));
        assert_eq!(percentile(&[], 50.0), None);
    }

    #[test]
    fn sorting_orders_nan_last() {
        let values = sorted(&[2.0, f64::NAN, 1.0, 3.0]);
        assert_eq!(&values[..3], &[1.0, 2.0, 3.0]);
        assert!(values[3].is_nan());
    }

    #[test]
    fn population_std_dev() {
        let data = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(mean(&data), 5.0);
        assert_eq!(std_dev(&data), 2.0);
    }

    #[test]
    fn histogram_places_max_in_last_bin() {
        let data: Vec<f64> = (0..=10).map(f64::from).collect();
        let bins = histogram(&data, 5);
        assert_eq!(bins.len(), 5);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 11);
        assert_eq!(bins[4].upper, 10.0);
        assert_eq!(bins[4].count, 3);
        assert_eq!(bins[0].label(), "0.0-2.0");
    }

    #[test]
    fn s_curve_reaches_one() {
        let curve = s_curve(&[4.0, 1.0, 3.0, 2.0]);
        assert_eq!(curve.first().unwrap().value, 1.0);
        assert_eq!(curve.last().unwrap().cumulative_probability, 1.0);
        assert_eq!(curve[1].cumulative_probability, 0.5);
    }
}
