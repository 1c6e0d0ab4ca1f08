use rand::SeedableRng;
use rand::rngs::StdRng;
use schedule_risk::distribution::{Sampler, pert_shape};
use schedule_risk::{CostEstimate, DurationEstimate};

const SAMPLES: usize = 20_000;

fn sampler(seed: u64) -> Sampler<StdRng> {
    Sampler::new(StdRng::seed_from_u64(seed))
}

fn draw(estimate: DurationEstimate, seed: u64) -> Vec<f64> {
    let mut s = sampler(seed);
    (0..SAMPLES).map(|_| s.sample_duration(&estimate)).collect()
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

#[test]
fn triangular_stays_in_bounds_and_centres_on_mean() {
    let values = draw(DurationEstimate::triangular(2.0, 4.0, 9.0), 1);
    assert!(values.iter().all(|v| (2.0..=9.0).contains(v)));
    assert!((mean(&values) - 5.0).abs() < 0.1);
}

#[test]
fn degenerate_triangular_returns_the_single_point() {
    let mut s = sampler(2);
    for _ in 0..100 {
        assert_eq!(s.sample_duration(&DurationEstimate::fixed(3.5)), 3.5);
    }
    assert_eq!(s.fallback_count(), 0);
}

#[test]
fn pert_uses_weighted_mean() {
    let values = draw(DurationEstimate::pert(0.0, 2.0, 10.0), 3);
    assert!(values.iter().all(|v| (0.0..=10.0).contains(v)));
    // (0 + 4 * 2 + 10) / 6
    assert!((mean(&values) - 3.0).abs() < 0.1);
}

#[test]
fn pert_gamma_shifts_weight_toward_likely() {
    let (a4, b4) = pert_shape(0.0, 2.0, 10.0, 4.0).unwrap();
    let (a8, b8) = pert_shape(0.0, 2.0, 10.0, 8.0).unwrap();
    assert!(a8 + b8 > a4 + b4);

    let estimate = DurationEstimate::Pert {
        min: 0.0,
        likely: 2.0,
        max: 10.0,
        gamma: 8.0,
    };
    // (0 + 8 * 2 + 10) / 10
    assert!((mean(&draw(estimate, 4)) - 2.6).abs() < 0.1);
}

#[test]
fn pert_out_of_order_estimates_fall_back_to_likely() {
    let mut s = sampler(5);
    assert_eq!(s.pert(5.0, 12.0, 10.0, 4.0), 12.0);
    assert_eq!(s.fallback_count(), 1);
}

#[test]
fn normal_matches_requested_moments() {
    let values = draw(DurationEstimate::normal(10.0, 2.0), 6);
    let m = mean(&values);
    let sd = (values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64).sqrt();
    assert!((m - 10.0).abs() < 0.1);
    assert!((sd - 2.0).abs() < 0.1);
}

#[test]
fn negative_spread_falls_back_to_nominal() {
    let mut s = sampler(7);
    assert_eq!(s.normal(4.0, -1.0), 4.0);
    assert_eq!(s.log_normal(0.0, -1.0), 1.0);
    assert_eq!(s.fallback_count(), 2);
}

#[test]
fn log_normal_is_positive_with_expected_median() {
    let mut values = draw(DurationEstimate::log_normal(1.0, 0.25), 8);
    assert!(values.iter().all(|v| *v > 0.0));
    values.sort_by(f64::total_cmp);
    let median = values[SAMPLES / 2];
    assert!((median - 1.0f64.exp()).abs() < 0.05);
}

#[test]
fn costs_sample_triangular() {
    let mut s = sampler(9);
    let cost = CostEstimate::new(100.0, 150.0, 300.0);
    let values: Vec<f64> = (0..SAMPLES).map(|_| s.sample_cost(&cost)).collect();
    assert!(values.iter().all(|v| (100.0..=300.0).contains(v)));
    assert!((mean(&values) - 550.0 / 3.0).abs() < 2.0);
    assert_eq!(s.sample_cost(&CostEstimate::default()), 0.0);
}

#[test]
fn same_seed_gives_same_stream() {
    let estimate = DurationEstimate::pert(1.0, 3.0, 8.0);
    assert_eq!(draw(estimate, 42), draw(estimate, 42));
    assert_ne!(draw(estimate, 42), draw(estimate, 43));
}
