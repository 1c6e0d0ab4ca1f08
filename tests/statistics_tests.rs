use schedule_risk::statistics::{
    histogram, mean, pearson_correlation, percentile, percentiles, s_curve, std_dev,
};

fn one_to_ten() -> Vec<f64> {
    (1..=10).map(f64::from).collect()
}

#[test]
fn percentile_interpolates_between_ranks() {
    let data = one_to_ten();
    assert_eq!(percentile(&data, 50.0), Some(5.5));
    assert_eq!(percentile(&data, 0.0), Some(1.0));
    assert_eq!(percentile(&data, 100.0), Some(10.0));
    assert!((percentile(&data, 90.0).unwrap() - 9.1).abs() < 1e-12);
    assert_eq!(percentile(&[], 50.0), None);
}

#[test]
fn percentile_ignores_input_order() {
    let data = vec![7.0, 1.0, 4.0, 10.0, 2.0];
    assert_eq!(percentile(&data, 50.0), Some(4.0));

    let values = percentiles(&data, &[25.0, 75.0]);
    assert_eq!(values.len(), 2);
    assert_eq!(values[0].value, 2.0);
    assert_eq!(values[1].value, 7.0);
}

#[test]
fn population_std_dev() {
    let data = vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
    assert_eq!(mean(&data), 5.0);
    assert_eq!(std_dev(&data), 2.0);
    assert_eq!(std_dev(&[]), 0.0);
}

#[test]
fn identical_values_make_one_bin() {
    let bins = histogram(&[5.0, 5.0, 5.0], 20);
    assert_eq!(bins.len(), 1);
    assert_eq!(bins[0].count, 3);
    assert_eq!(bins[0].label(), "5.0");
}

#[test]
fn histogram_counts_every_sample() {
    let data = one_to_ten();
    let bins = histogram(&data, 20);
    assert_eq!(bins.len(), 20);
    assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), data.len());
    assert_eq!(bins[0].lower, 1.0);
    assert_eq!(bins[19].upper, 10.0);
    assert_eq!(bins[19].count, 1);
}

#[test]
fn pearson_edge_cases() {
    let x = one_to_ten();
    let neg: Vec<f64> = x.iter().map(|v| -v).collect();
    let constant = vec![3.0; 10];

    assert!((pearson_correlation(&x, &x) - 1.0).abs() < 1e-12);
    assert!((pearson_correlation(&x, &neg) + 1.0).abs() < 1e-12);
    assert_eq!(pearson_correlation(&x, &constant), 0.0);
    assert_eq!(pearson_correlation(&[1.0], &[2.0]), 0.0);
}

#[test]
fn s_curve_reaches_certainty() {
    let curve = s_curve(&[3.0, 1.0, 2.0, 4.0]);
    let values: Vec<f64> = curve.iter().map(|p| p.value).collect();
    assert_eq!(values, vec![1.0, 2.0, 3.0, 4.0]);
    assert_eq!(curve[0].cumulative_probability, 0.25);
    assert_eq!(curve[3].cumulative_probability, 1.0);
}
