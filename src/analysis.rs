//! Aggregation of a completed batch into the report handed to consumers.

use crate::config::SimulationConfig;
use crate::monte_carlo::TrialSamples;
use crate::report::{
    Analysis, SimulationReport, SimulationRun, TaskSensitivity, TaskTimingPercentiles,
    TaskTimingSamples,
};
use crate::statistics::{self, histogram, mean, pearson_correlation, percentiles, s_curve, std_dev};
use crate::task::Task;
use std::collections::BTreeMap;

pub fn assemble(
    tasks: &[Task],
    samples: &TrialSamples,
    config: &SimulationConfig,
    seed: u64,
    parameter_fallbacks: usize,
) -> SimulationReport {
    let simulation_runs = simulation_runs(tasks, samples);
    let analysis = analyze(tasks, samples, config);

    let mut all_task_timings = BTreeMap::new();
    let mut task_timing_percentiles = Vec::with_capacity(tasks.len());
    for (index, task) in tasks.iter().enumerate() {
        let starts = samples.task_column(&samples.starts, index);
        let finishes = samples.task_column(&samples.finishes, index);
        task_timing_percentiles.push(TaskTimingPercentiles {
            task_id: task.id,
            start: percentiles(&starts, &config.percentiles),
            finish: percentiles(&finishes, &config.percentiles),
        });
        all_task_timings.insert(task.id, TaskTimingSamples { starts, finishes });
    }

    SimulationReport {
        seed,
        requested_runs: config.num_runs,
        parameter_fallbacks,
        simulation_runs,
        analysis,
        all_task_timings,
        task_timing_percentiles,
        finish_date_forecast: Vec::new(),
    }
}

fn simulation_runs(tasks: &[Task], samples: &TrialSamples) -> Vec<SimulationRun> {
    (0..samples.runs())
        .map(|trial| SimulationRun {
            total_duration: samples.total_durations[trial],
            total_cost: samples.total_costs[trial],
            critical_path_tasks: samples
                .trial_row(&samples.critical, trial)
                .iter()
                .zip(tasks)
                .filter(|(critical, _)| **critical)
                .map(|(_, task)| task.id)
                .collect(),
        })
        .collect()
}

pub fn analyze(tasks: &[Task], samples: &TrialSamples, config: &SimulationConfig) -> Analysis {
    let valid_runs = samples.runs();
    let durations = &samples.total_durations;
    let costs = &samples.total_costs;

    let mean_duration = mean(durations);
    let std_dev_duration = std_dev(durations);
    let schedule_sensitivity_index = if mean_duration == 0.0 {
        0.0
    } else {
        std_dev_duration / mean_duration
    };

    let task_sensitivities = tasks
        .iter()
        .enumerate()
        .map(|(index, task)| {
            let task_durations = samples.task_column(&samples.durations, index);
            let task_costs = samples.task_column(&samples.costs, index);
            let duration_sensitivity = pearson_correlation(&task_durations, durations);
            let criticality_index = if valid_runs == 0 {
                0.0
            } else {
                samples.critical_count(index) as f64 / valid_runs as f64
            };
            TaskSensitivity {
                task_id: task.id,
                name: task.name.clone(),
                mean_duration: mean(&task_durations),
                mean_cost: mean(&task_costs),
                duration_sensitivity,
                cost_sensitivity: pearson_correlation(&task_costs, costs),
                criticality_index,
                cruciality: criticality_index * duration_sensitivity,
            }
        })
        .collect();

    let (min_duration, max_duration) = bounds(durations);
    let (min_cost, max_cost) = bounds(costs);

    Analysis {
        valid_runs,
        mean_duration,
        std_dev_duration,
        min_duration,
        max_duration,
        mean_cost: mean(costs),
        std_dev_cost: std_dev(costs),
        min_cost,
        max_cost,
        duration_percentiles: percentiles(durations, &config.percentiles),
        cost_percentiles: percentiles(costs, &config.percentiles),
        duration_histogram: histogram(durations, config.histogram_bins),
        cost_histogram: histogram(costs, config.histogram_bins),
        duration_s_curve: s_curve(durations),
        cost_s_curve: s_curve(costs),
        duration_cost_correlation: pearson_correlation(durations, costs),
        schedule_sensitivity_index,
        tasks: task_sensitivities,
    }
}

fn bounds(data: &[f64]) -> (f64, f64) {
    let sorted = statistics::sorted(data);
    match (sorted.first(), sorted.last()) {
        (Some(&lo), Some(&hi)) => (lo, hi),
        _ => (0.0, 0.0),
    }
}
