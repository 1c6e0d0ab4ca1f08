use crate::statistics::{CurvePoint, HistogramBin, PercentileValue};
use crate::task::TaskId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One Monte Carlo trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationRun {
    pub total_duration: f64,
    pub total_cost: f64,
    pub critical_path_tasks: Vec<TaskId>,
}

/// Early start/finish of one task, one entry per trial.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TaskTimingSamples {
    pub starts: Vec<f64>,
    pub finishes: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskTimingPercentiles {
    pub task_id: TaskId,
    pub start: Vec<PercentileValue>,
    pub finish: Vec<PercentileValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSensitivity {
    pub task_id: TaskId,
    pub name: String,
    pub mean_duration: f64,
    pub mean_cost: f64,
    /// Pearson correlation of the task's duration with the project duration.
    pub duration_sensitivity: f64,
    /// Pearson correlation of the task's cost with the project cost.
    pub cost_sensitivity: f64,
    /// Fraction of trials in which the task was critical.
    pub criticality_index: f64,
    /// Criticality index times duration sensitivity.
    pub cruciality: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub valid_runs: usize,
    pub mean_duration: f64,
    pub std_dev_duration: f64,
    pub min_duration: f64,
    pub max_duration: f64,
    pub mean_cost: f64,
    pub std_dev_cost: f64,
    pub min_cost: f64,
    pub max_cost: f64,
    pub duration_percentiles: Vec<PercentileValue>,
    pub cost_percentiles: Vec<PercentileValue>,
    pub duration_histogram: Vec<HistogramBin>,
    pub cost_histogram: Vec<HistogramBin>,
    pub duration_s_curve: Vec<CurvePoint>,
    pub cost_s_curve: Vec<CurvePoint>,
    pub duration_cost_correlation: f64,
    /// Coefficient of variation of the project duration.
    pub schedule_sensitivity_index: f64,
    /// In input task order.
    pub tasks: Vec<TaskSensitivity>,
}

impl Analysis {
    pub fn task(&self, task_id: TaskId) -> Option<&TaskSensitivity> {
        self.tasks.iter().find(|t| t.task_id == task_id)
    }

    pub fn duration_percentile(&self, percentile: f64) -> Option<f64> {
        find_percentile(&self.duration_percentiles, percentile)
    }

    pub fn cost_percentile(&self, percentile: f64) -> Option<f64> {
        find_percentile(&self.cost_percentiles, percentile)
    }
}

fn find_percentile(values: &[PercentileValue], percentile: f64) -> Option<f64> {
    values
        .iter()
        .find(|pv| pv.percentile == percentile)
        .map(|pv| pv.value)
}

/// Calendar date by which the project finishes at a given confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinishDateForecast {
    pub percentile: f64,
    pub duration: f64,
    /// `None` when the date falls outside the supported calendar range.
    pub finish_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    /// Seed that reproduces this batch.
    pub seed: u64,
    pub requested_runs: usize,
    pub parameter_fallbacks: usize,
    pub simulation_runs: Vec<SimulationRun>,
    pub analysis: Analysis,
    pub all_task_timings: BTreeMap<TaskId, TaskTimingSamples>,
    pub task_timing_percentiles: Vec<TaskTimingPercentiles>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub finish_date_forecast: Vec<FinishDateForecast>,
}

impl SimulationReport {
    pub fn valid_runs(&self) -> usize {
        self.analysis.valid_runs
    }

    pub fn to_cli_summary(&self) -> String {
        let a = &self.analysis;
        let mut parts = vec![
            format!("runs={}", a.valid_runs),
            format!("seed={}", self.seed),
            format!("duration={:.2}±{:.2}", a.mean_duration, a.std_dev_duration),
            format!("cost={:.2}±{:.2}", a.mean_cost, a.std_dev_cost),
            format!("ssi={:.3}", a.schedule_sensitivity_index),
        ];
        for pv in &a.duration_percentiles {
            parts.push(format!("P{}={:.2}", pv.percentile, pv.value));
        }
        if let Some(most_critical) = a
            .tasks
            .iter()
            .max_by(|x, y| x.criticality_index.total_cmp(&y.criticality_index))
        {
            parts.push(format!(
                "most_critical={}({:.0}%)",
                most_critical.task_id,
                most_critical.criticality_index * 100.0
            ));
        }
        if self.parameter_fallbacks > 0 {
            parts.push(format!("fallbacks={}", self.parameter_fallbacks));
        }
        parts.join(", ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyReason {
    NoTasks,
    NoValidRuns,
}

/// Either a complete report or an explicit "nothing to analyse" outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SimulationOutcome {
    Completed(Box<SimulationReport>),
    Empty { reason: EmptyReason },
}

impl SimulationOutcome {
    pub fn report_mut(&mut self) -> Option<&mut SimulationReport> {
        match self {
            SimulationOutcome::Completed(report) => Some(report),
            SimulationOutcome::Empty { .. } => None,
        }
    }
}
