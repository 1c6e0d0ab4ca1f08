use crate::calculations::CpmSchedule;
use crate::calendar::{WorkCalendar, WorkCalendarConfig};
use crate::config::SimulationConfig;
use crate::error::ScheduleResult;
use crate::graph::ScheduleDag;
use crate::metadata::ProjectMetadata;
use crate::monte_carlo::{CancellationToken, MonteCarloEngine};
use crate::report::{FinishDateForecast, SimulationOutcome};
use crate::task::{PredecessorRef, Task, TaskId};
use crate::task_validation;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Caller-owned task set plus the project context used to date results.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Project {
    #[serde(default)]
    pub metadata: ProjectMetadata,
    #[serde(default)]
    pub calendar: WorkCalendarConfig,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl Project {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        Self {
            tasks,
            ..Self::default()
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn find_task(&self, task_id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    pub fn find_task_mut(&mut self, task_id: TaskId) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == task_id)
    }

    pub fn next_id(&self) -> TaskId {
        self.tasks.iter().map(|t| t.id).max().map_or(1, |m| m + 1)
    }

    /// Inserts or replaces by id, keeping the original position on replace.
    /// Returns `true` when the task was new.
    pub fn upsert_task(&mut self, task: Task) -> bool {
        match self.find_task_mut(task.id) {
            Some(existing) => {
                *existing = task;
                false
            }
            None => {
                self.tasks.push(task);
                true
            }
        }
    }

    /// Removes a task and every dependency that names it.
    pub fn delete_task(&mut self, task_id: TaskId) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != task_id);
        if self.tasks.len() == before {
            return false;
        }
        for task in &mut self.tasks {
            task.dependencies
                .retain(|dep| dep.predecessor != PredecessorRef::Task(task_id));
        }
        true
    }

    pub fn set_calendar(&mut self, config: WorkCalendarConfig) -> ScheduleResult<()> {
        WorkCalendar::from_config(&config)?;
        self.calendar = config;
        Ok(())
    }

    pub fn validate(&self) -> ScheduleResult<()> {
        task_validation::validate_task_collection(&self.tasks)?;
        WorkCalendar::from_config(&self.calendar)?;
        ScheduleDag::build(&self.tasks).map(|_| ())
    }

    /// Deterministic CPM over nominal durations.
    pub fn baseline_schedule(&self) -> ScheduleResult<CpmSchedule> {
        task_validation::validate_task_collection(&self.tasks)?;
        let dag = ScheduleDag::build(&self.tasks)?;
        let durations: Vec<f64> = self.tasks.iter().map(|t| t.duration.nominal()).collect();
        Ok(dag.schedule(&durations))
    }

    /// `Ok(None)` when the finish lies beyond the representable date range.
    pub fn finish_date(&self, duration: f64) -> ScheduleResult<Option<NaiveDate>> {
        let calendar = WorkCalendar::from_config(&self.calendar)?;
        Ok(calendar.finish_date(self.metadata.project_start_date, duration))
    }

    pub fn simulate(&self, config: &SimulationConfig) -> ScheduleResult<SimulationOutcome> {
        self.simulate_with_cancel(config, &CancellationToken::new())
    }

    pub fn simulate_with_cancel(
        &self,
        config: &SimulationConfig,
        cancel: &CancellationToken,
    ) -> ScheduleResult<SimulationOutcome> {
        let calendar = WorkCalendar::from_config(&self.calendar)?;
        let mut outcome = MonteCarloEngine::new(&self.tasks, config)?.run(cancel)?;

        if let Some(report) = outcome.report_mut() {
            let start = self.metadata.project_start_date;
            report.finish_date_forecast = report
                .analysis
                .duration_percentiles
                .iter()
                .map(|pv| {
                    let finish_date = calendar.finish_date(start, pv.value);
                    if finish_date.is_none() {
                        warn!(
                            percentile = pv.percentile,
                            duration = pv.value,
                            "finish date outside calendar range"
                        );
                    }
                    FinishDateForecast {
                        percentile: pv.percentile,
                        duration: pv.value,
                        finish_date,
                    }
                })
                .collect();
            debug!(
                forecasts = report.finish_date_forecast.len(),
                "attached finish date forecast"
            );
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{Dependency, DurationEstimate};

    #[test]
    fn upsert_task_inserts_and_updates() {
        let mut p = Project::new();
        assert!(p.upsert_task(Task::new(1, "Task A", DurationEstimate::fixed(5.0))));
        assert!(p.upsert_task(Task::new(2, "Task B", DurationEstimate::fixed(1.0))));
        assert!(!p.upsert_task(Task::new(1, "Task A1", DurationEstimate::fixed(7.0))));

        assert_eq!(p.tasks().len(), 2);
        assert_eq!(p.tasks()[0].name, "Task A1");
        assert_eq!(p.next_id(), 3);
    }

    #[test]
    fn delete_task_cleans_dependencies() {
        let mut p = Project::with_tasks(vec![
            Task::new(1, "A", DurationEstimate::fixed(1.0)),
            Task::new(2, "B", DurationEstimate::fixed(1.0))
                .after(1)
                .with_dependency(Dependency::start()),
        ]);
        assert!(p.delete_task(1));
        assert!(!p.delete_task(1));
        assert_eq!(p.tasks()[0].dependencies, vec![Dependency::start()]);
    }

    #[test]
    fn baseline_uses_nominal_durations() {
        let p = Project::with_tasks(vec![
            Task::new(1, "A", DurationEstimate::triangular(1.0, 4.0, 9.0)),
            Task::new(2, "B", DurationEstimate::normal(6.0, 2.0)).after(1),
        ]);
        let schedule = p.baseline_schedule().unwrap();
        assert_eq!(schedule.total_duration, 10.0);
        assert_eq!(schedule.critical_path_tasks, vec![1, 2]);
    }
}
