use crate::error::ScheduleError;
use crate::task::{PredecessorRef, Task};
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone)]
pub struct TaskValidationError {
    message: String,
}

impl TaskValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for TaskValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for TaskValidationError {}

impl From<TaskValidationError> for ScheduleError {
    fn from(value: TaskValidationError) -> Self {
        ScheduleError::InvalidTask(value.message)
    }
}

/// Rejects values that would poison every trial. Out-of-domain but finite
/// distribution parameters are left for the sampler to recover from.
pub fn validate_task(task: &Task) -> Result<(), TaskValidationError> {
    for (name, value) in task.duration.parameters() {
        if !value.is_finite() {
            return Err(TaskValidationError::new(format!(
                "task {} has non-finite {} duration parameter {name} ({value})",
                task.id,
                task.duration.dist_type()
            )));
        }
    }

    for (name, value) in [
        ("min", task.cost.min),
        ("likely", task.cost.likely),
        ("max", task.cost.max),
    ] {
        if !value.is_finite() {
            return Err(TaskValidationError::new(format!(
                "task {} has non-finite cost {name} ({value})",
                task.id
            )));
        }
    }

    for dep in &task.dependencies {
        if !dep.lag.is_finite() {
            return Err(TaskValidationError::new(format!(
                "task {} has non-finite lag on dependency {}",
                task.id, dep.predecessor
            )));
        }
    }

    Ok(())
}

pub fn validate_task_collection(tasks: &[Task]) -> Result<(), ScheduleError> {
    let mut seen_ids = HashSet::with_capacity(tasks.len());
    for task in tasks {
        if !seen_ids.insert(task.id) {
            return Err(TaskValidationError::new(format!("duplicate task id {}", task.id)).into());
        }
        if task
            .dependencies
            .iter()
            .any(|dep| dep.predecessor == PredecessorRef::Task(task.id))
        {
            return Err(ScheduleError::StructuralCycle {
                task_id: Some(task.id),
            });
        }
        validate_task(task)?;
    }
    Ok(())
}
