use crate::task::TaskId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScheduleError {
    /// The dependency graph is not acyclic. Fatal for the whole batch.
    #[error("{}", cycle_message(.task_id))]
    StructuralCycle { task_id: Option<TaskId> },
    #[error("invalid task data: {0}")]
    InvalidTask(String),
    #[error("invalid simulation config: {0}")]
    InvalidConfig(String),
    #[error("simulation cancelled")]
    Cancelled,
}

fn cycle_message(task_id: &Option<TaskId>) -> String {
    match task_id {
        Some(id) => format!("dependency cycle detected involving task {id}"),
        None => "dependency cycle detected".to_string(),
    }
}

pub type ScheduleResult<T> = Result<T, ScheduleError>;
