pub mod analysis;
pub mod calculations;
pub mod calendar;
pub mod config;
pub mod distribution;
pub mod error;
pub mod graph;
#[cfg(feature = "http_api")]
pub mod http_api;
pub mod metadata;
pub mod monte_carlo;
pub mod persistence;
pub mod project;
pub mod report;
pub mod statistics;
pub mod task;
pub mod task_validation;

pub use calculations::{CpmSchedule, TaskTiming};
pub use calendar::{WorkCalendar, WorkCalendarConfig};
pub use config::SimulationConfig;
pub use distribution::Sampler;
pub use error::{ScheduleError, ScheduleResult};
pub use graph::ScheduleDag;
pub use metadata::ProjectMetadata;
pub use monte_carlo::{CancellationToken, MonteCarloEngine, simulate};
pub use project::Project;
pub use report::{Analysis, EmptyReason, SimulationOutcome, SimulationReport, TaskSensitivity};
pub use task::{
    CostEstimate, Dependency, DependencyType, DistributionType, DurationEstimate, PredecessorRef,
    Task, TaskId,
};
