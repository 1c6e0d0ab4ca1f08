pub mod backward_pass;
pub mod forward_pass;

use crate::graph::{ScheduleDag, ScheduleNode};
use crate::task::{DependencyType, TaskId};
use serde::{Deserialize, Serialize};

use backward_pass::BackwardPass;
use forward_pass::ForwardPass;

/// Slack below this is treated as zero.
pub const CRITICAL_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: f64,
    pub finish: f64,
}

impl TimeWindow {
    pub fn new(start: f64, finish: f64) -> Self {
        Self { start, finish }
    }
}

impl DependencyType {
    /// Earliest start a successor of `duration` may take given its
    /// predecessor's early window.
    pub fn required_start(self, predecessor: TimeWindow, lag: f64, duration: f64) -> f64 {
        match self {
            DependencyType::FinishToStart => predecessor.finish + lag,
            DependencyType::StartToStart => predecessor.start + lag,
            DependencyType::FinishToFinish => predecessor.finish + lag - duration,
            DependencyType::StartToFinish => predecessor.start + lag - duration,
        }
    }

    /// Latest finish a predecessor of `duration` may take given its
    /// successor's late window.
    pub fn required_finish(self, successor: TimeWindow, lag: f64, duration: f64) -> f64 {
        match self {
            DependencyType::FinishToStart => successor.start - lag,
            DependencyType::StartToStart => successor.start - lag + duration,
            DependencyType::FinishToFinish => successor.finish - lag,
            DependencyType::StartToFinish => successor.finish - lag + duration,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeTiming {
    pub earliest_start: f64,
    pub earliest_finish: f64,
    pub latest_start: f64,
    pub latest_finish: f64,
}

impl NodeTiming {
    fn from_windows(early: TimeWindow, late: TimeWindow) -> Self {
        Self {
            earliest_start: early.start,
            earliest_finish: early.finish,
            latest_start: late.start,
            latest_finish: late.finish,
        }
    }

    pub fn slack(&self) -> f64 {
        self.latest_start - self.earliest_start
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskTiming {
    pub task_id: TaskId,
    pub earliest_start: f64,
    pub earliest_finish: f64,
    pub latest_start: f64,
    pub latest_finish: f64,
    pub slack: f64,
    pub is_critical: bool,
}

/// Result of one deterministic CPM pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CpmSchedule {
    pub total_duration: f64,
    pub start: NodeTiming,
    pub end: NodeTiming,
    /// In input task order.
    pub task_timings: Vec<TaskTiming>,
    /// Critical task ids in topological order.
    pub critical_path_tasks: Vec<TaskId>,
}

impl CpmSchedule {
    pub fn timing(&self, task_id: TaskId) -> Option<&TaskTiming> {
        self.task_timings.iter().find(|t| t.task_id == task_id)
    }

    pub fn is_critical(&self, task_id: TaskId) -> bool {
        self.timing(task_id).is_some_and(|t| t.is_critical)
    }
}

/// A task is critical when its slack is zero, or when it finishes with the
/// project. The second test absorbs drift accumulated along long chains.
pub fn is_critical(timing: &NodeTiming, total_duration: f64) -> bool {
    timing.slack().abs() < CRITICAL_TOLERANCE
        || (timing.earliest_finish - total_duration).abs() < CRITICAL_TOLERANCE
}

impl ScheduleDag {
    /// Runs the forward and backward passes for one set of task durations,
    /// indexed like the task slice the graph was built from.
    pub fn schedule(&self, durations: &[f64]) -> CpmSchedule {
        debug_assert_eq!(durations.len(), self.task_count());

        let early = ForwardPass::new(self, durations).execute();
        let total_duration = early[self.end.index()].finish;
        let late = BackwardPass::new(self, durations).execute(total_duration);

        let node_timing = |ix: petgraph::graph::NodeIndex| {
            NodeTiming::from_windows(early[ix.index()], late[ix.index()])
        };

        let task_timings: Vec<TaskTiming> = (0..self.task_count())
            .map(|task_index| {
                let node_ix = self.task_node(task_index);
                let timing = node_timing(node_ix);
                TaskTiming {
                    task_id: self.task_id(task_index),
                    earliest_start: timing.earliest_start,
                    earliest_finish: timing.earliest_finish,
                    latest_start: timing.latest_start,
                    latest_finish: timing.latest_finish,
                    slack: timing.slack(),
                    is_critical: is_critical(&timing, total_duration),
                }
            })
            .collect();

        let critical_path_tasks = self
            .topological_order()
            .iter()
            .filter_map(|&ix| match self.graph[ix] {
                ScheduleNode::Task { index, id } if task_timings[index].is_critical => Some(id),
                _ => None,
            })
            .collect();

        CpmSchedule {
            total_duration,
            start: node_timing(self.start),
            end: node_timing(self.end),
            task_timings,
            critical_path_tasks,
        }
    }
}
