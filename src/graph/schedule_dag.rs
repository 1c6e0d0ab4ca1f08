use crate::error::{ScheduleError, ScheduleResult};
use crate::task::{DependencyType, PredecessorRef, Task, TaskId};
use petgraph::Direction;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::HashMap;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleNode {
    Start,
    /// `index` is the task's position in the input slice.
    Task { id: TaskId, index: usize },
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Link {
    pub kind: DependencyType,
    pub lag: f64,
}

/// Dependency graph of a task set, bracketed by START and END nodes.
///
/// The shape never depends on sampled durations, so the graph is validated
/// once and its topological order is reused for every CPM pass.
#[derive(Debug, Clone)]
pub struct ScheduleDag {
    pub graph: DiGraph<ScheduleNode, Link>,
    pub start: NodeIndex,
    pub end: NodeIndex,
    task_nodes: Vec<NodeIndex>,
    task_ids: Vec<TaskId>,
    order: Vec<NodeIndex>,
}

impl ScheduleDag {
    pub fn build(tasks: &[Task]) -> ScheduleResult<Self> {
        let mut graph: DiGraph<ScheduleNode, Link> =
            DiGraph::with_capacity(tasks.len() + 2, tasks.len() * 2);
        let mut id_to_index: HashMap<TaskId, usize> = HashMap::with_capacity(tasks.len());
        let mut task_nodes = Vec::with_capacity(tasks.len());

        let start = graph.add_node(ScheduleNode::Start);
        for (index, task) in tasks.iter().enumerate() {
            if id_to_index.insert(task.id, index).is_some() {
                return Err(ScheduleError::InvalidTask(format!(
                    "duplicate task id {}",
                    task.id
                )));
            }
            task_nodes.push(graph.add_node(ScheduleNode::Task { id: task.id, index }));
        }
        let end = graph.add_node(ScheduleNode::End);

        // Edges: pred -> task, START -> task when nothing real precedes it
        for (index, task) in tasks.iter().enumerate() {
            let node_ix = task_nodes[index];
            let mut linked = false;
            for dep in &task.dependencies {
                let PredecessorRef::Task(pred_id) = dep.predecessor else {
                    continue;
                };
                if pred_id == task.id {
                    return Err(ScheduleError::StructuralCycle {
                        task_id: Some(task.id),
                    });
                }
                match id_to_index.get(&pred_id) {
                    Some(&pred_index) => {
                        graph.add_edge(
                            task_nodes[pred_index],
                            node_ix,
                            Link {
                                kind: dep.kind,
                                lag: dep.lag,
                            },
                        );
                        linked = true;
                    }
                    None => {
                        warn!(
                            task = task.id,
                            predecessor = pred_id,
                            "ignoring unknown predecessor"
                        );
                    }
                }
            }
            if !linked {
                graph.add_edge(start, node_ix, Link::default());
            }
        }

        for &node_ix in &task_nodes {
            let has_successor = graph
                .neighbors_directed(node_ix, Direction::Outgoing)
                .next()
                .is_some();
            if !has_successor {
                graph.add_edge(node_ix, end, Link::default());
            }
        }

        let order = toposort(&graph, None).map_err(|cycle| {
            let task_id = match graph[cycle.node_id()] {
                ScheduleNode::Task { id, .. } => Some(id),
                _ => None,
            };
            ScheduleError::StructuralCycle { task_id }
        })?;

        debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "schedule graph validated"
        );

        Ok(Self {
            graph,
            start,
            end,
            task_nodes,
            task_ids: tasks.iter().map(|task| task.id).collect(),
            order,
        })
    }

    pub fn task_count(&self) -> usize {
        self.task_nodes.len()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn topological_order(&self) -> &[NodeIndex] {
        &self.order
    }

    pub fn task_node(&self, task_index: usize) -> NodeIndex {
        self.task_nodes[task_index]
    }

    pub fn task_id(&self, task_index: usize) -> TaskId {
        self.task_ids[task_index]
    }

    /// Duration of a node for one trial; START and END take no time.
    pub fn node_duration(&self, node_ix: NodeIndex, durations: &[f64]) -> f64 {
        match self.graph[node_ix] {
            ScheduleNode::Task { index, .. } => durations[index],
            ScheduleNode::Start | ScheduleNode::End => 0.0,
        }
    }

    pub fn predecessors(&self, node_ix: NodeIndex) -> impl Iterator<Item = (NodeIndex, Link)> + '_ {
        self.graph
            .edges_directed(node_ix, Direction::Incoming)
            .map(|edge| (edge.source(), *edge.weight()))
    }

    pub fn successors(&self, node_ix: NodeIndex) -> impl Iterator<Item = (NodeIndex, Link)> + '_ {
        self.graph
            .edges_directed(node_ix, Direction::Outgoing)
            .map(|edge| (edge.target(), *edge.weight()))
    }
}
