use super::TimeWindow;
use crate::graph::ScheduleDag;

/// Earliest start/finish for every node, in topological order.
pub struct ForwardPass<'a> {
    dag: &'a ScheduleDag,
    durations: &'a [f64],
}

impl<'a> ForwardPass<'a> {
    pub fn new(dag: &'a ScheduleDag, durations: &'a [f64]) -> Self {
        Self { dag, durations }
    }

    /// Returns early windows indexed by node index.
    pub fn execute(&self) -> Vec<TimeWindow> {
        let mut early = vec![TimeWindow::default(); self.dag.node_count()];

        for &node_ix in self.dag.topological_order() {
            if node_ix == self.dag.start {
                early[node_ix.index()] = TimeWindow::new(0.0, 0.0);
                continue;
            }

            let duration = self.dag.node_duration(node_ix, self.durations);
            let earliest_start = self
                .dag
                .predecessors(node_ix)
                .map(|(pred_ix, link)| {
                    link.kind
                        .required_start(early[pred_ix.index()], link.lag, duration)
                })
                .reduce(f64::max)
                .unwrap_or(0.0);

            early[node_ix.index()] = TimeWindow::new(earliest_start, earliest_start + duration);
        }

        early
    }
}
