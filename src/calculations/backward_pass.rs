use super::TimeWindow;
use crate::graph::ScheduleDag;

/// Latest start/finish for every node, anchored at the project finish.
pub struct BackwardPass<'a> {
    dag: &'a ScheduleDag,
    durations: &'a [f64],
}

impl<'a> BackwardPass<'a> {
    pub fn new(dag: &'a ScheduleDag, durations: &'a [f64]) -> Self {
        Self { dag, durations }
    }

    /// Returns late windows indexed by node index.
    pub fn execute(&self, project_finish: f64) -> Vec<TimeWindow> {
        let mut late = vec![TimeWindow::new(project_finish, project_finish); self.dag.node_count()];

        // Reverse topological order
        for &node_ix in self.dag.topological_order().iter().rev() {
            if node_ix == self.dag.end {
                late[node_ix.index()] = TimeWindow::new(project_finish, project_finish);
                continue;
            }

            let duration = self.dag.node_duration(node_ix, self.durations);
            let latest_finish = self
                .dag
                .successors(node_ix)
                .map(|(succ_ix, link)| {
                    link.kind
                        .required_finish(late[succ_ix.index()], link.lag, duration)
                })
                .reduce(f64::min)
                .unwrap_or(project_finish);

            late[node_ix.index()] = TimeWindow::new(latest_finish - duration, latest_finish);
        }

        late
    }
}
