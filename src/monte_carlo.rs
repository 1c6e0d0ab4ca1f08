//! Monte Carlo driver: resample every task, rerun CPM, keep the samples.
//!
//! Trials are split into fixed-size chunks. Each chunk draws from its own
//! `StdRng`, seeded from a master generator before any trial runs, so a
//! given seed yields the same report whether chunks run on one thread or on
//! the rayon pool.

use crate::analysis;
use crate::config::SimulationConfig;
use crate::distribution::Sampler;
use crate::error::{ScheduleError, ScheduleResult};
use crate::graph::ScheduleDag;
use crate::report::{EmptyReason, SimulationOutcome};
use crate::task::Task;
use crate::task_validation;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tracing::{debug, info};

pub const TRIALS_PER_CHUNK: usize = 256;

/// Cooperative cancellation flag, checked between trials.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Trial-major sample arena: cell `trial * task_count + task_index`.
#[derive(Debug, Clone)]
pub struct TrialSamples {
    task_count: usize,
    pub durations: Vec<f64>,
    pub costs: Vec<f64>,
    pub starts: Vec<f64>,
    pub finishes: Vec<f64>,
    pub critical: Vec<bool>,
    pub total_durations: Vec<f64>,
    pub total_costs: Vec<f64>,
}

/// Mutable view over a contiguous block of trials.
struct ChunkRows<'a> {
    durations: &'a mut [f64],
    costs: &'a mut [f64],
    starts: &'a mut [f64],
    finishes: &'a mut [f64],
    critical: &'a mut [bool],
    total_durations: &'a mut [f64],
    total_costs: &'a mut [f64],
}

impl TrialSamples {
    pub fn new(runs: usize, task_count: usize) -> Self {
        let cells = runs * task_count;
        Self {
            task_count,
            durations: vec![0.0; cells],
            costs: vec![0.0; cells],
            starts: vec![0.0; cells],
            finishes: vec![0.0; cells],
            critical: vec![false; cells],
            total_durations: vec![0.0; runs],
            total_costs: vec![0.0; runs],
        }
    }

    pub fn runs(&self) -> usize {
        self.total_durations.len()
    }

    pub fn task_count(&self) -> usize {
        self.task_count
    }

    /// All trials' values of one task from a trial-major buffer.
    pub fn task_column<T: Copy>(&self, buffer: &[T], task_index: usize) -> Vec<T> {
        buffer
            .iter()
            .skip(task_index)
            .step_by(self.task_count.max(1))
            .copied()
            .collect()
    }

    pub fn trial_row<'a, T>(&self, buffer: &'a [T], trial: usize) -> &'a [T] {
        let base = trial * self.task_count;
        &buffer[base..base + self.task_count]
    }

    pub fn critical_count(&self, task_index: usize) -> usize {
        self.task_column(&self.critical, task_index)
            .into_iter()
            .filter(|critical| *critical)
            .count()
    }

    fn chunks_mut(&mut self, trials_per_chunk: usize) -> Vec<ChunkRows<'_>> {
        let width = trials_per_chunk * self.task_count;
        let task_cells = self
            .durations
            .chunks_mut(width)
            .zip(self.costs.chunks_mut(width))
            .zip(self.starts.chunks_mut(width))
            .zip(self.finishes.chunks_mut(width))
            .zip(self.critical.chunks_mut(width));
        let totals = self
            .total_durations
            .chunks_mut(trials_per_chunk)
            .zip(self.total_costs.chunks_mut(trials_per_chunk));

        task_cells
            .zip(totals)
            .map(|(task_cells, (total_durations, total_costs))| {
                let ((((durations, costs), starts), finishes), critical) = task_cells;
                ChunkRows {
                    durations,
                    costs,
                    starts,
                    finishes,
                    critical,
                    total_durations,
                    total_costs,
                }
            })
            .collect()
    }
}

pub struct MonteCarloEngine<'a> {
    tasks: &'a [Task],
    config: &'a SimulationConfig,
    dag: ScheduleDag,
}

impl<'a> MonteCarloEngine<'a> {
    /// Validates config and tasks and checks the graph for cycles once, before
    /// any trial runs.
    pub fn new(tasks: &'a [Task], config: &'a SimulationConfig) -> ScheduleResult<Self> {
        config.validate()?;
        task_validation::validate_task_collection(tasks)?;
        let dag = ScheduleDag::build(tasks)?;
        Ok(Self { tasks, config, dag })
    }

    pub fn dag(&self) -> &ScheduleDag {
        &self.dag
    }

    pub fn run(&self, cancel: &CancellationToken) -> ScheduleResult<SimulationOutcome> {
        if self.tasks.is_empty() {
            info!("no tasks to simulate");
            return Ok(SimulationOutcome::Empty {
                reason: EmptyReason::NoTasks,
            });
        }
        let runs = self.config.num_runs;
        if runs == 0 {
            info!("simulation requested zero runs");
            return Ok(SimulationOutcome::Empty {
                reason: EmptyReason::NoValidRuns,
            });
        }

        let seed = self.config.seed.unwrap_or_else(rand::random);
        let started = Instant::now();
        info!(
            runs,
            tasks = self.tasks.len(),
            seed,
            parallel = self.config.parallel,
            "starting monte carlo batch"
        );

        let mut master = StdRng::seed_from_u64(seed);
        let chunk_count = runs.div_ceil(TRIALS_PER_CHUNK);
        let chunk_seeds: Vec<u64> = (0..chunk_count).map(|_| master.random()).collect();

        let mut samples = TrialSamples::new(runs, self.tasks.len());
        let chunks = samples.chunks_mut(TRIALS_PER_CHUNK);
        let run_chunk = |(chunk_index, rows): (usize, ChunkRows<'_>)| {
            self.run_chunk(chunk_index, chunk_seeds[chunk_index], rows, cancel)
        };

        let fallback_counts: Vec<usize> = if self.config.parallel {
            chunks
                .into_par_iter()
                .enumerate()
                .map(run_chunk)
                .collect::<ScheduleResult<Vec<_>>>()?
        } else {
            chunks
                .into_iter()
                .enumerate()
                .map(run_chunk)
                .collect::<ScheduleResult<Vec<_>>>()?
        };
        let parameter_fallbacks = fallback_counts.iter().sum();

        let report =
            analysis::assemble(self.tasks, &samples, self.config, seed, parameter_fallbacks);
        info!(
            runs = report.valid_runs(),
            mean_duration = report.analysis.mean_duration,
            parameter_fallbacks,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "monte carlo batch complete"
        );
        Ok(SimulationOutcome::Completed(Box::new(report)))
    }

    /// Fills one chunk of trials; returns the sampler's fallback count.
    fn run_chunk(
        &self,
        chunk_index: usize,
        seed: u64,
        rows: ChunkRows<'_>,
        cancel: &CancellationToken,
    ) -> ScheduleResult<usize> {
        let mut sampler = Sampler::new(StdRng::seed_from_u64(seed));
        let task_count = self.tasks.len();
        let trials = rows.total_durations.len();

        for trial in 0..trials {
            if cancel.is_cancelled() {
                debug!(chunk = chunk_index, trial, "cancellation observed");
                return Err(ScheduleError::Cancelled);
            }
            let cells = trial * task_count..(trial + 1) * task_count;

            let durations = &mut rows.durations[cells.clone()];
            for (slot, task) in durations.iter_mut().zip(self.tasks) {
                *slot = sampler.sample_duration(&task.duration);
            }
            let costs = &mut rows.costs[cells.clone()];
            for (slot, task) in costs.iter_mut().zip(self.tasks) {
                *slot = sampler.sample_cost(&task.cost);
            }

            let schedule = self.dag.schedule(&rows.durations[cells.clone()]);
            let base = cells.start;
            for (offset, timing) in schedule.task_timings.iter().enumerate() {
                rows.starts[base + offset] = timing.earliest_start;
                rows.finishes[base + offset] = timing.earliest_finish;
                rows.critical[base + offset] = timing.is_critical;
            }
            rows.total_durations[trial] = schedule.total_duration;
            rows.total_costs[trial] = rows.costs[cells].iter().sum();
        }

        debug!(chunk = chunk_index, trials, "chunk complete");
        Ok(sampler.fallback_count())
    }
}

/// Runs a batch without external cancellation.
pub fn simulate(tasks: &[Task], config: &SimulationConfig) -> ScheduleResult<SimulationOutcome> {
    MonteCarloEngine::new(tasks, config)?.run(&CancellationToken::new())
}
