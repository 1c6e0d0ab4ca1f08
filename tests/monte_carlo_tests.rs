use chrono::NaiveDate;
use schedule_risk::{
    CancellationToken, CostEstimate, DurationEstimate, EmptyReason, Project, ScheduleError,
    SimulationConfig, SimulationOutcome, SimulationReport, Task, simulate,
};

fn sample_network() -> Vec<Task> {
    vec![
        Task::new(1, "Design", DurationEstimate::triangular(3.0, 5.0, 9.0))
            .with_cost(CostEstimate::new(1000.0, 1500.0, 2500.0)),
        Task::new(2, "Build", DurationEstimate::pert(8.0, 10.0, 16.0))
            .after(1)
            .with_cost(CostEstimate::new(4000.0, 5000.0, 8000.0)),
        Task::new(3, "Docs", DurationEstimate::normal(4.0, 1.0)).after(1),
        Task::new(4, "Ship", DurationEstimate::log_normal(0.5, 0.2))
            .after(2)
            .after(3),
    ]
}

fn completed(outcome: SimulationOutcome) -> SimulationReport {
    match outcome {
        SimulationOutcome::Completed(report) => *report,
        SimulationOutcome::Empty { reason } => panic!("unexpected empty outcome: {reason:?}"),
    }
}

#[test]
fn same_seed_reproduces_report() {
    let tasks = sample_network();
    let config = SimulationConfig::default().with_runs(600).with_seed(11);
    let first = completed(simulate(&tasks, &config).unwrap());
    let second = completed(simulate(&tasks, &config).unwrap());
    assert_eq!(first, second);
    assert_eq!(first.seed, 11);
}

#[test]
fn parallel_and_sequential_runs_agree() {
    let tasks = sample_network();
    let base = SimulationConfig::default().with_runs(1000).with_seed(99);
    let parallel = completed(simulate(&tasks, &base.clone().with_parallel(true)).unwrap());
    let sequential = completed(simulate(&tasks, &base.with_parallel(false)).unwrap());
    assert_eq!(parallel, sequential);
}

#[test]
fn echoed_seed_replays_unseeded_batch() {
    let tasks = sample_network();
    let config = SimulationConfig::default().with_runs(300);
    let first = completed(simulate(&tasks, &config).unwrap());
    let replay = completed(simulate(&tasks, &config.clone().with_seed(first.seed)).unwrap());
    assert_eq!(first.analysis, replay.analysis);
}

#[test]
fn report_shapes_follow_run_count() {
    let tasks = sample_network();
    let config = SimulationConfig::default().with_runs(500).with_seed(3);
    let report = completed(simulate(&tasks, &config).unwrap());

    assert_eq!(report.valid_runs(), 500);
    assert_eq!(report.simulation_runs.len(), 500);
    assert_eq!(report.analysis.tasks.len(), tasks.len());
    assert_eq!(report.analysis.duration_percentiles.len(), 4);
    assert_eq!(report.analysis.duration_s_curve.len(), 500);
    assert_eq!(
        report.analysis.duration_histogram.iter().map(|b| b.count).sum::<usize>(),
        500
    );
    for task in &tasks {
        let timings = &report.all_task_timings[&task.id];
        assert_eq!(timings.starts.len(), 500);
        assert_eq!(timings.finishes.len(), 500);
    }

    let a = &report.analysis;
    assert!(a.min_duration <= a.duration_percentile(10.0).unwrap());
    assert!(a.duration_percentile(10.0).unwrap() <= a.duration_percentile(90.0).unwrap());
    assert!(a.duration_percentile(90.0).unwrap() <= a.max_duration);
    assert!(a.schedule_sensitivity_index > 0.0);
    for task in &a.tasks {
        assert!((0.0..=1.0).contains(&task.criticality_index));
        assert!((-1.0..=1.0).contains(&task.duration_sensitivity));
    }
}

#[test]
fn serial_chain_is_always_critical() {
    let tasks = vec![
        Task::new(1, "A", DurationEstimate::triangular(1.0, 2.0, 4.0)),
        Task::new(2, "B", DurationEstimate::pert(2.0, 3.0, 7.0)).after(1),
        Task::new(3, "C", DurationEstimate::normal(5.0, 0.5)).after(2),
    ];
    let config = SimulationConfig::default().with_runs(400).with_seed(5);
    let report = completed(simulate(&tasks, &config).unwrap());

    for task in &report.analysis.tasks {
        assert_eq!(task.criticality_index, 1.0, "task {}", task.task_id);
    }
    assert!(report.simulation_runs.iter().all(|run| run.critical_path_tasks == vec![1, 2, 3]));
}

#[test]
fn dominated_branch_is_never_critical() {
    let tasks = vec![
        Task::new(1, "Short", DurationEstimate::triangular(1.0, 2.0, 3.0)),
        Task::new(2, "Long", DurationEstimate::triangular(10.0, 12.0, 15.0)),
        Task::new(3, "Join", DurationEstimate::fixed(1.0)).after(1).after(2),
    ];
    let config = SimulationConfig::default().with_runs(300).with_seed(8);
    let report = completed(simulate(&tasks, &config).unwrap());

    assert_eq!(report.analysis.task(1).unwrap().criticality_index, 0.0);
    assert_eq!(report.analysis.task(2).unwrap().criticality_index, 1.0);
    assert_eq!(report.analysis.task(3).unwrap().criticality_index, 1.0);
    // Constant duration has no correlation with the total
    assert_eq!(report.analysis.task(3).unwrap().duration_sensitivity, 0.0);
}

#[test]
fn fixed_estimates_collapse_statistics() {
    let tasks = vec![
        Task::new(1, "A", DurationEstimate::fixed(4.0)).with_cost(CostEstimate::fixed(100.0)),
        Task::new(2, "B", DurationEstimate::fixed(6.0))
            .after(1)
            .with_cost(CostEstimate::fixed(50.0)),
    ];
    let config = SimulationConfig::default().with_runs(50).with_seed(1);
    let report = completed(simulate(&tasks, &config).unwrap());
    let a = &report.analysis;

    assert_eq!(a.mean_duration, 10.0);
    assert_eq!(a.std_dev_duration, 0.0);
    assert_eq!(a.schedule_sensitivity_index, 0.0);
    assert_eq!(a.mean_cost, 150.0);
    assert_eq!(a.duration_histogram.len(), 1);
    assert!(a.duration_percentiles.iter().all(|pv| pv.value == 10.0));
    assert_eq!(a.duration_cost_correlation, 0.0);
}

#[test]
fn cycle_is_rejected_before_any_trial() {
    let tasks = vec![
        Task::new(1, "A", DurationEstimate::fixed(1.0)).after(2),
        Task::new(2, "B", DurationEstimate::fixed(1.0)).after(1),
    ];
    let config = SimulationConfig::default().with_runs(10).with_seed(1);
    let err = simulate(&tasks, &config).unwrap_err();
    assert!(matches!(err, ScheduleError::StructuralCycle { .. }));
}

#[test]
fn empty_inputs_yield_empty_outcome() {
    let config = SimulationConfig::default().with_seed(1);
    assert_eq!(
        simulate(&[], &config).unwrap(),
        SimulationOutcome::Empty {
            reason: EmptyReason::NoTasks
        }
    );

    let tasks = sample_network();
    assert_eq!(
        simulate(&tasks, &config.clone().with_runs(0)).unwrap(),
        SimulationOutcome::Empty {
            reason: EmptyReason::NoValidRuns
        }
    );
}

#[test]
fn invalid_percentile_is_a_config_error() {
    let config = SimulationConfig::default().with_percentiles(vec![50.0, 120.0]);
    let err = simulate(&sample_network(), &config).unwrap_err();
    assert!(matches!(err, ScheduleError::InvalidConfig(_)));
}

#[test]
fn symmetric_pert_counts_fallbacks() {
    let tasks = vec![Task::new(1, "Even", DurationEstimate::pert(2.0, 5.0, 8.0))];
    let config = SimulationConfig::default().with_runs(700).with_seed(4);
    let report = completed(simulate(&tasks, &config).unwrap());
    assert_eq!(report.parameter_fallbacks, 700);
    assert!(report.simulation_runs.iter().all(|r| (2.0..=8.0).contains(&r.total_duration)));
}

#[test]
fn cancelled_batch_returns_error() {
    let project = Project::with_tasks(sample_network());
    let token = CancellationToken::new();
    token.cancel();
    let config = SimulationConfig::default().with_runs(1000).with_seed(2);
    assert_eq!(
        project.simulate_with_cancel(&config, &token),
        Err(ScheduleError::Cancelled)
    );
}

#[test]
fn project_simulation_forecasts_finish_dates() {
    let mut project = Project::with_tasks(vec![
        Task::new(1, "A", DurationEstimate::fixed(3.0)),
        Task::new(2, "B", DurationEstimate::fixed(2.0)).after(1),
    ]);
    project.metadata.project_start_date = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();

    let config = SimulationConfig::default()
        .with_runs(20)
        .with_seed(1)
        .with_percentiles(vec![50.0, 90.0]);
    let report = completed(project.simulate(&config).unwrap());

    assert_eq!(report.finish_date_forecast.len(), 2);
    for forecast in &report.finish_date_forecast {
        assert_eq!(forecast.duration, 5.0);
        assert_eq!(forecast.finish_date, NaiveDate::from_ymd_opt(2025, 1, 10));
    }
}

#[test]
fn forecast_beyond_calendar_range_is_left_empty() {
    let project = Project::with_tasks(vec![Task::new(
        1,
        "Long",
        DurationEstimate::normal(2.0e8, 0.0),
    )]);
    let config = SimulationConfig::default()
        .with_runs(1)
        .with_seed(1)
        .with_percentiles(vec![50.0]);
    let report = completed(project.simulate(&config).unwrap());

    assert_eq!(report.analysis.duration_percentile(50.0), Some(2.0e8));
    assert_eq!(report.finish_date_forecast.len(), 1);
    assert_eq!(report.finish_date_forecast[0].finish_date, None);
}
