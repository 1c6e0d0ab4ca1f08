use chrono::NaiveDate;
use schedule_risk::persistence::{
    load_project_from_csv, load_project_from_json, save_project_to_csv, save_project_to_json,
};
use schedule_risk::task::{format_dependency_list, parse_dependency_list};
use schedule_risk::{
    CostEstimate, DistributionType, DurationEstimate, Project, SimulationConfig,
    SimulationOutcome, Task,
};
use std::io::{self, Write};
use tracing_subscriber::EnvFilter;

fn render_text_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (ci, cell) in row.iter().enumerate() {
            if cell.len() > widths[ci] {
                widths[ci] = cell.len();
            }
        }
    }

    let mut sep = String::from("+");
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    out.push_str(&render_row(&widths, headers.iter().copied()));
    out.push('\n');
    out.push_str(&sep);
    out.push('\n');
    for row in rows {
        out.push_str(&render_row(&widths, row.iter().map(String::as_str)));
        out.push('\n');
    }
    out.push_str(&sep);
    out.push('\n');
    out
}

fn render_row<'a>(widths: &[usize], cells: impl Iterator<Item = &'a str>) -> String {
    let mut line = String::from("|");
    for (ci, cell) in cells.enumerate() {
        line.push(' ');
        line.push_str(cell);
        line.push_str(&" ".repeat(widths[ci].saturating_sub(cell.len())));
        line.push_str(" |");
    }
    line
}

fn render_tasks(project: &Project) -> String {
    let rows: Vec<Vec<String>> = project
        .tasks()
        .iter()
        .map(|task| {
            let params = task
                .duration
                .parameters()
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join(" ");
            vec![
                task.id.to_string(),
                task.name.clone(),
                task.wbs.clone().unwrap_or_default(),
                task.duration.dist_type().to_string(),
                params,
                format!("{}/{}/{}", task.cost.min, task.cost.likely, task.cost.max),
                format_dependency_list(&task.dependencies),
            ]
        })
        .collect();
    render_text_table(
        &["id", "name", "wbs", "dist", "params", "cost", "dependencies"],
        &rows,
    )
}

fn print_help() {
    println!(
        "Commands:\n  help                               Show this help\n  show                               Show current tasks\n  add <id> <name> <dist> <params...> Upsert a task. dist is one of:\n                                       tri <min> <likely> <max>\n                                       pert <min> <likely> <max> [gamma]\n                                       normal <mean> <std_dev>\n                                       lognormal <mu> <sigma>\n  dep     <id> <list|none>           Set dependencies (e.g. 1FS+2,3SS,START)\n  cost    <id> <min> <likely> <max>  Set triangular cost estimate\n  wbs     <id> <code>                Set WBS code\n  delete  <id>                       Delete a task and clean up dependencies\n  runs    <n>                        Set number of Monte Carlo runs\n  seed    <u64|none>                 Set or clear the random seed\n  pct     <csv>                      Set reported percentiles (e.g. 10,50,90)\n  parallel <true|false>              Run trials on the thread pool\n  config                             Show simulation settings\n  baseline                           Deterministic CPM with nominal durations\n  simulate                           Run the Monte Carlo simulation\n  meta show                          Show project metadata\n  meta name <text...>                Update project name\n  meta desc <text...>                Update project description\n  meta start <YYYY-MM-DD>            Update project start date\n  save <json|csv> <path>             Persist project to disk\n  load <json|csv> <path>             Load project from disk\n  quit|exit                          Exit"
    );
}

fn print_metadata(project: &Project) {
    let metadata = &project.metadata;
    println!("Project name       : {}", metadata.project_name);
    println!("Project description: {}", metadata.project_description);
    println!("Project start date : {}", metadata.project_start_date);
}

fn print_config(config: &SimulationConfig) {
    let seed = config
        .seed
        .map(|s| s.to_string())
        .unwrap_or_else(|| "random".to_string());
    let percentiles = config
        .percentiles
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(",");
    println!("Runs        : {}", config.num_runs);
    println!("Seed        : {}", seed);
    println!("Percentiles : {}", percentiles);
    println!("Parallel    : {}", config.parallel);
}

fn parse_duration(dist: &str, params: &[f64]) -> Result<DurationEstimate, String> {
    let dist_type: DistributionType = dist.parse()?;
    let estimate = match (dist_type, params) {
        (DistributionType::Triangular, [min, likely, max]) => {
            DurationEstimate::triangular(*min, *likely, *max)
        }
        (DistributionType::Pert, [min, likely, max]) => DurationEstimate::pert(*min, *likely, *max),
        (DistributionType::Pert, [min, likely, max, gamma]) => DurationEstimate::Pert {
            min: *min,
            likely: *likely,
            max: *max,
            gamma: *gamma,
        },
        (DistributionType::Normal, [mean, std_dev]) => DurationEstimate::normal(*mean, *std_dev),
        (DistributionType::LogNormal, [mu, sigma]) => DurationEstimate::log_normal(*mu, *sigma),
        (kind, _) => return Err(format!("wrong number of parameters for {kind}")),
    };
    Ok(estimate)
}

fn parse_floats<'a>(parts: impl Iterator<Item = &'a str>) -> Result<Vec<f64>, String> {
    parts
        .map(|p| p.parse::<f64>().map_err(|_| format!("Invalid number '{p}'")))
        .collect()
}

fn print_baseline(project: &Project) {
    match project.baseline_schedule() {
        Ok(schedule) => {
            let rows: Vec<Vec<String>> = schedule
                .task_timings
                .iter()
                .map(|t| {
                    vec![
                        t.task_id.to_string(),
                        format!("{:.2}", t.earliest_start),
                        format!("{:.2}", t.earliest_finish),
                        format!("{:.2}", t.latest_start),
                        format!("{:.2}", t.latest_finish),
                        format!("{:.2}", t.slack),
                        t.is_critical.to_string(),
                    ]
                })
                .collect();
            println!(
                "Baseline duration: {:.2}\n{}",
                schedule.total_duration,
                render_text_table(&["id", "ES", "EF", "LS", "LF", "slack", "critical"], &rows)
            );
        }
        Err(e) => println!("Baseline error: {}", e),
    }
}

fn print_simulation(project: &Project, config: &SimulationConfig) {
    let outcome = match project.simulate(config) {
        Ok(outcome) => outcome,
        Err(e) => {
            println!("Simulation error: {}", e);
            return;
        }
    };
    let report = match outcome {
        SimulationOutcome::Completed(report) => report,
        SimulationOutcome::Empty { reason } => {
            println!("Nothing to simulate ({reason:?}).");
            return;
        }
    };

    println!("Simulated ({})", report.to_cli_summary());
    let rows: Vec<Vec<String>> = report
        .analysis
        .tasks
        .iter()
        .map(|t| {
            vec![
                t.task_id.to_string(),
                t.name.clone(),
                format!("{:.2}", t.mean_duration),
                format!("{:.3}", t.criticality_index),
                format!("{:.3}", t.duration_sensitivity),
                format!("{:.3}", t.cruciality),
            ]
        })
        .collect();
    println!(
        "{}",
        render_text_table(
            &["id", "name", "mean", "criticality", "sensitivity", "cruciality"],
            &rows
        )
    );
    for forecast in &report.finish_date_forecast {
        match forecast.finish_date {
            Some(date) => println!(
                "P{} finish: {} ({:.2} days)",
                forecast.percentile, date, forecast.duration
            ),
            None => println!(
                "P{} finish: beyond calendar range ({:.2} days)",
                forecast.percentile, forecast.duration
            ),
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let mut project = Project::new();
    let mut config = SimulationConfig::default().with_env_overrides();

    println!("Schedule Risk (CLI) - type 'help' for commands\n");

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let mut parts = input.split_whitespace();
        let cmd = parts.next().unwrap_or("");

        match cmd {
            "help" => print_help(),
            "quit" | "exit" => break,
            "show" => println!("{}", render_tasks(&project)),
            "add" => {
                let (Some(id_s), Some(name), Some(dist)) =
                    (parts.next(), parts.next(), parts.next())
                else {
                    println!("Usage: add <id> <name> <dist> <params...>");
                    continue;
                };
                let Ok(id) = id_s.parse::<i32>() else {
                    println!("Invalid id");
                    continue;
                };
                let duration = match parse_floats(parts).and_then(|p| parse_duration(dist, &p)) {
                    Ok(d) => d,
                    Err(e) => {
                        println!("{}", e);
                        continue;
                    }
                };
                let task = match project.find_task(id) {
                    Some(existing) => Task {
                        name: name.to_string(),
                        duration,
                        ..existing.clone()
                    },
                    None => Task::new(id, name, duration),
                };
                project.upsert_task(task);
                println!("Task upserted.");
                println!("{}", render_tasks(&project));
            }
            "dep" => {
                let (Some(id_s), Some(list)) = (parts.next(), parts.next()) else {
                    println!("Usage: dep <id> <list|none>");
                    continue;
                };
                let Ok(id) = id_s.parse::<i32>() else {
                    println!("Invalid id");
                    continue;
                };
                let deps = if list.eq_ignore_ascii_case("none") {
                    Ok(Vec::new())
                } else {
                    parse_dependency_list(list)
                };
                match (deps, project.find_task_mut(id)) {
                    (Ok(deps), Some(task)) => {
                        task.dependencies = deps;
                        println!("Dependencies set.");
                    }
                    (Err(e), _) => println!("Error: {}", e),
                    (_, None) => println!("Task {id} not found."),
                }
            }
            "cost" => {
                let Some(Ok(id)) = parts.next().map(str::parse::<i32>) else {
                    println!("Usage: cost <id> <min> <likely> <max>");
                    continue;
                };
                let values = match parse_floats(parts) {
                    Ok(v) if v.len() == 3 => v,
                    Ok(_) => {
                        println!("Usage: cost <id> <min> <likely> <max>");
                        continue;
                    }
                    Err(e) => {
                        println!("{}", e);
                        continue;
                    }
                };
                match project.find_task_mut(id) {
                    Some(task) => {
                        task.cost = CostEstimate::new(values[0], values[1], values[2]);
                        println!("Cost set.");
                    }
                    None => println!("Task {id} not found."),
                }
            }
            "wbs" => {
                let (Some(Ok(id)), Some(code)) = (parts.next().map(str::parse::<i32>), parts.next())
                else {
                    println!("Usage: wbs <id> <code>");
                    continue;
                };
                match project.find_task_mut(id) {
                    Some(task) => {
                        task.wbs = Some(code.to_string());
                        println!("WBS set.");
                    }
                    None => println!("Task {id} not found."),
                }
            }
            "delete" => match parts.next().map(str::parse::<i32>) {
                Some(Ok(id)) => {
                    if project.delete_task(id) {
                        println!("Deleted task {id}.");
                        println!("{}", render_tasks(&project));
                    } else {
                        println!("Task {id} not found.");
                    }
                }
                Some(Err(_)) => println!("Invalid id"),
                None => println!("Usage: delete <id>"),
            },
            "runs" => match parts.next().map(str::parse::<usize>) {
                Some(Ok(n)) => {
                    config.num_runs = n;
                    println!("Runs set to {n}.");
                }
                _ => println!("Usage: runs <n>"),
            },
            "seed" => match parts.next() {
                Some(s) if s.eq_ignore_ascii_case("none") => {
                    config.seed = None;
                    println!("Seed cleared.");
                }
                Some(s) => match s.parse::<u64>() {
                    Ok(seed) => {
                        config.seed = Some(seed);
                        println!("Seed set to {seed}.");
                    }
                    Err(_) => println!("Invalid seed"),
                },
                None => println!("Usage: seed <u64|none>"),
            },
            "pct" => {
                let Some(list) = parts.next() else {
                    println!("Usage: pct <csv>");
                    continue;
                };
                let candidate = match parse_floats(list.split(',').map(str::trim)) {
                    Ok(values) => config.clone().with_percentiles(values),
                    Err(e) => {
                        println!("{}", e);
                        continue;
                    }
                };
                match candidate.validate() {
                    Ok(()) => {
                        config = candidate;
                        println!("Percentiles set.");
                    }
                    Err(e) => println!("Error: {}", e),
                }
            }
            "parallel" => match parts.next().map(|s| s.to_ascii_lowercase()) {
                Some(v) if v == "true" || v == "false" => {
                    config.parallel = v == "true";
                    println!("Parallel set to {}.", config.parallel);
                }
                _ => println!("Usage: parallel <true|false>"),
            },
            "config" => print_config(&config),
            "baseline" => print_baseline(&project),
            "simulate" => print_simulation(&project, &config),
            "meta" => match parts.next() {
                Some("show") | None => print_metadata(&project),
                Some("name") => {
                    let text = parts.collect::<Vec<_>>().join(" ");
                    if text.is_empty() {
                        println!("Usage: meta name <text...>");
                    } else {
                        project.metadata.project_name = text;
                        println!("Project name updated.");
                    }
                }
                Some("desc") => {
                    project.metadata.project_description = parts.collect::<Vec<_>>().join(" ");
                    println!("Project description updated.");
                }
                Some("start") => {
                    match parts
                        .next()
                        .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
                    {
                        Some(Ok(date)) => {
                            project.metadata.project_start_date = date;
                            println!("Project start date updated.");
                        }
                        _ => println!("Usage: meta start <YYYY-MM-DD>"),
                    }
                }
                Some(other) => println!("Unknown meta command '{}'", other),
            },
            "save" | "load" => {
                let (Some(format), Some(path)) = (parts.next(), parts.next()) else {
                    println!("Usage: {} <json|csv> <path>", cmd);
                    continue;
                };
                if cmd == "save" {
                    let result = match format {
                        "json" => save_project_to_json(&project, path),
                        "csv" => save_project_to_csv(&project, path),
                        _ => {
                            println!("Unknown format '{}'", format);
                            continue;
                        }
                    };
                    match result {
                        Ok(()) => println!("Project saved to {}", path),
                        Err(e) => println!("Save error: {}", e),
                    }
                } else {
                    let result = match format {
                        "json" => load_project_from_json(path),
                        "csv" => load_project_from_csv(path),
                        _ => {
                            println!("Unknown format '{}'", format);
                            continue;
                        }
                    };
                    match result {
                        Ok(loaded) => {
                            project = loaded;
                            println!("Project loaded from {}", path);
                            println!("{}", render_tasks(&project));
                        }
                        Err(e) => println!("Load error: {}", e),
                    }
                }
            }
            _ => println!("Unknown command. Type 'help'."),
        }
    }
}
