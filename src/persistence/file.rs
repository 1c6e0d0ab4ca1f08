use super::{PersistenceError, PersistenceResult};
use crate::calendar::{WorkCalendar, WorkCalendarConfig};
use crate::metadata::ProjectMetadata;
use crate::project::Project;
use crate::task::{
    CostEstimate, DEFAULT_PERT_GAMMA, DistributionType, DurationEstimate, Task,
    format_dependency_list, parse_dependency_list,
};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;
use tracing::info;

const METADATA_ROW_NAME: &str = "__metadata__";

#[derive(Serialize, Deserialize)]
struct ProjectSnapshot {
    metadata: ProjectMetadata,
    #[serde(default)]
    calendar: WorkCalendarConfig,
    tasks: Vec<Task>,
}

impl ProjectSnapshot {
    fn from_project(project: &Project) -> PersistenceResult<Self> {
        super::validate_tasks(project.tasks())?;
        Ok(Self {
            metadata: project.metadata.clone(),
            calendar: project.calendar.clone(),
            tasks: project.tasks().to_vec(),
        })
    }

    fn into_project(self) -> PersistenceResult<Project> {
        super::validate_tasks(&self.tasks)?;
        WorkCalendar::from_config(&self.calendar)?;
        Ok(Project {
            metadata: self.metadata,
            calendar: self.calendar,
            tasks: self.tasks,
        })
    }
}

pub fn save_project_to_json<P: AsRef<Path>>(project: &Project, path: P) -> PersistenceResult<()> {
    let snapshot = ProjectSnapshot::from_project(project)?;
    let file = File::create(path.as_ref())?;
    serde_json::to_writer_pretty(file, &snapshot)?;
    info!(path = %path.as_ref().display(), tasks = snapshot.tasks.len(), "saved project json");
    Ok(())
}

pub fn load_project_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<Project> {
    let file = File::open(path.as_ref())?;
    let snapshot: ProjectSnapshot = serde_json::from_reader(file)?;
    let project = snapshot.into_project()?;
    info!(path = %path.as_ref().display(), tasks = project.tasks().len(), "loaded project json");
    Ok(project)
}

/// Flat CSV row. Parameter columns that do not apply to a task's
/// distribution stay empty.
#[derive(Default, Serialize, Deserialize)]
struct TaskCsvRecord {
    id: i32,
    name: String,
    wbs: String,
    dist_type: String,
    min: String,
    likely: String,
    max: String,
    mean: String,
    std_dev: String,
    mu: String,
    sigma: String,
    gamma: String,
    cost_min: String,
    cost_likely: String,
    cost_max: String,
    dependencies: String,
    #[serde(default)]
    metadata_json: String,
    #[serde(default)]
    calendar_json: String,
}

impl From<&Task> for TaskCsvRecord {
    fn from(task: &Task) -> Self {
        let mut record = TaskCsvRecord {
            id: task.id,
            name: task.name.clone(),
            wbs: task.wbs.clone().unwrap_or_default(),
            dist_type: task.duration.dist_type().as_str().to_string(),
            cost_min: task.cost.min.to_string(),
            cost_likely: task.cost.likely.to_string(),
            cost_max: task.cost.max.to_string(),
            dependencies: format_dependency_list(&task.dependencies),
            ..TaskCsvRecord::default()
        };
        for (name, value) in task.duration.parameters() {
            let slot = match name {
                "min" => &mut record.min,
                "likely" => &mut record.likely,
                "max" => &mut record.max,
                "mean" => &mut record.mean,
                "std_dev" => &mut record.std_dev,
                "mu" => &mut record.mu,
                "sigma" => &mut record.sigma,
                "gamma" => &mut record.gamma,
                _ => continue,
            };
            *slot = value.to_string();
        }
        record
    }
}

impl TaskCsvRecord {
    fn metadata_row(project: &Project) -> PersistenceResult<Self> {
        Ok(TaskCsvRecord {
            name: METADATA_ROW_NAME.to_string(),
            metadata_json: serde_json::to_string(&project.metadata)?,
            calendar_json: serde_json::to_string(&project.calendar)?,
            ..TaskCsvRecord::default()
        })
    }

    fn is_metadata_row(&self) -> bool {
        !self.metadata_json.trim().is_empty()
    }

    fn duration(&self) -> PersistenceResult<DurationEstimate> {
        let dist_type: DistributionType = self
            .dist_type
            .parse()
            .map_err(|err: String| invalid_field(self.id, &err))?;
        let field = |name: &str, value: &str| required_f64(self.id, name, value);

        Ok(match dist_type {
            DistributionType::Triangular => DurationEstimate::Triangular {
                min: field("min", &self.min)?,
                likely: field("likely", &self.likely)?,
                max: field("max", &self.max)?,
            },
            DistributionType::Pert => DurationEstimate::Pert {
                min: field("min", &self.min)?,
                likely: field("likely", &self.likely)?,
                max: field("max", &self.max)?,
                gamma: parse_f64(&self.gamma)?.unwrap_or(DEFAULT_PERT_GAMMA),
            },
            DistributionType::Normal => DurationEstimate::Normal {
                mean: field("mean", &self.mean)?,
                std_dev: field("std_dev", &self.std_dev)?,
            },
            DistributionType::LogNormal => DurationEstimate::LogNormal {
                mu: field("mu", &self.mu)?,
                sigma: field("sigma", &self.sigma)?,
            },
        })
    }

    fn into_task(self) -> PersistenceResult<Task> {
        if self.is_metadata_row() {
            return Err(PersistenceError::InvalidData(
                "metadata row cannot be converted to task".into(),
            ));
        }
        let duration = self.duration()?;
        let cost = CostEstimate::new(
            parse_f64(&self.cost_min)?.unwrap_or_default(),
            parse_f64(&self.cost_likely)?.unwrap_or_default(),
            parse_f64(&self.cost_max)?.unwrap_or_default(),
        );
        let dependencies =
            parse_dependency_list(&self.dependencies).map_err(|err| invalid_field(self.id, &err))?;

        let mut task = Task::new(self.id, self.name, duration).with_cost(cost);
        task.wbs = parse_string_option(self.wbs);
        task.dependencies = dependencies;
        Ok(task)
    }
}

pub fn save_project_to_csv<P: AsRef<Path>>(project: &Project, path: P) -> PersistenceResult<()> {
    super::validate_tasks(project.tasks())?;
    let file = File::create(path.as_ref())?;
    let mut writer = csv::Writer::from_writer(file);
    writer.serialize(TaskCsvRecord::metadata_row(project)?)?;
    for task in project.tasks() {
        writer.serialize(TaskCsvRecord::from(task))?;
    }
    writer.flush()?;
    info!(path = %path.as_ref().display(), tasks = project.tasks().len(), "saved project csv");
    Ok(())
}

pub fn load_project_from_csv<P: AsRef<Path>>(path: P) -> PersistenceResult<Project> {
    let file = File::open(path.as_ref())?;
    let mut reader = csv::Reader::from_reader(file);
    let mut tasks = Vec::new();
    let mut metadata: Option<ProjectMetadata> = None;
    let mut calendar: Option<WorkCalendarConfig> = None;

    for record in reader.deserialize::<TaskCsvRecord>() {
        let record = record?;
        if record.is_metadata_row() {
            if metadata.is_some() {
                return Err(PersistenceError::InvalidData(
                    "CSV file contained multiple metadata rows".into(),
                ));
            }
            metadata = Some(serde_json::from_str(&record.metadata_json).map_err(|err| {
                PersistenceError::InvalidData(format!("invalid metadata json: {err}"))
            })?);
            if !record.calendar_json.trim().is_empty() {
                calendar = Some(serde_json::from_str(&record.calendar_json).map_err(|err| {
                    PersistenceError::InvalidData(format!("invalid calendar json: {err}"))
                })?);
            }
            continue;
        }
        tasks.push(record.into_task()?);
    }

    if tasks.is_empty() {
        return Err(PersistenceError::InvalidData(
            "CSV file contained no tasks".into(),
        ));
    }

    // Files without a metadata row get project defaults.
    let snapshot = ProjectSnapshot {
        metadata: metadata.unwrap_or_default(),
        calendar: calendar.unwrap_or_default(),
        tasks,
    };
    let project = snapshot.into_project()?;
    info!(path = %path.as_ref().display(), tasks = project.tasks().len(), "loaded project csv");
    Ok(project)
}

fn invalid_field(task_id: i32, message: &str) -> PersistenceError {
    PersistenceError::InvalidData(format!("task {task_id}: {message}"))
}

fn required_f64(task_id: i32, name: &str, input: &str) -> PersistenceResult<f64> {
    parse_f64(input)?.ok_or_else(|| invalid_field(task_id, &format!("missing value for '{name}'")))
}

fn parse_f64(input: &str) -> PersistenceResult<Option<f64>> {
    if input.trim().is_empty() {
        return Ok(None);
    }
    input
        .trim()
        .parse::<f64>()
        .map(Some)
        .map_err(|e| PersistenceError::InvalidData(format!("invalid float '{input}': {e}")))
}

fn parse_string_option(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{Dependency, DependencyType, PredecessorRef};

    #[test]
    fn csv_record_fills_only_matching_columns() {
        let task = Task::new(7, "Pour", DurationEstimate::normal(4.0, 0.5))
            .with_dependency(Dependency::new(
                PredecessorRef::Task(3),
                DependencyType::StartToStart,
                2.0,
            ))
            .with_dependency(Dependency::start());
        let record = TaskCsvRecord::from(&task);
        assert_eq!(record.dist_type, "normal");
        assert_eq!(record.mean, "4");
        assert_eq!(record.std_dev, "0.5");
        assert!(record.min.is_empty());
        assert_eq!(record.dependencies, "3SS+2,START");

        let restored = record.into_task().unwrap();
        assert_eq!(restored, task);
    }

    #[test]
    fn missing_parameter_is_rejected() {
        let record = TaskCsvRecord {
            id: 1,
            name: "A".into(),
            dist_type: "triangular".into(),
            min: "1".into(),
            max: "3".into(),
            ..TaskCsvRecord::default()
        };
        let err = record.into_task().unwrap_err();
        assert!(err.to_string().contains("likely"));
    }

    #[test]
    fn pert_gamma_defaults_when_blank() {
        let record = TaskCsvRecord {
            id: 2,
            name: "B".into(),
            dist_type: "pert".into(),
            min: "1".into(),
            likely: "2".into(),
            max: "6".into(),
            ..TaskCsvRecord::default()
        };
        let task = record.into_task().unwrap();
        assert_eq!(task.duration, DurationEstimate::pert(1.0, 2.0, 6.0));
    }
}
