use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

pub type TaskId = i32;

pub const DEFAULT_PERT_GAMMA: f64 = 4.0;

fn default_pert_gamma() -> f64 {
    DEFAULT_PERT_GAMMA
}

/// Precedence relation between two activities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DependencyType {
    #[default]
    #[serde(rename = "FS", alias = "fs")]
    FinishToStart,
    #[serde(rename = "SS", alias = "ss")]
    StartToStart,
    #[serde(rename = "FF", alias = "ff")]
    FinishToFinish,
    #[serde(rename = "SF", alias = "sf")]
    StartToFinish,
}

impl DependencyType {
    pub const ALL: [DependencyType; 4] = [
        DependencyType::FinishToStart,
        DependencyType::StartToStart,
        DependencyType::FinishToFinish,
        DependencyType::StartToFinish,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DependencyType::FinishToStart => "FS",
            DependencyType::StartToStart => "SS",
            DependencyType::FinishToFinish => "FF",
            DependencyType::StartToFinish => "SF",
        }
    }
}

impl fmt::Display for DependencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DependencyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| format!("unknown dependency type '{trimmed}'"))
    }
}

/// Either a real task or the project START sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PredecessorRef {
    Start,
    Task(TaskId),
}

impl PredecessorRef {
    pub const START_LABEL: &'static str = "START";
}

impl fmt::Display for PredecessorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredecessorRef::Start => f.write_str(Self::START_LABEL),
            PredecessorRef::Task(id) => write!(f, "{id}"),
        }
    }
}

impl FromStr for PredecessorRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case(Self::START_LABEL) {
            return Ok(PredecessorRef::Start);
        }
        trimmed
            .parse::<TaskId>()
            .map(PredecessorRef::Task)
            .map_err(|e| format!("invalid predecessor '{trimmed}': {e}"))
    }
}

impl Serialize for PredecessorRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PredecessorRef::Start => serializer.serialize_str(Self::START_LABEL),
            PredecessorRef::Task(id) => serializer.serialize_i32(*id),
        }
    }
}

impl<'de> Deserialize<'de> for PredecessorRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Id(TaskId),
            Label(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Id(id) => Ok(PredecessorRef::Task(id)),
            Raw::Label(label) => label.parse().map_err(serde::de::Error::custom),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dependency {
    pub predecessor: PredecessorRef,
    #[serde(rename = "type", default)]
    pub kind: DependencyType,
    /// Negative values are leads.
    #[serde(default)]
    pub lag: f64,
}

impl Dependency {
    pub fn new(predecessor: PredecessorRef, kind: DependencyType, lag: f64) -> Self {
        Self {
            predecessor,
            kind,
            lag,
        }
    }

    pub fn finish_to_start(predecessor: TaskId) -> Self {
        Self::new(PredecessorRef::Task(predecessor), DependencyType::FinishToStart, 0.0)
    }

    pub fn start() -> Self {
        Self::new(PredecessorRef::Start, DependencyType::FinishToStart, 0.0)
    }
}

/// Renders as `3FS+2`, `4SS-1.5` or `START`; a zero lag is omitted.
impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.predecessor == PredecessorRef::Start {
            return f.write_str(PredecessorRef::START_LABEL);
        }
        write!(f, "{}{}", self.predecessor, self.kind)?;
        if self.lag != 0.0 {
            write!(f, "{:+}", self.lag)?;
        }
        Ok(())
    }
}

impl FromStr for Dependency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        if input.is_empty() {
            return Err("empty dependency".to_string());
        }
        if input.eq_ignore_ascii_case(PredecessorRef::START_LABEL) {
            return Ok(Dependency::start());
        }

        let id_len = input
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(input.len());
        if id_len == 0 {
            return Err(format!("dependency '{input}' must start with a task id"));
        }
        let predecessor: PredecessorRef = input[..id_len].parse()?;
        let rest = &input[id_len..];

        let (kind, lag_text) = if rest.len() >= 2 && rest.is_char_boundary(2) {
            match rest[..2].parse::<DependencyType>() {
                Ok(kind) => (kind, &rest[2..]),
                Err(_) => (DependencyType::FinishToStart, rest),
            }
        } else {
            (DependencyType::FinishToStart, rest)
        };

        let lag_text = lag_text.trim();
        let lag = if lag_text.is_empty() {
            0.0
        } else if lag_text.starts_with('+') || lag_text.starts_with('-') {
            lag_text
                .parse::<f64>()
                .map_err(|e| format!("invalid lag in dependency '{input}': {e}"))?
        } else {
            return Err(format!("invalid dependency '{input}' (expected e.g. 3FS+2)"));
        };

        Ok(Dependency::new(predecessor, kind, lag))
    }
}

pub fn parse_dependency_list(input: &str) -> Result<Vec<Dependency>, String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::parse)
        .collect()
}

pub fn format_dependency_list(dependencies: &[Dependency]) -> String {
    dependencies
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributionType {
    Triangular,
    Pert,
    Normal,
    LogNormal,
}

impl DistributionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DistributionType::Triangular => "triangular",
            DistributionType::Pert => "pert",
            DistributionType::Normal => "normal",
            DistributionType::LogNormal => "log_normal",
        }
    }
}

impl fmt::Display for DistributionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DistributionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "triangular" | "tri" => Ok(DistributionType::Triangular),
            "pert" | "beta_pert" => Ok(DistributionType::Pert),
            "normal" | "gaussian" => Ok(DistributionType::Normal),
            "log_normal" | "lognormal" => Ok(DistributionType::LogNormal),
            other => Err(format!("unknown distribution type '{other}'")),
        }
    }
}

/// Duration estimate for one task, tagged by distribution family.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "dist_type", rename_all = "snake_case")]
pub enum DurationEstimate {
    Triangular {
        min: f64,
        likely: f64,
        max: f64,
    },
    Pert {
        min: f64,
        likely: f64,
        max: f64,
        #[serde(default = "default_pert_gamma")]
        gamma: f64,
    },
    Normal {
        mean: f64,
        std_dev: f64,
    },
    LogNormal {
        mu: f64,
        sigma: f64,
    },
}

impl DurationEstimate {
    pub fn triangular(min: f64, likely: f64, max: f64) -> Self {
        DurationEstimate::Triangular { min, likely, max }
    }

    pub fn pert(min: f64, likely: f64, max: f64) -> Self {
        DurationEstimate::Pert {
            min,
            likely,
            max,
            gamma: DEFAULT_PERT_GAMMA,
        }
    }

    pub fn normal(mean: f64, std_dev: f64) -> Self {
        DurationEstimate::Normal { mean, std_dev }
    }

    pub fn log_normal(mu: f64, sigma: f64) -> Self {
        DurationEstimate::LogNormal { mu, sigma }
    }

    /// A degenerate triangular estimate that always samples `duration`.
    pub fn fixed(duration: f64) -> Self {
        Self::triangular(duration, duration, duration)
    }

    pub fn dist_type(&self) -> DistributionType {
        match self {
            DurationEstimate::Triangular { .. } => DistributionType::Triangular,
            DurationEstimate::Pert { .. } => DistributionType::Pert,
            DurationEstimate::Normal { .. } => DistributionType::Normal,
            DurationEstimate::LogNormal { .. } => DistributionType::LogNormal,
        }
    }

    /// Single-point value used for the deterministic baseline schedule.
    pub fn nominal(&self) -> f64 {
        match *self {
            DurationEstimate::Triangular { likely, .. } => likely,
            DurationEstimate::Pert { likely, .. } => likely,
            DurationEstimate::Normal { mean, .. } => mean,
            DurationEstimate::LogNormal { mu, .. } => mu.exp(),
        }
    }

    pub fn parameters(&self) -> Vec<(&'static str, f64)> {
        match *self {
            DurationEstimate::Triangular { min, likely, max } => {
                vec![("min", min), ("likely", likely), ("max", max)]
            }
            DurationEstimate::Pert {
                min,
                likely,
                max,
                gamma,
            } => vec![("min", min), ("likely", likely), ("max", max), ("gamma", gamma)],
            DurationEstimate::Normal { mean, std_dev } => {
                vec![("mean", mean), ("std_dev", std_dev)]
            }
            DurationEstimate::LogNormal { mu, sigma } => vec![("mu", mu), ("sigma", sigma)],
        }
    }
}

/// Cost estimates are always sampled from a triangular distribution.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CostEstimate {
    pub min: f64,
    pub likely: f64,
    pub max: f64,
}

impl CostEstimate {
    pub fn new(min: f64, likely: f64, max: f64) -> Self {
        Self { min, likely, max }
    }

    pub fn fixed(cost: f64) -> Self {
        Self::new(cost, cost, cost)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wbs: Option<String>,
    #[serde(flatten)]
    pub duration: DurationEstimate,
    #[serde(default)]
    pub cost: CostEstimate,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
}

impl Task {
    pub fn new(id: TaskId, name: impl Into<String>, duration: DurationEstimate) -> Self {
        Self {
            id,
            name: name.into(),
            wbs: None,
            duration,
            cost: CostEstimate::default(),
            dependencies: Vec::new(),
        }
    }

    pub fn with_cost(mut self, cost: CostEstimate) -> Self {
        self.cost = cost;
        self
    }

    pub fn with_wbs(mut self, wbs: impl Into<String>) -> Self {
        self.wbs = Some(wbs.into());
        self
    }

    pub fn with_dependency(mut self, dependency: Dependency) -> Self {
        self.dependencies.push(dependency);
        self
    }

    pub fn after(self, predecessor: TaskId) -> Self {
        self.with_dependency(Dependency::finish_to_start(predecessor))
    }
}
