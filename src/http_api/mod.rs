use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use crate::{
    CpmSchedule, Project, ScheduleError, SimulationConfig, SimulationOutcome, Task,
};

#[derive(Clone)]
pub struct AppState {
    project: Arc<RwLock<Project>>,
}

impl AppState {
    pub fn new(project: Project) -> Self {
        Self {
            project: Arc::new(RwLock::new(project)),
        }
    }

    fn project(&self) -> Arc<RwLock<Project>> {
        self.project.clone()
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

#[derive(Debug)]
enum ApiError {
    NotFound(String),
    Conflict(String),
    Invalid(String),
    Internal(String),
}

impl ApiError {
    fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    fn invalid(message: impl Into<String>) -> Self {
        ApiError::Invalid(message.into())
    }

    fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal(message.into())
    }
}

impl From<ScheduleError> for ApiError {
    fn from(value: ScheduleError) -> Self {
        match value {
            ScheduleError::Cancelled => ApiError::Internal(value.to_string()),
            other => ApiError::Invalid(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, "not_found", message),
            ApiError::Conflict(message) => (StatusCode::CONFLICT, "conflict", message),
            ApiError::Invalid(message) => (StatusCode::BAD_REQUEST, "invalid_request", message),
            ApiError::Internal(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
            }
        };
        (status, Json(ErrorBody { error, message })).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/project", get(get_project).put(replace_project))
        .route("/tasks", get(list_tasks).post(create_task))
        .route(
            "/tasks/:id",
            get(get_task).put(update_task).delete(delete_task),
        )
        .route("/baseline", post(baseline))
        .route("/simulate", post(simulate))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, project: Project) -> std::io::Result<()> {
    let state = AppState::new(project);
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "http api listening");
    axum::serve(listener, app).await
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn get_project(State(state): State<AppState>) -> Json<Project> {
    let project = state.project();
    let snapshot = project.read().clone();
    Json(snapshot)
}

async fn replace_project(
    State(state): State<AppState>,
    Json(replacement): Json<Project>,
) -> Result<Json<Project>, ApiError> {
    replacement.validate()?;
    let project = state.project();
    *project.write() = replacement.clone();
    Ok(Json(replacement))
}

async fn list_tasks(State(state): State<AppState>) -> Json<Vec<Task>> {
    let project = state.project();
    let tasks = project.read().tasks().to_vec();
    Json(tasks)
}

async fn get_task(
    State(state): State<AppState>,
    Path(task_id): Path<i32>,
) -> Result<Json<Task>, ApiError> {
    let project = state.project();
    let result = project.read().find_task(task_id).cloned();
    match result {
        Some(task) => Ok(Json(task)),
        None => Err(ApiError::not_found(format!("task {task_id} not found"))),
    }
}

/// Applies `task` to a copy of the project and commits only if the result
/// still validates.
fn commit_task(project: &RwLock<Project>, task: Task) -> Result<(), ApiError> {
    let mut guard = project.write();
    let mut candidate = guard.clone();
    candidate.upsert_task(task);
    candidate.validate()?;
    *guard = candidate;
    Ok(())
}

async fn create_task(
    State(state): State<AppState>,
    Json(task): Json<Task>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let project = state.project();
    if project.read().find_task(task.id).is_some() {
        return Err(ApiError::Conflict(format!(
            "task {} already exists",
            task.id
        )));
    }
    commit_task(&project, task.clone())?;
    Ok((StatusCode::CREATED, Json(task)))
}

async fn update_task(
    State(state): State<AppState>,
    Path(task_id): Path<i32>,
    Json(task): Json<Task>,
) -> Result<Json<Task>, ApiError> {
    if task.id != task_id {
        return Err(ApiError::invalid(
            "task id in payload does not match path parameter",
        ));
    }
    let project = state.project();
    if project.read().find_task(task_id).is_none() {
        return Err(ApiError::not_found(format!("task {task_id} not found")));
    }
    commit_task(&project, task.clone())?;
    Ok(Json(task))
}

async fn delete_task(
    State(state): State<AppState>,
    Path(task_id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    let project = state.project();
    let removed = project.write().delete_task(task_id);
    if !removed {
        return Err(ApiError::not_found(format!("task {task_id} not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn baseline(State(state): State<AppState>) -> Result<Json<CpmSchedule>, ApiError> {
    let project = state.project();
    let schedule = project.read().baseline_schedule()?;
    Ok(Json(schedule))
}

async fn simulate(
    State(state): State<AppState>,
    Json(config): Json<SimulationConfig>,
) -> Result<Json<SimulationOutcome>, ApiError> {
    let snapshot = state.project().read().clone();
    let outcome = tokio::task::spawn_blocking(move || snapshot.simulate(&config))
        .await
        .map_err(|err| {
            warn!(error = %err, "simulation task failed");
            ApiError::internal("simulation task failed")
        })??;
    Ok(Json(outcome))
}
