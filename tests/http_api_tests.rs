#![cfg(feature = "http_api")]

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
};
use schedule_risk::{CpmSchedule, DurationEstimate, Project, Task, http_api};
use serde_json::{Value, json};
use tower::util::ServiceExt;

fn new_router() -> axum::Router {
    let state = http_api::AppState::new(Project::new());
    http_api::router(state)
}

fn json_request(method: &str, uri: &str, body: &impl serde::Serialize) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn read_json(response: axum::response::Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn task_lifecycle_via_http_api() {
    let app = new_router();
    let task = Task::new(1, "HTTP Demo", DurationEstimate::triangular(2.0, 3.0, 5.0));

    let response = app
        .clone()
        .oneshot(json_request("POST", "/tasks", &task))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(json_request("POST", "/tasks", &task))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .clone()
        .oneshot(empty_request("GET", "/tasks/1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let fetched: Task = serde_json::from_value(read_json(response).await).unwrap();
    assert_eq!(fetched, task);

    let updated = Task::new(1, "Renamed", DurationEstimate::normal(4.0, 1.0));
    let response = app
        .clone()
        .oneshot(json_request("PUT", "/tasks/1", &updated))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(empty_request("DELETE", "/tasks/1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(empty_request("GET", "/tasks/1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = read_json(response).await;
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn cyclic_update_is_rejected_and_not_committed() {
    let app = new_router();
    for task in [
        Task::new(1, "A", DurationEstimate::fixed(1.0)),
        Task::new(2, "B", DurationEstimate::fixed(1.0)).after(1),
    ] {
        let response = app
            .clone()
            .oneshot(json_request("POST", "/tasks", &task))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let cyclic = Task::new(1, "A", DurationEstimate::fixed(1.0)).after(2);
    let response = app
        .clone()
        .oneshot(json_request("PUT", "/tasks/1", &cyclic))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(response).await["error"], "invalid_request");

    let response = app
        .oneshot(empty_request("GET", "/tasks/1"))
        .await
        .unwrap();
    let stored: Task = serde_json::from_value(read_json(response).await).unwrap();
    assert!(stored.dependencies.is_empty());
}

#[tokio::test]
async fn baseline_and_simulation_endpoints() {
    let project = Project::with_tasks(vec![
        Task::new(1, "A", DurationEstimate::fixed(5.0)),
        Task::new(2, "B", DurationEstimate::triangular(2.0, 3.0, 6.0)).after(1),
    ]);
    let app = new_router();

    let response = app
        .clone()
        .oneshot(json_request("PUT", "/project", &project))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(empty_request("POST", "/baseline"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let baseline: CpmSchedule = serde_json::from_value(read_json(response).await).unwrap();
    assert_eq!(baseline.total_duration, 8.0);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/simulate",
            &json!({ "num_runs": 200, "seed": 5, "percentiles": [50, 90] }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let outcome = read_json(response).await;
    assert_eq!(outcome["status"], "completed");
    assert_eq!(outcome["seed"], 5);
    assert_eq!(outcome["analysis"]["valid_runs"], 200);
    assert_eq!(outcome["finish_date_forecast"].as_array().unwrap().len(), 2);

    let response = app
        .oneshot(json_request("POST", "/simulate", &json!({ "percentiles": [150] })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn simulate_empty_project_reports_no_tasks() {
    let app = new_router();
    let response = app
        .clone()
        .oneshot(empty_request("GET", "/health"))
        .await
        .unwrap();
    assert_eq!(read_json(response).await["status"], "ok");

    let response = app
        .oneshot(json_request("POST", "/simulate", &json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let outcome = read_json(response).await;
    assert_eq!(outcome["status"], "empty");
    assert_eq!(outcome["reason"], "no_tasks");
}
