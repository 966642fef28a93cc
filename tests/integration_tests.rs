// Integration tests: PortainerRepo against a mock Portainer server

use axum::Json;
use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum_test::TestServer;
use harbour::config::{AppConfig, PortainerConfig};
use harbour::decode::{DecodeError, ListPolicy};
use harbour::error::Error;
use harbour::models::{ContainerStatus, ExecuteAction};
use harbour::portainer_repo::{PortainerApi, PortainerRepo};
use harbour::stacks_view::StacksViewModel;
use harbour::store::PortainerStore;
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

const API_KEY: &str = "ptr_test";

#[derive(Clone, Default)]
struct MockState {
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockState {
    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

fn unauthorized(headers: &HeaderMap) -> Option<Response> {
    let authorized = headers
        .get("X-API-Key")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == API_KEY);
    (!authorized).then(|| {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"message": "Unauthorized", "details": "A valid authorisation token is missing"})),
        )
            .into_response()
    })
}

async fn endpoints(headers: HeaderMap) -> Response {
    if let Some(denied) = unauthorized(&headers) {
        return denied;
    }
    Json(json!([
        {"Id": 1, "Name": "local", "Status": 1, "Type": 1, "URL": "unix:///var/run/docker.sock"},
        {"Id": 2, "Name": "edge", "Status": 2, "Type": 2}
    ]))
    .into_response()
}

async fn stacks(headers: HeaderMap) -> Response {
    if let Some(denied) = unauthorized(&headers) {
        return denied;
    }
    Json(json!([
        {"Id": 1, "Name": "web", "Type": 2, "EndpointId": 1, "Status": 1},
        {"Id": 2, "Name": "legacy", "Type": 9, "EndpointId": 1, "Status": 1},
        {"Id": 3, "Name": "metrics", "Type": 2, "EndpointId": 2, "Status": 2}
    ]))
    .into_response()
}

async fn containers(
    State(state): State<MockState>,
    Path(endpoint_id): Path<i64>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    if let Some(denied) = unauthorized(&headers) {
        return denied;
    }
    state.record(format!(
        "containers endpoint={} all={}",
        endpoint_id,
        query.get("all").map(String::as_str).unwrap_or("-")
    ));
    Json(json!([
        {
            "Id": "c1",
            "Names": ["/web-1"],
            "Image": "nginx",
            "Created": 1_700_000_000,
            "Labels": {"com.docker.compose.project": "web"},
            "State": "running",
            "Status": "Up 1 hour"
        },
        {
            "Id": "c2",
            "Names": ["/adhoc"],
            "Image": "redis",
            "Labels": {"com.docker.compose.project": "scratch"},
            "State": "exited",
            "Status": "Exited (0) 2 days ago"
        }
    ]))
    .into_response()
}

async fn inspect(Path((_endpoint_id, container_id)): Path<(i64, String)>) -> Response {
    if container_id == "missing" {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"message": "No such container: missing"})),
        )
            .into_response();
    }
    Json(json!({
        "Id": container_id,
        "Created": "2024-05-01T10:00:00Z",
        "Args": [],
        "State": {
            "Status": "running",
            "Running": true,
            "Paused": false,
            "Restarting": false,
            "OOMKilled": false,
            "Dead": false,
            "Pid": 42,
            "Error": "",
            "StartedAt": "2024-05-01T10:00:01Z"
        },
        "Image": "sha256:abc",
        "Name": "/web-1",
        "RestartCount": 0,
        "Driver": "overlay2",
        "GraphDriver": {"Name": "overlay2"}
    }))
    .into_response()
}

async fn stack_start(
    State(state): State<MockState>,
    Path(stack_id): Path<i64>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    state.record(format!(
        "start stack={} endpointId={}",
        stack_id,
        query.get("endpointId").map(String::as_str).unwrap_or("-")
    ));
    Json(json!({"Id": stack_id, "Name": "web", "Status": 1})).into_response()
}

async fn stack_stop(Path(_stack_id): Path<i64>) -> Response {
    (
        StatusCode::CONFLICT,
        Json(json!({"message": "Unable to stop stack", "details": "Stack is already inactive"})),
    )
        .into_response()
}

async fn container_action(
    State(state): State<MockState>,
    Path((endpoint_id, container_id, action)): Path<(i64, String, String)>,
) -> StatusCode {
    state.record(format!("{action} {container_id} endpoint={endpoint_id}"));
    StatusCode::NO_CONTENT
}

async fn motd() -> Json<serde_json::Value> {
    Json(json!({"Title": "Maintenance", "Message": "Upgrade at 22:00", "Style": "info", "Hash": "abc"}))
}

fn mock_portainer(state: MockState) -> Router {
    Router::new()
        .route("/api/endpoints", get(endpoints))
        .route("/api/stacks", get(stacks))
        .route("/api/stacks/{id}/start", post(stack_start))
        .route("/api/stacks/{id}/stop", post(stack_stop))
        .route(
            "/api/endpoints/{id}/docker/containers/json",
            get(containers),
        )
        .route(
            "/api/endpoints/{id}/docker/containers/{container_id}/json",
            get(inspect),
        )
        .route(
            "/api/endpoints/{id}/docker/containers/{container_id}/{action}",
            post(container_action),
        )
        .route("/api/motd", get(motd))
        .with_state(state)
}

fn test_server() -> (TestServer, MockState) {
    let state = MockState::default();
    let server = TestServer::builder()
        .http_transport()
        .build(mock_portainer(state.clone()));
    (server, state)
}

fn portainer_config(server: &TestServer, api_key: Option<&str>) -> PortainerConfig {
    let url = server.server_address().expect("http transport address");
    let toml = format!(
        "[portainer]\nurl = \"{}\"\n{}",
        url,
        api_key
            .map(|k| format!("api_key = \"{k}\"\n"))
            .unwrap_or_default()
    );
    AppConfig::load_from_str(&toml).unwrap().portainer
}

fn repo(server: &TestServer, policy: ListPolicy) -> PortainerRepo {
    PortainerRepo::connect(&portainer_config(server, Some(API_KEY)), policy).unwrap()
}

#[tokio::test]
async fn test_endpoints_are_fetched_with_api_key() {
    let (server, _) = test_server();
    let endpoints = repo(&server, ListPolicy::SkipInvalid).endpoints().await.unwrap();
    assert_eq!(endpoints.len(), 2);
    assert!(endpoints[0].is_up());
    assert!(!endpoints[1].is_up());
}

#[tokio::test]
async fn test_missing_api_key_maps_to_http_status() {
    let (server, _) = test_server();
    let repo = PortainerRepo::connect(&portainer_config(&server, None), ListPolicy::Abort).unwrap();
    let err = repo.endpoints().await.unwrap_err();
    match err {
        Error::HttpStatus { status, message } => {
            assert_eq!(status, 401);
            assert_eq!(message.as_deref(), Some("A valid authorisation token is missing"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_stack_list_policy_skip_invalid() {
    let (server, _) = test_server();
    let stacks = repo(&server, ListPolicy::SkipInvalid).stacks().await.unwrap();
    let names: Vec<_> = stacks.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, ["web", "metrics"]);
}

#[tokio::test]
async fn test_stack_list_policy_abort() {
    let (server, _) = test_server();
    let err = repo(&server, ListPolicy::Abort).stacks().await.unwrap_err();
    assert!(matches!(
        err,
        Error::Decode(DecodeError::UnrecognizedValue { ref field, ref value })
            if field == "[1].Type" && value == "9"
    ));
}

#[tokio::test]
async fn test_containers_request_all_and_decode() {
    let (server, state) = test_server();
    let containers = repo(&server, ListPolicy::Abort).containers(1).await.unwrap();
    assert_eq!(containers.len(), 2);
    assert_eq!(containers[1].state, Some(ContainerStatus::Exited));
    assert_eq!(state.calls(), ["containers endpoint=1 all=true"]);
}

#[tokio::test]
async fn test_inspect_container_and_not_found() {
    let (server, _) = test_server();
    let repo = repo(&server, ListPolicy::Abort);
    let details = repo.inspect_container(1, "c1").await.unwrap();
    assert_eq!(details.id, "c1");
    assert!(details.state.running);

    let err = repo.inspect_container(1, "missing").await.unwrap_err();
    assert!(matches!(
        err,
        Error::HttpStatus { status: 404, message: Some(ref m) } if m.contains("No such container")
    ));
}

#[tokio::test]
async fn test_stack_start_and_stop() {
    let (server, state) = test_server();
    let repo = repo(&server, ListPolicy::Abort);
    repo.set_stack_state(4, 1, true).await.unwrap();
    assert_eq!(state.calls(), ["start stack=4 endpointId=1"]);

    let err = repo.set_stack_state(4, 1, false).await.unwrap_err();
    assert_eq!(err.to_string(), "HTTP 409: Stack is already inactive");
}

#[tokio::test]
async fn test_container_action_posts_to_action_path() {
    let (server, state) = test_server();
    repo(&server, ListPolicy::Abort)
        .execute(2, "c1", ExecuteAction::Pause)
        .await
        .unwrap();
    assert_eq!(state.calls(), ["pause c1 endpoint=2"]);
}

#[tokio::test]
async fn test_motd() {
    let (server, _) = test_server();
    let motd = repo(&server, ListPolicy::Abort).motd().await.unwrap();
    assert_eq!(motd.title, "Maintenance");
    assert_eq!(motd.style.as_deref(), Some("info"));
}

#[tokio::test]
async fn test_stacks_view_over_http() {
    let (server, _) = test_server();
    let store = Arc::new(PortainerStore::new(Arc::new(repo(
        &server,
        ListPolicy::SkipInvalid,
    ))));
    store.select_endpoint(Some(1));
    let view = Arc::new(StacksViewModel::new(
        Arc::clone(&store),
        harbour::models::Preferences::default(),
    ));

    view.get_stacks(None).value().await.unwrap();
    let names: Vec<_> = view.stacks().into_iter().map(|i| i.name).collect();
    // "metrics" lives on endpoint 2; "scratch" only exists as a compose label
    assert_eq!(names, ["scratch", "web"]);
    assert_eq!(store.containers().len(), 2);
}
