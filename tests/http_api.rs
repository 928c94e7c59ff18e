use axum::{
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode},
};
use race_tracker::{AppState, RaceTracker, build_router};
use serde_json::{Value, json};
use tower::ServiceExt;

fn app(admin_enabled: bool) -> axum::Router {
    build_router(AppState::new(RaceTracker::in_memory()), admin_enabled)
}

async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("response expected");
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body should be readable");

    if body.is_empty() {
        return (status, Value::Null);
    }

    let json = serde_json::from_slice::<Value>(&body).expect("body should be valid JSON");
    (status, json)
}

async fn send_json(
    app: &axum::Router,
    method: Method,
    uri: &str,
    payload: Value,
) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .expect("request should build");
    send(app, request).await
}

async fn send_empty(app: &axum::Router, method: Method, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("request should build");
    send(app, request).await
}

async fn create_event(app: &axum::Router) -> String {
    let (status, body) = send_json(
        app,
        Method::POST,
        "/api/v1/events",
        json!({"name": "Harbour Half", "unitOfMeasure": "kilometers", "totalDistance": 21.1}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["data"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_is_ok() {
    let (status, body) = send_empty(&app(false), Method::GET, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_create_and_get_event() {
    let app = app(false);
    let event_id = create_event(&app).await;

    let (status, body) =
        send_empty(&app, Method::GET, &format!("/api/v1/events?eventID={event_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["data"]["name"], "Harbour Half");
    assert_eq!(body["data"]["unitOfMeasure"], "kilometers");
    assert_eq!(body["data"]["version"], 1);
    assert!(body.get("error").is_none());
}

#[tokio::test]
async fn test_missing_event_is_not_found() {
    let (status, body) = send_empty(
        &app(false),
        Method::GET,
        "/api/v1/events?eventID=7d444840-9dc0-11d1-b245-5ffdce74fad2",
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], "notFound");
    assert_eq!(body["error"]["kind"], "notFound");
}

#[tokio::test]
async fn test_malformed_json_is_a_client_error() {
    let app = app(false);
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/heats")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .expect("request should build");

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "clientError");
    assert_eq!(body["error"]["kind"], "invalidInput");
}

#[tokio::test]
async fn test_repeated_checkpoint_is_rejected_with_client_error() {
    let app = app(false);
    let event_id = create_event(&app).await;
    let payload = json!({"eventID": event_id, "checkpoints": [{"name": "CP1"}]});

    let (status, body) = send_json(&app, Method::POST, "/api/v1/checkpoints", payload.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["accepted"][0]["name"], "CP1");
    assert_eq!(body["data"]["event"]["version"], 2);

    let (status, body) = send_json(&app, Method::POST, "/api/v1/checkpoints", payload).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "clientError");
    assert_eq!(body["data"]["rejected"][0]["reason"]["code"], "checkpointExists");
    assert_eq!(body["data"]["event"]["version"], 2);
}

#[tokio::test]
async fn test_runners_splits_and_heat_start_over_http() {
    let app = app(false);
    let event_id = create_event(&app).await;

    let (_, heats) = send_json(
        &app,
        Method::POST,
        "/api/v1/heats",
        json!({"eventID": event_id, "heats": [{"name": "Open"}]}),
    )
    .await;
    let heat_id = heats["data"]["accepted"][0]["id"].as_str().unwrap().to_string();
    let (_, checkpoints) = send_json(
        &app,
        Method::POST,
        "/api/v1/checkpoints",
        json!({"eventID": event_id, "checkpoints": [{"name": "Finish"}]}),
    )
    .await;
    let checkpoint_id = checkpoints["data"]["accepted"][0]["id"].as_str().unwrap().to_string();

    let (status, runners) = send_json(
        &app,
        Method::POST,
        "/api/v1/runners",
        json!({"eventID": event_id, "runners": [{"name": "Ada", "bib": "7", "heat": "Open"}]}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let runner = &runners["data"]["createdRunners"][0];
    let runner_id = runner["id"].as_str().unwrap().to_string();
    assert_eq!(runner["eventID"], event_id.as_str());
    assert_eq!(runner["heat"], heat_id.as_str());

    let (status, fetched) = send_empty(
        &app,
        Method::GET,
        &format!("/api/v1/runners?eventID={event_id}&runnerIDs={runner_id},bogus"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["data"]["runners"][0]["id"], runner_id.as_str());
    assert_eq!(fetched["data"]["rejectedIDs"][0]["reason"]["code"], "invalidRunnerId");

    let split = json!({
        "eventID": event_id,
        "runners": [{
            "id": runner_id,
            "expectedVersion": 1,
            "splits": [{"checkpointId": checkpoint_id, "splitTime": 3_601.25}]
        }]
    });
    let (status, body) = send_json(&app, Method::POST, "/api/v1/splits", split.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["updatedRunners"][0]["version"], 2);

    let (status, body) = send_json(&app, Method::POST, "/api/v1/splits", split).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["status"], "conflict");
    assert_eq!(body["data"]["rejectedRunners"][0]["reason"]["code"], "staleVersion");

    let start = json!({"eventID": event_id, "heatID": heat_id, "startTime": 1_700_000_000});
    let (status, body) = send_json(&app, Method::POST, "/api/v1/heats/start", start.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["heats"][heat_id.as_str()]["startTime"], 1_700_000_000.0);

    let (status, body) = send_json(&app, Method::POST, "/api/v1/heats/start", start).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["kind"], "constraintViolation");

    let (status, body) = send_json(
        &app,
        Method::DELETE,
        "/api/v1/heats",
        json!({"eventID": event_id, "heatIDs": [heat_id]}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["data"]["rejected"][0]["reason"]["code"], "heatInUse");
}

#[tokio::test]
async fn test_remove_checkpoint_over_http() {
    let app = app(false);
    let event_id = create_event(&app).await;
    let (_, checkpoints) = send_json(
        &app,
        Method::POST,
        "/api/v1/checkpoints",
        json!({"eventID": event_id, "checkpoints": [{"name": "Bridge"}]}),
    )
    .await;
    let checkpoint_id = checkpoints["data"]["accepted"][0]["id"].clone();

    let (status, body) = send_json(
        &app,
        Method::DELETE,
        "/api/v1/checkpoints",
        json!({"eventID": event_id, "checkpointIDs": [checkpoint_id]}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["accepted"][0], checkpoint_id);
    assert!(body["data"]["event"]["checkpoints"].as_object().unwrap().is_empty());
}

#[tokio::test]
async fn test_admin_routes_are_opt_in() {
    let (status, _) = send_empty(&app(false), Method::GET, "/api/v1/admin/documents").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let app = app(true);
    create_event(&app).await;

    let (status, body) = send_empty(&app, Method::GET, "/api/v1/admin/documents").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["events"].as_array().unwrap().len(), 1);

    let (status, body) = send_empty(&app, Method::DELETE, "/api/v1/admin/documents").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["deleted"], 1);
}
