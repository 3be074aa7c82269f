use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use serde_json::{Value, json};
use std::sync::Arc;
use taskboard_server::task::TaskState;
use taskboard_server::web::{HealthState, create_app};
use tower::ServiceExt;

mod common;

/// Test helper holding the app and the container backing it.
struct TestApp {
    #[allow(dead_code)] // context is kept to ensure the container is not dropped
    context: common::TestContext,
    app: Router,
}

impl TestApp {
    async fn new() -> Self {
        let context = common::setup().await.expect("Failed to setup test context");
        let task_state = Arc::new(TaskState {
            db: Arc::new(context.db.clone()),
        });
        let app = create_app(task_state, Arc::new(HealthState::new()));
        Self { context, app }
    }

    /// Sends a request and returns the status with the parsed JSON body.
    async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn create(&self, text: &str) -> Value {
        let (status, body) = self
            .send(Method::POST, "/api/tasks", Some(json!({ "text": text })))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        body
    }
}

fn texts(list: &Value) -> Vec<&str> {
    list.as_array()
        .expect("list responses are arrays")
        .iter()
        .map(|task| task["text"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn can_run_the_full_task_lifecycle() {
    let app = TestApp::new().await;

    let (status, created) = app
        .send(Method::POST, "/api/tasks", Some(json!({ "text": "buy milk" })))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["text"], "buy milk");
    assert_eq!(created["completed"], false);
    assert_eq!(created["priority"], "medium");
    let id = created["id"].as_str().unwrap().to_string();

    let (_, active) = app.send(Method::GET, "/api/tasks?filter=active", None).await;
    assert_eq!(texts(&active), vec!["buy milk"]);

    let (status, updated) = app
        .send(
            Method::PUT,
            &format!("/api/tasks/{}", id),
            Some(json!({ "completed": true })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["completed"], true);

    let (_, completed) = app
        .send(Method::GET, "/api/tasks?filter=completed", None)
        .await;
    assert_eq!(texts(&completed), vec!["buy milk"]);
    let (_, active) = app.send(Method::GET, "/api/tasks?filter=active", None).await;
    assert!(texts(&active).is_empty());

    let (status, cleared) = app.send(Method::DELETE, "/api/tasks", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cleared["deletedCount"], 1);
    assert_eq!(cleared["message"], "Cleared 1 completed tasks");

    let (status, stats) = app.send(Method::GET, "/api/stats", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats, json!({ "total": 0, "completed": 0, "active": 0 }));
}

#[tokio::test]
async fn can_reject_empty_text_with_bad_request() {
    let app = TestApp::new().await;

    for body in [json!({ "text": "   " }), json!({ "priority": "high" })] {
        let (status, error) = app.send(Method::POST, "/api/tasks", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error["message"], "Task text must not be empty");
    }

    let (_, all) = app.send(Method::GET, "/api/tasks", None).await;
    assert!(texts(&all).is_empty());
}

#[tokio::test]
async fn can_reject_unknown_priority_with_bad_request() {
    let app = TestApp::new().await;

    let (status, error) = app
        .send(
            Method::POST,
            "/api/tasks",
            Some(json!({ "text": "x", "priority": "urgent" })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["message"], "Invalid request body");
    assert!(error["error"].is_string());
}

#[tokio::test]
async fn can_list_newest_first_and_ignore_unknown_filter() {
    let app = TestApp::new().await;
    app.create("first").await;
    app.create("second").await;
    app.create("third").await;

    let (status, all) = app.send(Method::GET, "/api/tasks", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(texts(&all), vec!["third", "second", "first"]);

    let (_, unknown) = app.send(Method::GET, "/api/tasks?filter=whatever", None).await;
    assert_eq!(texts(&unknown), vec!["third", "second", "first"]);
}

#[tokio::test]
async fn can_list_every_task_when_filter_is_repeated() {
    let app = TestApp::new().await;
    let first = app.create("first").await;
    app.create("second").await;
    app.send(
        Method::PUT,
        &format!("/api/tasks/{}", first["id"].as_str().unwrap()),
        Some(json!({ "completed": true })),
    )
    .await;

    let (status, all) = app
        .send(Method::GET, "/api/tasks?filter=active&filter=completed", None)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(texts(&all), vec!["second", "first"]);
}

#[tokio::test]
async fn can_get_single_task_and_report_missing_ones() {
    let app = TestApp::new().await;
    let created = app.create("find me").await;
    let id = created["id"].as_str().unwrap();

    let (status, fetched) = app.send(Method::GET, &format!("/api/tasks/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);

    let missing = uuid::Uuid::new_v4();
    let (status, error) = app
        .send(Method::GET, &format!("/api/tasks/{}", missing), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["message"], "Task not found");

    let (status, _) = app.send(Method::GET, "/api/tasks/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn can_update_only_supplied_fields() {
    let app = TestApp::new().await;
    let (_, created) = app
        .send(
            Method::POST,
            "/api/tasks",
            Some(json!({ "text": "call mom", "priority": "high" })),
        )
        .await;
    let id = created["id"].as_str().unwrap();

    let (status, updated) = app
        .send(
            Method::PUT,
            &format!("/api/tasks/{}", id),
            Some(json!({ "completed": true })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["text"], "call mom");
    assert_eq!(updated["priority"], "high");
    assert_eq!(updated["createdAt"], created["createdAt"]);
    assert_ne!(updated["updatedAt"], created["updatedAt"]);
}

#[tokio::test]
async fn can_report_missing_task_on_update_and_delete() {
    let app = TestApp::new().await;
    app.create("bystander").await;
    let missing = format!("/api/tasks/{}", uuid::Uuid::new_v4());

    let (status, _) = app
        .send(Method::PUT, &missing, Some(json!({ "completed": true })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, error) = app.send(Method::DELETE, &missing, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["message"], "Task not found");

    let (_, all) = app.send(Method::GET, "/api/tasks", None).await;
    assert_eq!(texts(&all), vec!["bystander"]);
}

#[tokio::test]
async fn can_delete_task_and_return_it() {
    let app = TestApp::new().await;
    let created = app.create("short lived").await;
    let id = created["id"].as_str().unwrap();

    let (status, body) = app
        .send(Method::DELETE, &format!("/api/tasks/{}", id), None)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Task deleted");
    assert_eq!(body["task"], created);
}

#[tokio::test]
async fn can_clear_when_nothing_is_completed() {
    let app = TestApp::new().await;
    app.create("unfinished").await;

    let (status, body) = app.send(Method::DELETE, "/api/tasks", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deletedCount"], 0);
}

#[tokio::test]
async fn can_keep_stats_consistent() {
    let app = TestApp::new().await;
    let first = app.create("one").await;
    app.create("two").await;
    app.send(
        Method::PUT,
        &format!("/api/tasks/{}", first["id"].as_str().unwrap()),
        Some(json!({ "completed": true })),
    )
    .await;

    let (_, stats) = app.send(Method::GET, "/api/stats", None).await;

    assert_eq!(stats["total"], 2);
    assert_eq!(stats["completed"], 1);
    assert_eq!(stats["active"], 1);
}

#[tokio::test]
async fn can_serve_health_and_json_not_found() {
    let app = TestApp::new().await;

    let (status, health) = app.send(Method::GET, "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "OK");

    let (status, error) = app.send(Method::GET, "/api/unknown", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["message"], "API endpoint not found");

    let (status, error) = app.send(Method::PATCH, "/api/tasks", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["message"], "API endpoint not found");
}
