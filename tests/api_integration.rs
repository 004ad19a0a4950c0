//! Integration tests for the orchestrator REST API.
//!
//! Each test spins up an Axum server on a random port and exercises the real
//! client-facing and worker-facing HTTP contract with reqwest.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::time::timeout;

use arith_dispatch::api::api_routes;
use arith_dispatch::config::OrchestratorConfig;
use arith_dispatch::scheduler::{ExpressionStatus, Scheduler};

/// Maximum time any test is allowed to run before we consider it hung.
const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Start an Axum server on a random port, return (base url, scheduler).
async fn start_server() -> (String, Arc<Scheduler>) {
    let scheduler = Scheduler::new(&OrchestratorConfig {
        cost_range_ms: 0..1,
        ..OrchestratorConfig::default()
    });
    let app = api_routes(Arc::clone(&scheduler));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // Give the server a moment to start accepting connections.
    tokio::time::sleep(Duration::from_millis(50)).await;

    (format!("http://127.0.0.1:{port}"), scheduler)
}

async fn calculate(base: &str, body: Value) -> reqwest::Response {
    reqwest::Client::new()
        .post(format!("{base}/api/v1/calculate"))
        .json(&body)
        .send()
        .await
        .unwrap()
}

async fn fetch_task(base: &str) -> reqwest::Response {
    reqwest::get(format!("{base}/internal/task")).await.unwrap()
}

async fn submit_result(base: &str, body: Value) -> reqwest::Response {
    reqwest::Client::new()
        .post(format!("{base}/internal/task"))
        .json(&body)
        .send()
        .await
        .unwrap()
}

// ── Health ───────────────────────────────────────────────────────────

#[tokio::test]
async fn health_endpoint() {
    timeout(TEST_TIMEOUT, async {
        let (base, _scheduler) = start_server().await;

        let resp = reqwest::get(format!("{base}/health")).await.unwrap();
        assert_eq!(resp.status(), 200);

        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "arith-dispatch");
        assert_eq!(body["stats"]["expressions"], 0);
    })
    .await
    .expect("test timed out");
}

// ── Client-facing ────────────────────────────────────────────────────

#[tokio::test]
async fn calculate_returns_created_id() {
    timeout(TEST_TIMEOUT, async {
        let (base, _scheduler) = start_server().await;

        let resp = calculate(&base, json!({"expression": "2 + 2"})).await;
        assert_eq!(resp.status(), 201);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["id"], 1);

        let resp = calculate(&base, json!({"expression": "3 * 3"})).await;
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["id"], 2);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn short_expression_is_unprocessable() {
    timeout(TEST_TIMEOUT, async {
        let (base, scheduler) = start_server().await;

        let resp = calculate(&base, json!({"expression": "2 +"})).await;
        assert_eq!(resp.status(), 422);
        let body: Value = resp.json().await.unwrap();
        assert!(body["error"].as_str().unwrap().contains("Invalid expression format"));

        assert!(scheduler.list_expressions().await.is_empty());
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn malformed_body_is_unprocessable() {
    timeout(TEST_TIMEOUT, async {
        let (base, _scheduler) = start_server().await;

        let resp = calculate(&base, json!({"expr": 42})).await;
        assert_eq!(resp.status(), 422);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["error"], "Invalid expression");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn list_expressions_hides_tasks() {
    timeout(TEST_TIMEOUT, async {
        let (base, _scheduler) = start_server().await;

        for expr in ["1 + 1", "2 * 3 - 1", "9 / 3"] {
            calculate(&base, json!({"expression": expr})).await;
        }

        let resp = reqwest::get(format!("{base}/api/v1/expressions"))
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        let expressions = body["expressions"].as_array().unwrap();
        assert_eq!(expressions.len(), 3);
        for (i, expr) in expressions.iter().enumerate() {
            assert_eq!(expr["id"], i as u64 + 1);
            assert_eq!(expr["status"], "pending");
            assert!(expr["result"].is_null());
            assert!(expr.get("tasks").is_none());
        }
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn unknown_expression_is_not_found() {
    timeout(TEST_TIMEOUT, async {
        let (base, _scheduler) = start_server().await;

        let resp = reqwest::get(format!("{base}/api/v1/expressions/42"))
            .await
            .unwrap();
        assert_eq!(resp.status(), 404);

        let resp = reqwest::get(format!("{base}/api/v1/expressions/abc"))
            .await
            .unwrap();
        assert_eq!(resp.status(), 404);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["error"], "Expression not found");
    })
    .await
    .expect("test timed out");
}

// ── Worker-facing ────────────────────────────────────────────────────

#[tokio::test]
async fn empty_queue_then_task_available() {
    timeout(TEST_TIMEOUT, async {
        let (base, _scheduler) = start_server().await;

        let resp = fetch_task(&base).await;
        assert_eq!(resp.status(), 404);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["error"], "No tasks available");

        calculate(&base, json!({"expression": "7 - 2"})).await;

        let resp = fetch_task(&base).await;
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        let task = &body["task"];
        assert_eq!(task["id"], 1);
        assert_eq!(task["arg1"], 7.0);
        assert_eq!(task["arg2"], 2.0);
        assert_eq!(task["operation"], "-");
        assert_eq!(task["operation_time"], 0);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn two_plus_two_round_trip() {
    timeout(TEST_TIMEOUT, async {
        let (base, _scheduler) = start_server().await;

        calculate(&base, json!({"expression": "2 + 2"})).await;
        let body: Value = fetch_task(&base).await.json().await.unwrap();
        let task_id = body["task"]["id"].as_u64().unwrap();

        let resp = submit_result(&base, json!({"id": task_id, "result": 4})).await;
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["message"], "Result saved");

        let body: Value = reqwest::get(format!("{base}/api/v1/expressions/1"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["expression"]["status"], "done");
        assert_eq!(body["expression"]["result"], 4.0);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn unknown_task_result_is_not_found() {
    timeout(TEST_TIMEOUT, async {
        let (base, scheduler) = start_server().await;
        calculate(&base, json!({"expression": "1 + 1"})).await;

        let resp = submit_result(&base, json!({"id": 77, "result": 1})).await;
        assert_eq!(resp.status(), 404);

        let views = scheduler.list_expressions().await;
        assert!(views[0].result.is_none());
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn malformed_result_is_unprocessable() {
    timeout(TEST_TIMEOUT, async {
        let (base, _scheduler) = start_server().await;

        let resp = submit_result(&base, json!({"id": "one", "result": 1})).await;
        assert_eq!(resp.status(), 422);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["error"], "Invalid data");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn result_without_value_is_unprocessable() {
    timeout(TEST_TIMEOUT, async {
        let (base, scheduler) = start_server().await;

        calculate(&base, json!({"expression": "2 + 2"})).await;
        let body: Value = fetch_task(&base).await.json().await.unwrap();
        let task_id = body["task"]["id"].as_u64().unwrap();

        let resp = submit_result(&base, json!({"id": task_id})).await;
        assert_eq!(resp.status(), 422);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["error"], "Invalid data");

        let view = scheduler.get_expression(1).await.unwrap();
        assert_eq!(view.status, ExpressionStatus::Pending);
        assert_eq!(view.result, None);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn undefined_result_is_visible_to_clients() {
    timeout(TEST_TIMEOUT, async {
        let (base, _scheduler) = start_server().await;

        calculate(&base, json!({"expression": "5 / 0"})).await;
        let body: Value = fetch_task(&base).await.json().await.unwrap();
        let task_id = body["task"]["id"].as_u64().unwrap();

        let resp = submit_result(&base, json!({"id": task_id, "result": "NaN"})).await;
        assert_eq!(resp.status(), 200);

        let body: Value = reqwest::get(format!("{base}/api/v1/expressions/1"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["expression"]["status"], "done");
        assert_eq!(body["expression"]["result"], "NaN");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn tree_mode_can_be_requested() {
    timeout(TEST_TIMEOUT, async {
        let (base, _scheduler) = start_server().await;

        let resp = calculate(&base, json!({"expression": "2 + 3 * 4", "mode": "tree"})).await;
        assert_eq!(resp.status(), 201);

        // Only the product is ready.
        let body: Value = fetch_task(&base).await.json().await.unwrap();
        assert_eq!(body["task"]["operation"], "*");
        assert_eq!(fetch_task(&base).await.status(), 404);

        let id = body["task"]["id"].as_u64().unwrap();
        submit_result(&base, json!({"id": id, "result": 12})).await;

        let body: Value = fetch_task(&base).await.json().await.unwrap();
        assert_eq!(body["task"]["operation"], "+");
        assert_eq!(body["task"]["arg1"], 2.0);
        assert_eq!(body["task"]["arg2"], 12.0);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn cors_allows_any_origin() {
    timeout(TEST_TIMEOUT, async {
        let (base, _scheduler) = start_server().await;

        let resp = reqwest::Client::new()
            .get(format!("{base}/api/v1/expressions"))
            .header("Origin", "http://localhost:3000")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        assert_eq!(
            resp.headers()
                .get("access-control-allow-origin")
                .and_then(|v| v.to_str().ok()),
            Some("*")
        );
    })
    .await
    .expect("test timed out");
}
