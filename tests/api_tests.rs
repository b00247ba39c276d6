use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::Utc;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tower::ServiceExt;

use taskmaster::api::{self, ApiState};
use taskmaster::scheduler::{SchedulerEngine, SchedulerKind};

/// Build a router over a fresh engine, keeping the engine handle so tests
/// can drive lifecycle ticks directly.
fn test_app() -> (Arc<RwLock<SchedulerEngine>>, Router) {
    let engine = Arc::new(RwLock::new(SchedulerEngine::new(SchedulerKind::Fifo)));
    let app = api::router(ApiState {
        engine: engine.clone(),
    });
    (engine, app)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_empty(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let (_engine, app) = test_app();

    let response = app.oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_add_node_returns_created_node() {
    let (_engine, app) = test_app();

    let response = app.clone().oneshot(post_empty("/add_node")).await.unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = json_body(response).await;
    assert_eq!(json["message"], "Node added");
    assert_eq!(json["node"]["id"], 1);
    assert_eq!(json["node"]["task_count"], 0);
    assert!(json["node"]["task_ids"].as_array().unwrap().is_empty());

    let response = app.oneshot(get("/nodes")).await.unwrap();
    let json = json_body(response).await;
    assert_eq!(json.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_remove_node_then_listing_shrinks() {
    let (_engine, app) = test_app();
    app.clone().oneshot(post_empty("/add_node")).await.unwrap();
    app.clone().oneshot(post_empty("/add_node")).await.unwrap();

    let response = app
        .clone()
        .oneshot(post_json("/remove_node", json!({ "node_id": 1 })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["message"], "Node removed");

    let response = app.oneshot(get("/nodes")).await.unwrap();
    let json = json_body(response).await;
    let nodes = json.as_array().unwrap();
    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0]["id"], 2);
}

#[tokio::test]
async fn test_remove_node_unknown_returns_404() {
    let (_engine, app) = test_app();

    let response = app
        .oneshot(post_json("/remove_node", json!({ "node_id": 99 })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = json_body(response).await;
    assert!(json["error"]
        .as_str()
        .unwrap()
        .contains("Node not found: 99"));
}

#[tokio::test]
async fn test_remove_node_missing_field_returns_400() {
    let (_engine, app) = test_app();

    let response = app
        .oneshot(post_json("/remove_node", json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert!(json["error"].as_str().unwrap().contains("Missing node id"));
}

#[tokio::test]
async fn test_add_task_assigns_to_node() {
    let (_engine, app) = test_app();
    app.clone().oneshot(post_empty("/add_node")).await.unwrap();

    let response = app
        .clone()
        .oneshot(post_json(
            "/add_task",
            json!({ "name": "T1", "duration": 5 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = json_body(response).await;
    assert_eq!(json["message"], "Task added");
    assert_eq!(json["task"]["id"], 1);
    assert_eq!(json["task"]["name"], "T1");
    assert_eq!(json["task"]["duration"], 5);
    assert_eq!(json["task"]["status"], 0);

    let response = app.oneshot(get("/nodes")).await.unwrap();
    let json = json_body(response).await;
    assert_eq!(json[0]["task_count"], 1);
    assert_eq!(json[0]["task_ids"][0], 1);
}

#[tokio::test]
async fn test_add_task_without_nodes_still_created() {
    let (_engine, app) = test_app();

    let response = app
        .clone()
        .oneshot(post_json(
            "/add_task",
            json!({ "name": "waiting", "duration": 3 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app.oneshot(get("/db_stats")).await.unwrap();
    let json = json_body(response).await;
    assert_eq!(json["total_tasks"], 1);
    assert_eq!(json["pending_tasks"], 1);
    assert_eq!(json["total_nodes"], 0);
}

#[tokio::test]
async fn test_add_task_missing_fields_returns_400() {
    let (_engine, app) = test_app();

    for body in [json!({ "duration": 5 }), json!({ "name": "T1" }), json!({})] {
        let response = app
            .clone()
            .oneshot(post_json("/add_task", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_body(response).await;
        assert!(json["error"]
            .as_str()
            .unwrap()
            .contains("Missing task name or duration"));
    }

    // Nothing leaked into the store.
    let response = app.oneshot(get("/db_stats")).await.unwrap();
    let json = json_body(response).await;
    assert_eq!(json["total_tasks"], 0);
}

#[tokio::test]
async fn test_add_task_invalid_values_return_400() {
    let (_engine, app) = test_app();
    app.clone().oneshot(post_empty("/add_node")).await.unwrap();

    let response = app
        .clone()
        .oneshot(post_json("/add_task", json!({ "name": "", "duration": 5 })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(post_json("/add_task", json!({ "name": "T1", "duration": 0 })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.oneshot(get("/db_stats")).await.unwrap();
    let json = json_body(response).await;
    assert_eq!(json["total_tasks"], 0);
}

#[tokio::test]
async fn test_add_task_negative_duration_returns_400() {
    let (_engine, app) = test_app();
    app.clone().oneshot(post_empty("/add_node")).await.unwrap();

    // -3 fails u32 deserialization inside the extractor; the reply must
    // still be the JSON envelope, not a framework rejection.
    let response = app
        .clone()
        .oneshot(post_json(
            "/add_task",
            json!({ "name": "T1", "duration": -3 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert!(json["error"].as_str().unwrap().contains("duration"));

    let response = app.oneshot(get("/db_stats")).await.unwrap();
    let json = json_body(response).await;
    assert_eq!(json["total_tasks"], 0);
}

#[tokio::test]
async fn test_remove_node_malformed_body_returns_400() {
    let (_engine, app) = test_app();
    app.clone().oneshot(post_empty("/add_node")).await.unwrap();

    let response = app
        .clone()
        .oneshot(post_json("/remove_node", json!({ "node_id": "one" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert!(json["error"].as_str().unwrap().contains("node_id"));

    let response = app.oneshot(get("/nodes")).await.unwrap();
    let json = json_body(response).await;
    assert_eq!(json.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_tasks_listed_in_creation_order() {
    let (_engine, app) = test_app();
    app.clone().oneshot(post_empty("/add_node")).await.unwrap();
    for name in ["first", "second"] {
        app.clone()
            .oneshot(post_json(
                "/add_task",
                json!({ "name": name, "duration": 2 }),
            ))
            .await
            .unwrap();
    }

    let response = app.oneshot(get("/tasks")).await.unwrap();
    let json = json_body(response).await;
    let tasks = json.as_array().unwrap();
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0]["id"], 1);
    assert_eq!(tasks[0]["name"], "first");
    assert_eq!(tasks[1]["id"], 2);
    assert_eq!(tasks[1]["name"], "second");
}

#[tokio::test]
async fn test_scheduler_info_defaults_to_fifo() {
    let (_engine, app) = test_app();

    let response = app.oneshot(get("/scheduler_info")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["type"], "fifo");
    assert_eq!(json["name"], "FIFO");
}

#[tokio::test]
async fn test_set_scheduler_switches_policy() {
    let (_engine, app) = test_app();

    let response = app
        .clone()
        .oneshot(post_json("/set_scheduler", json!({ "type": "loadbalanced" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["type"], "loadbalanced");
    assert_eq!(json["name"], "LoadBalanced");

    let response = app.oneshot(get("/scheduler_info")).await.unwrap();
    let json = json_body(response).await;
    assert_eq!(json["type"], "loadbalanced");
}

#[tokio::test]
async fn test_set_scheduler_unknown_type_keeps_previous() {
    let (_engine, app) = test_app();

    let response = app
        .clone()
        .oneshot(post_json("/set_scheduler", json!({ "type": "priority" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert!(json["error"].as_str().unwrap().contains("priority"));

    let response = app.oneshot(get("/scheduler_info")).await.unwrap();
    let json = json_body(response).await;
    assert_eq!(json["type"], "fifo");
}

#[tokio::test]
async fn test_set_scheduler_missing_type_returns_400() {
    let (_engine, app) = test_app();

    let response = app
        .oneshot(post_json("/set_scheduler", json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert!(json["error"]
        .as_str()
        .unwrap()
        .contains("Missing scheduler type"));
}

#[tokio::test]
async fn test_db_stats_empty_engine() {
    let (_engine, app) = test_app();

    let response = app.oneshot(get("/db_stats")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["total_tasks"], 0);
    assert_eq!(json["pending_tasks"], 0);
    assert_eq!(json["running_tasks"], 0);
    assert_eq!(json["completed_tasks"], 0);
    assert_eq!(json["total_nodes"], 0);
}

#[tokio::test]
async fn test_db_stats_follows_task_lifecycle() {
    let (engine, app) = test_app();
    app.clone().oneshot(post_empty("/add_node")).await.unwrap();
    app.clone()
        .oneshot(post_json("/add_task", json!({ "name": "T1", "duration": 1 })))
        .await
        .unwrap();

    let response = app.clone().oneshot(get("/db_stats")).await.unwrap();
    let json = json_body(response).await;
    assert_eq!(json["pending_tasks"], 1);
    assert_eq!(json["total_nodes"], 1);

    // Drive the clock forward instead of sleeping.
    let t0 = Utc::now();
    engine.write().await.advance_clock(t0);

    let response = app.clone().oneshot(get("/db_stats")).await.unwrap();
    let json = json_body(response).await;
    assert_eq!(json["running_tasks"], 1);

    engine
        .write()
        .await
        .advance_clock(t0 + chrono::Duration::seconds(1));

    let response = app.clone().oneshot(get("/db_stats")).await.unwrap();
    let json = json_body(response).await;
    assert_eq!(json["completed_tasks"], 1);
    assert_eq!(json["total_tasks"], 1);

    let response = app.oneshot(get("/tasks")).await.unwrap();
    let json = json_body(response).await;
    assert_eq!(json[0]["status"], 2);
}

#[tokio::test]
async fn test_round_robin_distribution_over_api() {
    let (_engine, app) = test_app();
    app.clone()
        .oneshot(post_json("/set_scheduler", json!({ "type": "roundrobin" })))
        .await
        .unwrap();
    app.clone().oneshot(post_empty("/add_node")).await.unwrap();
    app.clone().oneshot(post_empty("/add_node")).await.unwrap();

    for i in 0..4 {
        app.clone()
            .oneshot(post_json(
                "/add_task",
                json!({ "name": format!("t{i}"), "duration": 5 }),
            ))
            .await
            .unwrap();
    }

    let response = app.oneshot(get("/nodes")).await.unwrap();
    let json = json_body(response).await;
    let nodes = json.as_array().unwrap();
    assert_eq!(nodes[0]["task_count"], 2);
    assert_eq!(nodes[1]["task_count"], 2);
    assert_eq!(nodes[0]["task_ids"], json!([1, 3]));
    assert_eq!(nodes[1]["task_ids"], json!([2, 4]));
}
