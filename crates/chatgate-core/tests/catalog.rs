mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::*;

fn app() -> TestGateway {
    gateway(config("http://127.0.0.1:9", Some("sk-test")))
}

#[tokio::test]
async fn tags_list_routed_models_in_order() {
    let gw = app();
    let response = send(&gw.app, get("/api/tags")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let models = body["models"].as_array().unwrap();
    let names: Vec<_> = models.iter().map(|m| m["name"].as_str().unwrap()).collect();
    assert_eq!(names, ["gemini-2.0-flash", "gpt-4.1", "llama-3.3-70b-versatile"]);
    assert!(models.iter().all(|m| m["size"] == 0));
    assert!(models.iter().all(|m| m["modified_at"] == models[0]["modified_at"]));
}

#[tokio::test]
async fn show_reads_name_from_query() {
    let gw = app();
    let response = send(&gw.app, get("/api/show?name=llama-3.3-70b-versatile")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["model"], "llama-3.3-70b-versatile");
    assert_eq!(body["details"]["family"], "groq");
    assert_eq!(body["details"]["parameters"], 0);
}

#[tokio::test]
async fn show_reads_model_from_body() {
    let gw = app();
    let response = send(&gw.app, post_json("/v1/api/show", &json!({"model": "gemini-2.0-flash"}))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["details"]["family"], "gemini");

    let response = send(&gw.app, post_json("/api/show", &json!({"name": "some-local-model"}))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["details"]["family"], "openai");
}

#[tokio::test]
async fn show_without_name_is_rejected() {
    let gw = app();
    let response = send(&gw.app, get("/api/show")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(&gw.app, post_json("/api/show", &json!({"name": "  "}))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"]["type"], "invalid_request_error");
}

#[tokio::test]
async fn unknown_endpoint_is_json_not_found() {
    let gw = app();
    let response = send(&gw.app, get("/api/ps")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"], "endpoint not found: /api/ps");
    assert_eq!(body["method"], "GET");
    assert_eq!(body["path"], "/api/ps");
}
