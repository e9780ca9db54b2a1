//! HTTP routes driven through the router without a socket

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use frontdesk::oracle::NullOracle;
use frontdesk::store::SharedStorage;
use frontdesk::{EscalationQueue, HelpDesk, KnowledgeStore, MemoryStore, OracleAdapter};

fn app() -> Router {
    let storage: SharedStorage = Arc::new(MemoryStore::new());
    let desk = HelpDesk::new(
        KnowledgeStore::new(storage.clone()),
        EscalationQueue::new(storage),
        OracleAdapter::new(Arc::new(NullOracle), Duration::from_secs(1)),
    );
    frontdesk::server::router(Arc::new(desk))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn test_ask_escalate_resolve_then_answer() {
    let app = app();

    let (status, body) = send(&app, "POST", "/ask", Some(json!({"question": "What are your hours?"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["escalated"], json!(true));
    let id = body["request_id"].as_str().unwrap().to_string();

    let (status, pending) = send(&app, "GET", "/requests", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pending.as_array().unwrap().len(), 1);
    assert_eq!(pending[0]["status"], json!("pending"));

    let uri = format!("/requests/{}", id);
    let (status, body) = send(&app, "POST", &uri, Some(json!({"answer": "9am-6pm daily"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["request"]["status"], json!("resolved"));

    let (status, body) = send(&app, "POST", "/ask", Some(json!({"question": "what are your hours?"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["answer"], json!("9am-6pm daily"));
    assert_eq!(body["source"], json!("knowledge"));

    let (_, knowledge) = send(&app, "GET", "/knowledge", None).await;
    assert_eq!(knowledge.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_error_statuses() {
    let app = app();

    let (status, body) = send(&app, "POST", "/ask", Some(json!({"question": "  "}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));

    let (status, _) = send(&app, "GET", "/requests/missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "POST", "/requests/missing", Some(json!({"answer": "x"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = send(&app, "POST", "/ask", Some(json!({"question": "Gift cards?"}))).await;
    let uri = format!("/help-response/{}", body["request_id"].as_str().unwrap());

    let (status, _) = send(&app, "POST", &uri, Some(json!({"answer": ""}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "POST", &uri, Some(json!({"answer": "Yes"}))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, "POST", &uri, Some(json!({"answer": "No"}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("already resolved"));
}

#[tokio::test]
async fn test_request_listing_filters_and_status() {
    let app = app();
    send(&app, "POST", "/ask", Some(json!({"question": "One?"}))).await;
    let (_, body) = send(&app, "POST", "/ask", Some(json!({"question": "Two?"}))).await;
    let uri = format!("/requests/{}", body["request_id"].as_str().unwrap());
    send(&app, "POST", &uri, Some(json!({"answer": "Two!"}))).await;

    let (_, all) = send(&app, "GET", "/requests?status=all", None).await;
    assert_eq!(all.as_array().unwrap().len(), 2);

    let (_, resolved) = send(&app, "GET", "/requests?status=resolved", None).await;
    assert_eq!(resolved.as_array().unwrap().len(), 1);

    let (_, legacy) = send(&app, "GET", "/help-requests", None).await;
    assert_eq!(legacy.as_array().unwrap().len(), 1);
    assert_eq!(legacy[0]["question"], json!("One?"));

    let (status, _) = send(&app, "GET", "/requests?status=bogus", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, stats) = send(&app, "GET", "/api/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["pending_requests"], json!(1));
    assert_eq!(stats["resolved_requests"], json!(1));
    assert_eq!(stats["knowledge_entries"], json!(1));
}
