//! End-to-end exercise of the HTTP contract against the in-process router.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use geofleet::{Config, DriverManager};
use geofleet_server::router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

async fn app() -> Router {
    let manager = DriverManager::new(Config::default()).await.unwrap();
    router(Arc::new(manager))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = match body {
        Some(body) => Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    (status, value)
}

fn add_body(id: &str, lat: f64, lng: f64, status: &str) -> Value {
    json!({
        "id": id,
        "location": {"lat": lat, "lng": lng},
        "status": status,
        "rating": 4.5
    })
}

#[tokio::test]
async fn add_search_and_stats_round_trip() {
    let app = app().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/drivers",
        Some(add_body("d1", 18.95, 72.95, "available")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "d1");
    assert_eq!(body["message"], "Driver added successfully");

    send(
        &app,
        Method::POST,
        "/drivers",
        Some(add_body("d2", 18.96, 72.96, "busy")),
    )
    .await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/drivers/search",
        Some(json!({"location": {"lat": 18.95, "lng": 72.95}, "radius": 5.0})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["index_type"], "quadtree");
    assert_eq!(body["count"], 1);
    assert_eq!(body["drivers"][0]["driver"]["id"], "d1");
    assert_eq!(body["drivers"][0]["distance"], 0.0);
    assert!(body["duration"].is_string());

    let (status, body) = send(&app, Method::GET, "/stats", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_drivers"], 2);
    assert_eq!(body["available_drivers"], 1);
    assert_eq!(body["busy_drivers"], 1);
    assert_eq!(body["offline_drivers"], 0);
    assert_eq!(body["grid_stats"]["total_drivers"], 2);
    assert!(body.get("redis_stats").is_none());
}

#[tokio::test]
async fn out_of_bounds_add_returns_500() {
    let app = app().await;
    let (status, _) = send(
        &app,
        Method::POST,
        "/drivers",
        Some(add_body("d1", 18.9220, 72.8347, "available")),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let (status, body) = send(&app, Method::GET, "/stats", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_drivers"], 0);
}

#[tokio::test]
async fn malformed_bodies_return_400() {
    let app = app().await;
    let (status, _) = send(
        &app,
        Method::POST,
        "/drivers",
        Some(json!({"id": "d1", "status": "parked"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn wrong_method_returns_405() {
    let app = app().await;
    let (status, _) = send(&app, Method::GET, "/drivers/search", None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    let (status, _) = send(
        &app,
        Method::POST,
        "/drivers/status",
        Some(json!({"driver_id": "d1", "status": "busy"})),
    )
    .await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn updates_against_unknown_driver_return_404() {
    let app = app().await;
    let (status, _) = send(
        &app,
        Method::PUT,
        "/drivers/location",
        Some(json!({"driver_id": "ghost", "lat": 18.95, "lng": 72.95})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        Method::PUT,
        "/drivers/status",
        Some(json!({"driver_id": "ghost", "status": "busy"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_index_choices_return_400() {
    let app = app().await;
    let search = |index: &str| {
        json!({
            "location": {"lat": 18.95, "lng": 72.95},
            "radius": 2.0,
            "index_type": index
        })
    };

    let (status, _) = send(&app, Method::POST, "/drivers/search", Some(search("rtree"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // The cache is not enabled, so asking for it is an invalid argument.
    let (status, _) = send(&app, Method::POST, "/drivers/search", Some(search("redis"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn location_and_status_updates_flow_through_search() {
    let app = app().await;
    send(
        &app,
        Method::POST,
        "/drivers",
        Some(add_body("d1", 18.60, 72.90, "available")),
    )
    .await;

    let (status, _) = send(
        &app,
        Method::PUT,
        "/drivers/location",
        Some(json!({"driver_id": "d1", "lat": 18.95, "lng": 72.95})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(
        &app,
        Method::POST,
        "/drivers/search",
        Some(json!({"location": {"lat": 18.60, "lng": 72.90}, "radius": 1.0, "index_type": "grid"})),
    )
    .await;
    assert_eq!(body["count"], 0);

    let (_, body) = send(
        &app,
        Method::POST,
        "/drivers/search",
        Some(json!({"location": {"lat": 18.95, "lng": 72.95}, "radius": 1.0, "index_type": "grid"})),
    )
    .await;
    assert_eq!(body["count"], 1);

    let (status, _) = send(
        &app,
        Method::PUT,
        "/drivers/status",
        Some(json!({"driver_id": "d1", "status": "offline"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(
        &app,
        Method::POST,
        "/drivers/search",
        Some(json!({"location": {"lat": 18.95, "lng": 72.95}, "radius": 1.0})),
    )
    .await;
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn compare_reports_both_in_memory_indexes() {
    let app = app().await;
    for i in 0..20 {
        send(
            &app,
            Method::POST,
            "/drivers",
            Some(add_body(
                &format!("d{i}"),
                18.90 + (i as f64) * 0.002,
                72.93,
                "available",
            )),
        )
        .await;
    }

    let (status, body) = send(
        &app,
        Method::POST,
        "/drivers/compare",
        Some(json!({"location": {"lat": 18.92, "lng": 72.93}, "radius": 3.0})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["quadtree"]["count"], body["grid"]["count"]);
    assert!(body["quadtree"]["duration"].is_string());
    assert!(body.get("redis").is_none());
}

#[tokio::test]
async fn health_answers_ok() {
    let app = app().await;
    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("OK".into()));
}
