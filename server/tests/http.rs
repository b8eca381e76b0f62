use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
};
use http_body_util::BodyExt;
use machine_learning::{
    artifact,
    regressor::{LinearRegression, Model, Regressor},
};
use ndarray::Array2;
use serde_json::{Value, json};
use server::{PredictionService, router};
use tower::ServiceExt;

fn fallback_app() -> axum::Router {
    router(Arc::new(PredictionService::fallback("energy_model.json").unwrap()))
}

async fn send(app: axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response: Response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn segment(distance: f64, battery_capacity: f64) -> Value {
    json!({
        "distance": distance,
        "elevation_gain": 100.0,
        "vehicle_efficiency": 0.2,
        "battery_capacity": battery_capacity,
    })
}

#[tokio::test]
async fn root_reports_the_api_is_running() {
    let (status, body) = send(fallback_app(), get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "message": "EV Energy Consumption Prediction API is running" })
    );
}

#[tokio::test]
async fn fallback_predicts_the_constant_end_to_end() {
    let (status, body) = send(
        fallback_app(),
        post_json("/predict-energy", segment(50.0, 60.0)),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "predicted_energy_kwh": 12.5 }));
}

#[tokio::test]
async fn invalid_distance_is_a_bad_request() {
    let (status, body) = send(
        fallback_app(),
        post_json("/predict-energy", segment(0.0, 60.0)),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "detail": "Distance must be positive" }));
}

#[tokio::test]
async fn invalid_battery_is_a_bad_request() {
    let (status, body) = send(
        fallback_app(),
        post_json("/predict-energy", segment(10.0, -1.0)),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "detail": "Battery capacity must be positive" }));
}

#[tokio::test]
async fn missing_fields_are_rejected_before_scoring() {
    let (status, body) = send(
        fallback_app(),
        post_json("/predict-energy", json!({ "distance": 10.0 })),
    )
    .await;

    assert!(status.is_client_error());
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn batch_keeps_the_input_order() {
    let (status, body) = send(
        fallback_app(),
        post_json(
            "/predict-batch",
            json!([segment(5.0, 60.0), segment(80.0, 40.0)]),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "predictions": [
                { "predicted_energy_kwh": 12.5 },
                { "predicted_energy_kwh": 12.5 },
            ]
        })
    );
}

#[tokio::test]
async fn batch_with_an_invalid_segment_fails_entirely() {
    let (status, body) = send(
        fallback_app(),
        post_json(
            "/predict-batch",
            json!([segment(5.0, 60.0), segment(-5.0, 60.0)]),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "detail": "Distance must be positive" }));
}

#[tokio::test]
async fn health_of_the_fallback_is_degraded() {
    let (status, body) = send(fallback_app(), get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["model_loaded"], true);
    assert_eq!(body["model_kind"], "constant");
    assert_eq!(body["model_path"], "energy_model.json");
}

#[tokio::test]
async fn trained_artifact_is_served() {
    // energy = distance * 0.25
    let x = Array2::from_shape_fn((30, 4), |(i, j)| match j {
        0 => 1.0 + i as f64 * 3.0,
        1 => (i % 4) as f64 * 10.0,
        2 => 0.1 + (i % 3) as f64 * 0.05,
        _ => 40.0 + (i % 5) as f64 * 10.0,
    });
    let y = x.column(0).mapv(|d| d * 0.25);
    let mut linear = LinearRegression::new();
    linear.fit(x.view(), y.view()).unwrap();

    let path = std::env::temp_dir().join(format!("server-http-{}.json", std::process::id()));
    artifact::save(&Model::from(linear), &path).unwrap();
    let service = PredictionService::load(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    let app = router(Arc::new(service));

    let (status, health) = send(app.clone(), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["model_kind"], "linear");

    let (status, body) = send(app, post_json("/predict-energy", segment(40.0, 60.0))).await;
    assert_eq!(status, StatusCode::OK);
    let predicted = body["predicted_energy_kwh"].as_f64().unwrap();
    assert!((predicted - 10.0).abs() < 1e-6, "predicted {predicted}");
}

#[tokio::test]
async fn model_failures_are_internal_errors() {
    let service = PredictionService::new(
        LinearRegression::new().into(),
        server::service::ModelSource::Artifact,
        "energy_model.json".into(),
    );

    let (status, body) = send(
        router(Arc::new(service)),
        post_json("/predict-energy", segment(10.0, 60.0)),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let detail = body["detail"].as_str().unwrap();
    assert!(detail.starts_with("Prediction failed: "), "{detail}");
}

#[tokio::test]
async fn batch_model_failures_are_internal_errors() {
    let service = PredictionService::new(
        LinearRegression::new().into(),
        server::service::ModelSource::Artifact,
        "energy_model.json".into(),
    );

    let (status, body) = send(
        router(Arc::new(service)),
        post_json("/predict-batch", json!([segment(10.0, 60.0)])),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let detail = body["detail"].as_str().unwrap();
    assert!(detail.starts_with("Batch prediction failed: "), "{detail}");
}
