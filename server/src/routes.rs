use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    routing::{get, post},
};
use serde_json::{Value, json};

use crate::{
    ServiceErr,
    service::{BatchResponse, EnergyRequest, EnergyResponse, Health, PredictionService},
};

type AppState = State<Arc<PredictionService>>;

/// Builds the HTTP surface of `service`.
pub fn router(service: Arc<PredictionService>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/predict-energy", post(predict_energy))
        .route("/predict-batch", post(predict_batch))
        .with_state(service)
}

async fn root() -> Json<Value> {
    Json(json!({ "message": "EV Energy Consumption Prediction API is running" }))
}

async fn health(State(service): AppState) -> Json<Health> {
    Json(service.health())
}

async fn predict_energy(
    State(service): AppState,
    payload: Result<Json<EnergyRequest>, JsonRejection>,
) -> Result<Json<EnergyResponse>, ServiceErr> {
    let Json(request) = payload?;
    service.predict(&request).map(Json)
}

async fn predict_batch(
    State(service): AppState,
    payload: Result<Json<Vec<EnergyRequest>>, JsonRejection>,
) -> Result<Json<BatchResponse>, ServiceErr> {
    let Json(requests) = payload?;
    service.predict_batch(&requests).map(Json)
}
