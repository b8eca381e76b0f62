use std::{error::Error, fmt, io};

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use machine_learning::MlErr;
use serde_json::json;

/// The server module's result type.
pub type Result<T> = std::result::Result<T, ServerErr>;

/// Failures that keep the server from starting or running.
#[derive(Debug)]
pub enum ServerErr {
    Io(io::Error),
    Model(MlErr),
    InvalidVar {
        var: &'static str,
        value: String,
        reason: String,
    },
}

impl fmt::Display for ServerErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerErr::Io(e) => write!(f, "io error: {e}"),
            ServerErr::Model(e) => write!(f, "couldn't load the model: {e}"),
            ServerErr::InvalidVar { var, value, reason } => {
                write!(f, "invalid value {value:?} for {var}: {reason}")
            }
        }
    }
}

impl Error for ServerErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ServerErr::Io(e) => Some(e),
            ServerErr::Model(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ServerErr {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<MlErr> for ServerErr {
    fn from(value: MlErr) -> Self {
        Self::Model(value)
    }
}

/// Failures of a single request, rendered as `{"detail": ...}` bodies.
#[derive(Debug)]
pub enum ServiceErr {
    /// The request violates a feature constraint, it won't succeed if retried.
    InvalidInput(String),
    /// The body couldn't be decoded into a request.
    MalformedBody(JsonRejection),
    /// The model failed to score a valid request.
    Prediction(String),
    /// The model failed to score a valid batch.
    BatchPrediction(String),
}

impl ServiceErr {
    pub fn status(&self) -> StatusCode {
        match self {
            ServiceErr::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ServiceErr::MalformedBody(rejection) => rejection.status(),
            ServiceErr::Prediction(_) | ServiceErr::BatchPrediction(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl fmt::Display for ServiceErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceErr::InvalidInput(e) => write!(f, "{e}"),
            ServiceErr::MalformedBody(rejection) => write!(f, "{}", rejection.body_text()),
            ServiceErr::Prediction(e) => write!(f, "Prediction failed: {e}"),
            ServiceErr::BatchPrediction(e) => write!(f, "Batch prediction failed: {e}"),
        }
    }
}

impl Error for ServiceErr {}

impl From<JsonRejection> for ServiceErr {
    fn from(value: JsonRejection) -> Self {
        Self::MalformedBody(value)
    }
}

impl From<MlErr> for ServiceErr {
    fn from(value: MlErr) -> Self {
        Self::Prediction(value.to_string())
    }
}

impl IntoResponse for ServiceErr {
    fn into_response(self) -> Response {
        let body = Json(json!({ "detail": self.to_string() }));
        (self.status(), body).into_response()
    }
}
