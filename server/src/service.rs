use std::{
    io,
    path::{Path, PathBuf},
};

use log::{error, info, warn};
use machine_learning::{
    MlErr, artifact,
    features::{FeatureVector, NUM_FEATURES},
    regressor::{MeanRegressor, Model, ModelKind, Regressor},
};
use ndarray::{Array1, Array2, arr2};
use serde::{Deserialize, Serialize};

use crate::{Result, ServiceErr};

/// What the fallback model predicts for every request.
pub const FALLBACK_PREDICTION: f64 = 12.5;

const FALLBACK_SAMPLES: usize = 10;
const FALLBACK_SEGMENT: FeatureVector = FeatureVector {
    distance: 50.0,
    elevation_gain: 100.0,
    vehicle_efficiency: 0.2,
    battery_capacity: 60.0,
};

/// The body of a prediction request.
pub type EnergyRequest = FeatureVector;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnergyResponse {
    pub predicted_energy_kwh: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResponse {
    pub predictions: Vec<EnergyResponse>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// Serving a trained model.
    Healthy,
    /// Serving the constant fallback.
    Degraded,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Health {
    pub status: HealthStatus,
    pub model_loaded: bool,
    pub model_kind: ModelKind,
    pub model_path: String,
}

/// Where the served model came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelSource {
    Artifact,
    Fallback,
}

/// Scores route segments with a single model fixed at construction.
///
/// The service is never mutated after startup, handlers share it behind an `Arc`.
#[derive(Debug)]
pub struct PredictionService {
    model: Model,
    source: ModelSource,
    model_path: PathBuf,
}

impl PredictionService {
    /// Creates a new `PredictionService`.
    ///
    /// # Arguments
    /// * `model` - The model used to score every request.
    /// * `source` - Where `model` came from, reported by `health`.
    /// * `model_path` - The artifact path, reported by `health`.
    pub fn new(model: Model, source: ModelSource, model_path: PathBuf) -> Self {
        Self {
            model,
            source,
            model_path,
        }
    }

    /// Loads the model artifact at `path`.
    ///
    /// A missing artifact isn't an error: the service falls back to a constant model
    /// predicting `FALLBACK_PREDICTION`.
    ///
    /// # Returns
    /// The service or an error if the artifact exists but couldn't be loaded.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        match artifact::load(path) {
            Ok(model) => Ok(Self::new(model, ModelSource::Artifact, path.to_path_buf())),
            Err(MlErr::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                warn!(
                    "no model found at {}, serving a constant prediction of {FALLBACK_PREDICTION} kWh",
                    path.display()
                );
                Self::fallback(path)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Creates a service backed by the constant fallback model.
    pub fn fallback<P: AsRef<Path>>(path: P) -> Result<Self> {
        let row = FALLBACK_SEGMENT.to_row();
        let x = Array2::from_shape_fn((FALLBACK_SAMPLES, NUM_FEATURES), |(_, j)| row[j]);
        let y = Array1::from_elem(FALLBACK_SAMPLES, FALLBACK_PREDICTION);

        let mut model = MeanRegressor::new();
        model.fit(x.view(), y.view())?;

        Ok(Self::new(
            model.into(),
            ModelSource::Fallback,
            path.as_ref().to_path_buf(),
        ))
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn source(&self) -> ModelSource {
        self.source
    }

    /// Predicts the energy consumption of a single segment.
    ///
    /// # Returns
    /// The non negative prediction, `ServiceErr::InvalidInput` if the segment violates
    /// a constraint or `ServiceErr::Prediction` if the model failed.
    pub fn predict(
        &self,
        request: &EnergyRequest,
    ) -> std::result::Result<EnergyResponse, ServiceErr> {
        validate(request)?;

        let predictions = self
            .score(std::slice::from_ref(request))
            .map_err(|e| {
                error!("prediction failed for {request:?}: {e}");
                ServiceErr::Prediction(e.to_string())
            })?;

        let Some(&prediction) = predictions.first() else {
            error!("prediction failed for {request:?}: the model returned no prediction");
            return Err(ServiceErr::Prediction("the model returned no prediction".to_string()));
        };

        info!(
            "prediction for {request:?}: {:.4} kWh",
            prediction.predicted_energy_kwh
        );
        Ok(prediction)
    }

    /// Predicts every segment of a batch, in order.
    ///
    /// Every segment is validated before scoring any of them: a single invalid segment
    /// rejects the whole batch. Model failures are `ServiceErr::BatchPrediction`.
    pub fn predict_batch(
        &self,
        requests: &[EnergyRequest],
    ) -> std::result::Result<BatchResponse, ServiceErr> {
        for (i, request) in requests.iter().enumerate() {
            validate(request).inspect_err(|e| warn!("rejected batch at segment {i}: {e}"))?;
        }

        let predictions = self.score(requests).map_err(|e| {
            error!("batch prediction failed for {} segments: {e}", requests.len());
            ServiceErr::BatchPrediction(e.to_string())
        })?;
        info!(segments = predictions.len(); "batch prediction");
        Ok(BatchResponse { predictions })
    }

    pub fn health(&self) -> Health {
        let status = match self.source {
            ModelSource::Artifact => HealthStatus::Healthy,
            ModelSource::Fallback => HealthStatus::Degraded,
        };

        Health {
            status,
            model_loaded: true,
            model_kind: self.model.kind(),
            model_path: self.model_path.display().to_string(),
        }
    }

    /// Scores already validated segments, clamping negative predictions to zero.
    fn score(
        &self,
        requests: &[EnergyRequest],
    ) -> std::result::Result<Vec<EnergyResponse>, MlErr> {
        if requests.is_empty() {
            return Ok(Vec::new());
        }

        let rows: Vec<_> = requests.iter().map(FeatureVector::to_row).collect();
        let predictions = self.model.predict(arr2(&rows).view())?;

        Ok(predictions
            .iter()
            .map(|p| EnergyResponse {
                predicted_energy_kwh: p.max(0.0),
            })
            .collect())
    }
}

fn validate(request: &EnergyRequest) -> std::result::Result<(), ServiceErr> {
    request
        .validate()
        .map_err(|reason| ServiceErr::InvalidInput(reason.to_string()))
}
