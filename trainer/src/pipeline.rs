use log::info;
use ndarray::arr2;
use serde::Serialize;

use machine_learning::{
    artifact,
    dataset::Dataset,
    features::{FEATURE_NAMES, FeatureVector},
    metrics::Metrics,
    regressor::{LinearRegression, Model, ModelKind, RandomForest, Regressor},
    synth,
};

use crate::{Result, TrainingConfig};

/// The segment scored with the reloaded artifact at the end of every run.
pub const SAMPLE_SEGMENT: FeatureVector = FeatureVector {
    distance: 50.0,
    elevation_gain: 100.0,
    vehicle_efficiency: 0.2,
    battery_capacity: 60.0,
};

/// The outcome of a training run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrainingReport {
    pub linear: Metrics,
    pub forest: Metrics,
    pub selected: ModelKind,
    /// The reloaded model's raw prediction for `SAMPLE_SEGMENT`.
    pub sample_prediction: f64,
}

/// Synthesizes data, fits every candidate model, and persists the best one.
pub struct Pipeline {
    config: TrainingConfig,
}

impl Pipeline {
    /// Creates a new `Pipeline`.
    pub fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Runs the whole pipeline to completion.
    ///
    /// The candidate with the highest test R² is written to the configured model path,
    /// the linear model winning ties. The artifact is then read back and used to score
    /// `SAMPLE_SEGMENT`.
    ///
    /// # Returns
    /// The evaluation report or the first error found, saving included.
    pub fn run(&self) -> Result<TrainingReport> {
        let TrainingConfig {
            synth: synth_config,
            test_size,
            split_seed,
            forest,
            model_path,
        } = &self.config;

        info!(
            samples = synth_config.samples.get(),
            seed = synth_config.seed;
            "generating synthetic dataset"
        );
        let dataset = synth::generate(synth_config)?;
        let (train, test) = dataset.split(*test_size, *split_seed)?;
        info!(train = train.len(), test = test.len(); "split dataset");

        let (linear, linear_metrics) = fit_and_evaluate(LinearRegression::new(), &train, &test)?;
        info!("{}: {linear_metrics}", ModelKind::Linear);

        let (forest, forest_metrics) = fit_and_evaluate(RandomForest::new(*forest), &train, &test)?;
        info!("{}: {forest_metrics}", ModelKind::Forest);
        log_importances(&forest);

        let (model, metrics) = select_best(
            (Model::from(linear), linear_metrics),
            [(Model::from(forest), forest_metrics)],
        );

        info!("selected {} with R² {:.4}", model.kind(), metrics.r2);
        artifact::save(&model, model_path)?;

        let reloaded = artifact::load(model_path)?;
        let sample = reloaded.predict(arr2(&[SAMPLE_SEGMENT.to_row()]).view())?;
        let sample_prediction = sample[0];
        info!("sample prediction for {SAMPLE_SEGMENT:?}: {sample_prediction:.2} kWh");

        Ok(TrainingReport {
            linear: linear_metrics,
            forest: forest_metrics,
            selected: reloaded.kind(),
            sample_prediction,
        })
    }
}

fn fit_and_evaluate<R: Regressor>(
    mut model: R,
    train: &Dataset,
    test: &Dataset,
) -> Result<(R, Metrics)> {
    model.fit(train.x(), train.y())?;
    let predictions = model.predict(test.x())?;
    let metrics = Metrics::evaluate(test.y(), predictions.view())?;
    Ok((model, metrics))
}

/// Picks the candidate with the highest R², keeping the earliest one on ties.
fn select_best<I>(first: (Model, Metrics), others: I) -> (Model, Metrics)
where
    I: IntoIterator<Item = (Model, Metrics)>,
{
    others
        .into_iter()
        .fold(first, |best, next| if next.1.r2 > best.1.r2 { next } else { best })
}

fn log_importances(forest: &RandomForest) {
    let mut ranked: Vec<_> = FEATURE_NAMES
        .iter()
        .zip(forest.feature_importances())
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(a.1));

    for (name, importance) in ranked {
        info!("feature importance {name}: {importance:.4}");
    }
}
