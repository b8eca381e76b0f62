//! On-disk model artifact.
//!
//! The artifact is a JSON document holding the fitted coefficients or tree
//! arenas of a `Model`, alongside the feature order it was trained with:
//!
//! ```json
//! { "format_version": 1, "feature_names": ["distance", ...], "model": { "kind": "forest", "params": { ... } } }
//! ```

use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

use log::info;
use serde::{Deserialize, Serialize};

use crate::{
    MlErr, Result,
    features::{FEATURE_NAMES, NUM_FEATURES},
    regressor::Model,
};

/// The current artifact layout version.
pub const FORMAT_VERSION: u32 = 1;

/// Where the model is written and read unless configured otherwise.
pub const DEFAULT_MODEL_PATH: &str = "energy_model.json";

#[derive(Serialize)]
struct ArtifactRef<'a> {
    format_version: u32,
    feature_names: [&'a str; NUM_FEATURES],
    model: &'a Model,
}

#[derive(Deserialize)]
struct ArtifactOwned {
    format_version: u32,
    feature_names: Vec<String>,
    model: Model,
}

/// Writes `model` to `path`, replacing any existing file.
///
/// # Returns
/// An io error if the file couldn't be created or written.
pub fn save<P: AsRef<Path>>(model: &Model, path: P) -> Result<()> {
    let path = path.as_ref();
    let artifact = ArtifactRef {
        format_version: FORMAT_VERSION,
        feature_names: FEATURE_NAMES,
        model,
    };

    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(&mut writer, &artifact)?;
    writer.flush()?;

    info!("saved {} model to {}", model.kind(), path.display());
    Ok(())
}

/// Reads a model from `path`.
///
/// # Returns
/// The model, `MlErr::Io` if the file couldn't be read (`NotFound` included) or
/// `MlErr::Artifact` if its contents aren't a compatible artifact, the model's own
/// structure included.
pub fn load<P: AsRef<Path>>(path: P) -> Result<Model> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);
    let artifact: ArtifactOwned = serde_json::from_reader(reader)?;

    if artifact.format_version != FORMAT_VERSION {
        return Err(MlErr::Artifact(format!(
            "unsupported format version {}, expected {FORMAT_VERSION}",
            artifact.format_version
        )));
    }

    if artifact.feature_names != FEATURE_NAMES {
        return Err(MlErr::Artifact(format!(
            "trained with features {:?}, expected {FEATURE_NAMES:?}",
            artifact.feature_names
        )));
    }

    artifact.model.check_structure(NUM_FEATURES)?;

    info!("loaded {} model from {}", artifact.model.kind(), path.display());
    Ok(artifact.model)
}
