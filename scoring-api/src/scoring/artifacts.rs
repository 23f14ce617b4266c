//! Artifact loading
//!
//! Model, scaler and dataset are read once at startup. Any failure here is
//! fatal: the service never runs with a partially loaded pipeline.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};

use super::error::ScoringError;
use super::model::{Classifier, ScoringEngine};
use super::preprocess::{FittedScaler, Preprocessor};
use super::record_store::{DatasetFile, DuplicatePolicy, RecordStore};
use super::service::ScoringService;

#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub model: PathBuf,
    pub scaler: PathBuf,
    pub dataset: PathBuf,
}

impl ArtifactPaths {
    /// Default file names inside one directory
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            model: dir.join("model.json"),
            scaler: dir.join("scaler.json"),
            dataset: dir.join("dataset.json"),
        }
    }
}

/// SHA-256 of each artifact file, hex encoded
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactFingerprints {
    pub model: String,
    pub scaler: String,
    pub dataset: String,
}

/// Read, fingerprint and parse one JSON artifact
fn read_json<T: DeserializeOwned>(path: &Path) -> Result<(T, String), ScoringError> {
    let bytes = std::fs::read(path)
        .map_err(|e| ScoringError::ModelNotLoaded(format!("{}: {}", path.display(), e)))?;

    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let fingerprint = format!("{:x}", hasher.finalize());

    let parsed = serde_json::from_slice(&bytes)
        .map_err(|e| ScoringError::ModelNotLoaded(format!("{}: {}", path.display(), e)))?;

    Ok((parsed, fingerprint))
}

/// Load every artifact and assemble the scoring pipeline
pub fn load(paths: &ArtifactPaths, policy: DuplicatePolicy) -> Result<(ScoringService, ArtifactFingerprints), ScoringError> {
    tracing::info!("Loading model from {}", paths.model.display());
    let (model, model_hash): (Classifier, _) = read_json(&paths.model)?;

    tracing::info!("Loading scaler from {}", paths.scaler.display());
    let (scaler, scaler_hash): (FittedScaler, _) = read_json(&paths.scaler)?;

    tracing::info!("Loading dataset from {}", paths.dataset.display());
    let (dataset, dataset_hash): (DatasetFile, _) = read_json(&paths.dataset)?;

    let store = RecordStore::from_dataset(dataset, policy)?;
    if store.is_empty() {
        tracing::warn!("Dataset has no records, every lookup will fail");
    }
    tracing::info!(
        "Dataset loaded: {} records, {} features, duplicate policy {:?}",
        store.len(), store.feature_names().len(), store.policy()
    );

    let service = ScoringService::new(store, Preprocessor::new(scaler)?, ScoringEngine::new(model)?)?;

    Ok((service, ArtifactFingerprints {
        model: model_hash,
        scaler: scaler_hash,
        dataset: dataset_hash,
    }))
}
