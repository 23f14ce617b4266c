//! Configuration module

use std::env;
use std::path::PathBuf;

use crate::scoring::{ArtifactPaths, DuplicatePolicy};

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,

    /// Directory holding model.json, scaler.json and dataset.json
    pub artifact_dir: PathBuf,

    /// Per-artifact overrides
    pub model_path: Option<PathBuf>,
    pub scaler_path: Option<PathBuf>,
    pub dataset_path: Option<PathBuf>,

    /// What to do with duplicated SK_ID_CURR rows
    pub duplicate_policy: DuplicatePolicy,

    /// Environment (development, production)
    pub environment: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5000),

            artifact_dir: env::var("ARTIFACT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./artifacts")),

            model_path: env::var("MODEL_PATH").ok().map(PathBuf::from),
            scaler_path: env::var("SCALER_PATH").ok().map(PathBuf::from),
            dataset_path: env::var("DATASET_PATH").ok().map(PathBuf::from),

            duplicate_policy: env::var("DUPLICATE_ID_POLICY")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or_default(),

            environment: env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),
        }
    }

    /// Resolved artifact locations
    pub fn artifact_paths(&self) -> ArtifactPaths {
        let defaults = ArtifactPaths::in_dir(&self.artifact_dir);
        ArtifactPaths {
            model: self.model_path.clone().unwrap_or(defaults.model),
            scaler: self.scaler_path.clone().unwrap_or(defaults.scaler),
            dataset: self.dataset_path.clone().unwrap_or(defaults.dataset),
        }
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            port: 5000,
            artifact_dir: PathBuf::from("/srv/artifacts"),
            model_path: None,
            scaler_path: None,
            dataset_path: Some(PathBuf::from("/data/clients.json")),
            duplicate_policy: DuplicatePolicy::FirstMatch,
            environment: "development".to_string(),
        }
    }

    #[test]
    fn test_artifact_paths_with_override() {
        let paths = config().artifact_paths();
        assert_eq!(paths.model, PathBuf::from("/srv/artifacts/model.json"));
        assert_eq!(paths.scaler, PathBuf::from("/srv/artifacts/scaler.json"));
        assert_eq!(paths.dataset, PathBuf::from("/data/clients.json"));
    }

    #[test]
    fn test_environment() {
        let mut cfg = config();
        assert!(!cfg.is_production());
        cfg.environment = "production".to_string();
        assert!(cfg.is_production());
    }
}
