//! Small artifact set shared by the tests

use super::model::Classifier;
use super::preprocess::{FittedScaler, Preprocessor};
use super::record_store::{DatasetFile, DuplicatePolicy, RecordStore};
use super::model::ScoringEngine;
use super::service::ScoringService;

pub const MODEL_JSON: &str = r#"{
    "kind": "tree_ensemble",
    "feature_names": ["EXT_SOURCE_2", "EXT_SOURCE_3", "AMT_CREDIT", "DAYS_BIRTH", "CODE_GENDER_M"],
    "base_score": -1.2,
    "trees": [
        {"nodes": [
            {"split": {"feature": 0, "threshold": 0.0, "left": 1, "right": 2, "missing_left": false, "cover": 100.0}},
            {"split": {"feature": 2, "threshold": 0.5, "left": 3, "right": 4, "missing_left": true, "cover": 60.0}},
            {"leaf": {"value": -0.4, "cover": 40.0}},
            {"leaf": {"value": 0.3, "cover": 35.0}},
            {"leaf": {"value": 0.8, "cover": 25.0}}
        ]},
        {"nodes": [
            {"split": {"feature": 1, "threshold": -0.2, "left": 1, "right": 2, "missing_left": true, "cover": 100.0}},
            {"leaf": {"value": 0.5, "cover": 45.0}},
            {"split": {"feature": 1, "threshold": 0.6, "left": 3, "right": 4, "missing_left": false, "cover": 55.0}},
            {"leaf": {"value": -0.2, "cover": 30.0}},
            {"leaf": {"value": -0.6, "cover": 25.0}}
        ]}
    ]
}"#;

pub const LOGISTIC_JSON: &str = r#"{
    "kind": "logistic",
    "feature_names": ["EXT_SOURCE_2", "EXT_SOURCE_3", "AMT_CREDIT", "DAYS_BIRTH", "CODE_GENDER_M"],
    "intercept": -0.9,
    "coefficients": [-0.8, -0.7, 0.25, 0.3, 0.2],
    "feature_means": [0.0, 0.1, 0.0, -0.05, 0.0]
}"#;

pub const SCALER_JSON: &str = r#"{
    "kind": "standard",
    "feature_names": ["EXT_SOURCE_2", "EXT_SOURCE_3", "AMT_CREDIT", "DAYS_BIRTH", "CODE_GENDER_M"],
    "mean": [0.5, 0.5, 600000.0, -16000.0, 0.35],
    "scale": [0.2, 0.2, 400000.0, 4000.0, 0.5]
}"#;

pub const DATASET_JSON: &str = r#"{
    "columns": ["SK_ID_CURR", "TARGET", "EXT_SOURCE_2", "EXT_SOURCE_3", "AMT_CREDIT", "DAYS_BIRTH", "CODE_GENDER_M"],
    "rows": [
        [100002, 1, 0.2629, 0.1394, 406597.5, -9461, 1],
        [100003, 0, 0.6222, null, 1293502.5, -16765, 0],
        [100004, 0, 0.5559, 0.7296, 135000.0, -19046, 1],
        [100006, 0, 0.6504, null, 312682.5, -19005, 0]
    ]
}"#;

pub fn tree_model() -> Classifier {
    serde_json::from_str(MODEL_JSON).unwrap()
}

pub fn logistic_model() -> Classifier {
    serde_json::from_str(LOGISTIC_JSON).unwrap()
}

pub fn scaler() -> FittedScaler {
    serde_json::from_str(SCALER_JSON).unwrap()
}

pub fn dataset() -> DatasetFile {
    serde_json::from_str(DATASET_JSON).unwrap()
}

pub fn service_with(model: Classifier) -> ScoringService {
    ScoringService::new(
        RecordStore::from_dataset(dataset(), DuplicatePolicy::FirstMatch).unwrap(),
        Preprocessor::new(scaler()).unwrap(),
        ScoringEngine::new(model).unwrap(),
    ).unwrap()
}

pub fn service() -> ScoringService {
    service_with(tree_model())
}
