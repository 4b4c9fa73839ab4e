//! Error types for rf-cluster-sim

use rf_cluster::ClusterError;
use thiserror::Error;

/// Simulator error type
#[derive(Error, Debug)]
pub enum SimError {
    #[error("Engine error: {0}")]
    Engine(#[from] ClusterError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yml::Error),

    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid simulation settings: {0}")]
    InvalidSettings(String),
}

/// Result type alias
pub type SimResult<T> = Result<T, SimError>;
