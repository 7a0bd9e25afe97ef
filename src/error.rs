//! Error taxonomy for the prediction pipeline.
//!
//! Three families reach callers: [`ValidationError`] for bad user input,
//! [`ArtifactLoadError`] for a misconfigured deployment, and
//! [`PredictionError`] for everything that goes wrong once the pipeline runs.
//! [`TransformError`] and [`ModelError`] are the causes a `PredictionError`
//! wraps.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Which persisted artifact an operation refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    /// Fitted encoder/scaler bundle.
    Transformer,
    /// Trained regressor.
    Model,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transformer => f.write_str("transformer"),
            Self::Model => f.write_str("model"),
        }
    }
}

/// Input rejected before it reaches the pipeline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("field `{0}` is required")]
    MissingField(&'static str),
    #[error("field `{field}` must be a number, got {value:?}")]
    InvalidNumber { field: &'static str, value: String },
    #[error("field `{field}` must be a finite number, got {value}")]
    NonFinite { field: &'static str, value: f64 },
}

impl ValidationError {
    /// Name of the offending field.
    pub fn field(&self) -> &'static str {
        match self {
            Self::MissingField(field) => *field,
            Self::InvalidNumber { field, .. } | Self::NonFinite { field, .. } => *field,
        }
    }
}

/// A persisted artifact could not be located or deserialized.
#[derive(Debug, Error)]
pub enum ArtifactLoadError {
    #[error("{kind} artifact not found at {}", .path.display())]
    NotFound { kind: ArtifactKind, path: PathBuf },
    #[error("failed to read {kind} artifact at {}", .path.display())]
    Io {
        kind: ArtifactKind,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to deserialize {kind} artifact at {}", .path.display())]
    Deserialize {
        kind: ArtifactKind,
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("model runtime rejected {kind} artifact at {}: {message}", .path.display())]
    Runtime {
        kind: ArtifactKind,
        path: PathBuf,
        message: String,
    },
}

impl ArtifactLoadError {
    pub fn kind(&self) -> ArtifactKind {
        match self {
            Self::NotFound { kind, .. }
            | Self::Io { kind, .. }
            | Self::Deserialize { kind, .. }
            | Self::Runtime { kind, .. } => *kind,
        }
    }
}

/// The transformer could not encode a feature table.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("step `{step}` references unknown column `{column}`")]
    UnknownColumn { step: String, column: String },
    #[error("column `{column}` must hold numbers")]
    ExpectedNumeric { column: String },
    #[error("column `{column}` must hold text")]
    ExpectedText { column: String },
    #[error("found unknown category {value:?} in column `{column}` during transform")]
    UnknownCategory { column: String, value: String },
    #[error("step `{step}` is malformed: {reason}")]
    MalformedStep { step: String, reason: String },
    #[error("transformed matrix has an invalid shape")]
    Shape(#[from] ndarray::ShapeError),
}

/// The regressor could not score a feature matrix.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model expects {expected} features, got {actual}")]
    FeatureCountMismatch { expected: usize, actual: usize },
    #[error("tree {tree} is malformed: {reason}")]
    MalformedTree { tree: usize, reason: String },
    #[error("model runtime failed: {0}")]
    Runtime(String),
}

/// Any failure inside [`PredictPipeline::predict`](crate::models::PredictPipeline::predict).
#[derive(Debug, Error)]
pub enum PredictionError {
    #[error("failed to load prediction artifacts")]
    ArtifactLoad(#[from] ArtifactLoadError),
    #[error("failed to transform input features")]
    Transform(#[from] TransformError),
    #[error("model prediction failed")]
    Model(#[from] ModelError),
}

impl PredictionError {
    /// Artifact failures mean the deployment is misconfigured; nothing the
    /// caller submits will make the next request succeed.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ArtifactLoad(_))
    }

    pub fn artifact_load(&self) -> Option<&ArtifactLoadError> {
        match self {
            Self::ArtifactLoad(err) => Some(err),
            _ => None,
        }
    }

    /// Message safe to show an end user. The cause chain is for logs only.
    pub fn user_message(&self) -> &'static str {
        if self.is_fatal() {
            "Prediction service is unavailable"
        } else {
            "Prediction failed for the given inputs"
        }
    }
}

/// Render an error with its full `source()` chain, for log fields.
pub fn error_chain(err: &dyn std::error::Error) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}
