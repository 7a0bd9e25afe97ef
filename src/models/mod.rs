//! Artifact loading and model inference components

pub mod loader;
#[cfg(feature = "onnx")]
pub mod onnx;
pub mod pipeline;
pub mod preprocessor;
pub mod regressor;

pub use loader::{Artifact, ArtifactLoader};
pub use pipeline::{LoadedArtifacts, PredictPipeline, ScoreBand};
pub use preprocessor::{ColumnTransformer, Transformer, TransformerArtifact};
pub use regressor::{LinearRegressor, ModelArtifact, Regressor, TreeEnsemble};
