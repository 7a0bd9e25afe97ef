//! Student Score Predictor Library
//!
//! Serves a pretrained tabular regression model: raw student attributes are
//! validated into an [`InputRecord`], materialized as a fixed-schema
//! [`FeatureTable`], encoded by the persisted transformer and scored by the
//! persisted model.

pub mod config;
pub mod consumer;
pub mod error;
pub mod feature_materializer;
pub mod form;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod producer;
pub mod types;

pub use config::AppConfig;
pub use consumer::RequestConsumer;
pub use error::{ArtifactKind, ArtifactLoadError, PredictionError, ValidationError};
pub use feature_materializer::FeatureMaterializer;
pub use form::FormState;
pub use models::{ArtifactLoader, PredictPipeline};
pub use producer::ReplyProducer;
pub use types::{FeatureTable, InputRecord, PredictionReply, RawRecord};
