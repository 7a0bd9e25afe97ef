//! Prediction pipeline: load artifacts, transform, predict

use crate::config::{AppConfig, ScoringConfig};
use crate::error::{error_chain, ModelError, PredictionError};
use crate::models::loader::ArtifactLoader;
use crate::models::preprocessor::Transformer;
use crate::models::regressor::Regressor;
use crate::types::record::InputRecord;
use crate::types::table::FeatureTable;
use std::sync::{Arc, RwLock};
use tracing::{debug, error, info, warn};

/// A transformer and model that belong together
pub struct LoadedArtifacts {
    pub transformer: Box<dyn Transformer>,
    pub model: Box<dyn Regressor>,
}

impl LoadedArtifacts {
    /// Load the transformer, then the model. Nothing is returned unless both load.
    pub fn load(loader: &ArtifactLoader) -> Result<Self, PredictionError> {
        let transformer = loader.load_transformer()?;
        let model = loader.load_model()?;
        Ok(Self { transformer, model })
    }
}

/// Where the pipeline gets its artifacts from
enum ArtifactSource {
    /// Read both artifacts from storage on every call
    Reload(ArtifactLoader),
    /// Read once, then share for the life of the process
    Cached {
        loader: ArtifactLoader,
        slot: RwLock<Option<Arc<LoadedArtifacts>>>,
    },
    /// Artifacts supplied in memory
    Fixed(Arc<LoadedArtifacts>),
}

/// Acceptable range for predicted scores; values outside are logged, never altered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreBand {
    pub min: f64,
    pub max: f64,
}

impl ScoreBand {
    pub fn contains(&self, value: f64) -> bool {
        value.is_finite() && value >= self.min && value <= self.max
    }
}

impl Default for ScoreBand {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: 100.0,
        }
    }
}

impl From<&ScoringConfig> for ScoreBand {
    fn from(config: &ScoringConfig) -> Self {
        Self {
            min: config.sanity_min,
            max: config.sanity_max,
        }
    }
}

/// Runs feature tables through the persisted transformer and model
pub struct PredictPipeline {
    source: ArtifactSource,
    band: ScoreBand,
}

impl PredictPipeline {
    /// Create a pipeline from configuration
    pub fn new(config: &AppConfig) -> Self {
        let loader = ArtifactLoader::from_config(&config.artifacts);
        let pipeline = if config.artifacts.cache {
            Self::cached(loader)
        } else {
            Self::reloading(loader)
        };

        info!(
            transformer = %config.artifacts.preprocessor,
            model = %config.artifacts.model,
            cache = config.artifacts.cache,
            "Prediction pipeline initialized"
        );

        pipeline.with_band(ScoreBand::from(&config.scoring))
    }

    /// Reload artifacts from storage on every prediction
    pub fn reloading(loader: ArtifactLoader) -> Self {
        Self {
            source: ArtifactSource::Reload(loader),
            band: ScoreBand::default(),
        }
    }

    /// Load artifacts on first use and keep them
    pub fn cached(loader: ArtifactLoader) -> Self {
        Self {
            source: ArtifactSource::Cached {
                loader,
                slot: RwLock::new(None),
            },
            band: ScoreBand::default(),
        }
    }

    /// Use artifacts that are already in memory
    pub fn with_artifacts(artifacts: LoadedArtifacts) -> Self {
        Self {
            source: ArtifactSource::Fixed(Arc::new(artifacts)),
            band: ScoreBand::default(),
        }
    }

    pub fn with_band(mut self, band: ScoreBand) -> Self {
        self.band = band;
        self
    }

    pub fn band(&self) -> ScoreBand {
        self.band
    }

    /// Load artifacts eagerly so a misconfigured deployment fails at startup.
    /// A no-op for the reloading source.
    pub fn warm_up(&self) -> Result<(), PredictionError> {
        match &self.source {
            ArtifactSource::Cached { .. } => self.artifacts().map(|_| ()),
            _ => Ok(()),
        }
    }

    fn artifacts(&self) -> Result<Arc<LoadedArtifacts>, PredictionError> {
        match &self.source {
            ArtifactSource::Reload(loader) => Ok(Arc::new(LoadedArtifacts::load(loader)?)),
            ArtifactSource::Fixed(artifacts) => Ok(Arc::clone(artifacts)),
            ArtifactSource::Cached { loader, slot } => {
                if let Some(artifacts) = slot.read().ok().and_then(|s| s.clone()) {
                    return Ok(artifacts);
                }

                let mut guard = slot.write().unwrap_or_else(|poisoned| poisoned.into_inner());
                if let Some(artifacts) = guard.as_ref() {
                    return Ok(Arc::clone(artifacts));
                }
                let artifacts = Arc::new(LoadedArtifacts::load(loader)?);
                *guard = Some(Arc::clone(&artifacts));
                debug!("Artifacts cached for the process lifetime");
                Ok(artifacts)
            }
        }
    }

    /// Predict one score per table row.
    ///
    /// Values are returned exactly as the model produced them.
    pub fn predict(&self, table: &FeatureTable) -> Result<Vec<f64>, PredictionError> {
        let result = self.run(table);
        if let Err(e) = &result {
            error!(error = %error_chain(e), fatal = e.is_fatal(), "Prediction failed");
        }
        result
    }

    /// Materialize and predict a single record
    pub fn predict_record(&self, record: &InputRecord) -> Result<f64, PredictionError> {
        let predictions = self.predict(&record.to_feature_table())?;
        predictions.first().copied().ok_or_else(|| {
            PredictionError::Model(ModelError::Runtime(
                "model returned no prediction for the row".to_string(),
            ))
        })
    }

    fn run(&self, table: &FeatureTable) -> Result<Vec<f64>, PredictionError> {
        let artifacts = self.artifacts()?;

        let features = artifacts.transformer.transform(table)?;
        debug!(
            rows = features.nrows(),
            features = features.ncols(),
            "Features transformed"
        );

        let predictions = artifacts.model.predict(features.view())?;

        for (row, &value) in predictions.iter().enumerate() {
            if !self.band.contains(value) {
                warn!(
                    row,
                    prediction = value,
                    min = self.band.min,
                    max = self.band.max,
                    model = artifacts.model.name(),
                    "Prediction outside expected score range"
                );
            }
        }

        debug!(
            model = artifacts.model.name(),
            predictions = ?predictions,
            "Prediction complete"
        );

        Ok(predictions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ArtifactKind, TransformError};
    use ndarray::{Array2, ArrayView2};
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingTransformer {
        calls: Arc<AtomicUsize>,
    }

    impl Transformer for CountingTransformer {
        fn transform(&self, table: &FeatureTable) -> Result<Array2<f64>, TransformError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Array2::zeros((table.row_count(), 1)))
        }

        fn output_width(&self) -> usize {
            1
        }
    }

    struct ConstantModel(f64);

    impl Regressor for ConstantModel {
        fn predict(&self, features: ArrayView2<'_, f64>) -> Result<Vec<f64>, ModelError> {
            Ok(vec![self.0; features.nrows()])
        }

        fn name(&self) -> &str {
            "constant"
        }
    }

    fn record() -> InputRecord {
        InputRecord::new("female", "group B", "bachelor's degree", "standard", "completed", 72.0, 74.0)
            .unwrap()
    }

    fn write_artifacts(dir: &std::path::Path) {
        fs::write(
            dir.join("preprocessor.json"),
            r#"{"kind":"column_transformer","steps":[
                {"kind":"passthrough","name":"num","columns":["reading_score","writing_score"]},
                {"kind":"one_hot_encoder","name":"cat","columns":["gender"],"categories":[["female","male"]]}
            ]}"#,
        )
        .unwrap();
        fs::write(
            dir.join("model.json"),
            r#"{"kind":"linear","intercept":1.0,"coefficients":[0.5,0.25,-2.0,2.0]}"#,
        )
        .unwrap();
    }

    #[test]
    fn test_predict_fixed_artifacts() {
        let calls = Arc::new(AtomicUsize::new(0));
        let pipeline = PredictPipeline::with_artifacts(LoadedArtifacts {
            transformer: Box::new(CountingTransformer {
                calls: Arc::clone(&calls),
            }),
            model: Box::new(ConstantModel(61.5)),
        });

        assert_eq!(pipeline.predict_record(&record()).unwrap(), 61.5);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_out_of_band_prediction_passes_through() {
        let pipeline = PredictPipeline::with_artifacts(LoadedArtifacts {
            transformer: Box::new(CountingTransformer {
                calls: Arc::new(AtomicUsize::new(0)),
            }),
            model: Box::new(ConstantModel(104.2)),
        });
        assert_eq!(pipeline.predict(&record().to_feature_table()).unwrap(), vec![104.2]);
        assert!(!pipeline.band().contains(104.2));
    }

    #[test]
    fn test_reloading_pipeline_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        write_artifacts(dir.path());

        let pipeline = PredictPipeline::reloading(ArtifactLoader::from_dir(dir.path()));
        // 1 + 0.5*72 + 0.25*74 - 2
        assert_eq!(pipeline.predict_record(&record()).unwrap(), 53.5);
    }

    #[test]
    fn test_reloading_pipeline_sees_new_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        write_artifacts(dir.path());
        let pipeline = PredictPipeline::reloading(ArtifactLoader::from_dir(dir.path()));
        assert_eq!(pipeline.predict_record(&record()).unwrap(), 53.5);

        fs::remove_file(dir.path().join("model.json")).unwrap();
        let err = pipeline.predict_record(&record()).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_cached_pipeline_keeps_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        write_artifacts(dir.path());
        let pipeline = PredictPipeline::cached(ArtifactLoader::from_dir(dir.path()));
        pipeline.warm_up().unwrap();

        fs::remove_file(dir.path().join("model.json")).unwrap();
        assert_eq!(pipeline.predict_record(&record()).unwrap(), 53.5);
    }

    #[test]
    fn test_cached_pipeline_retries_after_load_failure() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = PredictPipeline::cached(ArtifactLoader::from_dir(dir.path()));
        assert!(pipeline.warm_up().is_err());

        write_artifacts(dir.path());
        assert_eq!(pipeline.predict_record(&record()).unwrap(), 53.5);
    }

    #[test]
    fn test_missing_model_stops_before_transform() {
        let dir = tempfile::tempdir().unwrap();
        write_artifacts(dir.path());
        fs::remove_file(dir.path().join("model.json")).unwrap();

        // "other" would fail inside the one-hot encoder if transform ran.
        let record = InputRecord::new("other", "group B", "high school", "standard", "none", 1.0, 2.0)
            .unwrap();
        let pipeline = PredictPipeline::reloading(ArtifactLoader::from_dir(dir.path()));
        let err = pipeline.predict_record(&record).unwrap_err();

        let load_err = err.artifact_load().expect("artifact load error");
        assert_eq!(load_err.kind(), ArtifactKind::Model);
    }

    #[test]
    fn test_unknown_category_is_prediction_error() {
        let dir = tempfile::tempdir().unwrap();
        write_artifacts(dir.path());

        let record = InputRecord::new("other", "group B", "high school", "standard", "none", 1.0, 2.0)
            .unwrap();
        let pipeline = PredictPipeline::reloading(ArtifactLoader::from_dir(dir.path()));
        let err = pipeline.predict_record(&record).unwrap_err();

        assert!(matches!(
            err,
            PredictionError::Transform(TransformError::UnknownCategory { .. })
        ));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_shape_mismatch_is_prediction_error() {
        let dir = tempfile::tempdir().unwrap();
        write_artifacts(dir.path());
        fs::write(
            dir.path().join("model.json"),
            r#"{"kind":"linear","intercept":0.0,"coefficients":[1.0]}"#,
        )
        .unwrap();

        let pipeline = PredictPipeline::reloading(ArtifactLoader::from_dir(dir.path()));
        let err = pipeline.predict_record(&record()).unwrap_err();
        assert!(matches!(
            err,
            PredictionError::Model(ModelError::FeatureCountMismatch {
                expected: 1,
                actual: 4
            })
        ));
    }

    #[test]
    fn test_band_contains() {
        let band = ScoreBand::default();
        assert!(band.contains(0.0));
        assert!(band.contains(100.0));
        assert!(!band.contains(-0.1));
        assert!(!band.contains(f64::NAN));
    }
}
