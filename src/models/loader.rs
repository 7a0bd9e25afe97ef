//! Artifact loader

use crate::config::ArtifactsConfig;
use crate::error::{ArtifactKind, ArtifactLoadError};
use crate::models::preprocessor::{Transformer, TransformerArtifact};
use crate::models::regressor::{ModelArtifact, Regressor};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::info;

/// A deserialized artifact
pub enum Artifact {
    Transformer(Box<dyn Transformer>),
    Model(Box<dyn Regressor>),
}

/// Loads the persisted transformer and model from fixed locations
#[derive(Debug, Clone)]
pub struct ArtifactLoader {
    transformer_path: PathBuf,
    model_path: PathBuf,
    /// Intra-op threads for runtime-backed models
    #[cfg_attr(not(feature = "onnx"), allow(dead_code))]
    threads: usize,
}

impl ArtifactLoader {
    /// Loader over explicit file paths
    pub fn new(transformer_path: impl Into<PathBuf>, model_path: impl Into<PathBuf>) -> Self {
        Self {
            transformer_path: transformer_path.into(),
            model_path: model_path.into(),
            threads: 1,
        }
    }

    /// Loader over `<dir>/preprocessor.json` and `<dir>/model.json`
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref();
        Self::new(dir.join("preprocessor.json"), dir.join("model.json"))
    }

    pub fn from_config(config: &ArtifactsConfig) -> Self {
        let dir = Path::new(&config.dir);
        Self {
            transformer_path: dir.join(&config.preprocessor),
            model_path: dir.join(&config.model),
            threads: config.threads,
        }
    }

    pub fn path(&self, kind: ArtifactKind) -> &Path {
        match kind {
            ArtifactKind::Transformer => &self.transformer_path,
            ArtifactKind::Model => &self.model_path,
        }
    }

    /// Load one artifact
    pub fn load(&self, kind: ArtifactKind) -> Result<Artifact, ArtifactLoadError> {
        match kind {
            ArtifactKind::Transformer => self.load_transformer().map(Artifact::Transformer),
            ArtifactKind::Model => self.load_model().map(Artifact::Model),
        }
    }

    pub fn load_transformer(&self) -> Result<Box<dyn Transformer>, ArtifactLoadError> {
        let artifact: TransformerArtifact = self.read_json(ArtifactKind::Transformer)?;
        Ok(artifact.into_transformer())
    }

    pub fn load_model(&self) -> Result<Box<dyn Regressor>, ArtifactLoadError> {
        if self.model_path.extension().is_some_and(|ext| ext == "onnx") {
            return self.load_onnx_model();
        }

        let artifact: ModelArtifact = self.read_json(ArtifactKind::Model)?;
        let model = artifact.into_regressor();
        info!(model = model.name(), path = %self.model_path.display(), "Model loaded");
        Ok(model)
    }

    #[cfg(feature = "onnx")]
    fn load_onnx_model(&self) -> Result<Box<dyn Regressor>, ArtifactLoadError> {
        let path = self.path(ArtifactKind::Model);
        if !path.exists() {
            return Err(ArtifactLoadError::NotFound {
                kind: ArtifactKind::Model,
                path: path.to_path_buf(),
            });
        }
        let model = crate::models::onnx::OnnxRegressor::load(path, self.threads).map_err(|e| {
            ArtifactLoadError::Runtime {
                kind: ArtifactKind::Model,
                path: path.to_path_buf(),
                message: e.to_string(),
            }
        })?;
        Ok(Box::new(model))
    }

    #[cfg(not(feature = "onnx"))]
    fn load_onnx_model(&self) -> Result<Box<dyn Regressor>, ArtifactLoadError> {
        Err(ArtifactLoadError::Runtime {
            kind: ArtifactKind::Model,
            path: self.model_path.clone(),
            message: "built without the `onnx` feature".to_string(),
        })
    }

    fn read_json<T: DeserializeOwned>(&self, kind: ArtifactKind) -> Result<T, ArtifactLoadError> {
        let path = self.path(kind);

        let bytes = std::fs::read(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ArtifactLoadError::NotFound {
                    kind,
                    path: path.to_path_buf(),
                }
            } else {
                ArtifactLoadError::Io {
                    kind,
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;

        serde_json::from_slice(&bytes).map_err(|source| ArtifactLoadError::Deserialize {
            kind,
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const TRANSFORMER: &str = r#"{"kind":"column_transformer","steps":[
        {"kind":"passthrough","name":"num","columns":["reading_score"]}
    ]}"#;
    const MODEL: &str = r#"{"kind":"linear","intercept":1.0,"coefficients":[2.0]}"#;

    #[test]
    fn test_load_both_kinds() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("preprocessor.json"), TRANSFORMER).unwrap();
        fs::write(dir.path().join("model.json"), MODEL).unwrap();

        let loader = ArtifactLoader::from_dir(dir.path());
        assert!(matches!(
            loader.load(ArtifactKind::Transformer),
            Ok(Artifact::Transformer(_))
        ));
        match loader.load(ArtifactKind::Model) {
            Ok(Artifact::Model(model)) => assert_eq!(model.name(), "linear"),
            _ => panic!("expected a model artifact"),
        }
    }

    #[test]
    fn test_missing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let loader = ArtifactLoader::from_dir(dir.path());

        match loader.load_model() {
            Err(ArtifactLoadError::NotFound { kind, path }) => {
                assert_eq!(kind, ArtifactKind::Model);
                assert_eq!(path, dir.path().join("model.json"));
            }
            _ => panic!("expected NotFound"),
        }
    }

    #[test]
    fn test_corrupt_artifact() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("preprocessor.json"), b"\x80not json").unwrap();

        let loader = ArtifactLoader::from_dir(dir.path());
        assert!(matches!(
            loader.load_transformer(),
            Err(ArtifactLoadError::Deserialize {
                kind: ArtifactKind::Transformer,
                ..
            })
        ));
    }

    #[test]
    fn test_wrong_artifact_type() {
        let dir = tempfile::tempdir().unwrap();
        // A model document where a transformer is expected
        fs::write(dir.path().join("preprocessor.json"), MODEL).unwrap();

        let loader = ArtifactLoader::from_dir(dir.path());
        assert!(matches!(
            loader.load_transformer(),
            Err(ArtifactLoadError::Deserialize { .. })
        ));
    }

    #[test]
    fn test_directory_is_not_an_artifact() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("model.json")).unwrap();

        let loader = ArtifactLoader::from_dir(dir.path());
        let err = loader.load_model().err().unwrap();
        assert_eq!(err.kind(), ArtifactKind::Model);
        assert!(!matches!(err, ArtifactLoadError::NotFound { .. }));
    }
}
