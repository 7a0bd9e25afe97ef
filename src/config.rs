//! Configuration management for the score predictor

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub artifacts: ArtifactsConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    pub nats: NatsConfig,
    pub service: ServiceConfig,
    pub logging: LoggingConfig,
}

/// Persisted artifact locations
#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactsConfig {
    /// Directory holding both artifacts
    pub dir: String,
    /// Transformer file name inside `dir`
    #[serde(default = "default_preprocessor")]
    pub preprocessor: String,
    /// Model file name inside `dir` (`.onnx` needs the `onnx` feature)
    #[serde(default = "default_model")]
    pub model: String,
    /// Keep artifacts in memory after the first load instead of re-reading per request
    #[serde(default)]
    pub cache: bool,
    /// Intra-op threads for ONNX models
    #[serde(default = "default_threads")]
    pub threads: usize,
}

fn default_preprocessor() -> String {
    "preprocessor.json".to_string()
}

fn default_model() -> String {
    "model.json".to_string()
}

fn default_threads() -> usize {
    1
}

/// Expected range of predicted scores. Predictions outside it are logged, not clamped.
#[derive(Debug, Clone, Deserialize)]
pub struct ScoringConfig {
    pub sanity_min: f64,
    pub sanity_max: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            sanity_min: 0.0,
            sanity_max: 100.0,
        }
    }
}

/// NATS connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NatsConfig {
    /// NATS server URL
    pub url: String,
    /// Subject for incoming prediction requests
    pub request_subject: String,
    /// Subject for replies when the request carries no reply inbox
    pub reply_subject: String,
}

/// Service host configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Requests processed concurrently
    pub workers: usize,
    /// Seconds between metrics summaries
    pub metrics_interval_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl AppConfig {
    /// Load configuration from file
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/config.toml")
    }

    /// Load configuration from a specific path, with `PREDICTOR__SECTION__KEY`
    /// environment overrides
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(Environment::with_prefix("PREDICTOR").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            artifacts: ArtifactsConfig {
                dir: "artifacts".to_string(),
                preprocessor: default_preprocessor(),
                model: default_model(),
                cache: true,
                threads: default_threads(),
            },
            scoring: ScoringConfig::default(),
            nats: NatsConfig {
                url: "nats://localhost:4222".to_string(),
                request_subject: "predictions.requests".to_string(),
                reply_subject: "predictions.replies".to_string(),
            },
            service: ServiceConfig {
                workers: 4,
                metrics_interval_secs: 30,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.nats.url, "nats://localhost:4222");
        assert_eq!(config.artifacts.dir, "artifacts");
        assert_eq!(config.artifacts.model, "model.json");
        assert_eq!(config.scoring.sanity_max, 100.0);
        assert!(config.artifacts.cache);
    }

    #[test]
    fn test_load_from_path_applies_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[artifacts]
dir = "/srv/artifacts"

[nats]
url = "nats://nats:4222"
request_subject = "scores.req"
reply_subject = "scores.rep"

[service]
workers = 2
metrics_interval_secs = 10

[logging]
level = "debug"
format = "json"
"#,
        )
        .unwrap();

        let config = AppConfig::load_from_path(&path).unwrap();
        assert_eq!(config.artifacts.dir, "/srv/artifacts");
        assert_eq!(config.artifacts.preprocessor, "preprocessor.json");
        assert!(!config.artifacts.cache);
        assert_eq!(config.scoring.sanity_min, 0.0);
        assert_eq!(config.service.workers, 2);
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_shipped_config_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/config.toml");
        let config = AppConfig::load_from_path(path).unwrap();
        assert_eq!(config.artifacts.model, "model.json");
        assert_eq!(config.nats.request_subject, "predictions.requests");
    }

    #[test]
    fn test_missing_config_file() {
        assert!(AppConfig::load_from_path("does/not/exist.toml").is_err());
    }
}
