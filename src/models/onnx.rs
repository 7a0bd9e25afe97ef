//! ONNX-exported regressors, served through ONNX Runtime

use crate::error::ModelError;
use crate::models::regressor::Regressor;
use ndarray::ArrayView2;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};

/// ONNX Runtime session plus the tensor names it reads and writes
pub struct OnnxRegressor {
    name: String,
    /// Running a session needs exclusive access
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
}

impl OnnxRegressor {
    /// Load a model from an `.onnx` file
    pub fn load(path: &Path, threads: usize) -> Result<Self, ort::Error> {
        info!(path = %path.display(), threads, "Loading ONNX model");

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(threads)?
            .commit_from_file(path)?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "float_input".to_string());

        // Regressors exported from scikit-learn expose a single "variable" output.
        let output_name = session
            .outputs
            .first()
            .map(|o| o.name.clone())
            .unwrap_or_else(|| "variable".to_string());

        info!(input = %input_name, output = %output_name, "ONNX model loaded");

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "onnx".to_string());

        Ok(Self {
            name,
            session: Mutex::new(session),
            input_name,
            output_name,
        })
    }
}

impl Regressor for OnnxRegressor {
    fn predict(&self, features: ArrayView2<'_, f64>) -> Result<Vec<f64>, ModelError> {
        let shape = vec![features.nrows() as i64, features.ncols() as i64];
        let data: Vec<f32> = features.iter().map(|&x| x as f32).collect();
        let input = Tensor::from_array((shape, data))
            .map_err(|e| ModelError::Runtime(format!("failed to create input tensor: {e}")))?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| ModelError::Runtime(format!("session lock poisoned: {e}")))?;
        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => input])
            .map_err(|e| ModelError::Runtime(e.to_string()))?;

        let output = outputs
            .get(self.output_name.as_str())
            .ok_or_else(|| ModelError::Runtime(format!("missing output `{}`", self.output_name)))?;
        let (_, values) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| ModelError::Runtime(e.to_string()))?;

        debug!(model = %self.name, rows = features.nrows(), "ONNX inference complete");
        Ok(values.iter().map(|&v| v as f64).collect())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
