//! Fitted preprocessing transformer

use crate::error::TransformError;
use crate::types::table::{Cell, Column, FeatureTable};
use ndarray::Array2;
use serde::Deserialize;

/// Encodes a feature table into the numeric matrix the model was trained on.
pub trait Transformer: Send + Sync {
    fn transform(&self, table: &FeatureTable) -> Result<Array2<f64>, TransformError>;

    /// Number of output columns per row
    fn output_width(&self) -> usize;
}

/// Persisted transformer variants
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransformerArtifact {
    ColumnTransformer(ColumnTransformer),
}

impl TransformerArtifact {
    pub fn into_transformer(self) -> Box<dyn Transformer> {
        match self {
            TransformerArtifact::ColumnTransformer(ct) => Box::new(ct),
        }
    }
}

/// Applies each step to its columns and concatenates the outputs in step order.
#[derive(Debug, Clone, Deserialize)]
pub struct ColumnTransformer {
    pub steps: Vec<ColumnStep>,
}

/// One fitted step of a [`ColumnTransformer`]
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnStep {
    StandardScaler(StandardScaler),
    OneHotEncoder(OneHotEncoder),
    Passthrough(Passthrough),
}

/// `(x - mean) / scale` per column. Without `mean`, only scales.
#[derive(Debug, Clone, Deserialize)]
pub struct StandardScaler {
    pub name: String,
    pub columns: Vec<String>,
    #[serde(default)]
    pub mean: Option<Vec<f64>>,
    pub scale: Vec<f64>,
}

/// What to do with a category the encoder was not fit on
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HandleUnknown {
    #[default]
    Error,
    /// Emit an all-zero block for the column
    Ignore,
}

/// Indicator columns per category, in fitted category order.
#[derive(Debug, Clone, Deserialize)]
pub struct OneHotEncoder {
    pub name: String,
    pub columns: Vec<String>,
    pub categories: Vec<Vec<String>>,
    #[serde(default)]
    pub handle_unknown: HandleUnknown,
    /// Optional per-category divisor applied after encoding
    #[serde(default)]
    pub scale: Option<Vec<Vec<f64>>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Passthrough {
    pub name: String,
    pub columns: Vec<String>,
}

impl ColumnStep {
    fn name(&self) -> &str {
        match self {
            ColumnStep::StandardScaler(s) => &s.name,
            ColumnStep::OneHotEncoder(s) => &s.name,
            ColumnStep::Passthrough(s) => &s.name,
        }
    }

    fn width(&self) -> usize {
        match self {
            ColumnStep::StandardScaler(s) => s.columns.len(),
            ColumnStep::OneHotEncoder(s) => s.categories.iter().map(Vec::len).sum(),
            ColumnStep::Passthrough(s) => s.columns.len(),
        }
    }

    fn resolve(&self, names: &[String]) -> Result<Vec<Column>, TransformError> {
        names
            .iter()
            .map(|name| {
                name.parse::<Column>()
                    .map_err(|_| TransformError::UnknownColumn {
                        step: self.name().to_string(),
                        column: name.clone(),
                    })
            })
            .collect()
    }

    fn check(&self) -> Result<Vec<Column>, TransformError> {
        let malformed = |reason: String| TransformError::MalformedStep {
            step: self.name().to_string(),
            reason,
        };
        match self {
            ColumnStep::StandardScaler(s) => {
                if s.scale.len() != s.columns.len() {
                    return Err(malformed(format!(
                        "{} columns but {} scale values",
                        s.columns.len(),
                        s.scale.len()
                    )));
                }
                if let Some(mean) = &s.mean {
                    if mean.len() != s.columns.len() {
                        return Err(malformed(format!(
                            "{} columns but {} mean values",
                            s.columns.len(),
                            mean.len()
                        )));
                    }
                }
                self.resolve(&s.columns)
            }
            ColumnStep::OneHotEncoder(s) => {
                if s.categories.len() != s.columns.len() {
                    return Err(malformed(format!(
                        "{} columns but {} category lists",
                        s.columns.len(),
                        s.categories.len()
                    )));
                }
                if let Some(scale) = &s.scale {
                    let shapes_match = scale.len() == s.categories.len()
                        && scale
                            .iter()
                            .zip(&s.categories)
                            .all(|(sc, cats)| sc.len() == cats.len());
                    if !shapes_match {
                        return Err(malformed("scale does not match categories".to_string()));
                    }
                }
                self.resolve(&s.columns)
            }
            ColumnStep::Passthrough(s) => self.resolve(&s.columns),
        }
    }

    fn encode_row(
        &self,
        columns: &[Column],
        row: &[Cell],
        out: &mut Vec<f64>,
    ) -> Result<(), TransformError> {
        match self {
            ColumnStep::StandardScaler(s) => {
                for (i, column) in columns.iter().enumerate() {
                    let x = numeric(*column, &row[column.index()])?;
                    let mean = s.mean.as_ref().map_or(0.0, |m| m[i]);
                    // A zero scale means the column was constant during fitting.
                    let scale = if s.scale[i] == 0.0 { 1.0 } else { s.scale[i] };
                    out.push((x - mean) / scale);
                }
            }
            ColumnStep::OneHotEncoder(s) => {
                for (i, column) in columns.iter().enumerate() {
                    let value = text(*column, &row[column.index()])?;
                    let categories = &s.categories[i];
                    let hit = categories.iter().position(|c| c == value);
                    if hit.is_none() && s.handle_unknown == HandleUnknown::Error {
                        return Err(TransformError::UnknownCategory {
                            column: column.name().to_string(),
                            value: value.to_string(),
                        });
                    }
                    for j in 0..categories.len() {
                        let indicator = if hit == Some(j) { 1.0 } else { 0.0 };
                        let divisor = match &s.scale {
                            Some(scale) if scale[i][j] != 0.0 => scale[i][j],
                            _ => 1.0,
                        };
                        out.push(indicator / divisor);
                    }
                }
            }
            ColumnStep::Passthrough(_) => {
                for column in columns {
                    out.push(numeric(*column, &row[column.index()])?);
                }
            }
        }
        Ok(())
    }
}

fn numeric(column: Column, cell: &Cell) -> Result<f64, TransformError> {
    cell.as_number().ok_or_else(|| TransformError::ExpectedNumeric {
        column: column.name().to_string(),
    })
}

fn text(column: Column, cell: &Cell) -> Result<&str, TransformError> {
    cell.as_text().ok_or_else(|| TransformError::ExpectedText {
        column: column.name().to_string(),
    })
}

impl Transformer for ColumnTransformer {
    fn transform(&self, table: &FeatureTable) -> Result<Array2<f64>, TransformError> {
        let resolved: Vec<Vec<Column>> = self
            .steps
            .iter()
            .map(ColumnStep::check)
            .collect::<Result<_, _>>()?;

        let width = self.output_width();
        let mut data = Vec::with_capacity(table.row_count() * width);
        for row in table.rows() {
            for (step, columns) in self.steps.iter().zip(&resolved) {
                step.encode_row(columns, row, &mut data)?;
            }
        }

        Ok(Array2::from_shape_vec((table.row_count(), width), data)?)
    }

    fn output_width(&self) -> usize {
        self.steps.iter().map(ColumnStep::width).sum()
    }
}
