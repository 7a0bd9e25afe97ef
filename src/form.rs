//! Form submission handling.
//!
//! A front end owns a [`FormState`] per user, hands each submission to
//! [`FormState::submit`] and renders whatever the state holds afterwards:
//! either a predicted score or an error message, always alongside the values
//! the user typed.

use crate::error::{error_chain, ValidationError};
use crate::models::PredictPipeline;
use crate::types::record::{InputRecord, RawRecord};
use tracing::{info, warn};

pub const MSG_MISSING_FIELDS: &str = "Please fill in all fields";
pub const MSG_INVALID_SCORES: &str = "Reading/Writing scores must be valid numbers";

/// How a submission ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Predicted,
    Invalid,
    Failed,
}

/// Caller-owned state of the prediction form
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormState {
    /// Last submission, kept verbatim for redisplay
    pub form_data: RawRecord,
    pub prediction_result: Option<f64>,
    pub error_message: Option<String>,
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate a submission, run the pipeline and record the outcome.
    pub fn submit(&mut self, raw: RawRecord, pipeline: &PredictPipeline) -> SubmitOutcome {
        self.form_data = raw;
        self.prediction_result = None;
        self.error_message = None;

        let record = match InputRecord::from_raw(&self.form_data) {
            Ok(record) => record,
            Err(e) => {
                info!(field = e.field(), error = %e, "Submission rejected");
                self.error_message = Some(validation_message(&e).to_string());
                return SubmitOutcome::Invalid;
            }
        };

        match pipeline.predict_record(&record) {
            Ok(score) => {
                self.prediction_result = Some(score);
                SubmitOutcome::Predicted
            }
            Err(e) => {
                warn!(error = %error_chain(&e), fatal = e.is_fatal(), "Submission failed");
                self.error_message = Some(e.user_message().to_string());
                SubmitOutcome::Failed
            }
        }
    }

    /// Text shown for a successful prediction
    pub fn summary(&self) -> Option<String> {
        self.prediction_result
            .map(|score| format!("Predicted Math Score: {score:.2}"))
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

fn validation_message(err: &ValidationError) -> &'static str {
    match err {
        ValidationError::MissingField(_) => MSG_MISSING_FIELDS,
        ValidationError::InvalidNumber { .. } | ValidationError::NonFinite { .. } => {
            MSG_INVALID_SCORES
        }
    }
}
