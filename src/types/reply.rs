//! Reply published for every prediction request

use crate::form::FormState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::record::RawRecord;

/// Outcome of a request
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReplyStatus {
    /// A prediction was produced
    Ok,
    /// The submission failed validation; the caller should correct it
    Invalid,
    /// The pipeline failed
    Failed,
}

/// Prediction reply sent back to the requester
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionReply {
    /// Unique reply identifier
    pub reply_id: String,

    pub status: ReplyStatus,

    /// Predicted math score, passed through unrounded
    pub prediction: Option<f64>,

    /// User-facing error message
    pub error: Option<String>,

    /// The submission as received, for redisplay
    pub form_data: RawRecord,

    pub timestamp: DateTime<Utc>,
}

impl PredictionReply {
    /// Build a reply from the state left behind by a form submission
    pub fn from_state(state: &FormState, status: ReplyStatus) -> Self {
        Self {
            reply_id: uuid::Uuid::new_v4().to_string(),
            status,
            prediction: state.prediction_result,
            error: state.error_message.clone(),
            form_data: state.form_data.clone(),
            timestamp: Utc::now(),
        }
    }

    /// Reply for a payload that could not be read as a submission at all
    pub fn malformed(message: impl Into<String>) -> Self {
        Self {
            reply_id: uuid::Uuid::new_v4().to_string(),
            status: ReplyStatus::Invalid,
            prediction: None,
            error: Some(message.into()),
            form_data: RawRecord::default(),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_serialization() {
        let mut state = FormState::default();
        state.prediction_result = Some(62.77);
        state.form_data.gender = "female".to_string();

        let reply = PredictionReply::from_state(&state, ReplyStatus::Ok);
        let json = serde_json::to_string(&reply).unwrap();
        assert!(json.contains("\"status\":\"ok\""));

        let deserialized: PredictionReply = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.prediction, Some(62.77));
        assert_eq!(deserialized.form_data.gender, "female");
        assert_eq!(deserialized.reply_id, reply.reply_id);
    }

    #[test]
    fn test_malformed_reply() {
        let reply = PredictionReply::malformed("bad payload");
        assert_eq!(reply.status, ReplyStatus::Invalid);
        assert_eq!(reply.error.as_deref(), Some("bad payload"));
        assert!(reply.prediction.is_none());
    }
}
