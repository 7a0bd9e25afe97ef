//! NATS subscriber for incoming prediction requests

use crate::types::record::RawRecord;
use anyhow::Result;
use async_nats::{Client, Message, Subscriber};
use tracing::info;

/// Consumer for receiving prediction requests from NATS
pub struct RequestConsumer {
    client: Client,
    subject: String,
}

impl RequestConsumer {
    /// Create a new request consumer
    pub fn new(client: Client, subject: &str) -> Self {
        Self {
            client,
            subject: subject.to_string(),
        }
    }

    /// Subscribe to the request subject
    pub async fn subscribe(&self) -> Result<Subscriber> {
        let subscriber = self.client.subscribe(self.subject.clone()).await?;
        info!(subject = %self.subject, "Subscribed to request subject");
        Ok(subscriber)
    }

    /// Get the subject name
    pub fn subject(&self) -> &str {
        &self.subject
    }
}

/// Read a form submission from a message payload
pub fn decode_request(message: &Message) -> serde_json::Result<RawRecord> {
    decode_payload(&message.payload)
}

/// Read a form submission from raw JSON bytes
pub fn decode_payload(payload: &[u8]) -> serde_json::Result<RawRecord> {
    serde_json::from_slice(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_payload() {
        let payload = br#"{
            "gender": "female",
            "ethnicity": "group B",
            "parental_level_of_education": "bachelor's degree",
            "lunch": "standard",
            "test_preparation_course": "completed",
            "reading_score": "72",
            "writing_score": "74"
        }"#;
        let raw = decode_payload(payload).unwrap();
        assert_eq!(raw.ethnicity, "group B");
        assert_eq!(raw.writing_score, "74");
        assert!(!raw.has_empty_field());
    }

    #[test]
    fn test_decode_rejects_non_object() {
        assert!(decode_payload(b"[1, 2, 3]").is_err());
        assert!(decode_payload(b"not json").is_err());
    }
}
