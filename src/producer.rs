//! NATS publisher for prediction replies

use crate::types::reply::PredictionReply;
use anyhow::Result;
use async_nats::{Client, Subject};
use tracing::debug;

/// Publishes replies to the requester's inbox, or to a fixed subject
#[derive(Clone)]
pub struct ReplyProducer {
    client: Client,
    subject: String,
}

impl ReplyProducer {
    /// Create a new reply producer with a fallback subject
    pub fn new(client: Client, subject: &str) -> Self {
        Self {
            client,
            subject: subject.to_string(),
        }
    }

    /// Publish a reply. `inbox` is the request's reply subject, if it had one.
    pub async fn publish(&self, reply: &PredictionReply, inbox: Option<Subject>) -> Result<()> {
        let payload = serde_json::to_vec(reply)?;
        let subject = inbox.unwrap_or_else(|| Subject::from(self.subject.as_str()));

        debug!(
            reply_id = %reply.reply_id,
            subject = %subject,
            status = ?reply.status,
            "Publishing prediction reply"
        );

        self.client.publish(subject, payload.into()).await?;
        Ok(())
    }

    /// Get the fallback subject name
    pub fn subject(&self) -> &str {
        &self.subject
    }
}

#[cfg(test)]
mod tests {
    // Publishing needs a running NATS server; see tools/request_producer.rs
}
