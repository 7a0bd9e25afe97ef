//! Test Request Producer
//!
//! Sends generated form submissions to the score predictor over NATS and
//! logs the replies.

use rand::Rng;
use score_predictor::types::record::{
    RawRecord, GENDERS, LUNCH_TYPES, PARENTAL_EDUCATION_LEVELS, RACE_ETHNICITIES,
    TEST_PREPARATION_COURSES,
};
use score_predictor::types::reply::{PredictionReply, ReplyStatus};
use std::time::Duration;
use tracing::{info, warn};

/// Submission generator for testing
struct SubmissionGenerator {
    rng: rand::rngs::ThreadRng,
}

impl SubmissionGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
        }
    }

    /// Generate a complete, well-formed submission
    fn generate_valid(&mut self) -> RawRecord {
        let reading: f64 = self.rng.gen_range(20.0..100.0);
        // Writing tracks reading closely in the training data.
        let writing: f64 = (reading + self.rng.gen_range(-10.0..10.0)).clamp(0.0, 100.0);

        RawRecord {
            gender: self.random_choice(&GENDERS).to_string(),
            ethnicity: self.random_choice(&RACE_ETHNICITIES).to_string(),
            parental_level_of_education: self.random_choice(&PARENTAL_EDUCATION_LEVELS).to_string(),
            lunch: self.random_choice(&LUNCH_TYPES).to_string(),
            test_preparation_course: self.random_choice(&TEST_PREPARATION_COURSES).to_string(),
            reading_score: format!("{reading:.0}"),
            writing_score: format!("{writing:.0}"),
        }
    }

    /// Generate a submission the service should reject or fail on
    fn generate_malformed(&mut self) -> RawRecord {
        let mut raw = self.generate_valid();
        match self.rng.gen_range(0..4) {
            0 => raw.reading_score = "abc".to_string(),
            1 => raw.writing_score = String::new(),
            2 => raw.gender = String::new(),
            _ => raw.lunch = "packed".to_string(),
        }
        raw
    }

    fn random_choice<'a>(&mut self, choices: &[&'a str]) -> &'a str {
        choices[self.rng.gen_range(0..choices.len())]
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("request_producer=info".parse()?),
        )
        .init();

    info!("Starting Test Request Producer");

    let args: Vec<String> = std::env::args().collect();
    let nats_url = args.get(1).map(|s| s.as_str()).unwrap_or("nats://localhost:4222");
    let subject = args
        .get(2)
        .map(|s| s.as_str())
        .unwrap_or("predictions.requests");
    let count: u64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(100);
    let malformed_rate: f64 = args.get(4).and_then(|s| s.parse().ok()).unwrap_or(0.1);
    let delay_ms: u64 = args.get(5).and_then(|s| s.parse().ok()).unwrap_or(100);

    info!(
        nats_url = %nats_url,
        subject = %subject,
        count,
        malformed_rate,
        delay_ms,
        "Configuration loaded"
    );

    let client = match async_nats::connect(nats_url).await {
        Ok(c) => {
            info!("Connected to NATS");
            c
        }
        Err(e) => {
            warn!(error = %e, "Failed to connect to NATS. Running in dry-run mode.");
            return run_dry_mode(count, malformed_rate, delay_ms).await;
        }
    };

    let mut generator = SubmissionGenerator::new();
    let mut rng = rand::thread_rng();

    let mut ok_count = 0u64;
    let mut rejected_count = 0u64;

    for i in 0..count {
        let submission = if rng.gen_bool(malformed_rate) {
            generator.generate_malformed()
        } else {
            generator.generate_valid()
        };

        let payload = serde_json::to_vec(&submission)?;
        match client.request(subject.to_string(), payload.into()).await {
            Ok(message) => match serde_json::from_slice::<PredictionReply>(&message.payload) {
                Ok(reply) if reply.status == ReplyStatus::Ok => {
                    ok_count += 1;
                    info!(
                        reading = %submission.reading_score,
                        writing = %submission.writing_score,
                        prediction = ?reply.prediction,
                        "Prediction received"
                    );
                }
                Ok(reply) => {
                    rejected_count += 1;
                    info!(status = ?reply.status, error = ?reply.error, "Request rejected");
                }
                Err(e) => warn!(error = %e, "Unreadable reply"),
            },
            Err(e) => warn!(error = %e, "Request failed"),
        }

        if (i + 1) % 10 == 0 {
            info!(
                "Sent {}/{} requests ({} predicted, {} rejected)",
                i + 1,
                count,
                ok_count,
                rejected_count
            );
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    info!(
        "Completed! Sent {} requests ({} predicted, {} rejected)",
        count, ok_count, rejected_count
    );

    Ok(())
}

async fn run_dry_mode(count: u64, malformed_rate: f64, delay_ms: u64) -> anyhow::Result<()> {
    info!("Running in dry-run mode (no NATS connection)");

    let mut generator = SubmissionGenerator::new();
    let mut rng = rand::thread_rng();

    for i in 0..count {
        let submission = if rng.gen_bool(malformed_rate) {
            generator.generate_malformed()
        } else {
            generator.generate_valid()
        };

        if (i + 1) % 10 == 0 || i == 0 {
            let json = serde_json::to_string_pretty(&submission)?;
            info!("Sample submission {}:\n{}", i + 1, json);
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    Ok(())
}
