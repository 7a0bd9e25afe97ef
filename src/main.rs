//! Score Predictor - Main Entry Point
//!
//! Answers prediction requests received over NATS. Each request carries a
//! raw form submission; the reply carries the predicted score or a
//! user-facing error together with the submitted values.

use anyhow::{Context, Result};
use futures::StreamExt;
use score_predictor::{
    config::AppConfig,
    consumer::{decode_request, RequestConsumer},
    form::{FormState, SubmitOutcome},
    logging,
    metrics::{MetricsReporter, PipelineMetrics},
    models::PredictPipeline,
    producer::ReplyProducer,
    types::reply::{PredictionReply, ReplyStatus},
};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config/config.toml".to_string());
    let config = AppConfig::load_from_path(&config_path)?;

    logging::init(&config.logging)?;
    info!(config = %config_path, "Starting Score Predictor");

    let pipeline = Arc::new(PredictPipeline::new(&config));
    pipeline
        .warm_up()
        .context("Failed to load prediction artifacts")?;

    let metrics = Arc::new(PipelineMetrics::with_band(pipeline.band()));

    let client = async_nats::connect(&config.nats.url).await?;
    info!("Connected to NATS at {}", config.nats.url);

    let consumer = RequestConsumer::new(client.clone(), &config.nats.request_subject);
    let producer = Arc::new(ReplyProducer::new(client.clone(), &config.nats.reply_subject));

    let num_workers = config.service.workers.max(1);
    info!(
        workers = num_workers,
        requests = %consumer.subject(),
        replies = %producer.subject(),
        "Starting request loop"
    );

    let semaphore = Arc::new(Semaphore::new(num_workers));

    let reporter = MetricsReporter::new(metrics.clone(), config.service.metrics_interval_secs);
    tokio::spawn(reporter.start());

    let mut subscription = consumer.subscribe().await?;

    while let Some(message) = subscription.next().await {
        let permit = semaphore
            .clone()
            .acquire_owned()
            .await
            .context("Worker semaphore closed")?;

        let pipeline = pipeline.clone();
        let producer = producer.clone();
        let metrics = metrics.clone();

        tokio::spawn(async move {
            let start_time = Instant::now();

            let reply = match decode_request(&message) {
                Ok(raw) => {
                    // Prediction is synchronous and may read artifacts from disk.
                    let handled = tokio::task::spawn_blocking(move || {
                        let mut state = FormState::new();
                        let outcome = state.submit(raw, &pipeline);
                        (state, outcome)
                    })
                    .await;

                    match handled {
                        Ok((state, outcome)) => {
                            let latency = start_time.elapsed();
                            metrics.record_request(latency, outcome, state.prediction_result);

                            let status = match outcome {
                                SubmitOutcome::Predicted => ReplyStatus::Ok,
                                SubmitOutcome::Invalid => ReplyStatus::Invalid,
                                SubmitOutcome::Failed => ReplyStatus::Failed,
                            };
                            debug!(
                                status = ?status,
                                prediction = ?state.prediction_result,
                                latency_us = latency.as_micros(),
                                "Request handled"
                            );
                            PredictionReply::from_state(&state, status)
                        }
                        Err(e) => {
                            error!(error = %e, "Prediction task panicked");
                            let mut state = FormState::new();
                            state.error_message = Some("Prediction service is unavailable".to_string());
                            PredictionReply::from_state(&state, ReplyStatus::Failed)
                        }
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Failed to deserialize request");
                    PredictionReply::malformed("Request must be a JSON object of form fields")
                }
            };

            if let Err(e) = producer.publish(&reply, message.reply.clone()).await {
                error!(reply_id = %reply.reply_id, error = %e, "Failed to publish reply");
            }

            drop(permit);
        });
    }

    info!("Request stream closed, shutting down");
    metrics.print_summary();

    Ok(())
}
