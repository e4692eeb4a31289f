// ============================================================
// SUBMISSION DRIVER
// ============================================================
// Send the batch sequence strictly in order, then verify completion.
// All SubmissionState transitions happen here.

use std::time::Duration;

use tracing::{error, info, warn};

use crate::domain::batch::{
    update_state, CancelToken, RowBatch, SharedSubmissionState, SubmissionPhase,
};
use crate::domain::error::{IngestError, Result};
use crate::domain::ingest_config::IngestConfig;
use crate::infrastructure::review_api::{BatchRequest, ReviewApi};

/// Drive one submission through the batch sequence and completion
/// verification. Returns the confirmed result location, or `None` for a
/// degraded completion (terminal, but unconfirmed).
///
/// Batches are sent one at a time: the server accumulates rows keyed by
/// batch id and relies on in-order arrival to know when the set is
/// complete, so batch N+1 never leaves before batch N is acknowledged.
pub(crate) async fn drive_submission(
    api: &dyn ReviewApi,
    config: &IngestConfig,
    batches: &[RowBatch],
    sources: &[String],
    file_name: &str,
    state: &SharedSubmissionState,
    cancel: &CancelToken,
) -> Result<Option<String>> {
    let Some(first) = batches.first() else {
        return Err(IngestError::Internal(
            "submission started with no batches".to_string(),
        ));
    };
    let batch_id = first.batch_id.clone();
    let total_batches = batches.len() as u32;
    let total_rows: usize = batches.iter().map(|b| b.rows.len()).sum();

    update_state(state, |s| {
        s.batch_id = batch_id.clone();
        s.message = format!(
            "Processing {} rows in {} batches...",
            total_rows, total_batches
        );
    });
    info!(%batch_id, total_rows, total_batches, file_name, "Starting chunked submission");

    let mut rows_sent = 0usize;
    for batch in batches {
        if cancel.is_cancelled() {
            return fail_cancelled(state);
        }

        let number = batch.batch_number;
        update_state(state, |s| {
            s.phase = SubmissionPhase::SendingBatch(number);
            s.message = format!(
                "Sending batch {} of {} ({} of {} rows)...",
                number,
                total_batches,
                rows_sent + batch.rows.len(),
                total_rows
            );
        });

        let request = BatchRequest {
            batch_id: &batch.batch_id,
            batch_number: batch.batch_number,
            total_batches: batch.total_batches,
            rows: &batch.rows,
            sources,
            file_name,
            is_final: batch.is_final,
        };

        let ack = match api.submit_batch(&request).await {
            Ok(ack) => ack,
            Err(err) => {
                error!(%batch_id, batch_number = number, error = %err, "Batch submission failed");
                fail(state, &err.to_string());
                return Err(err);
            }
        };
        rows_sent += batch.rows.len();

        if !batch.is_final {
            let computed = sending_percent(number, total_batches, config.sending_percent_span);
            let percent = ack.progress.unwrap_or(computed);
            update_state(state, |s| s.percent = percent);
            continue;
        }

        // Final batch. A result location in the ack means processing
        // completed synchronously; otherwise the server may still be
        // assembling the result and verification takes over.
        if let Some(location) = ack.result_location {
            info!(%batch_id, location, "Final batch acknowledged with result");
            complete(state, Some(location.clone()));
            return Ok(Some(location));
        }

        info!(%batch_id, "Final batch acknowledged without result, verifying");
        update_state(state, |s| {
            s.percent = config.waiting_percent;
            s.message = "Generating final report...".to_string();
        });
    }

    verify_completion(api, config, &batch_id, state, cancel).await
}

/// Poll the status endpoint up to the configured number of attempts
/// with linear backoff. Exhausting the budget is not a failure: the
/// computation may legitimately still be finishing server-side, so the
/// state commits as a degraded completion rather than spinning forever.
async fn verify_completion(
    api: &dyn ReviewApi,
    config: &IngestConfig,
    batch_id: &str,
    state: &SharedSubmissionState,
    cancel: &CancelToken,
) -> Result<Option<String>> {
    for attempt in 1..=config.verify_attempts {
        if cancel.is_cancelled() {
            return fail_cancelled(state);
        }
        update_state(state, |s| {
            s.phase = SubmissionPhase::AwaitingVerification(attempt)
        });

        match api.fetch_status(batch_id).await {
            Ok(status) if status.ready => {
                info!(batch_id, attempt, "Submission result confirmed");
                complete(state, status.result_location.clone());
                return Ok(status.result_location);
            }
            Ok(_) => {
                info!(batch_id, attempt, "Result not ready yet");
            }
            Err(err) => {
                // Post-final-batch policy is asymmetric: a flaky status
                // endpoint must not fail an already-accepted submission.
                warn!(batch_id, attempt, error = %err, "Status poll failed, treating as not ready");
            }
        }

        if attempt < config.verify_attempts {
            let delay = Duration::from_millis(config.verify_base_delay_ms * attempt as u64);
            if sleep_cancellable(delay, cancel).await.is_err() {
                return fail_cancelled(state);
            }
        }
    }

    warn!(batch_id, "Verification budget exhausted, committing degraded completion");
    update_state(state, |s| {
        s.phase = SubmissionPhase::Done;
        s.percent = 100;
        s.failed = false;
        s.message =
            "Processing complete. The result could not be confirmed and may still be finalizing on the server."
                .to_string();
    });
    Ok(None)
}

pub(crate) fn sending_percent(batch_number: u32, total_batches: u32, span: u8) -> u8 {
    ((batch_number as f64 / total_batches as f64) * span as f64).round() as u8
}

fn complete(state: &SharedSubmissionState, result_location: Option<String>) {
    update_state(state, |s| {
        s.phase = SubmissionPhase::Done;
        s.percent = 100;
        s.failed = false;
        s.result_location = result_location;
        s.message = "Complete!".to_string();
    });
}

fn fail(state: &SharedSubmissionState, message: &str) {
    update_state(state, |s| {
        s.phase = SubmissionPhase::Failed;
        s.failed = true;
        s.message = message.to_string();
    });
}

fn fail_cancelled(state: &SharedSubmissionState) -> Result<Option<String>> {
    fail(state, "Submission cancelled");
    Err(IngestError::Cancelled)
}

/// Sleep in short ticks so a cancellation request interrupts the delay
/// instead of waiting it out.
async fn sleep_cancellable(duration: Duration, cancel: &CancelToken) -> Result<()> {
    const TICK: Duration = Duration::from_millis(50);

    let mut remaining = duration;
    while !remaining.is_zero() {
        if cancel.is_cancelled() {
            return Err(IngestError::Cancelled);
        }
        let step = remaining.min(TICK);
        tokio::time::sleep(step).await;
        remaining -= step;
    }
    if cancel.is_cancelled() {
        return Err(IngestError::Cancelled);
    }
    Ok(())
}
