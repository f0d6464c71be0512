use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::client::AnalyzeClient;
use crate::controller::{ReconcileReport, ResultsController};
use crate::intake::{CandidateFile, UploadBatch};

pub type SharedController = Arc<Mutex<ResultsController>>;
pub type SharedClient = Arc<dyn AnalyzeClient + Send + Sync>;

/// Submits one batch and applies its response.
///
/// The controller lock is only taken once the request has finished. On a
/// whole-request failure the error is logged, the placeholders are left
/// loading and the batch stops counting as in flight.
pub async fn run_batch<C: AnalyzeClient + Sync + Send + ?Sized>(
    controller: &Mutex<ResultsController>,
    client: &C,
    batch: UploadBatch,
) -> Option<ReconcileReport> {
    log::debug!("Submitting batch of {} file(s)", batch.len());

    match client.analyze(&batch.files).await {
        Ok(entries) => {
            let report = controller
                .lock()
                .await
                .reconcile(&batch.correlation, entries);
            log::info!(
                "Batch resolved: {} rendered, {} failed, {} unknown, {} duplicate",
                report.rendered,
                report.failed,
                report.unknown,
                report.duplicate
            );
            Some(report)
        }
        Err(e) => {
            log::error!("Batch of {} file(s) failed: {:#}", batch.len(), e);
            controller.lock().await.abandon_batch();
            None
        }
    }
}

/// Intake followed by a background submission.
///
/// Placeholders exist by the time this returns; `None` means no `.eml` file
/// was offered and nothing was sent.
pub async fn start_batch(
    controller: &SharedController,
    client: &SharedClient,
    candidates: Vec<CandidateFile>,
) -> Option<JoinHandle<Option<ReconcileReport>>> {
    let batch = controller.lock().await.intake(candidates)?;

    let controller = Arc::clone(controller);
    let client = Arc::clone(client);
    Some(tokio::spawn(async move {
        run_batch(&controller, client.as_ref(), batch).await
    }))
}
