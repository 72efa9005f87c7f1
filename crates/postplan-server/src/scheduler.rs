use std::sync::Arc;

use postplan_pipeline::Pipeline;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler};

/// Starts the scheduler with the queue-poll job registered on `cron`.
///
/// # Errors
///
/// Returns an error if `cron` is not a valid expression or the scheduler
/// cannot start.
pub async fn build_scheduler(
    pipeline: Arc<Mutex<Pipeline>>,
    cron: &str,
) -> anyhow::Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;
    register_queue_job(&scheduler, pipeline, cron).await?;
    scheduler.start().await?;
    tracing::info!(cron, "scheduler started");
    Ok(scheduler)
}

async fn register_queue_job(
    scheduler: &JobScheduler,
    pipeline: Arc<Mutex<Pipeline>>,
    cron: &str,
) -> anyhow::Result<()> {
    let job = Job::new_async(cron, move |_uuid, _lock| {
        let pipeline = Arc::clone(&pipeline);
        Box::pin(async move {
            poll_queue(&pipeline).await;
        })
    })?;
    scheduler.add(job).await?;
    Ok(())
}

/// One queue poll. Skipped while a request holds the pipeline.
pub(crate) async fn poll_queue(pipeline: &Mutex<Pipeline>) -> bool {
    let Ok(mut pipeline) = pipeline.try_lock() else {
        tracing::info!("scheduler: pipeline busy, skipping queue poll");
        return false;
    };

    match pipeline.run_queue().await {
        Ok(report) => {
            if report.succeeded.is_empty() && report.failed.is_empty() {
                tracing::debug!("scheduler: queue empty");
            } else {
                tracing::info!(
                    succeeded = report.succeeded.len(),
                    failed = report.failed.len(),
                    "scheduler: queue processed"
                );
            }
        }
        Err(e) => tracing::error!(error = %e, "scheduler: queue processing failed"),
    }
    true
}
