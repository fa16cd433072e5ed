use anyhow::Result;
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::fetcher::DataFetcher;

/// Polls on `schedule` until Ctrl-C; the first poll runs immediately
pub async fn create_and_run_scheduler(schedule: &str, data_fetcher: Arc<DataFetcher>) -> Result<()> {
    let mut scheduler = JobScheduler::new().await?;

    let job_data_fetcher = data_fetcher.clone();
    let job = Job::new_async(schedule, move |_uuid, _l| {
        let data_fetcher = job_data_fetcher.clone();
        Box::pin(async move {
            execute_fetch_job(data_fetcher).await;
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;

    execute_fetch_job(data_fetcher).await;

    tokio::signal::ctrl_c().await?;
    tracing::info!("stopping watcher");
    scheduler.shutdown().await?;

    Ok(())
}

async fn execute_fetch_job(data_fetcher: Arc<DataFetcher>) {
    println!(
        "[{}] Polling {} shipment(s)...",
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC"),
        data_fetcher.codes().len(),
    );
    println!("================================");

    match data_fetcher.run().await {
        Ok(transitions) => tracing::info!(changes = transitions.len(), "poll completed"),
        Err(e) => tracing::error!("Error during poll: {:?}", e),
    }
}
