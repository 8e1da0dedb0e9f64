use std::sync::Arc;

use grab_logging::{grab_debug, grab_error};
use threadgrab_core::MediaUrl;
use tokio::task::JoinSet;

use crate::download::Downloader;
use crate::events::ProgressSink;
use crate::queue::TaskReceiver;
use crate::retry::RetryPolicy;
use crate::{DownloadError, DownloadOutcome, EngineEvent, PoolReport};

/// A fixed set of download workers sharing one [`TaskReceiver`].
pub struct WorkerPool {
    workers: JoinSet<PoolReport>,
    size: usize,
}

impl WorkerPool {
    /// Starts `size` workers (at least one). Each runs until the queue is
    /// closed and drained.
    pub fn spawn(
        size: usize,
        queue: TaskReceiver,
        downloader: Arc<dyn Downloader>,
        retry: RetryPolicy,
        sink: Arc<dyn ProgressSink>,
    ) -> Self {
        let size = size.max(1);
        let mut workers = JoinSet::new();
        for worker_id in 0..size {
            workers.spawn(run_worker(
                worker_id,
                queue.clone(),
                downloader.clone(),
                retry,
                sink.clone(),
            ));
        }
        Self { workers, size }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Resolves once every worker has terminated.
    pub async fn join(mut self) -> PoolReport {
        let mut report = PoolReport {
            workers: self.size,
            ..PoolReport::default()
        };
        while let Some(result) = self.workers.join_next().await {
            match result {
                Ok(worker_report) => report.merge(worker_report),
                Err(err) => grab_error!("Download worker stopped abnormally: {}", err),
            }
        }
        report
    }
}

async fn run_worker(
    worker_id: usize,
    queue: TaskReceiver,
    downloader: Arc<dyn Downloader>,
    retry: RetryPolicy,
    sink: Arc<dyn ProgressSink>,
) -> PoolReport {
    let mut report = PoolReport::default();
    while let Some(url) = queue.next().await {
        process(&url, downloader.as_ref(), &retry, sink.as_ref(), &mut report).await;
    }
    grab_debug!("Worker {} done after {} tasks", worker_id, report.processed());
    report
}

async fn process(
    url: &MediaUrl,
    downloader: &dyn Downloader,
    retry: &RetryPolicy,
    sink: &dyn ProgressSink,
    report: &mut PoolReport,
) {
    let result = retry
        .run(
            |_| downloader.download(url),
            DownloadError::is_retryable,
            |attempt, err: &DownloadError| {
                sink.emit(EngineEvent::Retrying {
                    url: url.to_string(),
                    attempt: attempt + 1,
                    reason: err.to_string(),
                })
            },
        )
        .await;

    let path = downloader.target_file(url);
    match result {
        Ok((DownloadOutcome::Saved { bytes }, attempts)) => {
            report.saved += 1;
            report.attempts += u64::from(attempts);
            sink.emit(EngineEvent::Saved {
                url: url.to_string(),
                path,
                bytes,
            });
        }
        Ok((DownloadOutcome::AlreadyPresent, attempts)) => {
            report.already_present += 1;
            report.attempts += u64::from(attempts);
            sink.emit(EngineEvent::AlreadyPresent {
                url: url.to_string(),
                path,
            });
        }
        Err(failure) => {
            report.failed += 1;
            report.attempts += u64::from(failure.attempts);
            sink.emit(EngineEvent::Failed {
                url: url.to_string(),
                attempts: failure.attempts,
                reason: failure.error.to_string(),
            });
        }
    }
}
