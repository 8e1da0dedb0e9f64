use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use grab_logging::{grab_debug, grab_warn};
use threadgrab_core::SeedUrl;
use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;

use crate::events::ProgressSink;
use crate::links::LinkSource;
use crate::queue::TaskSender;
use crate::{DispatchReport, EngineEvent};

/// Fans seeds out to one task each and feeds every link they find into the
/// task queue.
pub struct DispatchStage {
    source: Arc<dyn LinkSource>,
    sink: Arc<dyn ProgressSink>,
}

#[derive(Default)]
struct Counters {
    enqueued: AtomicUsize,
    without_links: AtomicUsize,
}

impl DispatchStage {
    pub fn new(source: Arc<dyn LinkSource>, sink: Arc<dyn ProgressSink>) -> Self {
        Self { source, sink }
    }

    /// Starts one task per seed and a coordinator that waits for all of them.
    ///
    /// `queue` is moved into the coordinator and dropped only after the last
    /// seed task has finished, which closes the queue exactly once. The
    /// returned handle resolves after that point.
    pub fn spawn(self, seeds: Vec<SeedUrl>, queue: TaskSender) -> JoinHandle<DispatchReport> {
        tokio::spawn(async move {
            let seed_count = seeds.len();
            let counters = Arc::new(Counters::default());
            let tracker = TaskTracker::new();

            for seed in seeds {
                let source = self.source.clone();
                let sink = self.sink.clone();
                let queue = queue.clone();
                let counters = counters.clone();
                tracker.spawn(async move {
                    let urls = source.collect(&seed).await;
                    sink.emit(EngineEvent::SeedScanned {
                        seed: seed.to_string(),
                        links: urls.len(),
                    });
                    if urls.is_empty() {
                        counters.without_links.fetch_add(1, Ordering::Relaxed);
                        return;
                    }
                    for url in urls {
                        if let Err(url) = queue.send(url).await {
                            grab_warn!("Task queue closed early, dropping {} and the rest of {}", url, seed);
                            break;
                        }
                        counters.enqueued.fetch_add(1, Ordering::Relaxed);
                    }
                });
            }

            tracker.close();
            tracker.wait().await;
            drop(queue);

            let report = DispatchReport {
                seeds: seed_count,
                seeds_without_links: counters.without_links.load(Ordering::Relaxed),
                enqueued: counters.enqueued.load(Ordering::Relaxed),
            };
            grab_debug!(
                "Dispatch finished: {} seeds, {} links queued, task queue closed",
                report.seeds,
                report.enqueued
            );
            report
        })
    }
}
