use std::sync::Arc;
use std::time::Instant;

use grab_logging::{grab_error, grab_info};
use threadgrab_core::{HarvestSettings, SeedUrl};

use crate::dispatch::DispatchStage;
use crate::download::{Downloader, HttpDownloader};
use crate::events::{LogSink, ProgressSink};
use crate::fetch::{build_client, FetchSettings, ReqwestFetcher};
use crate::links::{LinkSource, PageLinkExtractor};
use crate::pool::WorkerPool;
use crate::queue::task_queue;
use crate::retry::RetryPolicy;
use crate::{DispatchReport, FetchError, RunSummary};

/// Wires the dispatch stage, the task queue and the worker pool together.
pub struct Engine {
    settings: HarvestSettings,
    source: Arc<dyn LinkSource>,
    downloader: Arc<dyn Downloader>,
    sink: Arc<dyn ProgressSink>,
}

impl Engine {
    /// HTTP-backed engine: one shared client for pages and media.
    pub fn new(settings: HarvestSettings) -> Result<Self, FetchError> {
        let fetch_settings = FetchSettings::from(&settings);
        let client = build_client(&fetch_settings)?;

        let fetcher = ReqwestFetcher::with_client(client.clone(), fetch_settings.max_bytes);
        let source = PageLinkExtractor::new(
            Arc::new(fetcher),
            settings.pattern.clone(),
            settings.site_origin.clone(),
        );
        let downloader = HttpDownloader::new(client, settings.output_root.clone());

        Ok(Self::with_parts(
            settings,
            Arc::new(source),
            Arc::new(downloader),
            Arc::new(LogSink),
        ))
    }

    pub fn with_parts(
        settings: HarvestSettings,
        source: Arc<dyn LinkSource>,
        downloader: Arc<dyn Downloader>,
        sink: Arc<dyn ProgressSink>,
    ) -> Self {
        Self {
            settings,
            source,
            downloader,
            sink,
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Runs every seed through the pipeline and waits for the pool to drain.
    ///
    /// Per-seed and per-file failures are reported through the sink and
    /// counted in the summary; they never end the run early.
    pub async fn run(&self, seeds: Vec<SeedUrl>) -> RunSummary {
        let started = Instant::now();
        let workers = self.settings.worker_count();
        grab_info!("Starting {} workers for {} seeds", workers, seeds.len());

        let (sender, receiver) = task_queue(workers);
        let pool = WorkerPool::spawn(
            workers,
            receiver,
            self.downloader.clone(),
            RetryPolicy::from(&self.settings),
            self.sink.clone(),
        );

        let dispatch = DispatchStage::new(self.source.clone(), self.sink.clone())
            .spawn(seeds, sender)
            .await
            .unwrap_or_else(|err| {
                grab_error!("Dispatch coordinator stopped abnormally: {}", err);
                DispatchReport::default()
            });

        let pool = pool.join().await;

        RunSummary {
            dispatch,
            pool,
            elapsed: started.elapsed(),
        }
    }

    /// Runs on a dedicated multi-threaded runtime and blocks until done.
    pub fn run_blocking(&self, seeds: Vec<SeedUrl>) -> std::io::Result<RunSummary> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("threadgrab")
            .build()?;
        Ok(runtime.block_on(self.run(seeds)))
    }
}
