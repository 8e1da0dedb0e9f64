//! Threadgrab engine: link extraction, the task queue and the download pool.
mod decode;
mod dispatch;
mod download;
mod engine;
mod events;
mod fetch;
mod links;
mod persist;
mod pool;
mod queue;
mod retry;
mod types;

pub use decode::{decode_page, DecodedPage};
pub use dispatch::DispatchStage;
pub use download::{Downloader, HttpDownloader};
pub use engine::Engine;
pub use events::{LogSink, ProgressSink};
pub use fetch::{build_client, FetchSettings, Fetcher, ReqwestFetcher};
pub use links::{extract_media_urls, LinkSource, PageLinkExtractor};
pub use persist::ensure_target_dir;
pub use pool::WorkerPool;
pub use queue::{task_queue, TaskReceiver, TaskSender};
pub use retry::{RetryError, RetryPolicy};
pub use types::{
    DispatchReport, DownloadError, DownloadOutcome, EngineEvent, FailureKind, FetchError,
    FetchMetadata, FetchOutput, PoolReport, RunSummary,
};
