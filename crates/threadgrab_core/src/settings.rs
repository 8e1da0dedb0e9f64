use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_SITE_ORIGIN: &str = "https://2ch.hk";
pub const DEFAULT_STICKER_PREFIX: &str = "/stickers/";

/// Which markup the link extractor looks for on a thread page.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ExtractPattern {
    /// Anchors shaped like `href="/<board>/src/<thread>/<file>.<ext>"`.
    #[default]
    SourceHref,
    /// `<img data-src="...">` tags, skipping values under `excluded_prefix`.
    ImageDataSrc { excluded_prefix: String },
}

/// Immutable run configuration, built once at startup and shared by the
/// dispatch stage and the worker pool.
#[derive(Debug, Clone)]
pub struct HarvestSettings {
    /// Download workers; also the capacity of the task queue.
    pub workers: usize,
    /// Attempts allowed after the first failed one.
    pub retry_budget: u32,
    pub retry_base_delay: Duration,
    pub retry_max_delay: Duration,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub redirect_limit: usize,
    pub max_page_bytes: u64,
    pub site_origin: String,
    pub pattern: ExtractPattern,
    pub output_root: PathBuf,
}

impl Default for HarvestSettings {
    fn default() -> Self {
        Self {
            workers: 5,
            retry_budget: 5,
            retry_base_delay: Duration::from_millis(500),
            retry_max_delay: Duration::from_secs(8),
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            redirect_limit: 5,
            max_page_bytes: 16 * 1024 * 1024,
            site_origin: DEFAULT_SITE_ORIGIN.to_string(),
            pattern: ExtractPattern::default(),
            output_root: PathBuf::from("."),
        }
    }
}

impl HarvestSettings {
    /// Worker count clamped to at least one; a zero-capacity queue cannot exist.
    pub fn worker_count(&self) -> usize {
        self.workers.max(1)
    }
}
