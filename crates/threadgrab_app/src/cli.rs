use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use threadgrab_core::{
    ExtractPattern, HarvestSettings, DEFAULT_SEED_FILE, DEFAULT_SITE_ORIGIN,
    DEFAULT_STICKER_PREFIX,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PatternArg {
    /// `href="/<board>/src/<thread>/<file>"` anchors.
    SourceHref,
    /// `<img data-src="...">` tags.
    ImageDataSrc,
}

/// Download every media file linked from a list of imageboard threads.
#[derive(Debug, Parser)]
#[command(name = "threadgrab", version, about)]
pub struct Cli {
    /// File with one thread URL per line.
    #[arg(long, default_value = DEFAULT_SEED_FILE)]
    pub config: PathBuf,

    /// Directory the `<thread>_<board>` folders are created in.
    #[arg(long, default_value = ".")]
    pub output: PathBuf,

    /// Concurrent download workers.
    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u16).range(1..))]
    pub workers: u16,

    /// Extra attempts for a failed download.
    #[arg(long, default_value_t = 5)]
    pub retries: u32,

    /// Delay before the first retry, doubled for each further one.
    #[arg(long, default_value_t = 500)]
    pub retry_delay_ms: u64,

    /// Time limit in seconds for a whole request, body included.
    ///
    /// Applies to thread pages and media alike; raise it for large videos on
    /// a slow link, since every retry starts the clock over.
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,

    /// Origin prefixed to the relative media paths found on a page.
    #[arg(long, default_value = DEFAULT_SITE_ORIGIN)]
    pub origin: String,

    #[arg(long, value_enum, default_value_t = PatternArg::SourceHref)]
    pub pattern: PatternArg,

    /// Image paths under this prefix are ignored by `image-data-src`.
    #[arg(long, default_value = DEFAULT_STICKER_PREFIX)]
    pub sticker_prefix: String,

    /// Exit without waiting for Enter.
    #[arg(long)]
    pub no_pause: bool,

    /// Also write the log to this file.
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn settings(&self) -> HarvestSettings {
        let defaults = HarvestSettings::default();
        let retry_base_delay = Duration::from_millis(self.retry_delay_ms);
        HarvestSettings {
            workers: usize::from(self.workers),
            retry_budget: self.retries,
            retry_base_delay,
            retry_max_delay: defaults.retry_max_delay.max(retry_base_delay),
            request_timeout: Duration::from_secs(self.timeout_secs),
            site_origin: self.origin.clone(),
            pattern: match self.pattern {
                PatternArg::SourceHref => ExtractPattern::SourceHref,
                PatternArg::ImageDataSrc => ExtractPattern::ImageDataSrc {
                    excluded_prefix: self.sticker_prefix.clone(),
                },
            },
            output_root: self.output.clone(),
            ..defaults
        }
    }
}
