use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutput {
    pub bytes: Vec<u8>,
    pub metadata: FetchMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchMetadata {
    /// Address after redirects.
    pub final_url: String,
    pub content_type: Option<String>,
    pub byte_len: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    RedirectLimitExceeded,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::RedirectLimitExceeded => write!(f, "redirect limit exceeded"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::Network => write!(f, "network error"),
        }
    }
}

/// Failure of a single download attempt.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("cannot create directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("failed writing {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DownloadError {
    /// Fetch and write failures get another attempt. An uncreatable
    /// directory will fail the same way every time.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DownloadError::Fetch(_) | DownloadError::Write { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// Body fetched and moved into place.
    Saved { bytes: u64 },
    /// Target already on disk; nothing fetched.
    AlreadyPresent,
}

/// Everything the engine reports while running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    SeedScanned { seed: String, links: usize },
    Saved { url: String, path: PathBuf, bytes: u64 },
    AlreadyPresent { url: String, path: PathBuf },
    Retrying { url: String, attempt: u32, reason: String },
    Failed { url: String, attempts: u32, reason: String },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub seeds: usize,
    pub seeds_without_links: usize,
    pub enqueued: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolReport {
    pub workers: usize,
    pub saved: usize,
    pub already_present: usize,
    pub failed: usize,
    pub attempts: u64,
}

impl PoolReport {
    pub fn processed(&self) -> usize {
        self.saved + self.already_present + self.failed
    }

    pub(crate) fn merge(&mut self, other: PoolReport) {
        self.saved += other.saved;
        self.already_present += other.already_present;
        self.failed += other.failed;
        self.attempts += other.attempts;
    }
}

/// Final tally of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub dispatch: DispatchReport,
    pub pool: PoolReport,
    pub elapsed: Duration,
}
