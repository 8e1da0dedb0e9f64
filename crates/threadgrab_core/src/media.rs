use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;
use url::Url;

/// Number of path segments a media URL needs: board, `src`, thread, file.
const MIN_SEGMENTS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TargetPathError {
    #[error("not an absolute url: {0}")]
    Unparsable(String),
    #[error("url has {found} path segments, at least 4 are required: {url}")]
    TooFewSegments { url: String, found: usize },
    #[error("url contains an unusable path segment {segment:?}: {url}")]
    UnusableSegment { url: String, segment: String },
}

/// Where a media file lands relative to the output root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetPath {
    pub dir_name: String,
    pub file_name: String,
}

impl TargetPath {
    /// Derives the path from the URL path segments: the directory joins the
    /// second-from-last and fourth-from-last segments with `_`, the file name
    /// is the last segment. `/b/src/123/456.jpg` maps to `123_b/456.jpg`.
    pub fn derive(url: &str) -> Result<Self, TargetPathError> {
        let parsed = Url::parse(url).map_err(|_| TargetPathError::Unparsable(url.to_string()))?;
        let segments: Vec<&str> = parsed
            .path_segments()
            .map(|segments| segments.collect())
            .unwrap_or_default();

        if segments.len() < MIN_SEGMENTS {
            return Err(TargetPathError::TooFewSegments {
                url: url.to_string(),
                found: segments.len(),
            });
        }

        let last = segments.len() - 1;
        let file_name = segments[last];
        let thread = segments[last - 1];
        let board = segments[last - 3];

        for segment in [file_name, thread, board] {
            if segment.is_empty() || segment == "." || segment == ".." {
                return Err(TargetPathError::UnusableSegment {
                    url: url.to_string(),
                    segment: segment.to_string(),
                });
            }
        }

        Ok(Self {
            dir_name: format!("{thread}_{board}"),
            file_name: file_name.to_string(),
        })
    }

    pub fn dir_under(&self, root: &Path) -> PathBuf {
        root.join(&self.dir_name)
    }

    pub fn file_under(&self, root: &Path) -> PathBuf {
        self.dir_under(root).join(&self.file_name)
    }
}

impl fmt::Display for TargetPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.dir_name, self.file_name)
    }
}

/// An absolute, directly fetchable media location with a derivable target.
///
/// The target is derived once at construction, so a queued `MediaUrl` can
/// always be mapped to disk.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MediaUrl {
    url: String,
    target: TargetPath,
}

impl MediaUrl {
    pub fn parse(url: impl Into<String>) -> Result<Self, TargetPathError> {
        let url = url.into();
        let target = TargetPath::derive(&url)?;
        Ok(Self { url, target })
    }

    /// Joins a site-relative path such as `/b/src/1/2.png` onto `origin`.
    pub fn from_relative(origin: &str, path: &str) -> Result<Self, TargetPathError> {
        let origin = origin.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Self::parse(format!("{origin}/{path}"))
    }

    pub fn as_str(&self) -> &str {
        &self.url
    }

    pub fn target_path(&self) -> &TargetPath {
        &self.target
    }
}

impl fmt::Display for MediaUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

impl AsRef<str> for MediaUrl {
    fn as_ref(&self) -> &str {
        &self.url
    }
}
