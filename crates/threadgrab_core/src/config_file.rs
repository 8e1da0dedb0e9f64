use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::seed::{parse_seed_lines, SeedList};

/// File name looked up in the working directory when no path is given.
pub const DEFAULT_SEED_FILE: &str = "urls.txt";

#[derive(Debug, Error)]
pub enum ConfigError {
    /// First run: the file did not exist and an empty one was created.
    #[error("{} file is not found and was created, add thread URLs to it", .0.display())]
    Created(PathBuf),
    #[error("{} file is empty", .0.display())]
    Empty(PathBuf),
    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ConfigError {
    /// Created and Empty are expected states that only need user action.
    pub fn is_not_configured(&self) -> bool {
        matches!(self, ConfigError::Created(_) | ConfigError::Empty(_))
    }
}

/// Reads and validates the seed file at `path`.
///
/// A missing file is created empty and reported as [`ConfigError::Created`].
/// A file holding only whitespace is [`ConfigError::Empty`].
pub fn load_seed_file(path: &Path) -> Result<SeedList, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            fs::File::create(path).map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            return Err(ConfigError::Created(path.to_path_buf()));
        }
        Err(source) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    if content.trim().is_empty() {
        return Err(ConfigError::Empty(path.to_path_buf()));
    }

    Ok(parse_seed_lines(&content))
}
