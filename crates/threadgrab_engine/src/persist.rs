use std::path::Path;

use futures_util::StreamExt;
use tempfile::Builder;
use tokio::io::AsyncWriteExt;

use crate::fetch::map_reqwest_error;
use crate::DownloadError;

const PARTIAL_PREFIX: &str = ".part-";

/// Ensure the target directory exists; create it and its parents if missing.
pub async fn ensure_target_dir(dir: &Path) -> Result<(), DownloadError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| DownloadError::CreateDir {
            path: dir.to_path_buf(),
            source,
        })
}

/// Stream a response body into a temp file next to `target`, then rename it
/// into place. On any error the temp file is removed, so `target` only ever
/// exists with a complete body.
pub(crate) async fn stream_into_place(
    response: reqwest::Response,
    target: &Path,
) -> Result<u64, DownloadError> {
    let dir = target.parent().unwrap_or_else(|| Path::new("."));
    let write_err = |source| DownloadError::Write {
        path: target.to_path_buf(),
        source,
    };

    let temp = Builder::new()
        .prefix(PARTIAL_PREFIX)
        .tempfile_in(dir)
        .map_err(write_err)?;
    let mut file = tokio::fs::File::from_std(temp.reopen().map_err(write_err)?);

    let mut written: u64 = 0;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(map_reqwest_error)?;
        file.write_all(&chunk).await.map_err(write_err)?;
        written += chunk.len() as u64;
    }
    file.flush().await.map_err(write_err)?;
    file.sync_all().await.map_err(write_err)?;
    drop(file);

    temp.persist(target).map_err(|err| write_err(err.error))?;
    Ok(written)
}
