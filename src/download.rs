use std::path::{Path, PathBuf};

use kdam::{BarExt, tqdm};
use reqwest::Client;
use tokio::io::AsyncWriteExt;

use crate::{
    client::check_response,
    error::{Error, Result},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadOptions {
    /// Download even if the target file already exists.
    pub force: bool,
    /// Draw a byte progress bar on stderr.
    pub progress: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// The file was already present and `force` was off.
    Skipped(PathBuf),
    Downloaded { path: PathBuf, bytes: u64 },
}

impl DownloadOutcome {
    pub fn path(&self) -> &Path {
        match self {
            Self::Skipped(path) | Self::Downloaded { path, .. } => path,
        }
    }
}

/// The last path segment of `uri`, used as the local file name. Any query
/// string or fragment is dropped first.
pub fn file_name_from_uri(uri: &str) -> &str {
    let path = uri.split(['?', '#']).next().unwrap_or(uri);
    match path.rfind('/') {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

/// Sibling of `path` the body is streamed into before being moved in place.
fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    path.with_file_name(name)
}

/// Download every URI into `dest`, skipping files that already exist.
///
/// Downloads run one after another; the first failure aborts the rest.
pub async fn download(
    http: &Client,
    uris: &[String],
    dest: &Path,
) -> Result<Vec<DownloadOutcome>> {
    let mut outcomes = Vec::with_capacity(uris.len());
    for uri in uris {
        outcomes
            .push(download_one(http, uri, dest, DownloadOptions::default()).await?);
    }
    Ok(outcomes)
}

/// Stream `uri` into `dest/<last path segment>`.
///
/// `dest` is created when missing and must be a directory.
pub async fn download_one(
    http: &Client,
    uri: &str,
    dest: &Path,
    options: DownloadOptions,
) -> Result<DownloadOutcome> {
    if !dest.exists() {
        tokio::fs::create_dir_all(dest).await?;
    }
    if !dest.is_dir() {
        return Err(Error::NotADirectory(dest.to_path_buf()));
    }

    let file_name = file_name_from_uri(uri);
    if file_name.is_empty() {
        return Err(Error::Config(format!("no file name in URI: {uri}")));
    }
    let path = dest.join(file_name);

    if path.exists() {
        if !options.force {
            tracing::info!("{} already exists", path.display());
            return Ok(DownloadOutcome::Skipped(path));
        }
        tracing::info!("exists but force is set, downloading anyway");
    }

    let response = http.get(uri).send().await?;
    let mut response = check_response(&format!("GET {uri}"), response).await?;

    let mut bar = options.progress.then(|| {
        tqdm!(
            total = response.content_length().unwrap_or(0) as usize,
            desc = path.display().to_string(),
            unit = "iB",
            unit_scale = true,
            unit_divisor = 1024
        )
    });

    // Only a complete body is ever moved to `path`.
    let partial = partial_path(&path);
    let streamed = async {
        let mut file = tokio::fs::File::create(&partial).await?;
        let mut bytes = 0u64;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            bytes += chunk.len() as u64;
            if let Some(bar) = bar.as_mut() {
                bar.update(chunk.len())?;
            }
        }
        file.flush().await?;
        Ok::<_, Error>(bytes)
    }
    .await;

    let bytes = match streamed {
        Ok(bytes) => bytes,
        Err(e) => {
            if let Err(cleanup) = tokio::fs::remove_file(&partial).await {
                tracing::debug!(
                    path = %partial.display(),
                    error = %cleanup,
                    "could not remove partial download"
                );
            }
            return Err(e);
        }
    };
    tokio::fs::rename(&partial, &path).await?;

    if let Some(bar) = bar.as_mut() {
        bar.refresh()?;
        eprintln!();
    }

    tracing::debug!(bytes, path = %path.display(), "download finished");
    Ok(DownloadOutcome::Downloaded { path, bytes })
}
