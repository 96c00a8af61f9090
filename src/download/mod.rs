pub mod executor;
pub mod progress;

use std::path::{Path, PathBuf};

use indicatif::ProgressBar;
use tokio::io::AsyncWriteExt;
use url::Url;

use crate::error::Result;

pub struct DownloadClient {
    client: reqwest::Client,
}

impl DownloadClient {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("Mozilla/5.0 (Windows NT 10.0; rv:78.0) Gecko/20100101 Firefox/78.0")
            .build()?;

        Ok(Self { client })
    }

    /// Streams `url` into `output`.
    ///
    /// Bytes land in a `.part` sibling first and are renamed into place once the
    /// transfer completes, so a file at `output` is always a finished download.
    pub async fn download_to(&self, url: &Url, output: &Path, progress: &ProgressBar) -> Result<u64> {
        let response = match self.client.get(url.as_str()).send().await {
            Ok(response) => response,
            Err(err) => {
                tracing::error!(%url, %err, "request failed");
                return Err(err.into());
            }
        };

        if let Err(err) = response.error_for_status_ref() {
            tracing::error!(%url, %err, "server refused download");
            return Err(err.into());
        }

        if let Some(length) = response.content_length() {
            if progress.length().unwrap_or(0) == 0 {
                progress.set_length(length);
            }
        }

        let partial = partial_path(output);
        let written = match write_body(response, &partial, progress).await {
            Ok(written) => written,
            Err(err) => {
                tracing::error!(%url, %err, "transfer interrupted");
                if let Err(remove_err) = tokio::fs::remove_file(&partial).await {
                    tracing::warn!(partial = %partial.display(), err = %remove_err, "could not remove partial file");
                }
                return Err(err);
            }
        };
        tokio::fs::rename(&partial, output).await?;

        tracing::debug!(output = %output.display(), bytes = written, "download finished");
        Ok(written)
    }
}

async fn write_body(mut response: reqwest::Response, partial: &Path, progress: &ProgressBar) -> Result<u64> {
    let mut file = tokio::fs::File::create(partial).await?;
    let mut written = 0u64;

    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
        progress.set_position(written);
    }

    file.flush().await?;
    Ok(written)
}

fn partial_path(output: &Path) -> PathBuf {
    let mut name = output.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    output.with_file_name(name)
}
