//! Platform backed by the `yt-dlp` executable.
//!
//! yt-dlp is only asked for metadata (`-J`). The chosen stream is fetched
//! directly over HTTP by [`DownloadClient`], so progress is reported per byte.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use indicatif::ProgressBar;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::process::Command;
use url::Url;

use crate::download::DownloadClient;
use crate::error::{Error, Result};

use super::{Platform, StreamVariant, TrackKind, VideoHandle};

pub struct YtDlp {
    bin: PathBuf,
    client: DownloadClient,
}

impl YtDlp {
    pub fn new(bin: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self {
            bin: bin.into(),
            client: DownloadClient::new()?,
        })
    }

    async fn dump_json<T, I, S>(&self, args: I) -> Result<T>
    where
        T: DeserializeOwned,
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let tool = self.bin.display().to_string();
        let mut command = Command::new(&self.bin);
        command
            .arg("-J")
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        tracing::debug!(?command, "running yt-dlp");

        let output = command
            .output()
            .await
            .map_err(|source| Error::Spawn { tool: tool.clone(), source })?;

        if !output.status.success() {
            return Err(Error::ToolFailed {
                tool,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(serde_json::from_slice(&output.stdout)?)
    }
}

#[async_trait]
impl Platform for YtDlp {
    async fn playlist_urls(&self, url: &str) -> Result<Vec<String>> {
        let playlist: PlaylistInfo = self.dump_json(["--flat-playlist", url]).await?;
        playlist
            .video_urls()
            .ok_or_else(|| Error::Unavailable(format!("{} is not a playlist", url)))
    }

    async fn video(&self, url: &str) -> Result<VideoHandle> {
        let info: VideoInfo = self.dump_json(["--no-playlist", url]).await?;
        Ok(info.into_handle(url))
    }

    async fn download(
        &self,
        stream: &StreamVariant,
        output: &Path,
        progress: &ProgressBar,
    ) -> Result<u64> {
        let url = Url::parse(&stream.url)?;
        self.client.download_to(&url, output, progress).await
    }
}

#[derive(Deserialize, Debug)]
struct PlaylistInfo {
    entries: Option<Vec<PlaylistEntry>>,
}

#[derive(Deserialize, Debug)]
struct PlaylistEntry {
    id: Option<String>,
    url: Option<String>,
}

impl PlaylistInfo {
    /// Watch URLs of the entries, or `None` when the info is not a playlist.
    fn video_urls(self) -> Option<Vec<String>> {
        let urls = self
            .entries?
            .into_iter()
            .filter_map(|entry| match (entry.url, entry.id) {
                (Some(url), _) if url.starts_with("http") => Some(url),
                (_, Some(id)) => Some(format!("https://www.youtube.com/watch?v={}", id)),
                _ => None,
            })
            .collect();
        Some(urls)
    }
}

#[derive(Deserialize, Debug)]
struct VideoInfo {
    id: String,
    title: String,
    webpage_url: Option<String>,
    #[serde(default)]
    formats: Vec<FormatInfo>,
}

#[derive(Deserialize, Debug)]
struct FormatInfo {
    format_id: String,
    ext: String,
    url: Option<String>,
    protocol: Option<String>,
    vcodec: Option<String>,
    acodec: Option<String>,
    height: Option<u32>,
    filesize: Option<u64>,
    filesize_approx: Option<f64>,
    abr: Option<f64>,
    tbr: Option<f64>,
}

fn has_track(codec: &Option<String>) -> bool {
    codec.as_deref().is_some_and(|codec| codec != "none")
}

impl FormatInfo {
    fn kind(&self) -> Option<TrackKind> {
        match (has_track(&self.vcodec), has_track(&self.acodec)) {
            (true, true) => Some(TrackKind::Progressive),
            (true, false) => Some(TrackKind::VideoOnly),
            (false, true) => Some(TrackKind::AudioOnly),
            (false, false) => None,
        }
    }

    fn is_direct(&self) -> bool {
        matches!(self.protocol.as_deref(), Some("https") | Some("http"))
    }

    fn into_variant(self) -> Option<StreamVariant> {
        if !self.is_direct() {
            return None;
        }
        let kind = self.kind()?;
        let url = self.url?;

        Some(StreamVariant {
            format_id: self.format_id,
            ext: self.ext,
            height: self.height,
            kind,
            filesize: self
                .filesize
                .or_else(|| self.filesize_approx.map(|size| size as u64)),
            bitrate: self.abr.or(self.tbr),
            url,
        })
    }
}

impl VideoInfo {
    fn into_handle(self, requested: &str) -> VideoHandle {
        VideoHandle {
            id: self.id,
            title: self.title,
            watch_url: self.webpage_url.unwrap_or_else(|| requested.to_string()),
            streams: self
                .formats
                .into_iter()
                .filter_map(FormatInfo::into_variant)
                .collect(),
        }
    }
}
