pub mod ytdlp;

use std::fmt;
use std::path::Path;

use async_trait::async_trait;
use indicatif::ProgressBar;

use crate::error::Result;

pub use ytdlp::YtDlp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    /// audio and video in one stream
    Progressive,
    VideoOnly,
    AudioOnly,
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let label = match self {
            TrackKind::Progressive => "progressive",
            TrackKind::VideoOnly => "video-only",
            TrackKind::AudioOnly => "audio-only",
        };
        f.write_str(label)
    }
}

/// One downloadable variant of a video as reported by the platform.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamVariant {
    pub format_id: String,
    pub ext: String,
    pub height: Option<u32>,
    pub kind: TrackKind,
    pub filesize: Option<u64>,
    /// audio bitrate in kbit/s, used to rank audio-only variants
    pub bitrate: Option<f64>,
    pub url: String,
}

impl StreamVariant {
    pub fn resolution(&self) -> Option<String> {
        match self.kind {
            TrackKind::AudioOnly => None,
            _ => self.height.map(|height| format!("{}p", height)),
        }
    }

    pub fn is_progressive(&self) -> bool {
        self.kind == TrackKind::Progressive
    }

    pub fn size_mib(&self) -> f64 {
        self.filesize.unwrap_or(0) as f64 / (1024.0 * 1024.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VideoHandle {
    pub id: String,
    pub title: String,
    pub watch_url: String,
    pub streams: Vec<StreamVariant>,
}

impl VideoHandle {
    /// Variants in the given container, highest resolution first.
    pub fn streams_by_resolution(&self, ext: &str) -> Vec<&StreamVariant> {
        let mut streams = self
            .streams
            .iter()
            .filter(|stream| stream.ext == ext)
            .collect::<Vec<_>>();
        streams.sort_by(|a, b| b.height.unwrap_or(0).cmp(&a.height.unwrap_or(0)));
        streams
    }

    pub fn best_audio(&self, ext: &str) -> Option<&StreamVariant> {
        self.streams
            .iter()
            .filter(|stream| stream.kind == TrackKind::AudioOnly && stream.ext == ext)
            .max_by(|a, b| {
                let a = a.bitrate.unwrap_or(0.0);
                let b = b.bitrate.unwrap_or(0.0);
                a.total_cmp(&b)
            })
    }
}

/// The video platform: metadata lookup and byte-level transfers.
#[async_trait]
pub trait Platform: Send + Sync {
    async fn playlist_urls(&self, url: &str) -> Result<Vec<String>>;

    async fn video(&self, url: &str) -> Result<VideoHandle>;

    /// Transfers `stream` to `output`, returning the number of bytes written.
    async fn download(
        &self,
        stream: &StreamVariant,
        output: &Path,
        progress: &ProgressBar,
    ) -> Result<u64>;
}
