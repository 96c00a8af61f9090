//! In-memory stand-ins for the platform and the muxing tool.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use indicatif::ProgressBar;

use crate::error::{Error, Result};
use crate::merge::Muxer;
use crate::options::Options;
use crate::platform::{Platform, StreamVariant, TrackKind, VideoHandle};

pub fn stream(format_id: &str, ext: &str, height: Option<u32>, kind: TrackKind) -> StreamVariant {
    StreamVariant {
        format_id: format_id.to_string(),
        ext: ext.to_string(),
        height,
        kind,
        filesize: Some(2 * 1024 * 1024),
        bitrate: None,
        url: format!("https://cdn.test/{}", format_id),
    }
}

pub fn video(id: &str, title: &str, streams: Vec<StreamVariant>) -> VideoHandle {
    VideoHandle {
        id: id.to_string(),
        title: title.to_string(),
        watch_url: format!("https://www.youtube.com/watch?v={}", id),
        streams,
    }
}

/// A video offering 720p progressive, 1080p video-only and m4a audio.
pub fn full_video(id: &str, title: &str) -> VideoHandle {
    video(
        id,
        title,
        vec![
            stream("137", "mp4", Some(1080), TrackKind::VideoOnly),
            stream("22", "mp4", Some(720), TrackKind::Progressive),
            stream("140", "m4a", None, TrackKind::AudioOnly),
        ],
    )
}

pub fn watch_url(id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", id)
}

pub fn temp_options(root: &Path) -> Options {
    let options = Options::new(
        root.join("videos"),
        root.join("audio"),
        root.join("merged"),
    );
    options.ensure_dirs().unwrap();
    options
}

#[derive(Default)]
pub struct FakePlatform {
    videos: HashMap<String, VideoHandle>,
    playlists: HashMap<String, Vec<String>>,
    lookups: Mutex<Vec<String>>,
    downloads: Mutex<Vec<(String, PathBuf)>>,
}

impl FakePlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_video(mut self, url: &str, video: VideoHandle) -> Self {
        self.videos.insert(url.to_string(), video);
        self
    }

    pub fn with_playlist(mut self, url: &str, urls: &[&str]) -> Self {
        self.playlists
            .insert(url.to_string(), urls.iter().map(|url| url.to_string()).collect());
        self
    }

    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().unwrap().clone()
    }

    /// `(format_id, output)` for every transfer so far.
    pub fn downloads(&self) -> Vec<(String, PathBuf)> {
        self.downloads.lock().unwrap().clone()
    }
}

#[async_trait]
impl Platform for FakePlatform {
    async fn playlist_urls(&self, url: &str) -> Result<Vec<String>> {
        self.playlists
            .get(url)
            .cloned()
            .ok_or_else(|| Error::Unavailable(format!("playlist {} does not exist", url)))
    }

    async fn video(&self, url: &str) -> Result<VideoHandle> {
        self.lookups.lock().unwrap().push(url.to_string());
        self.videos
            .get(url)
            .cloned()
            .ok_or_else(|| Error::Unavailable(format!("video {} is unavailable", url)))
    }

    async fn download(
        &self,
        stream: &StreamVariant,
        output: &Path,
        _progress: &ProgressBar,
    ) -> Result<u64> {
        std::fs::write(output, stream.format_id.as_bytes())?;
        self.downloads
            .lock()
            .unwrap()
            .push((stream.format_id.clone(), output.to_path_buf()));
        Ok(stream.format_id.len() as u64)
    }
}

#[derive(Default)]
pub struct RecordingMuxer {
    fail: bool,
    calls: Mutex<Vec<(PathBuf, PathBuf, PathBuf)>>,
}

impl RecordingMuxer {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<(PathBuf, PathBuf, PathBuf)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Muxer for RecordingMuxer {
    async fn mux(&self, video: &Path, audio: &Path, output: &Path) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push((video.to_path_buf(), audio.to_path_buf(), output.to_path_buf()));

        if self.fail {
            std::fs::write(output, b"partial")?;
            return Err(Error::Unavailable("muxer exploded".to_string()));
        }
        std::fs::write(output, b"merged")?;
        Ok(())
    }
}
