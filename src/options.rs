use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct Options {
    pub video_dir: PathBuf,
    pub audio_dir: PathBuf,
    pub merged_dir: PathBuf,
    pub ffmpeg: PathBuf,
    pub yt_dlp: PathBuf,
    pub max_parallel_merges: usize,
    /// container extension for video-only and merged files
    pub container: String,
    pub audio_ext: String,
}

impl Options {
    pub fn new(video_dir: PathBuf, audio_dir: PathBuf, merged_dir: PathBuf) -> Self {
        Self {
            video_dir,
            audio_dir,
            merged_dir,
            ffmpeg: PathBuf::from("ffmpeg"),
            yt_dlp: PathBuf::from("yt-dlp"),
            max_parallel_merges: 4,
            container: "mp4".to_string(),
            audio_ext: "m4a".to_string(),
        }
    }

    /// Creates the three working directories. Failing here is fatal for the run.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        for dir in self.dirs() {
            std::fs::create_dir_all(dir)?;
            tracing::debug!(dir = %dir.display(), "working directory ready");
        }
        Ok(())
    }

    pub fn dirs(&self) -> [&Path; 3] {
        [&self.video_dir, &self.audio_dir, &self.merged_dir]
    }

    pub fn video_path(&self, filename: &str) -> PathBuf {
        self.video_dir.join(format!("{}.{}", filename, self.container))
    }

    pub fn audio_path(&self, filename: &str) -> PathBuf {
        self.audio_dir.join(format!("{}.{}", filename, self.audio_ext))
    }

    pub fn merged_path(&self, filename: &str) -> PathBuf {
        self.merged_dir.join(format!("{}.{}", filename, self.container))
    }
}
