//! Muxing separately downloaded video and audio tracks into one file.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use colored::Colorize;
use tokio::process::Command;
use tokio::sync::Semaphore;

use crate::error::{Error, Result};
use crate::options::Options;

/// Combines a video file and an audio file into `output`.
#[async_trait]
pub trait Muxer: Send + Sync {
    async fn mux(&self, video: &Path, audio: &Path, output: &Path) -> Result<()>;
}

/// Copies the video track and encodes the audio track to AAC with ffmpeg.
pub struct Ffmpeg {
    bin: PathBuf,
}

impl Ffmpeg {
    pub fn new(bin: impl Into<PathBuf>) -> Self {
        Self { bin: bin.into() }
    }
}

#[async_trait]
impl Muxer for Ffmpeg {
    async fn mux(&self, video: &Path, audio: &Path, output: &Path) -> Result<()> {
        let tool = self.bin.display().to_string();
        let mut command = Command::new(&self.bin);
        command
            .args(["-loglevel", "error", "-i"])
            .arg(video)
            .arg("-i")
            .arg(audio)
            .args(["-c:v", "copy", "-c:a", "aac"])
            .arg(output)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        tracing::debug!(?command, "running ffmpeg");

        let result = command
            .output()
            .await
            .map_err(|source| Error::Spawn { tool: tool.clone(), source })?;

        if !result.status.success() {
            return Err(Error::ToolFailed {
                tool,
                status: result.status,
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }

        Ok(())
    }
}

/// A video file whose audio counterpart exists and that has no merged file yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergePair {
    pub name: String,
    pub video: PathBuf,
    pub audio: PathBuf,
    pub output: PathBuf,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct MergePlan {
    pub pending: Vec<MergePair>,
    pub missing_audio: Vec<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MergeReport {
    pub merged: usize,
    pub failed: usize,
    pub missing_audio: usize,
}

pub struct MergeEngine {
    muxer: Arc<dyn Muxer>,
    video_dir: PathBuf,
    audio_dir: PathBuf,
    merged_dir: PathBuf,
    container: String,
    audio_ext: String,
    max_parallel: usize,
}

impl MergeEngine {
    pub fn new(muxer: Arc<dyn Muxer>, options: &Options) -> Self {
        Self {
            muxer,
            video_dir: options.video_dir.clone(),
            audio_dir: options.audio_dir.clone(),
            merged_dir: options.merged_dir.clone(),
            container: options.container.clone(),
            audio_ext: options.audio_ext.clone(),
            max_parallel: options.max_parallel_merges.max(1),
        }
    }

    /// Merges one pair, reporting instead of returning failures. Returns whether it worked.
    pub async fn merge(&self, video: &Path, audio: &Path, output: &Path) -> bool {
        merge_pair(self.muxer.as_ref(), video, audio, output).await
    }

    /// Classifies every video file in the video directory.
    pub fn plan(&self) -> std::io::Result<MergePlan> {
        let mut names = std::fs::read_dir(&self.video_dir)?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_file())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| Path::new(name).extension().is_some_and(|ext| ext == self.container.as_str()))
            .collect::<Vec<_>>();
        names.sort();

        let mut plan = MergePlan::default();
        for name in names {
            let video = self.video_dir.join(&name);
            let audio = self
                .audio_dir
                .join(Path::new(&name).with_extension(&self.audio_ext));
            let output = self.merged_dir.join(&name);

            if !audio.exists() {
                plan.missing_audio.push(name);
            } else if !output.exists() {
                plan.pending.push(MergePair { name, video, audio, output });
            }
        }

        Ok(plan)
    }

    /// Merges every pending pair found on disk and waits for all of them.
    pub async fn merge_all(&self) -> MergeReport {
        let plan = match self.plan() {
            Ok(plan) => plan,
            Err(err) => {
                eprintln!(
                    "{}",
                    format!("Error reading {}: {}", self.video_dir.display(), err).red()
                );
                return MergeReport::default();
            }
        };

        let mut report = MergeReport {
            missing_audio: plan.missing_audio.len(),
            ..MergeReport::default()
        };

        for name in &plan.missing_audio {
            println!("{} {}", "Missing audio file for:".red(), name);
        }

        let semaphore = Arc::new(Semaphore::new(self.max_parallel));

        let tasks = plan
            .pending
            .into_iter()
            .map(|pair| {
                let muxer = Arc::clone(&self.muxer);
                let semaphore = Arc::clone(&semaphore);
                tokio::spawn(async move {
                    let _permit = semaphore.acquire().await;
                    println!("{} {}", "Merging:".yellow(), pair.name);
                    merge_pair(muxer.as_ref(), &pair.video, &pair.audio, &pair.output).await
                })
            })
            .collect::<Vec<_>>();

        for task in tasks {
            match task.await {
                Ok(true) => report.merged += 1,
                Ok(false) => report.failed += 1,
                Err(err) => {
                    eprintln!("{}", format!("Error waiting for merge: {}", err).red());
                    report.failed += 1;
                }
            }
        }

        println!("{}", "\nAll possible merges completed.".green());
        report
    }
}

async fn merge_pair(muxer: &dyn Muxer, video: &Path, audio: &Path, output: &Path) -> bool {
    let name = video.file_name().unwrap_or_default().to_string_lossy();

    match muxer.mux(video, audio, output).await {
        Ok(()) => {
            println!("{} {}", name, "merged ✓".green());
            true
        }
        Err(err) => {
            tracing::error!(video = %video.display(), audio = %audio.display(), %err, "merge failed");
            discard_partial(output).await;
            eprintln!(
                "{}",
                format!(
                    "Merge error for {} and {}: {}",
                    video.display(),
                    audio.display(),
                    err
                )
                .red()
            );
            false
        }
    }
}

/// A failed mux may leave a truncated file behind; it must not pass for a finished merge.
async fn discard_partial(output: &Path) {
    match tokio::fs::remove_file(output).await {
        Ok(()) => tracing::debug!(output = %output.display(), "removed partial merge output"),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => tracing::warn!(output = %output.display(), %err, "could not remove partial merge output"),
    }
}
