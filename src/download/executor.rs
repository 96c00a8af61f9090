//! Runs queued tasks one after another, skipping work already on disk.

use std::path::Path;

use colored::Colorize;

use crate::download::progress::transfer_bar;
use crate::error::{Error, Result};
use crate::merge::MergeEngine;
use crate::options::Options;
use crate::platform::{Platform, StreamVariant};
use crate::task::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    /// merged or progressive file was already there
    AlreadyExists,
    /// progressive stream downloaded straight to the merged directory
    Downloaded,
    Merged,
    MergeFailed,
    /// video is on disk but no audio could be obtained
    Partial,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DownloadReport {
    pub already_existed: usize,
    pub downloaded: usize,
    pub merged: usize,
    pub merge_failed: usize,
    pub partial: Vec<String>,
    pub failed: Vec<String>,
}

impl DownloadReport {
    fn record(&mut self, task: &Task, outcome: TaskOutcome) {
        match outcome {
            TaskOutcome::AlreadyExists => self.already_existed += 1,
            TaskOutcome::Downloaded => self.downloaded += 1,
            TaskOutcome::Merged => self.merged += 1,
            TaskOutcome::MergeFailed => self.merge_failed += 1,
            TaskOutcome::Partial => self.partial.push(task.source_url().to_string()),
        }
    }

    pub fn print_summary(&self) {
        println!(
            "{} downloaded, {} merged, {} already present",
            self.downloaded, self.merged, self.already_existed
        );
        if self.merge_failed > 0 {
            println!("{}", format!("{} merges failed", self.merge_failed).red());
        }
        for url in &self.partial {
            println!("{} {}", "Incomplete (no audio):".red(), url);
        }
        for url in &self.failed {
            println!("{} {}", "Failed:".red(), url);
        }
    }
}

pub struct Executor<'a> {
    options: &'a Options,
    platform: &'a dyn Platform,
    merger: &'a MergeEngine,
}

impl<'a> Executor<'a> {
    pub fn new(options: &'a Options, platform: &'a dyn Platform, merger: &'a MergeEngine) -> Self {
        Self { options, platform, merger }
    }

    /// Runs every task in order. A failing task is reported and the rest still run.
    pub async fn download_all(&self, tasks: &[Task]) -> DownloadReport {
        let mut report = DownloadReport::default();

        if tasks.is_empty() {
            println!("{}", "Download queue is empty. Nothing to download.".yellow());
            return report;
        }

        println!(
            "{}",
            format!("\nStarting download for {} items in the queue...", tasks.len()).green()
        );

        for task in tasks {
            match self.run_task(task).await {
                Ok(outcome) => {
                    tracing::info!(id = %task.id, ?outcome, "task finished");
                    report.record(task, outcome);
                }
                Err(err) => {
                    tracing::error!(url = %task.source_url(), %err, "task failed");
                    eprintln!("{} / {} => {}", task.source_url(), "error".red(), err);
                    report.failed.push(task.source_url().to_string());
                }
            }
        }

        report
    }

    pub async fn run_task(&self, task: &Task) -> Result<TaskOutcome> {
        if task.merged_path.exists() {
            println!("{} already exists in merged folder.", task.filename);
            return Ok(TaskOutcome::AlreadyExists);
        }

        if task.is_progressive {
            println!("{} {}", "Downloading progressive video+audio:".cyan(), task.filename);
            self.fetch(&task.stream, &task.merged_path, "Video+Audio").await?;
            println!("{} {}\n", task.filename, "downloaded ✓".green());
            return Ok(TaskOutcome::Downloaded);
        }

        if task.video_path.exists() {
            println!("{} video already exists in video folder.", task.filename);
        } else {
            println!("{} {}", "Downloading video (no audio):".cyan(), task.filename);
            self.fetch(&task.stream, &task.video_path, "Video").await?;
        }

        if task.audio_path.exists() {
            println!("{} audio already exists in audio folder.", task.filename);
        } else {
            match task.video.best_audio(&self.options.audio_ext) {
                Some(audio) => {
                    println!("{} {}", "Downloading audio:".cyan(), task.filename);
                    self.fetch(audio, &task.audio_path, "Audio").await?;
                }
                None => {
                    let err = Error::NoAudioStream(task.filename.clone());
                    tracing::warn!(url = %task.source_url(), %err, "task left incomplete");
                    println!(
                        "{}",
                        format!("Could not get audio stream for {}. Skipping merge.", task.filename).red()
                    );
                    return Ok(TaskOutcome::Partial);
                }
            }
        }

        println!("{} {}", "Merging video and audio for:".yellow(), task.filename);
        if self
            .merger
            .merge(&task.video_path, &task.audio_path, &task.merged_path)
            .await
        {
            Ok(TaskOutcome::Merged)
        } else {
            Ok(TaskOutcome::MergeFailed)
        }
    }

    async fn fetch(&self, stream: &StreamVariant, output: &Path, label: &str) -> Result<u64> {
        tracing::debug!(format = %stream.format_id, output = %output.display(), "starting transfer");
        let bar = transfer_bar(stream.filesize.unwrap_or(0), label);
        let result = self.platform.download(stream, output, &bar).await;
        bar.finish_and_clear();
        result
    }
}
