use std::sync::Arc;

use colored::Colorize;

use crate::builder::TaskBuilder;
use crate::download::executor::{DownloadReport, Executor};
use crate::merge::{MergeEngine, MergeReport, Muxer};
use crate::options::Options;
use crate::platform::Platform;
use crate::prompt::Prompt;
use crate::queue::Queue;
use crate::urls;

/// Wires the pipeline together and owns the queue for the whole run.
pub struct App {
    options: Options,
    platform: Arc<dyn Platform>,
    merger: MergeEngine,
    queue: Queue,
}

impl App {
    pub fn new(options: Options, platform: Arc<dyn Platform>, muxer: Arc<dyn Muxer>) -> Self {
        let merger = MergeEngine::new(muxer, &options);
        Self {
            options,
            platform,
            merger,
            queue: Queue::new(),
        }
    }

    pub async fn collect_urls(&self, text: &str) -> Vec<String> {
        urls::collect_urls(text, self.platform.as_ref()).await
    }

    pub async fn read_url_file(&self, path: &std::path::Path) -> std::io::Result<Vec<String>> {
        urls::read_url_file(path, self.platform.as_ref()).await
    }

    pub async fn enqueue(&mut self, urls: &[String], prompt: &mut dyn Prompt) {
        let builder = TaskBuilder::new(&self.options, self.platform.as_ref());
        let queue = std::mem::take(&mut self.queue);
        self.queue = builder.build_queue(queue, urls, prompt).await;
    }

    pub async fn download(&self) -> DownloadReport {
        let executor = Executor::new(&self.options, self.platform.as_ref(), &self.merger);
        let report = executor.download_all(self.queue.tasks()).await;
        report.print_summary();
        report
    }

    pub async fn merge_all(&self) -> MergeReport {
        self.merger.merge_all().await
    }

    /// Queue, download, then merge whatever pairs are left on disk.
    pub async fn run(&mut self, urls: &[String], prompt: &mut dyn Prompt) -> (DownloadReport, MergeReport) {
        self.enqueue(urls, prompt).await;
        let downloads = self.download().await;
        let merges = self.merge_all().await;
        println!("{}", "Download and merge process completed!".green());
        (downloads, merges)
    }

    /// Reads URL blocks from the operator until `q` or end of input.
    pub async fn interactive(&mut self, prompt: &mut dyn Prompt) -> MergeReport {
        loop {
            println!(
                "\n{}",
                "Paste URLs, one per line. Finish with an empty line, or enter 'q' to quit.".cyan()
            );

            let mut lines = Vec::new();
            let mut done = false;
            loop {
                match prompt.ask("> ") {
                    None => {
                        done = true;
                        break;
                    }
                    Some(line) if line.trim().is_empty() => break,
                    Some(line) if lines.is_empty() && line.trim().eq_ignore_ascii_case("q") => {
                        done = true;
                        break;
                    }
                    Some(line) => lines.push(line),
                }
            }

            if !lines.is_empty() {
                let urls = self.collect_urls(&lines.join("\n")).await;
                self.enqueue(&urls, prompt).await;
                self.download().await;
            }

            if done {
                break;
            }
        }

        let report = self.merge_all().await;
        println!("{}", "Download and merge process completed!".green());
        report
    }
}
