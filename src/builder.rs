//! Resolves URLs into tasks and maintains the run's queue.

use std::collections::HashSet;

use colored::Colorize;

use crate::error::Result;
use crate::options::Options;
use crate::platform::Platform;
use crate::prompt::Prompt;
use crate::queue::{dedup_key, Queue, QueueAction};
use crate::select::{choose_resolution, parse_choice, ChoiceError};
use crate::task::Task;

pub struct TaskBuilder<'a> {
    options: &'a Options,
    platform: &'a dyn Platform,
}

impl<'a> TaskBuilder<'a> {
    pub fn new(options: &'a Options, platform: &'a dyn Platform) -> Self {
        Self { options, platform }
    }

    /// Builds one task per URL that resolves and gets a stream chosen.
    ///
    /// URLs that fail to resolve or get no valid choice are reported and left out.
    pub async fn build_tasks(&self, urls: &[String], prompt: &mut dyn Prompt) -> Vec<Task> {
        let mut tasks = Vec::new();

        for url in urls {
            match self.build_task(url, prompt).await {
                Ok(Some(task)) => tasks.push(task),
                Ok(None) => {
                    println!("{}", "Skipping video due to invalid resolution choice.".red());
                }
                Err(err) => {
                    tracing::warn!(%url, %err, "could not resolve video");
                    eprintln!("{}", format!("Error processing URL {}: {}", url, err).red());
                }
            }
        }

        tasks
    }

    async fn build_task(&self, url: &str, prompt: &mut dyn Prompt) -> Result<Option<Task>> {
        let video = self.platform.video(url).await?;
        tracing::debug!(%url, id = %video.id, streams = video.streams.len(), "resolved video");

        println!("\n{} {}", "Available resolutions for:".yellow(), video.title);

        let Some(stream) = choose_resolution(&video, &self.options.container, prompt) else {
            return Ok(None);
        };

        Ok(Some(Task::new(video, stream, self.options)))
    }

    /// Adds `urls` to `queue`.
    ///
    /// A non-empty queue makes the operator pick between clearing it, appending
    /// to it, or editing its resolutions; anything else leaves it unchanged.
    pub async fn build_queue(&self, queue: Queue, urls: &[String], prompt: &mut dyn Prompt) -> Queue {
        let queue = if queue.is_empty() {
            queue
        } else {
            println!("{}", "Download queue already exists.".yellow());
            println!("Current queue has {} items.", queue.len());

            let answer = prompt
                .ask("Queue is not empty. Clear it and start fresh (c),\nAdd new URLs to existing queue (a),\nor Edit existing resolutions (e)?\n(c/a/e): ")
                .unwrap_or_default();

            match QueueAction::parse(&answer) {
                QueueAction::Clear => {
                    println!("Clearing existing queue...");
                    queue.cleared()
                }
                QueueAction::Append => queue,
                QueueAction::Edit => return self.edit_resolutions(queue, prompt).await,
                QueueAction::Cancel => {
                    println!("Invalid choice. Keeping the current queue.");
                    return queue;
                }
            }
        };

        let urls = unique_urls(&queue, urls);
        if urls.is_empty() {
            let message = if queue.is_empty() {
                "No valid URLs provided for a new queue."
            } else {
                "No new unique URLs provided to add to the existing queue."
            };
            println!("{}", message.yellow());
            return queue;
        }

        let tasks = self.build_tasks(&urls, prompt).await;
        queue.with_new(tasks)
    }

    /// Lets the operator pick a new stream for queued entries until `q`.
    pub async fn edit_resolutions(&self, mut queue: Queue, prompt: &mut dyn Prompt) -> Queue {
        if queue.is_empty() {
            println!("{}", "Download queue is empty. Nothing to edit.".yellow());
            return queue;
        }

        println!("{}", "\nCurrent Download Queue:".cyan());
        for (index, task) in queue.tasks().iter().enumerate() {
            println!(
                "{}) {} - Resolution: {} ({})",
                index + 1,
                task.filename,
                task.stream.resolution().unwrap_or_default(),
                if task.is_progressive { "Progressive" } else { "Separated" }
            );
        }

        loop {
            let Some(answer) = prompt.ask(
                "\nEnter the number of the video you want to change the resolution for (or 'q' to quit): ",
            ) else {
                break;
            };

            if answer.trim().eq_ignore_ascii_case("q") {
                break;
            }

            let index = match parse_choice(&answer, queue.len()) {
                Ok(index) => index,
                Err(ChoiceError::NotANumber) => {
                    println!("{}", "Invalid input. Please enter a number or 'q'.".red());
                    continue;
                }
                Err(ChoiceError::OutOfRange) => {
                    println!("{}", "Invalid number.".red());
                    continue;
                }
            };

            let Some(task) = queue.get(index) else {
                continue;
            };
            let id = task.id.clone();
            let filename = task.filename.clone();
            let url = task.source_url().to_string();

            println!("\n{} {}", "Available resolutions for:".yellow(), filename);

            let video = match self.platform.video(&url).await {
                Ok(video) => video,
                Err(err) => {
                    eprintln!("{}", format!("Error processing URL {}: {}", url, err).red());
                    continue;
                }
            };

            match choose_resolution(&video, &self.options.container, prompt) {
                Some(stream) => {
                    println!(
                        "{}",
                        format!(
                            "Resolution updated for '{}' to {}.",
                            filename,
                            stream.resolution().unwrap_or_default()
                        )
                        .green()
                    );
                    queue = queue.with_selection(&id, stream);
                }
                None => {
                    println!(
                        "{}",
                        format!("Resolution was not changed for '{}'.", filename).yellow()
                    );
                }
            }
        }

        queue
    }
}

/// `urls` without repeats and without videos already in `queue`.
fn unique_urls(queue: &Queue, urls: &[String]) -> Vec<String> {
    let mut seen = queue
        .tasks()
        .iter()
        .map(|task| task.id.clone())
        .collect::<HashSet<_>>();

    urls.iter()
        .filter(|url| seen.insert(dedup_key(url)))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::TrackKind;
    use crate::prompt::ScriptedPrompt;
    use crate::testing::{full_video, temp_options, video, stream, watch_url, FakePlatform};

    fn platform() -> FakePlatform {
        FakePlatform::new()
            .with_video(&watch_url("AAAAAAAAAAA"), full_video("AAAAAAAAAAA", "First: video"))
            .with_video(&watch_url("BBBBBBBBBBB"), full_video("BBBBBBBBBBB", "Second"))
            .with_video(&watch_url("CCCCCCCCCCC"), full_video("CCCCCCCCCCC", "Third"))
    }

    fn urls(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|id| watch_url(id)).collect()
    }

    #[tokio::test]
    async fn builds_tasks_in_input_order() {
        let dir = tempfile::tempdir().unwrap();
        let options = temp_options(dir.path());
        let platform = platform();
        let builder = TaskBuilder::new(&options, &platform);
        let mut prompt = ScriptedPrompt::new(["1", "2"]);

        let tasks = builder
            .build_tasks(&urls(&["BBBBBBBBBBB", "AAAAAAAAAAA"]), &mut prompt)
            .await;

        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].id, "BBBBBBBBBBB");
        assert!(!tasks[0].is_progressive);
        assert_eq!(tasks[1].filename, "First_ video");
        assert!(tasks[1].is_progressive);
        assert_eq!(tasks[1].merged_path, options.merged_dir.join("First_ video.mp4"));
    }

    #[tokio::test]
    async fn skips_unresolvable_and_unchosen_urls() {
        let dir = tempfile::tempdir().unwrap();
        let options = temp_options(dir.path());
        let platform = platform().with_video(
            &watch_url("DDDDDDDDDDD"),
            video("DDDDDDDDDDD", "No video", vec![stream("140", "m4a", None, TrackKind::AudioOnly)]),
        );
        let builder = TaskBuilder::new(&options, &platform);
        let input = vec![
            "https://www.youtube.com/watch?v=ZZZZZZZZZZZ".to_string(),
            watch_url("AAAAAAAAAAA"),
            watch_url("DDDDDDDDDDD"),
            watch_url("BBBBBBBBBBB"),
        ];
        let mut prompt = ScriptedPrompt::new(["9", "1"]);

        let tasks = builder.build_tasks(&input, &mut prompt).await;

        let ids = tasks.iter().map(|task| task.id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, ["BBBBBBBBBBB"]);
    }

    #[tokio::test]
    async fn empty_queue_is_built_without_asking_for_a_mode() {
        let dir = tempfile::tempdir().unwrap();
        let options = temp_options(dir.path());
        let platform = platform();
        let builder = TaskBuilder::new(&options, &platform);
        let input = urls(&["AAAAAAAAAAA", "AAAAAAAAAAA", "BBBBBBBBBBB"]);
        let mut prompt = ScriptedPrompt::new(["1", "1"]);

        let queue = builder.build_queue(Queue::new(), &input, &mut prompt).await;

        assert_eq!(queue.len(), 2);
        assert_eq!(platform.lookups().len(), 2);
        assert!(prompt.asked.iter().all(|asked| asked.starts_with("Choose resolution")));
    }

    #[tokio::test]
    async fn append_only_resolves_new_videos() {
        let dir = tempfile::tempdir().unwrap();
        let options = temp_options(dir.path());
        let platform = platform();
        let builder = TaskBuilder::new(&options, &platform);

        let mut first = ScriptedPrompt::new(["1"]);
        let queue = builder
            .build_queue(Queue::new(), &urls(&["AAAAAAAAAAA"]), &mut first)
            .await;

        let mut second = ScriptedPrompt::new(["a", "2"]);
        let queue = builder
            .build_queue(queue, &urls(&["AAAAAAAAAAA", "CCCCCCCCCCC"]), &mut second)
            .await;

        let ids = queue.tasks().iter().map(|task| task.id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, ["AAAAAAAAAAA", "CCCCCCCCCCC"]);
        assert_eq!(platform.lookups(), urls(&["AAAAAAAAAAA", "CCCCCCCCCCC"]));
    }

    #[tokio::test]
    async fn clear_rebuilds_from_scratch() {
        let dir = tempfile::tempdir().unwrap();
        let options = temp_options(dir.path());
        let platform = platform();
        let builder = TaskBuilder::new(&options, &platform);

        let mut first = ScriptedPrompt::new(["1"]);
        let queue = builder
            .build_queue(Queue::new(), &urls(&["AAAAAAAAAAA"]), &mut first)
            .await;

        let mut second = ScriptedPrompt::new(["c", "1"]);
        let queue = builder
            .build_queue(queue, &urls(&["BBBBBBBBBBB"]), &mut second)
            .await;

        assert_eq!(queue.len(), 1);
        assert_eq!(queue.tasks()[0].id, "BBBBBBBBBBB");
    }

    #[tokio::test]
    async fn unknown_mode_leaves_queue_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let options = temp_options(dir.path());
        let platform = platform();
        let builder = TaskBuilder::new(&options, &platform);

        let mut first = ScriptedPrompt::new(["1"]);
        let queue = builder
            .build_queue(Queue::new(), &urls(&["AAAAAAAAAAA"]), &mut first)
            .await;
        let before = queue.clone();

        let mut second = ScriptedPrompt::new(["x"]);
        let queue = builder
            .build_queue(queue, &urls(&["BBBBBBBBBBB"]), &mut second)
            .await;

        assert_eq!(queue, before);
        assert_eq!(platform.lookups().len(), 1);
    }

    #[tokio::test]
    async fn edit_mode_replaces_selected_stream() {
        let dir = tempfile::tempdir().unwrap();
        let options = temp_options(dir.path());
        let platform = platform();
        let builder = TaskBuilder::new(&options, &platform);

        let mut first = ScriptedPrompt::new(["1", "1"]);
        let queue = builder
            .build_queue(Queue::new(), &urls(&["AAAAAAAAAAA", "BBBBBBBBBBB"]), &mut first)
            .await;
        assert!(queue.tasks().iter().all(|task| !task.is_progressive));

        let mut edit = ScriptedPrompt::new(["e", "abc", "7", "2", "2", "1", "5", "q"]);
        let queue = builder
            .build_queue(queue, &urls(&["CCCCCCCCCCC"]), &mut edit)
            .await;

        assert_eq!(queue.len(), 2);
        assert!(!queue.tasks()[0].is_progressive);
        assert!(queue.tasks()[1].is_progressive);
        assert_eq!(queue.tasks()[1].stream.format_id, "22");
        assert!(!queue.contains("CCCCCCCCCCC"));
    }

    #[tokio::test]
    async fn editing_an_empty_queue_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let options = temp_options(dir.path());
        let platform = platform();
        let builder = TaskBuilder::new(&options, &platform);
        let mut prompt = ScriptedPrompt::new(["1"]);

        let queue = builder.edit_resolutions(Queue::new(), &mut prompt).await;

        assert!(queue.is_empty());
        assert!(prompt.asked.is_empty());
    }
}
