//! The download queue kept for the whole run.
//!
//! Transitions take the queue by value and hand back the next state, so the
//! console handling in the builder never mutates entries in place.

use std::sync::LazyLock;

use regex::Regex;

use crate::platform::StreamVariant;
use crate::task::Task;

static VIDEO_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:youtube\.com/(?:embed/|v/|shorts/|watch\?(?:.*&)?v=)|youtu\.be/)([A-Za-z0-9_-]{11})(?:[^A-Za-z0-9_-]|$)",
    )
    .expect("video id pattern is valid")
});

static QUERY_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[?&]v=([A-Za-z0-9_-]{11})(?:[^A-Za-z0-9_-]|$)").expect("query id pattern is valid")
});

/// The 11-character video id carried by `url`, if any.
pub fn extract_video_id(url: &str) -> Option<String> {
    VIDEO_ID
        .captures(url)
        .or_else(|| QUERY_ID.captures(url))
        .map(|captures| captures[1].to_string())
}

/// Key used to drop duplicate input URLs before they are resolved.
pub fn dedup_key(url: &str) -> String {
    extract_video_id(url).unwrap_or_else(|| url.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueAction {
    Clear,
    Append,
    Edit,
    Cancel,
}

impl QueueAction {
    pub fn parse(input: &str) -> Self {
        match input.trim().to_lowercase().as_str() {
            "c" => QueueAction::Clear,
            "a" => QueueAction::Append,
            "e" => QueueAction::Edit,
            _ => QueueAction::Cancel,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Queue {
    tasks: Vec<Task>,
}

impl Queue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, index: usize) -> Option<&Task> {
        self.tasks.get(index)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.tasks.iter().any(|task| task.id == id)
    }

    pub fn cleared(self) -> Self {
        Self::new()
    }

    /// Appends the tasks whose id is not queued yet, keeping their order.
    pub fn with_new(mut self, tasks: impl IntoIterator<Item = Task>) -> Self {
        for task in tasks {
            if self.contains(&task.id) {
                tracing::debug!(id = %task.id, "already queued");
                continue;
            }
            self.tasks.push(task);
        }
        self
    }

    /// Replaces the chosen stream of the entry with `id`; unknown ids are ignored.
    pub fn with_selection(self, id: &str, stream: StreamVariant) -> Self {
        let tasks = self
            .tasks
            .into_iter()
            .map(|task| {
                if task.id == id {
                    task.with_stream(stream.clone())
                } else {
                    task
                }
            })
            .collect();

        Self { tasks }
    }
}
