use std::path::PathBuf;

use crate::options::Options;
use crate::platform::{StreamVariant, VideoHandle};

const RESERVED: [char; 9] = ['\\', '/', '*', '?', ':', '"', '<', '>', '|'];

/// Replaces characters that are not allowed in file names with `_`.
pub fn sanitize_filename(title: &str) -> String {
    title
        .chars()
        .map(|c| if RESERVED.contains(&c) { '_' } else { c })
        .collect()
}

/// One video's planned work: where its files go and which stream to fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub id: String,
    pub video: VideoHandle,
    pub filename: String,
    pub video_path: PathBuf,
    pub audio_path: PathBuf,
    pub merged_path: PathBuf,
    pub stream: StreamVariant,
    pub is_progressive: bool,
}

impl Task {
    pub fn new(video: VideoHandle, stream: StreamVariant, options: &Options) -> Self {
        let filename = sanitize_filename(&video.title);

        Self {
            id: video.id.clone(),
            video_path: options.video_path(&filename),
            audio_path: options.audio_path(&filename),
            merged_path: options.merged_path(&filename),
            is_progressive: stream.is_progressive(),
            filename,
            video,
            stream,
        }
    }

    pub fn with_stream(self, stream: StreamVariant) -> Self {
        Self {
            is_progressive: stream.is_progressive(),
            stream,
            ..self
        }
    }

    pub fn source_url(&self) -> &str {
        &self.video.watch_url
    }
}
