//! Turns a block of text into the list of video URLs to process.

use std::path::Path;

use colored::Colorize;

use crate::platform::Platform;

/// Non-empty, non-comment lines of `text`, trimmed, in their original order.
pub fn parse_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

pub fn is_playlist(url: &str) -> bool {
    url.contains("playlist")
}

/// Parses `text` and replaces every playlist URL, in place, by its videos.
///
/// A playlist that cannot be expanded contributes nothing; the other lines
/// are still returned.
pub async fn collect_urls(text: &str, platform: &dyn Platform) -> Vec<String> {
    let mut urls = Vec::new();

    for line in parse_lines(text) {
        if !is_playlist(&line) {
            urls.push(line);
            continue;
        }

        match platform.playlist_urls(&line).await {
            Ok(videos) => {
                tracing::info!(playlist = %line, videos = videos.len(), "expanded playlist");
                urls.extend(videos);
            }
            Err(err) => {
                tracing::warn!(playlist = %line, %err, "playlist expansion failed");
                eprintln!("{}", format!("Error fetching playlist {}: {}", line, err).red());
            }
        }
    }

    urls
}

pub async fn read_url_file(path: &Path, platform: &dyn Platform) -> std::io::Result<Vec<String>> {
    let text = match tokio::fs::read_to_string(path).await {
        Ok(text) => text,
        Err(err) => {
            eprintln!("{}", format!("Error opening file ({}): {}", path.display(), err).red());
            return Err(err);
        }
    };

    Ok(collect_urls(&text, platform).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakePlatform;

    #[test]
    fn drops_blank_and_comment_lines() {
        let text = "https://x/watch?v=AAAAAAAAAAA\n# comment\n\nhttps://x/watch?v=BBBBBBBBBBB";

        assert_eq!(
            parse_lines(text),
            ["https://x/watch?v=AAAAAAAAAAA", "https://x/watch?v=BBBBBBBBBBB"]
        );
    }

    #[test]
    fn trims_and_keeps_order() {
        let text = "  c  \r\n\t# indented comment\n   \na\nb # not a comment\n";

        assert_eq!(parse_lines(text), ["c", "a", "b # not a comment"]);
    }

    #[tokio::test]
    async fn expands_playlists_in_place() {
        let platform = FakePlatform::new()
            .with_playlist("https://x/playlist?list=P1", &["https://x/watch?v=p1", "https://x/watch?v=p2"]);
        let text = "https://x/watch?v=first\nhttps://x/playlist?list=P1\nhttps://x/watch?v=last\n";

        let urls = collect_urls(text, &platform).await;

        assert_eq!(
            urls,
            [
                "https://x/watch?v=first",
                "https://x/watch?v=p1",
                "https://x/watch?v=p2",
                "https://x/watch?v=last",
            ]
        );
    }

    #[tokio::test]
    async fn failed_playlist_contributes_nothing() {
        let platform = FakePlatform::new()
            .with_playlist("https://x/playlist?list=EMPTY", &[]);
        let text = "https://x/playlist?list=GONE\nhttps://x/watch?v=a\nhttps://x/playlist?list=EMPTY\nhttps://x/watch?v=a";

        let urls = collect_urls(text, &platform).await;

        assert_eq!(urls, ["https://x/watch?v=a", "https://x/watch?v=a"]);
    }

    #[tokio::test]
    async fn reads_urls_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("urls.txt");
        std::fs::write(&path, "# list\nhttps://x/watch?v=a\n").unwrap();

        let urls = read_url_file(&path, &FakePlatform::new()).await.unwrap();
        assert_eq!(urls, ["https://x/watch?v=a"]);

        assert!(read_url_file(&dir.path().join("missing.txt"), &FakePlatform::new())
            .await
            .is_err());
    }
}
