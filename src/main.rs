mod app;
mod builder;
mod download;
mod error;
mod merge;
mod options;
mod platform;
mod prompt;
mod queue;
mod select;
mod task;
mod urls;

#[cfg(test)]
mod testing;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;
use url::Url;

use app::App;
use merge::Ffmpeg;
use options::Options;
use platform::YtDlp;
use prompt::ConsolePrompt;

#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    #[clap(subcommand)]
    subcmd: SubCmd,

    #[clap(long, default_value = "./downloads/videos")]
    /// directory for video-only files
    video_dir: PathBuf,

    #[clap(long, default_value = "./downloads/audio")]
    /// directory for audio-only files
    audio_dir: PathBuf,

    #[clap(long, default_value = "./downloads/merged")]
    /// directory for finished files with video and audio
    merged_dir: PathBuf,

    #[clap(short, long, default_value = "4")]
    /// set the maximum number of merges running at once
    parallel: usize,

    #[clap(long, env = "FFMPEG", default_value = "ffmpeg")]
    /// ffmpeg executable used for merging
    ffmpeg: PathBuf,

    #[clap(long = "yt-dlp", env = "YT_DLP", default_value = "yt-dlp")]
    /// yt-dlp executable used to look up videos and playlists
    yt_dlp: PathBuf,

    #[clap(long, default_value = "mp4")]
    /// container of the video and merged files
    container: String,

    #[clap(long, default_value = "m4a")]
    /// container of the audio files
    audio_ext: String,
}

#[derive(Subcommand, Debug)]
enum SubCmd {
    /// Download every URL listed in a text file
    File {
        #[clap(default_value = "urls.txt")]
        /// one URL per line; empty lines and lines starting with # are ignored
        file: PathBuf,
    },
    /// Download the given video or playlist URLs
    Download {
        #[clap(value_parser = url_parser, required = true)]
        urls: Vec<String>,
    },
    /// Merge downloaded video and audio files that have no merged file yet
    Merge,
    /// Keep reading URLs from the console and download them as they come
    Interactive,
}

fn url_parser(url: &str) -> Result<String, String> {
    match Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(url.to_string()),
        Ok(_) => Err("URL must start with http or https".to_string()),
        Err(err) => Err(format!("invalid URL: {}", err)),
    }
}

impl Args {
    fn options(&self) -> Options {
        Options {
            ffmpeg: self.ffmpeg.clone(),
            yt_dlp: self.yt_dlp.clone(),
            max_parallel_merges: self.parallel,
            container: self.container.clone(),
            audio_ext: self.audio_ext.clone(),
            ..Options::new(
                self.video_dir.clone(),
                self.audio_dir.clone(),
                self.merged_dir.clone(),
            )
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (writer, _guard) = tracing_appender::non_blocking(std::io::stderr());
    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    tracing::debug!(?args, "parsed arguments");

    let options = args.options();
    if let Err(err) = options.ensure_dirs() {
        eprintln!("{}", format!("Could not create working directories: {}", err).red());
        return Err(err.into());
    }

    let platform = Arc::new(YtDlp::new(&options.yt_dlp)?);
    let muxer = Arc::new(Ffmpeg::new(&options.ffmpeg));
    let mut app = App::new(options, platform, muxer);
    let mut prompt = ConsolePrompt;

    match args.subcmd {
        SubCmd::File { file } => {
            if let Ok(urls) = app.read_url_file(&file).await {
                println!("Finished reading file {}", file.display());
                app.run(&urls, &mut prompt).await;
            }
        }
        SubCmd::Download { urls } => {
            let urls = app.collect_urls(&urls.join("\n")).await;
            app.run(&urls, &mut prompt).await;
        }
        SubCmd::Merge => {
            app.merge_all().await;
        }
        SubCmd::Interactive => {
            app.interactive(&mut prompt).await;
        }
    }

    Ok(())
}
