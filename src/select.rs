//! Interactive resolution choice for a single video.

use std::collections::HashSet;

use colored::Colorize;

use crate::platform::{StreamVariant, TrackKind, VideoHandle};
use crate::prompt::Prompt;

/// One menu line: a resolution/kind pair and the stream that backs it.
#[derive(Debug, Clone)]
pub struct ResolutionOption<'a> {
    pub resolution: String,
    pub kind: TrackKind,
    pub stream: &'a StreamVariant,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ChoiceError {
    NotANumber,
    OutOfRange,
}

/// Menu entries for `video` in `container`, highest resolution first.
///
/// Variants without a resolution are left out, and only the first variant seen
/// for each (resolution, kind) pair is kept.
pub fn resolution_options<'a>(video: &'a VideoHandle, container: &str) -> Vec<ResolutionOption<'a>> {
    let mut seen = HashSet::new();

    video
        .streams_by_resolution(container)
        .into_iter()
        .filter_map(|stream| {
            let resolution = stream.resolution()?;
            seen.insert((resolution.clone(), stream.kind))
                .then_some(ResolutionOption { resolution, kind: stream.kind, stream })
        })
        .collect()
}

/// Parses a 1-based menu answer into a 0-based index.
pub fn parse_choice(input: &str, count: usize) -> Result<usize, ChoiceError> {
    let choice = input
        .trim()
        .parse::<usize>()
        .map_err(|_| ChoiceError::NotANumber)?;

    if (1..=count).contains(&choice) {
        Ok(choice - 1)
    } else {
        Err(ChoiceError::OutOfRange)
    }
}

/// Shows the menu and asks for a choice. Every failure ends as `None` with a message.
pub fn choose_resolution(
    video: &VideoHandle,
    container: &str,
    prompt: &mut dyn Prompt,
) -> Option<StreamVariant> {
    let options = resolution_options(video, container);

    if options.is_empty() {
        println!("{}", "No valid resolutions found.".red());
        return None;
    }

    for (index, option) in options.iter().enumerate() {
        println!(
            "{}) {} ({}) (~{:.2} MB)",
            index + 1,
            option.resolution,
            option.kind,
            option.stream.size_mib()
        );
    }

    let Some(answer) = prompt.ask("Choose resolution (number): ") else {
        println!("{}", "Invalid input.".red());
        return None;
    };

    match parse_choice(&answer, options.len()) {
        Ok(index) => Some(options[index].stream.clone()),
        Err(ChoiceError::NotANumber) => {
            println!("{}", "Invalid input.".red());
            None
        }
        Err(ChoiceError::OutOfRange) => {
            println!("{}", "Invalid choice.".red());
            None
        }
    }
}
