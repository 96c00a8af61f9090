use std::io::{BufRead, Write};

/// Source of operator answers. `None` means the input is exhausted.
pub trait Prompt {
    fn ask(&mut self, message: &str) -> Option<String>;
}

/// Reads answers from stdin, one line per question.
pub struct ConsolePrompt;

impl Prompt for ConsolePrompt {
    fn ask(&mut self, message: &str) -> Option<String> {
        print!("{}", message);
        std::io::stdout().flush().ok()?;

        let mut line = String::new();
        match std::io::stdin().lock().read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
            Err(err) => {
                tracing::warn!(%err, "failed to read from stdin");
                None
            }
        }
    }
}

#[cfg(test)]
pub struct ScriptedPrompt {
    answers: std::collections::VecDeque<String>,
    pub asked: Vec<String>,
}

#[cfg(test)]
impl ScriptedPrompt {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            asked: Vec::new(),
        }
    }
}

#[cfg(test)]
impl Prompt for ScriptedPrompt {
    fn ask(&mut self, message: &str) -> Option<String> {
        self.asked.push(message.to_string());
        self.answers.pop_front()
    }
}
