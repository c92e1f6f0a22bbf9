//! Terminal implementation of the prompt interface.
//!
//! Questions go to stderr so stdout stays clean for command output. Invalid
//! answers are reported and the question is asked again; end of input is an
//! error.

use quire_record::{AskOptions, Prompter};
use std::io::{self, BufRead, Write};

/// Line that ends a multi-line answer.
const END_OF_TEXT: &str = ".";

/// A [`Prompter`] reading answers line by line.
#[derive(Debug)]
pub struct TerminalPrompter<R, W> {
    input: R,
    output: W,
}

impl TerminalPrompter<io::StdinLock<'static>, io::Stderr> {
    /// A prompter over the process's stdin and stderr.
    #[must_use]
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stderr())
    }
}

fn prompt_error(err: &io::Error) -> quire_record::Error {
    quire_record::Error::Prompt(err.to_string())
}

impl<R: BufRead, W: Write> TerminalPrompter<R, W> {
    /// A prompter over arbitrary input and output.
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn say(&mut self, text: &str) -> quire_record::Result<()> {
        write!(self.output, "{text}")
            .and_then(|()| self.output.flush())
            .map_err(|e| prompt_error(&e))
    }

    fn read_line(&mut self) -> quire_record::Result<String> {
        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .map_err(|e| prompt_error(&e))?;
        if read == 0 {
            return Err(quire_record::Error::Prompt("unexpected end of input".to_string()));
        }
        Ok(line.trim_end_matches(['\n', '\r']).to_string())
    }

    fn list(&mut self, items: &[String]) -> quire_record::Result<()> {
        for (index, item) in items.iter().enumerate() {
            self.say(&format!("  {}) {item}\n", index + 1))?;
        }
        Ok(())
    }

    fn pick(answer: &str, items: &[String]) -> Option<usize> {
        answer
            .parse::<usize>()
            .ok()
            .filter(|n| (1..=items.len()).contains(n))
            .map(|n| n - 1)
            .or_else(|| items.iter().position(|item| item == answer))
    }
}

impl<R: BufRead, W: Write> Prompter for TerminalPrompter<R, W> {
    fn ask(&mut self, question: &str, options: &AskOptions) -> quire_record::Result<String> {
        let suggestion = options
            .default
            .as_ref()
            .map(|default| format!(" ({default})"))
            .unwrap_or_default();
        loop {
            self.say(&format!("{question}{suggestion}: "))?;
            let answer = self.read_line()?.trim().to_string();
            let answer = match (answer.is_empty(), &options.default) {
                (true, Some(default)) => default.clone(),
                _ => answer,
            };
            match &options.restrict {
                Some(choices) if !choices.contains(&answer) => {
                    self.say(&format!("Please enter one of: {}\n", choices.join(", ")))?;
                }
                _ if answer.is_empty() => {}
                _ => return Ok(answer),
            }
        }
    }

    fn ask_multiline(&mut self, question: &str) -> quire_record::Result<String> {
        self.say(&format!(
            "{question} (end with a line containing only '{END_OF_TEXT}'):\n"
        ))?;
        let mut lines = Vec::new();
        loop {
            self.say("> ")?;
            let mut line = String::new();
            let read = self
                .input
                .read_line(&mut line)
                .map_err(|e| prompt_error(&e))?;
            let line = line.trim_end_matches(['\n', '\r']);
            if read == 0 || line == END_OF_TEXT {
                return Ok(lines.join("\n"));
            }
            lines.push(line.to_string());
        }
    }

    fn ask_yes_no(&mut self, question: &str, default: Option<bool>) -> quire_record::Result<bool> {
        let hint = match default {
            Some(true) => "Y/n",
            Some(false) => "y/N",
            None => "y/n",
        };
        loop {
            self.say(&format!("{question} ({hint}) "))?;
            match (self.read_line()?.trim().to_lowercase().as_str(), default) {
                ("y" | "yes", _) => return Ok(true),
                ("n" | "no", _) => return Ok(false),
                ("", Some(default)) => return Ok(default),
                _ => self.say("Please answer y or n.\n")?,
            }
        }
    }

    fn select_one(&mut self, label: &str, items: &[String]) -> quire_record::Result<usize> {
        if items.is_empty() {
            return Err(quire_record::Error::Prompt(format!("nothing to choose for {label:?}")));
        }
        self.list(items)?;
        loop {
            self.say(&format!("{label}: "))?;
            let answer = self.read_line()?;
            if let Some(index) = Self::pick(answer.trim(), items) {
                return Ok(index);
            }
            self.say(&format!("Please enter a number between 1 and {}.\n", items.len()))?;
        }
    }

    fn select_many(&mut self, label: &str, items: &[String]) -> quire_record::Result<Vec<usize>> {
        self.list(items)?;
        loop {
            self.say(&format!("{label} (comma-separated): "))?;
            let answer = self.read_line()?;
            let picked: Option<Vec<usize>> = answer
                .split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(|part| Self::pick(part, items))
                .collect();
            match picked {
                Some(indices) => return Ok(indices),
                None => self.say("Please enter numbers from the list.\n")?,
            }
        }
    }

    fn ask_for_many(&mut self, question: &str) -> quire_record::Result<Vec<String>> {
        let mut entries = Vec::new();
        loop {
            self.say(&format!("{question}: "))?;
            let answer = self.read_line()?.trim().to_string();
            if answer.is_empty() {
                return Ok(entries);
            }
            entries.push(answer);
        }
    }
}
