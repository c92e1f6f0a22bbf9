//! The interactive prompt collaborator.
//!
//! Interactive construction asks the operator for field values through a
//! [`Prompter`]. The terminal implementation lives with the CLI; this crate
//! only defines the interface and, for tests, a scripted implementation.

use crate::error::Result;

/// Options for a single-line question.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AskOptions {
    /// Answer used when the operator enters nothing.
    pub default: Option<String>,
    /// When set, the only acceptable answers.
    pub restrict: Option<Vec<String>>,
}

impl AskOptions {
    /// Options with no default and no restriction.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Suggest a default answer.
    #[must_use]
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Only accept one of `choices`.
    #[must_use]
    pub fn restricted_to<I, S>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.restrict = Some(choices.into_iter().map(Into::into).collect());
        self
    }
}

/// Asks the operator questions.
pub trait Prompter {
    /// Ask for one line of text.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Prompt`] if no usable answer can be obtained.
    fn ask(&mut self, question: &str, options: &AskOptions) -> Result<String>;

    /// Ask for a block of text.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Prompt`] if input cannot be read.
    fn ask_multiline(&mut self, question: &str) -> Result<String>;

    /// Ask a yes/no question.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Prompt`] if input cannot be read.
    fn ask_yes_no(&mut self, question: &str, default: Option<bool>) -> Result<bool>;

    /// Pick one of `items`, returning its index.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Prompt`] if `items` is empty or input cannot be read.
    fn select_one(&mut self, label: &str, items: &[String]) -> Result<usize>;

    /// Pick any number of `items`, returning their indices in order.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Prompt`] if input cannot be read.
    fn select_many(&mut self, label: &str, items: &[String]) -> Result<Vec<usize>>;

    /// Ask for a list of free-text entries, ending with an empty one.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Prompt`] if input cannot be read.
    fn ask_for_many(&mut self, question: &str) -> Result<Vec<String>>;
}

#[cfg(any(test, feature = "test-util"))]
pub use scripted::ScriptedPrompter;

#[cfg(any(test, feature = "test-util"))]
mod scripted {
    use super::{AskOptions, Prompter};
    use crate::error::{Error, Result};
    use std::collections::VecDeque;

    /// A [`Prompter`] that replays canned answers and records the questions asked.
    ///
    /// Selections are answered with a 1-based number or the item text.
    /// Yes/no questions take `y` or `n`. `ask_for_many` consumes answers up
    /// to the next empty one.
    #[derive(Debug, Default)]
    pub struct ScriptedPrompter {
        answers: VecDeque<String>,
        /// Every question asked, in order.
        pub questions: Vec<String>,
    }

    impl ScriptedPrompter {
        /// A prompter that gives `answers` in order.
        pub fn new<I, S>(answers: I) -> Self
        where
            I: IntoIterator<Item = S>,
            S: Into<String>,
        {
            Self {
                answers: answers.into_iter().map(Into::into).collect(),
                questions: Vec::new(),
            }
        }

        /// Answers not yet consumed.
        #[must_use]
        pub fn remaining(&self) -> usize {
            self.answers.len()
        }

        fn next(&mut self, question: &str) -> Result<String> {
            self.questions.push(question.to_string());
            self.answers
                .pop_front()
                .ok_or_else(|| Error::Prompt(format!("no scripted answer for {question:?}")))
        }

        fn pick(answer: &str, items: &[String]) -> Result<usize> {
            if let Ok(n) = answer.parse::<usize>()
                && (1..=items.len()).contains(&n)
            {
                return Ok(n - 1);
            }
            items
                .iter()
                .position(|item| item == answer)
                .ok_or_else(|| Error::Prompt(format!("{answer:?} is not one of {items:?}")))
        }
    }

    impl Prompter for ScriptedPrompter {
        fn ask(&mut self, question: &str, options: &AskOptions) -> Result<String> {
            let answer = self.next(question)?;
            let answer = match (answer.is_empty(), &options.default) {
                (true, Some(default)) => default.clone(),
                _ => answer,
            };
            if let Some(choices) = &options.restrict
                && !choices.contains(&answer)
            {
                return Err(Error::Prompt(format!(
                    "{answer:?} is not one of {choices:?}"
                )));
            }
            Ok(answer)
        }

        fn ask_multiline(&mut self, question: &str) -> Result<String> {
            self.next(question)
        }

        fn ask_yes_no(&mut self, question: &str, default: Option<bool>) -> Result<bool> {
            match self.next(question)?.to_lowercase().as_str() {
                "y" | "yes" => Ok(true),
                "n" | "no" => Ok(false),
                "" => default.ok_or_else(|| Error::Prompt(format!("{question:?} needs an answer"))),
                other => Err(Error::Prompt(format!("{other:?} is not yes or no"))),
            }
        }

        fn select_one(&mut self, label: &str, items: &[String]) -> Result<usize> {
            let answer = self.next(label)?;
            Self::pick(&answer, items)
        }

        fn select_many(&mut self, label: &str, items: &[String]) -> Result<Vec<usize>> {
            let answer = self.next(label)?;
            answer
                .split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(|part| Self::pick(part, items))
                .collect()
        }

        fn ask_for_many(&mut self, question: &str) -> Result<Vec<String>> {
            let mut entries = Vec::new();
            loop {
                let answer = self.next(question)?;
                if answer.is_empty() {
                    return Ok(entries);
                }
                entries.push(answer);
            }
        }
    }
}
