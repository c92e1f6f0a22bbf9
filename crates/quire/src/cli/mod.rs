//! CLI argument parsing and command dispatch.
//!
//! This module provides the command-line interface for quire using clap's derive API.
//! Each command has its own argument struct with validation and helpful error messages.
//!
//! # Commands
//!
//! - `init`: Create `.quire.yaml` and an empty project
//! - `add` / `drop`: Create or delete an issue
//! - `add-release` / `drop-release` / `release`: Manage releases
//! - `add-component`: Add a component
//! - `start` / `stop` / `close`: Move an issue through its states
//! - `assign` / `unassign` / `set-component`: Reassign an issue
//! - `comment` / `add-reference`: Annotate an issue
//! - `list` / `show` / `releases`: Report
//! - `status` / `todo` / `changelog`: Summarize releases
//! - `log` / `shortlog` / `grep`: Search activity and text
//! - `validate`: Check the project's consistency
//!
//! # Global Flags
//!
//! - `--verbose`: Debug logging (applies to all commands)
//!
//! # Example
//!
//! ```bash
//! quire add --title "Crash on empty input" --type bugfix
//! quire assign core-1 v1.0
//! quire start core-1 -m "looking into it"
//! quire close core-1 --disposition fixed
//! quire release v1.0
//! ```

mod args;
mod execute;
mod prompt;
mod types;
mod validators;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::app::App;

pub use args::{
    AddArgs, AddReferenceArgs, AssignArgs, ChangelogArgs, CloseArgs, CommentArgs, GrepArgs,
    InitArgs, IssueArgs, ListArgs, LogArgs, NameArgs, ReleaseArgs, SetComponentArgs, ShowArgs,
    StatusArgs, TodoArgs,
};
pub use prompt::TerminalPrompter;
pub use types::{DispositionArg, IssueTypeArg, StatusFilterArg};
pub use validators::{validate_issue_ident, validate_name, validate_title};

/// Quire - a distributed issue tracker
///
/// Keeps a project's issues as YAML files next to its code, one file per
/// issue, so they are versioned and merged like everything else.
#[derive(Parser, Debug)]
#[command(name = "quire")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Log debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Initialize a new quire repository
    ///
    /// Writes `.quire.yaml` with your name and email, and an empty project
    /// with its components into the issue directory.
    Init(InitArgs),

    /// Add an issue
    ///
    /// Without --title, every field is asked for interactively.
    Add(AddArgs),

    /// Delete an issue and its file
    Drop(IssueArgs),

    /// Add a release
    AddRelease(ReleaseArgs),

    /// Delete a release no issue is assigned to
    DropRelease(NameArgs),

    /// Add a component
    AddComponent(NameArgs),

    /// Add a reference (URL or other pointer) to an issue
    AddReference(AddReferenceArgs),

    /// Start work on an issue
    Start(IssueArgs),

    /// Stop work on an issue
    Stop(IssueArgs),

    /// Close an issue
    Close(CloseArgs),

    /// Assign an issue to a release
    Assign(AssignArgs),

    /// Move an issue to another component
    ///
    /// Issues are renumbered afterwards, so the issue's name may change.
    SetComponent(SetComponentArgs),

    /// Remove an issue from its release
    Unassign(IssueArgs),

    /// Comment on an issue
    Comment(CommentArgs),

    /// Mark a release as released
    ///
    /// Fails while any issue assigned to it is still open.
    Release(ReleaseArgs),

    /// List issues
    List(ListArgs),

    /// Show an issue with its event log
    Show(ShowArgs),

    /// List releases with their issue counts
    Releases,

    /// Show progress per release
    ///
    /// Counts closed and total issues of each type, with a bar of status
    /// widgets for releases still in progress.
    Status(StatusArgs),

    /// List the issues left to do, by release
    Todo(TodoArgs),

    /// Print the changes made in a release
    Changelog(ChangelogArgs),

    /// Show recent activity across all issues
    Log(LogArgs),

    /// Show recent activity, one line per event
    Shortlog(LogArgs),

    /// Find issues whose title, description or comments match a regex
    Grep(GrepArgs),

    /// Check that the project and its issues are consistent
    Validate,
}

async fn open() -> Result<App> {
    Ok(App::from_directory(&std::env::current_dir()?).await?)
}

impl Cli {
    /// Parse CLI arguments from command line
    #[must_use]
    pub fn parse_args() -> Self {
        <Self as Parser>::parse()
    }

    /// Parse CLI arguments from an iterator (for testing)
    ///
    /// # Errors
    ///
    /// Returns clap's error for invalid arguments.
    pub fn try_parse_from<I, T>(iter: I) -> std::result::Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(iter)
    }

    /// Execute the CLI command
    ///
    /// # Errors
    ///
    /// Returns any error from locating the repository, the operation itself,
    /// or saving.
    pub async fn execute(&self) -> Result<()> {
        match &self.command {
            Some(Commands::Init(args)) => execute::execute_init(args).await,
            Some(Commands::Add(args)) => execute::execute_add(&mut open().await?, args).await,
            Some(Commands::Drop(args)) => execute::execute_drop(&mut open().await?, args).await,
            Some(Commands::AddRelease(args)) => {
                execute::execute_add_release(&mut open().await?, args).await
            }
            Some(Commands::DropRelease(args)) => {
                execute::execute_drop_release(&mut open().await?, args).await
            }
            Some(Commands::AddComponent(args)) => {
                execute::execute_add_component(&mut open().await?, args).await
            }
            Some(Commands::AddReference(args)) => {
                execute::execute_add_reference(&mut open().await?, args).await
            }
            Some(Commands::Start(args)) => execute::execute_start(&mut open().await?, args).await,
            Some(Commands::Stop(args)) => execute::execute_stop(&mut open().await?, args).await,
            Some(Commands::Close(args)) => execute::execute_close(&mut open().await?, args).await,
            Some(Commands::Assign(args)) => {
                execute::execute_assign(&mut open().await?, args).await
            }
            Some(Commands::SetComponent(args)) => {
                execute::execute_set_component(&mut open().await?, args).await
            }
            Some(Commands::Unassign(args)) => {
                execute::execute_unassign(&mut open().await?, args).await
            }
            Some(Commands::Comment(args)) => {
                execute::execute_comment(&mut open().await?, args).await
            }
            Some(Commands::Release(args)) => {
                execute::execute_release(&mut open().await?, args).await
            }
            Some(Commands::List(args)) => execute::execute_list(&open().await?, args),
            Some(Commands::Show(args)) => execute::execute_show(&open().await?, args),
            Some(Commands::Releases) => execute::execute_releases(&open().await?),
            Some(Commands::Status(args)) => execute::execute_status(&open().await?, args),
            Some(Commands::Todo(args)) => execute::execute_todo(&open().await?, args),
            Some(Commands::Changelog(args)) => execute::execute_changelog(&open().await?, args),
            Some(Commands::Log(args)) => execute::execute_log(&open().await?, args),
            Some(Commands::Shortlog(args)) => execute::execute_shortlog(&open().await?, args),
            Some(Commands::Grep(args)) => execute::execute_grep(&open().await?, args),
            Some(Commands::Validate) => execute::execute_validate(&open().await?),
            None => {
                println!("Quire distributed issue tracker");
                println!("Use --help for more information");
                Ok(())
            }
        }
    }
}
