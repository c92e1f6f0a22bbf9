//! CLI argument structs for all commands.
//!
//! Each command has its own argument struct with clap derive attributes
//! for parsing and validation.

use clap::Parser;

use super::types::{DispositionArg, IssueTypeArg, StatusFilterArg};
use super::validators::{validate_issue_ident, validate_name, validate_title};

/// Arguments for the `init` command
#[derive(Parser, Debug, Clone)]
pub struct InitArgs {
    /// Project name (prompted when omitted)
    #[arg(long, value_parser = validate_name)]
    pub project: Option<String>,

    /// Component names (comma-separated; defaults to the project name)
    #[arg(short, long, value_delimiter = ',', value_parser = validate_name)]
    pub components: Vec<String>,

    /// Your name (prompted when omitted)
    #[arg(long)]
    pub name: Option<String>,

    /// Your email address (prompted when omitted)
    #[arg(long)]
    pub email: Option<String>,

    /// Suppress output messages
    #[arg(short, long)]
    pub quiet: bool,
}

/// Arguments for the `add` command
///
/// Without `--title` every field is asked for interactively; the options
/// given on the command line are used as-is.
#[derive(Parser, Debug, Clone)]
pub struct AddArgs {
    /// Issue title
    #[arg(long, value_parser = validate_title)]
    pub title: Option<String>,

    /// Detailed description
    #[arg(short, long)]
    pub desc: Option<String>,

    /// Issue type
    #[arg(short = 't', long = "type", value_enum)]
    pub kind: Option<IssueTypeArg>,

    /// Component (optional when the project has only one)
    #[arg(short, long, value_parser = validate_name)]
    pub component: Option<String>,

    /// Release to assign the issue to
    #[arg(short, long, value_parser = validate_name)]
    pub release: Option<String>,

    /// Comment for the event log
    #[arg(short = 'm', long)]
    pub comment: Option<String>,
}

/// Arguments for commands that act on one issue
#[derive(Parser, Debug, Clone)]
pub struct IssueArgs {
    /// Issue name (e.g. core-1) or id prefix
    #[arg(value_parser = validate_issue_ident)]
    pub issue: String,

    /// Comment for the event log
    #[arg(short = 'm', long)]
    pub comment: Option<String>,
}

/// Arguments for commands that act on a component or release by name
#[derive(Parser, Debug, Clone)]
pub struct NameArgs {
    /// Component or release name
    #[arg(value_parser = validate_name)]
    pub name: String,
}

/// Arguments for the `add-release` and `release` commands
#[derive(Parser, Debug, Clone)]
pub struct ReleaseArgs {
    /// Release name
    #[arg(value_parser = validate_name)]
    pub name: String,

    /// Comment for the event log
    #[arg(short = 'm', long)]
    pub comment: Option<String>,
}

/// Arguments for the `close` command
#[derive(Parser, Debug, Clone)]
pub struct CloseArgs {
    /// Issue name (e.g. core-1) or id prefix
    #[arg(value_parser = validate_issue_ident)]
    pub issue: String,

    /// How the issue was resolved
    #[arg(short, long, value_enum, default_value_t = DispositionArg::Fixed)]
    pub disposition: DispositionArg,

    /// Comment for the event log
    #[arg(short = 'm', long)]
    pub comment: Option<String>,
}

/// Arguments for the `assign` command
#[derive(Parser, Debug, Clone)]
pub struct AssignArgs {
    /// Issue name (e.g. core-1) or id prefix
    #[arg(value_parser = validate_issue_ident)]
    pub issue: String,

    /// Release to assign it to
    #[arg(value_parser = validate_name)]
    pub release: String,

    /// Comment for the event log
    #[arg(short = 'm', long)]
    pub comment: Option<String>,
}

/// Arguments for the `set-component` command
#[derive(Parser, Debug, Clone)]
pub struct SetComponentArgs {
    /// Issue name (e.g. core-1) or id prefix
    #[arg(value_parser = validate_issue_ident)]
    pub issue: String,

    /// Component to move it to
    #[arg(value_parser = validate_name)]
    pub component: String,

    /// Comment for the event log
    #[arg(short = 'm', long)]
    pub comment: Option<String>,
}

/// Arguments for the `add-reference` command
#[derive(Parser, Debug, Clone)]
pub struct AddReferenceArgs {
    /// Issue name (e.g. core-1) or id prefix
    #[arg(value_parser = validate_issue_ident)]
    pub issue: String,

    /// URL or other pointer to related material
    pub reference: String,

    /// Comment for the event log
    #[arg(short = 'm', long)]
    pub comment: Option<String>,
}

/// Arguments for the `comment` command
#[derive(Parser, Debug, Clone)]
pub struct CommentArgs {
    /// Issue name (e.g. core-1) or id prefix
    #[arg(value_parser = validate_issue_ident)]
    pub issue: String,

    /// Comment text (prompted when omitted)
    #[arg(short = 'm', long)]
    pub message: Option<String>,
}

/// Arguments for the `list` command
#[derive(Parser, Debug, Clone)]
pub struct ListArgs {
    /// Only issues assigned to this release
    #[arg(short, long, value_parser = validate_name, conflicts_with = "unassigned")]
    pub release: Option<String>,

    /// Only issues with no release
    #[arg(short, long)]
    pub unassigned: bool,

    /// Only issues in this component
    #[arg(short, long, value_parser = validate_name)]
    pub component: Option<String>,

    /// Which issues to show by status
    #[arg(short, long, value_enum, default_value_t = StatusFilterArg::Open)]
    pub status: StatusFilterArg,
}

/// Arguments for the `show` command
#[derive(Parser, Debug, Clone)]
pub struct ShowArgs {
    /// Issue name (e.g. core-1) or id prefix
    #[arg(value_parser = validate_issue_ident)]
    pub issue: String,
}

/// Arguments for the `status` command
#[derive(Parser, Debug, Clone)]
pub struct StatusArgs {
    /// Only this release (default: unreleased releases and unassigned issues)
    #[arg(value_parser = validate_name)]
    pub release: Option<String>,
}

/// Arguments for the `todo` command
#[derive(Parser, Debug, Clone)]
pub struct TodoArgs {
    /// Only this release (default: unreleased releases and unassigned issues)
    #[arg(value_parser = validate_name)]
    pub release: Option<String>,

    /// Include closed issues
    #[arg(short, long)]
    pub all: bool,
}

/// Arguments for the `changelog` command
#[derive(Parser, Debug, Clone)]
pub struct ChangelogArgs {
    /// Release name
    #[arg(value_parser = validate_name)]
    pub release: String,
}

/// Arguments for the `log` and `shortlog` commands
#[derive(Parser, Debug, Clone)]
pub struct LogArgs {
    /// Show at most this many events
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
}

/// Arguments for the `grep` command
#[derive(Parser, Debug, Clone)]
pub struct GrepArgs {
    /// Regular expression matched against titles, descriptions and comments
    pub pattern: String,

    /// Ignore case in both the pattern and the issue text
    #[arg(short, long)]
    pub ignore_case: bool,
}
