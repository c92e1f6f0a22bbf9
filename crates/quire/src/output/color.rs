//! Color and styling helpers for CLI output.
//!
//! Semantic Color Theme:
//!   - Success/Done:   green   (closed issues, released releases)
//!   - Warning/Active: yellow  (in-progress and paused issues)
//!   - Error:          red     (bugfixes, failures)
//!   - Info/Reference: cyan    (issue names)
//!   - Muted:          dimmed  (field labels, log metadata)
//!   - Emphasis:       bold    (section headers)

use crate::domain::{IssueType, ReleaseStatus, Status};
use colored::Colorize;

use super::OutputConfig;

/// Apply semantic "success" color (green) to text.
pub fn success(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.green().to_string()
}

/// Apply semantic "error" color (red) to text.
pub fn error(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.red().to_string()
}

/// Apply color to status text based on issue status.
pub(crate) fn colorize_status(status: Status, config: &OutputConfig) -> String {
    let text = status.to_string();
    if !config.use_colors {
        return text;
    }
    match status {
        Status::Unstarted => text,
        Status::InProgress | Status::Paused => text.yellow().to_string(),
        Status::Closed => text.green().to_string(),
    }
}

/// The status widget, colored like the status.
pub(crate) fn colorize_widget(status: Status, config: &OutputConfig) -> String {
    let widget = status.widget();
    if !config.use_colors {
        return widget.to_string();
    }
    match status {
        Status::Unstarted => widget.to_string(),
        Status::InProgress | Status::Paused => widget.yellow().to_string(),
        Status::Closed => widget.green().to_string(),
    }
}

/// Apply color to a release status.
pub(crate) fn colorize_release_status(status: ReleaseStatus, config: &OutputConfig) -> String {
    let text = status.to_string();
    if !config.use_colors {
        return text;
    }
    match status {
        ReleaseStatus::Unreleased => text.yellow().to_string(),
        ReleaseStatus::Released => text.green().to_string(),
    }
}

/// Apply color to an issue type.
pub(crate) fn colorize_type(kind: IssueType, config: &OutputConfig) -> String {
    let text = kind.to_string();
    if !config.use_colors {
        return text;
    }
    match kind {
        IssueType::Bugfix => text.red().to_string(),
        IssueType::Feature => text.cyan().to_string(),
        IssueType::Task => text,
    }
}

/// Colorize an issue name (cyan).
pub(crate) fn colorize_name(name: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return name.to_string();
    }
    name.cyan().to_string()
}

/// Bold text, for headers.
pub(crate) fn bold(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.bold().to_string()
}

/// Dimmed text, for labels and metadata.
pub(crate) fn dimmed(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.dimmed().to_string()
}
