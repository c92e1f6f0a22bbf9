//! Output formatting for CLI commands.
//!
//! Every printer writes to a [`Write`] so tests can render into a buffer.
//!
//! Submodules:
//! - [`color`]: Color and styling helpers

pub mod color;

use crate::domain::{Issue, IssueType, Project, Release, Status};
use quire_record::{ChangeLog, LogEvent, Timestamp};
use regex::Regex;
use std::sync::LazyLock;
use std::env;
use std::io::{self, Write};

pub use color::{error, success};

use color::{
    bold, colorize_name, colorize_release_status, colorize_status, colorize_type, colorize_widget,
    dimmed,
};

// ============================================================================
// Output Configuration
// ============================================================================

const DEFAULT_MAX_CONTENT_WIDTH: usize = 80;

/// Configuration for output formatting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputConfig {
    /// Maximum content width for text wrapping.
    pub max_width: usize,
    /// Whether to use colors in output.
    pub use_colors: bool,
}

impl OutputConfig {
    /// Create a new OutputConfig with explicit values.
    #[must_use]
    pub fn new(max_width: usize, use_colors: bool) -> Self {
        Self {
            max_width,
            use_colors,
        }
    }

    /// Create an OutputConfig by reading from environment variables.
    ///
    /// Reads:
    /// - `QUIRE_MAX_WIDTH`: Maximum content width (default: 80)
    /// - `NO_COLOR`: Standard env var to disable colors (any value disables colors)
    /// - `QUIRE_COLOR`: Set to "0" or "false" to disable colors (default: true)
    #[must_use]
    pub fn from_env() -> Self {
        let max_width = match env::var("QUIRE_MAX_WIDTH") {
            Ok(s) if !s.is_empty() => match s.parse() {
                Ok(width) => width,
                Err(_) => {
                    tracing::warn!(
                        env_var = "QUIRE_MAX_WIDTH",
                        value = %s,
                        default = DEFAULT_MAX_CONTENT_WIDTH,
                        "Invalid value, using default"
                    );
                    DEFAULT_MAX_CONTENT_WIDTH
                }
            },
            _ => DEFAULT_MAX_CONTENT_WIDTH,
        };

        // Respect NO_COLOR standard (https://no-color.org/)
        let use_colors = env::var("NO_COLOR").is_err()
            && env::var("QUIRE_COLOR")
                .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
                .unwrap_or(true);

        Self {
            max_width,
            use_colors,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            max_width: DEFAULT_MAX_CONTENT_WIDTH,
            use_colors: true,
        }
    }
}

/// Wrap `text` to `width` columns, keeping blank lines between paragraphs.
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(20);
    text.lines()
        .flat_map(|line| {
            if line.trim().is_empty() {
                vec![String::new()]
            } else {
                textwrap::wrap(line, width)
                    .into_iter()
                    .map(std::borrow::Cow::into_owned)
                    .collect()
            }
        })
        .collect()
}

fn capitalized(text: &str) -> String {
    let mut chars = text.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

// ============================================================================
// Issues
// ============================================================================

/// One line per issue: widget, name and title.
pub fn write_issue_line<W: Write>(w: &mut W, issue: &Issue, config: &OutputConfig) -> io::Result<()> {
    writeln!(
        w,
        "{} {}: {}",
        colorize_widget(issue.status(), config),
        colorize_name(issue.name(), config),
        issue.title()
    )
}

/// Issues grouped by type, each group sorted by status then age.
pub fn write_issue_list<'a, W: Write>(
    w: &mut W,
    issues: impl IntoIterator<Item = &'a Issue>,
    config: &OutputConfig,
) -> io::Result<()> {
    let groups = Project::group_issues(issues);
    if groups.is_empty() {
        return writeln!(w, "No matching issues.");
    }
    for (index, (kind, mut group)) in groups.into_iter().enumerate() {
        if index > 0 {
            writeln!(w)?;
        }
        group.sort_by_key(|issue| issue.sort_key());
        writeln!(w, "{}:", bold(&capitalized(kind.plural()), config))?;
        for issue in group {
            write_issue_line(w, issue, config)?;
        }
    }
    Ok(())
}

/// Every field of one issue, followed by its event log.
pub fn write_issue_details<W: Write>(
    w: &mut W,
    issue: &Issue,
    config: &OutputConfig,
) -> io::Result<()> {
    let label = |text: &str| dimmed(&format!("{text:>12}:"), config);
    let header = format!("Issue {}", issue.name());
    writeln!(w, "{}", bold(&header, config))?;
    writeln!(w, "{}", "-".repeat(header.len()))?;
    writeln!(w, "{} {}", label("Title"), issue.title())?;
    writeln!(w, "{}", label("Description"))?;
    for line in wrap_text(issue.desc(), config.max_width.saturating_sub(2)) {
        writeln!(w, "  {line}")?;
    }
    writeln!(w, "{} {}", label("Type"), colorize_type(issue.kind(), config))?;

    let status = match issue.disposition() {
        Some(disposition) => format!(
            "{}: {}",
            colorize_status(issue.status(), config),
            disposition.label()
        ),
        None => colorize_status(issue.status(), config),
    };
    writeln!(w, "{} {}", label("Status"), status)?;
    writeln!(w, "{} {}", label("Creator"), issue.reporter())?;
    if let Some(created) = issue.creation_time() {
        writeln!(w, "{} {}", label("Created"), created.pretty_date())?;
    }
    writeln!(w, "{} {}", label("Component"), issue.component())?;
    writeln!(w, "{} {}", label("Release"), issue.release().unwrap_or("none"))?;
    for (index, reference) in issue.references().iter().enumerate() {
        writeln!(w, "{} {}", label(&format!("Ref {}", index + 1)), reference)?;
    }
    writeln!(w, "{} {}", label("Identifier"), issue.id())?;

    writeln!(w)?;
    writeln!(w, "{}", bold("Event log:", config))?;
    for event in issue.log_events() {
        writeln!(
            w,
            "- {} ({}) {}",
            dimmed(&event.time.pretty_date(), config),
            event.who,
            event.what
        )?;
        for line in wrap_text(&event.comment, config.max_width.saturating_sub(4)) {
            writeln!(w, "    {line}")?;
        }
    }
    Ok(())
}

// ============================================================================
// Releases
// ============================================================================

/// Each release with its status and issue counts, then the unassigned count.
pub fn write_releases<W: Write>(w: &mut W, project: &Project, config: &OutputConfig) -> io::Result<()> {
    if project.releases().is_empty() {
        writeln!(w, "No releases.")?;
    }
    for release in project.releases() {
        let issues = project.issues_for_release(Some(release.name()));
        let open = issues.iter().filter(|issue| issue.is_open()).count();
        let when = release
            .release_time()
            .map(|time| format!(" on {}", time.pretty_date()))
            .unwrap_or_default();
        writeln!(
            w,
            "{} ({}{}): {} issue(s), {} open",
            bold(release.name(), config),
            colorize_release_status(release.status(), config),
            when,
            issues.len(),
            open
        )?;
    }
    let unassigned = project.unassigned_issues().len();
    if unassigned > 0 {
        writeln!(w, "{unassigned} unassigned issue(s)")?;
    }
    Ok(())
}

// ============================================================================
// Reports
// ============================================================================

static EMAIL_USER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(.*?)@").expect("email pattern is valid"));

fn pluralized(word: &str, count: usize) -> String {
    match (word, count) {
        (_, 1) => word.to_string(),
        ("bugfix", _) => "bugfixes".to_string(),
        _ => format!("{word}s"),
    }
}

/// How long ago `time` was, in the largest unit that keeps the number small.
fn ago(time: Timestamp, now: Timestamp) -> String {
    const MINUTE: i64 = 60;
    const HOUR: i64 = 60 * MINUTE;
    const DAY: i64 = 24 * HOUR;
    const WEEK: i64 = 7 * DAY;

    let diff = (now.as_datetime() - time.as_datetime()).num_seconds().abs();
    let (count, unit) = if diff < MINUTE {
        (diff, "second")
    } else if diff < 3 * HOUR {
        (diff / MINUTE, "minute")
    } else if diff < 3 * DAY {
        (diff / HOUR, "hour")
    } else if diff < 2 * WEEK {
        (diff / DAY, "day")
    } else if diff < 8 * WEEK {
        (diff / WEEK, "week")
    } else if diff < 52 * WEEK {
        (diff / (4 * WEEK), "month")
    } else {
        (diff / (52 * WEEK), "year")
    };
    let count = usize::try_from(count).unwrap_or(usize::MAX);
    format!("{count} {}", pluralized(unit, count))
}

/// The user part of an `Name <user@host>` actor, at most 16 characters.
fn short_author(who: &str) -> String {
    let short = EMAIL_USER
        .captures(who)
        .and_then(|captures| captures.get(1))
        .map_or(who, |user| user.as_str());
    short.chars().take(16).collect()
}

/// One widget per issue, closed issues first.
fn status_bar(issues: &[&Issue]) -> String {
    let mut statuses = [Status::Closed, Status::Unstarted, Status::Paused, Status::InProgress];
    statuses.sort_by_key(|status| std::cmp::Reverse(status.sort_order()));
    statuses
        .iter()
        .map(|status| {
            let count = issues.iter().filter(|issue| issue.status() == *status).count();
            status.widget().repeat(count)
        })
        .collect()
}

/// Progress of each release (`None` for unassigned issues): closed over total
/// counts per type, then how close it is to shipping.
pub fn write_status<W: Write>(
    w: &mut W,
    project: &Project,
    releases: &[Option<&Release>],
    config: &OutputConfig,
) -> io::Result<()> {
    if releases.is_empty() {
        return writeln!(w, "No releases.");
    }

    let rows: Vec<(&str, Vec<String>, String)> = releases
        .iter()
        .map(|release| {
            let name = release.map(Release::name);
            let issues = project.issues_for_release(name);
            let middle = project
                .type_counts(name)
                .into_iter()
                .map(|(kind, count)| {
                    format!(
                        "{:2}/{:2} {}",
                        count.closed,
                        count.total,
                        pluralized(&kind.to_string(), count.total)
                    )
                })
                .collect();
            let bar = match release {
                None => String::new(),
                Some(release) if release.is_released() => "(released)".to_string(),
                Some(_) if issues.is_empty() => "(no issues)".to_string(),
                Some(_) if issues.iter().all(|issue| issue.is_closed()) => {
                    "(ready for release)".to_string()
                }
                Some(_) => status_bar(&issues),
            };
            (name.unwrap_or("unassigned"), middle, bar)
        })
        .collect();

    let title_width = rows.iter().map(|(title, _, _)| title.len()).max().unwrap_or(0);
    let mut column_widths = vec![0; IssueType::ALL.len()];
    for (_, middle, _) in &rows {
        for (width, cell) in column_widths.iter_mut().zip(middle) {
            *width = (*width).max(cell.len());
        }
    }

    for (title, middle, bar) in rows {
        let mut line = format!("{} ", bold(&format!("{title:<title_width$}"), config));
        let last = middle.len().saturating_sub(1);
        for (index, (cell, &width)) in middle.iter().zip(&column_widths).enumerate() {
            if index < last {
                line.push_str(&format!("{:<w$} ", format!("{cell},"), w = width + 1));
            } else {
                line.push_str(&format!("{cell:<width$} "));
            }
        }
        line.push_str(&bar);
        writeln!(w, "{}", line.trim_end())?;
    }
    Ok(())
}

/// Issue lines for each release (`None` for unassigned issues), open issues
/// only unless `include_closed` is set.
pub fn write_todo<W: Write>(
    w: &mut W,
    project: &Project,
    releases: &[Option<&Release>],
    include_closed: bool,
    config: &OutputConfig,
) -> io::Result<()> {
    for release in releases {
        match release {
            Some(release) => writeln!(
                w,
                "{} ({}):",
                bold(release.name(), config),
                colorize_release_status(release.status(), config)
            )?,
            None => writeln!(w, "{}", bold("Unassigned:", config))?,
        }
        let issues = project.todo_for(release.map(Release::name), include_closed);
        if issues.is_empty() {
            writeln!(w, "No open issues.")?;
        }
        for issue in issues {
            write_issue_line(w, issue, config)?;
        }
        writeln!(w)?;
    }
    Ok(())
}

/// Issue lines in the order given, or a note when there are none.
pub fn write_issue_lines<'a, W: Write>(
    w: &mut W,
    issues: impl IntoIterator<Item = &'a Issue>,
    config: &OutputConfig,
) -> io::Result<()> {
    let mut any = false;
    for issue in issues {
        any = true;
        write_issue_line(w, issue, config)?;
    }
    if !any {
        writeln!(w, "No matching issues.")?;
    }
    Ok(())
}

/// A release heading followed by one bullet per closed issue.
pub fn write_changelog<W: Write>(
    w: &mut W,
    release: &Release,
    groups: &[(IssueType, Vec<&Issue>)],
) -> io::Result<()> {
    let when = release
        .release_time()
        .map_or_else(|| "unreleased".to_string(), |time| time.pretty_date());
    writeln!(w, "== {} / {when}", release.name())?;
    for (kind, issues) in groups {
        for issue in issues {
            match kind {
                IssueType::Bugfix => writeln!(w, "* {kind}: {}", issue.title())?,
                _ => writeln!(w, "* {}", issue.title())?,
            }
        }
    }
    Ok(())
}

/// Each event in full: when, who, which issue, what and the comment.
pub fn write_log<W: Write>(
    w: &mut W,
    events: &[(&LogEvent, &Issue)],
    config: &OutputConfig,
) -> io::Result<()> {
    let now = Timestamp::now();
    for (index, (event, issue)) in events.iter().enumerate() {
        if index > 0 {
            writeln!(w)?;
        }
        writeln!(
            w,
            "date  : {} ({} ago)",
            event.time.to_rfc3339(),
            ago(event.time, now)
        )?;
        writeln!(w, "author: {}", event.who)?;
        writeln!(w, "    id: {}", dimmed(issue.id(), config))?;
        writeln!(
            w,
            " issue: [{}] {}",
            colorize_name(issue.name(), config),
            issue.title()
        )?;
        writeln!(w)?;
        writeln!(w, "  {}", event.what)?;
        if !event.comment.trim().is_empty() {
            for line in event.comment.lines() {
                writeln!(w, "  > {line}")?;
            }
        }
    }
    Ok(())
}

/// One line per event: age, issue, author and what happened.
pub fn write_shortlog<W: Write>(w: &mut W, events: &[(&LogEvent, &Issue)]) -> io::Result<()> {
    let now = Timestamp::now();
    for (event, issue) in events {
        writeln!(
            w,
            "{:>13}|{:>13}|{:>13}|{}",
            ago(event.time, now),
            issue.name(),
            short_author(&event.who),
            event.what
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Component, Disposition, IssueContext, Release};
    use quire_record::FieldValues;

    const WHO: &str = "Ann <ann@example.com>";

    fn plain() -> OutputConfig {
        OutputConfig::new(80, false)
    }

    fn project() -> Project {
        let mut project = Project::new("demo").unwrap();
        project.add_component(Component::new("core").unwrap()).unwrap();
        project.add_release(Release::new("v1", WHO, None).unwrap()).unwrap();
        let issues = [("Crash", "bugfix"), ("Faster", "feature"), ("Docs", "task")];
        for (day, (title, kind)) in issues.into_iter().enumerate() {
            let context: IssueContext = project.issue_context(WHO);
            let issue = Issue::create(
                &FieldValues::new()
                    .with("title", title)
                    .with("desc", "First line\n\nSecond paragraph")
                    .with("type", kind)
                    .with("creation_time", format!("2024-03-0{}T10:00:00Z", day + 1)),
                &context,
                None,
            )
            .unwrap();
            project.add_issue(issue).unwrap();
        }
        project
    }

    fn render(f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    // ========== Configuration Tests ==========

    #[test]
    fn test_default_config() {
        let config = OutputConfig::default();
        assert_eq!(config.max_width, DEFAULT_MAX_CONTENT_WIDTH);
        assert!(config.use_colors);
    }

    #[test]
    fn test_wrap_text_keeps_paragraphs() {
        let lines = wrap_text("one two three four five six\n\nseven", 20);
        assert_eq!(lines, vec!["one two three four", "five six", "", "seven"]);
    }

    // ========== Issue Printing Tests ==========

    #[test]
    fn test_issue_list_groups_by_type() {
        let project = project();
        let text = render(|w| write_issue_list(w, project.issues(), &plain()));

        let bugfixes = text.find("Bugfixes:").unwrap();
        let features = text.find("Features:").unwrap();
        let tasks = text.find("Tasks:").unwrap();
        assert!(bugfixes < features && features < tasks);
        assert!(text.contains("_ core-1: Crash"));
    }

    #[test]
    fn test_empty_issue_list() {
        let text = render(|w| write_issue_list(w, std::iter::empty(), &plain()));
        assert_eq!(text, "No matching issues.\n");
    }

    #[test]
    fn test_issue_details_show_disposition_and_log() {
        let mut project = project();
        project
            .issue_for_mut("core-1")
            .unwrap()
            .close(Disposition::Wontfix, WHO, Some("not reproducible"))
            .unwrap();
        let issue = project.issue_for("core-1").unwrap();
        let text = render(|w| write_issue_details(w, issue, &plain()));

        assert!(text.starts_with("Issue core-1\n"));
        assert!(text.contains("closed: won't fix"));
        assert!(text.contains("  Second paragraph"));
        assert!(text.contains(&format!("({WHO}) created")));
        assert!(text.contains("    not reproducible"));
        assert!(text.contains(issue.id()));
    }

    // ========== Release Printing Tests ==========

    #[test]
    fn test_releases_with_counts() {
        let mut project = project();
        project.assign_to_release("core-1", "v1", WHO, None).unwrap();
        let text = render(|w| write_releases(w, &project, &plain()));

        assert!(text.contains("v1 (unreleased): 1 issue(s), 1 open"));
        assert!(text.contains("2 unassigned issue(s)"));
    }

    // ========== Report Printing Tests ==========

    #[test]
    fn test_status_counts_and_bar() {
        let mut project = project();
        project.assign_to_release("core-1", "v1", WHO, None).unwrap();
        project.assign_to_release("core-2", "v1", WHO, None).unwrap();
        project
            .issue_for_mut("core-1")
            .unwrap()
            .close(Disposition::Fixed, WHO, None)
            .unwrap();
        let release = project.release_for("v1");
        let text = render(|w| write_status(w, &project, &[release, None], &plain()));
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("v1         "), "{}", lines[0]);
        assert!(lines[0].contains(" 1/ 1 bugfix,"));
        assert!(lines[0].contains(" 0/ 1 feature,"));
        assert!(lines[0].contains(" 0/ 0 tasks"));
        assert!(lines[0].ends_with("x_"), "{}", lines[0]);
        assert!(lines[1].starts_with("unassigned"));
        assert!(lines[1].ends_with(" 0/ 1 task"), "{}", lines[1]);
    }

    #[test]
    fn test_status_bar_labels() {
        let mut project = project();
        project.add_release(Release::new("v2", WHO, None).unwrap()).unwrap();
        project.assign_to_release("core-3", "v1", WHO, None).unwrap();
        project
            .issue_for_mut("core-3")
            .unwrap()
            .close(Disposition::Fixed, WHO, None)
            .unwrap();

        let rows = [project.release_for("v1"), project.release_for("v2")];
        let text = render(|w| write_status(w, &project, &rows, &plain()));
        assert!(text.lines().next().unwrap().ends_with("(ready for release)"));
        assert!(text.lines().nth(1).unwrap().ends_with("(no issues)"));

        project.release("v1", WHO, None).unwrap();
        let rows = [project.release_for("v1")];
        let text = render(|w| write_status(w, &project, &rows, &plain()));
        assert!(text.trim_end().ends_with("(released)"));

        assert_eq!(render(|w| write_status(w, &project, &[], &plain())), "No releases.\n");
    }

    #[test]
    fn test_todo_by_release() {
        let mut project = project();
        project.assign_to_release("core-1", "v1", WHO, None).unwrap();
        project
            .issue_for_mut("core-1")
            .unwrap()
            .close(Disposition::Fixed, WHO, None)
            .unwrap();
        let rows = [project.release_for("v1"), None];

        let text = render(|w| write_todo(w, &project, &rows, false, &plain()));
        assert!(text.starts_with("v1 (unreleased):\nNo open issues.\n\nUnassigned:\n"));
        assert!(text.contains("_ core-2: Faster"));

        let full = render(|w| write_todo(w, &project, &rows, true, &plain()));
        assert!(full.starts_with("v1 (unreleased):\nx core-1: Crash\n"));
    }

    #[test]
    fn test_changelog_prefixes_bugfixes() {
        let mut project = project();
        for name in ["core-1", "core-2", "core-3"] {
            project.assign_to_release(name, "v1", WHO, None).unwrap();
        }
        for name in ["core-1", "core-2"] {
            project
                .issue_for_mut(name)
                .unwrap()
                .close(Disposition::Fixed, WHO, None)
                .unwrap();
        }
        let groups = project.changelog_for("v1").unwrap();
        let release = project.release_for("v1").unwrap();
        let text = render(|w| write_changelog(w, release, &groups));
        assert_eq!(text, "== v1 / unreleased\n* bugfix: Crash\n* Faster\n");
    }

    #[test]
    fn test_log_and_shortlog() {
        let mut project = project();
        project
            .issue_for_mut("core-2")
            .unwrap()
            .comment(WHO, "first line\nsecond line")
            .unwrap();
        let events: Vec<_> = project
            .recent_events(None)
            .into_iter()
            .filter(|(event, _)| event.what == "commented")
            .collect();

        let long = render(|w| write_log(w, &events, &plain()));
        assert!(long.contains(&format!("author: {WHO}\n")));
        assert!(long.contains(" issue: [core-2] Faster\n"));
        assert!(long.contains("\n  commented\n  > first line\n  > second line\n"));

        let short = render(|w| write_shortlog(w, &events));
        let fields: Vec<&str> = short.trim_end().split('|').collect();
        assert_eq!(fields.len(), 4);
        assert!(fields[0].contains("second"));
        assert_eq!(fields[3], "commented");
        assert_eq!(fields[1].trim(), "core-2");
        assert_eq!(fields[2].trim(), "ann");
    }

    #[test]
    fn test_ago_units() {
        let now: Timestamp = "2024-06-01T00:00:00Z".parse().unwrap();
        let at = |text: &str| ago(text.parse().unwrap(), now);
        assert_eq!(at("2024-05-31T23:59:59Z"), "1 second");
        assert_eq!(at("2024-05-31T22:00:00Z"), "120 minutes");
        assert_eq!(at("2024-05-30T00:00:00Z"), "48 hours");
        assert_eq!(at("2024-05-25T00:00:00Z"), "7 days");
        assert_eq!(at("2024-04-20T00:00:00Z"), "6 weeks");
        assert_eq!(at("2023-06-01T00:00:00Z"), "1 year");
    }

    #[test]
    fn test_short_author() {
        assert_eq!(short_author(WHO), "ann");
        assert_eq!(short_author("nobody"), "nobody");
        assert_eq!(short_author("a very long name without email"), "a very long name");
    }

    #[test]
    fn test_issue_lines_in_given_order() {
        let project = project();
        let issues = [project.issue_for("core-3").unwrap(), project.issue_for("core-1").unwrap()];
        let text = render(|w| write_issue_lines(w, issues, &plain()));
        assert_eq!(text, "_ core-3: Docs\n_ core-1: Crash\n");
        let none = render(|w| write_issue_lines(w, std::iter::empty(), &plain()));
        assert_eq!(none, "No matching issues.\n");
    }
}
