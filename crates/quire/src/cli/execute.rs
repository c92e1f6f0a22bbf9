//! Command execution logic.
//!
//! Each command loads the project through [`App`], calls one entity-graph
//! operation as the configured actor, saves, and reports what it did.

use anyhow::{Context, Result};
use regex::RegexBuilder;
use std::io::{self, Write};

use super::args::{
    AddArgs, AddReferenceArgs, AssignArgs, ChangelogArgs, CloseArgs, CommentArgs, GrepArgs,
    InitArgs, IssueArgs, ListArgs, LogArgs, NameArgs, ReleaseArgs, SetComponentArgs, ShowArgs,
    StatusArgs, TodoArgs,
};
use super::prompt::TerminalPrompter;
use crate::app::App;
use crate::config::Config;
use crate::domain::{Component, Disposition, Issue, IssueType, Project, Release};
use crate::error::Error;
use crate::output::{self, OutputConfig};
use quire_record::{FieldValues, Prompter};

/// Save and print a confirmation.
async fn commit(app: &mut App, message: &str) -> Result<()> {
    let report = app.save().await?;
    tracing::debug!(?report, "saved");
    println!("{}", output::success(message, &OutputConfig::from_env()));
    Ok(())
}

/// Execute the init command
pub async fn execute_init(args: &InitArgs) -> Result<()> {
    use crate::commands::init;

    let current_dir = std::env::current_dir()?;
    let mut prompter = TerminalPrompter::stdio();

    let config = match (&args.name, &args.email) {
        (Some(name), Some(email)) => Config::new(name, email)?,
        _ => Config::create_interactively(&mut prompter)?,
    };

    let project = match &args.project {
        Some(name) => {
            let mut project = Project::new(name)?;
            let components = if args.components.is_empty() {
                vec![name.clone()]
            } else {
                args.components.clone()
            };
            for component in components {
                project.add_component(Component::new(&component)?)?;
            }
            project
        }
        None => Project::create_interactively(&mut prompter, &FieldValues::new())?,
    };

    let result = init::init(&current_dir, config, project).await?;

    if !args.quiet {
        println!("Initialized quire project '{}'", result.project);
        println!("  Config: {}", result.config_file.display());
        println!("  Issues: {}", result.issue_dir.display());
    }

    Ok(())
}

/// Execute the add command
pub async fn execute_add(app: &mut App, args: &AddArgs) -> Result<()> {
    let actor = app.actor();
    let context = app.project().issue_context(&actor);

    let mut values = FieldValues::new();
    if let Some(title) = &args.title {
        values.insert("title", title.as_str().into());
    }
    if let Some(desc) = &args.desc {
        values.insert("desc", desc.as_str().into());
    }
    if let Some(kind) = args.kind {
        values.insert("type", IssueType::from(kind).to_string().into());
    }
    if let Some(component) = &args.component {
        values.insert("component", component.as_str().into());
    }
    if let Some(release) = &args.release {
        values.insert("release", release.as_str().into());
    }

    let issue = if args.title.is_some() {
        if values.get("desc").is_none() {
            values.insert("desc", "".into());
        }
        if values.get("type").is_none() {
            values.insert("type", IssueType::Task.to_string().into());
        }
        Issue::create(&values, &context, args.comment.as_deref())?
    } else {
        let mut prompter = TerminalPrompter::stdio();
        Issue::create_interactively(&mut prompter, &context, &values, args.comment.as_deref())?
    };

    let added = app.project_mut().add_issue(issue)?;
    let message = format!("Added issue {}: {}", added.name(), added.title());
    commit(app, &message).await
}

/// Execute the drop command
pub async fn execute_drop(app: &mut App, args: &IssueArgs) -> Result<()> {
    let dropped = app.project_mut().drop_issue(&args.issue)?;
    let message = format!("Dropped issue {}: {}", dropped.name(), dropped.title());
    commit(app, &message).await
}

/// Execute the add-release command
pub async fn execute_add_release(app: &mut App, args: &ReleaseArgs) -> Result<()> {
    let release = Release::new(&args.name, &app.actor(), args.comment.as_deref())?;
    app.project_mut().add_release(release)?;
    commit(app, &format!("Added release {}", args.name)).await
}

/// Execute the drop-release command
pub async fn execute_drop_release(app: &mut App, args: &NameArgs) -> Result<()> {
    app.project_mut().drop_release(&args.name)?;
    commit(app, &format!("Dropped release {}", args.name)).await
}

/// Execute the add-component command
pub async fn execute_add_component(app: &mut App, args: &NameArgs) -> Result<()> {
    app.project_mut()
        .add_component(Component::new(&args.name)?)?;
    commit(app, &format!("Added component {}", args.name)).await
}

/// Execute the add-reference command
pub async fn execute_add_reference(app: &mut App, args: &AddReferenceArgs) -> Result<()> {
    let actor = app.actor();
    let issue = app.project_mut().issue_for_mut(&args.issue)?;
    issue.add_reference(&args.reference, &actor, args.comment.as_deref())?;
    let message = format!("Added reference to {}", issue.name());
    commit(app, &message).await
}

/// Execute the start command
pub async fn execute_start(app: &mut App, args: &IssueArgs) -> Result<()> {
    let actor = app.actor();
    let issue = app.project_mut().issue_for_mut(&args.issue)?;
    issue.start_work(&actor, args.comment.as_deref())?;
    let message = format!("Started work on {}", issue.name());
    commit(app, &message).await
}

/// Execute the stop command
pub async fn execute_stop(app: &mut App, args: &IssueArgs) -> Result<()> {
    let actor = app.actor();
    let issue = app.project_mut().issue_for_mut(&args.issue)?;
    issue.stop_work(&actor, args.comment.as_deref())?;
    let message = format!("Stopped work on {}", issue.name());
    commit(app, &message).await
}

/// Execute the close command
pub async fn execute_close(app: &mut App, args: &CloseArgs) -> Result<()> {
    let actor = app.actor();
    let disposition: Disposition = args.disposition.into();
    let issue = app.project_mut().issue_for_mut(&args.issue)?;
    issue.close(disposition, &actor, args.comment.as_deref())?;
    let message = format!("Closed {}: {}", issue.name(), disposition.label());
    commit(app, &message).await
}

/// Execute the assign command
pub async fn execute_assign(app: &mut App, args: &AssignArgs) -> Result<()> {
    let actor = app.actor();
    app.project_mut()
        .assign_to_release(&args.issue, &args.release, &actor, args.comment.as_deref())?;
    let name = app.project().issue_for(&args.issue)?.name().to_string();
    commit(app, &format!("Assigned {name} to {}", args.release)).await
}

/// Execute the set-component command
pub async fn execute_set_component(app: &mut App, args: &SetComponentArgs) -> Result<()> {
    let actor = app.actor();
    let id = app.project().issue_for(&args.issue)?.id().to_string();
    app.project_mut().assign_to_component(
        &args.issue,
        &args.component,
        &actor,
        args.comment.as_deref(),
    )?;
    // Renumbering may have changed the name, so look the issue up by id.
    let name = app.project().issue_for(&id)?.name().to_string();
    commit(app, &format!("Moved issue to {}; it is now {name}", args.component)).await
}

/// Execute the unassign command
pub async fn execute_unassign(app: &mut App, args: &IssueArgs) -> Result<()> {
    let actor = app.actor();
    app.project_mut()
        .unassign(&args.issue, &actor, args.comment.as_deref())?;
    let name = app.project().issue_for(&args.issue)?.name().to_string();
    commit(app, &format!("Unassigned {name}")).await
}

/// Execute the comment command
pub async fn execute_comment(app: &mut App, args: &CommentArgs) -> Result<()> {
    let actor = app.actor();
    let text = match &args.message {
        Some(message) => message.clone(),
        None => TerminalPrompter::stdio().ask_multiline("Comment")?,
    };
    let issue = app.project_mut().issue_for_mut(&args.issue)?;
    issue.comment(&actor, &text)?;
    let message = format!("Commented on {}", issue.name());
    commit(app, &message).await
}

/// Execute the release command
pub async fn execute_release(app: &mut App, args: &ReleaseArgs) -> Result<()> {
    let actor = app.actor();
    app.project_mut()
        .release(&args.name, &actor, args.comment.as_deref())?;
    commit(app, &format!("Released {}", args.name)).await
}

/// Execute the list command
pub fn execute_list(app: &App, args: &ListArgs) -> Result<()> {
    let project = app.project();
    if let Some(release) = &args.release
        && project.release_for(release).is_none()
    {
        return Err(Error::not_found("release", release.as_str()).into());
    }
    if let Some(component) = &args.component
        && project.component_for(component).is_none()
    {
        return Err(Error::not_found("component", component.as_str()).into());
    }

    let issues = project.issues().iter().filter(|issue| {
        args.status.matches(issue)
            && (!args.unassigned || issue.release().is_none())
            && args
                .release
                .as_deref()
                .is_none_or(|release| issue.release() == Some(release))
            && args
                .component
                .as_deref()
                .is_none_or(|component| issue.component() == component)
    });

    let mut out = io::stdout().lock();
    output::write_issue_list(&mut out, issues, &OutputConfig::from_env())?;
    out.flush()?;
    Ok(())
}

/// Execute the show command
pub fn execute_show(app: &App, args: &ShowArgs) -> Result<()> {
    let issue = app.project().issue_for(&args.issue)?;
    let mut out = io::stdout().lock();
    output::write_issue_details(&mut out, issue, &OutputConfig::from_env())?;
    out.flush()?;
    Ok(())
}

/// Execute the releases command
pub fn execute_releases(app: &App) -> Result<()> {
    let mut out = io::stdout().lock();
    output::write_releases(&mut out, app.project(), &OutputConfig::from_env())?;
    out.flush()?;
    Ok(())
}

/// The named release, or every unreleased release followed by `None` for
/// unassigned issues.
fn report_releases<'a>(
    project: &'a Project,
    release: Option<&str>,
) -> Result<Vec<Option<&'a Release>>> {
    match release {
        Some(name) => {
            let release = project
                .release_for(name)
                .ok_or_else(|| Error::not_found("release", name))?;
            Ok(vec![Some(release)])
        }
        None => Ok(project
            .unreleased_releases()
            .into_iter()
            .map(Some)
            .chain(std::iter::once(None))
            .collect()),
    }
}

/// Execute the status command
pub fn execute_status(app: &App, args: &StatusArgs) -> Result<()> {
    let project = app.project();
    let releases = report_releases(project, args.release.as_deref())?;
    let mut out = io::stdout().lock();
    output::write_status(&mut out, project, &releases, &OutputConfig::from_env())?;
    out.flush()?;
    Ok(())
}

/// Execute the todo command
pub fn execute_todo(app: &App, args: &TodoArgs) -> Result<()> {
    let project = app.project();
    let releases = report_releases(project, args.release.as_deref())?;
    let mut out = io::stdout().lock();
    output::write_todo(&mut out, project, &releases, args.all, &OutputConfig::from_env())?;
    out.flush()?;
    Ok(())
}

/// Execute the changelog command
pub fn execute_changelog(app: &App, args: &ChangelogArgs) -> Result<()> {
    let project = app.project();
    let groups = project.changelog_for(&args.release)?;
    let release = project
        .release_for(&args.release)
        .ok_or_else(|| Error::not_found("release", args.release.as_str()))?;
    let mut out = io::stdout().lock();
    output::write_changelog(&mut out, release, &groups)?;
    out.flush()?;
    Ok(())
}

/// Execute the log command
pub fn execute_log(app: &App, args: &LogArgs) -> Result<()> {
    let events = app.project().recent_events(args.limit);
    let mut out = io::stdout().lock();
    output::write_log(&mut out, &events, &OutputConfig::from_env())?;
    out.flush()?;
    Ok(())
}

/// Execute the shortlog command
pub fn execute_shortlog(app: &App, args: &LogArgs) -> Result<()> {
    let events = app.project().recent_events(args.limit);
    let mut out = io::stdout().lock();
    output::write_shortlog(&mut out, &events)?;
    out.flush()?;
    Ok(())
}

/// Execute the grep command
pub fn execute_grep(app: &App, args: &GrepArgs) -> Result<()> {
    let pattern = RegexBuilder::new(&args.pattern)
        .case_insensitive(args.ignore_case)
        .build()
        .with_context(|| format!("invalid pattern {:?}", args.pattern))?;
    let mut issues = app.project().issues_matching(&pattern);
    issues.sort_by_key(|issue| issue.sort_key());
    let mut out = io::stdout().lock();
    output::write_issue_lines(&mut out, issues, &OutputConfig::from_env())?;
    out.flush()?;
    Ok(())
}

/// Execute the validate command
pub fn execute_validate(app: &App) -> Result<()> {
    let project = app.project();
    project.check()?;
    let message = format!(
        "Project {} is valid: {} issue(s), {} release(s), {} component(s)",
        project.name(),
        project.issues().len(),
        project.releases().len(),
        project.components().len()
    );
    println!("{}", output::success(&message, &OutputConfig::from_env()));
    Ok(())
}
