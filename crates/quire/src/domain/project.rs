//! The project: root of the entity graph.

use super::component::name_prefix;
use super::{Component, Issue, IssueContext, IssueDirectory, IssueType, Release};
use crate::error::{Error, Result, ValidationError};
use quire_record::{
    ChangeLog, DecodeWarning, FieldSlot, FieldSpec, FieldValues, LogEvent, Node, Prompter, Record,
    RecordState, Schema, Slot,
};
use regex::Regex;
use serde_yaml::Value;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, LazyLock};
use tracing::{debug, info};

/// A tracked project. Components and releases live in the project file;
/// issues live in files of their own and are attached after loading.
#[derive(Debug, Default)]
pub struct Project {
    state: RecordState,
    name: Slot<String>,
    version: Slot<String>,
    components: Slot<Vec<Component>>,
    releases: Slot<Vec<Release>>,

    issues: Vec<Issue>,
    added_issues: Vec<String>,
    deleted_issues: Vec<Issue>,
}

/// How many issues of one type a release holds, and how many of them are closed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TypeCount {
    /// Closed issues.
    pub closed: usize,
    /// All issues.
    pub total: usize,
}

static SCHEMA: LazyLock<Schema<Project>> = LazyLock::new(|| {
    Schema::build([
        FieldSpec::new("name")
            .prompt("Project name")
            .default_generator(|_, _| Ok(working_dir_name().map_or(Value::Null, Value::from))),
        FieldSpec::new("version")
            .ask(false)
            .default(env!("CARGO_PKG_VERSION")),
        FieldSpec::new("components")
            .multi()
            .ask(false)
            .interactive_generator(ask_components),
        FieldSpec::new("releases").multi().ask(false),
    ])
    .expect("project schema declares unique fields")
});

fn working_dir_name() -> Option<String> {
    let dir = std::env::current_dir().ok()?;
    Some(dir.file_name()?.to_string_lossy().into_owned())
}

/// Ask for component names. With none given, the project gets a single
/// component named after itself.
fn ask_components(
    project: &Project,
    _: &(),
    prompter: &mut dyn Prompter,
) -> quire_record::Result<Value> {
    let mut names = prompter.ask_for_many("Component name (blank line when done)")?;
    if names.is_empty() {
        names.push(project.name().to_string());
    }
    let mut seen = HashSet::new();
    names.retain(|name| seen.insert(name.clone()));

    let components = names
        .iter()
        .map(|name| {
            quire_record::construct::<Component>(&FieldValues::new().with("name", name.as_str()), &())
        })
        .collect::<quire_record::Result<Vec<_>>>()?;
    Ok(serde_yaml::to_value(&components)?)
}

fn first_duplicate<'a>(names: impl IntoIterator<Item = &'a str>) -> Option<String> {
    let mut seen = HashSet::new();
    names
        .into_iter()
        .find(|name| !seen.insert(*name))
        .map(str::to_string)
}

impl Project {
    /// A project with no components, releases or issues.
    ///
    /// # Errors
    ///
    /// Returns an error if construction fails.
    pub fn new(name: &str) -> Result<Self> {
        Ok(quire_record::construct(
            &FieldValues::new().with("name", name),
            &(),
        )?)
    }

    /// Build a project by asking the operator for its name and components.
    ///
    /// # Errors
    ///
    /// Returns a prompt error or a validation error, e.g. for a repeated
    /// component name.
    pub fn create_interactively(prompter: &mut dyn Prompter, overrides: &FieldValues) -> Result<Self> {
        Ok(quire_record::construct_interactively(
            prompter, &(), overrides, None,
        )?)
    }

    /// The project's name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.get().map_or("", String::as_str)
    }

    /// Version of quire that created the project.
    #[must_use]
    pub fn version(&self) -> &str {
        self.version.get().map_or("", String::as_str)
    }

    /// Components, in the order they were added.
    #[must_use]
    pub fn components(&self) -> &[Component] {
        self.components.get().map_or(&[], Vec::as_slice)
    }

    /// Releases, in the order they were added.
    #[must_use]
    pub fn releases(&self) -> &[Release] {
        self.releases.get().map_or(&[], Vec::as_slice)
    }

    /// All live issues.
    #[must_use]
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub(crate) fn issues_mut(&mut self) -> &mut [Issue] {
        &mut self.issues
    }

    /// Issues dropped since the last save, whose files are still to be removed.
    #[must_use]
    pub fn deleted_issues(&self) -> &[Issue] {
        &self.deleted_issues
    }

    /// Ids of issues added since the last save.
    #[must_use]
    pub fn added_issue_ids(&self) -> &[String] {
        &self.added_issues
    }

    /// The component called `name`.
    #[must_use]
    pub fn component_for(&self, name: &str) -> Option<&Component> {
        self.components.find_named(name)
    }

    /// The release called `name`.
    #[must_use]
    pub fn release_for(&self, name: &str) -> Option<&Release> {
        self.releases.find_named(name)
    }

    /// Releases still open for assignment.
    #[must_use]
    pub fn unreleased_releases(&self) -> Vec<&Release> {
        self.releases().iter().filter(|r| !r.is_released()).collect()
    }

    /// What issue construction needs from this project, acting as `user`.
    #[must_use]
    pub fn issue_context(&self, user: &str) -> IssueContext {
        IssueContext {
            components: self.components().iter().map(|c| c.name().to_string()).collect(),
            releases: self
                .unreleased_releases()
                .iter()
                .map(|r| r.name().to_string())
                .collect(),
            user: user.to_string(),
        }
    }

    // ========== Lookup ==========

    fn matching_indices(&self, ident: &str) -> Vec<usize> {
        if ident.is_empty() {
            return Vec::new();
        }
        if let Some(index) = self.issues.iter().position(|i| i.name() == ident) {
            return vec![index];
        }
        self.issues
            .iter()
            .enumerate()
            .filter(|(_, i)| i.id().starts_with(ident))
            .map(|(index, _)| index)
            .collect()
    }

    /// Issues matching `ident`: the one whose display name it is, else every
    /// issue whose id starts with it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when nothing matches.
    pub fn issues_for(&self, ident: &str) -> Result<Vec<&Issue>> {
        let matches: Vec<&Issue> = self
            .matching_indices(ident)
            .into_iter()
            .map(|index| &self.issues[index])
            .collect();
        if matches.is_empty() {
            return Err(Error::not_found("issue", ident));
        }
        Ok(matches)
    }

    fn issue_index(&self, ident: &str) -> Result<usize> {
        match self.matching_indices(ident).as_slice() {
            [] => Err(Error::not_found("issue", ident)),
            [index] => Ok(*index),
            many => Err(Error::Ambiguous {
                kind: "issue",
                ident: ident.to_string(),
                candidates: many.iter().map(|&i| self.issues[i].name().to_string()).collect(),
            }),
        }
    }

    /// The single issue matching `ident`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] or [`Error::Ambiguous`].
    pub fn issue_for(&self, ident: &str) -> Result<&Issue> {
        Ok(&self.issues[self.issue_index(ident)?])
    }

    /// Mutable form of [`Project::issue_for`], for status changes and edits.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] or [`Error::Ambiguous`].
    pub fn issue_for_mut(&mut self, ident: &str) -> Result<&mut Issue> {
        let index = self.issue_index(ident)?;
        Ok(&mut self.issues[index])
    }

    /// Issues assigned to `release`; `None` selects unassigned issues.
    #[must_use]
    pub fn issues_for_release(&self, release: Option<&str>) -> Vec<&Issue> {
        self.issues.iter().filter(|i| i.release() == release).collect()
    }

    /// Issues belonging to `component`.
    #[must_use]
    pub fn issues_for_component(&self, component: &str) -> Vec<&Issue> {
        self.issues
            .iter()
            .filter(|i| i.component() == component)
            .collect()
    }

    /// Issues with no release.
    #[must_use]
    pub fn unassigned_issues(&self) -> Vec<&Issue> {
        self.issues_for_release(None)
    }

    /// Split `issues` by type, bugfixes first, then features, then tasks.
    /// Empty groups are left out.
    pub fn group_issues<'a>(
        issues: impl IntoIterator<Item = &'a Issue>,
    ) -> Vec<(IssueType, Vec<&'a Issue>)> {
        let issues: Vec<&Issue> = issues.into_iter().collect();
        IssueType::ALL
            .into_iter()
            .map(|kind| {
                let group: Vec<&Issue> = issues.iter().copied().filter(|i| i.kind() == kind).collect();
                (kind, group)
            })
            .filter(|(_, group)| !group.is_empty())
            .collect()
    }

    // ========== Reports ==========

    /// Events from every issue's log, newest first, each with its issue.
    /// Events logged at the same instant keep issue order, then log order.
    #[must_use]
    pub fn recent_events(&self, limit: Option<usize>) -> Vec<(&LogEvent, &Issue)> {
        let mut events: Vec<(&LogEvent, &Issue)> = self
            .issues
            .iter()
            .flat_map(|issue| issue.log_events().iter().map(move |event| (event, issue)))
            .collect();
        events.sort_by(|a, b| b.0.time.cmp(&a.0.time));
        if let Some(limit) = limit {
            events.truncate(limit);
        }
        events
    }

    /// Closed issues of `release`, grouped by type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown release.
    pub fn changelog_for(&self, release: &str) -> Result<Vec<(IssueType, Vec<&Issue>)>> {
        if self.release_for(release).is_none() {
            return Err(Error::not_found("release", release));
        }
        let mut groups = Self::group_issues(
            self.issues
                .iter()
                .filter(|i| i.release() == Some(release) && i.is_closed()),
        );
        for (_, group) in &mut groups {
            group.sort_by_key(|issue| issue.creation_time());
        }
        Ok(groups)
    }

    /// Issues whose title, description or any logged comment matches `pattern`.
    #[must_use]
    pub fn issues_matching(&self, pattern: &Regex) -> Vec<&Issue> {
        self.issues
            .iter()
            .filter(|issue| {
                pattern.is_match(issue.title())
                    || pattern.is_match(issue.desc())
                    || issue
                        .log_events()
                        .iter()
                        .any(|event| pattern.is_match(&event.comment))
            })
            .collect()
    }

    /// Closed and total counts per type for the issues of `release`, or of
    /// unassigned issues for `None`. Every type appears, in grouping order.
    #[must_use]
    pub fn type_counts(&self, release: Option<&str>) -> Vec<(IssueType, TypeCount)> {
        let issues = self.issues_for_release(release);
        IssueType::ALL
            .into_iter()
            .map(|kind| {
                let count = issues
                    .iter()
                    .filter(|i| i.kind() == kind)
                    .fold(TypeCount::default(), |count, issue| TypeCount {
                        closed: count.closed + usize::from(issue.is_closed()),
                        total: count.total + 1,
                    });
                (kind, count)
            })
            .collect()
    }

    /// Issues of `release` (unassigned for `None`) still to be done, sorted
    /// by status then age. `include_closed` keeps closed issues too.
    #[must_use]
    pub fn todo_for(&self, release: Option<&str>, include_closed: bool) -> Vec<&Issue> {
        let mut issues: Vec<&Issue> = self
            .issues_for_release(release)
            .into_iter()
            .filter(|issue| include_closed || issue.is_open())
            .collect();
        issues.sort_by_key(|issue| issue.sort_key());
        issues
    }

    /// Check the whole graph: unique component and release names, and every
    /// issue pointing at a component and release that exist.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found.
    pub fn check(&self) -> Result<()> {
        self.validate()?;
        for issue in &self.issues {
            if self.component_for(issue.component()).is_none() {
                return Err(ValidationError::Invalid(format!(
                    "issue {} belongs to unknown component {:?}",
                    issue.name(),
                    issue.component()
                ))
                .into());
            }
            if let Some(release) = issue.release()
                && self.release_for(release).is_none()
            {
                return Err(ValidationError::Invalid(format!(
                    "issue {} is assigned to unknown release {release:?}",
                    issue.name()
                ))
                .into());
            }
        }
        Ok(())
    }

    // ========== Issues ==========

    /// Attach issues read from their own files. They are not treated as added.
    ///
    /// # Errors
    ///
    /// Returns an error if an interpolated field cannot be materialized.
    pub fn attach_issues(&mut self, issues: Vec<Issue>) -> Result<()> {
        self.issues.extend(issues);
        self.assign_issue_names()
    }

    /// Add a new issue and renumber. Returns the issue under its new name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if its component or release does not exist.
    pub fn add_issue(&mut self, issue: Issue) -> Result<&Issue> {
        if self.component_for(issue.component()).is_none() {
            return Err(Error::not_found("component", issue.component()));
        }
        if let Some(release) = issue.release()
            && self.release_for(release).is_none()
        {
            return Err(Error::not_found("release", release));
        }
        if self.issues.iter().any(|i| i.id() == issue.id()) {
            return Err(ValidationError::DuplicateName {
                item: "issue".to_string(),
                name: issue.id().to_string(),
            }
            .into());
        }
        let id = issue.id().to_string();
        self.issues.push(issue);
        self.added_issues.push(id.clone());
        self.assign_issue_names()?;
        let issue = self
            .issues
            .iter()
            .find(|i| i.id() == id)
            .ok_or_else(|| Error::not_found("issue", id.as_str()))?;
        info!(issue = issue.name(), "added issue");
        Ok(issue)
    }

    /// Drop an issue and renumber. Its file is removed on the next save.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] or [`Error::Ambiguous`].
    pub fn drop_issue(&mut self, ident: &str) -> Result<&Issue> {
        let index = self.issue_index(ident)?;
        let issue = self.issues.remove(index);
        self.added_issues.retain(|id| id != issue.id());
        self.deleted_issues.push(issue);
        self.assign_issue_names()?;
        let dropped = self
            .deleted_issues
            .last()
            .ok_or_else(|| Error::not_found("issue", ident))?;
        info!(issue = dropped.name(), "dropped issue");
        Ok(dropped)
    }

    // ========== Releases and components ==========

    /// # Errors
    ///
    /// Returns [`ValidationError::DuplicateName`] if the name is taken.
    pub fn add_release(&mut self, release: Release) -> Result<()> {
        if self.release_for(release.name()).is_some() {
            return Err(ValidationError::DuplicateName {
                item: "release".to_string(),
                name: release.name().to_string(),
            }
            .into());
        }
        self.releases.add_named(release)?;
        self.mark_dirty();
        Ok(())
    }

    /// Remove a release no issue is assigned to.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] or [`ValidationError::InUse`].
    pub fn drop_release(&mut self, name: &str) -> Result<Release> {
        if self.release_for(name).is_none() {
            return Err(Error::not_found("release", name));
        }
        let count = self.issues_for_release(Some(name)).len();
        if count > 0 {
            return Err(ValidationError::InUse {
                kind: "release",
                name: name.to_string(),
                count,
            }
            .into());
        }
        let release = self
            .releases
            .remove_named(name)?
            .ok_or_else(|| Error::not_found("release", name))?;
        self.mark_dirty();
        Ok(release)
    }

    /// Add a component and renumber.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::DuplicateName`] if the name is taken.
    pub fn add_component(&mut self, component: Component) -> Result<()> {
        if self.component_for(component.name()).is_some() {
            return Err(ValidationError::DuplicateName {
                item: "component".to_string(),
                name: component.name().to_string(),
            }
            .into());
        }
        self.components.add_named(component)?;
        self.mark_dirty();
        self.assign_issue_names()
    }

    /// Remove a component no issue belongs to, and renumber.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] or [`ValidationError::InUse`].
    pub fn drop_component(&mut self, name: &str) -> Result<Component> {
        if self.component_for(name).is_none() {
            return Err(Error::not_found("component", name));
        }
        let count = self.issues_for_component(name).len();
        if count > 0 {
            return Err(ValidationError::InUse {
                kind: "component",
                name: name.to_string(),
                count,
            }
            .into());
        }
        let component = self
            .components
            .remove_named(name)?
            .ok_or_else(|| Error::not_found("component", name))?;
        self.mark_dirty();
        self.assign_issue_names()?;
        Ok(component)
    }

    /// Release `name`, which must have no open issues.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`], [`ValidationError::OpenIssues`] or
    /// [`ValidationError::AlreadyReleased`].
    pub fn release(&mut self, name: &str, who: &str, comment: Option<&str>) -> Result<()> {
        if self.release_for(name).is_none() {
            return Err(Error::not_found("release", name));
        }
        if let Some(open) = self
            .issues
            .iter()
            .find(|i| i.release() == Some(name) && i.is_open())
        {
            return Err(ValidationError::OpenIssues {
                release: name.to_string(),
                issue: open.name().to_string(),
            }
            .into());
        }
        if self.release_for(name).is_some_and(Release::is_released) {
            return Err(ValidationError::AlreadyReleased(name.to_string()).into());
        }
        let release = self
            .releases
            .make_mut()?
            .iter_mut()
            .find(|r| r.name() == name)
            .ok_or_else(|| Error::not_found("release", name))?;
        release.release(who, comment)?;
        info!(release = name, "released");
        Ok(())
    }

    // ========== Reassignment ==========

    /// Assign an issue to an unreleased release.
    ///
    /// # Errors
    ///
    /// Returns a lookup error, [`ValidationError::AlreadyReleased`], or
    /// [`ValidationError::AlreadyAssigned`].
    pub fn assign_to_release(
        &mut self,
        ident: &str,
        release: &str,
        who: &str,
        comment: Option<&str>,
    ) -> Result<()> {
        match self.release_for(release) {
            None => return Err(Error::not_found("release", release)),
            Some(r) if r.is_released() => {
                return Err(ValidationError::AlreadyReleased(release.to_string()).into());
            }
            Some(_) => {}
        }
        let index = self.issue_index(ident)?;
        self.issues[index].assign_to_release(release, who, comment)
    }

    /// Move an issue to another component and renumber.
    ///
    /// # Errors
    ///
    /// Returns a lookup error or [`ValidationError::AlreadyAssigned`].
    pub fn assign_to_component(
        &mut self,
        ident: &str,
        component: &str,
        who: &str,
        comment: Option<&str>,
    ) -> Result<()> {
        if self.component_for(component).is_none() {
            return Err(Error::not_found("component", component));
        }
        let index = self.issue_index(ident)?;
        self.issues[index].assign_to_component(component, who, comment)?;
        self.assign_issue_names()
    }

    /// Remove an issue from its release.
    ///
    /// # Errors
    ///
    /// Returns a lookup error or [`ValidationError::NotAssigned`].
    pub fn unassign(&mut self, ident: &str, who: &str, comment: Option<&str>) -> Result<()> {
        let index = self.issue_index(ident)?;
        self.issues[index].unassign(who, comment)
    }

    // ========== Naming ==========

    /// Recompute every display name.
    ///
    /// Issues are ordered by creation time (then id) and numbered from 1
    /// within each component prefix, e.g. `core-1`, `core-2`, `web-ui-1`.
    /// Every issue then gets the new id/name table so mentions of other
    /// issues resolve to the new names.
    ///
    /// # Errors
    ///
    /// Returns an error if an interpolated field cannot be materialized.
    pub fn assign_issue_names(&mut self) -> Result<()> {
        let mut order: Vec<usize> = (0..self.issues.len()).collect();
        order.sort_by(|&a, &b| {
            let (a, b) = (&self.issues[a], &self.issues[b]);
            a.creation_time()
                .cmp(&b.creation_time())
                .then_with(|| a.id().cmp(b.id()))
        });

        let mut counters: HashMap<String, usize> = HashMap::new();
        let mut names = vec![String::new(); self.issues.len()];
        for index in order {
            let component = self.issues[index].component();
            let prefix = self
                .component_for(component)
                .map_or_else(|| name_prefix(component), Component::name_prefix);
            let counter = counters.entry(prefix.clone()).or_default();
            *counter += 1;
            names[index] = format!("{prefix}-{counter}");
        }

        for (issue, name) in self.issues.iter_mut().zip(names) {
            issue.set_name(name);
        }
        let directory = Arc::new(IssueDirectory::new(
            self.issues
                .iter()
                .map(|i| (i.id().to_string(), i.name().to_string())),
        ));
        for issue in &mut self.issues {
            issue.attach_directory(Arc::clone(&directory))?;
        }
        debug!(issues = self.issues.len(), "assigned issue names");
        Ok(())
    }

    // ========== Saving ==========

    /// Clear every dirty flag and the added/deleted lists. Called by the
    /// store once everything has been written.
    pub fn mark_saved(&mut self) {
        self.mark_clean();
        if let Some(components) = self.components.peek_mut() {
            components.iter_mut().for_each(Record::mark_clean);
        }
        if let Some(releases) = self.releases.peek_mut() {
            releases.iter_mut().for_each(Record::mark_clean);
        }
        self.issues.iter_mut().for_each(Record::mark_clean);
        self.added_issues.clear();
        self.deleted_issues.clear();
    }
}

impl Node for Project {
    fn record_type(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn is_dirty(&self) -> bool {
        self.state.is_dirty()
    }

    fn children(&self) -> Vec<&dyn Node> {
        let mut children: Vec<&dyn Node> = Vec::new();
        children.extend(self.releases().iter().map(|r| r as &dyn Node));
        children.extend(self.components().iter().map(|c| c as &dyn Node));
        children.extend(self.issues.iter().map(|i| i as &dyn Node));
        children
    }
}

impl Record for Project {
    type Context = ();
    const TYPE_NAME: &'static str = "Project";

    fn schema() -> &'static Schema<Self> {
        &SCHEMA
    }

    fn state(&self) -> &RecordState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut RecordState {
        &mut self.state
    }

    fn slot(&self, field: &str) -> Option<&dyn FieldSlot> {
        Some(match field {
            "name" => &self.name,
            "version" => &self.version,
            "components" => &self.components,
            "releases" => &self.releases,
            _ => return None,
        })
    }

    fn slot_mut(&mut self, field: &str) -> Option<&mut dyn FieldSlot> {
        Some(match field {
            "name" => &mut self.name,
            "version" => &mut self.version,
            "components" => &mut self.components,
            "releases" => &mut self.releases,
            _ => return None,
        })
    }

    fn take_nested_warnings(&mut self) -> Vec<DecodeWarning> {
        let mut warnings = Vec::new();
        if let Some(components) = self.components.peek_mut() {
            for component in components {
                warnings.extend(component.state_mut().take_decode_warnings());
            }
        }
        if let Some(releases) = self.releases.peek_mut() {
            for release in releases {
                warnings.extend(release.state_mut().take_decode_warnings());
            }
        }
        warnings
    }

    fn validate(&self) -> quire_record::Result<()> {
        if let Some(name) = first_duplicate(self.components().iter().map(Component::name)) {
            return Err(quire_record::Error::DuplicateName {
                item: "component".to_string(),
                name,
            });
        }
        if let Some(name) = first_duplicate(self.releases().iter().map(Release::name)) {
            return Err(quire_record::Error::DuplicateName {
                item: "release".to_string(),
                name,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Disposition, ReleaseStatus};
    use quire_record::ScriptedPrompter;

    const WHO: &str = "Ann <ann@example.com>";

    fn project() -> Project {
        let mut project = Project::new("demo").unwrap();
        project.add_component(Component::new("core").unwrap()).unwrap();
        project
    }

    fn values(title: &str, id: &str, created: &str) -> FieldValues {
        FieldValues::new()
            .with("title", title)
            .with("desc", "")
            .with("type", "task")
            .with("component", "core")
            .with("id", id)
            .with("creation_time", created)
    }

    fn add(project: &mut Project, title: &str, id: &str, created: &str) -> String {
        let issue = Issue::create(&values(title, id, created), &project.issue_context(WHO), None)
            .unwrap();
        project.add_issue(issue).unwrap().name().to_string()
    }

    fn names(project: &Project) -> Vec<(String, String)> {
        project
            .issues()
            .iter()
            .map(|i| (i.id().to_string(), i.name().to_string()))
            .collect()
    }

    // ==========================================================================
    // Construction and collections
    // ==========================================================================

    #[test]
    fn new_project_defaults() {
        let project = Project::new("demo").unwrap();
        assert_eq!(project.name(), "demo");
        assert_eq!(project.version(), env!("CARGO_PKG_VERSION"));
        assert!(project.components().is_empty());
        assert!(project.releases().is_empty());
        assert!(project.is_dirty());
    }

    #[test]
    fn interactive_project_defaults_to_one_component() {
        let mut prompter = ScriptedPrompter::new(["demo", ""]);
        let project = Project::create_interactively(&mut prompter, &FieldValues::new()).unwrap();
        let names: Vec<_> = project.components().iter().map(Component::name).collect();
        assert_eq!(names, vec!["demo"]);
    }

    #[test]
    fn duplicate_component_is_rejected_and_graph_unchanged() {
        let mut project = project();
        let err = project
            .add_component(Component::new("core").unwrap())
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::DuplicateName { .. })
        ));
        assert_eq!(project.components().len(), 1);
    }

    #[test]
    fn duplicate_release_is_rejected() {
        let mut project = project();
        project.add_release(Release::new("v1", WHO, None).unwrap()).unwrap();
        assert!(project.add_release(Release::new("v1", WHO, None).unwrap()).is_err());
        assert_eq!(project.releases().len(), 1);
    }

    #[test]
    fn add_issue_requires_known_component() {
        let mut project = project();
        let context = IssueContext {
            components: vec!["ui".to_string()],
            ..project.issue_context(WHO)
        };
        let issue = Issue::create(
            &values("t", "ab12", "2024-01-01T00:00:00Z").with("component", "ui"),
            &context,
            None,
        )
        .unwrap();
        assert!(matches!(
            project.add_issue(issue),
            Err(Error::NotFound { kind: "component", .. })
        ));
        assert!(project.issues().is_empty());
    }

    #[test]
    fn in_use_release_and_component_cannot_be_dropped() {
        let mut project = project();
        project.add_release(Release::new("v1", WHO, None).unwrap()).unwrap();
        let name = add(&mut project, "a", "aaaa", "2024-01-01T00:00:00Z");
        project.assign_to_release(&name, "v1", WHO, None).unwrap();

        assert!(matches!(
            project.drop_release("v1"),
            Err(Error::Validation(ValidationError::InUse { kind: "release", count: 1, .. }))
        ));
        assert!(matches!(
            project.drop_component("core"),
            Err(Error::Validation(ValidationError::InUse { kind: "component", .. }))
        ));

        project.unassign(&name, WHO, None).unwrap();
        assert_eq!(project.drop_release("v1").unwrap().name(), "v1");
        assert!(project.releases().is_empty());
    }

    // ==========================================================================
    // Naming and lookup
    // ==========================================================================

    #[test]
    fn issues_are_numbered_by_creation_time_within_component() {
        let mut project = project();
        project.add_component(Component::new("Web UI").unwrap()).unwrap();
        add(&mut project, "late", "cccc", "2024-03-01T00:00:00Z");
        add(&mut project, "early", "aaaa", "2024-01-01T00:00:00Z");
        let ui = Issue::create(
            &values("ui", "bbbb", "2024-02-01T00:00:00Z").with("component", "Web UI"),
            &project.issue_context(WHO),
            None,
        )
        .unwrap();
        project.add_issue(ui).unwrap();

        assert_eq!(project.issue_for("aaaa").unwrap().name(), "core-1");
        assert_eq!(project.issue_for("cccc").unwrap().name(), "core-2");
        assert_eq!(project.issue_for("bbbb").unwrap().name(), "web-ui-1");

        let before = names(&project);
        project.assign_issue_names().unwrap();
        assert_eq!(names(&project), before);
    }

    #[test]
    fn dropping_an_issue_renumbers_the_rest() {
        let mut project = project();
        add(&mut project, "a", "aaaa", "2024-01-01T00:00:00Z");
        add(&mut project, "b", "bbbb", "2024-01-02T00:00:00Z");
        let dropped = project.drop_issue("core-1").unwrap();
        assert_eq!(dropped.id(), "aaaa");
        assert_eq!(project.issue_for("bbbb").unwrap().name(), "core-1");
        assert_eq!(project.deleted_issues().len(), 1);
        assert_eq!(project.added_issue_ids(), ["bbbb".to_string()]);
    }

    #[test]
    fn prefix_lookup_can_be_ambiguous() {
        let mut project = project();
        add(&mut project, "a", "abcdef01", "2024-01-01T00:00:00Z");
        add(&mut project, "b", "abcffff2", "2024-01-02T00:00:00Z");

        assert_eq!(project.issues_for("abc").unwrap().len(), 2);
        assert!(matches!(
            project.issue_for("abc"),
            Err(Error::Ambiguous { ref candidates, .. }) if candidates.len() == 2
        ));
        assert_eq!(project.issue_for("abcd").unwrap().id(), "abcdef01");
        assert!(matches!(
            project.issues_for("zzz"),
            Err(Error::NotFound { kind: "issue", .. })
        ));
    }

    #[test]
    fn exact_name_wins_over_id_prefix() {
        let mut project = Project::new("demo").unwrap();
        project.add_component(Component::new("abc").unwrap()).unwrap();
        let context = project.issue_context(WHO);
        for (id, created) in [
            ("abc-1aaaa", "2024-01-01T00:00:00Z"),
            ("abc-1bbbb", "2024-01-02T00:00:00Z"),
        ] {
            let issue = Issue::create(
                &values("t", id, created).with("component", "abc"),
                &context,
                None,
            )
            .unwrap();
            project.add_issue(issue).unwrap();
        }
        let found = project.issues_for("abc-1").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id(), "abc-1aaaa");
    }

    #[test]
    fn mentions_follow_renumbering() {
        let mut project = project();
        let first = add(&mut project, "a", "bbbb", "2024-01-02T00:00:00Z");
        assert_eq!(first, "core-1");
        let second = Issue::create(
            &values("b", "cccc", "2024-01-03T00:00:00Z").with("desc", "blocked on core-1"),
            &project.issue_context(WHO),
            None,
        )
        .unwrap();
        project.add_issue(second).unwrap();
        let text = quire_record::encode(project.issue_for_mut("cccc").unwrap()).unwrap();
        assert!(text.contains("blocked on {issue bbbb}"));

        // An older issue pushes "bbbb" to core-2.
        add(&mut project, "z", "aaaa", "2024-01-01T00:00:00Z");
        assert_eq!(project.issue_for("bbbb").unwrap().name(), "core-2");
        assert_eq!(project.issue_for("cccc").unwrap().desc(), "blocked on core-2");
    }

    #[test]
    fn unsaved_mentions_follow_renumbering() {
        let mut project = project();
        add(&mut project, "a", "bbbb", "2024-01-02T00:00:00Z");
        let name = add(&mut project, "b", "cccc", "2024-01-03T00:00:00Z");
        project
            .issue_for_mut(&name)
            .unwrap()
            .comment(WHO, "duplicate of core-1")
            .unwrap();

        add(&mut project, "z", "aaaa", "2024-01-01T00:00:00Z");
        let issue = project.issue_for("cccc").unwrap();
        assert_eq!(issue.log_events().last().unwrap().comment, "duplicate of core-2");
    }

    // ==========================================================================
    // Releases and grouping
    // ==========================================================================

    #[test]
    fn release_refuses_open_issues() {
        let mut project = project();
        project.add_release(Release::new("v1", WHO, None).unwrap()).unwrap();
        let name = add(&mut project, "a", "aaaa", "2024-01-01T00:00:00Z");
        project.assign_to_release(&name, "v1", WHO, None).unwrap();

        let err = project.release("v1", WHO, None).unwrap_err();
        assert!(matches!(err, Error::Validation(ValidationError::OpenIssues { .. })));
        assert_eq!(project.release_for("v1").unwrap().status(), ReleaseStatus::Unreleased);

        project
            .issue_for_mut(&name)
            .unwrap()
            .close(Disposition::Fixed, WHO, None)
            .unwrap();
        project.release("v1", WHO, None).unwrap();
        assert!(project.release_for("v1").unwrap().is_released());
        assert!(project.unreleased_releases().is_empty());
        assert!(matches!(
            project.release("v1", WHO, None),
            Err(Error::Validation(ValidationError::AlreadyReleased(_)))
        ));
        assert!(project.assign_to_release(&name, "v1", WHO, None).is_err());
    }

    #[test]
    fn group_issues_orders_by_type() {
        let mut project = project();
        let context = project.issue_context(WHO);
        for (id, kind) in [("aaaa", "task"), ("bbbb", "bugfix"), ("cccc", "task")] {
            let issue = Issue::create(
                &values("t", id, "2024-01-01T00:00:00Z").with("type", kind),
                &context,
                None,
            )
            .unwrap();
            project.add_issue(issue).unwrap();
        }
        let groups = Project::group_issues(project.issues());
        let summary: Vec<_> = groups.iter().map(|(kind, g)| (*kind, g.len())).collect();
        assert_eq!(summary, vec![(IssueType::Bugfix, 1), (IssueType::Task, 2)]);
        assert_eq!(project.unassigned_issues().len(), 3);
        assert_eq!(project.issues_for_component("core").len(), 3);
    }

    // ==========================================================================
    // Reports
    // ==========================================================================

    fn typed(project: &mut Project, title: &str, id: &str, kind: &str) -> String {
        let issue = Issue::create(
            &values(title, id, "2024-01-01T00:00:00Z").with("type", kind),
            &project.issue_context(WHO),
            None,
        )
        .unwrap();
        project.add_issue(issue).unwrap().name().to_string()
    }

    fn close(project: &mut Project, name: &str) {
        project
            .issue_for_mut(name)
            .unwrap()
            .close(Disposition::Fixed, WHO, None)
            .unwrap();
    }

    #[test]
    fn recent_events_are_newest_first_and_limited() {
        let mut project = project();
        let first = add(&mut project, "a", "aaaa", "2024-01-01T00:00:00Z");
        add(&mut project, "b", "bbbb", "2024-01-02T00:00:00Z");
        project
            .issue_for_mut(&first)
            .unwrap()
            .comment(WHO, "still broken")
            .unwrap();

        let events = project.recent_events(None);
        assert_eq!(events.len(), 3);
        assert!(events.windows(2).all(|pair| pair[0].0.time >= pair[1].0.time));
        let commented = events
            .iter()
            .find(|(event, _)| event.comment == "still broken")
            .unwrap();
        assert_eq!(commented.1.id(), "aaaa");

        assert_eq!(project.recent_events(Some(2)).len(), 2);
        assert!(Project::new("empty").unwrap().recent_events(Some(5)).is_empty());
    }

    #[test]
    fn changelog_lists_closed_issues_by_type() {
        let mut project = project();
        project.add_release(Release::new("v1", WHO, None).unwrap()).unwrap();
        let fix = typed(&mut project, "Crash", "aaaa", "bugfix");
        let feature = typed(&mut project, "Export", "bbbb", "feature");
        let open = typed(&mut project, "Docs", "cccc", "task");
        for name in [&fix, &feature, &open] {
            project.assign_to_release(name, "v1", WHO, None).unwrap();
        }
        close(&mut project, &fix);
        close(&mut project, &feature);

        let changelog = project.changelog_for("v1").unwrap();
        let summary: Vec<_> = changelog
            .iter()
            .map(|(kind, group)| (*kind, group.iter().map(|i| i.title()).collect::<Vec<_>>()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (IssueType::Bugfix, vec!["Crash"]),
                (IssueType::Feature, vec!["Export"]),
            ]
        );
        assert!(matches!(
            project.changelog_for("v9"),
            Err(Error::NotFound { kind: "release", .. })
        ));
    }

    #[test]
    fn issues_matching_searches_title_desc_and_comments() {
        let mut project = project();
        add(&mut project, "Parser panics", "aaaa", "2024-01-01T00:00:00Z");
        let issue = Issue::create(
            &values("Slow start", "bbbb", "2024-01-02T00:00:00Z").with("desc", "the PARSER is slow"),
            &project.issue_context(WHO),
            None,
        )
        .unwrap();
        project.add_issue(issue).unwrap();
        let third = add(&mut project, "Logo", "cccc", "2024-01-03T00:00:00Z");
        project
            .issue_for_mut(&third)
            .unwrap()
            .comment(WHO, "blocked by the parser rewrite")
            .unwrap();

        let ids = |pattern: &str| -> Vec<String> {
            project
                .issues_matching(&Regex::new(pattern).unwrap())
                .iter()
                .map(|i| i.id().to_string())
                .collect()
        };
        assert_eq!(ids("parser"), vec!["cccc"]);
        assert_eq!(ids("(?i)parser"), vec!["aaaa", "bbbb", "cccc"]);
        assert!(ids("^nothing$").is_empty());
    }

    #[test]
    fn type_counts_cover_every_type() {
        let mut project = project();
        project.add_release(Release::new("v1", WHO, None).unwrap()).unwrap();
        let fix = typed(&mut project, "Crash", "aaaa", "bugfix");
        let other = typed(&mut project, "Hang", "bbbb", "bugfix");
        typed(&mut project, "Loose", "cccc", "task");
        for name in [&fix, &other] {
            project.assign_to_release(name, "v1", WHO, None).unwrap();
        }
        close(&mut project, &fix);

        assert_eq!(
            project.type_counts(Some("v1")),
            vec![
                (IssueType::Bugfix, TypeCount { closed: 1, total: 2 }),
                (IssueType::Feature, TypeCount::default()),
                (IssueType::Task, TypeCount::default()),
            ]
        );
        assert_eq!(project.type_counts(None)[2].1, TypeCount { closed: 0, total: 1 });
    }

    #[test]
    fn todo_puts_active_work_first_and_skips_closed() {
        let mut project = project();
        add(&mut project, "old", "aaaa", "2024-01-01T00:00:00Z");
        let active = add(&mut project, "active", "bbbb", "2024-01-02T00:00:00Z");
        let done = add(&mut project, "done", "cccc", "2024-01-03T00:00:00Z");
        project
            .issue_for_mut(&active)
            .unwrap()
            .start_work(WHO, None)
            .unwrap();
        close(&mut project, &done);

        let titles = |issues: Vec<&Issue>| issues.iter().map(|i| i.title().to_string()).collect::<Vec<_>>();
        assert_eq!(titles(project.todo_for(None, false)), vec!["active", "old"]);
        assert_eq!(titles(project.todo_for(None, true)), vec!["active", "old", "done"]);
    }

    #[test]
    fn check_reports_dangling_references() {
        let mut project = project();
        let name = add(&mut project, "a", "aaaa", "2024-01-01T00:00:00Z");
        project.check().unwrap();

        let text = quire_record::encode(project.issue_for_mut(&name).unwrap())
            .unwrap()
            .replace("component: core", "component: gone");
        let stray = quire_record::decode::<Issue>(&text).unwrap().record;
        let mut other = Project::new("demo").unwrap();
        other.add_component(Component::new("core").unwrap()).unwrap();
        other.attach_issues(vec![stray]).unwrap();

        let err = other.check().unwrap_err();
        assert!(matches!(err, Error::Validation(ValidationError::Invalid(ref m)) if m.contains("gone")));
    }

    #[test]
    fn mark_saved_clears_nested_dirty_flags() {
        let mut project = project();
        project.add_release(Release::new("v1", WHO, None).unwrap()).unwrap();
        add(&mut project, "a", "aaaa", "2024-01-01T00:00:00Z");
        assert!(quire_record::walk(&project).any(|node| node.is_dirty()));

        project.mark_saved();
        assert!(!quire_record::walk(&project).any(|node| node.is_dirty()));
        assert!(project.added_issue_ids().is_empty());
    }

    #[test]
    fn decoded_project_with_duplicate_components_is_invalid() {
        let text = "!project\nname: demo\nversion: '0.1'\ncomponents:\n- !component\n  name: core\n- !component\n  name: core\nreleases: []\n";
        let err: Error = quire_record::decode::<Project>(text).unwrap_err().into();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::DuplicateName { ref item, .. }) if item == "component"
        ));
    }
}
