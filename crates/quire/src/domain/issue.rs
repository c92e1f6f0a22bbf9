//! Issues and their status transitions.

use super::{Disposition, IssueDirectory, IssueType, Status};
use crate::error::{Result, ValidationError};
use crate::id_generation::{IdSeed, generate_issue_id};
use quire_record::{
    AskOptions, ChangeLog, FieldSlot, FieldSpec, FieldValues, LOG_EVENTS, LogEvent, Node,
    Prompter, Record, RecordState, Schema, Slot, Timestamp,
};
use serde_yaml::Value;
use std::sync::{Arc, LazyLock};
use tracing::debug;

/// Fields whose text may mention other issues by display name.
const INTERPOLATED: [&str; 3] = ["title", "desc", LOG_EVENTS];

/// Position of the comment in an encoded log event.
const COMMENT_INDEX: usize = 3;

/// What issue construction needs to know about the project.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueContext {
    /// Names of the project's components, in project order.
    pub components: Vec<String>,
    /// Names of the releases an issue can still be assigned to.
    pub releases: Vec<String>,
    /// The acting user, `Name <email>`.
    pub user: String,
}

/// New values for the free-text fields of an issue. `None` leaves a field as it is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueEdit {
    /// New title.
    pub title: Option<String>,
    /// New description.
    pub desc: Option<String>,
    /// New reporter.
    pub reporter: Option<String>,
}

/// One unit of tracked work, stored in its own file.
///
/// The display name (`core-3`) is assigned by the owning project and changes
/// whenever issues are renumbered; the id never changes.
#[derive(Debug, Default)]
pub struct Issue {
    state: RecordState,
    title: Slot<String>,
    desc: Slot<String>,
    kind: Slot<IssueType>,
    component: Slot<String>,
    release: Slot<String>,
    reporter: Slot<String>,
    status: Slot<Status>,
    disposition: Slot<Disposition>,
    creation_time: Slot<Timestamp>,
    references: Slot<Vec<String>>,
    id: Slot<String>,
    log_events: Slot<Vec<LogEvent>>,

    name: String,
    directory: Option<Arc<IssueDirectory>>,
}

static SCHEMA: LazyLock<Schema<Issue>> = LazyLock::new(|| {
    Schema::build([
        FieldSpec::new("title"),
        FieldSpec::new("desc").prompt("Description").multiline(),
        FieldSpec::new("type").interactive_generator(ask_type),
        FieldSpec::new("component")
            .generator(sole_component)
            .interactive_generator(choose_component),
        FieldSpec::new("release")
            .nil_ok()
            .interactive_generator(choose_release),
        FieldSpec::new("reporter")
            .prompt("Issue creator")
            .default_generator(current_user),
        FieldSpec::new("status").ask(false).default("unstarted"),
        FieldSpec::new("disposition").ask(false),
        FieldSpec::new("creation_time")
            .ask(false)
            .generator(|_, _| Ok(serde_yaml::to_value(Timestamp::now())?)),
        FieldSpec::new("references").ask(false).multi(),
        FieldSpec::new("id").ask(false).generator(make_id),
        FieldSpec::log_events(),
    ])
    .expect("issue schema declares unique fields")
});

fn ask_type(
    _: &Issue,
    _: &IssueContext,
    prompter: &mut dyn Prompter,
) -> quire_record::Result<Value> {
    let answer = prompter.ask(
        "Is this a (b)ugfix, a (f)eature, or a (t)ask?",
        &AskOptions::new().restricted_to(["b", "f", "t"]),
    )?;
    let kind: IssueType = answer
        .parse()
        .map_err(|e: ValidationError| quire_record::Error::Prompt(e.to_string()))?;
    Ok(serde_yaml::to_value(kind)?)
}

fn current_user(_: &Issue, context: &IssueContext) -> quire_record::Result<Value> {
    Ok(Value::from(context.user.as_str()))
}

fn sole_component(_: &Issue, context: &IssueContext) -> quire_record::Result<Value> {
    match context.components.as_slice() {
        [only] => Ok(Value::from(only.as_str())),
        _ => Err(quire_record::Error::missing_field(Issue::TYPE_NAME, "component")),
    }
}

fn choose_component(
    _: &Issue,
    context: &IssueContext,
    prompter: &mut dyn Prompter,
) -> quire_record::Result<Value> {
    match context.components.as_slice() {
        [] => Err(quire_record::Error::Prompt(
            "the project has no components".to_string(),
        )),
        [only] => Ok(Value::from(only.as_str())),
        all => {
            let index = prompter.select_one("Choose a component", all)?;
            Ok(Value::from(all[index].as_str()))
        }
    }
}

fn choose_release(
    _: &Issue,
    context: &IssueContext,
    prompter: &mut dyn Prompter,
) -> quire_record::Result<Value> {
    if context.releases.is_empty() || !prompter.ask_yes_no("Assign to a release now?", Some(false))? {
        return Ok(Value::Null);
    }
    let index = match context.releases.as_slice() {
        [_] => 0,
        all => prompter.select_one("Choose a release", all)?,
    };
    Ok(Value::from(context.releases[index].as_str()))
}

fn make_id(issue: &Issue, _: &IssueContext) -> quire_record::Result<Value> {
    Ok(Value::from(generate_issue_id(&IdSeed {
        creation_time: issue.creation_time(),
        reporter: issue.reporter(),
        title: issue.title(),
        desc: issue.desc(),
    })))
}

/// Apply `rewrite` to the free text of an interpolated field's raw value.
fn rewrite_text(field: &str, value: Value, rewrite: impl Fn(&str) -> String) -> Value {
    match (field, value) {
        ("title" | "desc", Value::String(text)) => Value::String(rewrite(&text)),
        (LOG_EVENTS, Value::Sequence(events)) => Value::Sequence(
            events
                .into_iter()
                .map(|event| match event {
                    Value::Sequence(mut parts) => {
                        if let Some(Value::String(comment)) = parts.get_mut(COMMENT_INDEX) {
                            *comment = rewrite(comment);
                        }
                        Value::Sequence(parts)
                    }
                    other => other,
                })
                .collect(),
        ),
        (_, value) => value,
    }
}

impl Issue {
    /// Build an issue from supplied field values and log its creation.
    ///
    /// The reporter defaults to the context's user. The component may be
    /// omitted when the project has exactly one.
    ///
    /// # Errors
    ///
    /// Returns an error if a required field is missing or a value does not fit.
    pub fn create(
        values: &FieldValues,
        context: &IssueContext,
        comment: Option<&str>,
    ) -> Result<Self> {
        let mut values = values.clone();
        if values.get("reporter").is_none() {
            values.insert("reporter", Value::from(context.user.as_str()));
        }
        let mut issue: Self = quire_record::construct(&values, context)?;
        issue.log("created", &context.user, comment)?;
        debug!(id = issue.id(), "created issue");
        Ok(issue)
    }

    /// Build an issue by asking the operator, and log its creation.
    ///
    /// # Errors
    ///
    /// Returns a prompt error, or an error if an answer does not fit its field.
    pub fn create_interactively(
        prompter: &mut dyn Prompter,
        context: &IssueContext,
        overrides: &FieldValues,
        comment: Option<&str>,
    ) -> Result<Self> {
        let mut issue: Self =
            quire_record::construct_interactively(prompter, context, overrides, None)?;
        issue.log("created", &context.user, comment)?;
        Ok(issue)
    }

    /// One-line summary.
    #[must_use]
    pub fn title(&self) -> &str {
        self.title.get().map_or("", String::as_str)
    }

    /// Free-text description.
    #[must_use]
    pub fn desc(&self) -> &str {
        self.desc.get().map_or("", String::as_str)
    }

    /// Bugfix, feature or task.
    #[must_use]
    pub fn kind(&self) -> IssueType {
        self.kind.get().copied().unwrap_or(IssueType::Task)
    }

    /// Name of the component it belongs to.
    #[must_use]
    pub fn component(&self) -> &str {
        self.component.get().map_or("", String::as_str)
    }

    /// Name of the release it is assigned to, if any.
    #[must_use]
    pub fn release(&self) -> Option<&str> {
        self.release.get().map(String::as_str)
    }

    /// Who reported it.
    #[must_use]
    pub fn reporter(&self) -> &str {
        self.reporter.get().map_or("", String::as_str)
    }

    /// Where it is in its life.
    #[must_use]
    pub fn status(&self) -> Status {
        self.status.get().copied().unwrap_or_default()
    }

    /// How it was resolved; set exactly when it is closed.
    #[must_use]
    pub fn disposition(&self) -> Option<Disposition> {
        self.disposition.get().copied()
    }

    /// When it was created.
    #[must_use]
    pub fn creation_time(&self) -> Option<Timestamp> {
        self.creation_time.get().copied()
    }

    /// Free-text references (URLs, ticket numbers, ...).
    #[must_use]
    pub fn references(&self) -> &[String] {
        self.references.get().map_or(&[], Vec::as_slice)
    }

    /// The permanent id.
    #[must_use]
    pub fn id(&self) -> &str {
        self.id.get().map_or("", String::as_str)
    }

    /// The current display name, empty until the issue joins a project.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Display name if assigned, else the id.
    fn label(&self) -> &str {
        if self.name.is_empty() {
            self.id()
        } else {
            &self.name
        }
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    /// Anything but closed.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.status().is_open()
    }

    /// Closed with a disposition.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        !self.is_open()
    }

    /// Listing order: active work first, then by age.
    #[must_use]
    pub fn sort_key(&self) -> (u8, Option<Timestamp>) {
        (self.status().sort_order(), self.creation_time())
    }

    /// Point the issue at a new id/name table.
    ///
    /// Interpolated fields read from disk stay raw until the first table
    /// arrives; later tables re-derive them from their raw form so that
    /// mentions of renumbered issues show the new names. Text edited in
    /// memory is carried over from the old names to the new ones.
    pub(crate) fn attach_directory(&mut self, directory: Arc<IssueDirectory>) -> Result<()> {
        match self.directory.replace(Arc::clone(&directory)) {
            None => {
                // A raw form cached before any table existed holds names, not
                // placeholders; drop it so the next encode interpolates.
                let _ = self.title.get_mut();
                let _ = self.desc.get_mut();
                let _ = self.log_events.get_mut();
                self.materialize_pending()?;
            }
            Some(previous) => {
                self.carry_over_edited_text(&previous, &directory)?;
                self.resync(&INTERPOLATED)?;
            }
        }
        Ok(())
    }

    fn carry_over_edited_text(
        &mut self,
        previous: &IssueDirectory,
        current: &IssueDirectory,
    ) -> Result<()> {
        for field in INTERPOLATED {
            let Some(slot) = self.slot_mut(field) else {
                continue;
            };
            if slot.serialized().is_some() {
                continue;
            }
            let Some(value) = slot.memory_value().map_err(quire_record::Error::from)? else {
                continue;
            };
            let value = rewrite_text(field, value, |text| previous.interpolate(text));
            let value = rewrite_text(field, value, |text| current.resolve(text));
            slot.assign(value).map_err(quire_record::Error::from)?;
        }
        Ok(())
    }

    fn transition_error(&self, action: &'static str) -> ValidationError {
        ValidationError::InvalidTransition {
            issue: self.label().to_string(),
            action,
            status: self.status(),
        }
    }

    fn change_status(&mut self, to: Status, who: &str, comment: Option<&str>) -> Result<()> {
        let what = format!("changed status from {} to {}", self.status().as_str(), to.as_str());
        self.log(&what, who, comment)?;
        self.status.set(to);
        Ok(())
    }

    /// Unstarted or paused to in progress.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidTransition`] if it is already in
    /// progress or closed.
    pub fn start_work(&mut self, who: &str, comment: Option<&str>) -> Result<()> {
        match self.status() {
            Status::InProgress | Status::Closed => {
                Err(self.transition_error("start work on").into())
            }
            Status::Unstarted | Status::Paused => self.change_status(Status::InProgress, who, comment),
        }
    }

    /// In progress to paused.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidTransition`] unless it is in progress.
    pub fn stop_work(&mut self, who: &str, comment: Option<&str>) -> Result<()> {
        if self.status() != Status::InProgress {
            return Err(self.transition_error("stop work on").into());
        }
        self.change_status(Status::Paused, who, comment)
    }

    /// Close with a disposition.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidTransition`] if it is already closed.
    pub fn close(&mut self, disposition: Disposition, who: &str, comment: Option<&str>) -> Result<()> {
        if self.is_closed() {
            return Err(self.transition_error("close").into());
        }
        let what = format!("closed with disposition {}", disposition.as_str());
        self.log(&what, who, comment)?;
        self.status.set(Status::Closed);
        self.disposition.set(disposition);
        Ok(())
    }

    /// Assign to `release`. [`crate::domain::Project::assign_to_release`]
    /// checks that the release exists.
    pub(crate) fn assign_to_release(
        &mut self,
        release: &str,
        who: &str,
        comment: Option<&str>,
    ) -> Result<()> {
        if self.release() == Some(release) {
            return Err(ValidationError::AlreadyAssigned {
                issue: self.label().to_string(),
                kind: "release",
                name: release.to_string(),
            }
            .into());
        }
        let what = format!(
            "assigned to release {release} from {}",
            self.release().unwrap_or("unassigned")
        );
        self.log(&what, who, comment)?;
        self.release.set(release.to_string());
        Ok(())
    }

    /// Move to `component`. The project renumbers afterwards.
    pub(crate) fn assign_to_component(
        &mut self,
        component: &str,
        who: &str,
        comment: Option<&str>,
    ) -> Result<()> {
        if self.component() == component {
            return Err(ValidationError::AlreadyAssigned {
                issue: self.label().to_string(),
                kind: "component",
                name: component.to_string(),
            }
            .into());
        }
        let what = format!("assigned to component {component} from {}", self.component());
        self.log(&what, who, comment)?;
        self.component.set(component.to_string());
        Ok(())
    }

    /// Remove from its release.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NotAssigned`] if it has no release.
    pub fn unassign(&mut self, who: &str, comment: Option<&str>) -> Result<()> {
        let Some(release) = self.release().map(str::to_string) else {
            return Err(ValidationError::NotAssigned(self.label().to_string()).into());
        };
        self.log(&format!("unassigned from release {release}"), who, comment)?;
        self.release.clear();
        Ok(())
    }

    /// Apply an edit, logging which fields changed. Returns whether any did.
    ///
    /// # Errors
    ///
    /// Returns an error if the change log cannot be appended to.
    pub fn change(&mut self, edit: &IssueEdit, who: &str, comment: Option<&str>) -> Result<bool> {
        let title = edit.title.as_ref().filter(|t| t.as_str() != self.title());
        let desc = edit.desc.as_ref().filter(|d| d.as_str() != self.desc());
        let reporter = edit.reporter.as_ref().filter(|r| r.as_str() != self.reporter());

        let mut changes = Vec::new();
        if title.is_some() {
            changes.push("changed title");
        }
        if desc.is_some() {
            changes.push("changed description");
        }
        if reporter.is_some() {
            changes.push("changed reporter");
        }
        if changes.is_empty() {
            return Ok(false);
        }

        let (title, desc, reporter) = (title.cloned(), desc.cloned(), reporter.cloned());
        self.log(&changes.join(", "), who, comment)?;
        if let Some(title) = title {
            self.title.set(title);
        }
        if let Some(desc) = desc {
            self.desc.set(desc);
        }
        if let Some(reporter) = reporter {
            self.reporter.set(reporter);
        }
        Ok(true)
    }

    /// Log a comment.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyComment`] for blank text.
    pub fn comment(&mut self, who: &str, comment: &str) -> Result<()> {
        if comment.trim().is_empty() {
            return Err(ValidationError::EmptyComment.into());
        }
        self.log("commented", who, Some(comment))?;
        Ok(())
    }

    /// Append a reference.
    ///
    /// # Errors
    ///
    /// Returns an error if the references or the log cannot be decoded.
    pub fn add_reference(&mut self, reference: &str, who: &str, comment: Option<&str>) -> Result<()> {
        let number = self.references().len() + 1;
        self.log(&format!("added reference {number}"), who, comment)?;
        self.references.make_mut()?.push(reference.to_string());
        Ok(())
    }
}

impl Node for Issue {
    fn record_type(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn is_dirty(&self) -> bool {
        self.state.is_dirty()
    }

    fn stored_separately(&self) -> bool {
        true
    }
}

impl Record for Issue {
    type Context = IssueContext;
    const TYPE_NAME: &'static str = "Issue";

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
            "title" => &self.title,
            "desc" => &self.desc,
            "type" => &self.kind,
            "component" => &self.component,
            "release" => &self.release,
            "reporter" => &self.reporter,
            "status" => &self.status,
            "disposition" => &self.disposition,
            "creation_time" => &self.creation_time,
            "references" => &self.references,
            "id" => &self.id,
            LOG_EVENTS => &self.log_events,
            _ => return None,
        })
    }

    fn slot_mut(&mut self, field: &str) -> Option<&mut dyn FieldSlot> {
        Some(match field {
            "title" => &mut self.title,
            "desc" => &mut self.desc,
            "type" => &mut self.kind,
            "component" => &mut self.component,
            "release" => &mut self.release,
            "reporter" => &mut self.reporter,
            "status" => &mut self.status,
            "disposition" => &mut self.disposition,
            "creation_time" => &mut self.creation_time,
            "references" => &mut self.references,
            "id" => &mut self.id,
            LOG_EVENTS => &mut self.log_events,
            _ => return None,
        })
    }

    fn serialized_form_of(&self, field: &str, value: Value) -> Value {
        match &self.directory {
            Some(directory) if INTERPOLATED.contains(&field) => {
                rewrite_text(field, value, |text| directory.interpolate(text))
            }
            _ => value,
        }
    }

    fn deserialized_form_of(&self, field: &str, raw: Value) -> Option<Value> {
        if !INTERPOLATED.contains(&field) {
            return Some(raw);
        }
        let directory = self.directory.as_ref()?;
        Some(rewrite_text(field, raw, |text| directory.resolve(text)))
    }

    fn validate(&self) -> quire_record::Result<()> {
        if self.id().is_empty() {
            return Err(quire_record::Error::invalid(Self::TYPE_NAME, "issue has no id"));
        }
        if !self.kind.is_set() {
            return Err(quire_record::Error::invalid(
                Self::TYPE_NAME,
                format!("issue {} has no type", self.id()),
            ));
        }
        match (self.status() == Status::Closed, self.disposition.is_set()) {
            (true, false) => Err(quire_record::Error::invalid(
                Self::TYPE_NAME,
                format!("issue {} is closed without a disposition", self.id()),
            )),
            (false, true) => Err(quire_record::Error::invalid(
                Self::TYPE_NAME,
                format!("issue {} has a disposition but is not closed", self.id()),
            )),
            _ => Ok(()),
        }
    }
}

impl ChangeLog for Issue {
    fn log_slot(&self) -> &Slot<Vec<LogEvent>> {
        &self.log_events
    }

    fn log_slot_mut(&mut self) -> &mut Slot<Vec<LogEvent>> {
        &mut self.log_events
    }
}
