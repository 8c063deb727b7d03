use crate::error::StoreError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Workflow state of a task.
#[derive(Debug, Default, Eq, PartialEq, Serialize, Deserialize, Clone, Copy, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    #[default]
    Todo,
    InProgress,
    Done,
}

impl Status {
    pub const ALL: [Status; 3] = [Status::Todo, Status::InProgress, Status::Done];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Todo => "todo",
            Status::InProgress => "in-progress",
            Status::Done => "done",
        }
    }

    /// Status implied by the legacy `done` flag.
    pub fn from_done(done: bool) -> Self {
        if done { Status::Done } else { Status::Todo }
    }
}

impl Display for Status {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Status::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| StoreError::InvalidStatus(s.to_string()))
    }
}

/// A single tracked work item as persisted in the task file.
///
/// Fields this version does not know about are kept in `extra` so that a
/// load/save cycle never drops data written by another version.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct Task {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub done: bool,
    pub status: Status,
    #[serde(default)]
    pub due_date: String,
    #[serde(rename = "createdAt")]
    pub created_at: String,
    #[serde(rename = "updatedAt")]
    pub updated_at: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One element of the persisted array.
///
/// Anything that does not fit the task schema is carried through untouched
/// as `Raw`. Raw objects are still found by id and status, and patched as
/// plain JSON.
#[derive(Debug, PartialEq, Serialize, Clone)]
#[serde(untagged)]
pub enum Record {
    Task(Task),
    Raw(Value),
}

impl Record {
    /// Numeric id of the record, if it has one.
    pub fn id(&self) -> Option<u64> {
        match self {
            Record::Task(task) => task.id,
            Record::Raw(value) => value.get("id").and_then(integral_id),
        }
    }

    /// Status of the record, if it carries a known one.
    pub fn status(&self) -> Option<Status> {
        match self {
            Record::Task(task) => Some(task.status),
            Record::Raw(value) => value
                .get("status")
                .and_then(Value::as_str)
                .and_then(|status| status.parse().ok()),
        }
    }

    pub fn as_task(&self) -> Option<&Task> {
        match self {
            Record::Task(task) => Some(task),
            Record::Raw(_) => None,
        }
    }
}

/// Accepts `5` and `5.0` alike.
fn integral_id(value: &Value) -> Option<u64> {
    value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|id| *id >= 0.0 && id.fract() == 0.0 && *id < u64::MAX as f64)
            .map(|id| id as u64)
    })
}

impl From<Value> for Record {
    fn from(value: Value) -> Self {
        if !value.is_object() {
            return Record::Raw(value);
        }
        match Task::deserialize(&value) {
            Ok(task) => Record::Task(task),
            Err(_) => Record::Raw(value),
        }
    }
}

impl From<Task> for Record {
    fn from(task: Task) -> Self {
        Record::Task(task)
    }
}

/// Input for creating a task.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub due_date: Option<String>,
    pub status: Status,
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn due_date(mut self, due_date: impl Into<String>) -> Self {
        self.due_date = Some(due_date.into());
        self
    }

    pub fn status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }
}

/// Field assignments for a partial update.
///
/// `None` leaves the field alone. `Some` sets it, and `Some(String::new())`
/// for `due_date` clears the due date.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub done: Option<bool>,
    pub status: Option<Status>,
    pub due_date: Option<String>,
}

impl TaskPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn done(mut self, done: bool) -> Self {
        self.done = Some(done);
        self
    }

    pub fn status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    pub fn due_date(mut self, due_date: impl Into<String>) -> Self {
        self.due_date = Some(due_date.into());
        self
    }

    pub fn clear_due_date(self) -> Self {
        self.due_date(String::new())
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Copies every supplied field onto `task`. Timestamps are left to the caller.
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(description) = &self.description {
            task.description = description.clone();
        }
        if let Some(done) = self.done {
            task.done = done;
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(due_date) = &self.due_date {
            task.due_date = due_date.clone();
        }
    }

    /// Same as [`TaskPatch::apply_to`] for a record that only exists as a JSON object.
    pub fn apply_to_object(&self, object: &mut Map<String, Value>) {
        if let Some(title) = &self.title {
            object.insert("title".to_string(), Value::from(title.as_str()));
        }
        if let Some(description) = &self.description {
            object.insert("description".to_string(), Value::from(description.as_str()));
        }
        if let Some(done) = self.done {
            object.insert("done".to_string(), Value::Bool(done));
        }
        if let Some(status) = self.status {
            object.insert("status".to_string(), Value::from(status.as_str()));
        }
        if let Some(due_date) = &self.due_date {
            object.insert("due_date".to_string(), Value::from(due_date.as_str()));
        }
    }
}
