use crate::clock::{Clock, SystemClock, format_timestamp, next_stamp};
use crate::error::StoreError;
use crate::migrate::migrate;
use crate::task::{NewTask, Record, Status, Task, TaskPatch};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// What `load` does with a task file that is not a JSON array.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadPolicy {
    /// Treat the file as empty. The file itself is left alone until the next save.
    #[default]
    Lenient,
    /// Fail with [`StoreError::Malformed`].
    Strict,
}

/// JSON-file backed task collection.
///
/// Every operation reads the whole file, changes it in memory and writes the
/// whole file back. There is no locking: two processes working on the same
/// file race, and the last writer wins.
pub struct TaskStore<C = SystemClock> {
    path: PathBuf,
    policy: LoadPolicy,
    clock: C,
}

impl TaskStore<SystemClock> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_clock(path, SystemClock)
    }
}

impl<C: Clock> TaskStore<C> {
    pub fn with_clock(path: impl Into<PathBuf>, clock: C) -> Self {
        Self {
            path: path.into(),
            policy: LoadPolicy::default(),
            clock,
        }
    }

    pub fn with_policy(mut self, policy: LoadPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads every record from the task file, backfilling fields that older
    /// versions did not write.
    ///
    /// A missing file is created holding an empty array.
    #[tracing::instrument(skip(self), fields(path = %self.path.display()))]
    pub fn load(&self) -> Result<Vec<Record>, StoreError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                self.initialize()?;
                return Ok(Vec::new());
            }
            Err(err) => return Err(err.into()),
        };

        let values = match parse_array(&contents) {
            Ok(values) => values,
            Err(reason) => match self.policy {
                LoadPolicy::Lenient => {
                    warn!(%reason, "Task file is malformed, treating it as empty");
                    return Ok(Vec::new());
                }
                LoadPolicy::Strict => return Err(StoreError::malformed(&self.path, reason)),
            },
        };

        let now = format_timestamp(self.clock.now());
        let records: Vec<Record> = migrate(values, &now)
            .into_iter()
            .map(Record::from)
            .collect();
        debug!(count = records.len(), "Loaded records");
        Ok(records)
    }

    /// Overwrites the task file with `records`, creating parent directories.
    #[tracing::instrument(
        skip(self, records),
        fields(path = %self.path.display(), count = records.len())
    )]
    pub fn save(&self, records: &[Record]) -> Result<(), StoreError> {
        self.ensure_parent_dir()?;
        let json = serde_json::to_string_pretty(records)?;
        fs::write(&self.path, json)?;
        debug!("Saved records");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub fn create(&self, new_task: NewTask) -> Result<Task, StoreError> {
        let mut records = self.load()?;
        let now = format_timestamp(self.clock.now());
        let task = Task {
            id: Some(next_id(&records)?),
            title: new_task.title,
            description: new_task.description,
            done: false,
            status: new_task.status,
            due_date: new_task.due_date.unwrap_or_default(),
            created_at: now.clone(),
            updated_at: now,
            extra: Map::new(),
        };
        records.push(Record::Task(task.clone()));
        self.save(&records)?;
        info!(id = task.id, "Created task");
        Ok(task)
    }

    /// First record with `id`, whether or not it fits the task schema.
    #[tracing::instrument(skip(self))]
    pub fn get(&self, id: u64) -> Result<Option<Record>, StoreError> {
        let record = self
            .load()?
            .into_iter()
            .find(|record| record.id() == Some(id));
        Ok(record)
    }

    /// Applies `patch` to the first record with `id` and refreshes its
    /// `updatedAt`. Nothing is written when no record matches.
    #[tracing::instrument(skip(self))]
    pub fn update(&self, id: u64, patch: &TaskPatch) -> Result<Option<Record>, StoreError> {
        let mut records = self.load()?;
        let Some(record) = records.iter_mut().find(|record| record.id() == Some(id)) else {
            debug!("No task to update");
            return Ok(None);
        };
        if patch.is_empty() {
            debug!("Empty patch, only refreshing updatedAt");
        }

        *record = patch_record(record.clone(), patch, self.clock.now());
        let updated = record.clone();

        self.save(&records)?;
        info!(id, "Updated task");
        Ok(Some(updated))
    }

    /// Removes every record carrying `id`, duplicates included.
    #[tracing::instrument(skip(self))]
    pub fn delete(&self, id: u64) -> Result<bool, StoreError> {
        let records = self.load()?;
        let before = records.len();
        let survivors: Vec<Record> = records
            .into_iter()
            .filter(|record| record.id() != Some(id))
            .collect();

        if survivors.len() == before {
            debug!("No record to delete");
            return Ok(false);
        }
        self.save(&survivors)?;
        info!(id, removed = before - survivors.len(), "Deleted records");
        Ok(true)
    }

    pub fn list(&self) -> Result<Vec<Record>, StoreError> {
        self.load()
    }

    /// Tasks whose status is `status`, in storage order.
    ///
    /// An unknown status is rejected before the file is read.
    #[tracing::instrument(skip(self))]
    pub fn list_by_status(&self, status: &str) -> Result<Vec<Record>, StoreError> {
        let status: Status = status.parse()?;
        let records = self
            .load()?
            .into_iter()
            .filter(|record| record.status() == Some(status))
            .collect();
        Ok(records)
    }

    fn initialize(&self) -> Result<(), StoreError> {
        self.ensure_parent_dir()?;
        fs::write(&self.path, "[]")?;
        info!(path = %self.path.display(), "Created empty task file");
        Ok(())
    }

    fn ensure_parent_dir(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

/// Next free id: one past the largest id present, records without a numeric
/// id counting as zero.
pub fn next_id(records: &[Record]) -> Result<u64, StoreError> {
    match records.iter().map(|record| record.id().unwrap_or(0)).max() {
        None => Ok(1),
        Some(max) => max.checked_add(1).ok_or(StoreError::IdExhausted(max)),
    }
}

fn patch_record(record: Record, patch: &TaskPatch, now: NaiveDateTime) -> Record {
    match record {
        Record::Task(mut task) => {
            patch.apply_to(&mut task);
            task.updated_at = next_stamp(&task.updated_at, now);
            Record::Task(task)
        }
        Record::Raw(Value::Object(mut object)) => {
            patch.apply_to_object(&mut object);
            let previous = object
                .get("updatedAt")
                .and_then(Value::as_str)
                .unwrap_or_default();
            let stamp = next_stamp(previous, now);
            object.insert("updatedAt".to_string(), Value::String(stamp));
            // The patch may have repaired the record.
            Record::from(Value::Object(object))
        }
        raw => raw,
    }
}

fn parse_array(contents: &str) -> Result<Vec<Value>, String> {
    match serde_json::from_str::<Value>(contents) {
        Ok(Value::Array(values)) => Ok(values),
        Ok(_) => Err("top-level value is not an array".to_string()),
        Err(err) => Err(err.to_string()),
    }
}
