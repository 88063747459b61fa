//! Key-value persistence.
//!
//! The store is a flat map of string keys to string values, one file per key
//! on disk. The task list lives under a single key as a JSON array; the rest of
//! the crate only sees `load_tasks` and `save_tasks`.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::Error as _;
use serde_json::Value;

use crate::config::TASKS_KEY;
use crate::error::{AppError, Result};
use crate::task::Task;

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for &S {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }
}

/// Stores each key as a file named after it inside `root`.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        tracing::info!("File store opened at {:?}", root);
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path(key);
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, value)?;
        fs::rename(&temp_path, &path)?;
        tracing::debug!("Wrote {} bytes to {:?}", value.len(), path);
        Ok(())
    }
}

/// In-process store. Counts writes and can be told to fail them.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<HashMap<String, String>>,
    writes: Cell<usize>,
    fail_writes: Cell<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(key: &str, value: &str) -> Self {
        let store = Self::new();
        store.entries.borrow_mut().insert(key.to_string(), value.to_string());
        store
    }

    pub fn writes(&self) -> usize {
        self.writes.get()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        if self.fail_writes.get() {
            return Err(AppError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "store quota exceeded",
            )));
        }
        self.writes.set(self.writes.get() + 1);
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Reads the task snapshot. Missing or corrupt data yields an empty list.
pub fn load_tasks(store: &impl KeyValueStore) -> Vec<Task> {
    let raw = match store.get(TASKS_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(err) => {
            tracing::error!("Failed to read task snapshot: {}", err);
            return Vec::new();
        }
    };
    if raw.trim().is_empty() {
        return Vec::new();
    }

    match decode_snapshot(&raw) {
        Ok(tasks) => {
            tracing::info!("Loaded {} tasks", tasks.len());
            tasks
        }
        Err(err) => {
            tracing::error!("Task snapshot is corrupt, starting empty: {}", err);
            Vec::new()
        }
    }
}

/// Overwrites the task snapshot with `tasks`.
pub fn save_tasks(store: &impl KeyValueStore, tasks: &[Task]) -> Result<()> {
    let json = serde_json::to_string(tasks)?;
    store.set(TASKS_KEY, &json)
}

/// Decodes a snapshot record by record, skipping the ones that cannot be
/// salvaged and any repeated id.
pub fn decode_snapshot(raw: &str) -> serde_json::Result<Vec<Task>> {
    let Value::Array(items) = serde_json::from_str::<Value>(raw)? else {
        return Err(serde_json::Error::custom("task snapshot is not a JSON array"));
    };

    let mut seen = HashSet::new();
    let mut tasks = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<Task>(item) {
            Ok(task) if seen.insert(task.id) => tasks.push(task),
            Ok(task) => tracing::warn!("Skipping duplicate task id {}", task.id),
            Err(err) => tracing::warn!("Skipping unreadable task #{}: {}", index, err),
        }
    }
    Ok(tasks)
}
