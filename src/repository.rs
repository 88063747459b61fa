use std::collections::BTreeSet;

use crate::clock::{Clock, SystemClock};
use crate::error::{AppError, Result};
use crate::form::validate;
use crate::recurrence::next_due_date;
use crate::store::{self, KeyValueStore};
use crate::task::{Repeat, Task, TaskDraft, TaskId};

/// Result of flipping a task's `done` flag.
#[derive(Debug, Clone, PartialEq)]
pub struct Toggled {
    pub task: Task,
    /// Next instance of a repeating task, created when it was just completed.
    pub follow_up: Option<Task>,
}

/// The working set of tasks. Every mutation is flushed to the store before it
/// returns.
#[derive(Debug)]
pub struct TaskRepository<S, C = SystemClock> {
    tasks: Vec<Task>,
    store: S,
    clock: C,
}

impl<S: KeyValueStore, C: Clock> TaskRepository<S, C> {
    pub fn load(store: S, clock: C) -> Self {
        let tasks = store::load_tasks(&store);
        Self { tasks, store, clock }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.get(id).is_some()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Distinct projects of tasks not in the trash, sorted.
    pub fn project_names(&self) -> Vec<String> {
        self.tasks
            .iter()
            .filter(|t| !t.deleted && !t.project.is_empty())
            .map(|t| t.project.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    fn save(&self) {
        if let Err(err) = store::save_tasks(&self.store, &self.tasks) {
            tracing::error!("Failed to save tasks: {}", err);
        }
    }

    fn index_of(&self, id: TaskId) -> Result<usize> {
        self.tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or(AppError::TaskNotFound(id))
    }

    /// Millisecond timestamp, bumped past the newest id if the clock has not moved.
    /// Fails once the newest id is `i64::MAX`.
    fn next_id(&self) -> Result<TaskId> {
        let now = self.clock.now_millis();
        match self.tasks.iter().map(|t| t.id).max() {
            Some(last) if last.0 >= now => {
                let next = last.0.checked_add(1).ok_or(AppError::IdsExhausted(last))?;
                Ok(TaskId(next))
            }
            _ => Ok(TaskId(now)),
        }
    }

    pub fn create(&mut self, draft: TaskDraft, photos: Vec<String>) -> Result<&Task> {
        validate(&draft)?;
        let id = self.next_id()?;
        let task = Task::new(id, id.0, draft, photos);
        tracing::debug!("Created task {} ({} photos)", id, task.photos.len());
        self.tasks.push(task);
        self.save();
        Ok(&self.tasks[self.tasks.len() - 1])
    }

    /// Replaces the editable fields of `id` and appends `new_photos`.
    pub fn update(&mut self, id: TaskId, draft: TaskDraft, new_photos: Vec<String>) -> Result<&Task> {
        let idx = self.index_of(id)?;
        validate(&draft)?;
        let task = &mut self.tasks[idx];
        task.apply(draft);
        task.photos.extend(new_photos);
        tracing::debug!("Updated task {}", id);
        self.save();
        Ok(&self.tasks[idx])
    }

    pub fn soft_delete(&mut self, id: TaskId) -> Result<()> {
        let idx = self.index_of(id)?;
        self.tasks[idx].deleted = true;
        tracing::debug!("Moved task {} to the trash", id);
        self.save();
        Ok(())
    }

    pub fn restore(&mut self, id: TaskId) -> Result<()> {
        let idx = self.index_of(id)?;
        self.tasks[idx].deleted = false;
        tracing::debug!("Restored task {}", id);
        self.save();
        Ok(())
    }

    /// Removes a trashed task for good.
    pub fn purge(&mut self, id: TaskId) -> Result<Task> {
        let idx = self.index_of(id)?;
        if !self.tasks[idx].deleted {
            return Err(AppError::PurgeActive(id));
        }
        let task = self.tasks.remove(idx);
        tracing::debug!("Purged task {}", id);
        self.save();
        Ok(task)
    }

    pub fn toggle_done(&mut self, id: TaskId) -> Result<Toggled> {
        let idx = self.index_of(id)?;
        let spawns = !self.tasks[idx].done && self.tasks[idx].repeat != Repeat::None;
        let follow_id = if spawns { Some(self.next_id()?) } else { None };
        let today = self.clock.today();

        let task = &mut self.tasks[idx];
        task.done = !task.done;
        let task = task.clone();

        let follow_up = follow_id.map(|follow_id| {
            let mut next = task.clone();
            next.id = follow_id;
            next.created_at = follow_id.0;
            next.done = false;
            next.deleted = false;
            next.due_date = next_due_date(task.repeat, task.due_date, today);
            if next.start_date > next.due_date && next.due_date.is_some() {
                next.start_date = None;
            }
            next
        });
        if let Some(next) = &follow_up {
            tracing::debug!("Task {} repeats as {} due {:?}", id, next.id, next.due_date);
            self.tasks.push(next.clone());
        }
        self.save();
        Ok(Toggled { task, follow_up })
    }
}
