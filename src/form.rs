//! The task form: what the user is typing, which task it edits, and the
//! checks a submission must pass before anything is mutated.

use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

use crate::clock::Clock;
use crate::error::{AppError, Result};
use crate::normalize;
use crate::photos;
use crate::repository::TaskRepository;
use crate::store::KeyValueStore;
use crate::task::{Priority, Repeat, Status, Task, TaskDraft, TaskId};

/// Separator between photo paths typed into the form.
pub const PHOTO_PATH_SEPARATOR: char = ';';

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Title is required")]
    MissingTitle,

    #[error("Due date {due} is before start date {start}")]
    DateOrder { start: NaiveDate, due: NaiveDate },

    #[error("{field} must look like 2024-01-31, got `{value}`")]
    InvalidDate { field: &'static str, value: String },

    #[error("Amount must be a number, got `{0}`")]
    InvalidAmount(String),
}

/// Checks the invariants every stored task must satisfy.
pub fn validate(draft: &TaskDraft) -> std::result::Result<(), ValidationError> {
    if draft.title.trim().is_empty() {
        return Err(ValidationError::MissingTitle);
    }
    if let (Some(start), Some(due)) = (draft.start_date, draft.due_date) {
        if start > due {
            return Err(ValidationError::DateOrder { start, due });
        }
    }
    Ok(())
}

/// Whether the form describes a new task or an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormState {
    #[default]
    Idle,
    Editing(TaskId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    StartDate,
    DueDate,
    Priority,
    Status,
    Repeat,
    Project,
    Amount,
    ResponsibleName,
    ResponsiblePhone,
    Description,
    Photos,
}

impl Field {
    pub const ALL: [Field; 12] = [
        Field::Title,
        Field::StartDate,
        Field::DueDate,
        Field::Priority,
        Field::Status,
        Field::Repeat,
        Field::Project,
        Field::Amount,
        Field::ResponsibleName,
        Field::ResponsiblePhone,
        Field::Description,
        Field::Photos,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Field::Title => "Title",
            Field::StartDate => "Start date",
            Field::DueDate => "Due date",
            Field::Priority => "Priority",
            Field::Status => "Status",
            Field::Repeat => "Repeat",
            Field::Project => "Project",
            Field::Amount => "Amount",
            Field::ResponsibleName => "Responsible",
            Field::ResponsiblePhone => "Phone",
            Field::Description => "Description",
            Field::Photos => "Add photos",
        }
    }

    /// Fields picked from a fixed set rather than typed.
    pub fn is_choice(self) -> bool {
        matches!(self, Field::Priority | Field::Status | Field::Repeat)
    }

    pub fn next(self) -> Self {
        let pos = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(pos + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let pos = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(pos + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Outcome of a successful submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submitted {
    Created(TaskId),
    Updated(TaskId),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskForm {
    pub state: FormState,
    pub title: String,
    pub start_date: String,
    pub due_date: String,
    pub priority: Priority,
    pub status: Status,
    pub repeat: Repeat,
    pub project: String,
    pub amount: String,
    pub responsible_name: String,
    pub responsible_phone: String,
    pub description: String,
    pub photo_paths: String,
}

impl TaskForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// A form pre-filled from `task`, in editing mode.
    pub fn edit(task: &Task) -> Self {
        let date = |d: Option<NaiveDate>| {
            d.map(|d| d.format(normalize::date::FORMAT).to_string())
                .unwrap_or_default()
        };
        Self {
            state: FormState::Editing(task.id),
            title: task.title.clone(),
            start_date: date(task.start_date),
            due_date: date(task.due_date),
            priority: task.priority,
            status: task.status,
            repeat: task.repeat,
            project: task.project.clone(),
            amount: task.amount.map(|a| a.to_string()).unwrap_or_default(),
            responsible_name: task.responsible_name.clone(),
            responsible_phone: task.responsible_phone.clone(),
            description: task.description.clone(),
            photo_paths: String::new(),
        }
    }

    pub fn clear(&mut self) {
        *self = Self::new();
    }

    pub fn editing(&self) -> Option<TaskId> {
        match self.state {
            FormState::Editing(id) => Some(id),
            FormState::Idle => None,
        }
    }

    pub fn text_mut(&mut self, field: Field) -> Option<&mut String> {
        match field {
            Field::Title => Some(&mut self.title),
            Field::StartDate => Some(&mut self.start_date),
            Field::DueDate => Some(&mut self.due_date),
            Field::Project => Some(&mut self.project),
            Field::Amount => Some(&mut self.amount),
            Field::ResponsibleName => Some(&mut self.responsible_name),
            Field::ResponsiblePhone => Some(&mut self.responsible_phone),
            Field::Description => Some(&mut self.description),
            Field::Photos => Some(&mut self.photo_paths),
            Field::Priority | Field::Status | Field::Repeat => None,
        }
    }

    pub fn value(&self, field: Field) -> String {
        match field {
            Field::Title => self.title.clone(),
            Field::StartDate => self.start_date.clone(),
            Field::DueDate => self.due_date.clone(),
            Field::Priority => self.priority.to_string(),
            Field::Status => self.status.to_string(),
            Field::Repeat => self.repeat.to_string(),
            Field::Project => self.project.clone(),
            Field::Amount => self.amount.clone(),
            Field::ResponsibleName => self.responsible_name.clone(),
            Field::ResponsiblePhone => self.responsible_phone.clone(),
            Field::Description => self.description.clone(),
            Field::Photos => self.photo_paths.clone(),
        }
    }

    /// Steps a choice field to its next value.
    pub fn cycle(&mut self, field: Field) {
        match field {
            Field::Priority => self.priority = self.priority.next(),
            Field::Status => self.status = self.status.next(),
            Field::Repeat => self.repeat = self.repeat.next(),
            _ => {}
        }
    }

    pub fn push_char(&mut self, field: Field, c: char) {
        if let Some(text) = self.text_mut(field) {
            text.push(c);
        }
        if field == Field::Title {
            self.title_edited();
        }
    }

    pub fn pop_char(&mut self, field: Field) {
        if let Some(text) = self.text_mut(field) {
            text.pop();
        }
        if field == Field::Title {
            self.title_edited();
        }
    }

    /// Emptying the title detaches the form from the task it was editing.
    fn title_edited(&mut self) {
        if self.title.trim().is_empty() && self.editing().is_some() {
            self.state = FormState::Idle;
        }
    }

    pub fn photo_paths(&self) -> Vec<PathBuf> {
        self.photo_paths
            .split(PHOTO_PATH_SEPARATOR)
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
            .collect()
    }

    /// Parses the typed fields into a validated draft.
    pub fn to_draft(&self) -> std::result::Result<TaskDraft, ValidationError> {
        let draft = TaskDraft {
            title: self.title.trim().to_string(),
            start_date: parse_date("Start date", &self.start_date)?,
            due_date: parse_date("Due date", &self.due_date)?,
            priority: self.priority,
            status: self.status,
            repeat: self.repeat,
            project: self.project.trim().to_string(),
            amount: parse_amount(&self.amount)?,
            responsible_name: self.responsible_name.trim().to_string(),
            responsible_phone: self.responsible_phone.trim().to_string(),
            description: self.description.trim().to_string(),
        };
        validate(&draft)?;
        Ok(draft)
    }

    /// Validates, encodes any photos, then creates or updates the task.
    ///
    /// Nothing is mutated unless every step before the repository call succeeds.
    pub fn submit<S, C>(&mut self, repo: &mut TaskRepository<S, C>) -> Result<Submitted>
    where
        S: KeyValueStore,
        C: Clock,
    {
        let draft = self.to_draft()?;
        if let FormState::Editing(id) = self.state {
            if !repo.contains(id) {
                return Err(AppError::TaskNotFound(id));
            }
        }
        let photos = photos::encode_files(&self.photo_paths())?;

        match self.state {
            FormState::Idle => {
                let id = repo.create(draft, photos)?.id;
                self.clear();
                Ok(Submitted::Created(id))
            }
            FormState::Editing(id) => {
                repo.update(id, draft, photos)?;
                self.photo_paths.clear();
                Ok(Submitted::Updated(id))
            }
        }
    }
}

fn parse_date(
    field: &'static str,
    raw: &str,
) -> std::result::Result<Option<NaiveDate>, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(raw, normalize::date::FORMAT)
        .map(Some)
        .map_err(|_| ValidationError::InvalidDate {
            field,
            value: raw.to_string(),
        })
}

fn parse_amount(raw: &str) -> std::result::Result<Option<f64>, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    normalize::amount::parse(raw)
        .map(Some)
        .ok_or_else(|| ValidationError::InvalidAmount(raw.to_string()))
}
