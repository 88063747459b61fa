use std::fmt;
use std::str::FromStr;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::normalize;

/// Number of days after today still counted as "this week".
pub const WEEK_WINDOW_DAYS: u64 = 7;

/// Creation timestamp in milliseconds, doubling as the primary key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub i64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown value `{0}`")]
pub struct UnknownVariant(pub String);

macro_rules! string_enum {
    ($name:ident { $($variant:ident => $key:literal),+ $(,)? }) => {
        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $key),+
                }
            }

            /// The next variant, wrapping around. Used by the form to cycle values.
            pub fn next(self) -> Self {
                let all = Self::ALL;
                let pos = all.iter().position(|v| *v == self).unwrap_or(0);
                all[(pos + 1) % all.len()]
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim() {
                    $($key => Ok($name::$variant),)+
                    other => Err(UnknownVariant(other.to_string())),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
}

string_enum!(Priority { Low => "low", Normal => "normal", High => "high" });

impl Priority {
    /// Position in the priority sort, highest first.
    pub fn rank(self) -> u8 {
        match self {
            Priority::High => 0,
            Priority::Normal => 1,
            Priority::Low => 2,
        }
    }
}

/// Workflow stage of a task that is neither done nor deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Pending,
    Assembled,
    Sent,
    Signed,
    Uploaded,
}

string_enum!(Status {
    Pending => "pending",
    Assembled => "assembled",
    Sent => "sent",
    Signed => "signed",
    Uploaded => "uploaded",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Repeat {
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
}

string_enum!(Repeat {
    None => "none",
    Daily => "daily",
    Weekly => "weekly",
    Monthly => "monthly",
});

impl<'de> Deserialize<'de> for Priority {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        normalize::lenient_enum(d)
    }
}

impl<'de> Deserialize<'de> for Status {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        normalize::lenient_enum(d)
    }
}

impl<'de> Deserialize<'de> for Repeat {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        normalize::lenient_enum(d)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(deserialize_with = "normalize::id")]
    pub id: TaskId,
    #[serde(default, deserialize_with = "normalize::timestamp")]
    pub created_at: i64,
    #[serde(default, deserialize_with = "normalize::text")]
    pub title: String,
    #[serde(default, with = "normalize::date")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, with = "normalize::date")]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, deserialize_with = "normalize::text")]
    pub project: String,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub repeat: Repeat,
    #[serde(default, deserialize_with = "normalize::text")]
    pub description: String,
    #[serde(default, deserialize_with = "normalize::text")]
    pub responsible_name: String,
    #[serde(default, deserialize_with = "normalize::text")]
    pub responsible_phone: String,
    #[serde(default, with = "normalize::amount")]
    pub amount: Option<f64>,
    #[serde(default, deserialize_with = "normalize::string_list")]
    pub photos: Vec<String>,
    #[serde(default, deserialize_with = "normalize::flag")]
    pub done: bool,
    #[serde(default, deserialize_with = "normalize::flag")]
    pub deleted: bool,
}

impl Task {
    /// A fresh task built from user-supplied fields.
    pub fn new(id: TaskId, created_at: i64, draft: TaskDraft, photos: Vec<String>) -> Self {
        let mut task = Self {
            id,
            created_at,
            title: String::new(),
            start_date: None,
            due_date: None,
            priority: Priority::default(),
            project: String::new(),
            status: Status::default(),
            repeat: Repeat::default(),
            description: String::new(),
            responsible_name: String::new(),
            responsible_phone: String::new(),
            amount: None,
            photos,
            done: false,
            deleted: false,
        };
        task.apply(draft);
        task
    }

    /// Overwrites the editable fields. Identity, flags and photos are untouched.
    pub fn apply(&mut self, draft: TaskDraft) {
        self.title = draft.title;
        self.start_date = draft.start_date;
        self.due_date = draft.due_date;
        self.priority = draft.priority;
        self.project = draft.project;
        self.status = draft.status;
        self.repeat = draft.repeat;
        self.description = draft.description;
        self.responsible_name = draft.responsible_name;
        self.responsible_phone = draft.responsible_phone;
        self.amount = draft.amount;
    }

    /// The editable fields of this task, as the form would submit them.
    pub fn draft(&self) -> TaskDraft {
        TaskDraft {
            title: self.title.clone(),
            start_date: self.start_date,
            due_date: self.due_date,
            priority: self.priority,
            project: self.project.clone(),
            status: self.status,
            repeat: self.repeat,
            description: self.description.clone(),
            responsible_name: self.responsible_name.clone(),
            responsible_phone: self.responsible_phone.clone(),
            amount: self.amount,
        }
    }

    pub fn is_active(&self) -> bool {
        !self.done && !self.deleted
    }

    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.is_active() && self.due_date.is_some_and(|due| due < today)
    }

    pub fn is_due_today(&self, today: NaiveDate) -> bool {
        self.due_date == Some(today)
    }

    /// Due between today and `WEEK_WINDOW_DAYS` days from now, both ends included.
    pub fn is_due_this_week(&self, today: NaiveDate) -> bool {
        let Some(due) = self.due_date else {
            return false;
        };
        let week_end = today
            .checked_add_days(Days::new(WEEK_WINDOW_DAYS))
            .unwrap_or(NaiveDate::MAX);
        due >= today && due <= week_end
    }

    pub fn state_label(&self) -> &'static str {
        if self.deleted {
            "trash"
        } else if self.done {
            "done"
        } else {
            self.status.as_str()
        }
    }
}

/// User-editable fields of a task, validated before it reaches the repository.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskDraft {
    pub title: String,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub priority: Priority,
    pub project: String,
    pub status: Status,
    pub repeat: Repeat,
    pub description: String,
    pub responsible_name: String,
    pub responsible_phone: String,
    pub amount: Option<f64>,
}

impl TaskDraft {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn enums_parse_and_cycle() {
        assert_eq!("high".parse::<Priority>(), Ok(Priority::High));
        let err = "urgent".parse::<Priority>().unwrap_err();
        assert_eq!(err.to_string(), "unknown value `urgent`");
        assert_eq!(Status::Uploaded.next(), Status::Pending);
        assert_eq!(Repeat::None.next(), Repeat::Daily);
    }

    #[test]
    fn priority_rank_orders_high_first() {
        let mut all = Priority::ALL.to_vec();
        all.sort_by_key(|p| p.rank());
        assert_eq!(all, vec![Priority::High, Priority::Normal, Priority::Low]);
    }

    #[test]
    fn week_window_includes_both_ends() {
        let today = date("2024-03-10");
        let mut task = Task::new(TaskId(1), 1, TaskDraft::titled("x"), vec![]);

        task.due_date = Some(today);
        assert!(task.is_due_today(today));
        assert!(task.is_due_this_week(today));

        task.due_date = Some(date("2024-03-17"));
        assert!(task.is_due_this_week(today));

        task.due_date = Some(date("2024-03-18"));
        assert!(!task.is_due_this_week(today));

        task.due_date = Some(date("2024-03-09"));
        assert!(!task.is_due_this_week(today));
        assert!(task.is_overdue(today));
    }

    #[test]
    fn done_tasks_are_never_overdue() {
        let mut task = Task::new(TaskId(1), 1, TaskDraft::titled("x"), vec![]);
        task.due_date = Some(date("2020-01-01"));
        task.done = true;
        assert!(!task.is_overdue(date("2024-01-01")));
        assert_eq!(task.state_label(), "done");
    }

    #[test]
    fn apply_keeps_identity_and_photos() {
        let mut task = Task::new(TaskId(5), 5, TaskDraft::titled("old"), vec!["p".into()]);
        task.done = true;
        task.apply(TaskDraft::titled("new"));
        assert_eq!(task.id, TaskId(5));
        assert_eq!(task.title, "new");
        assert_eq!(task.photos, vec!["p".to_string()]);
        assert!(task.done);
    }
}
