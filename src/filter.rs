//! Which tasks the list shows, and in what order.

use chrono::NaiveDate;
use clap::ValueEnum;

use crate::task::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum StatusClass {
    /// Everything not in the trash.
    #[default]
    All,
    /// Not done, not in the trash.
    Active,
    Done,
    /// Only the trash.
    Deleted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum DateBucket {
    #[default]
    All,
    Today,
    ThisWeek,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SortMode {
    /// Creation order.
    #[default]
    Created,
    /// Earliest due date first; tasks without one last.
    DueDate,
    /// Open tasks before completed ones.
    ActiveFirst,
    /// High, normal, low.
    Priority,
}

impl StatusClass {
    pub fn label(self) -> &'static str {
        match self {
            StatusClass::All => "all",
            StatusClass::Active => "active",
            StatusClass::Done => "done",
            StatusClass::Deleted => "trash",
        }
    }

    pub fn next(self) -> Self {
        match self {
            StatusClass::All => StatusClass::Active,
            StatusClass::Active => StatusClass::Done,
            StatusClass::Done => StatusClass::Deleted,
            StatusClass::Deleted => StatusClass::All,
        }
    }
}

impl DateBucket {
    pub fn label(self) -> &'static str {
        match self {
            DateBucket::All => "any date",
            DateBucket::Today => "due today",
            DateBucket::ThisWeek => "due this week",
        }
    }

    pub fn next(self) -> Self {
        match self {
            DateBucket::All => DateBucket::Today,
            DateBucket::Today => DateBucket::ThisWeek,
            DateBucket::ThisWeek => DateBucket::All,
        }
    }
}

impl SortMode {
    pub fn label(self) -> &'static str {
        match self {
            SortMode::Created => "added",
            SortMode::DueDate => "due date",
            SortMode::ActiveFirst => "open first",
            SortMode::Priority => "priority",
        }
    }

    pub fn next(self) -> Self {
        match self {
            SortMode::Created => SortMode::DueDate,
            SortMode::DueDate => SortMode::ActiveFirst,
            SortMode::ActiveFirst => SortMode::Priority,
            SortMode::Priority => SortMode::Created,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ProjectFilter {
    #[default]
    All,
    Named(String),
}

impl ProjectFilter {
    pub fn from_arg(arg: Option<&str>) -> Self {
        match arg {
            None | Some("all") => ProjectFilter::All,
            Some(name) => ProjectFilter::Named(name.to_string()),
        }
    }

    fn matches(&self, task: &Task) -> bool {
        match self {
            ProjectFilter::All => true,
            ProjectFilter::Named(name) => task.project == *name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Criteria {
    pub status: StatusClass,
    /// With `StatusClass::All`, hide completed tasks as well.
    pub only_active: bool,
    pub project: ProjectFilter,
    pub query: String,
    pub date: DateBucket,
    pub sort: SortMode,
}

impl Criteria {
    fn matches_status(&self, task: &Task) -> bool {
        match self.status {
            StatusClass::Deleted => task.deleted,
            StatusClass::All if self.only_active => task.is_active(),
            StatusClass::All => !task.deleted,
            StatusClass::Active => task.is_active(),
            StatusClass::Done => !task.deleted && task.done,
        }
    }

    fn matches_query(&self, task: &Task, query: &str) -> bool {
        query.is_empty()
            || [&task.title, &task.description, &task.project]
                .iter()
                .any(|field| field.to_lowercase().contains(query))
    }

    fn matches_date(&self, task: &Task, today: NaiveDate) -> bool {
        match self.date {
            DateBucket::All => true,
            DateBucket::Today => task.is_due_today(today),
            DateBucket::ThisWeek => task.is_due_this_week(today),
        }
    }
}

/// The tasks matching `criteria`, sorted. Ties keep their order in `tasks`.
pub fn apply<'a>(tasks: &'a [Task], criteria: &Criteria, today: NaiveDate) -> Vec<&'a Task> {
    let query = criteria.query.trim().to_lowercase();
    let mut view: Vec<&Task> = tasks
        .iter()
        .filter(|t| criteria.matches_status(t))
        .filter(|t| criteria.project.matches(t))
        .filter(|t| criteria.matches_query(t, &query))
        .filter(|t| criteria.matches_date(t, today))
        .collect();

    match criteria.sort {
        SortMode::Created => view.sort_by_key(|t| t.created_at),
        SortMode::DueDate => view.sort_by_key(|t| (t.due_date.is_none(), t.due_date)),
        SortMode::ActiveFirst => view.sort_by_key(|t| t.done),
        SortMode::Priority => view.sort_by_key(|t| t.priority.rank()),
    }
    view
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{Priority, TaskDraft, TaskId};

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn task(id: i64, title: &str) -> Task {
        Task::new(TaskId(id), id, TaskDraft::titled(title), vec![])
    }

    fn ids(view: &[&Task]) -> Vec<i64> {
        view.iter().map(|t| t.id.0).collect()
    }

    fn sample() -> Vec<Task> {
        let mut open = task(1, "Fix gutter");
        open.project = "A block".into();
        open.priority = Priority::Low;
        let mut done = task(2, "Order shingles");
        done.done = true;
        done.priority = Priority::High;
        let mut trashed = task(3, "Old quote");
        trashed.deleted = true;
        let mut other = task(4, "Paint fascia");
        other.project = "B block".into();
        other.description = "Needs SCAFFOLD".into();
        vec![open, done, trashed, other]
    }

    #[test]
    fn status_classes_partition_the_list() {
        let tasks = sample();
        let today = date("2024-01-01");
        let with = |status, only_active| Criteria {
            status,
            only_active,
            ..Criteria::default()
        };

        assert_eq!(ids(&apply(&tasks, &with(StatusClass::All, false), today)), vec![1, 2, 4]);
        assert_eq!(ids(&apply(&tasks, &with(StatusClass::All, true), today)), vec![1, 4]);
        assert_eq!(ids(&apply(&tasks, &with(StatusClass::Active, false), today)), vec![1, 4]);
        assert_eq!(ids(&apply(&tasks, &with(StatusClass::Done, false), today)), vec![2]);
        assert_eq!(ids(&apply(&tasks, &with(StatusClass::Deleted, true), today)), vec![3]);
    }

    #[test]
    fn project_and_search_narrow_the_view() {
        let tasks = sample();
        let today = date("2024-01-01");

        let by_project = Criteria {
            project: ProjectFilter::from_arg(Some("A block")),
            ..Criteria::default()
        };
        assert_eq!(ids(&apply(&tasks, &by_project, today)), vec![1]);

        let search = |q: &str| Criteria {
            query: q.into(),
            ..Criteria::default()
        };
        assert_eq!(ids(&apply(&tasks, &search("SHINGLE"), today)), vec![2]);
        assert_eq!(ids(&apply(&tasks, &search(" scaffold "), today)), vec![4]);
        assert_eq!(ids(&apply(&tasks, &search("b block"), today)), vec![4]);
        assert_eq!(ids(&apply(&tasks, &search(""), today)), vec![1, 2, 4]);
    }

    #[test]
    fn date_buckets_use_the_local_day() {
        let today = date("2024-05-10");
        let mut due_today = task(1, "today");
        due_today.due_date = Some(today);
        let mut due_soon = task(2, "in a week");
        due_soon.due_date = Some(date("2024-05-17"));
        let mut due_later = task(3, "eight days");
        due_later.due_date = Some(date("2024-05-18"));
        let undated = task(4, "whenever");
        let tasks = vec![due_today, due_soon, due_later, undated];

        let bucket = |date| Criteria {
            date,
            ..Criteria::default()
        };
        assert_eq!(ids(&apply(&tasks, &bucket(DateBucket::Today), today)), vec![1]);
        assert_eq!(ids(&apply(&tasks, &bucket(DateBucket::ThisWeek), today)), vec![1, 2]);
        assert_eq!(ids(&apply(&tasks, &bucket(DateBucket::All), today)).len(), 4);
    }

    #[test]
    fn due_date_sort_puts_undated_last() {
        let mut a = task(1, "undated");
        a.due_date = None;
        let mut b = task(2, "late");
        b.due_date = Some(date("2024-03-01"));
        let mut c = task(3, "early");
        c.due_date = Some(date("2024-02-01"));
        let d = task(4, "also undated");
        let tasks = vec![a, b, c, d];

        let criteria = Criteria {
            sort: SortMode::DueDate,
            ..Criteria::default()
        };
        assert_eq!(ids(&apply(&tasks, &criteria, date("2024-01-01"))), vec![3, 2, 1, 4]);
    }

    #[test]
    fn priority_sort_is_stable() {
        let mut tasks: Vec<Task> = (1..=5).map(|i| task(i, "t")).collect();
        tasks[0].priority = Priority::Low;
        tasks[2].priority = Priority::High;
        tasks[4].priority = Priority::High;

        let criteria = Criteria {
            sort: SortMode::Priority,
            ..Criteria::default()
        };
        assert_eq!(ids(&apply(&tasks, &criteria, date("2024-01-01"))), vec![3, 5, 2, 4, 1]);
    }

    #[test]
    fn open_first_and_created_sorts() {
        let mut tasks = sample();
        tasks.swap(0, 3);
        let today = date("2024-01-01");

        let open_first = Criteria {
            sort: SortMode::ActiveFirst,
            ..Criteria::default()
        };
        assert_eq!(ids(&apply(&tasks, &open_first, today)), vec![4, 1, 2]);
        assert_eq!(ids(&apply(&tasks, &Criteria::default(), today)), vec![1, 2, 4]);
    }

    #[test]
    fn applying_twice_gives_the_same_view() {
        let tasks = sample();
        let criteria = Criteria {
            sort: SortMode::Priority,
            query: "a".into(),
            ..Criteria::default()
        };
        let today = date("2024-01-01");
        assert_eq!(apply(&tasks, &criteria, today), apply(&tasks, &criteria, today));
    }
}
