//! Session state behind the terminal UI.
//!
//! Everything the view shows is derived from the repository on demand; the app
//! only remembers the selection, the filters, the form and what to tell the
//! user next.

use std::collections::HashSet;

use crate::clock::Clock;
use crate::dashboard::{Summary, Toggles};
use crate::error::{AppError, Result};
use crate::filter::{self, Criteria, ProjectFilter, StatusClass};
use crate::form::{Field, FormState, Submitted, TaskForm};
use crate::repository::TaskRepository;
use crate::share;
use crate::store::KeyValueStore;
use crate::task::{Task, TaskId};
use crate::theme::Theme;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Browse,
    Search,
    Form(Field),
    Confirm(Pending),
}

/// Destructive actions waiting for a yes/no.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pending {
    Trash(TaskId),
    Purge(TaskId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub text: String,
    pub error: bool,
}

pub struct App<S, C> {
    pub repo: TaskRepository<S, C>,
    pub criteria: Criteria,
    pub toggles: Toggles,
    pub theme: Theme,
    pub form: TaskForm,
    pub mode: Mode,
    pub notice: Option<Notice>,
    pub should_quit: bool,
    selected: Option<TaskId>,
    fresh: HashSet<TaskId>,
}

impl<S: KeyValueStore, C: Clock> App<S, C> {
    pub fn new(repo: TaskRepository<S, C>) -> Self {
        let theme = Theme::load(repo.store());
        Self {
            repo,
            criteria: Criteria::default(),
            toggles: Toggles::default(),
            theme,
            form: TaskForm::new(),
            mode: Mode::Browse,
            notice: None,
            should_quit: false,
            selected: None,
            fresh: HashSet::new(),
        }
    }

    pub fn view(&self) -> Vec<&Task> {
        filter::apply(self.repo.tasks(), &self.criteria, self.repo.clock().today())
    }

    pub fn summary(&self) -> Summary {
        Summary::compute(self.repo.tasks(), self.toggles, self.repo.clock().today())
    }

    /// Ids created since the previous call. The view highlights them once.
    pub fn take_fresh(&mut self) -> HashSet<TaskId> {
        std::mem::take(&mut self.fresh)
    }

    pub fn selected(&self) -> Option<TaskId> {
        self.selected
    }

    pub fn selected_task(&self) -> Option<&Task> {
        self.selected.and_then(|id| self.repo.get(id))
    }

    /// Position of the selection in the current view, if it is visible.
    pub fn selected_index(&self) -> Option<usize> {
        let id = self.selected?;
        self.view().iter().position(|t| t.id == id)
    }

    pub fn select(&mut self, id: Option<TaskId>) {
        self.selected = id;
    }

    pub fn select_next(&mut self) {
        self.move_selection(1);
    }

    pub fn select_prev(&mut self) {
        self.move_selection(-1);
    }

    fn move_selection(&mut self, step: isize) {
        let ids: Vec<TaskId> = self.view().iter().map(|t| t.id).collect();
        if ids.is_empty() {
            self.selected = None;
            return;
        }
        let next = match self.selected.and_then(|id| ids.iter().position(|i| *i == id)) {
            Some(pos) => (pos as isize + step).clamp(0, ids.len() as isize - 1) as usize,
            None => 0,
        };
        self.selected = Some(ids[next]);
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
        self.form.clear();
    }

    /// The selected id, provided it still exists.
    fn require_selected(&self) -> Result<TaskId> {
        let id = self.selected.ok_or(AppError::NothingSelected)?;
        if !self.repo.contains(id) {
            return Err(AppError::TaskNotFound(id));
        }
        Ok(id)
    }

    fn info(&mut self, text: impl Into<String>) {
        self.notice = Some(Notice {
            text: text.into(),
            error: false,
        });
    }

    fn report(&mut self, err: AppError) {
        tracing::warn!("Action failed: {}", err);
        self.notice = Some(Notice {
            text: err.to_string(),
            error: true,
        });
    }

    /// Drops the selection and editing state if their task is gone.
    fn forget_missing(&mut self) {
        if self.selected.is_some_and(|id| !self.repo.contains(id)) {
            self.selected = None;
        }
        if let FormState::Editing(id) = self.form.state {
            if !self.repo.contains(id) {
                self.form.clear();
            }
        }
    }

    pub fn toggle_done(&mut self) {
        let result = self
            .require_selected()
            .and_then(|id| self.repo.toggle_done(id));
        match result {
            Ok(toggled) => {
                let verb = if toggled.task.done { "Completed" } else { "Reopened" };
                match toggled.follow_up {
                    Some(next) => {
                        self.fresh.insert(next.id);
                        let due = next
                            .due_date
                            .map(|d| d.to_string())
                            .unwrap_or_else(|| "-".into());
                        self.info(format!("{verb} \"{}\"; next one due {due}", toggled.task.title));
                    }
                    None => self.info(format!("{verb} \"{}\"", toggled.task.title)),
                }
            }
            Err(err) => self.report(err),
        }
    }

    /// Asks before trashing, or before purging when the trash is on screen.
    pub fn request_delete(&mut self) {
        match self.require_selected() {
            Ok(id) if self.criteria.status == StatusClass::Deleted => {
                self.mode = Mode::Confirm(Pending::Purge(id));
            }
            Ok(id) => self.mode = Mode::Confirm(Pending::Trash(id)),
            Err(err) => self.report(err),
        }
    }

    pub fn confirm(&mut self, yes: bool) {
        let Mode::Confirm(pending) = self.mode else {
            return;
        };
        self.mode = Mode::Browse;
        if !yes {
            return;
        }
        let result = match pending {
            Pending::Trash(id) => self.repo.soft_delete(id).map(|()| "Moved to trash"),
            Pending::Purge(id) => self.repo.purge(id).map(|_| "Deleted for good"),
        };
        match result {
            Ok(text) => {
                self.clear_selection();
                self.info(text);
            }
            Err(err) => self.report(err),
        }
        self.forget_missing();
    }

    pub fn restore_selected(&mut self) {
        let result = self
            .require_selected()
            .and_then(|id| self.repo.restore(id));
        match result {
            Ok(()) => self.info("Restored from trash"),
            Err(err) => self.report(err),
        }
    }

    pub fn start_new(&mut self) {
        self.form.clear();
        self.mode = Mode::Form(Field::Title);
    }

    pub fn start_edit(&mut self) {
        let result = self.require_selected();
        match result {
            Ok(id) => {
                if let Some(task) = self.repo.get(id) {
                    self.form = TaskForm::edit(task);
                }
                self.mode = Mode::Form(Field::Title);
            }
            Err(err) => self.report(err),
        }
    }

    pub fn cancel_form(&mut self) {
        self.mode = Mode::Browse;
    }

    pub fn submit_form(&mut self) {
        match self.form.submit(&mut self.repo) {
            Ok(Submitted::Created(id)) => {
                self.fresh.insert(id);
                self.selected = None;
                self.mode = Mode::Browse;
                let link = self.repo.get(id).and_then(share::share_link);
                match link {
                    Some(link) => self.info(format!("Task saved. Share: {link}")),
                    None => self.info("Task saved"),
                }
            }
            Ok(Submitted::Updated(id)) => {
                self.selected = Some(id);
                self.mode = Mode::Browse;
                self.info("Task updated");
            }
            Err(err) => self.report(err),
        }
        self.forget_missing();
    }

    pub fn share_selected(&mut self) {
        let link = self.require_selected().map(|id| self.repo.get(id).and_then(share::share_link));
        match link {
            Ok(Some(link)) => self.info(link),
            Ok(None) => {
                self.notice = Some(Notice {
                    text: "No responsible phone number on this task".into(),
                    error: true,
                });
            }
            Err(err) => self.report(err),
        }
    }

    pub fn cycle_status(&mut self) {
        self.criteria.status = self.criteria.status.next();
    }

    pub fn cycle_date(&mut self) {
        self.criteria.date = self.criteria.date.next();
    }

    pub fn cycle_sort(&mut self) {
        self.criteria.sort = self.criteria.sort.next();
    }

    /// All, then each known project in order, then back to all.
    pub fn cycle_project(&mut self) {
        let names = self.repo.project_names();
        let next = match &self.criteria.project {
            ProjectFilter::All => names.first().cloned(),
            ProjectFilter::Named(current) => names
                .iter()
                .position(|n| n == current)
                .and_then(|pos| names.get(pos + 1))
                .cloned(),
        };
        self.criteria.project = next.map_or(ProjectFilter::All, ProjectFilter::Named);
    }

    pub fn toggle_only_active(&mut self) {
        self.criteria.only_active = !self.criteria.only_active;
    }

    pub fn toggle_include_done(&mut self) {
        self.toggles.include_done = !self.toggles.include_done;
    }

    pub fn toggle_include_deleted(&mut self) {
        self.toggles.include_deleted = !self.toggles.include_deleted;
    }

    pub fn toggle_theme(&mut self) {
        self.theme = self.theme.toggled();
        self.theme.save(self.repo.store());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::config::THEME_KEY;
    use crate::store::MemoryStore;
    use crate::task::{Repeat, TaskDraft};

    fn clock() -> FixedClock {
        FixedClock::new(10_000, "2024-01-01".parse().unwrap())
    }

    fn app<'a>(store: &'a MemoryStore, clock: &'a FixedClock) -> App<&'a MemoryStore, &'a FixedClock> {
        App::new(TaskRepository::load(store, clock))
    }

    fn add(app: &mut App<&MemoryStore, &FixedClock>, title: &str) -> TaskId {
        app.repo.create(TaskDraft::titled(title), vec![]).unwrap().id
    }

    #[test]
    fn actions_without_selection_report_instead_of_failing() {
        let store = MemoryStore::new();
        let clock = clock();
        let mut app = app(&store, &clock);

        app.toggle_done();
        assert_eq!(
            app.notice,
            Some(Notice {
                text: AppError::NothingSelected.to_string(),
                error: true
            })
        );

        app.select(Some(TaskId(99)));
        app.request_delete();
        assert_eq!(app.mode, Mode::Browse);
        assert!(app.notice.as_ref().unwrap().error);
    }

    #[test]
    fn delete_trashes_then_purges_from_the_trash_view() {
        let store = MemoryStore::new();
        let clock = clock();
        let mut app = app(&store, &clock);
        let id = add(&mut app, "Leaky valley");

        app.select(Some(id));
        app.request_delete();
        assert_eq!(app.mode, Mode::Confirm(Pending::Trash(id)));
        app.confirm(true);
        assert!(app.repo.get(id).unwrap().deleted);
        assert_eq!(app.selected(), None);

        app.criteria.status = StatusClass::Deleted;
        app.select_next();
        assert_eq!(app.selected(), Some(id));
        app.request_delete();
        assert_eq!(app.mode, Mode::Confirm(Pending::Purge(id)));
        app.confirm(true);
        assert!(app.repo.tasks().is_empty());
    }

    #[test]
    fn declining_confirmation_changes_nothing() {
        let store = MemoryStore::new();
        let clock = clock();
        let mut app = app(&store, &clock);
        let id = add(&mut app, "Keep me");

        app.select(Some(id));
        app.request_delete();
        app.confirm(false);
        assert!(!app.repo.get(id).unwrap().deleted);
        assert_eq!(app.mode, Mode::Browse);
    }

    #[test]
    fn new_tasks_are_fresh_for_one_take() {
        let store = MemoryStore::new();
        let clock = clock();
        let mut app = app(&store, &clock);

        app.start_new();
        app.form.title = "Inspect chimney".into();
        app.submit_form();
        let id = app.repo.tasks()[0].id;

        assert_eq!(app.mode, Mode::Browse);
        assert!(app.take_fresh().contains(&id));
        assert!(app.take_fresh().is_empty());
    }

    #[test]
    fn new_task_with_a_phone_offers_its_share_link() {
        let store = MemoryStore::new();
        let clock = clock();
        let mut app = app(&store, &clock);

        app.start_new();
        app.form.title = "Send quote".into();
        app.form.responsible_phone = "+995 555 12 34 56".into();
        app.submit_form();

        let notice = app.notice.clone().unwrap();
        assert!(!notice.error);
        assert!(notice.text.starts_with("Task saved. Share: https://wa.me/995555123456?text="));

        app.start_new();
        app.form.title = "No phone".into();
        app.submit_form();
        assert_eq!(app.notice.unwrap().text, "Task saved");
    }

    #[test]
    fn follow_ups_are_fresh_too() {
        let store = MemoryStore::new();
        let clock = clock();
        let mut app = app(&store, &clock);
        let mut draft = TaskDraft::titled("Weekly check");
        draft.repeat = Repeat::Weekly;
        let id = app.repo.create(draft, vec![]).unwrap().id;
        app.take_fresh();

        app.select(Some(id));
        app.toggle_done();
        assert_eq!(app.take_fresh().len(), 1);
        assert_eq!(app.repo.tasks().len(), 2);
    }

    #[test]
    fn failed_submit_stays_in_the_form() {
        let store = MemoryStore::new();
        let clock = clock();
        let mut app = app(&store, &clock);

        app.start_new();
        app.form.title = "Bad dates".into();
        app.form.start_date = "2024-02-10".into();
        app.form.due_date = "2024-02-01".into();
        app.submit_form();

        assert_eq!(app.mode, Mode::Form(Field::Title));
        assert!(app.notice.as_ref().unwrap().error);
        assert!(app.repo.tasks().is_empty());
    }

    #[test]
    fn selection_moves_within_the_view() {
        let store = MemoryStore::new();
        let clock = clock();
        let mut app = app(&store, &clock);
        let a = add(&mut app, "a");
        let b = add(&mut app, "b");

        app.select_prev();
        assert_eq!(app.selected(), Some(a));
        app.select_next();
        app.select_next();
        assert_eq!(app.selected(), Some(b));
        assert_eq!(app.selected_index(), Some(1));
    }

    #[test]
    fn project_filter_cycles_through_known_projects() {
        let store = MemoryStore::new();
        let clock = clock();
        let mut app = app(&store, &clock);
        for project in ["B", "A"] {
            let mut draft = TaskDraft::titled("t");
            draft.project = project.into();
            app.repo.create(draft, vec![]).unwrap();
        }

        app.cycle_project();
        assert_eq!(app.criteria.project, ProjectFilter::Named("A".into()));
        app.cycle_project();
        assert_eq!(app.criteria.project, ProjectFilter::Named("B".into()));
        app.cycle_project();
        assert_eq!(app.criteria.project, ProjectFilter::All);
    }

    #[test]
    fn theme_toggle_is_saved_to_the_store() {
        let store = MemoryStore::with_entry(THEME_KEY, "dark");
        let clock = clock();
        let mut app = app(&store, &clock);
        assert_eq!(app.theme, Theme::Dark);

        app.toggle_theme();
        assert_eq!(store.get(THEME_KEY).unwrap().as_deref(), Some("light"));
    }

    #[test]
    fn share_needs_a_phone_number() {
        let store = MemoryStore::new();
        let clock = clock();
        let mut app = app(&store, &clock);
        let mut draft = TaskDraft::titled("Send quote");
        draft.responsible_phone = "555 0101".into();
        let with_phone = app.repo.create(draft, vec![]).unwrap().id;
        let without = add(&mut app, "No phone");

        app.select(Some(with_phone));
        app.share_selected();
        assert!(app.notice.as_ref().unwrap().text.starts_with("https://wa.me/5550101"));

        app.select(Some(without));
        app.share_selected();
        assert!(app.notice.as_ref().unwrap().error);
    }
}
