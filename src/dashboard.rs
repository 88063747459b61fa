//! Counts and money totals for the dashboard and status bar.

use chrono::NaiveDate;

use crate::task::{Priority, Task};

/// What the money totals take into account. Independent of the list filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Toggles {
    pub include_done: bool,
    pub include_deleted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Summary {
    /// Tasks not in the trash.
    pub total: usize,
    pub active: usize,
    pub done: usize,
    pub overdue: usize,
    pub due_today: usize,
    pub due_this_week: usize,
    pub high: usize,
    pub normal: usize,
    pub low: usize,
    /// Sum over open tasks.
    pub active_amount: f64,
    /// Sum over everything the toggles let in.
    pub total_amount: f64,
}

impl Summary {
    pub fn compute(tasks: &[Task], toggles: Toggles, today: NaiveDate) -> Self {
        let mut summary = Summary::default();

        for task in tasks {
            if !task.deleted {
                summary.total += 1;
                if task.done {
                    summary.done += 1;
                }
            }

            if task.is_active() {
                summary.active += 1;
                match task.priority {
                    Priority::High => summary.high += 1,
                    Priority::Normal => summary.normal += 1,
                    Priority::Low => summary.low += 1,
                }
                if task.is_overdue(today) {
                    summary.overdue += 1;
                }
                if task.is_due_today(today) {
                    summary.due_today += 1;
                }
                if task.is_due_this_week(today) {
                    summary.due_this_week += 1;
                }
            }

            let counted = toggles.include_deleted || !task.deleted;
            if counted && !task.done {
                summary.active_amount += amount_of(task);
            }
            if counted && (toggles.include_done || !task.done) {
                summary.total_amount += amount_of(task);
            }
        }

        summary
    }
}

fn amount_of(task: &Task) -> f64 {
    task.amount.filter(|a| a.is_finite()).unwrap_or(0.0)
}
