use chrono::{Datelike, Days, Months, NaiveDate};

use crate::task::Repeat;

/// Due date of the follow-up instance of a repeating task.
///
/// Counts from the current due date, or from `today` when there is none.
/// Monthly repeats keep the day of month; a day the next month lacks spills
/// over into the month after (Jan 31 becomes Mar 2 or 3). Returns `None` for
/// `Repeat::None`.
pub fn next_due_date(repeat: Repeat, due: Option<NaiveDate>, today: NaiveDate) -> Option<NaiveDate> {
    let base = due.unwrap_or(today);
    match repeat {
        Repeat::None => None,
        Repeat::Daily => base.checked_add_days(Days::new(1)),
        Repeat::Weekly => base.checked_add_days(Days::new(7)),
        Repeat::Monthly => next_month(base),
    }
}

fn next_month(base: NaiveDate) -> Option<NaiveDate> {
    base.with_day(1)?
        .checked_add_months(Months::new(1))?
        .checked_add_days(Days::new(u64::from(base.day() - 1)))
}
