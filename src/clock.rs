use std::cell::Cell;

use chrono::{Local, NaiveDate};

/// Source of "now" for ids and of the local calendar day for date buckets.
pub trait Clock {
    fn now_millis(&self) -> i64;
    fn today(&self) -> NaiveDate;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Local::now().timestamp_millis()
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct FixedClock {
    millis: Cell<i64>,
    today: Cell<NaiveDate>,
}

impl FixedClock {
    pub fn new(millis: i64, today: NaiveDate) -> Self {
        Self {
            millis: Cell::new(millis),
            today: Cell::new(today),
        }
    }

    pub fn advance(&self, millis: i64) {
        self.millis.set(self.millis.get() + millis);
    }

    pub fn set_today(&self, today: NaiveDate) {
        self.today.set(today);
    }
}

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.millis.get()
    }

    fn today(&self) -> NaiveDate {
        self.today.get()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_millis(&self) -> i64 {
        (**self).now_millis()
    }

    fn today(&self) -> NaiveDate {
        (**self).today()
    }
}
