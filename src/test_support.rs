//! Test doubles shared by unit and integration tests.

use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Local, NaiveDateTime, TimeDelta, TimeZone, Utc};
use mockable::Clock;

/// Clock frozen at a chosen local time until advanced.
pub struct ManualClock(Mutex<DateTime<Local>>);

impl ManualClock {
    pub fn new(now: DateTime<Local>) -> Self {
        Self(Mutex::new(now))
    }

    /// Freeze at a naive local wall-clock time.
    pub fn at(now: NaiveDateTime) -> Self {
        match Local.from_local_datetime(&now).earliest() {
            Some(local) => Self::new(local),
            None => panic!("local time does not exist: {now}"),
        }
    }

    pub fn advance_hours(&self, hours: i64) {
        *self.lock_clock() += TimeDelta::hours(hours);
    }

    pub fn advance_days(&self, days: i64) {
        *self.lock_clock() += TimeDelta::days(days);
    }

    fn lock_clock(&self) -> MutexGuard<'_, DateTime<Local>> {
        match self.0.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("clock mutex"),
        }
    }
}

impl Clock for ManualClock {
    fn local(&self) -> DateTime<Local> {
        *self.lock_clock()
    }

    fn utc(&self) -> DateTime<Utc> {
        self.local().with_timezone(&Utc)
    }
}
