use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use corkboard_types::api::CountdownView;

const SECONDS_PER_DAY: i64 = 86_400;

/// Counts down to midnight UTC at the start of `target`.
#[derive(Debug, Clone, Copy)]
pub struct Countdown {
    target: NaiveDate,
}

impl Countdown {
    pub fn new(target: NaiveDate) -> Self {
        Self { target }
    }

    pub fn remaining(&self, now: DateTime<Utc>) -> CountdownView {
        let left = self.target.and_time(NaiveTime::MIN).and_utc() - now;
        CountdownView {
            target: self.target,
            // floored, so 36 hours past the target is day -2
            days: left.num_seconds().div_euclid(SECONDS_PER_DAY),
            seconds: left.num_seconds(),
        }
    }
}
