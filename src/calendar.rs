use crate::error::{ScheduleError, ScheduleResult};
use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Working-day calendar used to turn simulated durations into dates.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkCalendar {
    holidays: HashSet<NaiveDate>,
    non_working_days: HashSet<Weekday>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkCalendarConfig {
    working_days: Vec<Weekday>,
    #[serde(default)]
    holidays: Vec<NaiveDate>,
}

impl WorkCalendar {
    const ALL_WEEKDAYS: [Weekday; 7] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];

    pub fn from_config(config: &WorkCalendarConfig) -> ScheduleResult<Self> {
        let working_set: HashSet<Weekday> = config.working_days.iter().copied().collect();
        if working_set.is_empty() {
            return Err(ScheduleError::InvalidConfig(
                "calendar requires at least one working day".into(),
            ));
        }
        let non_working_days = Self::ALL_WEEKDAYS
            .into_iter()
            .filter(|day| !working_set.contains(day))
            .collect();

        Ok(Self {
            holidays: config.holidays.iter().copied().collect(),
            non_working_days,
        })
    }

    pub fn is_available(&self, date: NaiveDate) -> bool {
        !self.holidays.contains(&date) && !self.non_working_days.contains(&date.weekday())
    }

    /// First available date on or after `from`, or `None` past the end of
    /// the representable date range.
    pub fn first_available(&self, from: NaiveDate) -> Option<NaiveDate> {
        let mut current = from;
        while !self.is_available(current) {
            current = current.succ_opt()?;
        }
        Some(current)
    }

    /// Date on which a piece of work of `duration` working days finishes when
    /// it starts on `start`. Fractional days round up; the start day counts
    /// as the first working day. `None` when the finish falls outside the
    /// date range chrono can represent.
    pub fn finish_date(&self, start: NaiveDate, duration: f64) -> Option<NaiveDate> {
        let first = self.first_available(start)?;
        let days = if duration.is_finite() && duration > 0.0 {
            duration.ceil()
        } else {
            0.0
        };
        // Each working day consumes at least one calendar day.
        if days > (NaiveDate::MAX - first).num_days() as f64 + 1.0 {
            return None;
        }
        let days = days as i64;

        let mut current = first;
        let mut count = 1;
        while count < days {
            current = current.succ_opt()?;
            if self.is_available(current) {
                count += 1;
            }
        }
        Some(current)
    }
}

impl WorkCalendarConfig {
    pub fn new<I, J>(working_days: I, holidays: J) -> Self
    where
        I: IntoIterator<Item = Weekday>,
        J: IntoIterator<Item = NaiveDate>,
    {
        let mut working: Vec<Weekday> = working_days.into_iter().collect();
        working.sort_by_key(|wd| wd.num_days_from_monday());
        working.dedup_by(|a, b| a.num_days_from_monday() == b.num_days_from_monday());

        let mut holidays: Vec<NaiveDate> = holidays.into_iter().collect();
        holidays.sort();
        holidays.dedup();

        Self {
            working_days: working,
            holidays,
        }
    }

    pub fn working_days(&self) -> &[Weekday] {
        &self.working_days
    }

    pub fn holidays(&self) -> &[NaiveDate] {
        &self.holidays
    }
}

/// Monday to Friday, no holidays.
impl Default for WorkCalendarConfig {
    fn default() -> Self {
        Self::new(
            [
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
            ],
            [],
        )
    }
}
