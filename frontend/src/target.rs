//! Target tracker: progress, remaining amount and countdown for the savings
//! goal.
//!
//! The countdown window is `start_date .. start_date + target_months`, with
//! both ends taken at UTC midnight. Saving new settings restarts the window
//! from the save date.

use chrono::{DateTime, Months, NaiveDate, NaiveTime, TimeZone, Utc};

use crate::error::ValidationError;
use crate::model::{Target, TargetId};

/// Goal used when no target row exists yet.
pub const DEFAULT_TARGET_AMOUNT: i64 = 10_000_000;
pub const DEFAULT_TARGET_MONTHS: u32 = 6;

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Validated amount/duration pair submitted from the settings form.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GoalSettings {
    target_amount: i64,
    target_months: u32,
}

impl GoalSettings {
    pub fn new(target_amount: i64, target_months: u32) -> Result<Self, ValidationError> {
        if target_amount <= 0 {
            return Err(ValidationError::NonPositiveTarget);
        }
        if target_months == 0 {
            return Err(ValidationError::NonPositiveMonths);
        }
        Ok(Self {
            target_amount,
            target_months,
        })
    }

    pub fn target_amount(self) -> i64 {
        self.target_amount
    }

    pub fn target_months(self) -> u32 {
        self.target_months
    }
}

/// The goal currently in force, either loaded from the gateway or defaulted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TargetSettings {
    /// `None` until the first settings save creates a row.
    pub id: Option<TargetId>,
    pub target_amount: i64,
    pub target_months: u32,
    pub start_date: NaiveDate,
}

impl TargetSettings {
    pub fn default_from(today: NaiveDate) -> Self {
        Self {
            id: None,
            target_amount: DEFAULT_TARGET_AMOUNT,
            target_months: DEFAULT_TARGET_MONTHS,
            start_date: today,
        }
    }

    pub fn end_date(&self) -> NaiveDate {
        end_date(self.start_date, self.target_months)
    }

    pub fn progress(&self, balance: i64, now: DateTime<Utc>) -> TargetProgress {
        TargetProgress::compute(
            self.target_amount,
            self.target_months,
            self.start_date,
            balance,
            now,
        )
    }
}

impl From<&Target> for TargetSettings {
    fn from(target: &Target) -> Self {
        Self {
            id: Some(target.id.clone()),
            target_amount: target.target_amount,
            target_months: target.target_months,
            start_date: target.start_date,
        }
    }
}

/// `start + months` calendar months; days past the end of the resulting month
/// clamp to its last day.
pub fn end_date(start: NaiveDate, months: u32) -> NaiveDate {
    start
        .checked_add_months(Months::new(months))
        .unwrap_or(NaiveDate::MAX)
}

fn midnight_utc(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::default()))
}

#[derive(Clone, Debug, PartialEq)]
pub struct TargetProgress {
    /// Unbounded; may exceed 100 or go negative.
    pub progress_percent: f64,
    pub end_date: NaiveDate,
    pub is_achieved: bool,
    pub remaining_days: i64,
    pub remaining_amount: i64,
}

impl TargetProgress {
    pub fn compute(
        target_amount: i64,
        target_months: u32,
        start_date: NaiveDate,
        balance: i64,
        now: DateTime<Utc>,
    ) -> Self {
        let progress_percent = if target_amount > 0 {
            balance as f64 / target_amount as f64 * 100.0
        } else {
            0.0
        };
        let end_date = end_date(start_date, target_months);
        let is_achieved = balance >= target_amount;

        let remaining_days = if is_achieved {
            0
        } else {
            let millis = (midnight_utc(end_date) - now).num_milliseconds();
            if millis <= 0 {
                0
            } else {
                (millis + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY
            }
        };
        let remaining_amount = if is_achieved {
            0
        } else {
            target_amount - balance
        };

        Self {
            progress_percent,
            end_date,
            is_achieved,
            remaining_days,
            remaining_amount,
        }
    }

    /// Width of the progress bar, in percent.
    pub fn display_percent(&self) -> f64 {
        self.progress_percent.clamp(0.0, 100.0)
    }

    pub fn is_overdue(&self) -> bool {
        !self.is_achieved && self.remaining_days == 0
    }
}
