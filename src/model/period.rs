//! The month/year pair that scopes every transaction query, and the cursor that navigates it.

use crate::error::{tagged, ErrorType};
use crate::Result;
use chrono::{Datelike, Local, NaiveDate};
use serde::Serialize;
use std::fmt::{Display, Formatter};
use tracing::warn;

/// How many years before and after the current one can be picked directly.
const SELECTABLE_YEARS_RADIUS: i32 = 5;

const MONTH_NAMES: [&str; 12] = [
    "Janeiro",
    "Fevereiro",
    "Março",
    "Abril",
    "Maio",
    "Junho",
    "Julho",
    "Agosto",
    "Setembro",
    "Outubro",
    "Novembro",
    "Dezembro",
];

/// A calendar month. `month` is always in `1..=12`; `year` is unbounded.
///
/// Field order makes the derived ordering chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Period {
    year: i32,
    month: u32,
}

impl Period {
    /// Creates a period, failing if `month` is outside `1..=12`.
    pub fn new(month: u32, year: i32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(tagged(
                ErrorType::ValidationFailed,
                format!("Month must be between 1 and 12, got {month}"),
            ));
        }
        Ok(Self { year, month })
    }

    /// The period that contains `date`.
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The period containing today's local date.
    pub fn current() -> Self {
        Self::containing(Local::now().date_naive())
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// The month as the two-digit string the summary endpoint expects, e.g. `03`.
    pub fn padded_month(&self) -> String {
        format!("{:02}", self.month)
    }

    /// The pt-BR name of the month, e.g. `Março`.
    pub fn month_name(&self) -> &'static str {
        MONTH_NAMES[(self.month - 1) as usize]
    }

    /// The following month, rolling December over into January of the next year. December of
    /// `i32::MAX` has no successor and is returned unchanged.
    pub fn next(&self) -> Self {
        if self.month == 12 {
            match self.year.checked_add(1) {
                Some(year) => Self { year, month: 1 },
                None => {
                    warn!("There is no month after {self}");
                    *self
                }
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// The preceding month, rolling January back into December of the previous year. January of
    /// `i32::MIN` has no predecessor and is returned unchanged.
    pub fn previous(&self) -> Self {
        if self.month == 1 {
            match self.year.checked_sub(1) {
                Some(year) => Self { year, month: 12 },
                None => {
                    warn!("There is no month before {self}");
                    *self
                }
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    /// True if `date` falls within this period.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

impl Display for Period {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}/{}", self.month, self.year)
    }
}

/// Holds the selected period and moves it around.
///
/// Stepping with `advance` and `retreat` is unbounded, while `selectable_years` is a fixed window
/// around the year the cursor was created in, meant only for direct selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodCursor {
    period: Period,
    selectable_years: Vec<i32>,
}

impl PeriodCursor {
    /// Creates a cursor positioned at the month of `today`.
    pub fn new(today: NaiveDate) -> Self {
        let year = today.year();
        Self {
            period: Period::containing(today),
            selectable_years: (year - SELECTABLE_YEARS_RADIUS..=year + SELECTABLE_YEARS_RADIUS)
                .collect(),
        }
    }

    /// Creates a cursor positioned at the current local month.
    pub fn now() -> Self {
        Self::new(Local::now().date_naive())
    }

    pub fn period(&self) -> Period {
        self.period
    }

    pub fn month(&self) -> u32 {
        self.period.month
    }

    pub fn year(&self) -> i32 {
        self.period.year
    }

    pub fn advance(&mut self) -> Period {
        self.period = self.period.next();
        self.period
    }

    pub fn retreat(&mut self) -> Period {
        self.period = self.period.previous();
        self.period
    }

    /// Selects `month` of the current year. Months outside `1..=12` are rejected and leave the
    /// cursor where it was.
    pub fn set_month(&mut self, month: u32) -> Result<Period> {
        self.period = Period::new(month, self.period.year)?;
        Ok(self.period)
    }

    /// Selects `year`, keeping the month. Any year is accepted.
    pub fn set_year(&mut self, year: i32) -> Period {
        self.period.year = year;
        self.period
    }

    /// The years offered for direct selection.
    pub fn selectable_years(&self) -> &[i32] {
        &self.selectable_years
    }
}
