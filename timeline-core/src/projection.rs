//! Sắp xếp theo thời gian và tính khung hiển thị gợi ý.

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::EventRecord;

/// Khoảng thời gian gợi ý cho renderer; không dùng để lọc bản ghi.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DisplayWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DisplayWindow {
    /// Pads the data span (or `today` when there is no data) by `padding_months`
    /// on each side, snapping both ends to the first of the month.
    pub fn around(records: &[EventRecord], padding_months: u32, today: NaiveDate) -> Self {
        let earliest = records.iter().map(|r| r.occurs_at).min().unwrap_or(today);
        let latest = records.iter().map(|r| r.occurs_at).max().unwrap_or(today);
        let padding = Months::new(padding_months);

        let start_month = first_of_month(earliest);
        let end_month = first_of_month(latest);

        Self {
            start: start_month.checked_sub_months(padding).unwrap_or(start_month),
            end: end_month.checked_add_months(padding).unwrap_or(end_month),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Sắp xếp ổn định tăng dần theo `occurs_at`.
pub fn sort_chronologically(records: &mut [EventRecord]) {
    records.sort_by_key(|record| record.occurs_at);
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}
