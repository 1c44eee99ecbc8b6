//! Chuẩn hóa chuỗi ngày tháng không đồng nhất thành một ngày cụ thể.
//!
//! Rules are tried in order and the first match wins:
//! `YYYY-M-D` → `YYYY-M` → `<Month> <D>, <YYYY>` → `<Month> <YYYY>` →
//! `YYYY` → `YYYY<anything>YYYY` → fallback date.
//!
//! The numeric rules are anchored and must run before the range rule, otherwise
//! a string such as `2017-2021` could be read as a year with an impossible month.

use chrono::{NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static NUMERIC_DAY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})-(\d{1,2})-(\d{1,2})$").expect("valid regex"));
static NUMERIC_MONTH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})-(\d{1,2})$").expect("valid regex"));
static MONTH_DAY_YEAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^([a-z]+)\.?\s+(\d{1,2})(?:st|nd|rd|th)?(?:\s*,\s*|\s+)(\d{4})$")
        .expect("valid regex")
});
static MONTH_YEAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^([a-z]+)\.?(?:\s*,\s*|\s+)(\d{4})$").expect("valid regex")
});
static BARE_YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{4})$").expect("valid regex"));
static YEAR_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|\D)(\d{4})\D+\d{4}(?:\D|$)").expect("valid regex")
});

/// Bảng tên tháng (chữ thường) → chỉ số tháng bắt đầu từ 0.
const MONTH_NAMES: [(&str, u32); 24] = [
    ("january", 0),
    ("jan", 0),
    ("february", 1),
    ("feb", 1),
    ("march", 2),
    ("mar", 2),
    ("april", 3),
    ("apr", 3),
    ("may", 4),
    ("june", 5),
    ("jun", 5),
    ("july", 6),
    ("jul", 6),
    ("august", 7),
    ("aug", 7),
    ("september", 8),
    ("sep", 8),
    ("sept", 8),
    ("october", 9),
    ("oct", 9),
    ("november", 10),
    ("nov", 10),
    ("december", 11),
    ("dec", 11),
];

/// Quy tắc nào đã tạo ra ngày chuẩn hóa.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DatePrecision {
    /// Ngày đầy đủ (số hoặc tên tháng).
    Day,
    /// Chỉ có tháng và năm, quy về ngày 1.
    Month,
    /// Chỉ có năm, quy về 1/1.
    Year,
    /// Khoảng năm, lấy 1/1 của năm đầu.
    Range,
    /// Không khớp mẫu nào, dùng ngày dự phòng.
    Fallback,
}

/// Kết quả chuẩn hóa một chuỗi ngày.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct NormalizedDate {
    pub date: NaiveDate,
    pub precision: DatePrecision,
}

impl NormalizedDate {
    /// `true` khi chuỗi gốc mô tả đúng một ngày cụ thể.
    pub fn was_exact(&self) -> bool {
        self.precision == DatePrecision::Day
    }

    /// `true` khi không mẫu nào khớp và ngày là giá trị dự phòng.
    pub fn is_fallback(&self) -> bool {
        self.precision == DatePrecision::Fallback
    }
}

/// Chuẩn hóa với ngày dự phòng là hôm nay (UTC).
pub fn normalize_date(text: &str) -> NormalizedDate {
    normalize_date_with_fallback(text, today())
}

/// Chuẩn hóa với ngày dự phòng do người gọi cung cấp.
pub fn normalize_date_with_fallback(text: &str, fallback: NaiveDate) -> NormalizedDate {
    let cleaned = text.trim();

    if let Some(normalized) = match_rules(cleaned) {
        return normalized;
    }

    tracing::warn!(raw = %cleaned, fallback = %fallback, "unparseable date, using fallback");
    NormalizedDate {
        date: fallback,
        precision: DatePrecision::Fallback,
    }
}

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn match_rules(text: &str) -> Option<NormalizedDate> {
    if text.is_empty() {
        return None;
    }

    if let Some(caps) = NUMERIC_DAY.captures(text) {
        let date = ymd(&caps[1], &caps[2], &caps[3]);
        if let Some(date) = date {
            return Some(exact(date, DatePrecision::Day));
        }
    }

    if let Some(caps) = NUMERIC_MONTH.captures(text) {
        if let Some(date) = ymd(&caps[1], &caps[2], "1") {
            return Some(exact(date, DatePrecision::Month));
        }
    }

    if let Some(caps) = MONTH_DAY_YEAR.captures(text) {
        if let Some(month) = month_index(&caps[1]) {
            let date = caps[3].parse::<i32>().ok().zip(caps[2].parse::<u32>().ok());
            if let Some(date) =
                date.and_then(|(year, day)| NaiveDate::from_ymd_opt(year, month + 1, day))
            {
                return Some(exact(date, DatePrecision::Day));
            }
        }
    }

    if let Some(caps) = MONTH_YEAR.captures(text) {
        if let Some(month) = month_index(&caps[1]) {
            if let Some(date) = caps[2]
                .parse::<i32>()
                .ok()
                .and_then(|year| NaiveDate::from_ymd_opt(year, month + 1, 1))
            {
                return Some(exact(date, DatePrecision::Month));
            }
        }
    }

    if let Some(caps) = BARE_YEAR.captures(text) {
        if let Some(date) = ymd(&caps[1], "1", "1") {
            return Some(exact(date, DatePrecision::Year));
        }
    }

    if let Some(caps) = YEAR_RANGE.captures(text) {
        if let Some(date) = ymd(&caps[1], "1", "1") {
            return Some(exact(date, DatePrecision::Range));
        }
    }

    None
}

fn exact(date: NaiveDate, precision: DatePrecision) -> NormalizedDate {
    NormalizedDate { date, precision }
}

fn ymd(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

/// Tra cứu tên tháng (không phân biệt hoa thường), trả về chỉ số bắt đầu từ 0.
pub fn month_index(name: &str) -> Option<u32> {
    let lower = name.to_lowercase();
    MONTH_NAMES
        .iter()
        .find(|(candidate, _)| *candidate == lower)
        .map(|(_, index)| *index)
}
