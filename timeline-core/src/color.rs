//! Gán màu HSL cố định cho từng loại sự kiện.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{ColorConfig, EventRecord};

/// Màu theo mô hình hue/saturation/lightness.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct HslColor {
    pub hue: f64,
    pub saturation: u8,
    pub lightness: u8,
}

impl HslColor {
    /// Chuỗi CSS, ví dụ `hsl(120, 70%, 80%)`.
    pub fn css(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for HslColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hsl({}, {}%, {}%)",
            self.hue, self.saturation, self.lightness
        )
    }
}

/// Bảng màu theo thứ tự xuất hiện đầu tiên của từng loại.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CategoryPalette {
    entries: Vec<CategoryColor>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryColor {
    pub category: String,
    pub color: HslColor,
}

impl CategoryPalette {
    /// Category `i` of `n` gets hue `i * (360 / n)`. `categories` must already be distinct.
    pub fn from_categories<S: AsRef<str>>(categories: &[S], config: &ColorConfig) -> Self {
        let total = categories.len();
        let step = if total == 0 { 0.0 } else { 360.0 / total as f64 };

        let entries = categories
            .iter()
            .enumerate()
            .map(|(index, category)| CategoryColor {
                category: category.as_ref().to_string(),
                color: HslColor {
                    hue: index as f64 * step,
                    saturation: config.saturation,
                    lightness: config.lightness,
                },
            })
            .collect();

        Self { entries }
    }

    /// Dựng bảng màu trực tiếp từ danh sách bản ghi.
    pub fn from_records(records: &[EventRecord], config: &ColorConfig) -> Self {
        Self::from_categories(&distinct_categories(records), config)
    }

    pub fn color_for(&self, category: &str) -> Option<HslColor> {
        self.entries
            .iter()
            .find(|entry| entry.category == category)
            .map(|entry| entry.color)
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.category.as_str())
    }

    pub fn entries(&self) -> &[CategoryColor] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Các loại không rỗng, giữ thứ tự xuất hiện đầu tiên.
pub fn distinct_categories(records: &[EventRecord]) -> Vec<String> {
    let mut seen = HashSet::new();
    records
        .iter()
        .map(|record| record.category.as_str())
        .filter(|category| !category.is_empty())
        .filter(|category| seen.insert(*category))
        .map(str::to_string)
        .collect()
}
