//! Logic lõi dựng timeline sự kiện có phân loại màu.

mod color;
mod date;
mod filter;
mod merge;
mod projection;
mod view;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub use color::{distinct_categories, CategoryColor, CategoryPalette, HslColor};
pub use date::{
    month_index, normalize_date, normalize_date_with_fallback, today, DatePrecision,
    NormalizedDate,
};
pub use filter::{ActiveCategories, RenderItem, Tooltip};
pub use merge::{merge_batches, MergeOutcome, SourceBatch};
pub use projection::{sort_chronologically, DisplayWindow};
pub use view::{TimelineRenderer, TimelineView};

/// Cấu hình khung hiển thị và bảng màu.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimelineConfig {
    /// Số tháng đệm trước/sau khoảng dữ liệu.
    pub window_padding_months: u32,
    pub color: ColorConfig,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            window_padding_months: 6,
            color: ColorConfig::default(),
        }
    }
}

/// Độ bão hòa và độ sáng cố định cho mọi loại.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ColorConfig {
    pub saturation: u8,
    pub lightness: u8,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            saturation: 70,
            lightness: 80,
        }
    }
}

/// Cấu hình một phần (từ JS hoặc file JSON), phủ lên giá trị mặc định.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ConfigOverrides {
    #[serde(default)]
    pub window_padding_months: Option<u32>,
    #[serde(default)]
    pub saturation: Option<u8>,
    #[serde(default)]
    pub lightness: Option<u8>,
}

impl ConfigOverrides {
    pub fn apply(self, base: &mut TimelineConfig) {
        if let Some(months) = self.window_padding_months {
            base.window_padding_months = months;
        }
        if let Some(saturation) = self.saturation {
            base.color.saturation = saturation;
        }
        if let Some(lightness) = self.lightness {
            base.color.lightness = lightness;
        }
    }
}

impl From<ConfigOverrides> for TimelineConfig {
    fn from(overrides: ConfigOverrides) -> Self {
        let mut base = TimelineConfig::default();
        overrides.apply(&mut base);
        base
    }
}

/// Một sự kiện hiển thị trên timeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventRecord {
    pub id: String,
    pub occurs_at: NaiveDate,
    pub precision: DatePrecision,
    pub raw_date_text: String,
    pub category: String,
    pub title: String,
    pub detail: String,
    pub source: String,
    #[serde(default)]
    pub display_color: Option<HslColor>,
}

impl EventRecord {
    pub fn new(
        id: impl Into<String>,
        occurs_at: NormalizedDate,
        raw_date_text: impl Into<String>,
        category: impl Into<String>,
        event_name: &str,
        detail: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        let category = category.into();
        let title = format_title(&category, event_name);
        Self {
            id: id.into(),
            occurs_at: occurs_at.date,
            precision: occurs_at.precision,
            raw_date_text: raw_date_text.into(),
            category,
            title,
            detail: detail.into(),
            source: source.into(),
            display_color: None,
        }
    }

    /// Bản sao mang id mới (dùng khi gộp nguồn).
    pub fn with_id(self, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..self
        }
    }

    /// Bản sao đã gắn màu.
    pub fn with_color(self, color: Option<HslColor>) -> Self {
        Self {
            display_color: color,
            ..self
        }
    }

    pub fn is_uncategorized(&self) -> bool {
        self.category.is_empty()
    }
}

/// `"[category] event"`, or just the event name when the record has no category.
pub fn format_title(category: &str, event_name: &str) -> String {
    if category.is_empty() {
        event_name.to_string()
    } else {
        format!("[{category}] {event_name}")
    }
}

/// Số liệu quan sát quá trình nạp dữ liệu.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoadStats {
    pub sources: usize,
    pub rows_seen: usize,
    pub rows_rejected: usize,
    pub date_fallbacks: usize,
    pub rekeyed_ids: usize,
}

impl LoadStats {
    /// Tỷ lệ bản ghi phải dùng ngày dự phòng.
    pub fn fallback_ratio(&self) -> f64 {
        let accepted = self.rows_seen.saturating_sub(self.rows_rejected);
        if accepted == 0 {
            0.0
        } else {
            self.date_fallbacks as f64 / accepted as f64
        }
    }
}

/// Tập làm việc cuối cùng: đã gộp, gắn màu và sắp xếp theo thời gian.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkingSet {
    records: Vec<EventRecord>,
    palette: CategoryPalette,
    window: DisplayWindow,
    stats: LoadStats,
}

impl WorkingSet {
    /// Gộp các lô theo thứ tự nguồn, gán màu, sắp xếp và tính khung hiển thị.
    pub fn from_batches(batches: Vec<SourceBatch>, config: &TimelineConfig) -> Self {
        Self::from_batches_at(batches, config, today())
    }

    /// Như [`WorkingSet::from_batches`] nhưng với "hôm nay" cố định.
    pub fn from_batches_at(
        batches: Vec<SourceBatch>,
        config: &TimelineConfig,
        today: NaiveDate,
    ) -> Self {
        let MergeOutcome { records, stats } = merge_batches(batches);

        let palette = CategoryPalette::from_records(&records, &config.color);
        let mut records: Vec<EventRecord> = records
            .into_iter()
            .map(|record| {
                let color = palette.color_for(&record.category);
                record.with_color(color)
            })
            .collect();
        sort_chronologically(&mut records);

        let window = DisplayWindow::around(&records, config.window_padding_months, today);

        tracing::info!(
            records = records.len(),
            categories = palette.len(),
            sources = stats.sources,
            rejected = stats.rows_rejected,
            date_fallbacks = stats.date_fallbacks,
            fallback_ratio = stats.fallback_ratio(),
            "working set built"
        );

        Self {
            records,
            palette,
            window,
            stats,
        }
    }

    /// Tập rỗng, dùng khi việc nạp dữ liệu thất bại.
    pub fn empty(config: &TimelineConfig) -> Self {
        Self::empty_at(config, today())
    }

    pub fn empty_at(config: &TimelineConfig, today: NaiveDate) -> Self {
        Self {
            records: Vec::new(),
            palette: CategoryPalette::default(),
            window: DisplayWindow::around(&[], config.window_padding_months, today),
            stats: LoadStats::default(),
        }
    }

    /// Bản ghi đã sắp xếp tăng dần theo `occurs_at`.
    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    pub fn palette(&self) -> &CategoryPalette {
        &self.palette
    }

    pub fn window(&self) -> DisplayWindow {
        self.window
    }

    pub fn stats(&self) -> LoadStats {
        self.stats
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&EventRecord> {
        self.records.iter().find(|record| record.id == id)
    }
}

/// Lỗi chung khi dựng timeline.
#[derive(Debug, thiserror::Error)]
pub enum TimelineError {
    #[error("Không đọc được nguồn dữ liệu {name}: {reason}")]
    SourceUnavailable { name: String, reason: String },
    #[error("Nguồn dữ liệu {name} không hợp lệ: {reason}")]
    InvalidSource { name: String, reason: String },
    #[error("Dòng {row} chỉ có {fields} cột (cần 4)")]
    MalformedRow { row: usize, fields: usize },
    #[error("Không tìm thấy vùng chứa timeline")]
    MissingContainer,
    #[error("Lỗi khác: {0}")]
    Other(String),
}
