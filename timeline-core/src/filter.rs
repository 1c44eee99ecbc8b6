//! Lọc theo loại sự kiện và dữ liệu trao cho renderer.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{CategoryPalette, EventRecord, WorkingSet};

/// Tập loại đang bật. Truyền tường minh vào bộ lọc, không phải trạng thái toàn cục.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct ActiveCategories(BTreeSet<String>);

impl ActiveCategories {
    /// Mọi loại trong bảng màu đều bật (trạng thái ban đầu).
    pub fn all(palette: &CategoryPalette) -> Self {
        Self(palette.categories().map(str::to_string).collect())
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn set(&mut self, category: &str, enabled: bool) {
        if enabled {
            self.0.insert(category.to_string());
        } else {
            self.0.remove(category);
        }
    }

    /// Đảo trạng thái, trả về trạng thái mới.
    pub fn toggle(&mut self, category: &str) -> bool {
        let enabled = !self.contains(category);
        self.set(category, enabled);
        enabled
    }

    pub fn contains(&self, category: &str) -> bool {
        self.0.contains(category)
    }

    /// Records without a category cannot be toggled and always pass.
    pub fn admits(&self, record: &EventRecord) -> bool {
        record.is_uncategorized() || self.contains(&record.category)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for ActiveCategories {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Một mục giao cho widget timeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RenderItem {
    pub id: String,
    pub start: NaiveDate,
    pub content: String,
    pub detail: String,
    pub category: String,
    pub display_color: Option<String>,
}

impl From<&EventRecord> for RenderItem {
    fn from(record: &EventRecord) -> Self {
        Self {
            id: record.id.clone(),
            start: record.occurs_at,
            content: record.title.clone(),
            detail: record.detail.clone(),
            category: record.category.clone(),
            display_color: record.display_color.map(|color| color.css()),
        }
    }
}

/// Nội dung tooltip khi rê chuột vào một mục.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tooltip {
    pub date_text: String,
    pub title: String,
    pub detail: String,
}

impl From<&EventRecord> for Tooltip {
    fn from(record: &EventRecord) -> Self {
        Self {
            date_text: record.raw_date_text.clone(),
            title: record.title.clone(),
            detail: record.detail.clone(),
        }
    }
}

impl WorkingSet {
    /// Tập con hiển thị; thứ tự thời gian được giữ nguyên.
    ///
    /// Records without a category are not part of the toggle set and are always yielded.
    pub fn visible<'s, 'a>(
        &'s self,
        active: &'a ActiveCategories,
    ) -> impl Iterator<Item = &'s EventRecord> + 'a
    where
        's: 'a,
    {
        self.records.iter().filter(move |record| active.admits(record))
    }

    pub fn render_items(&self, active: &ActiveCategories) -> Vec<RenderItem> {
        self.visible(active).map(RenderItem::from).collect()
    }

    pub fn tooltip(&self, id: &str) -> Option<Tooltip> {
        self.get(id).map(Tooltip::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DatePrecision, NormalizedDate, SourceBatch, TimelineConfig};

    fn record(id: &str, month: u32, category: &str) -> EventRecord {
        let date = NaiveDate::from_ymd_opt(2021, month, 1).unwrap();
        EventRecord::new(
            id,
            NormalizedDate {
                date,
                precision: DatePrecision::Month,
            },
            format!("2021-{month}"),
            category,
            &format!("event {id}"),
            format!("detail {id}"),
            "src",
        )
    }

    fn working_set() -> WorkingSet {
        let batch = SourceBatch::new(
            "s",
            vec![
                record("1", 3, "Release"),
                record("2", 1, "Meeting"),
                record("3", 2, ""),
                record("4", 4, "Release"),
            ],
        );
        WorkingSet::from_batches_at(
            vec![batch],
            &TimelineConfig::default(),
            NaiveDate::from_ymd_opt(2021, 1, 1).unwrap(),
        )
    }

    #[test]
    fn all_categories_active_shows_everything() {
        let set = working_set();
        let active = ActiveCategories::all(set.palette());
        assert_eq!(set.visible(&active).count(), 4);
    }

    #[test]
    fn toggling_off_hides_only_that_category() {
        let set = working_set();
        let mut active = ActiveCategories::all(set.palette());
        assert!(!active.toggle("Release"));

        let ids: Vec<&str> = set.visible(&active).map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["s/2", "s/3"]);
        assert_eq!(set.len(), 4);

        assert!(active.toggle("Release"));
        assert_eq!(set.visible(&active).count(), 4);
    }

    #[test]
    fn uncategorized_records_survive_empty_filter() {
        let set = working_set();
        let ids: Vec<&str> = set
            .visible(&ActiveCategories::none())
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(ids, vec!["s/3"]);
    }

    #[test]
    fn visible_records_outlive_a_temporary_filter() {
        let set = working_set();
        let kept: Vec<&EventRecord> = set
            .visible(&["Meeting"].into_iter().collect::<ActiveCategories>())
            .collect();
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].id, "s/2");
        assert_eq!(kept[1].id, "s/3");
    }

    #[test]
    fn render_items_carry_color_and_title() {
        let set = working_set();
        let active: ActiveCategories = ["Meeting"].into_iter().collect();
        let items = set.render_items(&active);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, "s/2");
        assert_eq!(items[0].content, "[Meeting] event 2");
        assert_eq!(items[0].display_color.as_deref(), Some("hsl(180, 70%, 80%)"));
        assert_eq!(items[1].display_color, None);
    }

    #[test]
    fn tooltip_uses_raw_date_text() {
        let set = working_set();
        let tooltip = set.tooltip("s/4").unwrap();
        assert_eq!(tooltip.date_text, "2021-4");
        assert_eq!(tooltip.title, "[Release] event 4");
        assert_eq!(tooltip.detail, "detail 4");
        assert_eq!(set.tooltip("missing"), None);
    }
}
