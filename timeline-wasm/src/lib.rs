//! Bridge WASM <-> JavaScript trung lập framework.
//!
//! JavaScript fetches the source files itself, hands the texts over, and gets
//! back a payload ready for any timeline widget. Filtering and tooltip lookups
//! take that payload's working set back as input.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_wasm_bindgen::{from_value, to_value};
use timeline_core::{
    today, ActiveCategories, ConfigOverrides, DisplayWindow, RenderItem, TimelineConfig,
    TimelineError, WorkingSet,
};
use timeline_sources::{parse_source, parse_structured_value, SourceFormat, SourceSpec};
use wasm_bindgen::prelude::*;

/// Một nguồn do JavaScript cung cấp: văn bản thô hoặc mảng bản ghi đã parse.
#[derive(Deserialize)]
struct JsSource {
    name: String,
    #[serde(default)]
    format: Option<SourceFormat>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    records: Option<Value>,
}

#[derive(Serialize)]
struct CategoryEntry {
    category: String,
    color: String,
}

#[derive(Serialize)]
struct TimelinePayload {
    items: Vec<RenderItem>,
    categories: Vec<CategoryEntry>,
    window: DisplayWindow,
    working_set: WorkingSet,
}

#[wasm_bindgen]
pub fn build_timeline(sources: JsValue, config: Option<JsValue>) -> Result<JsValue, JsValue> {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();

    let sources: Vec<JsSource> = from_value(sources)
        .map_err(|err| JsValue::from_str(&format!("Không đọc được danh sách nguồn: {err}")))?;

    let cfg = match config {
        Some(js_cfg) => {
            let cfg: ConfigOverrides = from_value(js_cfg)
                .map_err(|err| JsValue::from_str(&format!("Không đọc được config: {err}")))?;
            TimelineConfig::from(cfg)
        }
        None => TimelineConfig::default(),
    };

    let working_set = working_set_from_sources(sources, &cfg)
        .map_err(|err| JsValue::from_str(&format_timeline_error(err)))?;

    to_value(&payload(working_set))
        .map_err(|err| JsValue::from_str(&format!("Không serialize payload: {err}")))
}

/// Tập con hiển thị cho danh sách loại đang bật.
#[wasm_bindgen]
pub fn visible_items(working_set: JsValue, active: JsValue) -> Result<JsValue, JsValue> {
    let working_set: WorkingSet = from_value(working_set)
        .map_err(|err| JsValue::from_str(&format!("Không đọc được working set: {err}")))?;
    let active: ActiveCategories = from_value(active)
        .map_err(|err| JsValue::from_str(&format!("Không đọc được bộ lọc: {err}")))?;

    to_value(&working_set.render_items(&active))
        .map_err(|err| JsValue::from_str(&format!("Không serialize danh sách: {err}")))
}

/// Nội dung tooltip cho id đang được rê chuột; `null` nếu không tìm thấy.
#[wasm_bindgen]
pub fn tooltip_for(working_set: JsValue, id: &str) -> Result<JsValue, JsValue> {
    let working_set: WorkingSet = from_value(working_set)
        .map_err(|err| JsValue::from_str(&format!("Không đọc được working set: {err}")))?;

    match working_set.tooltip(id) {
        Some(tooltip) => to_value(&tooltip)
            .map_err(|err| JsValue::from_str(&format!("Không serialize tooltip: {err}"))),
        None => Ok(JsValue::NULL),
    }
}

fn working_set_from_sources(
    sources: Vec<JsSource>,
    config: &TimelineConfig,
) -> Result<WorkingSet, TimelineError> {
    let fallback = today();
    let batches = sources
        .into_iter()
        .map(|source| match (source.records, source.text) {
            (Some(records), _) => parse_structured_value(&source.name, &records, fallback),
            (None, Some(text)) => {
                let format = source
                    .format
                    .or_else(|| SourceFormat::from_path(&source.name))
                    .unwrap_or(SourceFormat::Csv);
                parse_source(&SourceSpec::new(source.name, format), &text, fallback)
            }
            (None, None) => Err(TimelineError::SourceUnavailable {
                name: source.name,
                reason: "nguồn không có dữ liệu".to_string(),
            }),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(WorkingSet::from_batches_at(batches, config, fallback))
}

fn payload(working_set: WorkingSet) -> TimelinePayload {
    let active = ActiveCategories::all(working_set.palette());
    let categories = working_set
        .palette()
        .entries()
        .iter()
        .map(|entry| CategoryEntry {
            category: entry.category.clone(),
            color: entry.color.css(),
        })
        .collect();

    TimelinePayload {
        items: working_set.render_items(&active),
        categories,
        window: working_set.window(),
        working_set,
    }
}

fn format_timeline_error(err: TimelineError) -> String {
    format!("Timeline error: {err}")
}
