//! JSON arrays of `{Date, Description, Type, Event}` objects.

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use timeline_core::{normalize_date_with_fallback, EventRecord, SourceBatch, TimelineError};

#[derive(Debug, Deserialize)]
struct StructuredRow {
    #[serde(rename = "Date", alias = "date", default)]
    date: Value,
    #[serde(rename = "Description", alias = "description", default)]
    description: Value,
    #[serde(rename = "Type", alias = "type", default)]
    category: Value,
    #[serde(rename = "Event", alias = "event", default)]
    event: Value,
}

impl StructuredRow {
    /// Read an event object. An object that serde rejects (both `Date` and
    /// `date` present, for example) is read key by key, canonical key first.
    fn from_entry(source: &str, index: usize, entry: &Value) -> Self {
        match Self::deserialize(entry) {
            Ok(row) => row,
            Err(err) => {
                tracing::warn!(source, index, error = %err, "reading event object key by key");
                let field = |canonical: &str, alias: &str| {
                    entry
                        .get(canonical)
                        .or_else(|| entry.get(alias))
                        .cloned()
                        .unwrap_or(Value::Null)
                };
                Self {
                    date: field("Date", "date"),
                    description: field("Description", "description"),
                    category: field("Type", "type"),
                    event: field("Event", "event"),
                }
            }
        }
    }
}

/// Parse a JSON document holding an array of event objects.
pub fn parse_structured_str(
    source: &str,
    json: &str,
    fallback: NaiveDate,
) -> Result<SourceBatch, TimelineError> {
    let value: Value = serde_json::from_str(json).map_err(|err| TimelineError::InvalidSource {
        name: source.to_string(),
        reason: err.to_string(),
    })?;
    parse_structured_value(source, &value, fallback)
}

/// Parse an already-decoded JSON array. The local id is the array index.
pub fn parse_structured_value(
    source: &str,
    value: &Value,
    fallback: NaiveDate,
) -> Result<SourceBatch, TimelineError> {
    let entries = value
        .as_array()
        .ok_or_else(|| TimelineError::InvalidSource {
            name: source.to_string(),
            reason: "expected a JSON array of event objects".to_string(),
        })?;

    let mut records = Vec::with_capacity(entries.len());
    let mut rejected = 0usize;

    for (index, entry) in entries.iter().enumerate() {
        if !entry.is_object() {
            tracing::warn!(source, index, "skipping non-object entry");
            rejected += 1;
            continue;
        }

        let row = StructuredRow::from_entry(source, index, entry);
        let date = value_text(&row.date);
        let occurs_at = normalize_date_with_fallback(&date, fallback);

        records.push(EventRecord::new(
            index.to_string(),
            occurs_at,
            date,
            value_text(&row.category),
            &value_text(&row.event),
            value_text(&row.description),
            source,
        ));
    }

    tracing::debug!(source, records = records.len(), rejected, "parsed structured source");
    Ok(SourceBatch::new(source, records).with_rejected(rejected))
}

/// Text form of a JSON scalar; `null` and missing fields become empty.
fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.trim().to_string(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use timeline_core::DatePrecision;

    fn fallback() -> NaiveDate {
        NaiveDate::from_ymd_opt(2001, 2, 3).unwrap()
    }

    #[test]
    fn unparseable_date_still_yields_record() {
        let value = json!([{ "Date": "not-a-date", "Description": "x", "Type": "y", "Event": "z" }]);
        let batch = parse_structured_value("rows.json", &value, fallback()).unwrap();
        assert_eq!(batch.records.len(), 1);
        let record = &batch.records[0];
        assert_eq!(record.occurs_at, fallback());
        assert_eq!(record.precision, DatePrecision::Fallback);
        assert_eq!(record.category, "y");
        assert_eq!(record.title, "[y] z");
        assert_eq!(record.detail, "x");
    }

    #[test]
    fn missing_fields_become_empty_and_numbers_are_coerced() {
        let value = json!([{ "Date": 2019 }, { "Event": "Only title" }]);
        let batch = parse_structured_value("rows.json", &value, fallback()).unwrap();
        assert_eq!(batch.records.len(), 2);

        let first = &batch.records[0];
        assert_eq!(first.occurs_at, NaiveDate::from_ymd_opt(2019, 1, 1).unwrap());
        assert_eq!(first.raw_date_text, "2019");
        assert_eq!(first.category, "");
        assert_eq!(first.detail, "");

        let second = &batch.records[1];
        assert_eq!(second.title, "Only title");
        assert_eq!(second.occurs_at, fallback());
    }

    #[test]
    fn ids_are_sequence_indices() {
        let value = json!([
            { "Date": "2020-01-01", "Type": "A", "Event": "a" },
            { "Date": "2020-01-01", "Type": "A", "Event": "b" },
            { "date": "March 3, 2020", "type": "B", "event": "c" }
        ]);
        let batch = parse_structured_value("rows.json", &value, fallback()).unwrap();
        let ids: Vec<&str> = batch.records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["0", "1", "2"]);
        assert_eq!(batch.records[2].category, "B");
        assert_eq!(
            batch.records[2].occurs_at,
            NaiveDate::from_ymd_opt(2020, 3, 3).unwrap()
        );
    }

    #[test]
    fn canonical_and_alias_keys_together_keep_every_field() {
        let value = json!([{
            "Date": "2020-01-01",
            "date": "1999-12-31",
            "Description": "kept",
            "Type": "A",
            "Event": "e"
        }]);
        let batch = parse_structured_value("rows.json", &value, fallback()).unwrap();
        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.rows_rejected, 0);

        let record = &batch.records[0];
        assert_eq!(record.occurs_at, NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
        assert_eq!(record.precision, DatePrecision::Day);
        assert_eq!(record.raw_date_text, "2020-01-01");
        assert_eq!(record.category, "A");
        assert_eq!(record.title, "[A] e");
        assert_eq!(record.detail, "kept");
    }

    #[test]
    fn non_array_documents_are_invalid() {
        let err = parse_structured_str("rows.json", r#"{"Date": "2020"}"#, fallback()).unwrap_err();
        assert!(matches!(err, TimelineError::InvalidSource { .. }));

        let err = parse_structured_str("rows.json", "not json", fallback()).unwrap_err();
        assert!(matches!(err, TimelineError::InvalidSource { .. }));
    }

    #[test]
    fn non_object_entries_are_counted_as_rejected() {
        let value = json!([1, { "Date": "2020" }, "text"]);
        let batch = parse_structured_value("rows.json", &value, fallback()).unwrap();
        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.records[0].id, "1");
        assert_eq!(batch.rows_rejected, 2);
    }
}
