//! Comma-delimited event files: `date, description, category, event`.
//!
//! The first line is a header. Double quotes toggle an inside-quotes mode and
//! are dropped; a comma outside quotes ends a field. There is no escaping
//! beyond that.

use std::collections::HashSet;

use chrono::NaiveDate;
use timeline_core::{normalize_date_with_fallback, EventRecord, SourceBatch, TimelineError};

/// Four logical columns of one data row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelimitedRow {
    pub date: String,
    pub description: String,
    pub category: String,
    pub event: String,
}

/// Split one line into fields with the quote-toggle rule.
pub fn split_row(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            other => current.push(other),
        }
    }

    fields.push(current);
    fields
}

/// Parse one data row. Rows with fewer than four fields are rejected; extra
/// fields are ignored.
pub fn parse_row(line: &str, row: usize) -> Result<DelimitedRow, TimelineError> {
    let fields = split_row(line);
    if fields.len() < 4 {
        return Err(TimelineError::MalformedRow {
            row,
            fields: fields.len(),
        });
    }

    let mut fields = fields.into_iter().map(|field| field.trim().to_string());
    let mut next = || fields.next().unwrap_or_default();
    Ok(DelimitedRow {
        date: next(),
        description: next(),
        category: next(),
        event: next(),
    })
}

/// Parse a whole delimited document into a batch with source-local ids.
///
/// The local id is the raw date text. When two rows share a date the later one
/// is re-keyed as `"{date}#{row}"`.
pub fn parse_delimited(source: &str, text: &str, fallback: NaiveDate) -> SourceBatch {
    let mut records = Vec::new();
    let mut used_ids = HashSet::new();
    let mut rejected = 0usize;

    for (row, line) in text.split('\n').skip(1).enumerate() {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.trim().is_empty() {
            continue;
        }

        let parsed = match parse_row(line, row) {
            Ok(parsed) => parsed,
            Err(err) => {
                tracing::warn!(source, line = row + 2, error = %err, "skipping malformed row");
                rejected += 1;
                continue;
            }
        };

        let id = local_id(&mut used_ids, &parsed.date, row);
        let occurs_at = normalize_date_with_fallback(&parsed.date, fallback);
        records.push(EventRecord::new(
            id,
            occurs_at,
            parsed.date,
            parsed.category,
            &parsed.event,
            parsed.description,
            source,
        ));
    }

    tracing::debug!(source, records = records.len(), rejected, "parsed delimited source");
    SourceBatch::new(source, records).with_rejected(rejected)
}

fn local_id(used: &mut HashSet<String>, date: &str, row: usize) -> String {
    if used.insert(date.to_string()) {
        return date.to_string();
    }

    let mut candidate = format!("{date}#{row}");
    let mut attempt = 1usize;
    while !used.insert(candidate.clone()) {
        candidate = format!("{date}#{row}-{attempt}");
        attempt += 1;
    }
    tracing::debug!(date, id = %candidate, "duplicate date id re-keyed");
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use timeline_core::DatePrecision;

    fn fallback() -> NaiveDate {
        NaiveDate::from_ymd_opt(2000, 1, 1).unwrap()
    }

    #[test]
    fn quoted_commas_stay_inside_description() {
        let fields = split_row(r#""2020-01-01","desc, with comma","cat","title""#);
        assert_eq!(fields, vec!["2020-01-01", "desc, with comma", "cat", "title"]);
    }

    #[rstest]
    #[case("", 1)]
    #[case("a", 1)]
    #[case("a,b", 2)]
    #[case("a,b,", 3)]
    #[case("a,\"b,c\",d", 3)]
    #[case(",,,", 4)]
    #[case("a,b,c,d,e", 5)]
    fn field_counts(#[case] line: &str, #[case] expected: usize) {
        assert_eq!(split_row(line).len(), expected);
    }

    #[test]
    fn short_rows_are_rejected() {
        let err = parse_row("2021-01-01,only,three", 7).unwrap_err();
        assert!(matches!(err, TimelineError::MalformedRow { row: 7, fields: 3 }));
    }

    #[test]
    fn fields_are_trimmed() {
        let row = parse_row(" 2021-09-21 , Launched v1 ,Release, First launch ", 0).unwrap();
        assert_eq!(
            row,
            DelimitedRow {
                date: "2021-09-21".into(),
                description: "Launched v1".into(),
                category: "Release".into(),
                event: "First launch".into(),
            }
        );
    }

    #[test]
    fn launch_scenario() {
        let text = "Date,Description,Type,Event\n2021-09-21,Launched v1,Release,First launch\n";
        let batch = parse_delimited("event3.csv", text, fallback());
        assert_eq!(batch.records.len(), 1);
        let record = &batch.records[0];
        assert_eq!(record.occurs_at, NaiveDate::from_ymd_opt(2021, 9, 21).unwrap());
        assert_eq!(record.category, "Release");
        assert!(record.title.contains("First launch"));
        assert_eq!(record.detail, "Launched v1");
        assert_eq!(record.id, "2021-09-21");
    }

    #[test]
    fn month_and_year_scenarios() {
        let text = "h\nSeptember 2021,Planning,Meeting,Kickoff\n2023,Yearly review,Admin,Review";
        let batch = parse_delimited("s", text, fallback());
        assert_eq!(
            batch.records[0].occurs_at,
            NaiveDate::from_ymd_opt(2021, 9, 1).unwrap()
        );
        assert_eq!(batch.records[0].precision, DatePrecision::Month);
        assert_eq!(
            batch.records[1].occurs_at,
            NaiveDate::from_ymd_opt(2023, 1, 1).unwrap()
        );
    }

    #[test]
    fn header_blank_and_malformed_lines_are_skipped() {
        let text = "Date,Description,Type,Event\r\n\
                    2021-01-01,a,X,one\r\n\
                    \r\n\
                    broken,row\r\n\
                    2021-02-01,b,Y,two\r\n";
        let batch = parse_delimited("s", text, fallback());
        let events: Vec<&str> = batch.records.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(events, vec!["[X] one", "[Y] two"]);
        assert_eq!(batch.rows_rejected, 1);
        assert_eq!(batch.rows_seen, 3);
    }

    #[test]
    fn duplicate_dates_are_rekeyed_with_row_index() {
        let text = "h\n2021-01-01,a,X,one\n2021-01-01,b,X,two\n2021-01-01,c,X,three";
        let batch = parse_delimited("s", text, fallback());
        let ids: Vec<&str> = batch.records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["2021-01-01", "2021-01-01#1", "2021-01-01#2"]);
    }

    #[test]
    fn unparseable_date_keeps_the_record() {
        let text = "h\nsometime,mystery,Misc,Unknown";
        let batch = parse_delimited("s", text, fallback());
        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.records[0].occurs_at, fallback());
        assert_eq!(batch.records[0].raw_date_text, "sometime");
        assert_eq!(batch.date_fallbacks(), 1);
    }
}
