//! Gộp bản ghi từ nhiều nguồn với id không trùng lặp.
//!
//! Final ids are `"{source}/{local_id}"`. A collision is never overwritten:
//! the later record is re-keyed with a `#n` suffix.

use std::collections::HashSet;

use crate::{DatePrecision, EventRecord, LoadStats};

/// Bản ghi đã parse từ một nguồn, id còn cục bộ theo nguồn.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceBatch {
    pub source: String,
    pub records: Vec<EventRecord>,
    pub rows_seen: usize,
    pub rows_rejected: usize,
}

impl SourceBatch {
    pub fn new(source: impl Into<String>, records: Vec<EventRecord>) -> Self {
        Self {
            source: source.into(),
            rows_seen: records.len(),
            records,
            rows_rejected: 0,
        }
    }

    /// Ghi nhận số dòng bị loại (chúng vẫn được tính vào `rows_seen`).
    pub fn with_rejected(mut self, rejected: usize) -> Self {
        self.rows_rejected += rejected;
        self.rows_seen += rejected;
        self
    }

    pub fn date_fallbacks(&self) -> usize {
        self.records
            .iter()
            .filter(|record| record.precision == DatePrecision::Fallback)
            .count()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    pub records: Vec<EventRecord>,
    pub stats: LoadStats,
}

/// Nối các lô theo thứ tự, namespace id theo nguồn.
pub fn merge_batches(batches: Vec<SourceBatch>) -> MergeOutcome {
    let mut used = HashSet::new();
    let mut stats = LoadStats::default();
    let mut records = Vec::with_capacity(batches.iter().map(|b| b.records.len()).sum());

    for batch in batches {
        stats.sources += 1;
        stats.rows_seen += batch.rows_seen;
        stats.rows_rejected += batch.rows_rejected;
        stats.date_fallbacks += batch.date_fallbacks();

        tracing::debug!(
            source = %batch.source,
            records = batch.records.len(),
            rejected = batch.rows_rejected,
            "merging source"
        );

        for record in batch.records {
            let base = format!("{}/{}", batch.source, record.id);
            let id = claim_id(&mut used, base, &mut stats.rekeyed_ids);
            records.push(record.with_id(id));
        }
    }

    MergeOutcome { records, stats }
}

/// Trả về `base` nếu chưa dùng, ngược lại thêm hậu tố `#n` nhỏ nhất còn trống.
pub(crate) fn claim_id(used: &mut HashSet<String>, base: String, rekeyed: &mut usize) -> String {
    if used.insert(base.clone()) {
        return base;
    }

    let mut suffix = 1usize;
    loop {
        let candidate = format!("{base}#{suffix}");
        if used.insert(candidate.clone()) {
            tracing::debug!(original = %base, rekeyed = %candidate, "id collision, re-keyed");
            *rekeyed += 1;
            return candidate;
        }
        suffix += 1;
    }
}
