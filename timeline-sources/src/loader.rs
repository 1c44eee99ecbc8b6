use std::borrow::Borrow;
use std::fmt::Display;
use std::future::Future;

use chrono::NaiveDate;
use futures::future::try_join_all;
use timeline_core::{today, SourceBatch, TimelineConfig, TimelineError, WorkingSet};

use crate::{parse_delimited, parse_structured_str, SourceFormat, SourceSpec};

/// Parse one source's text according to its format.
pub fn parse_source(
    spec: &SourceSpec,
    text: &str,
    fallback: NaiveDate,
) -> Result<SourceBatch, TimelineError> {
    match spec.format {
        SourceFormat::Csv => Ok(parse_delimited(&spec.name, text, fallback)),
        SourceFormat::Json => parse_structured_str(&spec.name, text, fallback),
    }
}

/// Build a working set from texts that have already been read.
pub fn build_working_set<I, S, T>(
    sources: I,
    config: &TimelineConfig,
) -> Result<WorkingSet, TimelineError>
where
    I: IntoIterator<Item = (S, T)>,
    S: Borrow<SourceSpec>,
    T: AsRef<str>,
{
    build_working_set_at(sources, config, today())
}

/// Like [`build_working_set`] with a fixed date for fallbacks and empty windows.
pub fn build_working_set_at<I, S, T>(
    sources: I,
    config: &TimelineConfig,
    today: NaiveDate,
) -> Result<WorkingSet, TimelineError>
where
    I: IntoIterator<Item = (S, T)>,
    S: Borrow<SourceSpec>,
    T: AsRef<str>,
{
    let batches = sources
        .into_iter()
        .map(|(spec, text)| parse_source(spec.borrow(), text.as_ref(), today))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(WorkingSet::from_batches_at(batches, config, today))
}

/// Fetch every source concurrently, then parse and merge.
///
/// Merging starts only after all fetches resolved. The first failed fetch
/// aborts the whole load with [`TimelineError::SourceUnavailable`].
pub async fn load_working_set<F, Fut, E>(
    specs: &[SourceSpec],
    fetch: F,
    config: &TimelineConfig,
) -> Result<WorkingSet, TimelineError>
where
    F: Fn(&SourceSpec) -> Fut,
    Fut: Future<Output = Result<String, E>>,
    E: Display,
{
    let pending = specs.iter().map(|spec| {
        let name = spec.name.clone();
        let request = fetch(spec);
        async move {
            request.await.map_err(|err| TimelineError::SourceUnavailable {
                name,
                reason: err.to_string(),
            })
        }
    });

    let texts = try_join_all(pending).await.map_err(|err| {
        tracing::warn!(error = %err, "source unavailable, load aborted");
        err
    })?;

    build_working_set(specs.iter().zip(texts), config)
}
