// src/analysis/filter.rs

use crate::domain::{PropertyRecord, SearchCriteria};
use tracing::debug;

/// Default cap for the broad criteria search (`get_properties`).
pub const DEFAULT_CRITERIA_LIMIT: usize = 500;

/// Default cap for the convenience search (`search_properties`).
pub const DEFAULT_SEARCH_LIMIT: usize = 100;

/// Applies `criteria` to `properties`, then skips `offset` eligible records
/// and returns at most `limit` of the rest, in input order.
pub fn filter<'a, I>(
    properties: I,
    criteria: &SearchCriteria,
    limit: usize,
    offset: usize,
) -> Vec<PropertyRecord>
where
    I: IntoIterator<Item = &'a PropertyRecord>,
{
    let results: Vec<PropertyRecord> = properties
        .into_iter()
        .filter(|p| criteria.matches(p))
        .skip(offset)
        .take(limit)
        .cloned()
        .collect();

    debug!(limit, offset, returned = results.len(), "criteria filter applied");
    results
}

/// Broad criteria search used for CMA comparable selection.
pub fn get_properties(
    properties: &[PropertyRecord],
    criteria: &SearchCriteria,
    limit: Option<usize>,
    offset: Option<usize>,
) -> Vec<PropertyRecord> {
    filter(
        properties,
        criteria,
        limit.unwrap_or(DEFAULT_CRITERIA_LIMIT),
        offset.unwrap_or(0),
    )
}

/// Convenience buyer search; same predicate, smaller default page.
pub fn search_properties(
    properties: &[PropertyRecord],
    criteria: &SearchCriteria,
    limit: Option<usize>,
    offset: Option<usize>,
) -> Vec<PropertyRecord> {
    filter(
        properties,
        criteria,
        limit.unwrap_or(DEFAULT_SEARCH_LIMIT),
        offset.unwrap_or(0),
    )
}
