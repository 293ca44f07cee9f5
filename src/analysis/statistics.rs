// src/analysis/statistics.rs

use crate::domain::PropertyRecord;
use crate::errors::AnalysisError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::str::FromStr;
use std::sync::Mutex;
use tracing::{debug, info};

/// A metric tracked by the statistics aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Metric {
    Price,
    PricePerSqFt,
    DaysOnMarket,
    LivingArea,
    LotSize,
    Acres,
    Bedrooms,
    Bathrooms,
    YearBuilt,
}

impl Metric {
    pub const ALL: [Metric; 9] = [
        Metric::Price,
        Metric::PricePerSqFt,
        Metric::DaysOnMarket,
        Metric::LivingArea,
        Metric::LotSize,
        Metric::Acres,
        Metric::Bedrooms,
        Metric::Bathrooms,
        Metric::YearBuilt,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Metric::Price => "price",
            Metric::PricePerSqFt => "pricePerSqFt",
            Metric::DaysOnMarket => "daysOnMarket",
            Metric::LivingArea => "livingArea",
            Metric::LotSize => "lotSize",
            Metric::Acres => "acres",
            Metric::Bedrooms => "bedrooms",
            Metric::Bathrooms => "bathrooms",
            Metric::YearBuilt => "yearBuilt",
        }
    }

    /// Reads this metric's raw value from a record, if it has one.
    pub fn extract(self, p: &PropertyRecord) -> Option<Decimal> {
        match self {
            Metric::Price => p.derived_price(),
            Metric::PricePerSqFt => p.price_per_sq_ft(),
            Metric::DaysOnMarket => p.resolved_days_on_market().map(Decimal::from),
            Metric::LivingArea => p.living_area,
            Metric::LotSize => p.lot_size_square_feet,
            Metric::Acres => p.lot_size_acres,
            Metric::Bedrooms => p.bedrooms_total.map(Decimal::from),
            Metric::Bathrooms => p.resolved_bathrooms().map(Decimal::from),
            Metric::YearBuilt => p.year_built.map(Decimal::from),
        }
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Metric::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown metric '{s}'"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ValueRange {
    pub min: Decimal,
    pub max: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatMetricSummary {
    pub range: ValueRange,
    pub average: Decimal,
    pub median: Decimal,
}

impl StatMetricSummary {
    /// Placeholder for a metric with no usable values.
    pub fn zero() -> Self {
        Self {
            range: ValueRange {
                min: Decimal::ZERO,
                max: Decimal::ZERO,
            },
            average: Decimal::ZERO,
            median: Decimal::ZERO,
        }
    }
}

/// One summary per requested metric, keyed by metric name.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct StatisticsResult {
    pub metrics: BTreeMap<Metric, StatMetricSummary>,
}

impl StatisticsResult {
    pub fn get(&self, metric: Metric) -> Option<&StatMetricSummary> {
        self.metrics.get(&metric)
    }
}

/// Median of an ascending slice: the middle element for odd lengths, the
/// mean of the two middle elements for even lengths.
pub fn median(sorted: &[Decimal]) -> Option<Decimal> {
    let n = sorted.len();
    if n == 0 {
        return None;
    }
    let mid = n / 2;
    if n % 2 == 0 {
        let (low, high) = (sorted[mid - 1], sorted[mid]);
        low.checked_add(high)
            .map(|sum| sum / Decimal::TWO)
            .or_else(|| low.checked_add(high.checked_sub(low)? / Decimal::TWO))
    } else {
        Some(sorted[mid])
    }
}

/// Arithmetic mean, or `None` for an empty input.
///
/// A sum past `Decimal::MAX` falls back to a running mean; `None` if even
/// that does not fit.
pub fn mean(values: &[Decimal]) -> Option<Decimal> {
    if values.is_empty() {
        return None;
    }
    if let Some(sum) = values.iter().try_fold(Decimal::ZERO, |acc, v| acc.checked_add(*v)) {
        return sum.checked_div(Decimal::from(values.len()));
    }
    values
        .iter()
        .zip(1u64..)
        .try_fold(Decimal::ZERO, |running, (v, k)| {
            let step = v.checked_sub(running)?.checked_div(Decimal::from(k))?;
            running.checked_add(step)
        })
}

/// Summarises raw values after discarding anything that is not strictly
/// positive.
pub fn summarize(values: impl IntoIterator<Item = Decimal>) -> StatMetricSummary {
    let mut values: Vec<Decimal> = values.into_iter().filter(|v| *v > Decimal::ZERO).collect();
    values.sort();

    let (Some(&min), Some(&max)) = (values.first(), values.last()) else {
        return StatMetricSummary::zero();
    };

    let (Some(average), Some(median)) = (mean(&values), median(&values)) else {
        return StatMetricSummary::zero();
    };

    StatMetricSummary {
        range: ValueRange { min, max },
        average,
        median,
    }
}

/// Computes the requested metrics over records that are already resolved.
pub fn aggregate_records(
    records: &[&PropertyRecord],
    metrics: &[Metric],
) -> Result<StatisticsResult, AnalysisError> {
    if records.is_empty() {
        return Err(AnalysisError::NoPropertiesFound);
    }

    let metrics = metrics
        .iter()
        .map(|&metric| {
            let summary = summarize(records.iter().filter_map(|p| metric.extract(p)));
            (metric, summary)
        })
        .collect();

    Ok(StatisticsResult { metrics })
}

/// Resolves `ids` to visible records in `properties`.
pub fn resolve_visible<'a>(
    properties: &'a [PropertyRecord],
    ids: &BTreeSet<String>,
) -> Vec<&'a PropertyRecord> {
    properties
        .iter()
        .filter(|p| p.is_visible && ids.contains(&p.id))
        .collect()
}

/// Statistics over every tracked metric for the given property ids.
///
/// Fails with [`AnalysisError::NoPropertiesFound`] when none of the ids
/// resolve to a visible record.
pub fn aggregate(
    properties: &[PropertyRecord],
    ids: &BTreeSet<String>,
) -> Result<StatisticsResult, AnalysisError> {
    aggregate_metrics(properties, ids, &Metric::ALL)
}

pub fn aggregate_metrics(
    properties: &[PropertyRecord],
    ids: &BTreeSet<String>,
    metrics: &[Metric],
) -> Result<StatisticsResult, AnalysisError> {
    let resolved = resolve_visible(properties, ids);
    debug!(
        requested = ids.len(),
        resolved = resolved.len(),
        "aggregating statistics"
    );
    aggregate_records(&resolved, metrics)
}

/// Cache key: the sorted, de-duplicated property ids plus the sorted metric set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StatisticsKey {
    property_ids: Vec<String>,
    metrics: Vec<Metric>,
}

impl StatisticsKey {
    pub fn new(ids: &BTreeSet<String>, metrics: &[Metric]) -> Self {
        let metrics: BTreeSet<Metric> = metrics.iter().copied().collect();
        Self {
            property_ids: ids.iter().cloned().collect(),
            metrics: metrics.into_iter().collect(),
        }
    }

    fn mentions(&self, property_id: &str) -> bool {
        self.property_ids
            .binary_search_by(|id| id.as_str().cmp(property_id))
            .is_ok()
    }
}

/// Memoised statistics results.
///
/// Entries are only dropped through the explicit invalidation calls; whoever
/// changes property data is responsible for calling them.
#[derive(Debug, Default)]
pub struct StatisticsCache {
    entries: Mutex<CacheEntries>,
}

#[derive(Debug, Default)]
struct CacheEntries {
    results: HashMap<StatisticsKey, StatisticsResult>,
    // Bumped by every invalidation; a computation that straddles one is not stored.
    generation: u64,
}

impl StatisticsCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CacheEntries> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get(&self, key: &StatisticsKey) -> Option<StatisticsResult> {
        self.lock().results.get(key).cloned()
    }

    /// Returns the cached result for `key`, computing and storing it on a miss.
    /// Errors are returned to the caller and never cached. A result computed
    /// while an invalidation ran is returned but not stored.
    pub fn get_or_try_insert_with<E, F>(&self, key: StatisticsKey, compute: F) -> Result<StatisticsResult, E>
    where
        F: FnOnce() -> Result<StatisticsResult, E>,
    {
        let generation = {
            let entries = self.lock();
            if let Some(hit) = entries.results.get(&key) {
                debug!(ids = key.property_ids.len(), "statistics cache hit");
                return Ok(hit.clone());
            }
            entries.generation
        };

        let result = compute()?;

        let mut entries = self.lock();
        if entries.generation == generation {
            entries.results.insert(key, result.clone());
        } else {
            debug!("statistics invalidated during computation, not caching");
        }
        Ok(result)
    }

    /// Drops every entry whose id set includes `property_id`.
    pub fn invalidate_property(&self, property_id: &str) -> usize {
        let mut entries = self.lock();
        entries.generation += 1;
        let before = entries.results.len();
        entries.results.retain(|key, _| !key.mentions(property_id));
        let dropped = before - entries.results.len();
        if dropped > 0 {
            info!(property_id, dropped, "invalidated cached statistics");
        }
        dropped
    }

    /// Drops every entry.
    pub fn clear(&self) {
        let mut entries = self.lock();
        entries.generation += 1;
        let dropped = entries.results.len();
        entries.results.clear();
        info!(dropped, "cleared statistics cache");
    }

    pub fn len(&self) -> usize {
        self.lock().results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
