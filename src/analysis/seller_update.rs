// src/analysis/seller_update.rs

use crate::analysis::statistics::mean;
use crate::domain::{derive_status_bucket, PropertyRecord, SellerUpdateCriteria, StandardStatus, StatusBucket};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

/// Display cap applied to matched listings unless the caller picks another.
pub const DEFAULT_RESULT_LIMIT: usize = 100;

/// Outcome of matching one set of seller-update criteria.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerUpdateMatch {
    /// Matching listings, truncated to the result limit.
    pub properties: Vec<PropertyRecord>,
    /// Matches modified strictly after the cutoff.
    pub new_listings_count: usize,
    /// Every match, regardless of the result limit.
    pub total_matches: usize,
}

fn normalize(value: Option<&str>) -> Option<String> {
    value
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
}

/// Trim + lowercase equality. An unspecified wanted value matches anything;
/// a specified one never matches a missing value.
fn field_matches(wanted: &Option<String>, actual: &Option<String>) -> bool {
    match normalize(wanted.as_deref()) {
        None => true,
        Some(w) => normalize(actual.as_deref()).as_deref() == Some(w.as_str()),
    }
}

impl SellerUpdateCriteria {
    pub fn matches(&self, p: &PropertyRecord) -> bool {
        p.is_visible
            && field_matches(&self.postal_code, &p.postal_code)
            && field_matches(&self.elementary_school, &p.elementary_school)
            && field_matches(&self.property_sub_type, &p.property_sub_type)
    }
}

/// Matches `properties` against seller-update criteria.
///
/// The new-listing cutoff is `since` when given, otherwise the criteria's
/// `last_sent_at`. With neither, nothing counts as new.
pub fn match_seller_update(
    criteria: &SellerUpdateCriteria,
    properties: &[PropertyRecord],
    since: Option<DateTime<Utc>>,
    result_limit: usize,
) -> SellerUpdateMatch {
    let cutoff = since.or(criteria.last_sent_at);

    let matched: Vec<&PropertyRecord> = properties.iter().filter(|p| criteria.matches(p)).collect();

    let new_listings_count = match cutoff {
        None => 0,
        Some(cutoff) => matched
            .iter()
            .filter(|p| p.modification_timestamp.is_some_and(|ts| ts > cutoff))
            .count(),
    };

    debug!(
        total = matched.len(),
        new = new_listings_count,
        ?cutoff,
        "seller update matched"
    );

    SellerUpdateMatch {
        total_matches: matched.len(),
        new_listings_count,
        properties: matched.into_iter().take(result_limit).cloned().collect(),
    }
}

/// Best-effort market snapshot over a set of listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSummary {
    pub total_count: usize,
    pub average_list_price: Option<Decimal>,
    pub average_active_price: Option<Decimal>,
    pub average_sold_price: Option<Decimal>,
    pub average_days_on_market: Option<Decimal>,
    pub active_count: usize,
    pub pending_count: usize,
    pub closed_count: usize,
    pub min_list_price: Option<Decimal>,
    pub max_list_price: Option<Decimal>,
    pub average_price_per_sq_ft: Option<Decimal>,
}

/// Summarises `properties`; returns `None` for an empty input.
///
/// Missing values are left out of each average rather than counted as zero.
pub fn market_summary<'a, I>(properties: I) -> Option<MarketSummary>
where
    I: IntoIterator<Item = &'a PropertyRecord>,
{
    let properties: Vec<&PropertyRecord> = properties.into_iter().collect();
    if properties.is_empty() {
        return None;
    }

    let list_prices: Vec<Decimal> = properties.iter().filter_map(|p| p.list_price).collect();

    let active_prices: Vec<Decimal> = properties
        .iter()
        .filter(|p| p.standard_status == Some(StandardStatus::Active))
        .filter_map(|p| p.list_price)
        .collect();

    let sold_prices: Vec<Decimal> = properties
        .iter()
        .filter(|p| p.is_closed())
        .filter_map(|p| p.close_price)
        .collect();

    let days_on_market: Vec<Decimal> = properties
        .iter()
        .filter_map(|p| p.resolved_days_on_market())
        .map(Decimal::from)
        .collect();

    let price_per_sq_ft: Vec<Decimal> = properties
        .iter()
        .filter_map(|p| {
            let area = p.living_area.filter(|a| *a > Decimal::ZERO)?;
            p.list_price?.checked_div(area)
        })
        .collect();

    let count_bucket = |bucket: StatusBucket| {
        properties
            .iter()
            .filter(|p| derive_status_bucket(p.standard_status) == bucket)
            .count()
    };

    Some(MarketSummary {
        total_count: properties.len(),
        average_list_price: mean(&list_prices),
        average_active_price: mean(&active_prices),
        average_sold_price: mean(&sold_prices),
        average_days_on_market: mean(&days_on_market),
        active_count: count_bucket(StatusBucket::Active),
        pending_count: count_bucket(StatusBucket::Pending),
        closed_count: count_bucket(StatusBucket::Closed),
        min_list_price: list_prices.iter().min().copied(),
        max_list_price: list_prices.iter().max().copied(),
        average_price_per_sq_ft: mean(&price_per_sq_ft),
    })
}
