// src/analysis/timeline.rs

use crate::analysis::statistics::resolve_visible;
use crate::domain::{PropertyRecord, StandardStatus};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineDataPoint {
    pub date: NaiveDate,
    pub price: Decimal,
    pub status: Option<StandardStatus>,
    pub property_id: String,
    pub address: String,
}

impl TimelineDataPoint {
    /// A point needs a contract date, a list price and an address; anything
    /// less is dropped rather than defaulted.
    pub fn from_record(p: &PropertyRecord) -> Option<Self> {
        Some(Self {
            date: p.listing_contract_date?,
            price: p.list_price?,
            status: p.standard_status,
            property_id: p.id.clone(),
            address: p.resolved_address()?,
        })
    }
}

/// Price-over-time series for the given property ids, ascending by contract
/// date. Points sharing a date keep their input order.
pub fn timeline(properties: &[PropertyRecord], ids: &BTreeSet<String>) -> Vec<TimelineDataPoint> {
    let mut points: Vec<TimelineDataPoint> = resolve_visible(properties, ids)
        .into_iter()
        .filter_map(TimelineDataPoint::from_record)
        .collect();
    points.sort_by_key(|point| point.date);
    points
}
