// src/notifier.rs

use crate::analysis::{MarketSummary, SellerUpdateMatch};
use crate::domain::StoredSellerUpdate;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum NotifierError {
    #[error("Delivery failed: {0}")]
    DeliveryFailed(String),
}

/// Everything a seller needs to see for one run of one saved search.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerUpdateReport {
    pub criteria_id: i64,
    pub criteria_name: String,
    pub generated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub matched: SellerUpdateMatch,
    pub summary: Option<MarketSummary>,
}

impl SellerUpdateReport {
    pub fn new(
        update: &StoredSellerUpdate,
        matched: SellerUpdateMatch,
        summary: Option<MarketSummary>,
        generated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            criteria_id: update.id,
            criteria_name: update.name.clone(),
            generated_at,
            matched,
            summary,
        }
    }
}

/// Hands a finished report to whatever delivers it (email, push, ...).
pub trait SellerUpdateNotifier {
    fn deliver(&self, report: &SellerUpdateReport) -> Result<(), NotifierError>;
}

/// Writes each report to the log. The default when no delivery channel is
/// wired up.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl SellerUpdateNotifier for LogNotifier {
    fn deliver(&self, report: &SellerUpdateReport) -> Result<(), NotifierError> {
        info!(
            criteria_id = report.criteria_id,
            name = %report.criteria_name,
            total_matches = report.matched.total_matches,
            new_listings = report.matched.new_listings_count,
            "seller update ready"
        );
        Ok(())
    }
}

/// Keeps every delivered report in memory.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct CollectingNotifier {
    pub delivered: std::sync::Mutex<Vec<SellerUpdateReport>>,
}

#[cfg(test)]
impl SellerUpdateNotifier for CollectingNotifier {
    fn deliver(&self, report: &SellerUpdateReport) -> Result<(), NotifierError> {
        self.delivered
            .lock()
            .map_err(|_| NotifierError::DeliveryFailed("collector poisoned".into()))?
            .push(report.clone());
        Ok(())
    }
}
