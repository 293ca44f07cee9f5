// src/domain/logic.rs

use crate::domain::property::StandardStatus;
use serde::Serialize;

/// The coarse lifecycle buckets reported in market summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum StatusBucket {
    Active,
    /// Pending, or active but already under contract.
    Pending,
    Closed,
    /// Off-market states that are not counted in any bucket.
    Other,
}

/// Determines the summary bucket of a listing from its standard status.
///
/// "Active Under Contract" is grouped with Pending rather than Active: the
/// listing still shows as active on the MLS but is no longer available.
pub fn derive_status_bucket(status: Option<StandardStatus>) -> StatusBucket {
    match status {
        Some(StandardStatus::Active) => StatusBucket::Active,
        Some(StandardStatus::ActiveUnderContract) | Some(StandardStatus::Pending) => {
            StatusBucket::Pending
        }
        Some(StandardStatus::Closed) => StatusBucket::Closed,
        // Expired, Withdrawn, Cancelled, Terminated, or no status at all.
        _ => StatusBucket::Other,
    }
}
