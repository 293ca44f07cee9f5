// src/jobs/seller_updates.rs

use crate::analysis::{market_summary, match_seller_update};
use crate::db::connection::Database;
use crate::db::{properties, seller_updates};
use crate::errors::ServerError;
use crate::notifier::{SellerUpdateNotifier, SellerUpdateReport};
use chrono::{DateTime, Utc};
use tracing::{info, warn};

/// What one job run did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub due: usize,
    pub delivered: usize,
    pub failed: usize,
}

/// Runs every due seller update once.
///
/// Visible properties are loaded a single time and shared by all criteria.
/// The market summary covers the full matched set, not the truncated
/// display list. The watermark only moves when delivery succeeds.
pub fn run_seller_updates(
    db: &Database,
    notifier: &dyn SellerUpdateNotifier,
    now: DateTime<Utc>,
    result_limit: usize,
) -> Result<RunOutcome, ServerError> {
    let due = seller_updates::list_due_seller_updates(db, now)?;
    let mut outcome = RunOutcome {
        due: due.len(),
        ..Default::default()
    };
    if due.is_empty() {
        info!("no seller updates due");
        return Ok(outcome);
    }

    let inventory = properties::load_visible_properties(db)?;
    info!(due = due.len(), inventory = inventory.len(), "running seller updates");

    for update in &due {
        let matched = match_seller_update(&update.criteria, &inventory, None, result_limit);
        let summary = market_summary(inventory.iter().filter(|p| update.criteria.matches(p)));

        let report = SellerUpdateReport::new(update, matched, summary, now);
        match notifier.deliver(&report) {
            Ok(()) => match seller_updates::mark_sent(db, update.id, now) {
                Ok(()) => outcome.delivered += 1,
                Err(e) => {
                    warn!(criteria_id = update.id, error = %e, "delivered but watermark not saved");
                    outcome.failed += 1;
                }
            },
            Err(e) => {
                warn!(criteria_id = update.id, error = %e, "seller update delivery failed");
                outcome.failed += 1;
            }
        }
    }

    info!(
        delivered = outcome.delivered,
        failed = outcome.failed,
        "seller update run finished"
    );
    Ok(outcome)
}
