use crate::db::properties::upsert_properties;
use crate::db::seller_updates::{create_seller_update, get_seller_update};
use crate::jobs::{run_seller_updates, RunOutcome};
use crate::notifier::{CollectingNotifier, NotifierError, SellerUpdateNotifier, SellerUpdateReport};
use crate::domain::{NewSellerUpdate, UpdateFrequency};
use crate::db::connection::Database;
use crate::tests::utils::{init_test_db, listing, ts};
use rusqlite::params;

struct FailingNotifier;

impl SellerUpdateNotifier for FailingNotifier {
    fn deliver(&self, _report: &SellerUpdateReport) -> Result<(), NotifierError> {
        Err(NotifierError::DeliveryFailed("smtp down".into()))
    }
}

/// Delivers, then removes the criteria row so the watermark cannot be saved.
struct DeletingNotifier {
    db: Database,
    victim: i64,
}

impl SellerUpdateNotifier for DeletingNotifier {
    fn deliver(&self, report: &SellerUpdateReport) -> Result<(), NotifierError> {
        if report.criteria_id == self.victim {
            self.db
                .with_conn(|conn| {
                    Ok(conn.execute(
                        "DELETE FROM seller_update_criteria WHERE id = ?1",
                        params![self.victim],
                    )?)
                })
                .map_err(|e| NotifierError::DeliveryFailed(e.to_string()))?;
        }
        Ok(())
    }
}

fn watch(postal_code: &str) -> NewSellerUpdate {
    NewSellerUpdate {
        name: format!("Watch {postal_code}"),
        frequency: UpdateFrequency::Weekly,
        postal_code: Some(postal_code.into()),
        elementary_school: None,
        property_sub_type: None,
    }
}

#[test]
fn due_updates_are_delivered_and_watermarked() {
    let db = init_test_db();
    let mut older = listing("old", 300_000, "78701");
    older.modification_timestamp = Some(ts(4, 1));
    let mut newer = listing("new", 500_000, "78701");
    newer.modification_timestamp = Some(ts(5, 10));
    upsert_properties(&db, &[older, newer, listing("elsewhere", 1, "10001")]).unwrap();

    let created = create_seller_update(&db, &watch("78701"), ts(3, 1)).unwrap();
    let notifier = CollectingNotifier::default();

    let outcome = run_seller_updates(&db, &notifier, ts(5, 15), 1).unwrap();
    assert_eq!(
        outcome,
        RunOutcome {
            due: 1,
            delivered: 1,
            failed: 0
        }
    );

    let delivered = notifier.delivered.lock().unwrap();
    let report = &delivered[0];
    assert_eq!(report.criteria_id, created.id);
    assert_eq!(report.matched.total_matches, 2);
    // Never sent before, so nothing counts as new on the first run.
    assert_eq!(report.matched.new_listings_count, 0);
    // Display list is truncated, the summary is not.
    assert_eq!(report.matched.properties.len(), 1);
    assert_eq!(report.summary.as_ref().unwrap().total_count, 2);

    let reloaded = get_seller_update(&db, created.id).unwrap().unwrap();
    assert_eq!(reloaded.criteria.last_sent_at, Some(ts(5, 15)));
}

#[test]
fn second_run_counts_listings_modified_since_last_send() {
    let db = init_test_db();
    upsert_properties(&db, &[listing("a", 300_000, "78701")]).unwrap();
    create_seller_update(&db, &watch("78701"), ts(1, 1)).unwrap();

    run_seller_updates(&db, &CollectingNotifier::default(), ts(5, 2), 100).unwrap();

    let mut fresh = listing("b", 450_000, "78701");
    fresh.modification_timestamp = Some(ts(5, 5));
    upsert_properties(&db, &[fresh]).unwrap();

    // Not due again until a week after the last send.
    let notifier = CollectingNotifier::default();
    assert_eq!(run_seller_updates(&db, &notifier, ts(5, 6), 100).unwrap().due, 0);

    run_seller_updates(&db, &notifier, ts(5, 9), 100).unwrap();
    let delivered = notifier.delivered.lock().unwrap();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].matched.total_matches, 2);
    assert_eq!(delivered[0].matched.new_listings_count, 1);
}

#[test]
fn failed_delivery_keeps_the_watermark() {
    let db = init_test_db();
    upsert_properties(&db, &[listing("a", 300_000, "78701")]).unwrap();
    let created = create_seller_update(&db, &watch("78701"), ts(1, 1)).unwrap();

    let outcome = run_seller_updates(&db, &FailingNotifier, ts(5, 1), 100).unwrap();
    assert_eq!(outcome.failed, 1);
    assert_eq!(outcome.delivered, 0);

    let reloaded = get_seller_update(&db, created.id).unwrap().unwrap();
    assert_eq!(reloaded.criteria.last_sent_at, None);
}

#[test]
fn empty_match_still_reports_without_summary() {
    let db = init_test_db();
    create_seller_update(&db, &watch("99999"), ts(1, 1)).unwrap();
    upsert_properties(&db, &[listing("a", 300_000, "78701")]).unwrap();

    let notifier = CollectingNotifier::default();
    run_seller_updates(&db, &notifier, ts(5, 1), 100).unwrap();

    let delivered = notifier.delivered.lock().unwrap();
    assert_eq!(delivered[0].matched.total_matches, 0);
    assert!(delivered[0].summary.is_none());
}

#[test]
fn unsaved_watermark_does_not_stop_the_run() {
    let db = init_test_db();
    upsert_properties(&db, &[listing("a", 300_000, "78701")]).unwrap();
    let first = create_seller_update(&db, &watch("78701"), ts(1, 1)).unwrap();
    let second = create_seller_update(&db, &watch("78701"), ts(1, 2)).unwrap();

    let notifier = DeletingNotifier {
        db: db.clone(),
        victim: first.id,
    };
    let outcome = run_seller_updates(&db, &notifier, ts(5, 1), 100).unwrap();
    assert_eq!(
        outcome,
        RunOutcome {
            due: 2,
            delivered: 1,
            failed: 1
        }
    );

    let reloaded = get_seller_update(&db, second.id).unwrap().unwrap();
    assert_eq!(reloaded.criteria.last_sent_at, Some(ts(5, 1)));
}
