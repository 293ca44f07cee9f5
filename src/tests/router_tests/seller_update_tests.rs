use crate::db::properties::upsert_properties;
use crate::router::handle;
use crate::tests::utils::{body_json, get, listing, post_json, test_state, ts};

#[test]
fn preview_counts_new_listings_since_date() {
    let state = test_state();
    let mut first = listing("a", 300_000, "78701");
    first.modification_timestamp = Some(ts(5, 10));
    let mut other_zip = listing("b", 350_000, "78702");
    other_zip.modification_timestamp = Some(ts(5, 12));
    upsert_properties(&state.db, &[first, other_zip]).unwrap();

    let body = body_json(
        handle(get("/seller-updates/preview?postalCode=78701&since=2024-05-09"), &state).unwrap(),
    );
    assert_eq!(body["totalMatches"], 1);
    assert_eq!(body["newListingsCount"], 1);
    assert_eq!(body["properties"][0]["id"], "a");
    assert_eq!(body["summary"]["activeCount"], 1);

    let body = body_json(
        handle(get("/seller-updates/preview?postalCode=78701&since=2024-05-11"), &state).unwrap(),
    );
    assert_eq!(body["totalMatches"], 1);
    assert_eq!(body["newListingsCount"], 0);
}

#[test]
fn preview_with_no_matches_has_null_summary() {
    let state = test_state();
    upsert_properties(&state.db, &[listing("a", 300_000, "78701")]).unwrap();

    let body = body_json(handle(get("/seller-updates/preview?postalCode=00000"), &state).unwrap());
    assert_eq!(body["totalMatches"], 0);
    assert!(body["summary"].is_null());
}

#[test]
fn created_criteria_are_listed() {
    let state = test_state();
    let json = r#"{ "name": "Downtown condos", "frequency": "monthly", "postalCode": "78701", "propertySubType": "Condominium" }"#;

    let resp = handle(post_json("/seller-updates", json), &state).unwrap();
    assert_eq!(resp.status(), 201);
    let created = body_json(resp);
    assert_eq!(created["frequency"], "monthly");
    assert_eq!(created["postalCode"], "78701");
    assert_eq!(created["isActive"], true);

    let listed = body_json(handle(get("/seller-updates"), &state).unwrap());
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["name"], "Downtown condos");
}
