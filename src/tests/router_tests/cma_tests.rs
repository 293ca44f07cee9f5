use crate::db::properties::upsert_properties;
use crate::domain::StandardStatus;
use crate::errors::{AnalysisError, ServerError};
use crate::responses::error_response;
use crate::router::handle;
use crate::tests::utils::{body_json, get, listing, post_json, test_state};
use chrono::NaiveDate;
use rust_decimal::Decimal;

#[test]
fn statistics_report_even_count_median() {
    let state = test_state();
    upsert_properties(
        &state.db,
        &[
            listing("a", 100_000, "78701"),
            listing("b", 200_000, "78701"),
            listing("c", 300_000, "78701"),
            listing("d", 400_000, "78701"),
        ],
    )
    .unwrap();

    let resp = handle(get("/cma/statistics?ids=a,b,c,d"), &state).unwrap();
    assert_eq!(resp.status(), 200);

    let body = body_json(resp);
    let median: Decimal = body["price"]["median"].as_str().unwrap().parse().unwrap();
    assert_eq!(median, Decimal::from(250_000));
    assert!(body.get("pricePerSqFt").is_some());
    assert!(body.get("yearBuilt").is_some());
}

#[test]
fn statistics_for_unknown_ids_is_not_found() {
    let state = test_state();
    let result = handle(get("/cma/statistics?ids=ghost"), &state);
    let err = result.unwrap_err();
    assert!(matches!(err, ServerError::Analysis(AnalysisError::NoPropertiesFound)));
    assert_eq!(error_response(err).status(), 404);
}

#[test]
fn statistics_require_ids() {
    let state = test_state();
    assert!(matches!(
        handle(get("/cma/statistics"), &state),
        Err(ServerError::BadRequest(_))
    ));
}

#[test]
fn metric_subset_is_honoured() {
    let state = test_state();
    upsert_properties(&state.db, &[listing("a", 100_000, "78701")]).unwrap();

    let resp = handle(get("/cma/statistics?ids=a&metrics=price,bedrooms"), &state).unwrap();
    let body = body_json(resp);
    let keys: Vec<&String> = body.as_object().unwrap().keys().collect();
    assert_eq!(keys, vec!["bedrooms", "price"]);
}

#[test]
fn cached_statistics_refresh_after_upsert() {
    let state = test_state();
    upsert_properties(&state.db, &[listing("a", 100_000, "78701")]).unwrap();

    handle(get("/cma/statistics?ids=a"), &state).unwrap();
    assert_eq!(state.cache.len(), 1);

    let json = r#"[{ "id": "a", "standardStatus": "Active", "listPrice": 150000, "isVisible": true }]"#;
    handle(post_json("/properties", json), &state).unwrap();
    assert!(state.cache.is_empty());

    let body = body_json(handle(get("/cma/statistics?ids=a"), &state).unwrap());
    let average: Decimal = body["price"]["average"].as_str().unwrap().parse().unwrap();
    assert_eq!(average, Decimal::from(150_000));
}

#[test]
fn timeline_is_sorted_and_skips_incomplete_records() {
    let state = test_state();
    let mut late = listing("late", 300_000, "78701");
    late.listing_contract_date = NaiveDate::from_ymd_opt(2024, 6, 1);
    late.standard_status = Some(StandardStatus::Closed);
    let mut early = listing("early", 250_000, "78701");
    early.listing_contract_date = NaiveDate::from_ymd_opt(2023, 9, 15);
    let mut undated = listing("undated", 275_000, "78701");
    undated.listing_contract_date = None;
    upsert_properties(&state.db, &[late, early, undated]).unwrap();

    let resp = handle(get("/cma/timeline?ids=late,early,undated"), &state).unwrap();
    let body = body_json(resp);
    let points = body.as_array().unwrap();

    assert_eq!(points.len(), 2);
    assert_eq!(points[0]["propertyId"], "early");
    assert_eq!(points[0]["date"], "2023-09-15");
    assert_eq!(points[1]["propertyId"], "late");
    assert_eq!(points[1]["status"], "Closed");
    assert_eq!(points[1]["address"], "late Congress Ave, Austin TX");
}

#[test]
fn statistics_cache_can_be_flushed() {
    let state = test_state();
    upsert_properties(&state.db, &[listing("a", 100_000, "78701"), listing("b", 200_000, "78701")]).unwrap();
    handle(get("/cma/statistics?ids=a"), &state).unwrap();
    handle(get("/cma/statistics?ids=a,b"), &state).unwrap();
    assert_eq!(state.cache.len(), 2);

    let req = http::Request::builder()
        .method(http::Method::DELETE)
        .uri("/cma/statistics/cache")
        .body(astra::Body::empty())
        .unwrap();
    let body = body_json(handle(req, &state).unwrap());
    assert_eq!(body["cleared"], 2);
    assert!(state.cache.is_empty());
}
