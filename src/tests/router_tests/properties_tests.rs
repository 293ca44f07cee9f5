use crate::db::properties::upsert_properties;
use crate::router::handle;
use crate::tests::utils::{body_json, get, listing, post_json, test_state};

#[test]
fn health_check_responds() {
    let state = test_state();
    let resp = handle(get("/health"), &state).expect("Handler failed");
    assert_eq!(resp.status(), 200);
    assert_eq!(body_json(resp)["status"], "ok");
}

#[test]
fn unknown_route_is_not_found() {
    let state = test_state();
    assert!(matches!(
        handle(get("/nope"), &state),
        Err(crate::errors::ServerError::NotFound)
    ));
}

#[test]
fn criteria_search_filters_by_price_and_subdivision() {
    let state = test_state();
    let mut maple = listing("c", 500_000, "78702");
    maple.subdivision = Some("Maple Run".into());
    upsert_properties(
        &state.db,
        &[listing("a", 250_000, "78701"), listing("b", 450_000, "78701"), maple],
    )
    .unwrap();

    let resp = handle(get("/properties?listPriceMin=300000&subdivisions=oak"), &state).unwrap();
    assert_eq!(resp.status(), 200);

    let body = body_json(resp);
    let found = body.as_array().unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["id"], "b");
}

#[test]
fn search_pages_with_limit_and_offset() {
    let state = test_state();
    let records: Vec<_> = (0..5)
        .map(|i| listing(&format!("p{i}"), 100_000 + i, "78701"))
        .collect();
    upsert_properties(&state.db, &records).unwrap();

    let resp = handle(get("/properties/search?limit=2&offset=1"), &state).unwrap();
    assert_eq!(body_json(resp).as_array().unwrap().len(), 2);

    let resp = handle(get("/properties/search?offset=4"), &state).unwrap();
    assert_eq!(body_json(resp).as_array().unwrap().len(), 1);
}

#[test]
fn malformed_criteria_is_a_bad_request() {
    let state = test_state();
    let result = handle(get("/properties?bedroomsMin=lots"), &state);
    assert!(matches!(result, Err(crate::errors::ServerError::BadRequest(_))));
}

#[test]
fn posted_records_become_searchable() {
    let state = test_state();
    let json = r#"[
        { "id": "x1", "standardStatus": "Active", "listPrice": 610000, "city": "Cedar Park", "isVisible": true },
        { "id": "x2", "standardStatus": "Active", "listPrice": 620000, "city": "Cedar Park", "isVisible": false }
    ]"#;

    let resp = handle(post_json("/properties", json), &state).unwrap();
    assert_eq!(body_json(resp)["upserted"], 2);

    let resp = handle(get("/properties?cities=cedar"), &state).unwrap();
    let body = body_json(resp);
    let found = body.as_array().unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["id"], "x1");
}

#[test]
fn invalid_json_body_is_a_bad_request() {
    let state = test_state();
    let result = handle(post_json("/properties", "{not json"), &state);
    assert!(matches!(result, Err(crate::errors::ServerError::BadRequest(_))));
}
