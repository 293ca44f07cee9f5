use crate::config::AppConfig;
use crate::db::connection::{init_db, Database};
use crate::domain::{PropertyRecord, StandardStatus};
use crate::router::AppState;
use astra::{Body, Response};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use http::{Method, Request};
use rust_decimal::Decimal;
use std::io::Read;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static DB_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Returns a fresh test database using the production schema
pub fn init_test_db() -> Database {
    let path = std::env::temp_dir().join(format!(
        "cma_test_{}_{}.sqlite",
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos(),
        DB_COUNTER.fetch_add(1, Ordering::SeqCst)
    ));
    let db = Database::new(path.to_string_lossy().into_owned());
    init_db(&db, "sql/schema.sql").unwrap_or_else(|e| panic!("Database initialization failed: {e}"));
    db
}

pub fn test_state() -> AppState {
    AppState::new(init_test_db(), AppConfig::default())
}

pub fn ts(month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, month, day, 12, 0, 0).unwrap()
}

/// A visible, active listing with the fields most tests care about.
pub fn listing(id: &str, list_price: i64, postal_code: &str) -> PropertyRecord {
    PropertyRecord {
        id: id.to_string(),
        listing_id: Some(format!("MLS-{id}")),
        standard_status: Some(StandardStatus::Active),
        list_price: Some(Decimal::from(list_price)),
        bedrooms_total: Some(3),
        bathrooms_total_integer: Some(2),
        living_area: Some(Decimal::from(2_000)),
        year_built: Some(2005),
        days_on_market: Some(12),
        city: Some("Austin".into()),
        postal_code: Some(postal_code.to_string()),
        subdivision: Some("Oak Hill Estates".into()),
        unparsed_address: Some(format!("{id} Congress Ave, Austin TX")),
        listing_contract_date: NaiveDate::from_ymd_opt(2024, 3, 1),
        modification_timestamp: Some(ts(5, 1)),
        is_visible: true,
        ..Default::default()
    }
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn post_json(uri: &str, json: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(json.to_string()))
        .unwrap()
}

pub fn body_json(mut resp: Response) -> serde_json::Value {
    let mut body_bytes = Vec::new();
    resp.body_mut()
        .reader()
        .read_to_end(&mut body_bytes)
        .unwrap();
    serde_json::from_slice(&body_bytes).unwrap()
}
