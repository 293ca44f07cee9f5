use crate::db::connection::Database;
use crate::domain::{PropertyRecord, StandardStatus};
use crate::errors::ServerError;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::types::{Value, ValueRef};
use rusqlite::{params_from_iter, Row};
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Column order shared by the upsert statement and `record_values`.
const COLUMNS: &[&str] = &[
    "id",
    "listing_id",
    "standard_status",
    "list_price",
    "close_price",
    "original_list_price",
    "bedrooms_total",
    "bathrooms_full",
    "bathrooms_half",
    "bathrooms_total_integer",
    "living_area",
    "lot_size_square_feet",
    "lot_size_acres",
    "year_built",
    "garage_parking_spaces",
    "total_parking_spaces",
    "main_level_bedrooms",
    "property_type",
    "property_sub_type",
    "days_on_market",
    "cumulative_days_on_market",
    "listing_contract_date",
    "close_date",
    "modification_timestamp",
    "unparsed_address",
    "street_number",
    "street_name",
    "city",
    "state_or_province",
    "postal_code",
    "subdivision",
    "county_or_parish",
    "elementary_school",
    "middle_or_junior_school",
    "high_school",
    "school_district",
    "flex_listing_yn",
    "pool_private_yn",
    "waterfront_yn",
    "view_yn",
    "horse_yn",
    "association_yn",
    "property_sale_contingency",
    "occupant_type",
    "possession",
    "is_visible",
];

fn placeholders(n: usize) -> String {
    std::iter::repeat("?")
        .take(n)
        .collect::<Vec<_>>()
        .join(", ")
}

// ----- Column readers -----
// Every reader coerces what SQLite hands back and yields None for anything
// that does not parse, so one bad cell never drops the whole row.

fn text_column(row: &Row, name: &str) -> rusqlite::Result<Option<String>> {
    Ok(match row.get_ref(name)? {
        ValueRef::Text(t) => std::str::from_utf8(t)
            .ok()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(f) => Some(f.to_string()),
        ValueRef::Null | ValueRef::Blob(_) => None,
    })
}

fn decimal_column(row: &Row, name: &str) -> rusqlite::Result<Option<Decimal>> {
    Ok(match row.get_ref(name)? {
        ValueRef::Integer(i) => Some(Decimal::from(i)),
        ValueRef::Real(f) => Decimal::try_from(f).ok(),
        ValueRef::Text(t) => std::str::from_utf8(t)
            .ok()
            .and_then(|s| Decimal::from_str(s.trim()).ok()),
        ValueRef::Null | ValueRef::Blob(_) => None,
    })
}

fn int_column<T: TryFrom<i64>>(row: &Row, name: &str) -> rusqlite::Result<Option<T>> {
    let raw = match row.get_ref(name)? {
        ValueRef::Integer(i) => Some(i),
        ValueRef::Real(f) if f.fract() == 0.0 => Some(f as i64),
        ValueRef::Text(t) => std::str::from_utf8(t)
            .ok()
            .and_then(|s| s.trim().parse::<i64>().ok()),
        _ => None,
    };
    Ok(raw.and_then(|i| T::try_from(i).ok()))
}

fn bool_column(row: &Row, name: &str) -> rusqlite::Result<Option<bool>> {
    Ok(match row.get_ref(name)? {
        ValueRef::Integer(i) => Some(i != 0),
        ValueRef::Text(t) => match std::str::from_utf8(t).map(|s| s.trim().to_lowercase()) {
            Ok(s) if s == "y" || s == "yes" || s == "true" || s == "1" => Some(true),
            Ok(s) if s == "n" || s == "no" || s == "false" || s == "0" => Some(false),
            _ => None,
        },
        _ => None,
    })
}

fn date_column(row: &Row, name: &str) -> rusqlite::Result<Option<NaiveDate>> {
    Ok(text_column(row, name)?.and_then(|s| {
        // Accept a bare date or the date part of a timestamp.
        let date_part = s.get(..10).unwrap_or(s.as_str());
        NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
    }))
}

fn timestamp_column(row: &Row, name: &str) -> rusqlite::Result<Option<DateTime<Utc>>> {
    Ok(text_column(row, name)?.and_then(|s| {
        DateTime::parse_from_rfc3339(&s)
            .or_else(|_| DateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S%.f%:z"))
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
    }))
}

fn status_column(row: &Row, name: &str) -> rusqlite::Result<Option<StandardStatus>> {
    Ok(text_column(row, name)?.and_then(|s| s.parse().ok()))
}

/// Maps one `properties` row into a record.
fn row_to_record(row: &Row) -> rusqlite::Result<PropertyRecord> {
    Ok(PropertyRecord {
        id: row.get("id")?,
        listing_id: text_column(row, "listing_id")?,
        standard_status: status_column(row, "standard_status")?,

        list_price: decimal_column(row, "list_price")?,
        close_price: decimal_column(row, "close_price")?,
        original_list_price: decimal_column(row, "original_list_price")?,

        bedrooms_total: int_column(row, "bedrooms_total")?,
        bathrooms_full: int_column(row, "bathrooms_full")?,
        bathrooms_half: int_column(row, "bathrooms_half")?,
        bathrooms_total_integer: int_column(row, "bathrooms_total_integer")?,
        living_area: decimal_column(row, "living_area")?,
        lot_size_square_feet: decimal_column(row, "lot_size_square_feet")?,
        lot_size_acres: decimal_column(row, "lot_size_acres")?,
        year_built: int_column(row, "year_built")?,
        garage_parking_spaces: int_column(row, "garage_parking_spaces")?,
        total_parking_spaces: int_column(row, "total_parking_spaces")?,
        main_level_bedrooms: int_column(row, "main_level_bedrooms")?,
        property_type: text_column(row, "property_type")?,
        property_sub_type: text_column(row, "property_sub_type")?,

        days_on_market: int_column(row, "days_on_market")?,
        cumulative_days_on_market: int_column(row, "cumulative_days_on_market")?,
        listing_contract_date: date_column(row, "listing_contract_date")?,
        close_date: date_column(row, "close_date")?,
        modification_timestamp: timestamp_column(row, "modification_timestamp")?,

        unparsed_address: text_column(row, "unparsed_address")?,
        street_number: text_column(row, "street_number")?,
        street_name: text_column(row, "street_name")?,
        city: text_column(row, "city")?,
        state_or_province: text_column(row, "state_or_province")?,
        postal_code: text_column(row, "postal_code")?,
        subdivision: text_column(row, "subdivision")?,
        county_or_parish: text_column(row, "county_or_parish")?,

        elementary_school: text_column(row, "elementary_school")?,
        middle_or_junior_school: text_column(row, "middle_or_junior_school")?,
        high_school: text_column(row, "high_school")?,
        school_district: text_column(row, "school_district")?,

        flex_listing_yn: bool_column(row, "flex_listing_yn")?,
        pool_private_yn: bool_column(row, "pool_private_yn")?,
        waterfront_yn: bool_column(row, "waterfront_yn")?,
        view_yn: bool_column(row, "view_yn")?,
        horse_yn: bool_column(row, "horse_yn")?,
        association_yn: bool_column(row, "association_yn")?,

        property_sale_contingency: text_column(row, "property_sale_contingency")?,
        occupant_type: text_column(row, "occupant_type")?,
        possession: text_column(row, "possession")?,

        is_visible: bool_column(row, "is_visible")?.unwrap_or(false),
    })
}

// ----- Column writers -----

fn text(v: &Option<String>) -> Value {
    v.clone().map(Value::Text).unwrap_or(Value::Null)
}

fn decimal(v: Option<Decimal>) -> Value {
    v.map(|d| Value::Text(d.to_string())).unwrap_or(Value::Null)
}

fn int<T: Into<i64>>(v: Option<T>) -> Value {
    v.map(|i| Value::Integer(i.into())).unwrap_or(Value::Null)
}

fn flag(v: Option<bool>) -> Value {
    int(v.map(i64::from))
}

/// The record's column values, in `COLUMNS` order.
fn record_values(p: &PropertyRecord) -> Vec<Value> {
    vec![
        Value::Text(p.id.clone()),
        text(&p.listing_id),
        p.standard_status
            .map(|s| Value::Text(s.as_str().to_string()))
            .unwrap_or(Value::Null),
        decimal(p.list_price),
        decimal(p.close_price),
        decimal(p.original_list_price),
        int(p.bedrooms_total),
        int(p.bathrooms_full),
        int(p.bathrooms_half),
        int(p.bathrooms_total_integer),
        decimal(p.living_area),
        decimal(p.lot_size_square_feet),
        decimal(p.lot_size_acres),
        int(p.year_built),
        int(p.garage_parking_spaces),
        int(p.total_parking_spaces),
        int(p.main_level_bedrooms),
        text(&p.property_type),
        text(&p.property_sub_type),
        int(p.days_on_market),
        int(p.cumulative_days_on_market),
        p.listing_contract_date
            .map(|d| Value::Text(d.format("%Y-%m-%d").to_string()))
            .unwrap_or(Value::Null),
        p.close_date
            .map(|d| Value::Text(d.format("%Y-%m-%d").to_string()))
            .unwrap_or(Value::Null),
        p.modification_timestamp
            .map(|ts| Value::Text(ts.to_rfc3339_opts(SecondsFormat::Micros, true)))
            .unwrap_or(Value::Null),
        text(&p.unparsed_address),
        text(&p.street_number),
        text(&p.street_name),
        text(&p.city),
        text(&p.state_or_province),
        text(&p.postal_code),
        text(&p.subdivision),
        text(&p.county_or_parish),
        text(&p.elementary_school),
        text(&p.middle_or_junior_school),
        text(&p.high_school),
        text(&p.school_district),
        flag(p.flex_listing_yn),
        flag(p.pool_private_yn),
        flag(p.waterfront_yn),
        flag(p.view_yn),
        flag(p.horse_yn),
        flag(p.association_yn),
        text(&p.property_sale_contingency),
        text(&p.occupant_type),
        text(&p.possession),
        Value::Integer(i64::from(p.is_visible)),
    ]
}

/// Inserts or replaces every record in one transaction and returns the ids
/// written, so callers can invalidate anything derived from them.
pub fn upsert_properties(db: &Database, records: &[PropertyRecord]) -> Result<Vec<String>, ServerError> {
    let updates = COLUMNS[1..]
        .iter()
        .map(|c| format!("{c} = excluded.{c}"))
        .collect::<Vec<_>>()
        .join(",\n            ");

    let sql = format!(
        r#"
        INSERT INTO properties ({columns})
        VALUES ({values})
        ON CONFLICT(id) DO UPDATE SET
            {updates}
        "#,
        columns = COLUMNS.join(", "),
        values = placeholders(COLUMNS.len()),
    );

    db.with_conn(|conn| {
        let tx = conn.transaction()?;
        let mut written = Vec::with_capacity(records.len());
        {
            let mut stmt = tx.prepare(&sql)?;
            for record in records {
                if record.id.trim().is_empty() {
                    warn!("Skipping property record with an empty id");
                    continue;
                }
                stmt.execute(params_from_iter(record_values(record)))?;
                written.push(record.id.clone());
            }
        }
        tx.commit()?;

        info!(count = written.len(), "upserted properties");
        Ok(written)
    })
}

fn select_sql(where_clause: &str) -> String {
    format!(
        r#"
        SELECT {columns}
        FROM properties
        {where_clause}
        ORDER BY modification_timestamp DESC, id
        "#,
        columns = COLUMNS.join(", "),
    )
}

/// Every visible record, most recently modified first.
pub fn load_visible_properties(db: &Database) -> Result<Vec<PropertyRecord>, ServerError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(&select_sql("WHERE is_visible = 1"))?;
        let rows = stmt.query_map([], row_to_record)?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        debug!(count = results.len(), "loaded visible properties");
        Ok(results)
    })
}

/// Records whose id is in `ids`, visible or not. Visibility is left to the
/// analysis layer, which never lets a hidden record through.
pub fn load_properties_by_ids(
    db: &Database,
    ids: &BTreeSet<String>,
) -> Result<Vec<PropertyRecord>, ServerError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    db.with_conn(|conn| {
        let sql = select_sql(&format!("WHERE id IN ({})", placeholders(ids.len())));
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(ids.iter()), row_to_record)?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    })
}
