use crate::db::connection::Database;
use crate::domain::{NewSellerUpdate, SellerUpdateCriteria, StoredSellerUpdate};
use crate::errors::ServerError;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, OptionalExtension, Row};
use tracing::{info, warn};

fn to_text(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_ts(raw: Option<String>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

fn row_to_update(row: &Row) -> rusqlite::Result<StoredSellerUpdate> {
    let id: i64 = row.get("id")?;
    let frequency_raw: String = row.get("frequency")?;
    let frequency = frequency_raw.parse().unwrap_or_else(|e| {
        warn!(id, error = %e, "unreadable frequency, treating as weekly");
        Default::default()
    });

    Ok(StoredSellerUpdate {
        id,
        name: row.get("name")?,
        frequency,
        is_active: row.get("is_active")?,
        created_at: parse_ts(row.get("created_at")?).unwrap_or_default(),
        criteria: SellerUpdateCriteria {
            postal_code: row.get("postal_code")?,
            elementary_school: row.get("elementary_school")?,
            property_sub_type: row.get("property_sub_type")?,
            last_sent_at: parse_ts(row.get("last_sent_at")?),
        },
    })
}

const SELECT_UPDATES: &str = r#"
    SELECT id, name, frequency, postal_code, elementary_school, property_sub_type,
           is_active, last_sent_at, created_at
    FROM seller_update_criteria
"#;

pub fn create_seller_update(
    db: &Database,
    new: &NewSellerUpdate,
    now: DateTime<Utc>,
) -> Result<StoredSellerUpdate, ServerError> {
    if new.name.trim().is_empty() {
        return Err(ServerError::BadRequest("name must not be empty".into()));
    }

    let id = db.with_conn(|conn| {
        conn.execute(
            r#"
            INSERT INTO seller_update_criteria
                (name, frequency, postal_code, elementary_school, property_sub_type, is_active, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6)
            "#,
            params![
                new.name.trim(),
                new.frequency.as_str(),
                new.postal_code,
                new.elementary_school,
                new.property_sub_type,
                to_text(now),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    })?;

    info!(id, name = %new.name, "created seller update criteria");
    get_seller_update(db, id)?.ok_or(ServerError::InternalError)
}

pub fn get_seller_update(db: &Database, id: i64) -> Result<Option<StoredSellerUpdate>, ServerError> {
    db.with_conn(|conn| {
        let sql = format!("{SELECT_UPDATES} WHERE id = ?1");
        Ok(conn.query_row(&sql, params![id], row_to_update).optional()?)
    })
}

pub fn list_seller_updates(db: &Database) -> Result<Vec<StoredSellerUpdate>, ServerError> {
    db.with_conn(|conn| {
        let sql = format!("{SELECT_UPDATES} ORDER BY id");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], row_to_update)?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    })
}

/// Active criteria whose frequency window has elapsed at `now`.
pub fn list_due_seller_updates(
    db: &Database,
    now: DateTime<Utc>,
) -> Result<Vec<StoredSellerUpdate>, ServerError> {
    Ok(list_seller_updates(db)?
        .into_iter()
        .filter(|u| u.is_due(now))
        .collect())
}

/// Advances the "new since last send" watermark.
pub fn mark_sent(db: &Database, id: i64, sent_at: DateTime<Utc>) -> Result<(), ServerError> {
    let changed = db.with_conn(|conn| {
        Ok(conn.execute(
            "UPDATE seller_update_criteria SET last_sent_at = ?1 WHERE id = ?2",
            params![to_text(sent_at), id],
        )?)
    })?;

    if changed == 0 {
        return Err(ServerError::NotFound);
    }
    Ok(())
}

pub fn set_active(db: &Database, id: i64, is_active: bool) -> Result<(), ServerError> {
    let changed = db.with_conn(|conn| {
        Ok(conn.execute(
            "UPDATE seller_update_criteria SET is_active = ?1 WHERE id = ?2",
            params![is_active, id],
        )?)
    })?;

    if changed == 0 {
        return Err(ServerError::NotFound);
    }
    Ok(())
}
